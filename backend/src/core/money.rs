//! Fixed-point money helpers
//!
//! All money values are i64 minor units (cents). Annual interest rates are
//! basis points: `1200` means 12.00% per year.
//!
//! Interest is the only fractional quantity in the engine, so rounding happens
//! in exactly one place: [`monthly_interest`] rounds half-up to a whole cent
//! once per monthly step.

/// Balance at or below this many cents counts as paid off (0.01 units).
pub const PAID_OFF_EPSILON: i64 = 1;

/// Basis points in 100%.
pub const BPS_PER_UNIT: i64 = 10_000;

/// Months per year used for monthly accrual.
pub const MONTHS_PER_YEAR: i64 = 12;

/// True when a balance is small enough to count as zero.
///
/// # Example
/// ```
/// use debt_payoff_core::core::money::is_paid_off;
///
/// assert!(is_paid_off(0));
/// assert!(is_paid_off(1));
/// assert!(!is_paid_off(2));
/// ```
pub fn is_paid_off(balance: i64) -> bool {
    balance <= PAID_OFF_EPSILON
}

/// One month of interest on `balance` at `annual_rate_bps`, rounded half-up
/// to the nearest cent.
///
/// Computed as `balance × rate / (10_000 × 12)` in i128 so large balances
/// cannot overflow mid-calculation.
///
/// # Example
/// ```
/// use debt_payoff_core::core::money::monthly_interest;
///
/// // $1,000.00 at 24% APR accrues exactly $20.00 per month
/// assert_eq!(monthly_interest(100_000, 2_400), 2_000);
/// // $1,200.00 at 12% APR accrues $12.00
/// assert_eq!(monthly_interest(120_000, 1_200), 1_200);
/// ```
pub fn monthly_interest(balance: i64, annual_rate_bps: i64) -> i64 {
    if balance <= 0 || annual_rate_bps <= 0 {
        return 0;
    }
    let divisor = (BPS_PER_UNIT * MONTHS_PER_YEAR) as i128;
    let numerator = balance as i128 * annual_rate_bps as i128;
    let rounded = (numerator + divisor / 2) / divisor;
    i64::try_from(rounded).unwrap_or(i64::MAX)
}

/// Format cents as a plain decimal string (`123456` -> `"1234.56"`).
pub fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}

/// Progress of `part` over `whole` in basis points, floored.
///
/// Returns 0 when `whole` is not positive.
pub fn ratio_bps(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    let scaled = part.max(0) as i128 * BPS_PER_UNIT as i128 / whole as i128;
    i64::try_from(scaled).unwrap_or(i64::MAX)
}
