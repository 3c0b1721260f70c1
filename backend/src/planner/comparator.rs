//! Strategy comparator
//!
//! Runs the simulator under both orderings with identical inputs and reports
//! the difference. The comparator only subtracts; whether avalanche is cheaper
//! is a property checked by the test suite, not assumed here.

use super::simulator::simulate;
use super::types::{DebtSnapshot, Strategy, StrategyComparison, ValidationError};

/// Compare snowball against avalanche
///
/// `months_saved` and `interest_saved` are snowball totals minus avalanche
/// totals, so positive values mean avalanche finishes sooner / cheaper.
///
/// # Example
/// ```
/// use debt_payoff_core::planner::{compare, DebtSnapshot};
///
/// let debts = vec![
///     DebtSnapshot::new("small_low", 50_000, 2_500, 500),
///     DebtSnapshot::new("big_high", 500_000, 10_000, 2_400),
/// ];
/// let cmp = compare(&debts, 20_000).unwrap();
/// assert!(cmp.interest_saved >= 0);
/// ```
pub fn compare(
    debts: &[DebtSnapshot],
    extra_payment: i64,
) -> Result<StrategyComparison, ValidationError> {
    let snowball = simulate(debts, extra_payment, Strategy::Snowball)?;
    let avalanche = simulate(debts, extra_payment, Strategy::Avalanche)?;

    let months_saved = snowball.total_months as i64 - avalanche.total_months as i64;
    let interest_saved = snowball.total_interest - avalanche.total_interest;

    Ok(StrategyComparison {
        snowball,
        avalanche,
        months_saved,
        interest_saved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_orderings_save_nothing() {
        // Smallest balance is also the highest rate: both orders agree
        let debts = vec![
            DebtSnapshot::new("a", 10_000, 500, 2_000),
            DebtSnapshot::new("b", 90_000, 1_500, 900),
        ];
        let cmp = compare(&debts, 1_000).unwrap();
        assert_eq!(cmp.snowball.order(), cmp.avalanche.order());
        assert_eq!(cmp.months_saved, 0);
        assert_eq!(cmp.interest_saved, 0);
        assert_eq!(cmp.cheaper(), Strategy::Snowball);
    }

    #[test]
    fn test_validation_error_propagates() {
        let debts = vec![DebtSnapshot::new("a", -1, 0, 0)];
        assert!(matches!(
            compare(&debts, 0),
            Err(ValidationError::NegativeBalance { .. })
        ));
    }
}
