//! Payoff simulator
//!
//! Pure month-by-month amortization over an immutable debt snapshot.
//!
//! # Monthly step
//!
//! ```text
//! For each month m (1..=600) while any debt is active:
//! 1. Accrue interest on every active debt (rounded half-up to a cent)
//! 2. Apply each active debt's own minimum payment, capped at its balance
//! 3. Direct the extra pool at active debts in target order
//! 4. Retire debts at or below one cent; their minimums join the pool
//!    from month m + 1
//! ```
//!
//! The pool is threaded through the loop as part of the [`MonthState`]
//! accumulator each step returns; nothing is mutated across iterations
//! outside that value.
//!
//! # Cascade
//!
//! Freed minimums roll into the pool only when the plan carries a positive
//! extra payment. A zero-extra plan is the "minimums only" baseline: every
//! debt is retired by its own minimum. While the cascade is engaged, the
//! unused part of a minimum in a debt's final month also joins that month's
//! pool, so the monthly outlay stays constant until the last debt.
//!
//! # Horizon
//!
//! A debt above one cent after month 600 has no `months_to_payoff` and sets
//! `exceeds_horizon`; that is a valid, reportable result.

use super::types::{DebtPayoff, DebtSnapshot, MonthSummary, PayoffPlan, Strategy, ValidationError};
use crate::core::money::{is_paid_off, monthly_interest};
use std::collections::HashSet;

/// Hard cap on simulated months (50 years)
pub const MAX_MONTHS: u32 = 600;

/// Accumulator threaded through the monthly fold
///
/// Vectors are indexed by position in target order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonthState {
    pub balances: Vec<i64>,
    pub interest: Vec<i64>,
    pub paid: Vec<i64>,
    pub paid_month: Vec<Option<u32>>,
    /// Extra pool in effect for the next month
    pub extra_pool: i64,
}

impl MonthState {
    /// Opening state. Debts already at zero are retired in month 0.
    fn opening(ordered: &[DebtSnapshot], extra_payment: i64, cascade: bool) -> Self {
        let mut state = MonthState {
            balances: ordered.iter().map(|d| d.balance).collect(),
            interest: vec![0; ordered.len()],
            paid: vec![0; ordered.len()],
            paid_month: vec![None; ordered.len()],
            extra_pool: extra_payment,
        };

        for (i, debt) in ordered.iter().enumerate() {
            if is_paid_off(debt.balance) {
                state.balances[i] = 0;
                state.paid_month[i] = Some(0);
                if cascade {
                    state.extra_pool = state.extra_pool.saturating_add(debt.minimum_payment);
                }
            }
        }
        state
    }

    fn any_active(&self) -> bool {
        self.paid_month.iter().any(Option::is_none)
    }
}

/// Simulate repayment of `debts` under `strategy`
///
/// # Errors
/// [`ValidationError`] for negative money/rate values, empty or duplicate
/// ids. Validation runs before the first month.
///
/// # Example
/// ```
/// use debt_payoff_core::planner::{simulate, DebtSnapshot, Strategy};
///
/// let debts = vec![
///     DebtSnapshot::new("a", 100_000, 10_000, 0),
///     DebtSnapshot::new("b", 200_000, 5_000, 0),
/// ];
/// let plan = simulate(&debts, 0, Strategy::Snowball).unwrap();
/// assert_eq!(plan.payoff_for("a").unwrap().months_to_payoff, Some(10));
/// assert_eq!(plan.payoff_for("b").unwrap().months_to_payoff, Some(40));
/// assert_eq!(plan.total_months, 40);
/// ```
pub fn simulate(
    debts: &[DebtSnapshot],
    extra_payment: i64,
    strategy: Strategy,
) -> Result<PayoffPlan, ValidationError> {
    validate(debts, extra_payment)?;

    let ordered = order_debts(debts, strategy);
    let cascade = extra_payment > 0;

    let mut state = MonthState::opening(&ordered, extra_payment, cascade);
    let mut schedule = Vec::new();
    let mut month = 0;

    while month < MAX_MONTHS && state.any_active() {
        month += 1;
        let (next, summary) = step_month(state, &ordered, month, cascade);
        state = next;
        schedule.push(summary);
    }

    Ok(build_plan(strategy, &ordered, state, schedule))
}

/// Reject malformed input
pub fn validate(debts: &[DebtSnapshot], extra_payment: i64) -> Result<(), ValidationError> {
    if extra_payment < 0 {
        return Err(ValidationError::NegativeExtraPayment(extra_payment));
    }

    let mut seen = HashSet::with_capacity(debts.len());
    for debt in debts {
        if debt.id.is_empty() {
            return Err(ValidationError::EmptyDebtId);
        }
        if !seen.insert(debt.id.as_str()) {
            return Err(ValidationError::DuplicateDebtId(debt.id.clone()));
        }
        if debt.balance < 0 {
            return Err(ValidationError::NegativeBalance {
                id: debt.id.clone(),
                balance: debt.balance,
            });
        }
        if debt.minimum_payment < 0 {
            return Err(ValidationError::NegativeMinimumPayment {
                id: debt.id.clone(),
                minimum_payment: debt.minimum_payment,
            });
        }
        if debt.annual_rate_bps < 0 {
            return Err(ValidationError::NegativeRate {
                id: debt.id.clone(),
                annual_rate_bps: debt.annual_rate_bps,
            });
        }
    }
    Ok(())
}

/// Sort debts into target order
///
/// Snowball: ascending balance. Avalanche: descending rate. Ties on the
/// primary key fall back to ascending id, so the result never depends on
/// input order.
pub fn order_debts(debts: &[DebtSnapshot], strategy: Strategy) -> Vec<DebtSnapshot> {
    let mut ordered = debts.to_vec();
    match strategy {
        Strategy::Snowball => ordered.sort_by(|a, b| {
            a.balance.cmp(&b.balance).then_with(|| a.id.cmp(&b.id))
        }),
        Strategy::Avalanche => ordered.sort_by(|a, b| {
            b.annual_rate_bps
                .cmp(&a.annual_rate_bps)
                .then_with(|| a.id.cmp(&b.id))
        }),
    }
    ordered
}

/// Advance one month
///
/// Consumes the previous accumulator and returns the next one together with
/// the month's summary.
pub fn step_month(
    state: MonthState,
    ordered: &[DebtSnapshot],
    month: u32,
    cascade: bool,
) -> (MonthState, MonthSummary) {
    let mut next = state;
    let pool_in_effect = next.extra_pool;
    let mut pool = pool_in_effect;
    let mut minimums_due: i64 = 0;
    let mut month_interest: i64 = 0;
    let mut month_payments: i64 = 0;

    // 1-2. Interest, then each debt's own minimum
    for (i, debt) in ordered.iter().enumerate() {
        if next.paid_month[i].is_some() {
            continue;
        }
        minimums_due = minimums_due.saturating_add(debt.minimum_payment);

        let interest = monthly_interest(next.balances[i], debt.annual_rate_bps);
        next.balances[i] = next.balances[i].saturating_add(interest);
        next.interest[i] = next.interest[i].saturating_add(interest);
        month_interest = month_interest.saturating_add(interest);

        let payment = debt.minimum_payment.min(next.balances[i]);
        next.balances[i] -= payment;
        next.paid[i] = next.paid[i].saturating_add(payment);
        month_payments = month_payments.saturating_add(payment);

        if cascade {
            pool = pool.saturating_add(debt.minimum_payment - payment);
        }
    }

    // 3. Extra pool, first active debt in target order, spill to the next
    for i in 0..ordered.len() {
        if pool <= 0 {
            break;
        }
        if next.paid_month[i].is_some() || next.balances[i] <= 0 {
            continue;
        }
        let payment = pool.min(next.balances[i]);
        next.balances[i] -= payment;
        next.paid[i] = next.paid[i].saturating_add(payment);
        month_payments = month_payments.saturating_add(payment);
        pool -= payment;
    }

    // 4. Retire and cascade
    let mut next_pool = pool_in_effect;
    let mut debts_paid_off = Vec::new();
    for (i, debt) in ordered.iter().enumerate() {
        if next.paid_month[i].is_none() && is_paid_off(next.balances[i]) {
            next.balances[i] = 0;
            next.paid_month[i] = Some(month);
            debts_paid_off.push(debt.id.clone());
            if cascade {
                next_pool = next_pool.saturating_add(debt.minimum_payment);
            }
        }
    }
    next.extra_pool = next_pool;

    let remaining_balance = next
        .balances
        .iter()
        .fold(0i64, |acc, b| acc.saturating_add(*b));

    let summary = MonthSummary {
        month,
        minimums_due,
        extra_pool: pool_in_effect,
        payments: month_payments,
        interest: month_interest,
        remaining_balance,
        debts_paid_off,
    };

    (next, summary)
}

fn build_plan(
    strategy: Strategy,
    ordered: &[DebtSnapshot],
    state: MonthState,
    schedule: Vec<MonthSummary>,
) -> PayoffPlan {
    let exceeds_horizon = state.any_active();

    let payoff_order: Vec<DebtPayoff> = ordered
        .iter()
        .enumerate()
        .map(|(i, debt)| DebtPayoff {
            debt_id: debt.id.clone(),
            months_to_payoff: state.paid_month[i],
            total_interest: state.interest[i],
            total_paid: state.paid[i],
        })
        .collect();

    let total_months = if exceeds_horizon {
        MAX_MONTHS
    } else {
        state.paid_month.iter().flatten().copied().max().unwrap_or(0)
    };

    let total_interest = state
        .interest
        .iter()
        .fold(0i64, |acc, v| acc.saturating_add(*v));
    let total_payments = state.paid.iter().fold(0i64, |acc, v| acc.saturating_add(*v));

    PayoffPlan {
        strategy,
        payoff_order,
        total_months,
        total_interest,
        total_payments,
        exceeds_horizon,
        schedule,
    }
}
