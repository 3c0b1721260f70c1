//! Property tests for the payoff simulator
//!
//! Debt sets are generated so that every debt converges on its own minimum
//! (minimum > one month of interest), with distinct rates and a positive
//! extra payment.

use debt_payoff_core::core::money::monthly_interest;
use debt_payoff_core::planner::{compare, simulate, DebtSnapshot, Strategy as PayoffStrategy};
use proptest::prelude::*;
use proptest::test_runner::Config;

fn convergent_debts() -> impl Strategy<Value = Vec<DebtSnapshot>> {
    (2usize..=5)
        .prop_flat_map(|n| {
            (
                prop::sample::subsequence((0i64..20).collect::<Vec<_>>(), n),
                prop::collection::vec(1_000i64..=500_000, n),
            )
        })
        .prop_map(|(rate_steps, balances)| {
            rate_steps
                .into_iter()
                .zip(balances)
                .enumerate()
                .map(|(i, (step, balance))| {
                    let rate = step * 300;
                    let minimum = monthly_interest(balance, rate) + balance / 100 + 100;
                    DebtSnapshot::new(format!("d{}", i), balance, minimum, rate)
                })
                .collect()
        })
}

proptest! {
    #![proptest_config(Config::with_cases(64))]

    #[test]
    fn avalanche_never_pays_more_interest(
        debts in convergent_debts(),
        extra in 5_000i64..=100_000
    ) {
        let cmp = compare(&debts, extra).unwrap();
        prop_assert!(!cmp.snowball.exceeds_horizon);
        prop_assert!(!cmp.avalanche.exceeds_horizon);
        prop_assert!(
            cmp.avalanche.total_interest <= cmp.snowball.total_interest,
            "avalanche {} > snowball {}",
            cmp.avalanche.total_interest,
            cmp.snowball.total_interest
        );
        prop_assert!(cmp.interest_saved >= 0);
    }

    #[test]
    fn months_without_payoff_spend_minimums_plus_pool(
        debts in convergent_debts(),
        extra in 5_000i64..=100_000
    ) {
        for strategy in [PayoffStrategy::Snowball, PayoffStrategy::Avalanche] {
            let plan = simulate(&debts, extra, strategy).unwrap();
            for month in plan.schedule.iter().filter(|m| m.debts_paid_off.is_empty()) {
                prop_assert_eq!(month.payments, month.minimums_due + month.extra_pool);
            }
        }
    }

    #[test]
    fn every_cent_is_principal_or_interest(
        debts in convergent_debts(),
        extra in 5_000i64..=100_000
    ) {
        let plan = simulate(&debts, extra, PayoffStrategy::Avalanche).unwrap();
        let principal: i64 = debts.iter().map(|d| d.balance).sum();
        // A retired debt may drop a final cent
        let slack = debts.len() as i64;
        let paid = plan.total_payments;
        prop_assert!(paid <= principal + plan.total_interest);
        prop_assert!(paid >= principal + plan.total_interest - slack);
    }

    #[test]
    fn input_order_never_changes_the_plan(
        debts in convergent_debts(),
        extra in 0i64..=50_000
    ) {
        let mut reversed = debts.clone();
        reversed.reverse();
        for strategy in [PayoffStrategy::Snowball, PayoffStrategy::Avalanche] {
            prop_assert_eq!(
                simulate(&debts, extra, strategy).unwrap(),
                simulate(&reversed, extra, strategy).unwrap()
            );
        }
    }
}
