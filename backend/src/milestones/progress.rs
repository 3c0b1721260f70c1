//! Aggregate payoff progress and milestone classification
//!
//! Progress is measured on original balances so that later payments on other
//! debts don't move the denominator:
//!
//! ```text
//! progress = Σ original(paid debts) / Σ original(all visible debts)
//! ```
//!
//! A debt counts as paid once its zero crossing is recorded, whether or not
//! the payoff has been confirmed yet.

use crate::core::money::{ratio_bps, BPS_PER_UNIT};
use crate::models::{Debt, MilestoneType};
use serde::{Deserialize, Serialize};

/// Percentage tiers checked from highest to lowest (threshold in bps)
const TIERS: [(i64, MilestoneType); 4] = [
    (BPS_PER_UNIT, MilestoneType::DebtFree),
    (7_500, MilestoneType::Pct75),
    (5_000, MilestoneType::Pct50),
    (2_500, MilestoneType::Pct25),
];

/// Snapshot of one user's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub paid_original_total: i64,
    pub original_total: i64,
    pub paid_count: usize,
    pub debt_count: usize,
    /// paid / total in basis points (10_000 = 100%)
    pub progress_bps: i64,
}

impl Progress {
    /// Measure progress over a user's visible debts
    pub fn measure(debts: &[Debt]) -> Self {
        let visible = debts.iter().filter(|d| d.is_visible());

        let mut progress = Progress {
            paid_original_total: 0,
            original_total: 0,
            paid_count: 0,
            debt_count: 0,
            progress_bps: 0,
        };
        for debt in visible {
            progress.debt_count += 1;
            progress.original_total = progress.original_total.saturating_add(debt.original_balance());
            if debt.counts_as_paid() {
                progress.paid_count += 1;
                progress.paid_original_total =
                    progress.paid_original_total.saturating_add(debt.original_balance());
            }
        }

        progress.progress_bps = if progress.original_total > 0 {
            ratio_bps(progress.paid_original_total, progress.original_total)
        } else if progress.debt_count > 0 && progress.paid_count == progress.debt_count {
            // Only zero-original debts, all closed
            BPS_PER_UNIT
        } else {
            0
        };
        progress
    }

    /// Highest percentage tier reached, if any
    pub fn tier(&self) -> Option<MilestoneType> {
        TIERS
            .iter()
            .find(|(threshold, _)| self.progress_bps >= *threshold)
            .map(|(_, kind)| *kind)
    }

    /// Milestones this progress qualifies for
    ///
    /// `first_debt_paid` whenever at least one debt is paid (the store's
    /// uniqueness constraint makes it fire only for the first), plus the
    /// single highest percentage tier.
    pub fn qualifying(&self) -> Vec<MilestoneType> {
        let mut kinds = Vec::with_capacity(2);
        if self.paid_count > 0 {
            kinds.push(MilestoneType::FirstDebtPaid);
        }
        if let Some(tier) = self.tier() {
            kinds.push(tier);
        }
        kinds
    }
}
