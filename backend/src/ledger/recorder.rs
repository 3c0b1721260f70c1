//! Balance change recorder
//!
//! The only writer of debt rows. Every call:
//!
//! ```text
//! 1. Read the debt (balance, reached_zero_at, version)
//! 2. Compute the new row and its audit event (pure)
//! 3. Commit both with compare-and-set on version
//! 4. On conflict, go back to 1 (bounded by max_commit_attempts)
//! ```
//!
//! The set-once `reached_zero_at` travels in the same commit as the balance,
//! so of two racing payments that both cross zero, exactly one commit sets it
//! and emits a [`ZeroBalanceSignal`]. The loser re-reads, sees the marker,
//! and records a plain payment.
//!
//! # Critical Invariants
//!
//! 1. **No silent success**: a store failure is returned, never swallowed
//! 2. **Set-once**: `reached_zero_at` is written by at most one commit
//! 3. **Monotonic**: payments never raise a balance; only adjustments may

use super::signals::{ZeroBalanceSignal, ZeroBalanceSignals};
use crate::core::clock::Clock;
use crate::core::config::RecorderConfig;
use crate::core::money::is_paid_off;
use crate::models::{BalanceChangeEvent, ChangeType, Debt, DebtState};
use crate::store::{CommitOutcome, DebtStore, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Errors that can occur while recording a change
#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("Debt not found: {0}")]
    DebtNotFound(String),

    #[error("Amount must be non-negative, got {0}")]
    NegativeAmount(i64),

    #[error("Debt {0} is paid off")]
    DebtClosed(String),

    #[error("Debt {0} is deactivated")]
    DebtDeactivated(String),

    #[error("Debt {debt_id} already reached zero; cannot adjust balance to {requested}")]
    ReopenNotAllowed { debt_id: String, requested: i64 },

    #[error("Debt {0} has not reached zero")]
    NotZeroBalance(String),

    #[error("Gave up on debt {debt_id} after {attempts} conflicting commits")]
    Contention { debt_id: String, attempts: u32 },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// A computed but not yet committed write
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedChange {
    pub debt: Debt,
    pub event: Option<BalanceChangeEvent>,
    /// This write sets `reached_zero_at`
    pub crosses_zero: bool,
}

/// Compute the row and audit event for a balance change
///
/// Pure: the caller commits the result.
pub fn plan_change(
    current: &Debt,
    amount: i64,
    change_type: ChangeType,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<PlannedChange, RecordError> {
    if !current.is_visible() {
        return Err(RecordError::DebtDeactivated(current.id().to_string()));
    }
    if current.state() == DebtState::PaidOff {
        return Err(RecordError::DebtClosed(current.id().to_string()));
    }
    if amount < 0 {
        return Err(RecordError::NegativeAmount(amount));
    }

    let previous = current.balance();
    let new_balance = match change_type {
        ChangeType::Payment => (previous - amount).max(0),
        ChangeType::Adjustment => {
            if current.reached_zero_at().is_some() && !is_paid_off(amount) {
                return Err(RecordError::ReopenNotAllowed {
                    debt_id: current.id().to_string(),
                    requested: amount,
                });
            }
            amount
        }
        ChangeType::Payoff => 0,
    };

    let mut debt = current.clone();
    debt.apply_balance(new_balance);
    if change_type == ChangeType::Payoff {
        debt.mark_paid_off();
    }

    let crossing = is_paid_off(new_balance)
        && (!is_paid_off(previous) || change_type == ChangeType::Payoff);
    let crosses_zero = crossing && debt.mark_reached_zero(now);

    let event = BalanceChangeEvent::new(
        current.id(),
        previous,
        new_balance,
        amount,
        change_type,
        now,
        notes,
    );

    Ok(PlannedChange {
        debt,
        event: Some(event),
        crosses_zero,
    })
}

/// Serializes debt writes through compare-and-set
pub struct BalanceChangeRecorder {
    store: Arc<dyn DebtStore>,
    clock: Arc<dyn Clock>,
    signals: Arc<ZeroBalanceSignals>,
    max_commit_attempts: u32,
}

impl BalanceChangeRecorder {
    pub fn new(
        store: Arc<dyn DebtStore>,
        clock: Arc<dyn Clock>,
        signals: Arc<ZeroBalanceSignals>,
        config: &RecorderConfig,
    ) -> Self {
        Self {
            store,
            clock,
            signals,
            max_commit_attempts: config.max_commit_attempts.max(1),
        }
    }

    /// Signal queue this recorder feeds
    pub fn signals(&self) -> &Arc<ZeroBalanceSignals> {
        &self.signals
    }

    /// Record a balance change and return the debt as committed
    ///
    /// `amount` is the payment for [`ChangeType::Payment`], the new absolute
    /// balance for [`ChangeType::Adjustment`], and the final payment logged
    /// with [`ChangeType::Payoff`] (which always closes the debt at zero).
    pub fn record_change(
        &self,
        debt_id: &str,
        amount: i64,
        change_type: ChangeType,
        notes: Option<String>,
    ) -> Result<Debt, RecordError> {
        self.commit_with_retry(debt_id, |current, now| {
            plan_change(current, amount, change_type, notes.clone(), now).map(Some)
        })
        .map(|(debt, _)| debt)
    }

    /// ZeroBalanceDetected -> PaidOff
    ///
    /// Already paid-off debts are returned unchanged.
    pub fn confirm_payoff(&self, debt_id: &str) -> Result<Debt, RecordError> {
        self.commit_with_retry(debt_id, |current, now| match current.state() {
            DebtState::PaidOff => Ok(None),
            DebtState::Active => Err(RecordError::NotZeroBalance(current.id().to_string())),
            DebtState::ZeroBalanceDetected => {
                let mut debt = current.clone();
                debt.mark_paid_off();
                let event = BalanceChangeEvent::new(
                    current.id(),
                    current.balance(),
                    current.balance(),
                    0,
                    ChangeType::Payoff,
                    now,
                    Some("zero balance confirmed".to_string()),
                );
                Ok(Some(PlannedChange {
                    debt,
                    event: Some(event),
                    crosses_zero: false,
                }))
            }
        })
        .map(|(debt, _)| debt)
    }

    /// Set `milestones_processed_at` once
    ///
    /// Returns true when this call set the marker; false when another
    /// detector run got there first.
    pub fn mark_milestones_processed(&self, debt_id: &str) -> Result<bool, RecordError> {
        self.commit_with_retry(debt_id, |current, now| {
            let mut debt = current.clone();
            if !debt.mark_milestones_processed(now) {
                return Ok(None);
            }
            Ok(Some(PlannedChange {
                debt,
                event: None,
                crosses_zero: false,
            }))
        })
        .map(|(_, committed)| committed)
    }

    /// Soft-delete a debt
    pub fn deactivate(&self, debt_id: &str) -> Result<Debt, RecordError> {
        self.commit_with_retry(debt_id, |current, now| {
            if !current.is_visible() {
                return Ok(None);
            }
            let mut debt = current.clone();
            debt.deactivate(now);
            Ok(Some(PlannedChange {
                debt,
                event: None,
                crosses_zero: false,
            }))
        })
        .map(|(debt, _)| debt)
    }

    /// Audit rows for a debt, oldest first
    pub fn history(&self, debt_id: &str) -> Result<Vec<BalanceChangeEvent>, RecordError> {
        Ok(self.store.history(debt_id)?)
    }

    /// Read-compute-commit loop
    ///
    /// `plan` returning `Ok(None)` means nothing to write; the current row is
    /// returned with `false`.
    fn commit_with_retry<F>(&self, debt_id: &str, plan: F) -> Result<(Debt, bool), RecordError>
    where
        F: Fn(&Debt, DateTime<Utc>) -> Result<Option<PlannedChange>, RecordError>,
    {
        for attempt in 1..=self.max_commit_attempts {
            let current = self
                .store
                .get_debt(debt_id)?
                .ok_or_else(|| RecordError::DebtNotFound(debt_id.to_string()))?;

            let planned = match plan(&current, self.clock.now())? {
                Some(planned) => planned,
                None => return Ok((current, false)),
            };

            let reached_zero_at = planned.debt.reached_zero_at();
            let crosses_zero = planned.crosses_zero;

            match self
                .store
                .commit(current.version(), planned.debt, planned.event)?
            {
                CommitOutcome::Committed(debt) => {
                    if let (true, Some(at)) = (crosses_zero, reached_zero_at) {
                        log::info!("debt {} reached zero balance", debt.id());
                        self.signals.push(ZeroBalanceSignal {
                            debt_id: debt.id().to_string(),
                            user_id: debt.owner_id().to_string(),
                            reached_zero_at: at,
                        });
                    }
                    return Ok((debt, true));
                }
                CommitOutcome::Conflict { current_version } => {
                    log::debug!(
                        "commit conflict on debt {} (attempt {}, read v{}, now v{})",
                        debt_id,
                        attempt,
                        current.version(),
                        current_version
                    );
                }
            }
        }

        Err(RecordError::Contention {
            debt_id: debt_id.to_string(),
            attempts: self.max_commit_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn debt(balance: i64) -> Debt {
        Debt::new("d1", "u1", "Card", balance, 1_800, 2_500, Utc::now()).unwrap()
    }

    #[test]
    fn test_payment_floors_at_zero_and_crosses() {
        let planned = plan_change(&debt(5_000), 7_000, ChangeType::Payment, None, Utc::now()).unwrap();
        assert_eq!(planned.debt.balance(), 0);
        assert!(planned.crosses_zero);
        assert_eq!(planned.debt.state(), DebtState::ZeroBalanceDetected);
        let event = planned.event.unwrap();
        assert_eq!(event.previous_balance, 5_000);
        assert_eq!(event.new_balance, 0);
        assert_eq!(event.payment_amount, 7_000);
    }

    #[test]
    fn test_payment_leaving_one_cent_counts_as_zero() {
        let planned = plan_change(&debt(5_000), 4_999, ChangeType::Payment, None, Utc::now()).unwrap();
        assert_eq!(planned.debt.balance(), 1);
        assert!(planned.crosses_zero);
    }

    #[test]
    fn test_partial_payment_does_not_cross() {
        let planned = plan_change(&debt(5_000), 1_000, ChangeType::Payment, None, Utc::now()).unwrap();
        assert_eq!(planned.debt.balance(), 4_000);
        assert!(!planned.crosses_zero);
        assert_eq!(planned.debt.reached_zero_at(), None);
    }

    #[test]
    fn test_second_crossing_does_not_reset_marker() {
        let first = plan_change(&debt(5_000), 5_000, ChangeType::Payment, None, Utc::now()).unwrap();
        let again = plan_change(&first.debt, 100, ChangeType::Payment, None, Utc::now()).unwrap();
        assert!(!again.crosses_zero);
        assert_eq!(again.debt.reached_zero_at(), first.debt.reached_zero_at());
    }

    #[test]
    fn test_adjustment_sets_absolute_balance() {
        let planned = plan_change(&debt(5_000), 8_000, ChangeType::Adjustment, None, Utc::now()).unwrap();
        assert_eq!(planned.debt.balance(), 8_000);
        assert_eq!(planned.debt.original_balance(), 8_000);
    }

    #[test]
    fn test_adjustment_cannot_reopen_zeroed_debt() {
        let zeroed = plan_change(&debt(5_000), 5_000, ChangeType::Payment, None, Utc::now())
            .unwrap()
            .debt;
        let err = plan_change(&zeroed, 3_000, ChangeType::Adjustment, None, Utc::now()).unwrap_err();
        assert!(matches!(err, RecordError::ReopenNotAllowed { requested: 3_000, .. }));
    }

    #[test]
    fn test_payoff_closes_directly() {
        let planned = plan_change(&debt(5_000), 5_000, ChangeType::Payoff, None, Utc::now()).unwrap();
        assert_eq!(planned.debt.state(), DebtState::PaidOff);
        assert!(planned.crosses_zero);

        let err = plan_change(&planned.debt, 10, ChangeType::Payment, None, Utc::now()).unwrap_err();
        assert_eq!(err, RecordError::DebtClosed("d1".to_string()));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let err = plan_change(&debt(5_000), -1, ChangeType::Payment, None, Utc::now()).unwrap_err();
        assert_eq!(err, RecordError::NegativeAmount(-1));
    }
}
