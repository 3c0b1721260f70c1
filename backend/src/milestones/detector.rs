//! Milestone detector
//!
//! Turns recorded zero crossings into milestone records and notification
//! events. Two entry points share one per-debt routine:
//!
//! - [`MilestoneDetector::process_signals`]: synchronous, right after a
//!   recorder call that set `reached_zero_at`
//! - [`MilestoneDetector::scan_pending`]: periodic recovery pass over every
//!   debt whose zero crossing is not yet processed
//!
//! Both may run at the same time on the same debt. Duplicate milestones are
//! impossible because every award goes through the store's insert-if-absent;
//! a payoff reminder is sent only by the run that wins the set-once
//! `milestones_processed_at` commit.

use super::progress::Progress;
use crate::core::clock::Clock;
use crate::core::config::DetectorConfig;
use crate::ledger::{BalanceChangeRecorder, RecordError, ZeroBalanceSignals};
use crate::models::{DebtState, MilestoneRecord, MilestoneType};
use crate::notifications::{MilestonePayload, NotificationEvent, NotificationOutbox};
use crate::store::{DebtStore, MilestoneStore, StoreError};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Errors that abort a detector pass
#[derive(Debug, Error, PartialEq)]
pub enum DetectorError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Record error: {0}")]
    Record(#[from] RecordError),
}

/// A milestone awarded during a pass
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AwardedMilestone {
    pub user_id: String,
    pub milestone_type: MilestoneType,
    pub debt_id: String,
}

/// Outcome of a detector pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Debts whose processing marker this pass set
    pub debts_processed: usize,
    pub milestones_awarded: Vec<AwardedMilestone>,
    pub payoffs_confirmed: usize,
    pub reminders_queued: usize,
    /// Debts that failed and were left for the next pass
    pub failures: usize,
}

impl ScanReport {
    fn absorb(&mut self, other: ScanReport) {
        self.debts_processed += other.debts_processed;
        self.milestones_awarded.extend(other.milestones_awarded);
        self.payoffs_confirmed += other.payoffs_confirmed;
        self.reminders_queued += other.reminders_queued;
        self.failures += other.failures;
    }
}

/// Classifies progress and awards milestones
pub struct MilestoneDetector {
    debts: Arc<dyn DebtStore>,
    milestones: Arc<dyn MilestoneStore>,
    recorder: Arc<BalanceChangeRecorder>,
    signals: Arc<ZeroBalanceSignals>,
    outbox: Arc<NotificationOutbox>,
    clock: Arc<dyn Clock>,
    auto_confirm_payoff: bool,
}

impl MilestoneDetector {
    pub fn new(
        debts: Arc<dyn DebtStore>,
        milestones: Arc<dyn MilestoneStore>,
        recorder: Arc<BalanceChangeRecorder>,
        outbox: Arc<NotificationOutbox>,
        clock: Arc<dyn Clock>,
        config: &DetectorConfig,
    ) -> Self {
        let signals = Arc::clone(recorder.signals());
        Self {
            debts,
            milestones,
            recorder,
            signals,
            outbox,
            clock,
            auto_confirm_payoff: config.auto_confirm_payoff,
        }
    }

    /// Synchronous entry point: handle every queued zero-balance signal
    ///
    /// A failing debt is logged and counted; the periodic scan retries it.
    pub fn process_signals(&self) -> ScanReport {
        let mut report = ScanReport::default();
        for signal in self.signals.drain() {
            match self.process_debt(&signal.debt_id) {
                Ok(r) => report.absorb(r),
                Err(err) => {
                    log::warn!(
                        "inline milestone processing failed for debt {}: {}",
                        signal.debt_id,
                        err
                    );
                    report.failures += 1;
                }
            }
        }
        report
    }

    /// Periodic entry point: handle every unprocessed zero crossing
    ///
    /// # Errors
    /// Fails only if the pending list itself cannot be read.
    pub fn scan_pending(&self) -> Result<ScanReport, DetectorError> {
        let pending = self.debts.pending_zero_balance()?;
        let mut report = ScanReport::default();
        if !pending.is_empty() {
            log::debug!("milestone scan found {} pending debts", pending.len());
        }

        for debt in pending {
            match self.process_debt(debt.id()) {
                Ok(r) => report.absorb(r),
                Err(err) => {
                    log::warn!("milestone scan failed for debt {}: {}", debt.id(), err);
                    report.failures += 1;
                }
            }
        }
        Ok(report)
    }

    /// Award milestones for one zeroed debt and settle its lifecycle
    pub fn process_debt(&self, debt_id: &str) -> Result<ScanReport, DetectorError> {
        let mut report = ScanReport::default();

        let debt = match self.debts.get_debt(debt_id)? {
            Some(debt) if debt.awaits_milestone_processing() => debt,
            _ => return Ok(report),
        };

        if debt.is_visible() {
            let user_debts = self.debts.debts_for_user(debt.owner_id())?;
            let progress = Progress::measure(&user_debts);

            for milestone_type in progress.qualifying() {
                let record = MilestoneRecord {
                    user_id: debt.owner_id().to_string(),
                    milestone_type,
                    earned_at: self.clock.now(),
                    debt_id: debt.id().to_string(),
                };
                if !self.milestones.insert_milestone_if_absent(record)? {
                    continue;
                }

                log::info!(
                    "user {} earned {} (debt {}, progress {} bps)",
                    debt.owner_id(),
                    milestone_type,
                    debt.id(),
                    progress.progress_bps
                );
                self.outbox.enqueue(NotificationEvent::Milestone {
                    user_id: debt.owner_id().to_string(),
                    milestone_type,
                    payload: MilestonePayload {
                        debt_id: debt.id().to_string(),
                        debt_name: debt.name().to_string(),
                        progress_bps: progress.progress_bps,
                        paid_original_total: progress.paid_original_total,
                        original_total: progress.original_total,
                    },
                });
                report.milestones_awarded.push(AwardedMilestone {
                    user_id: debt.owner_id().to_string(),
                    milestone_type,
                    debt_id: debt.id().to_string(),
                });
            }
        }

        if self.auto_confirm_payoff && debt.state() == DebtState::ZeroBalanceDetected {
            let confirmed = self.recorder.confirm_payoff(debt.id())?;
            if confirmed.state() == DebtState::PaidOff {
                report.payoffs_confirmed += 1;
            }
        }

        if self.recorder.mark_milestones_processed(debt.id())? {
            report.debts_processed += 1;
            if !self.auto_confirm_payoff && debt.state() == DebtState::ZeroBalanceDetected {
                self.outbox.enqueue(NotificationEvent::PayoffReminder {
                    debt_id: debt.id().to_string(),
                });
                report.reminders_queued += 1;
            }
        }

        Ok(report)
    }
}
