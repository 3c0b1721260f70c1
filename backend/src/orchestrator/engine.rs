//! Debt Engine
//!
//! Wires every component behind one entry point:
//! - Planning (store snapshot -> pure simulator/comparator)
//! - Balance changes (recorder, compare-and-set + audit)
//! - Milestone detection (inline after a zero crossing, periodic via monitor)
//! - Notification delivery (outbox -> dispatcher)
//!
//! # Payment flow
//!
//! ```text
//! record_change(debt, amount, type)
//! 1. Recorder commits balance + audit row        (failure -> Err, nothing else runs)
//! 2. Zero crossing? detector drains the signal    (failure -> logged, scan retries)
//! 3. Outbox flushes to the dispatcher             (failure -> logged, retried later)
//! ```
//!
//! Steps 2 and 3 can never turn a committed payment into a reported failure.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use debt_payoff_core::orchestrator::{DebtEngine, NewDebt};
//! use debt_payoff_core::core::clock::SystemClock;
//! use debt_payoff_core::notifications::RecordingDispatcher;
//! use debt_payoff_core::{EngineConfig, MilestoneType, Strategy};
//!
//! let dispatcher = Arc::new(RecordingDispatcher::new());
//! let engine = DebtEngine::in_memory(EngineConfig::default(), dispatcher.clone(), Arc::new(SystemClock)).unwrap();
//!
//! engine.create_debt(NewDebt {
//!     id: "card".to_string(),
//!     owner_id: "user-1".to_string(),
//!     name: "Store card".to_string(),
//!     balance: 40_000,
//!     annual_rate_bps: 2_199,
//!     minimum_payment: 2_500,
//! }).unwrap();
//!
//! let plan = engine.plan("user-1", 5_000, Strategy::Snowball).unwrap();
//! assert!(!plan.exceeds_horizon);
//!
//! engine.record_payment("card", 40_000, None).unwrap();
//! assert_eq!(dispatcher.milestone_count("user-1", MilestoneType::DebtFree), 1);
//! ```

use crate::core::clock::Clock;
use crate::core::config::{ConfigError, EngineConfig};
use crate::ledger::{BalanceChangeRecorder, RecordError, ZeroBalanceSignals};
use crate::milestones::{MilestoneDetector, MilestoneMonitor, ScanReport};
use crate::models::{BalanceChangeEvent, ChangeType, Debt, DebtError, MilestoneRecord};
use crate::notifications::{FlushReport, NotificationDispatcher, NotificationOutbox};
use crate::planner::{PayoffPlan, PayoffPlanner, PlanningError, Strategy, StrategyComparison};
use crate::store::{DebtStore, InMemoryStore, MilestoneStore, StoreError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// Errors surfaced by the engine
#[derive(Debug, Error, PartialEq)]
pub enum EngineError {
    #[error("Invalid debt: {0}")]
    InvalidDebt(#[from] DebtError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Planning(#[from] PlanningError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

// ============================================================================
// Inputs
// ============================================================================

/// Fields a user supplies when entering a debt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDebt {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    /// Cents
    pub balance: i64,
    /// Basis points
    pub annual_rate_bps: i64,
    /// Cents
    pub minimum_payment: i64,
}

// ============================================================================
// Engine
// ============================================================================

/// Entry point for planning and payment operations
pub struct DebtEngine {
    config: EngineConfig,
    clock: Arc<dyn Clock>,
    debts: Arc<dyn DebtStore>,
    milestones: Arc<dyn MilestoneStore>,
    recorder: Arc<BalanceChangeRecorder>,
    detector: Arc<MilestoneDetector>,
    outbox: Arc<NotificationOutbox>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    planner: PayoffPlanner,
    monitor: Arc<MilestoneMonitor>,
}

impl DebtEngine {
    /// Build an engine over the given collaborators
    ///
    /// # Errors
    /// Rejects an invalid configuration.
    pub fn new(
        config: EngineConfig,
        debts: Arc<dyn DebtStore>,
        milestones: Arc<dyn MilestoneStore>,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let signals = Arc::new(ZeroBalanceSignals::new());
        let outbox = Arc::new(NotificationOutbox::new(&config.outbox));
        let recorder = Arc::new(BalanceChangeRecorder::new(
            Arc::clone(&debts),
            Arc::clone(&clock),
            signals,
            &config.recorder,
        ));
        let detector = Arc::new(MilestoneDetector::new(
            Arc::clone(&debts),
            Arc::clone(&milestones),
            Arc::clone(&recorder),
            Arc::clone(&outbox),
            Arc::clone(&clock),
            &config.detector,
        ));
        let monitor = Arc::new(MilestoneMonitor::new(
            Arc::clone(&detector),
            Arc::clone(&outbox),
            Arc::clone(&dispatcher),
            Arc::clone(&clock),
            config.scan_interval(),
        ));
        let planner = PayoffPlanner::new(Arc::clone(&debts));

        Ok(Self {
            config,
            clock,
            debts,
            milestones,
            recorder,
            detector,
            outbox,
            dispatcher,
            planner,
            monitor,
        })
    }

    /// Engine backed by a fresh [`InMemoryStore`]
    pub fn in_memory(
        config: EngineConfig,
        dispatcher: Arc<dyn NotificationDispatcher>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        let store = Arc::new(InMemoryStore::new());
        Self::new(config, store.clone(), store, dispatcher, clock)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Periodic scanner; call `start`/`poll` or `spawn` on it
    pub fn monitor(&self) -> &Arc<MilestoneMonitor> {
        &self.monitor
    }

    pub fn detector(&self) -> &Arc<MilestoneDetector> {
        &self.detector
    }

    // ========================================================================
    // Debts
    // ========================================================================

    /// Enter a new debt
    pub fn create_debt(&self, new_debt: NewDebt) -> Result<Debt, EngineError> {
        let debt = Debt::new(
            new_debt.id,
            new_debt.owner_id,
            new_debt.name,
            new_debt.balance,
            new_debt.annual_rate_bps,
            new_debt.minimum_payment,
            self.clock.now(),
        )?;
        Ok(self.debts.insert_debt(debt)?)
    }

    pub fn debt(&self, debt_id: &str) -> Result<Option<Debt>, EngineError> {
        Ok(self.debts.get_debt(debt_id)?)
    }

    /// Visible debts of a user, any status
    pub fn debts_for_user(&self, user_id: &str) -> Result<Vec<Debt>, EngineError> {
        Ok(self.debts.debts_for_user(user_id)?)
    }

    // ========================================================================
    // Balance changes
    // ========================================================================

    /// Record any balance change, then run the inline milestone path
    pub fn record_change(
        &self,
        debt_id: &str,
        amount: i64,
        change_type: ChangeType,
        notes: Option<String>,
    ) -> Result<Debt, EngineError> {
        let debt = self
            .recorder
            .record_change(debt_id, amount, change_type, notes)?;
        self.after_write();
        Ok(debt)
    }

    /// Pay `amount` cents off a debt
    pub fn record_payment(
        &self,
        debt_id: &str,
        amount: i64,
        notes: Option<String>,
    ) -> Result<Debt, EngineError> {
        self.record_change(debt_id, amount, ChangeType::Payment, notes)
    }

    /// Set a debt's balance to `new_balance` cents
    pub fn record_adjustment(
        &self,
        debt_id: &str,
        new_balance: i64,
        notes: Option<String>,
    ) -> Result<Debt, EngineError> {
        self.record_change(debt_id, new_balance, ChangeType::Adjustment, notes)
    }

    /// Close a debt directly (Active -> PaidOff)
    pub fn mark_paid_off(&self, debt_id: &str, notes: Option<String>) -> Result<Debt, EngineError> {
        let current = self
            .debts
            .get_debt(debt_id)?
            .ok_or_else(|| RecordError::DebtNotFound(debt_id.to_string()))?;
        self.record_change(debt_id, current.balance(), ChangeType::Payoff, notes)
    }

    /// User confirms a ZeroBalanceDetected debt
    pub fn confirm_payoff(&self, debt_id: &str) -> Result<Debt, EngineError> {
        Ok(self.recorder.confirm_payoff(debt_id)?)
    }

    /// Soft-delete a debt
    pub fn deactivate(&self, debt_id: &str) -> Result<Debt, EngineError> {
        Ok(self.recorder.deactivate(debt_id)?)
    }

    /// Audit rows for a debt, oldest first
    pub fn history(&self, debt_id: &str) -> Result<Vec<BalanceChangeEvent>, EngineError> {
        Ok(self.recorder.history(debt_id)?)
    }

    pub fn milestones(&self, user_id: &str) -> Result<Vec<MilestoneRecord>, EngineError> {
        Ok(self.milestones.milestones_for_user(user_id)?)
    }

    // ========================================================================
    // Planning
    // ========================================================================

    pub fn plan(
        &self,
        user_id: &str,
        extra_payment: i64,
        strategy: Strategy,
    ) -> Result<PayoffPlan, EngineError> {
        Ok(self.planner.plan(user_id, extra_payment, strategy)?)
    }

    pub fn compare(
        &self,
        user_id: &str,
        extra_payment: i64,
    ) -> Result<StrategyComparison, EngineError> {
        Ok(self.planner.compare(user_id, extra_payment)?)
    }

    // ========================================================================
    // Notifications
    // ========================================================================

    /// Deliver whatever the outbox holds
    pub fn flush_notifications(&self) -> FlushReport {
        self.outbox.flush(self.dispatcher.as_ref())
    }

    /// Events still waiting for delivery
    pub fn pending_notifications(&self) -> usize {
        self.outbox.len()
    }

    /// Inline milestone path. Never fails the caller.
    fn after_write(&self) -> Option<ScanReport> {
        if self.recorder.signals().is_empty() {
            return None;
        }
        let report = self.detector.process_signals();
        if report.failures > 0 {
            log::warn!(
                "{} zero-balance signals left for the periodic scan",
                report.failures
            );
        }
        self.flush_notifications();
        Some(report)
    }
}
