//! Debt Payoff Core - Rust Engine
//!
//! Deterministic payoff planning plus the balance-tracking and milestone
//! pipeline behind it.
//!
//! # Architecture
//!
//! - **core**: Money arithmetic, clock, configuration
//! - **models**: Domain types (Debt, BalanceChangeEvent, MilestoneRecord)
//! - **planner**: Snowball/avalanche simulation and comparison
//! - **store**: Persistence collaborator traits + in-memory implementation
//! - **ledger**: Balance change recorder (compare-and-set + audit)
//! - **milestones**: Progress classification, detector, periodic monitor
//! - **notifications**: Dispatcher trait and best-effort outbox
//! - **orchestrator**: `DebtEngine`, the entry point wiring it all together
//!
//! # Critical Invariants
//!
//! 1. All money values are i64 (cents); rates are basis points
//! 2. Planning is pure and deterministic
//! 3. Every balance write carries its audit row in the same commit
//! 4. Each milestone is awarded at most once per user

// Module declarations
pub mod core;
pub mod ledger;
pub mod milestones;
pub mod models;
pub mod notifications;
pub mod orchestrator;
pub mod planner;
pub mod store;

// Re-exports for convenience
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::config::{ConfigError, EngineConfig};
pub use ledger::{BalanceChangeRecorder, RecordError};
pub use milestones::{MilestoneDetector, MilestoneMonitor, Progress, ScanReport};
pub use models::{
    BalanceChangeEvent, ChangeType, Debt, DebtError, DebtState, DebtStatus, MilestoneRecord,
    MilestoneType,
};
pub use notifications::{NotificationDispatcher, NotificationEvent, NotificationOutbox};
pub use orchestrator::{DebtEngine, EngineError, NewDebt};
pub use planner::{
    compare, simulate, DebtPayoff, DebtSnapshot, PayoffPlan, PlanRequest, Strategy,
    StrategyComparison, ValidationError,
};
pub use store::{DebtStore, InMemoryStore, MilestoneStore, StoreError};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn debt_payoff_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::engine::PyDebtEngine>()?;
    m.add_function(wrap_pyfunction!(ffi::simulate_plan, m)?)?;
    m.add_function(wrap_pyfunction!(ffi::compare_strategies, m)?)?;
    Ok(())
}
