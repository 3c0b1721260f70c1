//! Debt ledger: the single write path for debt rows
//!
//! - **recorder**: [`BalanceChangeRecorder`], compare-and-set writes + audit rows
//! - **signals**: [`ZeroBalanceSignals`], zero crossings awaiting the detector

pub mod recorder;
pub mod signals;

pub use recorder::{plan_change, BalanceChangeRecorder, PlannedChange, RecordError};
pub use signals::{ZeroBalanceSignal, ZeroBalanceSignals};
