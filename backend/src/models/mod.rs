//! Domain models for the debt payoff engine

pub mod balance_change;
pub mod debt;
pub mod milestone;

// Re-exports
pub use balance_change::{BalanceChangeEvent, ChangeType};
pub use debt::{Debt, DebtError, DebtState, DebtStatus};
pub use milestone::{MilestoneRecord, MilestoneType};
