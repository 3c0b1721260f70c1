//! Payoff planning
//!
//! - **simulator**: pure month-by-month amortization ([`simulate`])
//! - **comparator**: snowball vs. avalanche deltas ([`compare`])
//! - **service**: store-backed coordinator ([`PayoffPlanner`])
//! - **fingerprint**: SHA-256 of canonical plan JSON
//!
//! # Critical Invariants
//!
//! 1. Simulation is deterministic: identical input yields a bit-identical plan
//! 2. Target order depends only on debt data, never on input order
//! 3. The simulator always terminates (600-month cap)

pub mod comparator;
pub mod fingerprint;
pub mod service;
pub mod simulator;
pub mod types;

pub use comparator::compare;
pub use service::{PayoffPlanner, PlanningError};
pub use simulator::{order_debts, simulate, step_month, validate, MonthState, MAX_MONTHS};
pub use types::{
    DebtPayoff, DebtSnapshot, MonthSummary, PayoffPlan, PlanRequest, Strategy,
    StrategyComparison, ValidationError,
};
