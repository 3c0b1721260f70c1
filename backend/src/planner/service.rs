//! Planning coordinator
//!
//! Fetches a user's active-debt snapshot from the [`DebtStore`] and hands it
//! to the pure simulator/comparator. All I/O lives here; the simulator never
//! sees the store.

use super::comparator::compare;
use super::simulator::simulate;
use super::types::{DebtSnapshot, PayoffPlan, Strategy, StrategyComparison, ValidationError};
use crate::store::{DebtStore, StoreError};
use std::sync::Arc;
use thiserror::Error;

/// Failures of a store-backed planning request
#[derive(Debug, Error, PartialEq)]
pub enum PlanningError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Store-backed planner
pub struct PayoffPlanner {
    store: Arc<dyn DebtStore>,
}

impl PayoffPlanner {
    pub fn new(store: Arc<dyn DebtStore>) -> Self {
        Self { store }
    }

    /// Immutable snapshot of the user's active debts
    pub fn snapshot(&self, user_id: &str) -> Result<Vec<DebtSnapshot>, StoreError> {
        Ok(self
            .store
            .active_debts(user_id)?
            .iter()
            .map(DebtSnapshot::from)
            .collect())
    }

    /// Plan the user's active debts under one strategy
    pub fn plan(
        &self,
        user_id: &str,
        extra_payment: i64,
        strategy: Strategy,
    ) -> Result<PayoffPlan, PlanningError> {
        let snapshot = self.snapshot(user_id)?;
        let plan = simulate(&snapshot, extra_payment, strategy)?;
        log::debug!(
            "planned {} debts for user {} ({}): {} months, exceeds_horizon={}",
            snapshot.len(),
            user_id,
            strategy,
            plan.total_months,
            plan.exceeds_horizon
        );
        Ok(plan)
    }

    /// Compare both strategies on the user's active debts
    pub fn compare(
        &self,
        user_id: &str,
        extra_payment: i64,
    ) -> Result<StrategyComparison, PlanningError> {
        let snapshot = self.snapshot(user_id)?;
        Ok(compare(&snapshot, extra_payment)?)
    }
}
