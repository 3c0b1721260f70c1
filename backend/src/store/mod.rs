//! Persistence collaborators
//!
//! The engine never owns a storage engine. It talks to three collaborator
//! roles through traits:
//!
//! - [`DebtStore`]: debt rows plus the append-only audit log. Balance writes
//!   and their audit rows are committed together with a compare-and-set on
//!   the debt's `version`.
//! - [`MilestoneStore`]: milestone records with an insert-if-absent
//!   uniqueness guarantee on `(user_id, milestone_type)`.
//!
//! [`InMemoryStore`] implements both and backs the tests and the CLI.
//!
//! # Critical Invariants
//!
//! 1. **Atomic commit**: a debt row and its audit row land together or not at all
//! 2. **Append-only audit**: audit rows are never updated or deleted
//! 3. **Unique milestones**: at most one record per `(user_id, milestone_type)`

pub mod memory;

use crate::models::{BalanceChangeEvent, Debt, MilestoneRecord};
use thiserror::Error;

pub use memory::InMemoryStore;

/// Infrastructure failures reported by a store
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Debt not found: {0}")]
    DebtNotFound(String),

    #[error("Debt already exists: {0}")]
    DuplicateDebt(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Store lock poisoned")]
    Poisoned,
}

/// Result of a compare-and-set commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Written; carries the debt as stored (new version)
    Committed(Debt),
    /// Version moved since it was read; nothing written
    Conflict { current_version: u64 },
}

/// Debt rows and the balance audit log
pub trait DebtStore: Send + Sync {
    /// Insert a new debt row
    fn insert_debt(&self, debt: Debt) -> Result<Debt, StoreError>;

    /// Read one debt (including paid-off and deactivated rows)
    fn get_debt(&self, debt_id: &str) -> Result<Option<Debt>, StoreError>;

    /// All non-deactivated debts of a user, any status, ordered by id
    fn debts_for_user(&self, user_id: &str) -> Result<Vec<Debt>, StoreError>;

    /// Non-deactivated debts of a user still being repaid, ordered by id
    fn active_debts(&self, user_id: &str) -> Result<Vec<Debt>, StoreError> {
        Ok(self
            .debts_for_user(user_id)?
            .into_iter()
            .filter(|d| d.state() == crate::models::DebtState::Active)
            .collect())
    }

    /// Write `debt` (and `event`, if any) only if the stored version still
    /// equals `expected_version`. The stored version is bumped on success.
    fn commit(
        &self,
        expected_version: u64,
        debt: Debt,
        event: Option<BalanceChangeEvent>,
    ) -> Result<CommitOutcome, StoreError>;

    /// Debts whose zero crossing the milestone detector has not handled
    fn pending_zero_balance(&self) -> Result<Vec<Debt>, StoreError>;

    /// Audit rows for one debt, oldest first
    fn history(&self, debt_id: &str) -> Result<Vec<BalanceChangeEvent>, StoreError>;
}

/// Earned milestones
pub trait MilestoneStore: Send + Sync {
    /// Insert unless `(user_id, milestone_type)` already exists.
    /// Returns true when this call inserted the record.
    fn insert_milestone_if_absent(&self, record: MilestoneRecord) -> Result<bool, StoreError>;

    /// Milestones earned by a user, ordered by type
    fn milestones_for_user(&self, user_id: &str) -> Result<Vec<MilestoneRecord>, StoreError>;
}
