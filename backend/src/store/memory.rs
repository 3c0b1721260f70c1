//! In-memory store
//!
//! A single mutex guards debts, audit rows and milestones, which makes every
//! trait method one indivisible operation. That is the same guarantee a SQL
//! store gives with `UPDATE ... WHERE version = $n` and a unique index.

use super::{CommitOutcome, DebtStore, MilestoneStore, StoreError};
use crate::models::{BalanceChangeEvent, Debt, MilestoneRecord, MilestoneType};
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    debts: BTreeMap<String, Debt>,
    audit: Vec<BalanceChangeEvent>,
    milestones: HashMap<(String, MilestoneType), MilestoneRecord>,
}

/// Thread-safe in-memory implementation of [`DebtStore`] and [`MilestoneStore`]
///
/// # Example
/// ```
/// use chrono::Utc;
/// use debt_payoff_core::store::{DebtStore, InMemoryStore};
/// use debt_payoff_core::Debt;
///
/// let store = InMemoryStore::new();
/// let debt = Debt::new("loan", "user-1", "Car loan", 500_000, 650, 15_000, Utc::now()).unwrap();
/// store.insert_debt(debt).unwrap();
/// assert_eq!(store.active_debts("user-1").unwrap().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner.lock().map_err(|_| StoreError::Poisoned)
    }

    /// Total audit rows across all debts
    pub fn audit_len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.audit.len())
    }
}

impl DebtStore for InMemoryStore {
    fn insert_debt(&self, mut debt: Debt) -> Result<Debt, StoreError> {
        let mut inner = self.lock()?;
        if inner.debts.contains_key(debt.id()) {
            return Err(StoreError::DuplicateDebt(debt.id().to_string()));
        }
        debt.set_version(1);
        inner.debts.insert(debt.id().to_string(), debt.clone());
        Ok(debt)
    }

    fn get_debt(&self, debt_id: &str) -> Result<Option<Debt>, StoreError> {
        Ok(self.lock()?.debts.get(debt_id).cloned())
    }

    fn debts_for_user(&self, user_id: &str) -> Result<Vec<Debt>, StoreError> {
        Ok(self
            .lock()?
            .debts
            .values()
            .filter(|d| d.owner_id() == user_id && d.is_visible())
            .cloned()
            .collect())
    }

    fn commit(
        &self,
        expected_version: u64,
        mut debt: Debt,
        event: Option<BalanceChangeEvent>,
    ) -> Result<CommitOutcome, StoreError> {
        let mut inner = self.lock()?;
        let current_version = match inner.debts.get(debt.id()) {
            Some(current) => current.version(),
            None => return Err(StoreError::DebtNotFound(debt.id().to_string())),
        };
        if current_version != expected_version {
            return Ok(CommitOutcome::Conflict { current_version });
        }

        debt.set_version(current_version + 1);
        inner.debts.insert(debt.id().to_string(), debt.clone());
        if let Some(event) = event {
            inner.audit.push(event);
        }
        Ok(CommitOutcome::Committed(debt))
    }

    fn pending_zero_balance(&self) -> Result<Vec<Debt>, StoreError> {
        Ok(self
            .lock()?
            .debts
            .values()
            .filter(|d| d.awaits_milestone_processing())
            .cloned()
            .collect())
    }

    fn history(&self, debt_id: &str) -> Result<Vec<BalanceChangeEvent>, StoreError> {
        Ok(self
            .lock()?
            .audit
            .iter()
            .filter(|e| e.debt_id == debt_id)
            .cloned()
            .collect())
    }
}

impl MilestoneStore for InMemoryStore {
    fn insert_milestone_if_absent(&self, record: MilestoneRecord) -> Result<bool, StoreError> {
        let mut inner = self.lock()?;
        match inner.milestones.entry(record.key()) {
            std::collections::hash_map::Entry::Occupied(_) => Ok(false),
            std::collections::hash_map::Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(true)
            }
        }
    }

    fn milestones_for_user(&self, user_id: &str) -> Result<Vec<MilestoneRecord>, StoreError> {
        let mut records: Vec<MilestoneRecord> = self
            .lock()?
            .milestones
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect();
        records.sort_by_key(|r| r.milestone_type);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChangeType;
    use chrono::Utc;

    fn sample_debt(id: &str) -> Debt {
        Debt::new(id, "u1", "Loan", 10_000, 0, 1_000, Utc::now()).unwrap()
    }

    #[test]
    fn test_insert_assigns_version_and_rejects_duplicates() {
        let store = InMemoryStore::new();
        let stored = store.insert_debt(sample_debt("d1")).unwrap();
        assert_eq!(stored.version(), 1);
        assert_eq!(
            store.insert_debt(sample_debt("d1")).unwrap_err(),
            StoreError::DuplicateDebt("d1".to_string())
        );
    }

    #[test]
    fn test_commit_conflict_writes_nothing() {
        let store = InMemoryStore::new();
        let stored = store.insert_debt(sample_debt("d1")).unwrap();

        let event = BalanceChangeEvent::new("d1", 10_000, 9_000, 1_000, ChangeType::Payment, Utc::now(), None);
        let outcome = store.commit(stored.version() + 5, stored.clone(), Some(event)).unwrap();

        assert_eq!(outcome, CommitOutcome::Conflict { current_version: 1 });
        assert_eq!(store.audit_len().unwrap(), 0);
    }

    #[test]
    fn test_commit_bumps_version_and_appends_audit() {
        let store = InMemoryStore::new();
        let stored = store.insert_debt(sample_debt("d1")).unwrap();
        let event = BalanceChangeEvent::new("d1", 10_000, 9_000, 1_000, ChangeType::Payment, Utc::now(), None);

        match store.commit(1, stored, Some(event)).unwrap() {
            CommitOutcome::Committed(debt) => assert_eq!(debt.version(), 2),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(store.history("d1").unwrap().len(), 1);
    }

    #[test]
    fn test_milestone_uniqueness() {
        let store = InMemoryStore::new();
        let record = MilestoneRecord {
            user_id: "u1".to_string(),
            milestone_type: MilestoneType::Pct25,
            earned_at: Utc::now(),
            debt_id: "d1".to_string(),
        };
        assert!(store.insert_milestone_if_absent(record.clone()).unwrap());
        assert!(!store.insert_milestone_if_absent(record).unwrap());
        assert_eq!(store.milestones_for_user("u1").unwrap().len(), 1);
    }
}
