//! Debt model
//!
//! A debt owned by a user. Each debt has:
//! - Current and original balance (i64 cents)
//! - Annual interest rate (basis points)
//! - Minimum monthly payment (i64 cents)
//! - Lifecycle status and the set-once `reached_zero_at` marker
//!
//! # Lifecycle
//!
//! ```text
//! Active --(balance crosses <= epsilon)--> ZeroBalanceDetected --(confirm)--> PaidOff
//! Active --(explicit mark paid off)-----------------------------------------> PaidOff
//! ```
//!
//! Debts are never hard-deleted; `deactivated_at` hides them instead.
//!
//! CRITICAL: All money values are i64 (cents)

use crate::core::money::is_paid_off;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Persisted status column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    Active,
    PaidOff,
}

/// Lifecycle state derived from status and `reached_zero_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebtState {
    /// Still being repaid
    Active,
    /// Balance crossed zero; awaiting confirmation
    ZeroBalanceDetected,
    /// Terminal
    PaidOff,
}

/// Errors that can occur when constructing a debt
#[derive(Debug, Error, PartialEq)]
pub enum DebtError {
    #[error("Debt id must not be empty")]
    EmptyId,

    #[error("Owner id must not be empty")]
    EmptyOwner,

    #[error("Balance must be non-negative, got {0}")]
    NegativeBalance(i64),

    #[error("Annual interest rate must be non-negative, got {0} bps")]
    NegativeRate(i64),

    #[error("Minimum payment must be non-negative, got {0}")]
    NegativeMinimumPayment(i64),
}

/// A user's debt
///
/// # Example
/// ```
/// use chrono::Utc;
/// use debt_payoff_core::{Debt, DebtState};
///
/// let debt = Debt::new("card", "user-1", "Visa", 250_000, 1_999, 5_000, Utc::now()).unwrap();
/// assert_eq!(debt.balance(), 250_000);
/// assert_eq!(debt.original_balance(), 250_000);
/// assert_eq!(debt.state(), DebtState::Active);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Debt {
    id: String,
    owner_id: String,
    name: String,

    /// Current balance (i64 cents)
    balance: i64,

    /// Balance at entry, raised if an adjustment grows the debt
    original_balance: i64,

    /// Annual interest rate in basis points
    annual_rate_bps: i64,

    /// Minimum monthly payment (i64 cents)
    minimum_payment: i64,

    status: DebtStatus,

    /// Set exactly once, when the balance first crosses to <= epsilon
    reached_zero_at: Option<DateTime<Utc>>,

    /// Set once the milestone detector has handled the zero crossing
    milestones_processed_at: Option<DateTime<Utc>>,

    created_at: DateTime<Utc>,

    deactivated_at: Option<DateTime<Utc>>,

    /// Bumped on every committed write; compare-and-set token
    version: u64,
}

impl Debt {
    /// Create a new active debt
    ///
    /// # Errors
    /// Rejects empty ids and negative money/rate values.
    pub fn new(
        id: impl Into<String>,
        owner_id: impl Into<String>,
        name: impl Into<String>,
        balance: i64,
        annual_rate_bps: i64,
        minimum_payment: i64,
        created_at: DateTime<Utc>,
    ) -> Result<Self, DebtError> {
        let id = id.into();
        let owner_id = owner_id.into();
        if id.is_empty() {
            return Err(DebtError::EmptyId);
        }
        if owner_id.is_empty() {
            return Err(DebtError::EmptyOwner);
        }
        if balance < 0 {
            return Err(DebtError::NegativeBalance(balance));
        }
        if annual_rate_bps < 0 {
            return Err(DebtError::NegativeRate(annual_rate_bps));
        }
        if minimum_payment < 0 {
            return Err(DebtError::NegativeMinimumPayment(minimum_payment));
        }

        Ok(Self {
            id,
            owner_id,
            name: name.into(),
            balance,
            original_balance: balance,
            annual_rate_bps,
            minimum_payment,
            status: DebtStatus::Active,
            reached_zero_at: None,
            milestones_processed_at: None,
            created_at,
            deactivated_at: None,
            version: 0,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn original_balance(&self) -> i64 {
        self.original_balance
    }

    pub fn annual_rate_bps(&self) -> i64 {
        self.annual_rate_bps
    }

    pub fn minimum_payment(&self) -> i64 {
        self.minimum_payment
    }

    pub fn status(&self) -> DebtStatus {
        self.status
    }

    pub fn reached_zero_at(&self) -> Option<DateTime<Utc>> {
        self.reached_zero_at
    }

    pub fn milestones_processed_at(&self) -> Option<DateTime<Utc>> {
        self.milestones_processed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn deactivated_at(&self) -> Option<DateTime<Utc>> {
        self.deactivated_at
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Lifecycle state
    pub fn state(&self) -> DebtState {
        match (self.status, self.reached_zero_at) {
            (DebtStatus::PaidOff, _) => DebtState::PaidOff,
            (DebtStatus::Active, Some(_)) => DebtState::ZeroBalanceDetected,
            (DebtStatus::Active, None) => DebtState::Active,
        }
    }

    /// Not soft-deleted
    pub fn is_visible(&self) -> bool {
        self.deactivated_at.is_none()
    }

    /// Counts toward paid-off progress (zero detected or paid off)
    pub fn counts_as_paid(&self) -> bool {
        self.state() != DebtState::Active
    }

    /// Zero crossing recorded but the detector has not handled it yet
    pub fn awaits_milestone_processing(&self) -> bool {
        self.reached_zero_at.is_some() && self.milestones_processed_at.is_none()
    }

    // ========================================================================
    // Mutators (crate-internal: all writes go through the recorder)
    // ========================================================================

    /// Apply a new balance. Growing past the original balance raises it.
    pub(crate) fn apply_balance(&mut self, new_balance: i64) {
        self.balance = new_balance.max(0);
        if self.balance > self.original_balance {
            self.original_balance = self.balance;
        }
    }

    /// Set `reached_zero_at` if unset. Returns true when this call set it.
    pub(crate) fn mark_reached_zero(&mut self, at: DateTime<Utc>) -> bool {
        if self.reached_zero_at.is_some() {
            return false;
        }
        self.reached_zero_at = Some(at);
        true
    }

    pub(crate) fn mark_paid_off(&mut self) {
        self.status = DebtStatus::PaidOff;
    }

    /// Set `milestones_processed_at` if unset. Returns true when this call set it.
    pub(crate) fn mark_milestones_processed(&mut self, at: DateTime<Utc>) -> bool {
        if self.milestones_processed_at.is_some() {
            return false;
        }
        self.milestones_processed_at = Some(at);
        true
    }

    pub(crate) fn deactivate(&mut self, at: DateTime<Utc>) {
        if self.deactivated_at.is_none() {
            self.deactivated_at = Some(at);
        }
    }

    /// Stamp the version a store assigns on commit.
    /// Store implementations call this; nothing else should.
    pub fn set_version(&mut self, version: u64) {
        self.version = version;
    }

    /// Balance is within the paid-off epsilon
    pub fn is_zero_balance(&self) -> bool {
        is_paid_off(self.balance)
    }
}
