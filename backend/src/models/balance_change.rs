//! Balance change audit entries
//!
//! Every mutation of a debt's balance or status produces one
//! [`BalanceChangeEvent`]. Events are append-only: the store never updates or
//! deletes them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of balance mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    /// Reduce balance by the payment amount (floored at zero)
    Payment,
    /// Set the balance to a caller-supplied absolute value
    Adjustment,
    /// Close the debt (explicit mark-paid-off or confirmed zero balance)
    Payoff,
}

/// Immutable audit row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceChangeEvent {
    pub id: Uuid,
    pub debt_id: String,
    pub previous_balance: i64,
    pub new_balance: i64,
    pub payment_amount: i64,
    pub change_type: ChangeType,
    pub timestamp: DateTime<Utc>,
    pub notes: Option<String>,
}

impl BalanceChangeEvent {
    pub fn new(
        debt_id: impl Into<String>,
        previous_balance: i64,
        new_balance: i64,
        payment_amount: i64,
        change_type: ChangeType,
        timestamp: DateTime<Utc>,
        notes: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            debt_id: debt_id.into(),
            previous_balance,
            new_balance,
            payment_amount,
            change_type,
            timestamp,
            notes,
        }
    }

    /// Signed balance movement (negative for payments)
    pub fn delta(&self) -> i64 {
        self.new_balance - self.previous_balance
    }
}
