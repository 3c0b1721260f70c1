//! Milestone records
//!
//! A milestone is earned at most once per user. The `(user_id, milestone_type)`
//! pair is the uniqueness key stores must enforce on insert.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Milestone kinds, ordered from lowest to highest progress tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MilestoneType {
    FirstDebtPaid,
    #[serde(rename = "pct_25")]
    Pct25,
    #[serde(rename = "pct_50")]
    Pct50,
    #[serde(rename = "pct_75")]
    Pct75,
    DebtFree,
}

impl MilestoneType {
    /// Wire name (`first_debt_paid`, `pct_25`, ...)
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneType::FirstDebtPaid => "first_debt_paid",
            MilestoneType::Pct25 => "pct_25",
            MilestoneType::Pct50 => "pct_50",
            MilestoneType::Pct75 => "pct_75",
            MilestoneType::DebtFree => "debt_free",
        }
    }
}

impl fmt::Display for MilestoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An earned milestone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MilestoneRecord {
    pub user_id: String,
    pub milestone_type: MilestoneType,
    pub earned_at: DateTime<Utc>,
    /// Debt whose payoff earned it
    pub debt_id: String,
}

impl MilestoneRecord {
    /// Uniqueness key
    pub fn key(&self) -> (String, MilestoneType) {
        (self.user_id.clone(), self.milestone_type)
    }
}
