//! Planner input/output types
//!
//! These are the wire shapes of the simulator interface (camelCase JSON):
//!
//! ```text
//! in:  {debts: [{id, balance, minimumPayment, annualInterestRate}], extraPayment, strategy}
//! out: {strategy, payoffOrder: [{debtId, monthsToPayoff, totalInterest, totalPaid}],
//!       totalMonths, totalInterest, totalPayments, exceedsHorizon, schedule}
//! ```
//!
//! CRITICAL: All money values are i64 (cents); rates are annual basis points.

use crate::models::Debt;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Repayment ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Smallest balance first
    Snowball,
    /// Highest interest rate first
    Avalanche,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Snowball => "snowball",
            Strategy::Avalanche => "avalanche",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "snowball" => Ok(Strategy::Snowball),
            "avalanche" => Ok(Strategy::Avalanche),
            other => Err(format!("Unknown strategy '{}'", other)),
        }
    }
}

/// Immutable per-debt view used by the simulator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtSnapshot {
    pub id: String,
    /// Current balance (cents)
    pub balance: i64,
    /// Minimum monthly payment (cents)
    pub minimum_payment: i64,
    /// Annual rate in basis points
    #[serde(rename = "annualInterestRate")]
    pub annual_rate_bps: i64,
}

impl DebtSnapshot {
    pub fn new(id: impl Into<String>, balance: i64, minimum_payment: i64, annual_rate_bps: i64) -> Self {
        Self {
            id: id.into(),
            balance,
            minimum_payment,
            annual_rate_bps,
        }
    }
}

impl From<&Debt> for DebtSnapshot {
    fn from(debt: &Debt) -> Self {
        DebtSnapshot {
            id: debt.id().to_string(),
            balance: debt.balance(),
            minimum_payment: debt.minimum_payment(),
            annual_rate_bps: debt.annual_rate_bps(),
        }
    }
}

/// Simulator request as accepted on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub debts: Vec<DebtSnapshot>,
    #[serde(default)]
    pub extra_payment: i64,
    #[serde(default)]
    pub strategy: Option<Strategy>,
}

/// Simulator input rejected before any month is simulated
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Debt id must not be empty")]
    EmptyDebtId,

    #[error("Duplicate debt id '{0}'")]
    DuplicateDebtId(String),

    #[error("Debt '{id}' has negative balance {balance}")]
    NegativeBalance { id: String, balance: i64 },

    #[error("Debt '{id}' has negative minimum payment {minimum_payment}")]
    NegativeMinimumPayment { id: String, minimum_payment: i64 },

    #[error("Debt '{id}' has negative interest rate {annual_rate_bps} bps")]
    NegativeRate { id: String, annual_rate_bps: i64 },

    #[error("Extra payment must be non-negative, got {0}")]
    NegativeExtraPayment(i64),
}

/// Result for one debt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtPayoff {
    pub debt_id: String,
    /// Month in which the debt reached zero (0 = already paid); None past the horizon
    pub months_to_payoff: Option<u32>,
    pub total_interest: i64,
    pub total_paid: i64,
}

/// Aggregates for one simulated month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthSummary {
    /// 1-based month number
    pub month: u32,
    /// Sum of minimum payments of debts active at the start of the month
    pub minimums_due: i64,
    /// Extra-payment pool in effect this month (budget + cascaded minimums)
    pub extra_pool: i64,
    /// Total applied across all debts
    pub payments: i64,
    /// Total interest accrued
    pub interest: i64,
    /// Total balance left at month end
    pub remaining_balance: i64,
    /// Debts retired this month, in target order
    pub debts_paid_off: Vec<String>,
}

/// Simulator output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoffPlan {
    pub strategy: Strategy,
    /// Per-debt results in target order
    pub payoff_order: Vec<DebtPayoff>,
    pub total_months: u32,
    pub total_interest: i64,
    pub total_payments: i64,
    /// True when debts remain after the month cap
    pub exceeds_horizon: bool,
    pub schedule: Vec<MonthSummary>,
}

impl PayoffPlan {
    /// Result for one debt
    pub fn payoff_for(&self, debt_id: &str) -> Option<&DebtPayoff> {
        self.payoff_order.iter().find(|p| p.debt_id == debt_id)
    }

    /// Debt ids in target order
    pub fn order(&self) -> Vec<&str> {
        self.payoff_order.iter().map(|p| p.debt_id.as_str()).collect()
    }

    /// SHA-256 over the canonical JSON form
    pub fn fingerprint(&self) -> Result<String, serde_json::Error> {
        super::fingerprint::compute_fingerprint(self)
    }
}

/// Both strategies side by side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StrategyComparison {
    pub snowball: PayoffPlan,
    pub avalanche: PayoffPlan,
    /// snowball.total_months - avalanche.total_months
    pub months_saved: i64,
    /// snowball.total_interest - avalanche.total_interest
    pub interest_saved: i64,
}

impl StrategyComparison {
    /// Strategy with the lower total interest; snowball on a tie
    pub fn cheaper(&self) -> Strategy {
        if self.interest_saved > 0 {
            Strategy::Avalanche
        } else {
            Strategy::Snowball
        }
    }
}
