//! Type conversion utilities for FFI boundary
//!
//! Converts between Rust types and PyO3-compatible types (PyDict, PyList).

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use crate::models::{BalanceChangeEvent, Debt, MilestoneRecord};
use crate::orchestrator::NewDebt;
use crate::planner::{DebtSnapshot, PayoffPlan, PlanRequest, Strategy, StrategyComparison};

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field from a Python dict with a clear error message.
fn extract_required<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<T>
where
    T: for<'py> FromPyObject<'py>,
{
    dict.get_item(key)?
        .ok_or_else(|| PyValueError::new_err(format!("Missing required field '{}'", key)))?
        .extract()
}

/// Extract a field, falling back to `default` when missing.
fn extract_with_default<T>(dict: &Bound<'_, PyDict>, key: &str, default: T) -> PyResult<T>
where
    T: for<'py> FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) => value.extract(),
        None => Ok(default),
    }
}

pub fn parse_strategy(name: &str) -> PyResult<Strategy> {
    name.parse::<Strategy>().map_err(PyValueError::new_err)
}

// ========================================================================
// Inbound
// ========================================================================

/// Parse `{"id", "balance", "minimumPayment", "annualInterestRate"}`
fn parse_debt_snapshot(py_debt: &Bound<'_, PyDict>) -> PyResult<DebtSnapshot> {
    Ok(DebtSnapshot::new(
        extract_required::<String>(py_debt, "id")?,
        extract_required(py_debt, "balance")?,
        extract_required(py_debt, "minimumPayment")?,
        extract_required(py_debt, "annualInterestRate")?,
    ))
}

/// Parse a plan request dict
///
/// ```python
/// {
///     "debts": [{"id": "card", "balance": 50000, "minimumPayment": 2500, "annualInterestRate": 1999}],
///     "extraPayment": 10000,
///     "strategy": "avalanche",   # optional
/// }
/// ```
pub fn parse_plan_request(py_request: &Bound<'_, PyDict>) -> PyResult<PlanRequest> {
    let py_debts = py_request
        .get_item("debts")?
        .ok_or_else(|| PyValueError::new_err("Missing required field 'debts'"))?;
    let py_debts = py_debts.downcast::<PyList>()?;
    let mut debts = Vec::with_capacity(py_debts.len());
    for item in py_debts.iter() {
        let py_debt = item.downcast::<PyDict>()?;
        debts.push(parse_debt_snapshot(py_debt)?);
    }

    let strategy = match extract_with_default::<Option<String>>(py_request, "strategy", None)? {
        Some(name) => Some(parse_strategy(&name)?),
        None => None,
    };

    Ok(PlanRequest {
        debts,
        extra_payment: extract_with_default(py_request, "extraPayment", 0)?,
        strategy,
    })
}

pub fn parse_new_debt(py_debt: &Bound<'_, PyDict>) -> PyResult<NewDebt> {
    Ok(NewDebt {
        id: extract_required(py_debt, "id")?,
        owner_id: extract_required(py_debt, "owner_id")?,
        name: extract_with_default(py_debt, "name", String::new())?,
        balance: extract_required(py_debt, "balance")?,
        annual_rate_bps: extract_required(py_debt, "annual_rate_bps")?,
        minimum_payment: extract_required(py_debt, "minimum_payment")?,
    })
}

// ========================================================================
// Outbound
// ========================================================================

pub fn plan_to_py(py: Python<'_>, plan: &PayoffPlan) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("strategy", plan.strategy.as_str())?;
    dict.set_item("total_months", plan.total_months)?;
    dict.set_item("total_interest", plan.total_interest)?;
    dict.set_item("total_payments", plan.total_payments)?;
    dict.set_item("exceeds_horizon", plan.exceeds_horizon)?;

    let order = PyList::empty_bound(py);
    for payoff in &plan.payoff_order {
        let entry = PyDict::new_bound(py);
        entry.set_item("debt_id", &payoff.debt_id)?;
        entry.set_item("months_to_payoff", payoff.months_to_payoff)?;
        entry.set_item("total_interest", payoff.total_interest)?;
        entry.set_item("total_paid", payoff.total_paid)?;
        order.append(entry)?;
    }
    dict.set_item("payoff_order", order)?;

    let fingerprint = plan
        .fingerprint()
        .map_err(|e| PyValueError::new_err(format!("Failed to fingerprint plan: {}", e)))?;
    dict.set_item("fingerprint", fingerprint)?;

    Ok(dict.unbind())
}

pub fn comparison_to_py(py: Python<'_>, cmp: &StrategyComparison) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("snowball", plan_to_py(py, &cmp.snowball)?)?;
    dict.set_item("avalanche", plan_to_py(py, &cmp.avalanche)?)?;
    dict.set_item("months_saved", cmp.months_saved)?;
    dict.set_item("interest_saved", cmp.interest_saved)?;
    dict.set_item("cheaper", cmp.cheaper().as_str())?;
    Ok(dict.unbind())
}

pub fn debt_to_py(py: Python<'_>, debt: &Debt) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("id", debt.id())?;
    dict.set_item("owner_id", debt.owner_id())?;
    dict.set_item("name", debt.name())?;
    dict.set_item("balance", debt.balance())?;
    dict.set_item("original_balance", debt.original_balance())?;
    dict.set_item("annual_rate_bps", debt.annual_rate_bps())?;
    dict.set_item("minimum_payment", debt.minimum_payment())?;
    let state = match debt.state() {
        crate::models::DebtState::Active => "active",
        crate::models::DebtState::ZeroBalanceDetected => "zero_balance_detected",
        crate::models::DebtState::PaidOff => "paid_off",
    };
    dict.set_item("state", state)?;
    dict.set_item("reached_zero_at", debt.reached_zero_at().map(|t| t.to_rfc3339()))?;
    dict.set_item("version", debt.version())?;
    Ok(dict.unbind())
}

pub fn event_to_py(py: Python<'_>, event: &BalanceChangeEvent) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("id", event.id.to_string())?;
    dict.set_item("debt_id", &event.debt_id)?;
    dict.set_item("previous_balance", event.previous_balance)?;
    dict.set_item("new_balance", event.new_balance)?;
    dict.set_item("payment_amount", event.payment_amount)?;
    dict.set_item("change_type", serde_name(&event.change_type)?)?;
    dict.set_item("timestamp", event.timestamp.to_rfc3339())?;
    dict.set_item("notes", event.notes.as_deref())?;
    Ok(dict.unbind())
}

pub fn milestone_to_py(py: Python<'_>, record: &MilestoneRecord) -> PyResult<Py<PyDict>> {
    let dict = PyDict::new_bound(py);
    dict.set_item("user_id", &record.user_id)?;
    dict.set_item("milestone_type", record.milestone_type.as_str())?;
    dict.set_item("earned_at", record.earned_at.to_rfc3339())?;
    dict.set_item("debt_id", &record.debt_id)?;
    Ok(dict.unbind())
}

/// Wire name of a unit enum variant
fn serde_name<T: serde::Serialize>(value: &T) -> PyResult<String> {
    match serde_json::to_value(value) {
        Ok(serde_json::Value::String(name)) => Ok(name),
        Ok(other) => Ok(other.to_string()),
        Err(e) => Err(PyValueError::new_err(e.to_string())),
    }
}
