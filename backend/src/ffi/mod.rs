//! Python bindings (feature `pyo3`)
//!
//! - **engine**: `DebtEngine` class over an in-memory store
//! - **types**: dict/list conversions
//!
//! The pure planner is also exposed as plain functions so Python callers can
//! plan without creating an engine.

pub mod engine;
pub mod types;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::planner::{compare, simulate, Strategy};
use types::{comparison_to_py, parse_plan_request, plan_to_py};

/// Simulate one strategy (default snowball) for a plan request dict
#[pyfunction]
pub fn simulate_plan(py: Python<'_>, request: &Bound<'_, PyDict>) -> PyResult<Py<PyDict>> {
    let request = parse_plan_request(request)?;
    let strategy = request.strategy.unwrap_or(Strategy::Snowball);
    let plan = simulate(&request.debts, request.extra_payment, strategy)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    plan_to_py(py, &plan)
}

/// Run both strategies for a plan request dict
#[pyfunction]
pub fn compare_strategies(py: Python<'_>, request: &Bound<'_, PyDict>) -> PyResult<Py<PyDict>> {
    let request = parse_plan_request(request)?;
    let cmp = compare(&request.debts, request.extra_payment)
        .map_err(|e| PyValueError::new_err(e.to_string()))?;
    comparison_to_py(py, &cmp)
}
