//! PyO3 wrapper for DebtEngine
//!
//! This module provides the Python interface to the Rust engine.

use std::sync::Arc;

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::{PyDict, PyList};

use super::types::{
    comparison_to_py, debt_to_py, event_to_py, milestone_to_py, parse_new_debt, parse_strategy,
    plan_to_py,
};
use crate::core::clock::SystemClock;
use crate::core::config::EngineConfig;
use crate::notifications::LogDispatcher;
use crate::orchestrator::{DebtEngine, EngineError};

fn to_py_err(err: EngineError) -> PyErr {
    match err {
        EngineError::InvalidDebt(_) | EngineError::Planning(_) => PyValueError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Python wrapper for the Rust engine
///
/// Backed by an in-memory store; notifications go to the log.
///
/// # Example (from Python)
///
/// ```python
/// from debt_payoff_core import DebtEngine
///
/// engine = DebtEngine()
/// engine.create_debt({
///     "id": "card",
///     "owner_id": "user-1",
///     "name": "Visa",
///     "balance": 250_000,
///     "annual_rate_bps": 1_999,
///     "minimum_payment": 5_000,
/// })
/// plan = engine.plan("user-1", 10_000, "avalanche")
/// print(plan["total_months"], plan["total_interest"])
/// ```
#[pyclass(name = "DebtEngine")]
pub struct PyDebtEngine {
    inner: DebtEngine,
}

#[pymethods]
impl PyDebtEngine {
    /// Create an engine, optionally from a JSON config string
    #[new]
    #[pyo3(signature = (config_json=None))]
    fn new(config_json: Option<&str>) -> PyResult<Self> {
        let config = match config_json {
            Some(json) => EngineConfig::from_json_str(json)
                .map_err(|e| PyValueError::new_err(format!("Invalid config: {}", e)))?,
            None => EngineConfig::default(),
        };
        let inner = DebtEngine::in_memory(config, Arc::new(LogDispatcher), Arc::new(SystemClock))
            .map_err(|e| PyValueError::new_err(format!("Failed to create engine: {}", e)))?;
        Ok(Self { inner })
    }

    fn create_debt(&self, py: Python<'_>, debt: &Bound<'_, PyDict>) -> PyResult<Py<PyDict>> {
        let new_debt = parse_new_debt(debt)?;
        let debt = self.inner.create_debt(new_debt).map_err(to_py_err)?;
        debt_to_py(py, &debt)
    }

    fn get_debt(&self, py: Python<'_>, debt_id: &str) -> PyResult<Option<Py<PyDict>>> {
        match self.inner.debt(debt_id).map_err(to_py_err)? {
            Some(debt) => Ok(Some(debt_to_py(py, &debt)?)),
            None => Ok(None),
        }
    }

    #[pyo3(signature = (debt_id, amount, notes=None))]
    fn record_payment(
        &self,
        py: Python<'_>,
        debt_id: &str,
        amount: i64,
        notes: Option<String>,
    ) -> PyResult<Py<PyDict>> {
        let debt = self
            .inner
            .record_payment(debt_id, amount, notes)
            .map_err(to_py_err)?;
        debt_to_py(py, &debt)
    }

    #[pyo3(signature = (debt_id, new_balance, notes=None))]
    fn record_adjustment(
        &self,
        py: Python<'_>,
        debt_id: &str,
        new_balance: i64,
        notes: Option<String>,
    ) -> PyResult<Py<PyDict>> {
        let debt = self
            .inner
            .record_adjustment(debt_id, new_balance, notes)
            .map_err(to_py_err)?;
        debt_to_py(py, &debt)
    }

    #[pyo3(signature = (debt_id, notes=None))]
    fn mark_paid_off(&self, py: Python<'_>, debt_id: &str, notes: Option<String>) -> PyResult<Py<PyDict>> {
        let debt = self.inner.mark_paid_off(debt_id, notes).map_err(to_py_err)?;
        debt_to_py(py, &debt)
    }

    fn confirm_payoff(&self, py: Python<'_>, debt_id: &str) -> PyResult<Py<PyDict>> {
        let debt = self.inner.confirm_payoff(debt_id).map_err(to_py_err)?;
        debt_to_py(py, &debt)
    }

    fn deactivate(&self, py: Python<'_>, debt_id: &str) -> PyResult<Py<PyDict>> {
        let debt = self.inner.deactivate(debt_id).map_err(to_py_err)?;
        debt_to_py(py, &debt)
    }

    /// Audit rows for a debt, oldest first
    fn history(&self, py: Python<'_>, debt_id: &str) -> PyResult<Py<PyList>> {
        let list = PyList::empty_bound(py);
        for event in self.inner.history(debt_id).map_err(to_py_err)? {
            list.append(event_to_py(py, &event)?)?;
        }
        Ok(list.unbind())
    }

    fn milestones(&self, py: Python<'_>, user_id: &str) -> PyResult<Py<PyList>> {
        let list = PyList::empty_bound(py);
        for record in self.inner.milestones(user_id).map_err(to_py_err)? {
            list.append(milestone_to_py(py, &record)?)?;
        }
        Ok(list.unbind())
    }

    /// Plan the user's active debts
    ///
    /// `strategy` is "snowball" or "avalanche".
    fn plan(
        &self,
        py: Python<'_>,
        user_id: &str,
        extra_payment: i64,
        strategy: &str,
    ) -> PyResult<Py<PyDict>> {
        let strategy = parse_strategy(strategy)?;
        let plan = self
            .inner
            .plan(user_id, extra_payment, strategy)
            .map_err(to_py_err)?;
        plan_to_py(py, &plan)
    }

    fn compare(&self, py: Python<'_>, user_id: &str, extra_payment: i64) -> PyResult<Py<PyDict>> {
        let cmp = self.inner.compare(user_id, extra_payment).map_err(to_py_err)?;
        comparison_to_py(py, &cmp)
    }

    /// Run the pending-milestone scan immediately
    ///
    /// Returns the number of milestones awarded, or None when a scan was
    /// already running.
    fn run_milestone_scan(&self) -> PyResult<Option<usize>> {
        let run = self
            .inner
            .monitor()
            .run_now()
            .map_err(|e| PyRuntimeError::new_err(format!("Milestone scan failed: {}", e)))?;
        Ok(run.map(|r| r.scan.milestones_awarded.len()))
    }

    fn pending_notifications(&self) -> usize {
        self.inner.pending_notifications()
    }
}
