//! Run summary and statistics Python bindings.
//!
//! Exposes the outcome of a run (`RunSummary`) and flushed statistics rows to Python.

use pyo3::prelude::*;
use pyo3::types::PyDict;
use revsim_core::RunSummary;
use revsim_core::stats::StatFormat;

use crate::ConfigurationError;

/// Python-exposed run summary.
#[pyclass(name = "RunSummary", frozen)]
#[derive(Debug, Clone, Copy)]
pub struct PyRunSummary {
    /// Wrapped summary.
    pub inner: RunSummary,
}

#[pymethods]
impl PyRunSummary {
    /// Last simulated tick.
    #[getter]
    fn end_tick(&self) -> u64 {
        self.inner.end_tick
    }

    /// `"drained"` or `"stop-condition"`.
    #[getter]
    fn stop_reason(&self) -> String {
        self.inner.stop_reason.to_string()
    }

    /// Number of events dispatched.
    #[getter]
    fn events(&self) -> u64 {
        self.inner.events
    }

    /// Returns the summary as a dict.
    fn to_dict<'py>(&self, py: Python<'py>) -> PyResult<Bound<'py, PyDict>> {
        let dict = PyDict::new(py);
        dict.set_item("end_tick", self.inner.end_tick)?;
        dict.set_item("stop_reason", self.inner.stop_reason.to_string())?;
        dict.set_item("events", self.inner.events)?;
        Ok(dict)
    }

    fn __repr__(&self) -> String {
        format!(
            "RunSummary(end_tick={}, stop_reason='{}', events={})",
            self.inner.end_tick, self.inner.stop_reason, self.inner.events
        )
    }
}

/// Parses a Python-side format name.
pub fn parse_format(format: &str) -> PyResult<StatFormat> {
    match format.to_ascii_lowercase().as_str() {
        "csv" => Ok(StatFormat::Csv),
        "json" => Ok(StatFormat::Json),
        other => Err(ConfigurationError::new_err(format!(
            "unknown statistics format `{other}` (expected csv or json)"
        ))),
    }
}
