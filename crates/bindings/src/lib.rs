//! Python bindings for the core/coprocessor simulator.
//!
//! This crate exposes the simulator to Python via PyO3. It provides:
//! 1. **Simulation:** `Simulation`, built like an SST parameter script and run to completion.
//! 2. **Summary:** `RunSummary` with the end tick, stop reason, and event count.
//! 3. **Utilities:** Version string, ISA parsing, and logging setup.
//! 4. **Errors:** `ConfigurationError`, raised for any invalid parameter.

use pyo3::create_exception;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

/// Python dict to Rust `Config` conversion.
pub mod conversion;
/// Run summary binding (`RunSummary`).
pub mod stats;
/// Simulation binding (`Simulation`).
pub mod system;
/// Utility functions (version, ISA parsing, logging).
pub mod utils;

create_exception!(
    revsim,
    ConfigurationError,
    PyValueError,
    "Malformed or missing simulator parameter."
);

/// Registers all simulator classes and functions onto the given Python module.
///
/// Called from the `#[pymodule]` entry point, and by the CLI to inject the module
/// before running a script.
pub fn register_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<system::PySimulation>()?;
    m.add_class::<stats::PyRunSummary>()?;
    m.add("ConfigurationError", m.py().get_type::<ConfigurationError>())?;

    m.add_function(wrap_pyfunction!(utils::version, m)?)?;
    m.add_function(wrap_pyfunction!(utils::parse_isa, m)?)?;
    m.add_function(wrap_pyfunction!(utils::init_logging, m)?)?;

    Ok(())
}

#[pymodule]
fn revsim(m: &Bound<'_, PyModule>) -> PyResult<()> {
    register_module(m)
}
