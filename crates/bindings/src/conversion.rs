//! Python↔Rust configuration conversion.
//!
//! Converts Python dicts into the core `Config` type via JSON serialization, so the
//! same schema is used from both Python and the CLI.

use pyo3::prelude::*;
use revsim_core::common::ConfigError;
use revsim_core::config::Config;
use serde_json::Value;

use crate::ConfigurationError;

/// Converts any JSON-serializable Python object to a `serde_json::Value`.
pub fn py_to_json(py: Python<'_>, obj: &Bound<'_, PyAny>) -> PyResult<Value> {
    let json = py.import("json")?;
    let text: String = json.getattr("dumps")?.call1((obj,))?.extract()?;
    serde_json::from_str(&text).map_err(|e| ConfigurationError::new_err(e.to_string()))
}

/// Converts a Python dict to a simulator `Config`.
///
/// Keys must match the configuration document: `program_options`,
/// `statistic_load_level`, `cpu`, `co_proc`, and `synthetic`, with the SST parameter
/// names (`numCores`, `memCost`, ...) inside the component sections.
pub fn py_dict_to_config(py: Python<'_>, dict: &Bound<'_, PyAny>) -> PyResult<Config> {
    let value = py_to_json(py, dict)?;
    json_to_config(value)
}

/// Deserializes a JSON document into a `Config`.
pub fn json_to_config(value: Value) -> PyResult<Config> {
    serde_json::from_value(value).map_err(|e| config_error(ConfigError::from(e)))
}

/// Maps a configuration error to the Python `ConfigurationError` exception.
pub fn config_error(err: ConfigError) -> PyErr {
    ConfigurationError::new_err(err.to_string())
}
