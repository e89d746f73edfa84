//! Utility functions exposed to Python.
//!
//! Provides version, ISA parsing, and logging setup for the `revsim` module.

use pyo3::prelude::*;
use revsim_core::isa::Isa;
use tracing_subscriber::EnvFilter;

use crate::conversion::config_error;

/// Returns the simulator version string.
#[pyfunction]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// Parses an ISA string such as `"rv64gc"` and returns its canonical form.
///
/// Raises `ConfigurationError` for strings the simulator does not accept.
#[pyfunction]
pub fn parse_isa(isa: &str) -> PyResult<String> {
    isa.parse::<Isa>().map(|isa| isa.to_string()).map_err(config_error)
}

/// Installs a stderr log subscriber.
///
/// `filter` uses `RUST_LOG` syntax (e.g. `"info"` or `"revsim_core=debug"`); when
/// omitted, `RUST_LOG` is read, falling back to `warn`. Returns `False` if a
/// subscriber was already installed.
#[pyfunction]
#[pyo3(signature = (filter=None))]
pub fn init_logging(filter: Option<&str>) -> bool {
    let filter = filter.map_or_else(
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        EnvFilter::new,
    );
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .is_ok()
}
