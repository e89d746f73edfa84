//! Simulation Python binding.
//!
//! Exposes a `Simulation` builder that mirrors an SST parameter script:
//! program options, statistic load level, CPU parameters, and coprocessor parameters
//! are set first; `run` validates them, registers every component, and runs to the
//! stop condition. Statistics are flushed exactly once.

use std::fs;

use pyo3::exceptions::{PyIOError, PyRuntimeError};
use pyo3::prelude::*;
use revsim_core::Simulator;
use serde_json::{Map, Value};

use crate::conversion::{config_error, json_to_config, py_dict_to_config, py_to_json};
use crate::stats::{PyRunSummary, parse_format};

/// Lifecycle of a Python-side simulation.
#[derive(Debug)]
enum Stage {
    /// Parameters are still being collected.
    Building(Map<String, Value>),
    /// The run completed; statistics not yet flushed.
    Finished(Box<Simulator>),
    /// Statistics were flushed.
    Flushed,
}

/// Python-exposed simulation.
#[pyclass(name = "Simulation", unsendable)]
#[derive(Debug)]
pub struct PySimulation {
    stage: Stage,
}

impl PySimulation {
    fn document(&mut self) -> PyResult<&mut Map<String, Value>> {
        match &mut self.stage {
            Stage::Building(doc) => Ok(doc),
            _ => Err(PyRuntimeError::new_err(
                "simulation already ran; create a new Simulation to change parameters",
            )),
        }
    }

    fn section(&mut self, name: &str) -> PyResult<&mut Map<String, Value>> {
        let entry = self
            .document()?
            .entry(name.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        entry
            .as_object_mut()
            .ok_or_else(|| PyRuntimeError::new_err("configuration section is not a dict"))
    }

    fn merge(&mut self, section: &str, params: Value) -> PyResult<()> {
        let Value::Object(params) = params else {
            return Err(crate::ConfigurationError::new_err(format!(
                "{section} parameters must be a dict"
            )));
        };
        self.section(section)?.extend(params);
        Ok(())
    }
}

#[pymethods]
impl PySimulation {
    /// Creates an empty simulation, optionally from a complete configuration dict.
    #[new]
    #[pyo3(signature = (config=None))]
    fn new(py: Python<'_>, config: Option<&Bound<'_, PyAny>>) -> PyResult<Self> {
        let doc = match config {
            Some(config) => {
                // Validate the shape early; the document is rebuilt at run time.
                let _ = py_dict_to_config(py, config)?;
                match py_to_json(py, config)? {
                    Value::Object(map) => map,
                    _ => Map::new(),
                }
            }
            None => Map::new(),
        };
        Ok(Self {
            stage: Stage::Building(doc),
        })
    }

    /// Sets a program option (`timebase`, `stopAtCycle`, `seed`).
    fn set_program_option(
        &mut self,
        py: Python<'_>,
        key: &str,
        value: &Bound<'_, PyAny>,
    ) -> PyResult<()> {
        let value = py_to_json(py, value)?;
        let _ = self
            .section("program_options")?
            .insert(key.to_string(), value);
        Ok(())
    }

    /// Sets the highest statistic level that is recorded.
    fn set_statistic_load_level(&mut self, level: u8) -> PyResult<()> {
        let _ = self
            .document()?
            .insert("statistic_load_level".to_string(), Value::from(level));
        Ok(())
    }

    /// Merges parameters of the CPU component (`numCores`, `memCost`, ...).
    fn add_cpu_params(&mut self, py: Python<'_>, params: &Bound<'_, PyAny>) -> PyResult<()> {
        let params = py_to_json(py, params)?;
        self.merge("cpu", params)
    }

    /// Merges parameters of the coprocessor subcomponent (`clock`, `queueDepth`, ...).
    fn add_coproc_params(
        &mut self,
        py: Python<'_>,
        params: &Bound<'_, PyAny>,
    ) -> PyResult<()> {
        let params = py_to_json(py, params)?;
        self.merge("co_proc", params)
    }

    /// Merges parameters of the synthetic workload.
    fn add_synthetic_params(
        &mut self,
        py: Python<'_>,
        params: &Bound<'_, PyAny>,
    ) -> PyResult<()> {
        let params = py_to_json(py, params)?;
        self.merge("synthetic", params)
    }

    /// Validates the configuration, runs to completion, and returns the summary.
    ///
    /// Raises `ConfigurationError` before any simulated time passes if a parameter
    /// is invalid.
    fn run(&mut self, py: Python<'_>) -> PyResult<PyRunSummary> {
        let doc = self.document()?.clone();
        let config = json_to_config(Value::Object(doc))?;
        let mut sim = Simulator::new(&config).map_err(config_error)?;
        let summary = py
            .allow_threads(|| sim.run())
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;
        self.stage = Stage::Finished(Box::new(sim));
        Ok(PyRunSummary { inner: summary })
    }

    /// Flushes the statistics and returns them as `"csv"` or `"json"` text.
    ///
    /// Statistics can be flushed only once per run.
    #[pyo3(signature = (format="csv"))]
    fn statistics(&mut self, format: &str) -> PyResult<String> {
        let format = parse_format(format)?;
        match std::mem::replace(&mut self.stage, Stage::Flushed) {
            Stage::Finished(sim) => Ok(sim.finish(format)),
            Stage::Building(doc) => {
                self.stage = Stage::Building(doc);
                Err(PyRuntimeError::new_err("simulation has not run yet"))
            }
            Stage::Flushed => Err(PyRuntimeError::new_err("statistics were already flushed")),
        }
    }

    /// Flushes the statistics to `path`.
    #[pyo3(signature = (path, format="csv"))]
    fn write_statistics(&mut self, path: &str, format: &str) -> PyResult<()> {
        let text = self.statistics(format)?;
        fs::write(path, text).map_err(|e| PyIOError::new_err(format!("{path}: {e}")))
    }
}
