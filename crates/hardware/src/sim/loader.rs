//! Program Loading and Workload Setup.
//!
//! This module provides the operation stream of every core. It performs:
//! 1. **Program resolution:** The `REV_EXE` environment variable overrides the
//!    configured `program` path.
//! 2. **Program loading:** Reads and parses the trace once; every core runs its own
//!    cursor over the shared operations.
//! 3. **Synthetic fallback:** Without a program each core gets a seeded synthetic mix.

use std::env;
use std::fs;
use std::path::Path;

use crate::common::ConfigError;
use crate::config::{Config, Platform};
use crate::core::workload::{SyntheticWorkload, TraceWorkload, Workload};

/// Environment variable that overrides the configured program path.
pub const PROGRAM_ENV: &str = "REV_EXE";

/// Decorrelates workload seeds from latency seeds.
const WORKLOAD_SEED_SALT: u64 = 0xD1B5_4A32_D192_ED03;

/// Reads and parses a trace program.
///
/// # Errors
///
/// Returns [`ConfigError::ProgramIo`] if the file cannot be read and
/// [`ConfigError::Program`] if it does not parse.
pub fn load_program(path: impl AsRef<Path>) -> Result<TraceWorkload, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ProgramIo {
        path: path.display().to_string(),
        source,
    })?;
    TraceWorkload::parse(&text).map_err(|source| ConfigError::Program {
        path: path.display().to_string(),
        source,
    })
}

/// Returns the program path to run: `REV_EXE` if set and non-empty, else `configured`.
pub fn resolve_program(configured: Option<&str>) -> Option<String> {
    env::var(PROGRAM_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .or_else(|| configured.map(str::to_string))
}

/// Seed of the synthetic workload of `core`.
pub const fn workload_seed(seed: u64, core: usize) -> u64 {
    (seed ^ WORKLOAD_SEED_SALT).wrapping_add(core as u64)
}

/// Builds one workload per core of `platform`.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the resolved program cannot be loaded.
pub fn workloads(config: &Config, platform: &Platform) -> Result<Vec<Box<dyn Workload>>, ConfigError> {
    if let Some(path) = resolve_program(config.cpu.program.as_deref()) {
        let program = load_program(&path)?;
        tracing::info!(path, ops = program.len(), "program loaded");
        return Ok(platform
            .cores
            .iter()
            .map(|_| Box::new(program.clone()) as Box<dyn Workload>)
            .collect());
    }

    let span = config
        .synthetic
        .address_span
        .unwrap_or(platform.mem_size)
        .min(platform.mem_size);
    Ok(platform
        .cores
        .iter()
        .map(|core| {
            Box::new(SyntheticWorkload::new(
                &config.synthetic,
                span,
                workload_seed(platform.seed, core.id.index()),
                platform.coproc.is_some(),
            )) as Box<dyn Workload>
        })
        .collect())
}
