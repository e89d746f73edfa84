//! Memory latency model.
//!
//! This module turns a [`MemoryRequest`] into a completion delay in core cycles. It provides:
//! 1. **UniformCost:** Seeded uniform draws from the core's `[min, max]` range. A range
//!    with `min == max` is a fixed-latency model through the same code path.
//! 2. **TableCost:** Cycles through a configured latency table (`memCostTable`).
//! 3. **MemoryLatencyModel:** One cost model per core, built and validated at setup.
//!
//! Each core draws from its own generator, seeded from the run seed and the core
//! index, so the draw sequence of one core does not depend on how requests from
//! different cores interleave.

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use super::MemoryRequest;
use crate::common::{ConfigError, CoreId, SimError};
use crate::config::{CoreSpec, MemCost};

/// Golden-ratio increment used to decorrelate per-core seeds.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Trait for latency sources that report a delay in cycles per request.
///
/// Implementors must be `Send + Sync` for use with the Python bindings.
pub trait CostModel: Send + Sync {
    /// Returns the delay in cycles for the next request.
    fn draw(&mut self) -> u64;

    /// Restarts the draw sequence from `seed`.
    fn reseed(&mut self, seed: u64);

    /// Returns the number of delays drawn so far.
    fn draws(&self) -> u64;
}

/// Uniform latency in `[min, max]` from a seeded xoshiro256** generator.
#[derive(Debug, Clone)]
pub struct UniformCost {
    range: MemCost,
    rng: Xoshiro256StarStar,
    draws: u64,
}

impl UniformCost {
    /// Creates a uniform cost model over `range`.
    pub fn new(range: MemCost, seed: u64) -> Self {
        Self {
            range,
            rng: Xoshiro256StarStar::seed_from_u64(seed),
            draws: 0,
        }
    }
}

impl CostModel for UniformCost {
    fn draw(&mut self) -> u64 {
        self.draws += 1;
        self.rng.gen_range(self.range.min..=self.range.max)
    }

    fn reseed(&mut self, seed: u64) {
        self.rng = Xoshiro256StarStar::seed_from_u64(seed);
    }

    fn draws(&self) -> u64 {
        self.draws
    }
}

/// Latency taken in order from a fixed table, wrapping at the end.
#[derive(Debug, Clone)]
pub struct TableCost {
    table: Vec<u64>,
    next: usize,
    draws: u64,
}

impl TableCost {
    /// Creates a table-driven cost model. An empty table yields 1 cycle.
    pub fn new(table: Vec<u64>) -> Self {
        Self {
            table,
            next: 0,
            draws: 0,
        }
    }
}

impl CostModel for TableCost {
    fn draw(&mut self) -> u64 {
        self.draws += 1;
        let latency = self.table.get(self.next).copied().unwrap_or(1);
        self.next = (self.next + 1) % self.table.len().max(1);
        latency
    }

    fn reseed(&mut self, _seed: u64) {
        self.next = 0;
    }

    fn draws(&self) -> u64 {
        self.draws
    }
}

/// Per-core latency models for every core of the platform.
pub struct MemoryLatencyModel {
    cores: Vec<Box<dyn CostModel>>,
}

impl std::fmt::Debug for MemoryLatencyModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryLatencyModel")
            .field("cores", &self.cores.len())
            .finish()
    }
}

/// Derives the seed of one core's generator from the run seed.
const fn core_seed(seed: u64, core: usize) -> u64 {
    seed ^ (core as u64 + 1).wrapping_mul(SEED_STRIDE)
}

impl MemoryLatencyModel {
    /// Builds uniform latency models from explicit `(core, range)` registrations.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a registration names a core outside
    /// `0..num_cores`, or if any core in that range has no registration. Missing
    /// registrations are detected here, at setup, never at request time.
    pub fn from_ranges(
        num_cores: usize,
        ranges: &[(CoreId, MemCost)],
        seed: u64,
    ) -> Result<Self, ConfigError> {
        let mut slots: Vec<Option<MemCost>> = vec![None; num_cores];
        for &(core, range) in ranges {
            let slot = slots
                .get_mut(core.index())
                .ok_or(ConfigError::CoreOutOfRange {
                    key: "memCost",
                    core: core.index(),
                    num_cores,
                })?;
            *slot = Some(MemCost::new(core.index(), range.min, range.max)?);
        }

        let cores = slots
            .into_iter()
            .enumerate()
            .map(|(core, range)| {
                let range = range.ok_or(ConfigError::MissingCore {
                    key: "memCost",
                    core,
                })?;
                Ok(Box::new(UniformCost::new(range, core_seed(seed, core))) as Box<dyn CostModel>)
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { cores })
    }

    /// Builds one model per validated core spec: table-driven when a table is
    /// configured, uniform otherwise.
    pub fn from_specs(specs: &[CoreSpec], seed: u64) -> Self {
        let cores = specs
            .iter()
            .map(|spec| match &spec.cost_table {
                Some(table) => Box::new(TableCost::new(table.clone())) as Box<dyn CostModel>,
                None => Box::new(UniformCost::new(spec.cost, core_seed(seed, spec.id.index())))
                    as Box<dyn CostModel>,
            })
            .collect();
        Self { cores }
    }

    /// Returns the number of registered cores.
    pub fn num_cores(&self) -> usize {
        self.cores.len()
    }

    /// Returns the completion delay in cycles of the issuing core's clock.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnregisteredCore`] if the request comes from a core that
    /// was not registered at setup.
    pub fn resolve_latency(&mut self, req: &MemoryRequest) -> Result<u64, SimError> {
        self.cores
            .get_mut(req.core.index())
            .map(|model| model.draw())
            .ok_or(SimError::UnregisteredCore(req.core))
    }

    /// Restarts every core's draw sequence from `seed`.
    ///
    /// Reseeding after draws have been made breaks run-to-run reproducibility; this
    /// is reported as a non-determinism warning and the run continues.
    pub fn reseed(&mut self, seed: u64) {
        let drawn: u64 = self.cores.iter().map(|m| m.draws()).sum();
        if drawn > 0 {
            tracing::warn!(
                target: "revsim::nondeterminism",
                drawn,
                seed,
                "latency model reseeded mid-run; timing is no longer reproducible"
            );
        }
        for (core, model) in self.cores.iter_mut().enumerate() {
            model.reseed(core_seed(seed, core));
        }
    }
}
