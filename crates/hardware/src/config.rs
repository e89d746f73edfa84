//! Configuration system for the simulator.
//!
//! This module defines the parameter surface and its validated, typed form. It provides:
//! 1. **Defaults:** Baseline values for every optional parameter.
//! 2. **Raw Parameters:** Serde structures mirroring the SST-style keys (`numCores`,
//!    `memCost`, `startAddr`, ...), deserialized from JSON.
//! 3. **Platform:** The typed, per-core table produced by [`Config::build`]; every
//!    bracket-list string is parsed exactly once here.
//!
//! Configuration is supplied as JSON from the CLI, or as a dict from the Python API
//! (converted to JSON), or built with `Config::default()` and edited in code.

/// Per-core bracket-list parsing (`[idx:value,...]`).
pub mod params;

/// Clock-rate and time string parsing.
pub mod units;

use serde::{Deserialize, Deserializer};

use crate::common::{ConfigError, CoreId, Tick};
use crate::isa::Isa;
use crate::sim::clock::ClockDomain;

/// Default configuration constants for the simulator.
///
/// These values apply when a parameter is omitted from the configuration document.
mod defaults {
    /// Smallest representable time unit.
    pub const TIMEBASE: &str = "1ps";

    /// No stop time: run until the event queue drains.
    pub const STOP_AT: &str = "0s";

    /// Seed for every latency and workload generator.
    pub const SEED: u64 = 0x5245_565f_5345_4544;

    /// Statistics at this level and below are recorded.
    pub const STATISTIC_LOAD_LEVEL: u8 = 1;

    /// Core and coprocessor clock.
    pub const CLOCK: &str = "1GHz";

    /// Number of simulated cores.
    pub const NUM_CORES: usize = 1;

    /// Addressable memory (1 GiB).
    pub const MEM_SIZE: u64 = 1024 * 1024 * 1024;

    /// ISA of every core.
    pub const MACHINE: &str = "[CORES:RV64G]";

    /// Entry point of every core.
    pub const START_ADDR: &str = "[CORES:0x00000000]";

    /// Offload queue depth (waiting plus executing entries).
    pub const QUEUE_DEPTH: usize = 8;

    /// Concurrent offloads when multi-issue is enabled.
    pub const ISSUE_WIDTH: usize = 1;

    /// Number of operations generated per core by the synthetic workload.
    pub const SYNTHETIC_OPS: u64 = 10_000;

    /// Relative weight of loads in the synthetic mix.
    pub const SYNTHETIC_LOAD_WEIGHT: u32 = 6;

    /// Relative weight of stores in the synthetic mix.
    pub const SYNTHETIC_STORE_WEIGHT: u32 = 3;

    /// Relative weight of compute bursts in the synthetic mix.
    pub const SYNTHETIC_COMPUTE_WEIGHT: u32 = 1;

    /// Longest compute burst, in core cycles.
    pub const SYNTHETIC_MAX_COMPUTE: u64 = 4;

    /// Coprocessor cycles per synthetic offload.
    pub const SYNTHETIC_OFFLOAD_CYCLES: u64 = 4;
}

/// Accepts `0`/`1` as well as `true`/`false`, as SST parameter scripts do.
fn bool_or_int<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(u64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(n) => n != 0,
    })
}

/// Accepts a bare number wherever a unit string is expected (`"stopAtCycle": 0`).
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Int(u64),
        Float(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Int(n) => n.to_string(),
        Raw::Float(x) => x.to_string(),
    })
}

/// What a core does after a runtime fault is delivered to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaultPolicy {
    /// Stop the faulting core; other cores keep running.
    #[default]
    Halt,
    /// Skip the faulting operation and resume on the next cycle.
    Continue,
}

/// Coprocessor issue capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IssueMode {
    /// One offload executes at a time; completion follows submission order.
    #[default]
    Single,
    /// Up to `issueWidth` offloads execute concurrently and may complete out of order.
    Multi,
}

/// Program options (`sst.setProgramOption`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramOptions {
    /// Smallest representable time unit, e.g. `"1ps"`.
    #[serde(default = "ProgramOptions::default_timebase")]
    pub timebase: String,

    /// Stop time; `"0s"` or `0` runs until no events remain.
    #[serde(
        default = "ProgramOptions::default_stop_at",
        deserialize_with = "string_or_number"
    )]
    pub stop_at_cycle: String,

    /// Seed for all pseudo-random draws.
    #[serde(default = "ProgramOptions::default_seed")]
    pub seed: u64,
}

impl ProgramOptions {
    fn default_timebase() -> String {
        defaults::TIMEBASE.to_string()
    }

    fn default_stop_at() -> String {
        defaults::STOP_AT.to_string()
    }

    const fn default_seed() -> u64 {
        defaults::SEED
    }
}

impl Default for ProgramOptions {
    fn default() -> Self {
        Self {
            timebase: Self::default_timebase(),
            stop_at_cycle: Self::default_stop_at(),
            seed: defaults::SEED,
        }
    }
}

/// Parameters of the CPU component (`revcpu.RevCPU`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuParams {
    /// Diagnostic verbosity; higher logs more.
    #[serde(default)]
    pub verbose: u32,

    /// Number of cores.
    #[serde(default = "CpuParams::default_num_cores")]
    pub num_cores: usize,

    /// Core clock, e.g. `"1.0GHz"`.
    #[serde(default = "CpuParams::default_clock")]
    pub clock: String,

    /// Addressable memory in bytes.
    #[serde(default = "CpuParams::default_mem_size")]
    pub mem_size: u64,

    /// Per-core ISA, e.g. `"[0:RV32I]"`.
    #[serde(default = "CpuParams::default_machine")]
    pub machine: String,

    /// Per-core entry point, e.g. `"[0:0x00000000]"`.
    #[serde(default = "CpuParams::default_start_addr")]
    pub start_addr: String,

    /// Per-core latency range, e.g. `"[0:1:10]"`. Required.
    #[serde(default)]
    pub mem_cost: Option<String>,

    /// Optional per-core latency table, e.g. `"[0:1|4|10]"`.
    #[serde(default)]
    pub mem_cost_table: Option<String>,

    /// Attach one coprocessor to every core.
    #[serde(default, deserialize_with = "bool_or_int")]
    pub enable_co_proc: bool,

    /// Path of the operation trace each core executes.
    #[serde(default)]
    pub program: Option<String>,

    /// Reaction to address faults and unserviceable offloads.
    #[serde(default)]
    pub fault_policy: FaultPolicy,
}

impl CpuParams {
    const fn default_num_cores() -> usize {
        defaults::NUM_CORES
    }

    fn default_clock() -> String {
        defaults::CLOCK.to_string()
    }

    const fn default_mem_size() -> u64 {
        defaults::MEM_SIZE
    }

    fn default_machine() -> String {
        defaults::MACHINE.to_string()
    }

    fn default_start_addr() -> String {
        defaults::START_ADDR.to_string()
    }
}

impl Default for CpuParams {
    fn default() -> Self {
        Self {
            verbose: 0,
            num_cores: defaults::NUM_CORES,
            clock: Self::default_clock(),
            mem_size: defaults::MEM_SIZE,
            machine: Self::default_machine(),
            start_addr: Self::default_start_addr(),
            mem_cost: None,
            mem_cost_table: None,
            enable_co_proc: false,
            program: None,
            fault_policy: FaultPolicy::default(),
        }
    }
}

/// Parameters of the coprocessor subcomponent (`revcpu.RevSimpleCoProc`).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoProcParams {
    /// Coprocessor clock; may differ from the core clock.
    #[serde(default = "CoProcParams::default_clock")]
    pub clock: String,

    /// Diagnostic verbosity.
    #[serde(default)]
    pub verbose: u32,

    /// Maximum waiting plus executing offloads.
    #[serde(default = "CoProcParams::default_queue_depth")]
    pub queue_depth: usize,

    /// Single- or multi-issue.
    #[serde(default)]
    pub issue: IssueMode,

    /// Concurrent offloads in multi-issue mode.
    #[serde(default = "CoProcParams::default_issue_width")]
    pub issue_width: usize,
}

impl CoProcParams {
    fn default_clock() -> String {
        defaults::CLOCK.to_string()
    }

    const fn default_queue_depth() -> usize {
        defaults::QUEUE_DEPTH
    }

    const fn default_issue_width() -> usize {
        defaults::ISSUE_WIDTH
    }
}

impl Default for CoProcParams {
    fn default() -> Self {
        Self {
            clock: Self::default_clock(),
            verbose: 0,
            queue_depth: defaults::QUEUE_DEPTH,
            issue: IssueMode::default(),
            issue_width: defaults::ISSUE_WIDTH,
        }
    }
}

/// Synthetic operation mix used when no `program` is configured.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyntheticParams {
    /// Operations generated per core.
    #[serde(default = "SyntheticParams::default_ops")]
    pub ops: u64,

    /// Relative weight of loads.
    #[serde(default = "SyntheticParams::default_load_weight")]
    pub load_weight: u32,

    /// Relative weight of stores.
    #[serde(default = "SyntheticParams::default_store_weight")]
    pub store_weight: u32,

    /// Relative weight of compute bursts.
    #[serde(default = "SyntheticParams::default_compute_weight")]
    pub compute_weight: u32,

    /// Relative weight of offloads (ignored without a coprocessor).
    #[serde(default)]
    pub offload_weight: u32,

    /// Longest compute burst in core cycles.
    #[serde(default = "SyntheticParams::default_max_compute")]
    pub max_compute: u64,

    /// Coprocessor cycles per offload.
    #[serde(default = "SyntheticParams::default_offload_cycles")]
    pub offload_cycles: u64,

    /// Addresses are drawn from `[0, addressSpan)`; defaults to `memSize`.
    #[serde(default)]
    pub address_span: Option<u64>,
}

impl SyntheticParams {
    const fn default_ops() -> u64 {
        defaults::SYNTHETIC_OPS
    }

    const fn default_load_weight() -> u32 {
        defaults::SYNTHETIC_LOAD_WEIGHT
    }

    const fn default_store_weight() -> u32 {
        defaults::SYNTHETIC_STORE_WEIGHT
    }

    const fn default_compute_weight() -> u32 {
        defaults::SYNTHETIC_COMPUTE_WEIGHT
    }

    const fn default_max_compute() -> u64 {
        defaults::SYNTHETIC_MAX_COMPUTE
    }

    const fn default_offload_cycles() -> u64 {
        defaults::SYNTHETIC_OFFLOAD_CYCLES
    }
}

impl Default for SyntheticParams {
    fn default() -> Self {
        Self {
            ops: defaults::SYNTHETIC_OPS,
            load_weight: defaults::SYNTHETIC_LOAD_WEIGHT,
            store_weight: defaults::SYNTHETIC_STORE_WEIGHT,
            compute_weight: defaults::SYNTHETIC_COMPUTE_WEIGHT,
            offload_weight: 0,
            max_compute: defaults::SYNTHETIC_MAX_COMPUTE,
            offload_cycles: defaults::SYNTHETIC_OFFLOAD_CYCLES,
            address_span: None,
        }
    }
}

/// Root configuration, mirroring the structure of an SST parameter script.
///
/// # Examples
///
/// ```
/// use revsim_core::config::Config;
///
/// let json = r#"{
///     "program_options": { "timebase": "1ps", "stopAtCycle": "0s" },
///     "statistic_load_level": 4,
///     "cpu": {
///         "numCores": 1,
///         "clock": "1.0GHz",
///         "memSize": 1073741824,
///         "machine": "[0:RV32I]",
///         "enableCoProc": 1,
///         "startAddr": "[0:0x00000000]",
///         "memCost": "[0:1:10]"
///     },
///     "co_proc": { "clock": "1.0GHz" }
/// }"#;
///
/// let config = Config::from_json(json).unwrap();
/// let platform = config.build().unwrap();
/// assert_eq!(platform.cores.len(), 1);
/// assert_eq!(platform.cores[0].cost.max, 10);
/// assert!(platform.coproc.is_some());
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Timebase, stop condition, and seed.
    #[serde(default)]
    pub program_options: ProgramOptions,
    /// Highest statistic level that is recorded.
    #[serde(default = "Config::default_statistic_load_level")]
    pub statistic_load_level: u8,
    /// CPU component parameters.
    #[serde(default)]
    pub cpu: CpuParams,
    /// Coprocessor parameters, used when `cpu.enableCoProc` is set.
    #[serde(default)]
    pub co_proc: CoProcParams,
    /// Synthetic workload, used when `cpu.program` is absent.
    #[serde(default)]
    pub synthetic: SyntheticParams,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            program_options: ProgramOptions::default(),
            statistic_load_level: defaults::STATISTIC_LOAD_LEVEL,
            cpu: CpuParams::default(),
            co_proc: CoProcParams::default(),
            synthetic: SyntheticParams::default(),
        }
    }
}

/// Latency range of one core's memory requests, in core cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemCost {
    /// Smallest delay (at least 1).
    pub min: u64,
    /// Largest delay (at least `min`).
    pub max: u64,
}

impl MemCost {
    /// Validates and builds a latency range for `core`.
    pub fn new(core: usize, min: u64, max: u64) -> Result<Self, ConfigError> {
        if min == 0 {
            return Err(ConfigError::ZeroLatency { core });
        }
        if min > max {
            return Err(ConfigError::InvertedRange { core, min, max });
        }
        Ok(Self { min, max })
    }

    /// Returns `true` if `latency` lies inside the range.
    pub const fn contains(&self, latency: u64) -> bool {
        latency >= self.min && latency <= self.max
    }
}

/// When the event loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCondition {
    /// Run until no events remain.
    Drain,
    /// Stop before dispatching any event later than this tick.
    AtTick(Tick),
}

/// Validated configuration of one core.
#[derive(Debug, Clone)]
pub struct CoreSpec {
    /// Core index.
    pub id: CoreId,
    /// ISA bound to this core.
    pub isa: Isa,
    /// Entry program counter.
    pub start_addr: u64,
    /// Memory latency range.
    pub cost: MemCost,
    /// Optional table of latencies cycled in order instead of random draws.
    pub cost_table: Option<Vec<u64>>,
    /// Core clock domain.
    pub clock: ClockDomain,
    /// Diagnostic verbosity.
    pub verbose: u32,
    /// Reaction to runtime faults.
    pub fault_policy: FaultPolicy,
}

/// Validated coprocessor configuration, shared by every attached coprocessor.
#[derive(Debug, Clone, Copy)]
pub struct CoProcSpec {
    /// Coprocessor clock domain.
    pub clock: ClockDomain,
    /// Maximum waiting plus executing offloads.
    pub queue_depth: usize,
    /// Issue capability.
    pub issue: IssueMode,
    /// Concurrent offloads (1 in single-issue mode).
    pub issue_width: usize,
    /// Diagnostic verbosity.
    pub verbose: u32,
}

/// Typed, validated platform description; immutable once built.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Femtoseconds per timebase tick.
    pub timebase_fs: f64,
    /// When the run stops.
    pub stop: StopCondition,
    /// Highest recorded statistic level.
    pub statistic_load_level: u8,
    /// Seed for all pseudo-random draws.
    pub seed: u64,
    /// Addressable memory in bytes; never resized.
    pub mem_size: u64,
    /// One entry per core, indexed by core id.
    pub cores: Vec<CoreSpec>,
    /// Present when a coprocessor is attached to every core.
    pub coproc: Option<CoProcSpec>,
}

impl Config {
    const fn default_statistic_load_level() -> u8 {
        defaults::STATISTIC_LOAD_LEVEL
    }

    /// Parses a JSON configuration document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates every parameter and produces the typed [`Platform`].
    ///
    /// All bracket-list strings are parsed here. Any missing or malformed per-core
    /// entry, inverted latency range, or unrepresentable clock is reported before
    /// simulated time can advance.
    pub fn build(&self) -> Result<Platform, ConfigError> {
        let cpu = &self.cpu;
        let num_cores = cpu.num_cores;
        if num_cores == 0 {
            return Err(ConfigError::Malformed {
                key: "numCores",
                reason: "at least one core is required".to_string(),
            });
        }
        if cpu.mem_size == 0 {
            return Err(ConfigError::Malformed {
                key: "memSize",
                reason: "memory size must be non-zero".to_string(),
            });
        }

        let timebase_fs = units::parse_timebase(&self.program_options.timebase)?;
        let stop = match units::time_ticks(
            "stopAtCycle",
            &self.program_options.stop_at_cycle,
            timebase_fs,
        )? {
            0 => StopCondition::Drain,
            tick => StopCondition::AtTick(tick),
        };

        let core_clock = ClockDomain::new(units::clock_period_ticks(&cpu.clock, timebase_fs)?);

        let isas = params::per_core("machine", &cpu.machine, num_cores, 1, |_, f| {
            f[0].parse::<Isa>()
        })?;
        let starts = params::per_core("startAddr", &cpu.start_addr, num_cores, 1, |_, f| {
            params::parse_u64("startAddr", f[0])
        })?;
        let mem_cost = cpu
            .mem_cost
            .as_deref()
            .ok_or(ConfigError::MissingCore {
                key: "memCost",
                core: 0,
            })?;
        let costs = params::per_core("memCost", mem_cost, num_cores, 2, |core, f| {
            let min = params::parse_u64("memCost", f[0])?;
            let max = params::parse_u64("memCost", f[1])?;
            MemCost::new(core, min, max)
        })?;
        let tables = match cpu.mem_cost_table.as_deref() {
            Some(raw) => params::per_core("memCostTable", raw, num_cores, 1, |_, f| {
                parse_table(f[0]).map(Some)
            })?,
            None => vec![None; num_cores],
        };

        let mut cores = Vec::with_capacity(num_cores);
        for (index, (((isa, start_addr), cost), cost_table)) in isas
            .into_iter()
            .zip(starts)
            .zip(costs)
            .zip(tables)
            .enumerate()
        {
            if !isa.fits_address(start_addr) {
                return Err(ConfigError::StartAddressWidth {
                    core: index,
                    addr: start_addr,
                    isa: isa.to_string(),
                });
            }
            if start_addr >= cpu.mem_size {
                return Err(ConfigError::StartAddressRange {
                    core: index,
                    addr: start_addr,
                    mem_size: cpu.mem_size,
                });
            }
            if let Some(table) = &cost_table {
                if let Some(&value) = table.iter().find(|&&v| !cost.contains(v)) {
                    return Err(ConfigError::TableOutOfRange {
                        core: index,
                        value,
                        min: cost.min,
                        max: cost.max,
                    });
                }
            }

            cores.push(CoreSpec {
                id: CoreId(index),
                isa,
                start_addr,
                cost,
                cost_table,
                clock: core_clock,
                verbose: cpu.verbose,
                fault_policy: cpu.fault_policy,
            });
        }

        let coproc = if cpu.enable_co_proc {
            Some(self.build_coproc(timebase_fs)?)
        } else {
            None
        };

        Ok(Platform {
            timebase_fs,
            stop,
            statistic_load_level: self.statistic_load_level,
            seed: self.program_options.seed,
            mem_size: cpu.mem_size,
            cores,
            coproc,
        })
    }

    fn build_coproc(&self, timebase_fs: f64) -> Result<CoProcSpec, ConfigError> {
        let p = &self.co_proc;
        if p.queue_depth == 0 {
            return Err(ConfigError::Malformed {
                key: "queueDepth",
                reason: "queue depth must be at least 1".to_string(),
            });
        }
        let issue_width = match p.issue {
            IssueMode::Single => 1,
            IssueMode::Multi if p.issue_width == 0 => {
                return Err(ConfigError::Malformed {
                    key: "issueWidth",
                    reason: "issue width must be at least 1".to_string(),
                });
            }
            IssueMode::Multi => p.issue_width,
        };

        Ok(CoProcSpec {
            clock: ClockDomain::new(units::clock_period_ticks(&p.clock, timebase_fs)?),
            queue_depth: p.queue_depth,
            issue: p.issue,
            issue_width,
            verbose: p.verbose,
        })
    }
}

/// Parses a `|`-separated latency table such as `1|4|10`.
fn parse_table(raw: &str) -> Result<Vec<u64>, ConfigError> {
    let table = raw
        .split('|')
        .map(|v| params::parse_u64("memCostTable", v))
        .collect::<Result<Vec<_>, _>>()?;
    if table.is_empty() {
        return Err(ConfigError::Malformed {
            key: "memCostTable",
            reason: "latency table is empty".to_string(),
        });
    }
    Ok(table)
}
