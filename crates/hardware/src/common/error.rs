//! Error and fault definitions.
//!
//! This module defines the error taxonomy of the simulator. It provides:
//! 1. **Setup Errors:** [`ConfigError`] for malformed or missing parameters, raised
//!    before any simulated tick executes.
//! 2. **Runtime Faults:** [`AddressFault`] and [`CoreFault`], delivered to the issuing
//!    core as typed events rather than aborting the run.
//! 3. **Backpressure:** [`BackpressureError`], returned synchronously when a coprocessor
//!    queue is full.
//! 4. **Invariant Violations:** [`SimError`] for conditions the event loop cannot recover from.

use thiserror::Error;

use super::data::AccessKind;
use super::ids::CoreId;

/// Malformed or missing configuration. Fatal; the simulation never starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A parameter string could not be parsed.
    #[error("parameter `{key}`: {reason}")]
    Malformed {
        /// Parameter name as it appears in the configuration.
        key: &'static str,
        /// Human-readable description of the problem.
        reason: String,
    },

    /// A per-core entry names a core index that does not exist.
    #[error("parameter `{key}` references core {core}, but numCores is {num_cores}")]
    CoreOutOfRange {
        /// Parameter name.
        key: &'static str,
        /// Offending core index.
        core: usize,
        /// Configured core count.
        num_cores: usize,
    },

    /// A per-core table has no entry for one of the configured cores.
    #[error("parameter `{key}` has no entry for core {core}")]
    MissingCore {
        /// Parameter name.
        key: &'static str,
        /// Core index without an entry.
        core: usize,
    },

    /// `memCost` minimum latency is larger than its maximum.
    #[error("core {core}: memCost minimum {min} exceeds maximum {max}")]
    InvertedRange {
        /// Core index.
        core: usize,
        /// Configured minimum latency.
        min: u64,
        /// Configured maximum latency.
        max: u64,
    },

    /// `memCost` minimum latency is zero.
    #[error("core {core}: memCost minimum latency must be at least 1 cycle")]
    ZeroLatency {
        /// Core index.
        core: usize,
    },

    /// A `memCostTable` entry lies outside the core's `memCost` range.
    #[error("core {core}: memCostTable entry {value} outside memCost range [{min}, {max}]")]
    TableOutOfRange {
        /// Core index.
        core: usize,
        /// Offending table entry.
        value: u64,
        /// Range minimum.
        min: u64,
        /// Range maximum.
        max: u64,
    },

    /// An ISA string from `machine` is not understood.
    #[error("invalid ISA string `{isa}`: {reason}")]
    Isa {
        /// The ISA string as written.
        isa: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A start address does not fit in the core's register width.
    #[error("core {core}: start address {addr:#x} does not fit in {isa}")]
    StartAddressWidth {
        /// Core index.
        core: usize,
        /// Configured start address.
        addr: u64,
        /// Canonical ISA string of the core.
        isa: String,
    },

    /// A start address lies outside `[0, memSize)`.
    #[error("core {core}: start address {addr:#x} outside memory of {mem_size:#x} bytes")]
    StartAddressRange {
        /// Core index.
        core: usize,
        /// Configured start address.
        addr: u64,
        /// Configured memory size.
        mem_size: u64,
    },

    /// A clock, period, or time string could not be converted to ticks.
    #[error("invalid {what} `{value}`: {reason}")]
    Units {
        /// Which quantity was being parsed (e.g. `clock`, `timebase`).
        what: &'static str,
        /// The string as written.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The program could not be read.
    #[error("program `{path}`: {source}")]
    ProgramIo {
        /// Path of the program.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The program could not be parsed.
    #[error("program `{path}`: {source}")]
    Program {
        /// Path of the program.
        path: String,
        /// Parse error with line information.
        #[source]
        source: TraceError,
    },

    /// The configuration document is not valid JSON for [`Config`](crate::config::Config).
    #[error("invalid configuration document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Syntax error in an operation trace.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("line {line}: {reason}")]
pub struct TraceError {
    /// One-based line number.
    pub line: usize,
    /// Why the line was rejected.
    pub reason: String,
}

/// A memory request whose address falls outside `[0, memSize)`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{core}: {kind} at {address:#x} outside memory of {mem_size:#x} bytes")]
pub struct AddressFault {
    /// Core that issued the request.
    pub core: CoreId,
    /// Faulting address.
    pub address: u64,
    /// Load or store.
    pub kind: AccessKind,
    /// Configured memory size.
    pub mem_size: u64,
}

/// The coprocessor offload queue is at capacity.
///
/// Returned synchronously by
/// [`CoProc::submit_offload`](crate::core::coproc::CoProc::submit_offload); queue
/// occupancy is unchanged.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("coprocessor queue full ({capacity} entries)")]
pub struct BackpressureError {
    /// Queue capacity at the time of submission.
    pub capacity: usize,
}

/// Runtime fault delivered to a core as an event.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum CoreFault {
    /// Memory request outside the configured memory.
    #[error(transparent)]
    Address(#[from] AddressFault),

    /// An offload was issued by a core with no attached coprocessor.
    #[error("{core}: offload {inst_id} issued with no coprocessor attached")]
    NoCoprocessor {
        /// Core that issued the offload.
        core: CoreId,
        /// Instruction identifier of the offload.
        inst_id: u32,
    },
}

/// Unrecoverable simulation error.
#[derive(Debug, Error)]
pub enum SimError {
    /// Setup failed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// An event or request named a core that was never registered.
    #[error("{0} is not registered with the simulator")]
    UnregisteredCore(CoreId),
}
