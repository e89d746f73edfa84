//! Coprocessor attachment.
//!
//! A coprocessor is a clocked unit owned by exactly one core. It provides:
//! 1. **Offload Submission:** Non-blocking from the core's perspective; a full queue is
//!    reported synchronously as a [`BackpressureError`].
//! 2. **Completion Polling:** The core polls each outstanding handle on its own ticks.
//! 3. **Clock Crossing:** Submission ticks are mapped to the first coprocessor edge at or
//!    after them; completion edges are reported back as absolute ticks.
//!
//! Coprocessors are created at setup, live for the entire run, and are never
//! attached or detached while the simulation runs.

/// Queue-based coprocessor (`RevSimpleCoProc`).
pub mod simple;

use std::fmt;

use crate::common::{BackpressureError, Tick};
use crate::sim::event::Scheduler;
use crate::stats::StatisticsSink;

pub use simple::SimpleCoProc;

/// Operation offloaded from a core's instruction stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffloadOp {
    /// Identifier of the core-issued instruction.
    pub inst_id: u32,
    /// Opaque operand payload.
    pub payload: Vec<u8>,
    /// Execution time in coprocessor cycles (0 is treated as 1).
    pub cycles: u64,
}

impl OffloadOp {
    /// Creates an offload with an empty payload.
    pub const fn new(inst_id: u32, cycles: u64) -> Self {
        Self {
            inst_id,
            payload: Vec::new(),
            cycles,
        }
    }

    /// Attaches an operand payload.
    #[must_use]
    pub fn with_payload(mut self, payload: Vec<u8>) -> Self {
        self.payload = payload;
        self
    }
}

/// Ticket identifying one submitted offload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OffloadHandle(pub u64);

impl fmt::Display for OffloadHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offload#{}", self.0)
    }
}

/// Result of a completed offload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OffloadResult {
    /// Handle returned at submission.
    pub handle: OffloadHandle,
    /// Instruction identifier of the offload.
    pub inst_id: u32,
    /// Result payload.
    pub payload: Vec<u8>,
    /// Tick at which the core submitted the offload.
    pub submitted_at: Tick,
    /// Tick of the coprocessor edge at which execution finished.
    pub completed_at: Tick,
}

/// Interface between a core and its attached coprocessor.
pub trait CoProc: fmt::Debug + Send {
    /// Queues an offload and returns its handle.
    ///
    /// Never blocks. The submission tick is `sched.now()`.
    ///
    /// # Errors
    ///
    /// Returns [`BackpressureError`] if the queue is at capacity; the queue is left
    /// unchanged.
    fn submit_offload(
        &mut self,
        op: &OffloadOp,
        sched: &mut Scheduler<'_>,
    ) -> Result<OffloadHandle, BackpressureError>;

    /// Returns the result of `handle` if it completed at or before `now`.
    ///
    /// A returned result is removed; later polls of the same handle return `None`.
    fn poll_completion(&mut self, handle: OffloadHandle, now: Tick) -> Option<OffloadResult>;

    /// Advances the coprocessor to the edge at `sched.now()`.
    fn clock_tick(&mut self, sched: &mut Scheduler<'_>, stats: &mut StatisticsSink);

    /// Returns the number of submitted offloads that have not finished executing.
    fn occupancy(&self) -> usize;

    /// Returns the queue capacity.
    fn capacity(&self) -> usize;

    /// Emits end-of-run statistics.
    fn report(&self, stats: &mut StatisticsSink);
}
