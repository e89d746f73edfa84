//! Core Definition and Initialization.
//!
//! This module defines the `Core` structure, the clocked model of one processor core.
//! It coordinates the following:
//! 1. **Operation Stream:** Consumes abstract operations from its [`Workload`].
//! 2. **Memory Requests:** Bounds-checks each access and asks the latency model when
//!    the response arrives.
//! 3. **Offloads:** Submits operations to its coprocessor and polls their handles on
//!    every tick while any are outstanding.
//! 4. **Faults:** Applies the configured [`FaultPolicy`] to fault events.

/// Clocked operation execution.
pub mod execution;

/// Memory request issue and response handling.
pub mod memory;

/// Fault delivery and halting.
pub mod trap;

use std::collections::VecDeque;
use std::sync::Arc;

use crate::common::constants::{STAT_LEVEL_DETAIL, STAT_LEVEL_MEMORY, STAT_LEVEL_SUMMARY};
use crate::common::{CoreId, Tick};
use crate::config::{CoreSpec, FaultPolicy};
use crate::core::coproc::{CoProc, OffloadHandle, OffloadResult};
use crate::core::workload::{CoreOp, Workload};
use crate::isa::Isa;
use crate::sim::clock::ClockDomain;
use crate::sim::event::{Event, Scheduler};
use crate::soc::memory::MemoryMap;
use crate::soc::memory::controller::MemoryLatencyModel;
use crate::stats::StatisticsSink;

/// Verbosity at which every executed operation is traced.
pub(crate) const OP_TRACE_VERBOSITY: u32 = 2;

/// Execution state of a core between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoreState {
    /// Ready to execute the next operation.
    Running,
    /// Executing a compute burst until the given core cycle.
    Busy {
        /// Core cycle at which the burst ends.
        until_cycle: u64,
    },
    /// Blocked on a load response.
    WaitMemory,
    /// Blocked until a fault event is handled.
    WaitFault,
    /// Blocked until every outstanding offload completes.
    WaitOffloads {
        /// Halt once drained instead of resuming.
        then_halt: bool,
    },
    /// Stopped; receives no further ticks.
    Halted,
}

/// Event counters of one core.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CoreCounters {
    /// Operations completed.
    pub instructions_retired: u64,
    /// Loads issued.
    pub loads: u64,
    /// Stores issued.
    pub stores: u64,
    /// Faults delivered.
    pub faults: u64,
    /// Sum of memory latencies in core cycles.
    pub mem_latency_total: u64,
    /// Offloads accepted by the coprocessor.
    pub offloads_submitted: u64,
    /// Offload completions observed.
    pub offloads_completed: u64,
    /// Submissions rejected because the coprocessor queue was full.
    pub backpressure_stalls: u64,
}

/// Everything a core may touch while handling an event.
#[allow(missing_debug_implementations)]
pub struct CoreContext<'a> {
    /// Handle for posting future events.
    pub sched: Scheduler<'a>,
    /// Address bounds shared by all cores.
    pub memory: &'a MemoryMap,
    /// Latency model shared by all cores.
    pub latency: &'a mut MemoryLatencyModel,
    /// The core's coprocessor, if one is attached.
    pub coproc: Option<&'a mut dyn CoProc>,
    /// Statistics sink.
    pub stats: &'a mut StatisticsSink,
}

/// Clocked model of one core.
#[derive(Debug)]
pub struct Core {
    id: CoreId,
    name: Arc<str>,
    isa: Isa,
    pc: u64,
    clock: ClockDomain,
    verbose: u32,
    fault_policy: FaultPolicy,
    workload: Box<dyn Workload>,
    state: CoreState,
    /// Operation rejected by backpressure, retried on the next cycle.
    pending_op: Option<CoreOp>,
    outstanding: VecDeque<OffloadHandle>,
    completions: Vec<OffloadResult>,
    stores_in_flight: u64,
    next_tick: Option<Tick>,
    halted_at: Option<Tick>,
    counters: CoreCounters,
}

impl Core {
    /// Creates a core from its validated configuration and operation stream.
    pub fn new(spec: &CoreSpec, workload: Box<dyn Workload>) -> Self {
        Self {
            id: spec.id,
            name: Arc::from(format!("cpu.{}", spec.id)),
            isa: spec.isa,
            pc: spec.start_addr,
            clock: spec.clock,
            verbose: spec.verbose,
            fault_policy: spec.fault_policy,
            workload,
            state: CoreState::Running,
            pending_op: None,
            outstanding: VecDeque::new(),
            completions: Vec::new(),
            stores_in_flight: 0,
            next_tick: None,
            halted_at: None,
            counters: CoreCounters::default(),
        }
    }

    /// Returns the core index.
    pub const fn id(&self) -> CoreId {
        self.id
    }

    /// Returns the statistics component name, e.g. `cpu.core0`.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the ISA bound to this core.
    pub const fn isa(&self) -> Isa {
        self.isa
    }

    /// Returns the operation counter, starting at the configured entry point.
    pub const fn pc(&self) -> u64 {
        self.pc
    }

    /// Returns the core clock domain.
    pub const fn clock(&self) -> ClockDomain {
        self.clock
    }

    /// Returns the current execution state.
    pub const fn state(&self) -> CoreState {
        self.state
    }

    /// Returns `true` once the core has stopped.
    pub const fn is_halted(&self) -> bool {
        matches!(self.state, CoreState::Halted)
    }

    /// Returns the tick at which the core halted.
    pub const fn halted_at(&self) -> Option<Tick> {
        self.halted_at
    }

    /// Returns the event counters.
    pub const fn counters(&self) -> &CoreCounters {
        &self.counters
    }

    /// Returns offload handles not yet observed as complete, in submission order.
    pub fn outstanding(&self) -> impl Iterator<Item = OffloadHandle> + '_ {
        self.outstanding.iter().copied()
    }

    /// Returns observed offload completions in the order the core saw them.
    pub fn completions(&self) -> &[OffloadResult] {
        &self.completions
    }

    /// Returns stores issued whose response has not arrived.
    pub const fn stores_in_flight(&self) -> u64 {
        self.stores_in_flight
    }

    /// Schedules the first tick at `tick`.
    pub fn start(&mut self, sched: &mut Scheduler<'_>, tick: Tick) {
        match self.clock.edge_at_or_after(tick) {
            Some(edge) => self.request_tick(sched, edge),
            None => self.out_of_time(tick),
        }
    }

    /// Requests the first edge after `now`. A core with no edge left before the
    /// tick horizon halts.
    pub(crate) fn request_next_edge(&mut self, sched: &mut Scheduler<'_>, now: Tick) {
        match self.clock.edge_after(now) {
            Some(edge) => self.request_tick(sched, edge),
            None => self.out_of_time(now),
        }
    }

    /// Schedules a tick unless one is already pending at or before `tick`.
    pub(crate) fn request_tick(&mut self, sched: &mut Scheduler<'_>, tick: Tick) {
        match self.next_tick {
            Some(pending) if pending <= tick => {}
            _ => {
                self.next_tick = Some(tick);
                sched.schedule_at(tick, Event::CoreTick(self.id));
            }
        }
    }

    /// Returns `true` when per-operation tracing is on.
    pub(crate) const fn traces_ops(&self) -> bool {
        cfg!(feature = "always-trace") || self.verbose >= OP_TRACE_VERBOSITY
    }

    /// Emits end-of-run statistics; `end_tick` bounds the cycle count of a core
    /// that never halted.
    pub fn report(&self, end_tick: Tick, stats: &mut StatisticsSink) {
        let end = self.halted_at.unwrap_or(end_tick);
        let c = &self.counters;
        let name = &self.name;
        stats.emit(name, "cycles", self.clock.cycle_at(end), "cycles", STAT_LEVEL_SUMMARY);
        stats.emit(
            name,
            "instructions_retired",
            c.instructions_retired,
            "count",
            STAT_LEVEL_SUMMARY,
        );
        stats.emit(name, "faults", c.faults, "count", STAT_LEVEL_SUMMARY);
        stats.emit(name, "loads", c.loads, "count", STAT_LEVEL_MEMORY);
        stats.emit(name, "stores", c.stores, "count", STAT_LEVEL_MEMORY);
        stats.emit(
            name,
            "mem_latency_total",
            c.mem_latency_total,
            "cycles",
            STAT_LEVEL_MEMORY,
        );
        stats.emit(
            name,
            "offloads_submitted",
            c.offloads_submitted,
            "count",
            STAT_LEVEL_DETAIL,
        );
        stats.emit(
            name,
            "offloads_completed",
            c.offloads_completed,
            "count",
            STAT_LEVEL_DETAIL,
        );
        stats.emit(
            name,
            "backpressure_stalls",
            c.backpressure_stalls,
            "count",
            STAT_LEVEL_DETAIL,
        );
    }
}
