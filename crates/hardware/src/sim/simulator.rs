//! Simulator: owns every component and the event queue side-by-side.
//!
//! Components never hold references to each other. The simulator pops the next
//! event, lends the target component a [`CoreContext`] (or a bare scheduler for a
//! coprocessor) for the duration of the handler, and moves on. Registration order
//! is core 0, its coprocessor, core 1, its coprocessor, and so on; that order is the
//! same-tick priority.

use std::fmt;

use tracing::{debug, info};

use crate::common::{ConfigError, CoreId, SimError, Tick};
use crate::config::{Config, Platform, StopCondition};
use crate::core::coproc::{CoProc, SimpleCoProc};
use crate::core::workload::Workload;
use crate::core::{Core, CoreContext};
use crate::sim::event::{Event, EventQueue, Scheduler};
use crate::sim::loader;
use crate::soc::System;
use crate::stats::{StatFormat, StatisticsSink};

/// Why [`Simulator::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No events remained.
    Drained,
    /// The next event lay beyond `stopAtCycle`.
    StopCondition,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Drained => "drained",
            Self::StopCondition => "stop-condition",
        })
    }
}

/// Outcome of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Last simulated tick: the stop tick, or the tick of the last event.
    pub end_tick: Tick,
    /// Why the run ended.
    pub stop_reason: StopReason,
    /// Events dispatched.
    pub events: u64,
}

/// Top-level simulator: platform, shared system, cores, and coprocessors.
pub struct Simulator {
    platform: Platform,
    queue: EventQueue,
    system: System,
    cores: Vec<Core>,
    coprocs: Vec<Option<Box<dyn CoProc>>>,
    stats: StatisticsSink,
    summary: Option<RunSummary>,
}

impl fmt::Debug for Simulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulator")
            .field("now", &self.queue.now())
            .field("pending", &self.queue.len())
            .field("cores", &self.cores.len())
            .field("summary", &self.summary)
            .finish_non_exhaustive()
    }
}

impl Simulator {
    /// Validates `config`, loads the program, and registers every component.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for any invalid parameter or unreadable program;
    /// no simulated time has passed when this fails.
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let platform = config.build()?;
        let workloads = loader::workloads(config, &platform)?;
        Self::with_workloads(platform, workloads)
    }

    /// Builds a simulator running the given per-core workloads.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Malformed`] unless there is exactly one workload per core.
    pub fn with_workloads(
        platform: Platform,
        workloads: Vec<Box<dyn Workload>>,
    ) -> Result<Self, ConfigError> {
        if workloads.len() != platform.cores.len() {
            return Err(ConfigError::Malformed {
                key: "program",
                reason: format!(
                    "{} workloads supplied for {} cores",
                    workloads.len(),
                    platform.cores.len()
                ),
            });
        }

        let system = System::new(&platform);
        let mut queue = EventQueue::new();
        let mut cores = Vec::with_capacity(platform.cores.len());
        let mut coprocs = Vec::with_capacity(platform.cores.len());

        for (spec, workload) in platform.cores.iter().zip(workloads) {
            let mut core = Core::new(spec, workload);
            core.start(&mut Scheduler::new(&mut queue), 0);
            cores.push(core);
            coprocs.push(
                platform
                    .coproc
                    .as_ref()
                    .map(|cp| Box::new(SimpleCoProc::new(spec.id, cp)) as Box<dyn CoProc>),
            );
            debug!(core = %spec.id, isa = %spec.isa, start = spec.start_addr, "core registered");
        }

        Ok(Self {
            stats: StatisticsSink::new(platform.statistic_load_level),
            platform,
            queue,
            system,
            cores,
            coprocs,
            summary: None,
        })
    }

    /// Dispatches events until the queue drains or the stop condition is reached.
    ///
    /// Events later than `stopAtCycle` are never dispatched; in-flight requests and
    /// offloads are abandoned. Calling `run` again after it returned is a no-op.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] if an event targets a core that was never registered.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        if let Some(summary) = self.summary {
            return Ok(summary);
        }
        info!(
            cores = self.cores.len(),
            coprocessors = self.platform.coproc.is_some(),
            stop = ?self.platform.stop,
            "simulation started"
        );

        let stop_reason = loop {
            let Some(next) = self.queue.peek_tick() else {
                break StopReason::Drained;
            };
            if let StopCondition::AtTick(limit) = self.platform.stop {
                if next > limit {
                    break StopReason::StopCondition;
                }
            }
            let Some((_, event)) = self.queue.pop() else {
                break StopReason::Drained;
            };
            self.dispatch(event)?;
        };

        let end_tick = match (stop_reason, self.platform.stop) {
            (StopReason::StopCondition, StopCondition::AtTick(limit)) => limit,
            _ => self.queue.now(),
        };
        let summary = RunSummary {
            end_tick,
            stop_reason,
            events: self.queue.dispatched(),
        };
        info!(
            end_tick,
            %stop_reason,
            events = summary.events,
            abandoned = self.queue.len(),
            "simulation finished"
        );
        self.summary = Some(summary);
        Ok(summary)
    }

    fn dispatch(&mut self, event: Event) -> Result<(), SimError> {
        let owner = match &event {
            Event::CoreTick(core)
            | Event::CoProcTick(core)
            | Event::MemResponse { core, .. }
            | Event::Fault { core, .. } => *core,
        };
        let index = owner.index();

        if let Event::CoProcTick(_) = event {
            let coproc = self
                .coprocs
                .get_mut(index)
                .and_then(Option::as_mut)
                .ok_or(SimError::UnregisteredCore(owner))?;
            coproc.clock_tick(&mut Scheduler::new(&mut self.queue), &mut self.stats);
            return Ok(());
        }

        let core = self
            .cores
            .get_mut(index)
            .ok_or(SimError::UnregisteredCore(owner))?;
        let coproc: Option<&mut dyn CoProc> = match self.coprocs.get_mut(index) {
            Some(Some(cp)) => Some(&mut **cp),
            _ => None,
        };
        let mut ctx = CoreContext {
            sched: Scheduler::new(&mut self.queue),
            memory: &self.system.memory,
            latency: &mut self.system.latency,
            coproc,
            stats: &mut self.stats,
        };

        match event {
            Event::CoreTick(_) => core.tick(&mut ctx)?,
            Event::MemResponse {
                address,
                kind,
                issued_at,
                ..
            } => core.on_mem_response(&mut ctx, address, kind, issued_at),
            Event::Fault { fault, .. } => core.on_fault(&mut ctx, &fault),
            Event::CoProcTick(_) => {}
        }
        Ok(())
    }

    /// Restarts every latency draw sequence from `seed`.
    ///
    /// Doing so after the run has started is logged as a non-determinism warning.
    pub fn reseed(&mut self, seed: u64) {
        self.system.latency.reseed(seed);
    }

    /// Returns the validated platform.
    pub const fn platform(&self) -> &Platform {
        &self.platform
    }

    /// Returns the current simulated tick.
    pub const fn now(&self) -> Tick {
        self.queue.now()
    }

    /// Returns the shared memory system.
    pub const fn system(&self) -> &System {
        &self.system
    }

    /// Returns every core in registration order.
    pub fn cores(&self) -> &[Core] {
        &self.cores
    }

    /// Returns one core.
    pub fn core(&self, id: CoreId) -> Option<&Core> {
        self.cores.get(id.index())
    }

    /// Returns the coprocessor attached to `id`, if any.
    pub fn coproc(&self, id: CoreId) -> Option<&dyn CoProc> {
        self.coprocs.get(id.index())?.as_deref()
    }

    /// Returns the summary of the completed run.
    pub const fn summary(&self) -> Option<RunSummary> {
        self.summary
    }

    /// Returns the statistics recorded so far (per-request samples only; component
    /// totals are added by [`finish`](Self::finish)).
    pub const fn stats(&self) -> &StatisticsSink {
        &self.stats
    }

    /// Emits the end-of-run statistics of every component and flushes the sink.
    ///
    /// Consumes the simulator; statistics can be flushed only once.
    pub fn finish(mut self, format: StatFormat) -> String {
        let end_tick = self
            .summary
            .map_or_else(|| self.queue.now(), |s| s.end_tick);
        for (core, coproc) in self.cores.iter().zip(&self.coprocs) {
            core.report(end_tick, &mut self.stats);
            if let Some(coproc) = coproc {
                coproc.report(&mut self.stats);
            }
        }
        self.stats.flush(format)
    }
}
