//! Queue-based coprocessor.
//!
//! Offloads enter a bounded queue and execute for their stated number of coprocessor
//! cycles. In single-issue mode one offload executes at a time, so completion order is
//! submission order. In multi-issue mode up to `issue_width` offloads execute
//! concurrently and each completes after its own duration.
//!
//! The unit is only clocked while it has work: after each edge it schedules its next
//! edge at the earliest cycle where something can finish or start.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, trace};

use super::{CoProc, OffloadHandle, OffloadOp, OffloadResult};
use crate::common::constants::{
    STAT_LEVEL_DETAIL, STAT_LEVEL_OCCUPANCY, STAT_LEVEL_SAMPLES, STAT_LEVEL_SUMMARY,
};
use crate::common::{BackpressureError, CoreId, Tick};
use crate::config::{CoProcSpec, IssueMode};
use crate::sim::clock::ClockDomain;
use crate::sim::event::{Event, Scheduler};
use crate::stats::StatisticsSink;

/// Verbosity at which individual offloads are traced.
const TRACE_VERBOSITY: u32 = 4;

/// One queued offload.
#[derive(Debug)]
struct Job {
    handle: OffloadHandle,
    op: OffloadOp,
    submitted_at: Tick,
    /// First coprocessor cycle at which the job may start.
    ready_cycle: u64,
    /// Cycle at which execution finishes, once started.
    finish_cycle: Option<u64>,
}

#[derive(Debug, Default, Clone, Copy)]
struct Counters {
    submitted: u64,
    executed: u64,
    rejected: u64,
    busy_cycles: u64,
    high_water: usize,
}

/// Bounded-queue coprocessor owned by one core.
#[derive(Debug)]
pub struct SimpleCoProc {
    name: Arc<str>,
    owner: CoreId,
    clock: ClockDomain,
    capacity: usize,
    issue: IssueMode,
    issue_width: usize,
    verbose: u32,
    queue: VecDeque<Job>,
    done: BTreeMap<OffloadHandle, OffloadResult>,
    next_handle: u64,
    next_edge: Option<Tick>,
    counters: Counters,
}

impl SimpleCoProc {
    /// Creates the coprocessor attached to `owner`.
    pub fn new(owner: CoreId, spec: &CoProcSpec) -> Self {
        let issue_width = match spec.issue {
            IssueMode::Single => 1,
            IssueMode::Multi => spec.issue_width.max(1),
        };
        Self {
            name: Arc::from(format!("cpu.{owner}.co_proc")),
            owner,
            clock: spec.clock,
            capacity: spec.queue_depth,
            issue: spec.issue,
            issue_width,
            verbose: spec.verbose,
            queue: VecDeque::with_capacity(spec.queue_depth),
            done: BTreeMap::new(),
            next_handle: 0,
            next_edge: None,
            counters: Counters::default(),
        }
    }

    /// Returns the owning core.
    pub const fn owner(&self) -> CoreId {
        self.owner
    }

    /// Returns the issue capability.
    pub const fn issue_mode(&self) -> IssueMode {
        self.issue
    }

    /// Returns the coprocessor clock domain.
    pub const fn clock(&self) -> ClockDomain {
        self.clock
    }

    /// Returns the number of finished offloads not yet collected by the core.
    pub fn uncollected(&self) -> usize {
        self.done.len()
    }

    fn executing(&self) -> usize {
        self.queue
            .iter()
            .filter(|job| job.finish_cycle.is_some())
            .count()
    }

    /// Schedules an edge at `tick` unless an earlier one is already pending.
    fn request_edge(&mut self, sched: &mut Scheduler<'_>, tick: Tick) {
        match self.next_edge {
            Some(pending) if pending <= tick => {}
            _ => {
                self.next_edge = Some(tick);
                sched.schedule_at(tick, Event::CoProcTick(self.owner));
            }
        }
    }

    /// Moves every executing job whose finish cycle has been reached to `done`.
    fn retire(&mut self, cycle: u64) {
        let mut index = 0;
        while let Some(job) = self.queue.get(index) {
            if !job.finish_cycle.is_some_and(|finish| finish <= cycle) {
                index += 1;
                continue;
            }
            if let Some(job) = self.queue.remove(index) {
                let result = self.complete(job);
                let _ = self.done.insert(result.handle, result);
            }
        }
    }

    /// Converts a finished job into its result.
    fn complete(&mut self, job: Job) -> OffloadResult {
        let finish = job.finish_cycle.unwrap_or_default();
        let completed_at = self.clock.tick_of_cycle(finish);
        self.counters.executed += 1;
        if self.verbose >= TRACE_VERBOSITY {
            trace!(coproc = %self.name, handle = %job.handle, completed_at, "offload complete");
        }
        OffloadResult {
            handle: job.handle,
            inst_id: job.op.inst_id,
            payload: job.op.payload,
            submitted_at: job.submitted_at,
            completed_at,
        }
    }

    /// Starts waiting jobs, in submission order, while issue slots are free.
    fn issue(&mut self, cycle: u64, stats: &mut StatisticsSink) {
        let mut executing = self.executing();
        for job in &mut self.queue {
            if executing >= self.issue_width {
                break;
            }
            if job.finish_cycle.is_some() {
                continue;
            }
            if job.ready_cycle > cycle {
                // Later submissions are never ready earlier.
                break;
            }
            let duration = job.op.cycles.max(1);
            job.finish_cycle = Some(cycle.saturating_add(duration));
            self.counters.busy_cycles = self.counters.busy_cycles.saturating_add(duration);
            stats.emit(
                &self.name,
                "offload_exec_cycles",
                duration,
                "cycles",
                STAT_LEVEL_SAMPLES,
            );
            executing += 1;
        }
    }

    /// Returns the next cycle at which a job can finish or start.
    fn next_activity(&self, cycle: u64) -> Option<u64> {
        let slots_free = self.executing() < self.issue_width;
        self.queue
            .iter()
            .filter_map(|job| match job.finish_cycle {
                Some(finish) => Some(finish),
                None if slots_free => Some(job.ready_cycle.max(cycle.saturating_add(1))),
                None => None,
            })
            .min()
    }
}

impl CoProc for SimpleCoProc {
    fn submit_offload(
        &mut self,
        op: &OffloadOp,
        sched: &mut Scheduler<'_>,
    ) -> Result<OffloadHandle, BackpressureError> {
        if self.queue.len() >= self.capacity {
            self.counters.rejected += 1;
            return Err(BackpressureError {
                capacity: self.capacity,
            });
        }

        let now = sched.now();
        let handle = OffloadHandle(self.next_handle);
        self.next_handle += 1;
        let ready_cycle = self.clock.cycle_at_or_after(now);
        self.queue.push_back(Job {
            handle,
            op: op.clone(),
            submitted_at: now,
            ready_cycle,
            finish_cycle: None,
        });
        self.counters.submitted += 1;
        self.counters.high_water = self.counters.high_water.max(self.queue.len());

        if self.verbose >= TRACE_VERBOSITY {
            debug!(
                coproc = %self.name,
                %handle,
                inst_id = op.inst_id,
                ready_cycle,
                occupancy = self.queue.len(),
                "offload accepted"
            );
        }

        if let Some(edge) = self.clock.checked_tick_of_cycle(ready_cycle) {
            self.request_edge(sched, edge);
        }
        Ok(handle)
    }

    fn poll_completion(&mut self, handle: OffloadHandle, now: Tick) -> Option<OffloadResult> {
        if let Some(result) = self.done.get(&handle) {
            return if result.completed_at <= now {
                self.done.remove(&handle)
            } else {
                None
            };
        }

        // Finished at `now` but this unit's own edge has not been dispatched yet.
        let clock = self.clock;
        let index = self.queue.iter().position(|job| {
            job.handle == handle
                && job
                    .finish_cycle
                    .and_then(|finish| clock.checked_tick_of_cycle(finish))
                    .is_some_and(|done| done <= now)
        })?;
        let job = self.queue.remove(index)?;
        Some(self.complete(job))
    }

    fn clock_tick(&mut self, sched: &mut Scheduler<'_>, stats: &mut StatisticsSink) {
        let now = sched.now();
        // Superseded by an earlier edge that already ran.
        if self.next_edge != Some(now) {
            return;
        }
        self.next_edge = None;
        let cycle = self.clock.cycle_at(now);

        self.retire(cycle);
        self.issue(cycle, stats);

        // Activity past the last representable edge never happens.
        let next = self
            .next_activity(cycle)
            .and_then(|next| self.clock.checked_tick_of_cycle(next))
            .filter(|&edge| edge > now);
        if let Some(edge) = next {
            self.request_edge(sched, edge);
        }
    }

    fn occupancy(&self) -> usize {
        self.queue.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn report(&self, stats: &mut StatisticsSink) {
        let c = &self.counters;
        stats.emit(&self.name, "ops_executed", c.executed, "count", STAT_LEVEL_SUMMARY);
        stats.emit(&self.name, "ops_submitted", c.submitted, "count", STAT_LEVEL_DETAIL);
        stats.emit(&self.name, "ops_rejected", c.rejected, "count", STAT_LEVEL_DETAIL);
        stats.emit(&self.name, "busy_cycles", c.busy_cycles, "cycles", STAT_LEVEL_DETAIL);
        stats.emit(
            &self.name,
            "queue_high_water",
            c.high_water as u64,
            "entries",
            STAT_LEVEL_OCCUPANCY,
        );
    }
}
