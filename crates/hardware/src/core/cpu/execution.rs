//! Main Execution Loop.
//!
//! This module implements the clock edge of a core. It performs the following:
//! 1. **Completion Polling:** Every outstanding offload handle is polled, oldest first.
//! 2. **State Progress:** Compute bursts, load waits, and offload drains are advanced.
//! 3. **Operation Issue:** At most one new operation starts per edge.
//! 4. **Tick Requests:** The next edge is requested only when the core has something to
//!    do on it; a core blocked on memory with no outstanding offloads sleeps until the
//!    response arrives.

use tracing::{debug, trace};

use super::{Core, CoreContext, CoreState};
use crate::common::constants::STAT_LEVEL_SAMPLES;
use crate::common::{CoreFault, SimError, Tick};
use crate::core::workload::CoreOp;
use crate::sim::event::Event;

/// Width of one operation in the program counter.
const OP_BYTES: u64 = 4;

impl Core {
    /// Handles a clock edge at `ctx.sched.now()`.
    ///
    /// Edges that were superseded by an earlier request are ignored.
    ///
    /// # Errors
    ///
    /// Returns a [`SimError`] if the latency model does not know this core.
    pub fn tick(&mut self, ctx: &mut CoreContext<'_>) -> Result<(), SimError> {
        let now = ctx.sched.now();
        if self.next_tick != Some(now) {
            return Ok(());
        }
        self.next_tick = None;
        if self.is_halted() {
            return Ok(());
        }

        self.poll_offloads(ctx, now);

        let cycle = self.clock.cycle_at(now);
        match self.state {
            CoreState::Halted | CoreState::WaitFault => return Ok(()),
            CoreState::WaitMemory => {
                self.keep_polling(ctx, now);
                return Ok(());
            }
            CoreState::Busy { until_cycle } if cycle < until_cycle => {
                let resume = self.clock.tick_of_cycle(until_cycle);
                self.sleep_until(ctx, now, resume);
                return Ok(());
            }
            CoreState::Busy { .. } => {
                self.counters.instructions_retired += 1;
                self.state = CoreState::Running;
            }
            CoreState::WaitOffloads { then_halt } => {
                if !self.outstanding.is_empty() {
                    self.keep_polling(ctx, now);
                    return Ok(());
                }
                if then_halt {
                    self.halt(now);
                    return Ok(());
                }
                self.state = CoreState::Running;
            }
            CoreState::Running => {}
        }

        self.issue_next(ctx, now, cycle)
    }

    /// Starts the next operation, or the one that was rejected by backpressure.
    fn issue_next(
        &mut self,
        ctx: &mut CoreContext<'_>,
        now: Tick,
        cycle: u64,
    ) -> Result<(), SimError> {
        let op = match self.pending_op.take() {
            Some(op) => op,
            None => match self.workload.next_op() {
                Some(op) => {
                    self.pc = self.pc.wrapping_add(OP_BYTES) & self.isa.xlen.max_address();
                    op
                }
                None => {
                    self.drain_then_halt(ctx, now);
                    return Ok(());
                }
            },
        };

        if self.traces_ops() {
            trace!(core = %self.name, now, pc = self.pc, %op, "issue");
        }

        match op {
            CoreOp::Compute(cycles) => {
                let until_cycle = cycle
                    .saturating_add(cycles.max(1))
                    .min(self.clock.last_cycle());
                self.state = CoreState::Busy { until_cycle };
                let resume = self.clock.tick_of_cycle(until_cycle);
                self.sleep_until(ctx, now, resume);
            }
            CoreOp::Load(address) => self.issue_load(ctx, address)?,
            CoreOp::Store(address) => self.issue_store(ctx, address)?,
            CoreOp::Offload(op) => {
                let Some(coproc) = ctx.coproc.as_deref_mut() else {
                    self.raise(
                        ctx,
                        CoreFault::NoCoprocessor {
                            core: self.id,
                            inst_id: op.inst_id,
                        },
                    );
                    return Ok(());
                };
                match coproc.submit_offload(&op, &mut ctx.sched) {
                    Ok(handle) => {
                        self.outstanding.push_back(handle);
                        self.counters.offloads_submitted += 1;
                        self.counters.instructions_retired += 1;
                    }
                    Err(err) => {
                        self.counters.backpressure_stalls += 1;
                        if self.verbose > 0 {
                            debug!(core = %self.name, now, inst_id = op.inst_id, %err, "offload stalled");
                        }
                        self.pending_op = Some(CoreOp::Offload(op));
                    }
                }
                self.request_next_edge(&mut ctx.sched, now);
            }
            CoreOp::Wait => {
                self.counters.instructions_retired += 1;
                if !self.outstanding.is_empty() {
                    self.state = CoreState::WaitOffloads { then_halt: false };
                }
                self.request_next_edge(&mut ctx.sched, now);
            }
            CoreOp::Halt => {
                self.counters.instructions_retired += 1;
                self.drain_then_halt(ctx, now);
            }
        }
        Ok(())
    }

    /// Polls every outstanding offload and records the ones that completed.
    fn poll_offloads(&mut self, ctx: &mut CoreContext<'_>, now: Tick) {
        let Some(coproc) = ctx.coproc.as_deref_mut() else {
            return;
        };
        let mut index = 0;
        while let Some(&handle) = self.outstanding.get(index) {
            let Some(result) = coproc.poll_completion(handle, now) else {
                index += 1;
                continue;
            };
            let _ = self.outstanding.remove(index);
            self.counters.offloads_completed += 1;
            ctx.stats.emit(
                &self.name,
                "offload_latency",
                now - result.submitted_at,
                "ticks",
                STAT_LEVEL_SAMPLES,
            );
            if self.traces_ops() {
                trace!(
                    core = %self.name,
                    now,
                    handle = %result.handle,
                    inst_id = result.inst_id,
                    completed_at = result.completed_at,
                    "offload observed"
                );
            }
            self.completions.push(result);
        }
    }

    /// Requests the next edge while offloads remain to be polled.
    fn keep_polling(&mut self, ctx: &mut CoreContext<'_>, now: Tick) {
        if !self.outstanding.is_empty() {
            self.request_next_edge(&mut ctx.sched, now);
        }
    }

    /// Requests the edge at `resume`, or every edge before it while offloads are
    /// outstanding. `resume` is never past the last representable edge.
    fn sleep_until(&mut self, ctx: &mut CoreContext<'_>, now: Tick, resume: Tick) {
        let next = match self.clock.edge_after(now) {
            Some(edge) if !self.outstanding.is_empty() => edge.min(resume),
            _ => resume,
        };
        self.request_tick(&mut ctx.sched, next);
    }

    /// Halts now, or after every outstanding offload has been observed.
    fn drain_then_halt(&mut self, ctx: &mut CoreContext<'_>, now: Tick) {
        if self.outstanding.is_empty() {
            self.halt(now);
        } else {
            self.state = CoreState::WaitOffloads { then_halt: true };
            self.request_next_edge(&mut ctx.sched, now);
        }
    }

    /// Posts a fault event for this core at the current tick.
    pub(crate) fn raise(&mut self, ctx: &mut CoreContext<'_>, fault: CoreFault) {
        self.state = CoreState::WaitFault;
        ctx.sched.schedule_in(0, Event::Fault {
            core: self.id,
            fault,
        });
    }
}
