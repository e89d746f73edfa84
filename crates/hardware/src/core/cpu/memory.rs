//! Memory Access Helpers.
//!
//! This module provides the interface between a core and the shared memory system.
//! It performs the following:
//! 1. **Bounds Check:** Requests outside `[0, memSize)` become fault events.
//! 2. **Latency Draw:** In-range requests draw a delay from the core's cost model.
//! 3. **Response Scheduling:** The response is posted `delay` core cycles after issue.
//!    Loads block the core until it arrives; stores are posted and only tracked.

use tracing::trace;

use super::{Core, CoreContext, CoreState};
use crate::common::constants::STAT_LEVEL_SAMPLES;
use crate::common::{AccessKind, SimError, Tick};
use crate::sim::event::Event;
use crate::soc::memory::MemoryRequest;

impl Core {
    /// Issues a blocking load.
    pub(crate) fn issue_load(
        &mut self,
        ctx: &mut CoreContext<'_>,
        address: u64,
    ) -> Result<(), SimError> {
        let now = ctx.sched.now();
        if self.send_request(ctx, MemoryRequest::load(self.id, address, now))? {
            self.state = CoreState::WaitMemory;
            if !self.outstanding.is_empty() {
                self.request_next_edge(&mut ctx.sched, now);
            }
        }
        Ok(())
    }

    /// Issues a posted store; the core continues on its next edge.
    pub(crate) fn issue_store(
        &mut self,
        ctx: &mut CoreContext<'_>,
        address: u64,
    ) -> Result<(), SimError> {
        let now = ctx.sched.now();
        if self.send_request(ctx, MemoryRequest::store(self.id, address, now))? {
            self.counters.instructions_retired += 1;
            self.stores_in_flight += 1;
            self.request_next_edge(&mut ctx.sched, now);
        }
        Ok(())
    }

    /// Checks bounds, draws the latency, and schedules the response.
    ///
    /// Returns `false` if the request faulted.
    fn send_request(
        &mut self,
        ctx: &mut CoreContext<'_>,
        req: MemoryRequest,
    ) -> Result<bool, SimError> {
        if let Err(fault) = ctx.memory.check(&req) {
            self.raise(ctx, fault.into());
            return Ok(false);
        }

        let latency = ctx.latency.resolve_latency(&req)?;
        match req.kind {
            AccessKind::Load => self.counters.loads += 1,
            AccessKind::Store => self.counters.stores += 1,
        }
        self.counters.mem_latency_total += latency;
        ctx.stats.emit(&self.name, "mem_latency", latency, "cycles", STAT_LEVEL_SAMPLES);

        let done = self.clock.ticks_after(req.issue_tick, latency);
        ctx.sched.schedule_at(done, Event::MemResponse {
            core: self.id,
            address: req.address,
            kind: req.kind,
            issued_at: req.issue_tick,
        });
        Ok(true)
    }

    /// Handles the completion of a memory request issued by this core.
    pub fn on_mem_response(
        &mut self,
        ctx: &mut CoreContext<'_>,
        address: u64,
        kind: AccessKind,
        issued_at: Tick,
    ) {
        let now = ctx.sched.now();
        if self.traces_ops() {
            trace!(core = %self.name, now, address, %kind, latency_ticks = now - issued_at, "memory response");
        }
        match kind {
            AccessKind::Store => {
                self.stores_in_flight = self.stores_in_flight.saturating_sub(1);
            }
            AccessKind::Load if self.state == CoreState::WaitMemory => {
                self.counters.instructions_retired += 1;
                self.state = CoreState::Running;
                match self.clock.edge_at_or_after(now) {
                    Some(edge) => self.request_tick(&mut ctx.sched, edge),
                    None => self.out_of_time(now),
                }
            }
            AccessKind::Load => {}
        }
    }
}
