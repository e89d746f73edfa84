//! Fault Handling Logic.
//!
//! Runtime faults never abort the run. A fault arrives at its core as an event and the
//! core applies its [`FaultPolicy`]: `halt` stops this core only, `continue` drops the
//! faulting operation and resumes on the next edge.

use tracing::{info, warn};

use super::{Core, CoreContext, CoreState};
use crate::common::{CoreFault, Tick};
use crate::config::FaultPolicy;

impl Core {
    /// Applies the fault policy to a delivered fault.
    pub fn on_fault(&mut self, ctx: &mut CoreContext<'_>, fault: &CoreFault) {
        let now = ctx.sched.now();
        self.counters.faults += 1;
        warn!(core = %self.name, now, pc = self.pc, policy = ?self.fault_policy, "{fault}");

        match self.fault_policy {
            FaultPolicy::Halt => self.halt(now),
            FaultPolicy::Continue => {
                self.state = CoreState::Running;
                self.request_next_edge(&mut ctx.sched, now);
            }
        }
    }

    /// Halts a core whose next edge would lie past the last representable tick.
    pub(crate) fn out_of_time(&mut self, now: Tick) {
        warn!(core = %self.name, now, pc = self.pc, "no clock edge left before the tick horizon");
        self.halt(now);
    }

    /// Stops the core. Outstanding offloads and in-flight stores are abandoned.
    pub(crate) fn halt(&mut self, now: Tick) {
        if self.is_halted() {
            return;
        }
        self.state = CoreState::Halted;
        self.halted_at = Some(now);
        self.pending_op = None;
        if self.verbose > 0 {
            info!(
                core = %self.name,
                now,
                retired = self.counters.instructions_retired,
                abandoned_offloads = self.outstanding.len(),
                "core halted"
            );
        }
    }
}
