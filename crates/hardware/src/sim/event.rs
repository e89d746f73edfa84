//! Discrete-event queue and scheduler handle.
//!
//! This module provides the single logical timeline of the simulator. It provides:
//! 1. **Events:** The typed messages components send to each other through time.
//! 2. **Ordering:** Events are dispatched by `(tick, priority, sequence)`, where the
//!    priority is the registration index of the target component and the sequence is
//!    the insertion order. Same-tick dispatch is therefore fully deterministic.
//! 3. **Scheduler:** A handle that lets a component post future events without
//!    access to dispatch or to any other component.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::common::{AccessKind, CoreFault, CoreId, Tick};

/// Something that happens to a component at a point in simulated time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Clock edge of a core.
    CoreTick(CoreId),
    /// Clock edge of the coprocessor owned by a core.
    CoProcTick(CoreId),
    /// A memory request issued by the core has completed.
    MemResponse {
        /// Issuing core.
        core: CoreId,
        /// Request address.
        address: u64,
        /// Load or store.
        kind: AccessKind,
        /// Tick at which the request was issued.
        issued_at: Tick,
    },
    /// A runtime fault for the core to handle.
    Fault {
        /// Faulting core.
        core: CoreId,
        /// What went wrong.
        fault: CoreFault,
    },
}

impl Event {
    /// Returns the registration priority of the component that receives this event.
    ///
    /// Components are registered in core order, each core followed by its coprocessor.
    pub const fn priority(&self) -> u64 {
        match self {
            Self::CoreTick(core) | Self::MemResponse { core, .. } | Self::Fault { core, .. } => {
                2 * core.0 as u64
            }
            Self::CoProcTick(core) => 2 * core.0 as u64 + 1,
        }
    }
}

/// An event together with its dispatch key.
#[derive(Debug)]
struct Scheduled {
    tick: Tick,
    priority: u64,
    seq: u64,
    event: Event,
}

impl Scheduled {
    const fn key(&self) -> (Tick, u64, u64) {
        (self.tick, self.priority, self.seq)
    }
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap.
        other.key().cmp(&self.key())
    }
}

/// Priority queue of future events plus the current simulated time.
#[derive(Debug, Default)]
pub struct EventQueue {
    heap: BinaryHeap<Scheduled>,
    now: Tick,
    next_seq: u64,
    dispatched: u64,
}

impl EventQueue {
    /// Creates an empty queue at tick 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the tick of the event most recently popped.
    #[inline]
    pub const fn now(&self) -> Tick {
        self.now
    }

    /// Returns the number of events popped so far.
    pub const fn dispatched(&self) -> u64 {
        self.dispatched
    }

    /// Returns the number of pending events.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if no events are pending.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Returns the tick of the next pending event.
    pub fn peek_tick(&self) -> Option<Tick> {
        self.heap.peek().map(|s| s.tick)
    }

    /// Schedules `event` at `tick`. Ticks in the past are clamped to now.
    pub fn schedule(&mut self, tick: Tick, event: Event) {
        debug_assert!(tick >= self.now, "event scheduled in the past");
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Scheduled {
            tick: tick.max(self.now),
            priority: event.priority(),
            seq,
            event,
        });
    }

    /// Removes the next event and advances time to its tick.
    pub fn pop(&mut self) -> Option<(Tick, Event)> {
        let next = self.heap.pop()?;
        self.now = next.tick;
        self.dispatched += 1;
        Some((next.tick, next.event))
    }
}

/// Handle through which a component schedules future events.
///
/// Components never read a shared clock variable; the current tick is obtained
/// from the handle they were given for the current dispatch.
#[derive(Debug)]
pub struct Scheduler<'a> {
    queue: &'a mut EventQueue,
}

impl<'a> Scheduler<'a> {
    /// Wraps the event queue for one dispatch.
    pub const fn new(queue: &'a mut EventQueue) -> Self {
        Self { queue }
    }

    /// Returns the current tick.
    #[inline]
    pub const fn now(&self) -> Tick {
        self.queue.now()
    }

    /// Schedules `event` at absolute `tick`.
    #[inline]
    pub fn schedule_at(&mut self, tick: Tick, event: Event) {
        self.queue.schedule(tick, event);
    }

    /// Schedules `event` `delay` ticks from now.
    #[inline]
    pub fn schedule_in(&mut self, delay: Tick, event: Event) {
        let tick = self.now().saturating_add(delay);
        self.queue.schedule(tick, event);
    }
}
