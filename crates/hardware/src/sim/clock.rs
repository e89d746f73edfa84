//! Clock domains.
//!
//! Every clocked component owns a [`ClockDomain`] giving its period in timebase
//! ticks. Crossing between domains is always an explicit tick translation: a
//! time in one domain is mapped to the nearest edge at or after it in the other.

use crate::common::Tick;

/// A clock with a fixed period expressed in timebase ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockDomain {
    period: Tick,
}

impl ClockDomain {
    /// Creates a clock domain. A zero period is raised to one tick.
    pub const fn new(period: Tick) -> Self {
        Self {
            period: if period == 0 { 1 } else { period },
        }
    }

    /// Returns the period in timebase ticks.
    #[inline(always)]
    pub const fn period(&self) -> Tick {
        self.period
    }

    /// Returns the first cycle whose edge is at or after `tick`.
    #[inline]
    pub const fn cycle_at_or_after(&self, tick: Tick) -> u64 {
        tick.div_ceil(self.period)
    }

    /// Returns the cycle in progress at `tick` (the last edge at or before it).
    #[inline]
    pub const fn cycle_at(&self, tick: Tick) -> u64 {
        tick / self.period
    }

    /// Returns the tick of the edge that starts `cycle`, saturating at the horizon.
    #[inline]
    pub const fn tick_of_cycle(&self, cycle: u64) -> Tick {
        cycle.saturating_mul(self.period)
    }

    /// Returns the tick of the edge that starts `cycle`, or `None` past the horizon.
    #[inline]
    pub const fn checked_tick_of_cycle(&self, cycle: u64) -> Option<Tick> {
        cycle.checked_mul(self.period)
    }

    /// Returns the last cycle whose edge is representable as a [`Tick`].
    #[inline]
    pub const fn last_cycle(&self) -> u64 {
        Tick::MAX / self.period
    }

    /// Returns the first edge at or after `tick`, or `None` past the horizon.
    #[inline]
    pub const fn edge_at_or_after(&self, tick: Tick) -> Option<Tick> {
        self.checked_tick_of_cycle(self.cycle_at_or_after(tick))
    }

    /// Returns the first edge strictly after `tick`, or `None` past the horizon.
    #[inline]
    pub fn edge_after(&self, tick: Tick) -> Option<Tick> {
        self.cycle_at(tick)
            .checked_add(1)
            .and_then(|cycle| self.checked_tick_of_cycle(cycle))
    }

    /// Returns the tick `cycles` cycles after `tick`.
    #[inline]
    pub const fn ticks_after(&self, tick: Tick, cycles: u64) -> Tick {
        tick.saturating_add(cycles.saturating_mul(self.period))
    }
}
