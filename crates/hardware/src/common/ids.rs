//! Core identifiers and simulated time.
//!
//! Simulated time is measured in timebase ticks (the smallest representable unit,
//! e.g. one picosecond). Every clock domain converts its cycles to and from ticks
//! explicitly; see [`ClockDomain`](crate::sim::clock::ClockDomain).

use std::fmt;

/// Absolute simulated time in timebase ticks.
pub type Tick = u64;

/// Index of a simulated core (`0..numCores`).
///
/// A coprocessor is owned by exactly one core and is addressed by its owner's id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CoreId(pub usize);

impl CoreId {
    /// Returns the raw index of this core.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "core{}", self.0)
    }
}
