//! Global System Constants.
//!
//! This module defines constants shared across the simulator. It includes:
//! 1. **Time Constants:** Femtosecond scale factors used by the unit parser.
//! 2. **Statistic Levels:** The load levels at which each class of statistic is enabled.
//! 3. **Workload Constants:** Alignment used by generated memory streams and the
//!    largest duration a trace may state.

/// Femtoseconds per second.
pub const FS_PER_SECOND: f64 = 1e15;

/// Femtoseconds per millisecond.
pub const FS_PER_MILLISECOND: f64 = 1e12;

/// Femtoseconds per microsecond.
pub const FS_PER_MICROSECOND: f64 = 1e9;

/// Femtoseconds per nanosecond.
pub const FS_PER_NANOSECOND: f64 = 1e6;

/// Femtoseconds per picosecond.
pub const FS_PER_PICOSECOND: f64 = 1e3;

/// Run totals (cycles, retired operations, faults).
pub const STAT_LEVEL_SUMMARY: u8 = 1;

/// Memory operation counts.
pub const STAT_LEVEL_MEMORY: u8 = 2;

/// Latency totals and coprocessor activity.
pub const STAT_LEVEL_DETAIL: u8 = 3;

/// Queue occupancy and activity counters.
pub const STAT_LEVEL_OCCUPANCY: u8 = 4;

/// One record per memory request and per offload completion.
pub const STAT_LEVEL_SAMPLES: u8 = 5;

/// Alignment of addresses produced by the synthetic workload generator.
pub const SYNTHETIC_ACCESS_ALIGN: u64 = 8;

/// Largest `compute` or `offload` duration, in cycles, accepted from a trace file.
pub const MAX_TRACE_CYCLES: u64 = (1 << 32) - 1;
