//! Discrete-event core/coprocessor simulator library.
//!
//! This crate composes clocked core models, their attached coprocessors, and a shared
//! memory latency model on a single simulated timeline:
//! 1. **Config:** SST-style parameters (`numCores`, `memCost`, `machine`, ...) validated
//!    into a typed platform before simulated time advances.
//! 2. **Core:** Consumes an operation stream, issues memory requests, and offloads work
//!    to its coprocessor.
//! 3. **SoC:** Memory bounds and the per-core seeded latency model.
//! 4. **Simulation:** Event queue, clock domains, program loading, and the run loop.
//! 5. **Statistics:** Level-filtered records flushed once as CSV or JSON.
//!
//! # Examples
//!
//! ```
//! use revsim_core::{Config, Simulator, StatFormat};
//!
//! let mut config = Config::default();
//! config.cpu.mem_cost = Some("[0:1:10]".to_string());
//! config.synthetic.ops = 100;
//!
//! let mut sim = Simulator::new(&config).unwrap();
//! let summary = sim.run().unwrap();
//! assert!(summary.events > 0);
//!
//! let csv = sim.finish(StatFormat::Csv);
//! assert!(csv.starts_with("ComponentName,StatisticName,Unit,Level,Value"));
//! ```

/// Common types and constants (ids, access kinds, errors).
pub mod common;
/// Simulator configuration (defaults, raw parameters, validated platform).
pub mod config;
/// Core model, coprocessors, and operation streams.
pub mod core;
/// ISA strings bound to each core.
pub mod isa;
/// Clock domains, event queue, loader, and simulator.
pub mod sim;
/// Shared memory system (bounds and latency model).
pub mod soc;
/// Statistics sink.
pub mod stats;

/// Root configuration type; use `Config::default()` or deserialize from JSON.
pub use crate::config::Config;
/// Clocked core model.
pub use crate::core::Core;
/// Top-level driver; construct with `Simulator::new`.
pub use crate::sim::{RunSummary, Simulator, StopReason};
/// Shared memory system; construct with `System::new`.
pub use crate::soc::System;
/// Output format of the statistics flush.
pub use crate::stats::StatFormat;
