//! Simulation kernel.
//!
//! This module provides the timeline and the top-level driver. It includes:
//! 1. **Clock:** Clock domains and tick/cycle conversion.
//! 2. **Event:** The event queue and the scheduler handle given to components.
//! 3. **Loader:** Program loading and per-core workload setup.
//! 4. **Simulator:** Component registration, dispatch, and the run loop.

/// Clock domains.
pub mod clock;

/// Event queue and scheduler.
pub mod event;

/// Program loading.
pub mod loader;

/// Component registration and the event loop.
pub mod simulator;

pub use simulator::{RunSummary, Simulator, StopReason};
