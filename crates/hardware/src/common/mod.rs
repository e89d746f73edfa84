//! Common utilities and types used throughout the simulator.
//!
//! This module provides the building blocks shared by every component. It includes:
//! 1. **Identifiers:** Strong types for core indices and simulated time.
//! 2. **Constants:** Defaults shared between configuration and components.
//! 3. **Memory Access:** Classification of memory operations (Load/Store).
//! 4. **Error Handling:** Configuration errors, address faults, and backpressure.

/// Common constants used throughout the simulator.
pub mod constants;

/// Memory access type definitions.
pub mod data;

/// Error types for setup and runtime faults.
pub mod error;

/// Core identifiers and simulated time.
pub mod ids;

pub use data::AccessKind;
pub use error::{AddressFault, BackpressureError, ConfigError, CoreFault, SimError, TraceError};
pub use ids::{CoreId, Tick};
