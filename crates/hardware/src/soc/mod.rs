//! Shared system components.
//!
//! This module organizes the components shared by every core: the memory map,
//! the memory latency model, and the builder that assembles them.

/// System builder for the shared memory components.
pub mod builder;

/// Memory map and latency model.
pub mod memory;

pub use builder::System;
