//! Core processor implementation.
//!
//! This module contains the clocked core model, the coprocessor attached to it, and
//! the operation streams a core consumes in place of decoded instructions.

/// Coprocessor interface and the queue-based coprocessor.
pub mod coproc;

/// Core state, execution, memory requests, and fault handling.
pub mod cpu;

/// Operation streams (trace programs and synthetic mixes).
pub mod workload;

pub use self::cpu::{Core, CoreContext, CoreState};
