//! Memory Access Types.
//!
//! This module defines the classification of memory accesses issued by a core.
//! These types are used for the following:
//! 1. **Fault Reporting:** Naming the faulting access in an [`AddressFault`](super::AddressFault).
//! 2. **Blocking Policy:** Loads stall the issuing core until the response; stores are posted.
//! 3. **Statistics Tracking:** Categorizing memory operations for performance analysis.

use std::fmt;

/// Type of memory access operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AccessKind {
    /// Data read access.
    ///
    /// The issuing core waits for the response before executing its next operation.
    Load,

    /// Data write access.
    ///
    /// Posted: the issuing core continues on its next cycle while the write drains.
    Store,
}

impl fmt::Display for AccessKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load => f.write_str("load"),
            Self::Store => f.write_str("store"),
        }
    }
}
