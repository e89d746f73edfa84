//! Simulated Memory.
//!
//! This module models the shared memory seen by every core. It provides:
//! 1. **Requests:** The ephemeral [`MemoryRequest`] a core issues for each load or store.
//! 2. **Memory Map:** Bounds checking against the fixed memory size; out-of-range
//!    requests become [`AddressFault`]s instead of being clamped.
//! 3. **Controller:** Latency modelling (seeded uniform or table-driven) per core.
//!
//! Contents are not stored: the model is concerned with timing and faults only.
//! Access is serialized by the event loop, so no locking is required.

/// Memory latency model (`memCost`).
pub mod controller;

use crate::common::{AccessKind, AddressFault, CoreId, Tick};

/// A load or store in flight from a core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRequest {
    /// Issuing core.
    pub core: CoreId,
    /// Byte address.
    pub address: u64,
    /// Load or store.
    pub kind: AccessKind,
    /// Tick at which the core issued the request.
    pub issue_tick: Tick,
}

impl MemoryRequest {
    /// Creates a request.
    pub const fn new(core: CoreId, address: u64, kind: AccessKind, issue_tick: Tick) -> Self {
        Self {
            core,
            address,
            kind,
            issue_tick,
        }
    }

    /// Creates a load request.
    pub const fn load(core: CoreId, address: u64, issue_tick: Tick) -> Self {
        Self::new(core, address, AccessKind::Load, issue_tick)
    }

    /// Creates a store request.
    pub const fn store(core: CoreId, address: u64, issue_tick: Tick) -> Self {
        Self::new(core, address, AccessKind::Store, issue_tick)
    }
}

/// Fixed-size address space `[0, size)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryMap {
    size: u64,
}

impl MemoryMap {
    /// Creates a memory map of `size` bytes.
    pub const fn new(size: u64) -> Self {
        Self { size }
    }

    /// Returns the memory size in bytes.
    #[inline(always)]
    pub const fn size(&self) -> u64 {
        self.size
    }

    /// Returns `true` if `address` lies in `[0, size)`.
    #[inline(always)]
    pub const fn contains(&self, address: u64) -> bool {
        address < self.size
    }

    /// Validates a request against the memory bounds.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressFault`] when the address is `size` or beyond.
    pub const fn check(&self, req: &MemoryRequest) -> Result<(), AddressFault> {
        if self.contains(req.address) {
            Ok(())
        } else {
            Err(AddressFault {
                core: req.core,
                address: req.address,
                kind: req.kind,
                mem_size: self.size,
            })
        }
    }
}
