//! Shared-system construction and the top-level `System` type.
//!
//! This module builds the parts of the platform shared by all cores. It performs:
//! 1. **Memory map:** Fixes the addressable range at `memSize`; it is never resized.
//! 2. **Latency model:** Creates one seeded or table-driven cost model per core.

use crate::config::Platform;
use crate::soc::memory::MemoryMap;
use crate::soc::memory::controller::MemoryLatencyModel;

/// Shared memory system: bounds and per-core latency.
#[derive(Debug)]
pub struct System {
    /// Address space shared by all cores.
    pub memory: MemoryMap,
    /// Latency model consulted for every in-range request.
    pub latency: MemoryLatencyModel,
}

impl System {
    /// Builds the shared system for a validated platform.
    pub fn new(platform: &Platform) -> Self {
        Self {
            memory: MemoryMap::new(platform.mem_size),
            latency: MemoryLatencyModel::from_specs(&platform.cores, platform.seed),
        }
    }
}
