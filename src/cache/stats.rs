//! Cache statistics types
//!
//! - `GenerationStats`: size of one stored generation
//! - `AgentStats`: hit/miss counters of the fetch path

use serde::Serialize;

/// Size of a single cache generation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationStats {
    /// Number of stored entries
    pub entry_count: u64,
    /// Sum of stored body sizes in bytes
    pub size_bytes: u64,
}

/// Snapshot of fetch path counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AgentStats {
    /// GET requests answered from the cache
    pub hits: u64,
    /// GET requests that went to the network
    pub misses: u64,
    /// Responses stored at fetch time
    pub runtime_stores: u64,
    /// Runtime stores that failed
    pub store_failures: u64,
    /// Network fetches that failed
    pub network_failures: u64,
    /// Non-GET requests left to the host
    pub pass_throughs: u64,
}

impl AgentStats {
    /// Calculate hit rate (hits / GET requests)
    /// Returns 0.0 if there are no GET requests
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
