// Cache module
//
// Generation-partitioned request/response stores behind the `CacheStore`
// trait. The agent never holds a concrete store type.

pub mod disk;
pub mod error;
pub mod memory;
pub mod stats;
pub mod traits;

pub use disk::DiskCacheStore;
pub use error::StoreError;
pub use memory::MemoryCacheStore;
pub use stats::{AgentStats, GenerationStats};
pub use traits::CacheStore;
