//! Cache store trait definition
//!
//! This module defines the `CacheStore` trait: a key-value store of
//! request/response pairs partitioned into named generations. The agent only
//! ever talks to this trait, so the in-memory and disk stores are
//! interchangeable.

use async_trait::async_trait;

use super::error::StoreError;
use super::stats::GenerationStats;
use crate::request::{RequestKey, Response};

/// Generation-partitioned request/response store
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Open a generation, creating it if absent
    async fn open(&self, name: &str) -> Result<(), StoreError>;

    /// Whether a generation with this name exists
    async fn has(&self, name: &str) -> Result<bool, StoreError>;

    /// Names of all existing generations
    async fn keys(&self) -> Result<Vec<String>, StoreError>;

    /// Delete a generation and all its entries
    /// Returns true if the generation existed
    async fn delete(&self, name: &str) -> Result<bool, StoreError>;

    /// Look up an entry by exact request identity.
    /// A missing generation is a miss, not an error.
    async fn match_request(
        &self,
        name: &str,
        key: &RequestKey,
    ) -> Result<Option<Response>, StoreError>;

    /// Store a single entry, overwriting any entry with the same key.
    /// Creates the generation if absent.
    async fn put(&self, name: &str, key: RequestKey, response: Response)
        -> Result<(), StoreError>;

    /// Store a batch of entries. Either every entry becomes visible or the
    /// call fails and none of the batch does.
    async fn put_all(
        &self,
        name: &str,
        entries: Vec<(RequestKey, Response)>,
    ) -> Result<(), StoreError>;

    /// Entry count and stored body size of one generation
    async fn stats(&self, name: &str) -> Result<GenerationStats, StoreError>;
}
