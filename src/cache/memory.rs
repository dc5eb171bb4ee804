//! Memory cache store implementation
//!
//! `MemoryCacheStore` keeps every generation in a process-local map. It is
//! the store used in tests, so it also counts operations and can be told to
//! fail writes or deletions.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::error::StoreError;
use super::stats::GenerationStats;
use super::traits::CacheStore;
use crate::request::{RequestKey, Response};

type Generation = HashMap<RequestKey, Response>;

/// In-memory generation-partitioned store
#[derive(Clone, Default)]
pub struct MemoryCacheStore {
    generations: Arc<RwLock<HashMap<String, Generation>>>,
    reads: Arc<AtomicU64>,
    writes: Arc<AtomicU64>,
    /// Simulate write failures if true
    fail_writes: Arc<RwLock<bool>>,
    /// Generations whose deletion fails
    fail_deletes: Arc<RwLock<HashSet<String>>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `put`/`put_all` fail
    pub fn set_fail_writes(&self, enabled: bool) {
        *self.fail_writes.write() = enabled;
    }

    /// Make deleting the named generation fail
    pub fn fail_delete_of(&self, name: &str) {
        self.fail_deletes.write().insert(name.to_string());
    }

    /// Number of entry lookups performed
    pub fn read_count(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Number of entry writes attempted
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Number of entries in a generation (0 if absent)
    pub fn entry_count(&self, name: &str) -> usize {
        self.generations
            .read()
            .get(name)
            .map(|g| g.len())
            .unwrap_or(0)
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if *self.fail_writes.read() {
            return Err(StoreError::Unavailable(
                "simulated write failure".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn open(&self, name: &str) -> Result<(), StoreError> {
        self.generations
            .write()
            .entry(name.to_string())
            .or_default();
        Ok(())
    }

    async fn has(&self, name: &str) -> Result<bool, StoreError> {
        Ok(self.generations.read().contains_key(name))
    }

    async fn keys(&self) -> Result<Vec<String>, StoreError> {
        let mut names: Vec<String> = self.generations.read().keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn delete(&self, name: &str) -> Result<bool, StoreError> {
        if self.fail_deletes.read().contains(name) {
            return Err(StoreError::Unavailable(format!(
                "simulated delete failure for {}",
                name
            )));
        }
        Ok(self.generations.write().remove(name).is_some())
    }

    async fn match_request(
        &self,
        name: &str,
        key: &RequestKey,
    ) -> Result<Option<Response>, StoreError> {
        self.reads.fetch_add(1, Ordering::Relaxed);
        Ok(self
            .generations
            .read()
            .get(name)
            .and_then(|g| g.get(key))
            .cloned())
    }

    async fn put(
        &self,
        name: &str,
        key: RequestKey,
        response: Response,
    ) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.check_writable()?;
        self.generations
            .write()
            .entry(name.to_string())
            .or_default()
            .insert(key, response);
        Ok(())
    }

    async fn put_all(
        &self,
        name: &str,
        entries: Vec<(RequestKey, Response)>,
    ) -> Result<(), StoreError> {
        self.writes.fetch_add(entries.len() as u64, Ordering::Relaxed);
        self.check_writable()?;
        // Single lock acquisition makes the batch visible at once
        let mut generations = self.generations.write();
        let generation = generations.entry(name.to_string()).or_default();
        generation.extend(entries);
        Ok(())
    }

    async fn stats(&self, name: &str) -> Result<GenerationStats, StoreError> {
        let generations = self.generations.read();
        let stats = match generations.get(name) {
            Some(generation) => GenerationStats {
                entry_count: generation.len() as u64,
                size_bytes: generation
                    .values()
                    .map(|r| r.content_length() as u64)
                    .sum(),
            },
            None => GenerationStats::default(),
        };
        Ok(stats)
    }
}
