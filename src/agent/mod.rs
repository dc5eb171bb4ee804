//! Offline cache agent
//!
//! `OfflineCacheAgent` implements the three lifecycle operations against an
//! injected store, network and host:
//! - install: pre-cache the manifest into the current generation
//! - activate: delete every other generation
//! - fetch: cache-first, network-fallback, with runtime caching of
//!   responses from the configured hosts

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::cache::{AgentStats, CacheStore, GenerationStats};
use crate::config::AgentConfig;
use crate::error::AgentError;
use crate::host::HostSignals;
use crate::network::{Network, NetworkError};
use crate::request::{Request, Response};

mod activate;
mod fetch;
mod install;

/// Lifecycle events delivered by the host
#[async_trait]
pub trait LifecycleHandler: Send + Sync {
    /// A new version was registered
    async fn on_install(&self) -> Result<InstallReport, AgentError>;

    /// This version took over
    async fn on_activate(&self) -> Result<ActivationReport, AgentError>;

    /// The application made a request while this version is active
    async fn on_fetch(&self, request: &Request) -> FetchOutcome;
}

/// Result of a successful install
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub generation: String,
    pub entries: usize,
    pub total_bytes: u64,
}

/// Result of an activation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActivationReport {
    pub generation: String,
    /// Stale generations removed
    pub deleted: Vec<String>,
    /// Stale generations whose deletion failed, with the error message
    pub failed: Vec<(String, String)>,
}

impl ActivationReport {
    /// Every stale generation was removed
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What the host should do with an intercepted request
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Not a GET: the agent stays out of the way and the host sends the
    /// request itself
    PassThrough,
    /// Served from the current generation without touching the network
    FromCache(Response),
    /// Served from the network; `stored` tells whether a copy was cached
    FromNetwork { response: Response, stored: bool },
    /// Cache miss and the network produced no response
    NetworkFailed(NetworkError),
}

impl FetchOutcome {
    /// Response to hand to the application, if the agent produced one
    pub fn response(&self) -> Option<&Response> {
        match self {
            FetchOutcome::FromCache(response) => Some(response),
            FetchOutcome::FromNetwork { response, .. } => Some(response),
            FetchOutcome::PassThrough | FetchOutcome::NetworkFailed(_) => None,
        }
    }

    pub fn into_response(self) -> Option<Response> {
        match self {
            FetchOutcome::FromCache(response) => Some(response),
            FetchOutcome::FromNetwork { response, .. } => Some(response),
            FetchOutcome::PassThrough | FetchOutcome::NetworkFailed(_) => None,
        }
    }

    pub fn is_from_cache(&self) -> bool {
        matches!(self, FetchOutcome::FromCache(_))
    }
}

/// Fetch path counters, updated with relaxed atomics
#[derive(Default)]
pub(crate) struct StatsTracker {
    hits: AtomicU64,
    misses: AtomicU64,
    runtime_stores: AtomicU64,
    store_failures: AtomicU64,
    network_failures: AtomicU64,
    pass_throughs: AtomicU64,
}

impl StatsTracker {
    pub fn increment_hits(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_misses(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_runtime_stores(&self) {
        self.runtime_stores.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_store_failures(&self) {
        self.store_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_network_failures(&self) {
        self.network_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_pass_throughs(&self) {
        self.pass_throughs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> AgentStats {
        AgentStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            runtime_stores: self.runtime_stores.load(Ordering::Relaxed),
            store_failures: self.store_failures.load(Ordering::Relaxed),
            network_failures: self.network_failures.load(Ordering::Relaxed),
            pass_throughs: self.pass_throughs.load(Ordering::Relaxed),
        }
    }
}

/// Cache-first offline agent for one generation
pub struct OfflineCacheAgent {
    config: AgentConfig,
    store: Arc<dyn CacheStore>,
    network: Arc<dyn Network>,
    host: Arc<dyn HostSignals>,
    stats: StatsTracker,
}

impl OfflineCacheAgent {
    /// Create an agent; the configuration is validated first
    pub fn new(
        config: AgentConfig,
        store: Arc<dyn CacheStore>,
        network: Arc<dyn Network>,
        host: Arc<dyn HostSignals>,
    ) -> Result<Self, AgentError> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            network,
            host,
            stats: StatsTracker::default(),
        })
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Name of the current generation
    pub fn cache_name(&self) -> &str {
        &self.config.cache_name
    }

    /// Snapshot of fetch path counters
    pub fn stats(&self) -> AgentStats {
        self.stats.snapshot()
    }

    /// Size of the current generation
    pub async fn generation_stats(&self) -> Result<GenerationStats, AgentError> {
        Ok(self.store.stats(self.cache_name()).await?)
    }
}

#[async_trait]
impl LifecycleHandler for OfflineCacheAgent {
    async fn on_install(&self) -> Result<InstallReport, AgentError> {
        self.install().await
    }

    async fn on_activate(&self) -> Result<ActivationReport, AgentError> {
        self.activate().await
    }

    async fn on_fetch(&self, request: &Request) -> FetchOutcome {
        self.intercept(request).await
    }
}
