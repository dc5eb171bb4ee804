//! Control signals sent back to the host
//!
//! - `skip_waiting`: make this version eligible for activation as soon as
//!   install completes, without waiting for old instances to finish
//! - `claim_clients`: take control of already open application instances

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[cfg(test)]
use mockall::automock;

#[cfg_attr(test, automock)]
#[async_trait]
pub trait HostSignals: Send + Sync {
    async fn skip_waiting(&self);

    async fn claim_clients(&self);
}

/// Host that only counts the signals it receives
#[derive(Clone, Default)]
pub struct RecordingHost {
    skip_waiting: Arc<AtomicU64>,
    claim_clients: Arc<AtomicU64>,
}

impl RecordingHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn skip_waiting_count(&self) -> u64 {
        self.skip_waiting.load(Ordering::Relaxed)
    }

    pub fn claim_clients_count(&self) -> u64 {
        self.claim_clients.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl HostSignals for RecordingHost {
    async fn skip_waiting(&self) {
        self.skip_waiting.fetch_add(1, Ordering::Relaxed);
    }

    async fn claim_clients(&self) {
        self.claim_clients.fetch_add(1, Ordering::Relaxed);
    }
}

/// Host used by the CLI; signals have no effect beyond a log line
#[derive(Clone, Copy, Default)]
pub struct LoggingHost;

#[async_trait]
impl HostSignals for LoggingHost {
    async fn skip_waiting(&self) {
        tracing::info!("Host signal: skip waiting, version eligible for activation");
    }

    async fn claim_clients(&self) {
        tracing::info!("Host signal: claiming open clients");
    }
}
