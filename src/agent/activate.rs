//! Activate: remove every generation but the current one

use futures::future::join_all;

use super::{ActivationReport, OfflineCacheAgent};
use crate::error::AgentError;

impl OfflineCacheAgent {
    pub(crate) async fn activate(&self) -> Result<ActivationReport, AgentError> {
        self.host.claim_clients().await;

        let current = self.cache_name();
        let names = self.store.keys().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to list cache generations");
            AgentError::from(e)
        })?;

        let stale: Vec<String> = names.into_iter().filter(|name| name != current).collect();

        // Deletions are independent; each is attempted regardless of the others
        let results = join_all(stale.iter().map(|name| async move {
            (name.clone(), self.store.delete(name).await)
        }))
        .await;

        let mut report = ActivationReport {
            generation: current.to_string(),
            ..Default::default()
        };

        for (name, result) in results {
            match result {
                Ok(_) => {
                    tracing::info!(generation = %name, "Deleted stale cache generation");
                    report.deleted.push(name);
                }
                Err(e) => {
                    tracing::warn!(generation = %name, error = %e, "Failed to delete stale cache generation");
                    report.failed.push((name, e.to_string()));
                }
            }
        }

        tracing::info!(
            generation = %current,
            deleted = report.deleted.len(),
            failed = report.failed.len(),
            "Activation complete"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use crate::cache::{CacheStore, MemoryCacheStore};
    use crate::host::{MockHostSignals, RecordingHost};
    use crate::network::MockNetwork;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_activate_keeps_only_current_generation() {
        let store = MemoryCacheStore::new();
        store.open("franchiseku-cache-v1").await.unwrap();
        store.open("franchiseku-cache-v2").await.unwrap();
        let agent = agent(
            config(&[]),
            &store,
            &MockNetwork::new(),
            Arc::new(RecordingHost::new()),
        );

        let report = agent.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["franchiseku-cache-v1".to_string()]);
        assert!(report.is_clean());
        assert_eq!(
            store.keys().await.unwrap(),
            vec!["franchiseku-cache-v2".to_string()]
        );
    }

    #[tokio::test]
    async fn test_activate_deletes_many_generations() {
        let store = MemoryCacheStore::new();
        for name in ["old-a", "old-b", "old-c", "franchiseku-cache-v2"] {
            store.open(name).await.unwrap();
        }
        let agent = agent(
            config(&[]),
            &store,
            &MockNetwork::new(),
            Arc::new(RecordingHost::new()),
        );

        let mut report = agent.activate().await.unwrap();
        report.deleted.sort();

        assert_eq!(report.deleted, vec!["old-a", "old-b", "old-c"]);
        assert_eq!(store.keys().await.unwrap(), vec!["franchiseku-cache-v2"]);
    }

    #[tokio::test]
    async fn test_one_failed_deletion_does_not_block_others() {
        let store = MemoryCacheStore::new();
        for name in ["old-a", "old-b", "franchiseku-cache-v2"] {
            store.open(name).await.unwrap();
        }
        store.fail_delete_of("old-a");
        let agent = agent(
            config(&[]),
            &store,
            &MockNetwork::new(),
            Arc::new(RecordingHost::new()),
        );

        let report = agent.activate().await.unwrap();

        assert_eq!(report.deleted, vec!["old-b"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].0, "old-a");
        assert!(!report.is_clean());
        assert_eq!(
            store.keys().await.unwrap(),
            vec!["franchiseku-cache-v2", "old-a"]
        );
    }

    #[tokio::test]
    async fn test_activate_without_current_generation() {
        let store = MemoryCacheStore::new();
        store.open("franchiseku-cache-v1").await.unwrap();
        let agent = agent(
            config(&[]),
            &store,
            &MockNetwork::new(),
            Arc::new(RecordingHost::new()),
        );

        agent.activate().await.unwrap();

        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_activate_claims_clients() {
        let mut host = MockHostSignals::new();
        host.expect_claim_clients().times(1).return_const(());
        host.expect_skip_waiting().never();
        let agent = agent(
            config(&[]),
            &MemoryCacheStore::new(),
            &MockNetwork::new(),
            Arc::new(host),
        );

        let report = agent.activate().await.unwrap();

        assert!(report.deleted.is_empty());
    }

    #[tokio::test]
    async fn test_activate_makes_no_network_calls() {
        let store = MemoryCacheStore::new();
        store.open("franchiseku-cache-v1").await.unwrap();
        let network = MockNetwork::new();
        let agent = agent(config(&[]), &store, &network, Arc::new(RecordingHost::new()));

        agent.activate().await.unwrap();

        assert_eq!(network.call_count(), 0);
    }
}
