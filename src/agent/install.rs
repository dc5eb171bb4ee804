//! Install: pre-cache the manifest into the current generation

use futures::future::try_join_all;

use super::{InstallReport, OfflineCacheAgent};
use crate::error::AgentError;
use crate::request::{Request, RequestKey, Response, ResponseType};

impl OfflineCacheAgent {
    pub(crate) async fn install(&self) -> Result<InstallReport, AgentError> {
        // Promotion is requested up front; a failed install still never
        // produces a ready generation
        self.host.skip_waiting().await;

        let generation = self.cache_name();
        self.store.open(generation).await.map_err(|e| {
            tracing::error!(generation = %generation, error = %e, "Failed to open cache generation");
            AgentError::from(e)
        })?;

        tracing::info!(
            generation = %generation,
            entries = self.config.manifest.len(),
            "Cache opened, pre-caching manifest"
        );

        let result = self.precache().await;
        match &result {
            Ok(report) => tracing::info!(
                generation = %report.generation,
                entries = report.entries,
                total_bytes = report.total_bytes,
                "Manifest pre-cached"
            ),
            Err(e) => tracing::error!(
                generation = %generation,
                error = %e,
                "Failed to pre-cache manifest, install aborted"
            ),
        }
        result
    }

    async fn precache(&self) -> Result<InstallReport, AgentError> {
        let requests = self.manifest_requests()?;

        // All or nothing: the first failure aborts the batch before any write
        let entries = try_join_all(requests.iter().map(|r| self.fetch_for_precache(r))).await?;

        let total_bytes = entries
            .iter()
            .map(|(_, response)| response.content_length() as u64)
            .sum();
        let count = entries.len();

        self.store.put_all(self.cache_name(), entries).await?;

        Ok(InstallReport {
            generation: self.cache_name().to_string(),
            entries: count,
            total_bytes,
        })
    }

    fn manifest_requests(&self) -> Result<Vec<Request>, AgentError> {
        self.config
            .manifest
            .iter()
            .map(|entry| {
                self.config
                    .resolve(entry)
                    .map(Request::get)
                    .map_err(|e| AgentError::Precache {
                        url: entry.clone(),
                        reason: e.to_string(),
                    })
            })
            .collect()
    }

    async fn fetch_for_precache(
        &self,
        request: &Request,
    ) -> Result<(RequestKey, Response), AgentError> {
        let response = self
            .network
            .fetch(request)
            .await
            .map_err(|e| AgentError::Precache {
                url: request.url.to_string(),
                reason: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(AgentError::Precache {
                url: request.url.to_string(),
                reason: format!("status {}", response.status),
            });
        }

        if matches!(
            response.response_type,
            ResponseType::Opaque | ResponseType::OpaqueRedirect | ResponseType::Error
        ) {
            return Err(AgentError::Precache {
                url: request.url.to_string(),
                reason: format!("{} response", response.response_type),
            });
        }

        Ok((request.key(), response))
    }
}
