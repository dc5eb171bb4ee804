//! Fetch: cache-first with network fallback

use super::{FetchOutcome, OfflineCacheAgent};
use crate::request::{Request, RequestKey, Response};

impl OfflineCacheAgent {
    pub(crate) async fn intercept(&self, request: &Request) -> FetchOutcome {
        if !request.is_get() {
            self.stats.increment_pass_throughs();
            tracing::trace!(method = %request.method, url = %request.url, "Passing request through");
            return FetchOutcome::PassThrough;
        }

        let key = request.key();
        match self.store.match_request(self.cache_name(), &key).await {
            Ok(Some(response)) => {
                self.stats.increment_hits();
                tracing::debug!(url = %request.url, "Served from cache");
                return FetchOutcome::FromCache(response);
            }
            Ok(None) => {}
            Err(e) => {
                // A broken store must not make reads fail; treat as a miss
                tracing::warn!(url = %request.url, error = %e, "Cache lookup failed, falling back to network");
            }
        }

        self.stats.increment_misses();

        let response = match self.network.fetch(request).await {
            Ok(response) => response,
            Err(e) => {
                self.stats.increment_network_failures();
                tracing::error!(url = %request.url, error = %e, "Failed to fetch resource from network");
                return FetchOutcome::NetworkFailed(e);
            }
        };

        let stored = if self.should_store(request, &response) {
            self.store_runtime(key, response.clone()).await
        } else {
            false
        };

        FetchOutcome::FromNetwork { response, stored }
    }

    fn should_store(&self, request: &Request, response: &Response) -> bool {
        response.is_runtime_cacheable() && self.config.is_runtime_cache_host(&request.url)
    }

    /// Store a network response; failure is logged and reported as `false`
    async fn store_runtime(&self, key: RequestKey, response: Response) -> bool {
        match self.store.put(self.cache_name(), key.clone(), response).await {
            Ok(()) => {
                self.stats.increment_runtime_stores();
                tracing::debug!(key = %key, "Stored network response");
                true
            }
            Err(e) => {
                self.stats.increment_store_failures();
                tracing::warn!(key = %key, error = %e, "Failed to store network response");
                false
            }
        }
    }
}
