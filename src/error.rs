// Error types module

use thiserror::Error;

use crate::cache::StoreError;
use crate::config::ConfigError;

/// Errors surfaced by the agent's lifecycle operations.
///
/// Fetch-time failures are not errors of the agent: they are reported as
/// [`crate::agent::FetchOutcome::NetworkFailed`] to the caller.
#[derive(Error, Debug)]
pub enum AgentError {
    /// A manifest entry could not be fetched or was unusable; nothing was stored
    #[error("Pre-caching {url} failed: {reason}")]
    Precache { url: String, reason: String },

    #[error("Cache store error: {0}")]
    Store(#[from] StoreError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}
