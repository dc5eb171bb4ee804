// Offline cache agent library
//
// Cache-first request interception with version-based cache eviction,
// over an injected cache store, network and host.

pub mod agent;
pub mod cache;
pub mod config;
pub mod constants;
pub mod error;
pub mod host;
pub mod logging;
pub mod network;
pub mod request;

pub use agent::{ActivationReport, FetchOutcome, InstallReport, LifecycleHandler, OfflineCacheAgent};
pub use config::AgentConfig;
pub use error::AgentError;
