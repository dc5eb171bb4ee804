//! Network fetch abstraction
//!
//! The agent falls back to a `Network` on every cache miss. Two
//! implementations are provided:
//! - `HttpNetwork`: real transport over reqwest
//! - `MockNetwork`: scripted replies with a call log, for tests

use async_trait::async_trait;
use thiserror::Error;

use crate::request::{Request, Response};

pub mod http_network;
pub mod mock;

pub use http_network::HttpNetwork;
pub use mock::MockNetwork;

/// Failure to obtain any response at all.
/// A 404 or 500 is a response, not a `NetworkError`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetworkError {
    /// Connection refused, DNS failure, TLS failure, reset, ...
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    /// Response started but the body could not be read
    #[error("Reading body of {url} failed: {message}")]
    Body { url: String, message: String },

    /// Client could not be built or the request could not be sent as given
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Network fetch primitive
#[async_trait]
pub trait Network: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError>;
}
