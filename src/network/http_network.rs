//! reqwest-backed network

use async_trait::async_trait;

use super::{Network, NetworkError};
use crate::request::{Request, Response, ResponseType};

/// Network backed by a shared reqwest client.
///
/// No request timeout is configured: a stalled fetch lasts as long as the
/// transport lets it.
#[derive(Clone)]
pub struct HttpNetwork {
    client: reqwest::Client,
}

impl HttpNetwork {
    pub fn new() -> Result<Self, NetworkError> {
        let client = reqwest::Client::builder().build().map_err(|e| {
            NetworkError::InvalidRequest(format!("Failed to create HTTP client: {}", e))
        })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        tracing::debug!(method = %request.method, url = %request.url, "Fetching from network");

        let response = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone())
            .send()
            .await
            .map_err(|e| NetworkError::Transport {
                url: request.url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await.map_err(|e| NetworkError::Body {
            url: request.url.to_string(),
            message: e.to_string(),
        })?;

        // A native client sees every response in full, so nothing is opaque
        Ok(Response {
            status,
            response_type: ResponseType::Basic,
            headers,
            body,
        })
    }
}
