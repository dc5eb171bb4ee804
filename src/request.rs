//! Request and response descriptors
//!
//! This module defines the values exchanged between the agent, the cache
//! store and the network:
//! - `Request`: method, URL and headers of an outbound request
//! - `RequestKey`: the identity a response is stored under (method + URL)
//! - `Response`: status, type classification, headers and body snapshot

use bytes::Bytes;
use http::{HeaderMap, HeaderValue, Method, StatusCode};
use serde::{Deserialize, Serialize};
use url::Url;

/// Outbound request made by the application
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: Url,
    /// Forwarded to the network, never inspected by the agent
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Create a GET request
    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Add a header, returning the request for chaining
    pub fn with_header(mut self, name: &'static str, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Identity this request is cached under
    pub fn key(&self) -> RequestKey {
        RequestKey::new(self.method.clone(), &self.url)
    }

    pub fn is_get(&self) -> bool {
        self.method == Method::GET
    }
}

/// Cache identity of a request: method and exact URL.
/// Headers take no part in matching.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct RequestKey {
    pub method: Method,
    pub url: String,
}

impl RequestKey {
    pub fn new(method: Method, url: &Url) -> Self {
        Self {
            method,
            url: url.as_str().to_string(),
        }
    }
}

impl std::fmt::Display for RequestKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Classification of a response by how much of it may be inspected.
/// Only `Basic` responses are eligible for runtime caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// Same-origin or otherwise fully inspectable
    #[default]
    Basic,
    /// Cross-origin response exposed through CORS
    Cors,
    /// Network error placeholder
    Error,
    /// Cross-origin response with redacted status and body
    Opaque,
    /// Redirect followed in manual mode
    #[serde(rename = "opaqueredirect")]
    OpaqueRedirect,
}

impl std::fmt::Display for ResponseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ResponseType::Basic => "basic",
            ResponseType::Cors => "cors",
            ResponseType::Error => "error",
            ResponseType::Opaque => "opaque",
            ResponseType::OpaqueRedirect => "opaqueredirect",
        };
        f.write_str(name)
    }
}

/// Response snapshot. Cloning shares the body buffer.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: StatusCode,
    pub response_type: ResponseType,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Response {
    pub fn new(status: StatusCode, response_type: ResponseType, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            response_type,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// 200 OK basic response
    pub fn ok(body: impl Into<Bytes>) -> Self {
        Self::new(StatusCode::OK, ResponseType::Basic, body)
    }

    pub fn with_header(mut self, name: &'static str, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Status in the 2xx range
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Eligible for storage at fetch time: exactly 200 and fully inspectable
    pub fn is_runtime_cacheable(&self) -> bool {
        self.status == StatusCode::OK && self.response_type == ResponseType::Basic
    }

    pub fn content_length(&self) -> usize {
        self.body.len()
    }
}
