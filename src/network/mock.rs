//! Scripted network for tests

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

use super::{Network, NetworkError};
use crate::request::{Request, RequestKey, Response};

#[derive(Clone)]
enum Reply {
    Respond(Response),
    Fail(String),
}

/// Network that answers from a URL table and records every call.
/// Unknown URLs fail with a transport error.
#[derive(Clone, Default)]
pub struct MockNetwork {
    routes: Arc<RwLock<HashMap<String, Reply>>>,
    calls: Arc<RwLock<Vec<RequestKey>>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests for `url` with `response`
    pub fn respond(&self, url: &str, response: Response) -> &Self {
        self.routes
            .write()
            .insert(url.to_string(), Reply::Respond(response));
        self
    }

    /// Fail requests for `url` with a transport error
    pub fn fail(&self, url: &str, message: &str) -> &Self {
        self.routes
            .write()
            .insert(url.to_string(), Reply::Fail(message.to_string()));
        self
    }

    /// Total number of fetches performed
    pub fn call_count(&self) -> usize {
        self.calls.read().len()
    }

    /// Number of fetches for one URL
    pub fn calls_to(&self, url: &str) -> usize {
        self.calls.read().iter().filter(|k| k.url == url).count()
    }

    /// Every fetch in call order
    pub fn calls(&self) -> Vec<RequestKey> {
        self.calls.read().clone()
    }
}

#[async_trait]
impl Network for MockNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        self.calls.write().push(request.key());

        let reply = self.routes.read().get(request.url.as_str()).cloned();
        match reply {
            Some(Reply::Respond(response)) => Ok(response),
            Some(Reply::Fail(message)) => Err(NetworkError::Transport {
                url: request.url.to_string(),
                message,
            }),
            None => Err(NetworkError::Transport {
                url: request.url.to_string(),
                message: "no route to host".to_string(),
            }),
        }
    }
}
