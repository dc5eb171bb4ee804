//! Type definitions for the disk store

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::cache::error::StoreError;
use crate::request::{RequestKey, Response, ResponseType};

/// Metadata for a stored entry on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub method: String,
    pub url: String,
    pub status: u16,
    #[serde(default)]
    pub response_type: ResponseType,
    /// Header names with hex-encoded values, so any value bytes survive
    #[serde(default)]
    pub headers: Vec<(String, String)>,
    pub size_bytes: u64,
    pub created_at: u64,
}

impl EntryMetadata {
    pub fn new(key: &RequestKey, response: &Response) -> Self {
        let headers = response
            .headers
            .iter()
            .map(|(name, value)| (name.as_str().to_string(), hex::encode(value.as_bytes())))
            .collect();

        Self {
            method: key.method.as_str().to_string(),
            url: key.url.clone(),
            status: response.status.as_u16(),
            response_type: response.response_type,
            headers,
            size_bytes: response.content_length() as u64,
            created_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        }
    }

    /// Whether this metadata belongs to the given key
    pub fn matches(&self, key: &RequestKey) -> bool {
        self.method == key.method.as_str() && self.url == key.url
    }

    /// Rebuild the stored response around its body
    pub fn into_response(self, body: Bytes) -> Result<Response, StoreError> {
        let status = StatusCode::from_u16(self.status)
            .map_err(|_| StoreError::Corrupted(format!("invalid status {}", self.status)))?;

        if body.len() as u64 != self.size_bytes {
            return Err(StoreError::Corrupted(format!(
                "body of {} is {} bytes, expected {}",
                self.url,
                body.len(),
                self.size_bytes
            )));
        }

        let mut headers = HeaderMap::new();
        for (name, value) in self.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| StoreError::Corrupted(format!("invalid header name {}", name)))?;
            let value = hex::decode(&value)
                .ok()
                .and_then(|bytes| HeaderValue::from_bytes(&bytes).ok())
                .ok_or_else(|| StoreError::Corrupted(format!("invalid value for {}", name)))?;
            headers.append(name, value);
        }

        Ok(Response {
            status,
            response_type: self.response_type,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use url::Url;

    fn key() -> RequestKey {
        RequestKey::new(
            Method::GET,
            &Url::parse("https://fonts.gstatic.com/s/inter.woff2").unwrap(),
        )
    }

    #[test]
    fn test_metadata_restores_response() {
        let response = Response::ok("font-bytes")
            .with_header("content-type", HeaderValue::from_static("font/woff2"));
        let metadata = EntryMetadata::new(&key(), &response);

        let json = serde_json::to_string(&metadata).unwrap();
        let parsed: EntryMetadata = serde_json::from_str(&json).unwrap();
        let restored = parsed
            .into_response(Bytes::from_static(b"font-bytes"))
            .unwrap();

        assert_eq!(restored.status, StatusCode::OK);
        assert_eq!(restored.response_type, ResponseType::Basic);
        assert_eq!(restored.headers["content-type"], "font/woff2");
    }

    #[test]
    fn test_opaque_header_bytes_survive() {
        let raw = HeaderValue::from_bytes(b"attachment; filename=caf\xe9.txt").unwrap();
        let response = Response::ok("x").with_header("content-disposition", raw.clone());
        let metadata = EntryMetadata::new(&key(), &response);

        let json = serde_json::to_string(&metadata).unwrap();
        let parsed: EntryMetadata = serde_json::from_str(&json).unwrap();
        let restored = parsed.into_response(Bytes::from_static(b"x")).unwrap();

        assert_eq!(restored.headers["content-disposition"].as_bytes(), raw.as_bytes());
    }

    #[test]
    fn test_undecodable_header_value_is_corruption() {
        let mut metadata = EntryMetadata::new(&key(), &Response::ok(""));
        metadata
            .headers
            .push(("content-type".to_string(), "not hex".to_string()));

        let err = metadata.into_response(Bytes::new()).unwrap_err();

        assert!(matches!(err, StoreError::Corrupted(_)));
    }

    #[test]
    fn test_truncated_body_is_corruption() {
        let metadata = EntryMetadata::new(&key(), &Response::ok("0123456789"));

        let err = metadata
            .into_response(Bytes::from_static(b"01234"))
            .unwrap_err();

        assert!(matches!(err, StoreError::Corrupted(_)));
    }

    #[test]
    fn test_matches_checks_method_and_url() {
        let metadata = EntryMetadata::new(&key(), &Response::ok(""));
        let mut other = key();
        other.method = Method::HEAD;

        assert!(metadata.matches(&key()));
        assert!(!metadata.matches(&other));
    }
}
