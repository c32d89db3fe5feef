//! HTTP transport seam.
//!
//! The catalog adapter and the dataset fetcher only need "GET this URL and
//! give me the body". [`HttpTransport`] does that with a blocking reqwest
//! client; [`MemoryTransport`] serves canned bodies for tests and offline
//! use. Neither retries.

use crate::config::StatCanConfig;
use crate::error::{Result, StatCanError};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

/// Transport-level failure, mapped to a domain error by the caller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Failed(String),
}

pub trait Transport {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError>;
}

/// Blocking HTTP client
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
}

impl HttpTransport {
    pub fn new(config: &StatCanConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()
            .map_err(|e| StatCanError::Configuration {
                message: format!("Failed to create HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| TransportError::Failed(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(TransportError::NotFound);
        }
        if !response.status().is_success() {
            return Err(TransportError::Failed(format!("HTTP {}", response.status())));
        }

        let body = response
            .bytes()
            .map_err(|e| TransportError::Failed(format!("Failed to read body: {}", e)))?;
        debug!("Received {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

/// Canned responses keyed by URL; unknown URLs are not found
#[derive(Debug, Clone, Default)]
pub struct MemoryTransport {
    responses: HashMap<String, std::result::Result<Vec<u8>, TransportError>>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.responses.insert(url.into(), Ok(body.into()));
        self
    }

    pub fn with_failure(mut self, url: impl Into<String>, error: TransportError) -> Self {
        self.responses.insert(url.into(), Err(error));
        self
    }
}

impl Transport for MemoryTransport {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        self.responses
            .get(url)
            .cloned()
            .unwrap_or(Err(TransportError::NotFound))
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        (**self).get(url)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn get(&self, url: &str) -> std::result::Result<Vec<u8>, TransportError> {
        (**self).get(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport() {
        let transport = MemoryTransport::new()
            .with_body("http://a", b"hello".to_vec())
            .with_failure("http://b", TransportError::Failed("boom".into()));

        assert_eq!(transport.get("http://a").unwrap(), b"hello");
        assert_eq!(
            transport.get("http://b"),
            Err(TransportError::Failed("boom".into()))
        );
        assert_eq!(transport.get("http://c"), Err(TransportError::NotFound));
    }

    #[test]
    fn test_http_transport_builds_from_default_config() {
        assert!(HttpTransport::new(&StatCanConfig::default()).is_ok());
    }
}
