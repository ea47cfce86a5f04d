//! HTTP transport seam
//!
//! Clients describe a request as an `ApiRequest`; the transport sends it and
//! returns the decoded, classified JSON body.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use super::error::{decode_body, ProviderError};
use super::request::QueryPairs;
use crate::config::DiscoveryConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: HttpMethod,
    /// Absolute URL without query string
    pub url: String,
    pub query: QueryPairs,
    /// Full `Authorization` header value
    pub authorization: String,
    /// Overrides the client-wide timeout
    pub timeout: Option<Duration>,
}

impl ApiRequest {
    pub fn get(url: impl Into<String>, query: QueryPairs, authorization: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Get,
            url: url.into(),
            query,
            authorization: authorization.into(),
            timeout: None,
        }
    }

    pub fn post(url: impl Into<String>, query: QueryPairs, authorization: impl Into<String>) -> Self {
        Self {
            method: HttpMethod::Post,
            ..Self::get(url, query, authorization)
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// First value for `key` in the query string
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: ApiRequest) -> Result<Value, ProviderError>;
}

/// reqwest-backed transport
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Client with the catalog idle and total timeouts.
    ///
    /// reqwest 0.11 has no per-read timeout, so the idle limit bounds the
    /// connect phase only; a stalled body is caught by the total timeout.
    pub fn new(config: &DiscoveryConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .connect_timeout(config.catalog_idle_timeout())
            .timeout(config.catalog_total_timeout())
            .build()
            .map_err(|e| ProviderError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: ApiRequest) -> Result<Value, ProviderError> {
        log::debug!("Requesting {} {:?}", request.url, request.method);

        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url),
        };
        let mut builder = builder
            .query(&request.query)
            .header("Accept", "application/json")
            .header("Authorization", &request.authorization);
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Transport(format!("timed out: {}", e))
            } else {
                ProviderError::Transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport(format!("Failed to read response: {}", e)))?;

        decode_body(status, &body)
    }
}
