//! HTTP client for the analysis backend.
//!
//! One `POST /analyze` per search.  Every failure mode (transport, non-2xx,
//! undecodable body) comes back as a `ClientError`; callers collapse them
//! into the single user-facing [`FETCH_ERROR_MESSAGE`].

use std::time::Duration;

use reqwest::{StatusCode, Url};
use thiserror::Error;
use tracing::debug;

use crate::config::BackendConfig;
use crate::protocol::{AnalyzeRequest, AnalyzeResponse, HealthResponse};

/// The only error text users ever see for a failed search.
pub const FETCH_ERROR_MESSAGE: &str = "Could not fetch recommendations.";

#[derive(Debug, Error)]
pub enum ClientError {
    /// The configured endpoint is not a usable URL.
    #[error("invalid endpoint {0:?}")]
    Endpoint(String),

    /// Connection, TLS or timeout failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Backend answered with a non-2xx status.
    #[error("backend returned status {0}")]
    Status(StatusCode),

    /// Body was not the JSON we expect.
    #[error("JSON error: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Cheaply cloneable; each search task gets its own copy.
#[derive(Debug, Clone)]
pub struct AnalyzeClient {
    http: reqwest::Client,
    analyze_url: Url,
    timeout: Option<Duration>,
}

impl AnalyzeClient {
    pub fn new(analyze_url: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let analyze_url =
            Url::parse(analyze_url).map_err(|_| ClientError::Endpoint(analyze_url.to_string()))?;
        if !matches!(analyze_url.scheme(), "http" | "https") {
            return Err(ClientError::Endpoint(analyze_url.to_string()));
        }
        Ok(Self {
            http: reqwest::Client::new(),
            analyze_url,
            timeout,
        })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ClientError> {
        Self::new(&config.analyze_url, config.timeout())
    }

    pub fn analyze_url(&self) -> &str {
        self.analyze_url.as_str()
    }

    /// `/health` on the same origin as the analyze endpoint.
    pub fn health_url(&self) -> Result<Url, ClientError> {
        self.analyze_url
            .join("/health")
            .map_err(|_| ClientError::Endpoint(self.analyze_url.to_string()))
    }

    /// Send the term list and decode tags + recommendations.
    pub async fn analyze(&self, artists: Vec<String>) -> Result<AnalyzeResponse, ClientError> {
        let body = AnalyzeRequest { artists };
        debug!("POST {} artists={:?}", self.analyze_url, body.artists);

        let mut request = self.http.post(self.analyze_url.clone()).json(&body);
        if let Some(timeout) = self.timeout {
            request = request.timeout(timeout);
        }
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status(status));
        }

        let bytes = response.bytes().await?;
        let decoded: AnalyzeResponse = serde_json::from_slice(&bytes)?;
        debug!(
            "analyze ok: {} tags, {} recommendations",
            decoded.tags.len(),
            decoded.recommendations.len()
        );
        Ok(decoded)
    }

    /// True when the backend answers `{"ok": true}` on `/health`.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = self.health_url()?;
        let response = self
            .http
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(ClientError::Status(response.status()));
        }
        let bytes = response.bytes().await?;
        let health: HealthResponse = serde_json::from_slice(&bytes)?;
        Ok(health.ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_unusable_endpoints() {
        assert!(matches!(
            AnalyzeClient::new("not a url", None),
            Err(ClientError::Endpoint(_))
        ));
        assert!(matches!(
            AnalyzeClient::new("ftp://127.0.0.1/analyze", None),
            Err(ClientError::Endpoint(_))
        ));
    }

    #[test]
    fn test_health_url_shares_origin() {
        let client = AnalyzeClient::new("http://127.0.0.1:8000/analyze", None).unwrap();
        assert_eq!(
            client.health_url().unwrap().as_str(),
            "http://127.0.0.1:8000/health"
        );
        assert_eq!(client.analyze_url(), "http://127.0.0.1:8000/analyze");
    }

    #[test]
    fn test_from_config_uses_timeout() {
        let config = BackendConfig {
            timeout_secs: 12,
            ..Default::default()
        };
        let client = AnalyzeClient::from_config(&config).unwrap();
        assert_eq!(client.timeout, Some(Duration::from_secs(12)));
    }
}
