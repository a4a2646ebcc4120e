//! HTTP client for the backend payment-status endpoint.

use std::time::Duration;

use async_trait::async_trait;
use common::OrderRef;
use reqwest::Client;

use super::status::{StatusFetcher, StatusQuery, StatusResponse};
use crate::error::FetchError;

/// Status client configuration.
///
/// Reads from environment variables:
/// - `PAYMENT_STATUS_BASE_URL`: backend base URL (default: `"http://127.0.0.1:3000"`)
/// - `PAYMENT_STATUS_TIMEOUT_MS`: per-request timeout in milliseconds (default: none)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetcherConfig {
    pub base_url: String,
    pub timeout: Option<Duration>,
}

impl FetcherConfig {
    /// Loads configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("PAYMENT_STATUS_BASE_URL")
                .unwrap_or_else(|_| Self::default().base_url),
            timeout: std::env::var("PAYMENT_STATUS_TIMEOUT_MS")
                .ok()
                .and_then(|ms| ms.parse().ok())
                .map(Duration::from_millis),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            timeout: None,
        }
    }
}

/// Reads payment status from `GET {base_url}/payments/{orderRef}/status`.
#[derive(Debug, Clone)]
pub struct HttpStatusFetcher {
    client: Client,
    base_url: String,
}

impl HttpStatusFetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Status endpoint URL for an order, with the reference percent-encoded.
    pub fn status_url(&self, order_ref: &OrderRef) -> String {
        format!(
            "{}/payments/{}/status",
            self.base_url,
            urlencoding::encode(order_ref.as_str())
        )
    }
}

#[async_trait]
impl StatusFetcher for HttpStatusFetcher {
    #[tracing::instrument(skip(self, query), fields(order_ref = %query.order_ref))]
    async fn fetch_status(&self, query: &StatusQuery) -> Result<StatusResponse, FetchError> {
        let mut request = self.client.get(self.status_url(&query.order_ref));
        if let Some(hint) = &query.confirmation_hint {
            request = request.query(&hint.query_pairs());
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(status = status.as_u16(), "payment status request rejected");
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(response.json::<StatusResponse>().await?)
    }
}
