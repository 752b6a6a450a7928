//! HTTP client for the Build API
//!
//! Requests authenticate with HTTP Basic auth, the API key being the user
//! name. Failed requests are not retried: a retried upload could create a
//! second revision.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;

use crate::common::{Error, Result};

use super::types::*;
use super::BuildService;

/// Production Build API endpoint
pub const DEFAULT_BASE_URL: &str = "https://build.electricimp.com/v4";

/// Build API client
pub struct BuildApiClient {
    http: Client,
    api_key: String,
    base_url: String,
}

impl BuildApiClient {
    /// Create a client for the production endpoint
    pub fn new(api_key: &str) -> Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Create a client for a custom endpoint
    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("imptest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Service(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Send a request and decode a successful JSON response
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let response = request
            .basic_auth(&self.api_key, Some(""))
            .send()
            .await
            .map_err(|e| Error::Service(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::Service(format!("Failed to read response body: {}", e)))?;

        tracing::debug!(status = status.as_u16(), "Build API response: {}", body);

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| {
                    if e.error.code.is_empty() {
                        e.error.message_short
                    } else {
                        format!("{} ({})", e.error.message_short, e.error.code)
                    }
                })
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("unknown").to_string());
            return Err(Error::ServiceStatus {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| Error::Service(format!("Unexpected response from Build API: {}", e)))
    }
}

#[async_trait]
impl BuildService for BuildApiClient {
    async fn create_revision(
        &self,
        model_id: &str,
        device_code: &str,
        agent_code: &str,
    ) -> Result<Revision> {
        let url = self.url(&format!("/models/{}/revisions", model_id));
        tracing::debug!("POST {}", url);

        let request = self.http.post(url).json(&CreateRevisionRequest {
            device_code,
            agent_code,
        });
        let response: CreateRevisionResponse = self.send(request).await?;
        Ok(response.revision)
    }

    async fn restart_model(&self, model_id: &str) -> Result<()> {
        let url = self.url(&format!("/models/{}/restarts", model_id));
        tracing::debug!("POST {}", url);

        let _: serde_json::Value = self.send(self.http.post(url)).await?;
        Ok(())
    }

    async fn get_logs(&self, device_id: &str, since: &str) -> Result<Vec<LogEntry>> {
        let url = self.url(&format!("/devices/{}/logs", device_id));
        tracing::debug!("GET {} since {}", url, since);

        let request = self.http.get(url).query(&[("since", since)]);
        let response: LogsResponse = self.send(request).await?;
        Ok(response.logs)
    }
}
