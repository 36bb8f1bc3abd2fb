use std::time::Duration;

use anyhow::{Context, Result};
use futures::FutureExt;
use futures::future::BoxFuture;
use tracing::debug;

use super::error::ApiError;
use super::remote::{ProxyApi, ProxyRequest};

const API_PREFIX: &str = "api/v1";

/// HTTP client for an Invidious-style proxy instance.
#[derive(Clone)]
pub struct ProxyClient {
    http: reqwest::Client,
    instance: String,
}

impl ProxyClient {
    pub fn new(instance: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            http,
            instance: instance.trim_end_matches('/').to_string(),
        })
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    fn url(&self, request: &ProxyRequest) -> String {
        format!(
            "{}/{}/{}/{}",
            self.instance,
            API_PREFIX,
            request.resource.endpoint(),
            request.id
        )
    }

    async fn send(&self, request: ProxyRequest) -> Result<serde_json::Value, ApiError> {
        let url = self.url(&request);
        let mut builder = self.http.get(&url);
        if let Some(token) = &request.continuation {
            builder = builder.query(&[("continuation", token)]);
        }

        debug!(%url, "proxy request");
        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::HttpStatus(status.as_u16(), body));
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

impl ProxyApi for ProxyClient {
    fn dispatch(
        &self,
        request: ProxyRequest,
    ) -> BoxFuture<'_, Result<serde_json::Value, ApiError>> {
        self.send(request).boxed()
    }
}
