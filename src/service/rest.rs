//! REST adapter: a proxy endpoint that owns prompt assembly and model access.
//!
//! Speaks the `{fullContext, selectedText, instruction}` / `{content}`
//! contract. Auth beyond an optional bearer token is the proxy's problem.

use crate::config::ServiceConfig;
use crate::service::errors::ServiceError;
use crate::service::{RewriteRequest, RewriteResponse, RewriteService};
use async_trait::async_trait;
use std::time::Duration;

pub struct RestRewriteClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
}

impl RestRewriteClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Build from config: endpoint, optional key, request timeout.
    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl RewriteService for RestRewriteClient {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, ServiceError> {
        tracing::debug!(
            endpoint = %self.endpoint,
            selected_len = request.selected_text.len(),
            "dispatching rewrite to proxy"
        );

        let mut req = self.client.post(&self.endpoint).json(request);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let res = req.send().await?;
        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "rewrite proxy returned failure");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: RewriteResponse =
            serde_json::from_str(&body).map_err(|e| ServiceError::MalformedResponse {
                message: e.to_string(),
                body,
            })?;

        Ok(parsed.content)
    }
}
