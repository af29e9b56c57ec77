//! Chat-completions adapter: talk to an OpenAI-compatible endpoint directly
//! and assemble the editor prompt ourselves.

use crate::config::ServiceConfig;
use crate::service::errors::ServiceError;
use crate::service::{RewriteRequest, RewriteService};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

/// Response: choices[0].message.content.
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// The editor prompt: full context for tone, the selected text, the user's
/// instruction, and a hard constraint that only the replacement comes back.
fn editor_prompt(request: &RewriteRequest) -> String {
    format!(
        "You are an AI editor assistant.\n\
         \n\
         FULL CONTEXT OF THE ARTICLE:\n\
         {}\n\
         \n\
         TEXT SELECTED BY USER TO MODIFY:\n\
         {}\n\
         \n\
         USER INSTRUCTION:\n\
         {}\n\
         \n\
         TASK: Rewrite ONLY the \"TEXT SELECTED BY USER\" based on the \
         instruction. Output only the replacement text.",
        request.full_context, request.selected_text, request.instruction
    )
}

pub struct ChatRewriteClient {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatRewriteClient {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self, ServiceError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl RewriteService for ChatRewriteClient {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, ServiceError> {
        let body = ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![ChatMessage {
                role: "user",
                content: editor_prompt(request),
            }],
        };

        tracing::debug!(endpoint = %self.endpoint, model = %self.model, "dispatching rewrite to chat endpoint");

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let res = req.send().await?;
        let status = res.status();
        let text = res.text().await?;

        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "chat endpoint returned failure");
            return Err(ServiceError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: ChatCompletionResponse =
            serde_json::from_str(&text).map_err(|e| ServiceError::MalformedResponse {
                message: e.to_string(),
                body: text,
            })?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        // An empty model reply falls back to the selected text unchanged
        // rather than splicing the selection away.
        let reply = reply.trim();
        if reply.is_empty() {
            return Ok(request.selected_text.clone());
        }

        Ok(reply.to_string())
    }
}
