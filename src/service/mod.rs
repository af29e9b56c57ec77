//! Rewrite service boundary.
//!
//! The engine's only external collaborator: something that takes the full
//! buffer content, the selected text, and a natural-language instruction,
//! and proposes a replacement for the selected text alone. Transport and
//! auth live behind [`RewriteService`]; the engine treats the reply as an
//! opaque replacement string.

pub mod chat;
pub mod errors;
pub mod rest;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use chat::ChatRewriteClient;
pub use errors::ServiceError;
pub use rest::RestRewriteClient;

/// Wire request for a rewrite. Field names are camelCase on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewriteRequest {
    /// Entire buffer content at request time, so the service can match the
    /// surrounding tone. The reply is still a substitute for
    /// `selected_text` alone, never a rewrite of the whole document.
    pub full_context: String,
    pub selected_text: String,
    pub instruction: String,
}

/// Wire response: the proposed replacement for the selected text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteResponse {
    pub content: String,
}

/// A rewrite collaborator. May suspend; must not be assumed reliable.
#[async_trait]
pub trait RewriteService: Send + Sync {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, ServiceError>;
}
