//! Core types for the structured-completion gateway.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// CHAT TYPES
// =============================================================================

/// Chat message role.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A chat message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

// =============================================================================
// STRUCTURED COMPLETION
// =============================================================================

/// One structured-completion request: a system prompt, user content, and the
/// JSON schema the reply must conform to.
#[derive(Debug, Clone)]
pub struct StructuredRequest {
    /// Short name for the target contract (used in the provider's
    /// `json_schema` envelope and in logs).
    pub schema_name: String,
    /// JSON schema derived from the target contract type.
    pub schema: Value,
    pub system: String,
    pub user: String,
    /// Sampling temperature (0.0 - 2.0).
    pub temperature: f32,
}

impl StructuredRequest {
    pub fn new(
        schema_name: impl Into<String>,
        schema: Value,
        system: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self {
            schema_name: schema_name.into(),
            schema,
            system: system.into(),
            user: user.into(),
            temperature: 0.0,
        }
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.temperature = t;
        self
    }

    pub fn to_messages(&self) -> Vec<Message> {
        vec![Message::system(&self.system), Message::user(&self.user)]
    }
}

/// Raw reply: the parsed JSON value plus diagnostic trace metadata.
#[derive(Debug, Clone)]
pub struct StructuredReply {
    pub value: Value,
    pub trace: CallTrace,
}

/// Diagnostic metadata for one provider call. Never surfaced to end users.
#[derive(Debug, Clone, Serialize)]
pub struct CallTrace {
    pub model: String,
    pub temperature: f32,
    pub latency_ms: u64,
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub finish_reason: Option<String>,
    pub started_at: DateTime<Utc>,
}

impl CallTrace {
    /// An empty trace for tools that made no provider call.
    pub fn local(label: impl Into<String>) -> Self {
        Self {
            model: label.into(),
            temperature: 0.0,
            latency_ms: 0,
            prompt_tokens: 0,
            completion_tokens: 0,
            finish_reason: None,
            started_at: Utc::now(),
        }
    }
}
