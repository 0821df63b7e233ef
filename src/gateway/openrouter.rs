//! OpenRouter adapter for structured chat completions.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{ErrorContext, GatewayError};
use super::types::{CallTrace, Message, Role, StructuredReply, StructuredRequest};

// =============================================================================
// TRAIT
// =============================================================================

/// The external collaborator boundary: one schema-validated completion per
/// call, no implicit retries. Tools depend on this trait, never on the
/// concrete adapter, so tests can substitute deterministic providers.
#[async_trait]
pub trait StructuredProvider: Send + Sync {
    async fn complete(&self, req: StructuredRequest) -> Result<StructuredReply, GatewayError>;
}

// =============================================================================
// OPENROUTER ADAPTER
// =============================================================================

/// Maximum allowed input characters (~125k tokens).
const MAX_INPUT_CHARS: usize = 500_000;

const DEFAULT_MODEL: &str = "openai/gpt-5-mini";

/// OpenRouter API adapter.
#[derive(Debug, Clone)]
pub struct OpenRouterAdapter {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl OpenRouterAdapter {
    /// Create from API key with defaults.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GatewayError> {
        Self::with_config(
            api_key,
            "https://openrouter.ai/api/v1",
            DEFAULT_MODEL,
            Duration::from_secs(60),
        )
    }

    /// Create from environment variables.
    ///
    /// `OPENROUTER_API_KEY` is required; `OPENROUTER_BASE_URL`,
    /// `CROSSTAB_MODEL` and `OPENROUTER_TIMEOUT_SECONDS` are optional.
    pub fn from_env() -> Result<Self, GatewayError> {
        let api_key = std::env::var("OPENROUTER_API_KEY")
            .map_err(|_| GatewayError::config("OPENROUTER_API_KEY not set"))?;

        let base_url = std::env::var("OPENROUTER_BASE_URL")
            .unwrap_or_else(|_| "https://openrouter.ai/api/v1".into());

        let model = std::env::var("CROSSTAB_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());

        let timeout = std::env::var("OPENROUTER_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(60));

        Self::with_config(api_key, base_url, model, timeout)
    }

    /// Create with custom configuration.
    pub fn with_config(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let api_key = api_key.into();

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let auth_value = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| GatewayError::config("Invalid API key format"))?;
        headers.insert(AUTHORIZATION, auth_value);

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .gzip(true)
            .build()
            .map_err(|e| GatewayError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn extract_request_id(headers: &reqwest::header::HeaderMap) -> Option<String> {
        headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
    }
}

// =============================================================================
// API TYPES
// =============================================================================

#[derive(Serialize)]
struct ChatApiRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage>,
    temperature: f32,
    response_format: ResponseFormat<'a>,
}

#[derive(Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

impl From<&Message> for ApiMessage {
    fn from(m: &Message) -> Self {
        Self {
            role: match m.role {
                Role::System => "system".to_string(),
                Role::User => "user".to_string(),
                Role::Assistant => "assistant".to_string(),
            },
            content: m.content.clone(),
        }
    }
}

#[derive(Serialize)]
struct ResponseFormat<'a> {
    #[serde(rename = "type")]
    format_type: &'static str,
    json_schema: JsonSchemaSpec<'a>,
}

#[derive(Serialize)]
struct JsonSchemaSpec<'a> {
    name: &'a str,
    strict: bool,
    schema: &'a Value,
}

#[derive(Deserialize)]
struct ChatApiResponse {
    choices: Option<Vec<Choice>>,
    usage: Option<Usage>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct Choice {
    message: Option<ChoiceMessage>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

#[derive(Deserialize)]
struct ToolCall {
    function: Option<ToolFunction>,
}

#[derive(Deserialize)]
struct ToolFunction {
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct Usage {
    prompt_tokens: Option<u32>,
    completion_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct ApiError {
    message: Option<String>,
    code: Option<String>,
}

// =============================================================================
// PROVIDER IMPL
// =============================================================================

#[async_trait]
impl StructuredProvider for OpenRouterAdapter {
    async fn complete(&self, req: StructuredRequest) -> Result<StructuredReply, GatewayError> {
        let total_chars = req.system.len() + req.user.len();
        if total_chars > MAX_INPUT_CHARS {
            return Err(GatewayError::invalid_request(format!(
                "Input too large: {total_chars} chars (max {MAX_INPUT_CHARS})"
            )));
        }

        let started_at = Utc::now();
        let start = Instant::now();

        let messages: Vec<ApiMessage> = req.to_messages().iter().map(ApiMessage::from).collect();
        let api_req = ChatApiRequest {
            model: &self.model,
            messages,
            temperature: req.temperature,
            response_format: ResponseFormat {
                format_type: "json_schema",
                json_schema: JsonSchemaSpec {
                    name: &req.schema_name,
                    strict: true,
                    schema: &req.schema,
                },
            },
        };

        let response = self
            .client
            .post(self.chat_url())
            .json(&api_req)
            .send()
            .await?;

        let status = response.status();
        let request_id = Self::extract_request_id(response.headers());
        let body: ChatApiResponse = response.json().await?;

        if let Some(err) = body.error {
            let mut ctx = ErrorContext::new().with_status(status.as_u16());
            if let Some(code) = err.code {
                ctx = ctx.with_code(code);
            }
            if let Some(id) = request_id {
                ctx = ctx.with_request_id(id);
            }
            return Err(GatewayError::provider_with_context(
                "openrouter",
                err.message.unwrap_or_else(|| "unknown error".into()),
                ctx,
            ));
        }

        let choice = body
            .choices
            .and_then(|mut c| if c.is_empty() { None } else { Some(c.remove(0)) })
            .ok_or_else(|| GatewayError::provider("openrouter", "no choices in response"))?;

        let finish_reason = choice.finish_reason;
        let message = choice
            .message
            .ok_or_else(|| GatewayError::provider("openrouter", "choice has no message"))?;

        // Prefer content; fall back to tool-call arguments, which some models
        // use to carry schema-constrained output.
        let content = match message.content.filter(|c| !c.trim().is_empty()) {
            Some(c) => c,
            None => message
                .tool_calls
                .and_then(|mut calls| {
                    if calls.is_empty() {
                        None
                    } else {
                        calls.remove(0).function.and_then(|f| f.arguments)
                    }
                })
                .ok_or_else(|| GatewayError::provider("openrouter", "empty completion content"))?,
        };

        let value: Value = serde_json::from_str(&content)
            .map_err(|e| GatewayError::schema(format!("reply is not valid JSON: {e}")))?;

        let usage = body.usage.unwrap_or(Usage {
            prompt_tokens: None,
            completion_tokens: None,
        });

        Ok(StructuredReply {
            value,
            trace: CallTrace {
                model: self.model.clone(),
                temperature: req.temperature,
                latency_ms: start.elapsed().as_millis() as u64,
                prompt_tokens: usage.prompt_tokens.unwrap_or(0),
                completion_tokens: usage.completion_tokens.unwrap_or(0),
                finish_reason,
                started_at,
            },
        })
    }
}
