//! LLM Client — the single point of entry for all model calls.
//!
//! ARCHITECTURAL RULE: No other module may call the completion API directly.
//! Pipeline stages go through `StructuredClient`, which wraps a
//! `CompletionBackend` with schema coercion, timeouts and retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;

pub mod prompts;
pub mod schema;
pub mod structured;
#[cfg(test)]
pub mod testing;

pub use schema::{SchemaError, StructuredOutput};
pub use structured::{Prompt, RetryPolicy, StructuredClient};

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("LLM returned empty content")]
    EmptyContent,

    #[error("schema mismatch: {0}")]
    Schema(#[from] SchemaError),

    #[error("LLM call timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: Box<LlmError> },
}

impl LlmError {
    /// Whether another attempt could plausibly succeed.
    /// Client-side API errors (bad key, bad request) are final.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::Http(_) | LlmError::EmptyContent | LlmError::Schema(_) => true,
            LlmError::Timeout(_) => true,
            LlmError::Api { status, .. } => *status == 429 || *status >= 500,
            LlmError::RetriesExhausted { .. } => false,
        }
    }
}

/// One raw completion attempt, as seen by a backend.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub temperature: f32,
    /// Name of the schema the caller will coerce the reply into.
    pub schema: &'static str,
}

/// The raw completion capability. Implementations make exactly one call and
/// never retry; the retry budget lives in `StructuredClient`.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    max_tokens: u32,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub choices: Vec<Choice>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
pub struct ChoiceMessage {
    pub content: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl ChatResponse {
    /// Extracts the text content of the first choice.
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Production backend: an OpenAI-compatible chat completions endpoint
/// (Groq by default) asked for JSON-object output.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    api_key: String,
    api_url: String,
    model: String,
    max_tokens: u32,
}

impl LlmClient {
    pub fn new(config: &Config) -> Result<Self, LlmError> {
        Ok(Self {
            client: Client::builder().timeout(config.llm.timeout).build()?,
            api_key: config.llm_api_key.clone(),
            api_url: config.llm_api_url.clone(),
            model: config.llm_model.clone(),
            max_tokens: config.llm.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionBackend for LlmClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
        let body = ChatRequest {
            model: &self.model,
            temperature: request.temperature,
            max_tokens: self.max_tokens,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            response_format: ResponseFormat {
                format_type: "json_object",
            },
        };

        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let raw = response.text().await.unwrap_or_default();
            // Try to parse error message
            let message = serde_json::from_str::<ApiError>(&raw)
                .map(|e| e.error.message)
                .unwrap_or(raw);
            if status.as_u16() == 429 || status.is_server_error() {
                warn!("LLM API returned {}: {}", status, message);
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse = response.json().await?;

        if let Some(usage) = &chat.usage {
            debug!(
                "LLM call succeeded ({}): prompt_tokens={}, completion_tokens={}",
                request.schema, usage.prompt_tokens, usage.completion_tokens
            );
        }

        chat.text()
            .map(str::to_owned)
            .ok_or(LlmError::EmptyContent)
    }
}
