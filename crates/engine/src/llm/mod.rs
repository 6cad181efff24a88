mod anthropic;
pub mod types;

use std::future::Future;
use std::pin::Pin;

use courtside_common::config::LlmRoleConfig;

pub use types::{ContentBlock, LlmResponse, Message, Role, StopReason, TokenUsage, ToolDefinition};

/// LLM API client for a single configured role (chat or formatter).
///
/// Calls are single-shot: any failure is fatal to the turn that issued it,
/// surfaced to the caller without retry.
pub struct LlmClient {
    http: reqwest::Client,
    config: LlmRoleConfig,
    api_key: String,
}

/// Errors from LLM API calls.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("LLM HTTP error: {0}")]
    Http(String),

    #[error("LLM auth error: {0}")]
    Auth(String),

    #[error("LLM rate limited (retry after {retry_after:?}s)")]
    RateLimited { retry_after: Option<u64> },

    #[error("LLM API error: {0}")]
    Api(String),

    #[error("LLM response parse error: {0}")]
    Parse(String),
}

impl From<LlmError> for courtside_common::CourtsideError {
    fn from(e: LlmError) -> Self {
        courtside_common::CourtsideError::LlmApi(e.to_string())
    }
}

impl LlmClient {
    /// Create a new LLM client for the given role config.
    /// Reads the API key from ANTHROPIC_API_KEY; returns None if unset.
    pub fn new(config: LlmRoleConfig) -> Option<Self> {
        if config.provider != "anthropic" {
            tracing::warn!(provider = %config.provider, "Unknown LLM provider");
            return None;
        }

        let api_key = match std::env::var("ANTHROPIC_API_KEY") {
            Ok(key) if !key.is_empty() => key,
            _ => {
                tracing::warn!(
                    model = %config.model,
                    "ANTHROPIC_API_KEY not set — LLM client disabled"
                );
                return None;
            }
        };

        Some(Self {
            http: reqwest::Client::new(),
            config,
            api_key,
        })
    }

    /// Send one chat request to the configured provider.
    pub async fn chat(
        &self,
        system: &str,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<LlmResponse, LlmError> {
        match self.config.provider.as_str() {
            "anthropic" => {
                anthropic::send_messages(
                    &self.http,
                    &self.api_key,
                    &self.config.model,
                    self.config.max_tokens,
                    self.config.temperature,
                    system,
                    messages,
                    tools,
                )
                .await
            }
            other => Err(LlmError::Api(format!("Unknown provider: {}", other))),
        }
    }
}

/// Object-safe trait for testability (dyn dispatch).
/// Tests provide a mock; production uses LlmClient.
pub trait LlmCaller: Send + Sync {
    fn chat<'a>(
        &'a self,
        system: &'a str,
        messages: &'a [Message],
        tools: &'a [ToolDefinition],
    ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + 'a>>;
}

impl LlmCaller for LlmClient {
    fn chat<'a>(
        &'a self,
        system: &'a str,
        messages: &'a [Message],
        tools: &'a [ToolDefinition],
    ) -> Pin<Box<dyn Future<Output = Result<LlmResponse, LlmError>> + Send + 'a>> {
        Box::pin(self.chat(system, messages, tools))
    }
}
