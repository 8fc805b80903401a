//! HTTP transports for the `TextGenerator` trait.
//!
//! Both providers use plain reqwest JSON calls with bounded timeouts — a
//! hung upstream surfaces as `LlmError::RequestFailed`, never an unbounded
//! wait inside a request handler.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use crate::error::LlmError;
use crate::llm::provider::{
    ChatMessage, CompletionRequest, CompletionResponse, FinishReason, Role, TextGenerator,
};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Anthropic requires an explicit max_tokens on every request.
const DEFAULT_MAX_TOKENS: u32 = 1024;

fn build_client(provider: &str) -> Result<Client, LlmError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT)
        .build()
        .map_err(|e| LlmError::RequestFailed {
            provider: provider.to_string(),
            reason: format!("failed to build HTTP client: {e}"),
        })
}

/// Map a transport-level reqwest error into an `LlmError`.
fn map_send_error(provider: &str, endpoint: &str, e: reqwest::Error) -> LlmError {
    let reason = if e.is_timeout() {
        format!("request to {endpoint} timed out")
    } else if e.is_connect() {
        format!("failed to connect to {endpoint}: {e}")
    } else {
        format!("request to {endpoint} failed: {e}")
    };
    LlmError::RequestFailed {
        provider: provider.to_string(),
        reason,
    }
}

/// Map a non-success HTTP status into an `LlmError`.
async fn map_status_error(
    provider: &str,
    status: StatusCode,
    response: reqwest::Response,
) -> LlmError {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return LlmError::AuthFailed {
            provider: provider.to_string(),
        };
    }

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs);
        return LlmError::RateLimited {
            provider: provider.to_string(),
            retry_after,
        };
    }

    let body = response.text().await.unwrap_or_default();
    let preview: String = body.chars().take(300).collect();
    LlmError::RequestFailed {
        provider: provider.to_string(),
        reason: format!("API error ({status}): {preview}"),
    }
}

fn parse_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("stop") | Some("end_turn") => FinishReason::Stop,
        Some("length") | Some("max_tokens") => FinishReason::Length,
        _ => FinishReason::Other,
    }
}

// ── OpenAI-compatible provider ──────────────────────────────────────

/// OpenAI chat-completions provider. Also works against any
/// OpenAI-compatible endpoint via the `base_url` override.
pub struct OpenAiGenerator {
    client: Client,
    api_key: SecretString,
    model: String,
    endpoint: String,
}

impl OpenAiGenerator {
    pub fn new(
        api_key: SecretString,
        model: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_client("openai")?,
            api_key,
            model: model.into(),
            endpoint: base_url.unwrap_or_else(|| OPENAI_ENDPOINT.to_string()),
        })
    }
}

#[derive(Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
    #[serde(default)]
    usage: Option<OpenAiUsage>,
}

#[derive(Deserialize)]
struct OpenAiChoice {
    message: OpenAiMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAiMessage {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize, Default)]
struct OpenAiUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let messages: Vec<serde_json::Value> = request
            .messages
            .iter()
            .map(|m| {
                let role = match m.role {
                    Role::System => "system",
                    Role::User => "user",
                };
                json!({"role": role, "content": m.content})
            })
            .collect();

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(t) = request.temperature {
            body["temperature"] = json!(t);
        }
        if let Some(m) = request.max_tokens {
            body["max_tokens"] = json!(m);
        }

        debug!(endpoint = %self.endpoint, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key.expose_secret()))
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error("openai", &self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status_error("openai", status, response).await);
        }

        let parsed: OpenAiResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: format!("failed to parse response body: {e}"),
            })?;

        let choice = parsed.choices.into_iter().next().ok_or_else(|| {
            LlmError::InvalidResponse {
                provider: "openai".to_string(),
                reason: "no choices returned".to_string(),
            }
        })?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(CompletionResponse {
            content: choice.message.content,
            input_tokens: usage.prompt_tokens,
            output_tokens: usage.completion_tokens,
            finish_reason: parse_finish_reason(choice.finish_reason.as_deref()),
        })
    }
}

// ── Anthropic provider ──────────────────────────────────────────────

/// Anthropic messages-API provider.
pub struct AnthropicGenerator {
    client: Client,
    api_key: SecretString,
    model: String,
    endpoint: String,
}

impl AnthropicGenerator {
    pub fn new(
        api_key: SecretString,
        model: impl Into<String>,
        base_url: Option<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            client: build_client("anthropic")?,
            api_key,
            model: model.into(),
            endpoint: base_url.unwrap_or_else(|| ANTHROPIC_ENDPOINT.to_string()),
        })
    }

    /// Anthropic takes the system prompt as a top-level field, not a message.
    fn split_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<serde_json::Value>) {
        let mut system = None;
        let mut user_messages = Vec::new();
        for m in messages {
            match m.role {
                Role::System => system = Some(m.content.clone()),
                Role::User => user_messages.push(json!({"role": "user", "content": m.content})),
            }
        }
        (system, user_messages)
    }
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<AnthropicUsage>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Default)]
struct AnthropicUsage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[async_trait]
impl TextGenerator for AnthropicGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let (system, messages) = Self::split_messages(&request.messages);

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "max_tokens": request.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });
        if let Some(sys) = system {
            body["system"] = json!(sys);
        }
        if let Some(t) = request.temperature {
            body["temperature"] = json!(t);
        }

        debug!(endpoint = %self.endpoint, model = %self.model, "Sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| map_send_error("anthropic", &self.endpoint, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(map_status_error("anthropic", status, response).await);
        }

        let parsed: AnthropicResponse =
            response.json().await.map_err(|e| LlmError::InvalidResponse {
                provider: "anthropic".to_string(),
                reason: format!("failed to parse response body: {e}"),
            })?;

        let content = parsed
            .content
            .first()
            .map(|c| c.text.clone())
            .ok_or_else(|| LlmError::InvalidResponse {
                provider: "anthropic".to_string(),
                reason: "no content blocks returned".to_string(),
            })?;

        let usage = parsed.usage.unwrap_or_default();
        Ok(CompletionResponse {
            content,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            finish_reason: parse_finish_reason(parsed.stop_reason.as_deref()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_reason_mapping() {
        assert_eq!(parse_finish_reason(Some("stop")), FinishReason::Stop);
        assert_eq!(parse_finish_reason(Some("end_turn")), FinishReason::Stop);
        assert_eq!(parse_finish_reason(Some("length")), FinishReason::Length);
        assert_eq!(parse_finish_reason(Some("max_tokens")), FinishReason::Length);
        assert_eq!(parse_finish_reason(Some("tool_use")), FinishReason::Other);
        assert_eq!(parse_finish_reason(None), FinishReason::Other);
    }

    #[test]
    fn anthropic_splits_system_message() {
        let (system, messages) = AnthropicGenerator::split_messages(&[
            ChatMessage::system("be helpful"),
            ChatMessage::user("hello"),
        ]);
        assert_eq!(system.as_deref(), Some("be helpful"));
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
    }

    #[test]
    fn openai_response_parses_without_usage() {
        let raw = r#"{"choices": [{"message": {"content": "hi"}, "finish_reason": "stop"}]}"#;
        let parsed: OpenAiResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.choices[0].message.content, "hi");
        assert!(parsed.usage.is_none());
    }
}
