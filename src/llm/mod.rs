//! Text generation for Care Assist.
//!
//! Supports:
//! - **OpenAI**: chat-completions API (or any compatible endpoint)
//! - **Anthropic**: messages API
//!
//! The pipeline only sees the `TextGenerator` trait; `create_generator`
//! picks the transport from configuration.

pub mod http;
pub mod provider;

pub use http::{AnthropicGenerator, OpenAiGenerator};
pub use provider::*;

use std::sync::Arc;

use secrecy::SecretString;

use crate::error::{ConfigError, LlmError};

/// Supported LLM backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmBackend {
    OpenAi,
    Anthropic,
}

/// Configuration for creating a text generator.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub backend: LlmBackend,
    pub api_key: SecretString,
    pub model: String,
    /// Sampling temperature for the response-generation stage.
    pub temperature: f32,
    /// Token cap for the response-generation stage.
    pub max_tokens: u32,
    /// Endpoint override (e.g. a local OpenAI-compatible server).
    pub base_url: Option<String>,
}

impl LlmConfig {
    /// Read LLM configuration from the environment.
    ///
    /// Fails with `ConfigError::MissingEnvVar` when the backend's API key is
    /// absent — a fatal condition at startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        let backend = match std::env::var("LLM_BACKEND").as_deref() {
            Ok("anthropic") => LlmBackend::Anthropic,
            _ => LlmBackend::OpenAi,
        };

        let key_var = match backend {
            LlmBackend::OpenAi => "OPENAI_API_KEY",
            LlmBackend::Anthropic => "ANTHROPIC_API_KEY",
        };
        let api_key = std::env::var(key_var)
            .map(SecretString::from)
            .map_err(|_| ConfigError::MissingEnvVar(key_var.to_string()))?;

        let model = std::env::var("LLM_MODEL").unwrap_or_else(|_| {
            match backend {
                LlmBackend::OpenAi => "gpt-3.5-turbo",
                LlmBackend::Anthropic => "claude-3-5-haiku-latest",
            }
            .to_string()
        });

        let temperature = std::env::var("LLM_TEMPERATURE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0.3);

        let max_tokens = std::env::var("LLM_MAX_TOKENS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(500);

        Ok(Self {
            backend,
            api_key,
            model,
            temperature,
            max_tokens,
            base_url: std::env::var("LLM_BASE_URL").ok(),
        })
    }
}

/// Create a text generator from configuration.
pub fn create_generator(config: &LlmConfig) -> Result<Arc<dyn TextGenerator>, LlmError> {
    match config.backend {
        LlmBackend::OpenAi => {
            let generator = OpenAiGenerator::new(
                config.api_key.clone(),
                &config.model,
                config.base_url.clone(),
            )?;
            tracing::info!("Using OpenAI (model: {})", config.model);
            Ok(Arc::new(generator))
        }
        LlmBackend::Anthropic => {
            let generator = AnthropicGenerator::new(
                config.api_key.clone(),
                &config.model,
                config.base_url.clone(),
            )?;
            tracing::info!("Using Anthropic (model: {})", config.model);
            Ok(Arc::new(generator))
        }
    }
}
