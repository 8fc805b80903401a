//! Email classification stage.
//!
//! Invokes the text generator once per non-empty email, no retry. What
//! happens to the output depends on the mode:
//!
//! - `Fixed` (default): the raw output is discarded and the hard-coded
//!   fallback classification is returned. This reproduces the observable
//!   behavior of the system this service replaces.
//! - `Parsed`: the output is parsed as a JSON classification; unparseable
//!   output fails the stage.

use std::str::FromStr;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::error::PipelineError;
use crate::llm::{ChatMessage, CompletionRequest, TextGenerator};
use crate::pipeline::prompts;
use crate::pipeline::types::{Classification, QueryType};

/// Max tokens for the classification call (kept tight — runs on every email).
const CLASSIFY_MAX_TOKENS: u32 = 300;

/// Temperature for classification (deterministic-ish).
const CLASSIFY_TEMPERATURE: f32 = 0.1;

/// Confidence of the fixed fallback classification.
const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Confidence assigned to empty-input classifications.
const EMPTY_INPUT_CONFIDENCE: f32 = 0.3;

/// How the classification stage treats the generator's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClassificationMode {
    /// Discard the output and return the fixed fallback classification.
    #[default]
    Fixed,
    /// Parse the output as a structured classification.
    Parsed,
}

impl ClassificationMode {
    /// Read the mode from `CLASSIFIER_MODE` (`parsed` enables parsing).
    pub fn from_env() -> Self {
        match std::env::var("CLASSIFIER_MODE").as_deref() {
            Ok("parsed") => Self::Parsed,
            _ => Self::Fixed,
        }
    }
}

/// Classification stage — assigns a query type and lookup flag to an email.
pub struct EmailClassifier {
    generator: Arc<dyn TextGenerator>,
    mode: ClassificationMode,
}

impl EmailClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>, mode: ClassificationMode) -> Self {
        Self { generator, mode }
    }

    /// Classify an email. Never rejects the input: empty emails get a
    /// low-confidence fallback classification without a generator call.
    pub async fn classify(&self, email: &str) -> Result<Classification, PipelineError> {
        if email.trim().is_empty() {
            debug!("Empty email — using fallback classification");
            return Ok(Classification::fallback(EMPTY_INPUT_CONFIDENCE));
        }

        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompts::build_classification_prompt(email)),
        ])
        .with_temperature(CLASSIFY_TEMPERATURE)
        .with_max_tokens(CLASSIFY_MAX_TOKENS);

        let response = self.generator.complete(request).await.map_err(|e| {
            PipelineError::Classification(format!("text generation failed: {e}"))
        })?;

        match self.mode {
            ClassificationMode::Fixed => {
                // The generator ran but its output is intentionally unused.
                debug!("Fixed classification mode — discarding generator output");
                Ok(Classification::fallback(FALLBACK_CONFIDENCE))
            }
            ClassificationMode::Parsed => {
                parse_classification(&response.content).map_err(|e| {
                    warn!(
                        raw_response = %response.content,
                        error = %e,
                        "Failed to parse classification response"
                    );
                    PipelineError::Classification(format!("parse failed: {e}"))
                })
            }
        }
    }
}

// ── Response parsing ────────────────────────────────────────────────

/// Raw LLM classification response.
#[derive(Debug, serde::Deserialize)]
struct ClassificationResponse {
    query_type: String,
    #[serde(default)]
    confidence: f32,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default, alias = "requires_database_lookup")]
    requires_lookup: bool,
    #[serde(default)]
    reasoning: String,
}

/// Parse the LLM output into a `Classification`.
fn parse_classification(raw: &str) -> Result<Classification, String> {
    let json_str = extract_json_object(raw);
    let response: ClassificationResponse =
        serde_json::from_str(&json_str).map_err(|e| format!("JSON parse error: {e}"))?;

    let query_type = QueryType::from_str(&response.query_type)?;

    Ok(Classification {
        query_type,
        confidence: response.confidence.clamp(0.0, 1.0),
        keywords: response.keywords,
        requires_lookup: response.requires_lookup,
        reasoning: if response.reasoning.is_empty() {
            format!("Classified as {query_type}")
        } else {
            response.reasoning
        },
    })
}

/// Extract a JSON object from LLM output (handles markdown wrapping).
fn extract_json_object(text: &str) -> String {
    let trimmed = text.trim();

    // Already a JSON object
    if trimmed.starts_with('{') {
        return trimmed.to_string();
    }

    // Wrapped in a markdown code block
    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        if let Some(end) = after.find("```") {
            let inner = after[..end].trim();
            if inner.starts_with('{') {
                return inner.to_string();
            }
        }
    }

    // Try to find object bounds
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && end > start
    {
        return trimmed[start..=end].to_string();
    }

    trimmed.to_string()
}
