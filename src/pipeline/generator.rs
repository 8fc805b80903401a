//! Response generation stage.
//!
//! Composes a single generation prompt from the email and the gathered
//! policy facts, invokes the text generator once, and wraps the raw output
//! verbatim into a structured `Reply`. The structured fields around the
//! body are fixed boilerplate — `full_text` is the canonical text.

use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::error::PipelineError;
use crate::llm::{ChatMessage, CompletionRequest, TextGenerator};
use crate::pipeline::prompts;
use crate::pipeline::retriever::RETURN_POLICY_KEY;
use crate::pipeline::types::{Reply, ReplyTone};

/// Displayable text seeded into the state when generation fails, so the
/// caller always receives something to show.
pub const GENERIC_APOLOGY: &str = "We apologize, but we are unable to generate a response to \
     your email right now. Our support team will follow up with you shortly.";

/// Policy sentence used when the context carries no return-policy entry.
const DEFAULT_POLICY_INFO: &str =
    "Standard policy: returns accepted within 30 days of purchase for a full refund.";

const GREETING: &str = "Dear Customer,";
const ACKNOWLEDGMENT: &str = "Thank you for contacting our customer service team.";
const ACTION_ITEM: &str = "Reply to this email if you need any further assistance.";
const CLOSING: &str = "Best regards,\nCustomer Service Team";

/// Response generation stage.
pub struct ResponseGenerator {
    generator: Arc<dyn TextGenerator>,
    temperature: f32,
    max_tokens: u32,
}

impl ResponseGenerator {
    pub fn new(generator: Arc<dyn TextGenerator>, temperature: f32, max_tokens: u32) -> Self {
        Self {
            generator,
            temperature,
            max_tokens,
        }
    }

    /// Generate a reply for an email given the context bundle.
    pub async fn generate(
        &self,
        email: &str,
        context: &serde_json::Map<String, Value>,
    ) -> Result<Reply, PipelineError> {
        let policy_info = policy_info_string(context);
        let prompt = prompts::build_generation_prompt(email, &policy_info);

        debug!(
            model = self.generator.model_name(),
            has_policy = context.contains_key(RETURN_POLICY_KEY),
            "Generating response"
        );

        let request = CompletionRequest::new(vec![
            ChatMessage::system(prompts::SYSTEM_PROMPT),
            ChatMessage::user(prompt),
        ])
        .with_temperature(self.temperature)
        .with_max_tokens(self.max_tokens);

        let response = self
            .generator
            .complete(request)
            .await
            .map_err(|e| PipelineError::Generation(format!("text generation failed: {e}")))?;

        // The raw text is the reply; the structured fields are boilerplate
        // decomposition for display.
        Ok(Reply {
            greeting: GREETING.to_string(),
            acknowledgment: ACKNOWLEDGMENT.to_string(),
            main_text: response.content.clone(),
            action_items: vec![ACTION_ITEM.to_string()],
            closing: CLOSING.to_string(),
            tone: ReplyTone::Friendly,
            full_text: response.content,
        })
    }
}

/// Serialize the context's return-policy entry into the prompt's policy-info
/// string, or fall back to the fixed default sentence.
fn policy_info_string(context: &serde_json::Map<String, Value>) -> String {
    match context.get(RETURN_POLICY_KEY) {
        Some(policy) => policy.to_string(),
        None => DEFAULT_POLICY_INFO.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{CompletionResponse, FinishReason};
    use std::sync::Mutex;

    /// Mock generator that records the last prompt it saw.
    struct RecordingGenerator {
        response: Result<String, String>,
        last_prompt: Mutex<Option<String>>,
    }

    impl RecordingGenerator {
        fn returning(response: &str) -> Self {
            Self {
                response: Ok(response.to_string()),
                last_prompt: Mutex::new(None),
            }
        }

        fn failing(message: &str) -> Self {
            Self {
                response: Err(message.to_string()),
                last_prompt: Mutex::new(None),
            }
        }

        fn last_prompt(&self) -> String {
            self.last_prompt.lock().unwrap().clone().unwrap_or_default()
        }
    }

    #[async_trait::async_trait]
    impl TextGenerator for RecordingGenerator {
        fn model_name(&self) -> &str {
            "mock"
        }

        async fn complete(
            &self,
            request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            let user_prompt = request
                .messages
                .iter()
                .rev()
                .find(|m| matches!(m.role, crate::llm::Role::User))
                .map(|m| m.content.clone());
            *self.last_prompt.lock().unwrap() = user_prompt;

            match &self.response {
                Ok(content) => Ok(CompletionResponse {
                    content: content.clone(),
                    input_tokens: 100,
                    output_tokens: 80,
                    finish_reason: FinishReason::Stop,
                }),
                Err(message) => Err(LlmError::RequestFailed {
                    provider: "mock".to_string(),
                    reason: message.clone(),
                }),
            }
        }
    }

    fn context_with_policy() -> serde_json::Map<String, Value> {
        let mut context = serde_json::Map::new();
        context.insert(
            RETURN_POLICY_KEY.to_string(),
            serde_json::json!({"days_allowed": 30, "refund_percentage": 100}),
        );
        context
    }

    #[tokio::test]
    async fn wraps_raw_output_verbatim() {
        let raw_reply = "  We'd be happy to help with your return.\n";
        let generator = Arc::new(RecordingGenerator::returning(raw_reply));
        let stage = ResponseGenerator::new(generator, 0.3, 500);

        let reply = stage
            .generate("I want to return my laptop", &context_with_policy())
            .await
            .unwrap();

        // Verbatim in both fields, untrimmed.
        assert_eq!(reply.main_text, raw_reply);
        assert_eq!(reply.full_text, raw_reply);
        assert_eq!(reply.tone, ReplyTone::Friendly);
        assert!(!reply.greeting.is_empty());
        assert_eq!(reply.action_items.len(), 1);
    }

    #[tokio::test]
    async fn prompt_embeds_email_and_policy_facts() {
        let generator = Arc::new(RecordingGenerator::returning("ok"));
        let stage = ResponseGenerator::new(generator.clone(), 0.3, 500);

        stage
            .generate("Where is my refund?", &context_with_policy())
            .await
            .unwrap();

        let prompt = generator.last_prompt();
        assert!(prompt.contains("Where is my refund?"));
        assert!(prompt.contains("days_allowed"));
    }

    #[tokio::test]
    async fn empty_context_uses_default_policy_sentence() {
        let generator = Arc::new(RecordingGenerator::returning("ok"));
        let stage = ResponseGenerator::new(generator.clone(), 0.3, 500);

        stage
            .generate("Hello", &serde_json::Map::new())
            .await
            .unwrap();

        assert!(generator.last_prompt().contains("returns accepted within 30 days"));
    }

    #[tokio::test]
    async fn generation_failure_propagates() {
        let generator = Arc::new(RecordingGenerator::failing("quota exhausted"));
        let stage = ResponseGenerator::new(generator, 0.3, 500);

        let err = stage
            .generate("Hello", &serde_json::Map::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("quota exhausted"));
    }

    #[test]
    fn policy_info_prefers_context_entry() {
        let info = policy_info_string(&context_with_policy());
        assert!(info.contains("days_allowed"));

        let fallback = policy_info_string(&serde_json::Map::new());
        assert_eq!(fallback, DEFAULT_POLICY_INFO);
    }
}
