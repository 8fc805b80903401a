//! Pipeline orchestrator — a tagged-stage state machine.
//!
//! Sequences classification → conditional context retrieval → response
//! generation → validation over a single exclusively-owned
//! `ProcessingState`. Work happens on stage transitions; `Done` and
//! `Failed` are terminal, and `Failed` is absorbing — once `error` is set
//! no stage mutates business fields again.
//!
//! Edges:
//! - `Start → Classified`, or `Failed` on a classification error
//! - `Classified → ContextRetrieved` iff `requires_lookup`, else straight
//!   to `Generated` (the flag is the gate; retrieval itself cannot fail)
//! - `ContextRetrieved → Generated`, or `Failed` on a generation error
//!   (with the generic apology seeded as displayable text)
//! - `Generated → Validated` (the verdict never fails the run)
//! - `Validated → Done`

use std::sync::Arc;

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::llm::TextGenerator;
use crate::pipeline::classifier::{ClassificationMode, EmailClassifier};
use crate::pipeline::generator::{GENERIC_APOLOGY, ResponseGenerator};
use crate::pipeline::retriever::ContextRetriever;
use crate::pipeline::types::{PipelineResult, ProcessingState, Stage};
use crate::pipeline::validator::ResponseValidator;
use crate::store::traits::PolicyStore;

/// Stage-construction settings.
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub classification_mode: ClassificationMode,
    /// Sampling temperature for the generation stage.
    pub temperature: f32,
    /// Token cap for the generation stage.
    pub max_tokens: u32,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            classification_mode: ClassificationMode::Fixed,
            temperature: 0.3,
            max_tokens: 500,
        }
    }
}

/// The email-processing pipeline.
///
/// Holds its collaborators behind trait handles, injected at construction —
/// tests swap in mock stores and generators.
pub struct Pipeline {
    classifier: EmailClassifier,
    retriever: ContextRetriever,
    generator: ResponseGenerator,
    validator: ResponseValidator,
}

impl Pipeline {
    pub fn new(
        store: Arc<dyn PolicyStore>,
        text_generator: Arc<dyn TextGenerator>,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            classifier: EmailClassifier::new(
                Arc::clone(&text_generator),
                settings.classification_mode,
            ),
            retriever: ContextRetriever::new(store),
            generator: ResponseGenerator::new(
                text_generator,
                settings.temperature,
                settings.max_tokens,
            ),
            validator: ResponseValidator::new(),
        }
    }

    /// Run one email through the pipeline to a terminal result.
    ///
    /// Always terminates: every transition either advances toward `Done` or
    /// drops into `Failed`, and no edge loops back.
    pub async fn run(&self, email: &str) -> PipelineResult {
        let run_id = Uuid::new_v4();
        let mut state = ProcessingState::new(email);
        let mut stage = Stage::Start;

        info!(%run_id, email_chars = email.chars().count(), "Processing inbound email");

        while !stage.is_terminal() {
            let next = self.advance(stage, &mut state).await;
            debug!(%run_id, from = stage.label(), to = next.label(), "Stage transition");
            stage = next;
        }

        let success = stage == Stage::Done;
        if success {
            info!(%run_id, "Pipeline finished");
        } else {
            warn!(%run_id, error = state.error.as_deref().unwrap_or("unknown"), "Pipeline failed");
        }

        PipelineResult {
            success,
            response_text: state.final_text.take(),
            classification: state.classification.take(),
            validation: state.validation.take(),
            error: state.error.take(),
        }
    }

    /// Transition function — runs the work on the edge out of `stage` and
    /// returns the next stage.
    async fn advance(&self, stage: Stage, state: &mut ProcessingState) -> Stage {
        match stage {
            Stage::Start => match self.classifier.classify(&state.email_content).await {
                Ok(classification) => {
                    debug!(
                        query_type = %classification.query_type,
                        requires_lookup = classification.requires_lookup,
                        "Email classified"
                    );
                    state.classification = Some(classification);
                    Stage::Classified
                }
                Err(e) => {
                    state.error = Some(e.to_string());
                    Stage::Failed
                }
            },

            Stage::Classified => {
                // The lookup flag is the gate into retrieval, independent of
                // the query type.
                match &state.classification {
                    Some(classification) if classification.requires_lookup => {
                        state.context = self.retriever.retrieve(classification).await;
                        Stage::ContextRetrieved
                    }
                    _ => self.generate(state).await,
                }
            }

            Stage::ContextRetrieved => self.generate(state).await,

            Stage::Generated => match &state.generated_reply {
                Some(reply) => {
                    state.validation = Some(self.validator.validate(reply));
                    Stage::Validated
                }
                None => {
                    // Unreachable by construction — the only edge into
                    // `Generated` stores a reply first.
                    state.error = Some("generated stage reached without a reply".to_string());
                    Stage::Failed
                }
            },

            Stage::Validated => Stage::Done,

            Stage::Done | Stage::Failed => stage,
        }
    }

    /// Shared generation edge: `Classified → Generated` (lookup skipped)
    /// and `ContextRetrieved → Generated`.
    async fn generate(&self, state: &mut ProcessingState) -> Stage {
        match self
            .generator
            .generate(&state.email_content, &state.context)
            .await
        {
            Ok(reply) => {
                state.final_text = Some(reply.full_text.clone());
                state.generated_reply = Some(reply);
                Stage::Generated
            }
            Err(e) => {
                // The caller still gets displayable text on failure.
                state.error = Some(e.to_string());
                state.final_text = Some(GENERIC_APOLOGY.to_string());
                Stage::Failed
            }
        }
    }
}
