//! Email-processing pipeline: classification → conditional context
//! retrieval → response generation → validation.

pub mod classifier;
pub mod generator;
pub mod orchestrator;
pub mod prompts;
pub mod retriever;
pub mod types;
pub mod validator;

pub use classifier::{ClassificationMode, EmailClassifier};
pub use generator::{GENERIC_APOLOGY, ResponseGenerator};
pub use orchestrator::{Pipeline, PipelineSettings};
pub use retriever::ContextRetriever;
pub use types::{
    Classification, PipelineResult, ProcessingState, QueryType, Reply, ReplyTone, Stage,
    ValidationVerdict,
};
pub use validator::ResponseValidator;
