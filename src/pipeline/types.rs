//! Shared types for the email-processing pipeline.

use serde::{Deserialize, Serialize};

// ── Classification ──────────────────────────────────────────────────

/// Category of customer intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryType {
    ProductReturn,
    RefundRequest,
    ProductDamage,
    DeliveryIssue,
    ProductInquiry,
    WarrantyClaim,
    General,
    Other,
}

impl std::fmt::Display for QueryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::ProductReturn => "product_return",
            Self::RefundRequest => "refund_request",
            Self::ProductDamage => "product_damage",
            Self::DeliveryIssue => "delivery_issue",
            Self::ProductInquiry => "product_inquiry",
            Self::WarrantyClaim => "warranty_claim",
            Self::General => "general",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for QueryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "product_return" => Ok(Self::ProductReturn),
            "refund_request" => Ok(Self::RefundRequest),
            "product_damage" => Ok(Self::ProductDamage),
            "delivery_issue" => Ok(Self::DeliveryIssue),
            "product_inquiry" => Ok(Self::ProductInquiry),
            "warranty_claim" => Ok(Self::WarrantyClaim),
            "general" => Ok(Self::General),
            "other" => Ok(Self::Other),
            _ => Err(format!("Unknown query type: '{s}'")),
        }
    }
}

/// Classification of an inbound email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Classification {
    pub query_type: QueryType,
    /// Classification confidence in [0, 1].
    pub confidence: f32,
    /// Key phrases that drove the classification.
    pub keywords: Vec<String>,
    /// Whether the pipeline should fetch policy facts before generating.
    #[serde(alias = "requires_database_lookup")]
    pub requires_lookup: bool,
    /// Brief explanation of the chosen category.
    pub reasoning: String,
}

impl Classification {
    /// The fixed fallback classification: a general inquiry that needs no
    /// store lookup.
    pub fn fallback(confidence: f32) -> Self {
        Self {
            query_type: QueryType::General,
            confidence,
            keywords: Vec::new(),
            requires_lookup: false,
            reasoning: "Fallback classification — treating as a general inquiry".to_string(),
        }
    }
}

// ── Reply ───────────────────────────────────────────────────────────

/// Tone of a generated reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyTone {
    Formal,
    Friendly,
    Empathetic,
}

/// A generated customer-service reply.
///
/// `full_text` is the canonical text returned to the caller; the other
/// fields are a structured decomposition for display only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub greeting: String,
    pub acknowledgment: String,
    pub main_text: String,
    pub action_items: Vec<String>,
    pub closing: String,
    pub tone: ReplyTone,
    pub full_text: String,
}

// ── Validation ──────────────────────────────────────────────────────

/// Structural verdict on a generated reply.
///
/// `is_valid` is false whenever a hard-fail rule fired; suggestions are
/// soft and never force invalidity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationVerdict {
    pub is_valid: bool,
    pub issues: Vec<String>,
    pub suggestions: Vec<String>,
    pub confidence_score: f32,
}

// ── Processing state ────────────────────────────────────────────────

/// Mutable record carried through one pipeline run.
///
/// Created fresh per inbound request, owned exclusively by the orchestrator,
/// and discarded after the terminal result is extracted. Once `error` is
/// set, no stage mutates business fields again.
#[derive(Debug)]
pub struct ProcessingState {
    pub email_content: String,
    pub classification: Option<Classification>,
    /// Policy/product facts gathered for this request.
    pub context: serde_json::Map<String, serde_json::Value>,
    pub generated_reply: Option<Reply>,
    pub validation: Option<ValidationVerdict>,
    pub final_text: Option<String>,
    pub error: Option<String>,
}

impl ProcessingState {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email_content: email.into(),
            classification: None,
            context: serde_json::Map::new(),
            generated_reply: None,
            validation: None,
            final_text: None,
            error: None,
        }
    }
}

// ── Stage machine ───────────────────────────────────────────────────

/// Pipeline stages. `Done` and `Failed` are terminal; `Failed` is absorbing
/// and reachable from any stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Start,
    Classified,
    ContextRetrieved,
    Generated,
    Validated,
    Done,
    Failed,
}

impl Stage {
    /// Short label for logging.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Classified => "classified",
            Self::ContextRetrieved => "context_retrieved",
            Self::Generated => "generated",
            Self::Validated => "validated",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

// ── Terminal result ─────────────────────────────────────────────────

/// Terminal result of one pipeline run.
///
/// `success` is true iff the machine reached `Done`. `response_text` holds
/// the reply text, or the generic fallback text when generation failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationVerdict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn query_type_round_trips_through_display() {
        for qt in [
            QueryType::ProductReturn,
            QueryType::RefundRequest,
            QueryType::ProductDamage,
            QueryType::DeliveryIssue,
            QueryType::ProductInquiry,
            QueryType::WarrantyClaim,
            QueryType::General,
            QueryType::Other,
        ] {
            assert_eq!(QueryType::from_str(&qt.to_string()), Ok(qt));
        }
    }

    #[test]
    fn query_type_unknown_fails() {
        assert!(QueryType::from_str("escalation").is_err());
    }

    #[test]
    fn query_type_serde_uses_snake_case() {
        let json = serde_json::to_value(QueryType::ProductReturn).unwrap();
        assert_eq!(json, serde_json::json!("product_return"));
    }

    #[test]
    fn classification_accepts_original_field_name() {
        let raw = r#"{
            "query_type": "refund_request",
            "confidence": 0.8,
            "keywords": ["refund"],
            "requires_database_lookup": true,
            "reasoning": "asks for money back"
        }"#;
        let classification: Classification = serde_json::from_str(raw).unwrap();
        assert!(classification.requires_lookup);
        assert_eq!(classification.query_type, QueryType::RefundRequest);
    }

    #[test]
    fn fallback_classification_needs_no_lookup() {
        let fallback = Classification::fallback(0.5);
        assert_eq!(fallback.query_type, QueryType::General);
        assert!(!fallback.requires_lookup);
        assert!((fallback.confidence - 0.5).abs() < 1e-6);
        assert!(fallback.keywords.is_empty());
    }

    #[test]
    fn fresh_state_has_no_stage_outputs() {
        let state = ProcessingState::new("hello");
        assert_eq!(state.email_content, "hello");
        assert!(state.classification.is_none());
        assert!(state.context.is_empty());
        assert!(state.generated_reply.is_none());
        assert!(state.validation.is_none());
        assert!(state.final_text.is_none());
        assert!(state.error.is_none());
    }

    #[test]
    fn terminal_stages() {
        assert!(Stage::Done.is_terminal());
        assert!(Stage::Failed.is_terminal());
        for stage in [
            Stage::Start,
            Stage::Classified,
            Stage::ContextRetrieved,
            Stage::Generated,
            Stage::Validated,
        ] {
            assert!(!stage.is_terminal(), "{} should not be terminal", stage.label());
        }
    }

    #[test]
    fn result_omits_absent_fields() {
        let result = PipelineResult {
            success: false,
            response_text: None,
            classification: None,
            validation: None,
            error: Some("boom".into()),
        };
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("response_text").is_none());
        assert!(json.get("validation").is_none());
        assert_eq!(json["error"], "boom");
    }
}
