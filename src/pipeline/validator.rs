//! Response validation stage.
//!
//! Structural checks over a generated reply. Hard-fail rules (body length,
//! missing greeting) force `is_valid = false`; suggestions are soft and
//! only annotate the verdict. Validation never fails the pipeline — the
//! verdict is attached to the result either way.

use crate::pipeline::types::{Reply, ValidationVerdict};

/// Minimum reply-body length (characters) for baseline validity.
const MIN_BODY_CHARS: usize = 50;

/// Placeholder confidence — constant regardless of which rules fired.
const VALIDATION_CONFIDENCE: f32 = 0.9;

/// Response validation stage.
pub struct ResponseValidator;

impl ResponseValidator {
    pub fn new() -> Self {
        Self
    }

    /// Apply the structural rules, in order, to a generated reply.
    pub fn validate(&self, reply: &Reply) -> ValidationVerdict {
        let mut issues = Vec::new();
        let mut suggestions = Vec::new();

        // Rule 1: a usable reply body is longer than 50 characters.
        let mut is_valid = reply.full_text.chars().count() > MIN_BODY_CHARS;
        if !is_valid {
            issues.push("Response body too short".to_string());
        }

        // Rule 2: a greeting is required.
        if reply.greeting.is_empty() {
            issues.push("Missing greeting".to_string());
            is_valid = false;
        }

        // Rule 3: action items are recommended, not required.
        if reply.action_items.is_empty() {
            suggestions.push("Add clear next steps for customer".to_string());
        }

        ValidationVerdict {
            is_valid,
            issues,
            suggestions,
            confidence_score: VALIDATION_CONFIDENCE,
        }
    }
}

impl Default for ResponseValidator {
    fn default() -> Self {
        Self::new()
    }
}
