//! Policy-store record types.
//!
//! These are the facts the context retriever bundles for the response
//! generator, plus the built-in defaults used when a lookup fails —
//! partial context is preferable to pipeline failure.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default return window in days.
pub const DEFAULT_RETURN_DAYS: u32 = 30;

/// Default refund percentage.
pub const DEFAULT_REFUND_PERCENTAGE: u32 = 100;

/// A return/refund policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub policy_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub days_allowed: u32,
    pub conditions: Vec<String>,
    pub refund_percentage: u32,
    pub details: String,
}

impl PolicyRecord {
    /// The built-in fallback return policy: 30-day window, full refund,
    /// standard conditions.
    pub fn default_return() -> Self {
        Self {
            policy_type: "return".to_string(),
            category: None,
            days_allowed: DEFAULT_RETURN_DAYS,
            conditions: vec![
                "Product must be in original condition".to_string(),
                "Proof of purchase required".to_string(),
            ],
            refund_percentage: DEFAULT_REFUND_PERCENTAGE,
            details: format!(
                "Standard return policy: full refund within {DEFAULT_RETURN_DAYS} days of purchase."
            ),
        }
    }
}

/// Whether (and under what terms) a product can be returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReturnabilityRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub returnable: bool,
    pub return_window_days: u32,
    pub conditions: Vec<String>,
    pub restocking_fee: f64,
}

/// Outcome of a refund calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundRecord {
    pub eligible: bool,
    pub refund_percentage: u32,
    pub refund_amount: f64,
    pub processing_days: u32,
    pub method: String,
    pub reason: String,
}

/// Handling protocol for damaged products.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageProtocol {
    pub damage_type: String,
    pub steps: Vec<String>,
    pub requires_photo_evidence: bool,
    pub replacement_eligible: bool,
    pub response_hours: u32,
}

impl DamageProtocol {
    /// Built-in fallback protocol used when no row matches.
    pub fn default_protocol() -> Self {
        Self {
            damage_type: "general".to_string(),
            steps: vec![
                "Request photos of the damage".to_string(),
                "Verify the order and purchase date".to_string(),
                "Offer replacement or refund".to_string(),
            ],
            requires_photo_evidence: true,
            replacement_eligible: true,
            response_hours: 48,
        }
    }
}

/// A product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRecord {
    pub product_id: String,
    pub name: String,
    pub category: String,
    pub price: f64,
    pub warranty_months: u32,
    pub returnable: bool,
    pub return_window: u32,
    pub return_conditions: Vec<String>,
    pub restocking_fee: f64,
}

/// A customer order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRecord {
    pub order_id: String,
    pub customer_email: String,
    pub product_id: String,
    pub order_date: DateTime<Utc>,
    pub amount: f64,
    pub status: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_return_policy_constants() {
        let policy = PolicyRecord::default_return();
        assert_eq!(policy.days_allowed, 30);
        assert_eq!(policy.refund_percentage, 100);
        assert_eq!(policy.policy_type, "return");
        assert!(!policy.conditions.is_empty());
    }

    #[test]
    fn default_damage_protocol_requires_evidence() {
        let protocol = DamageProtocol::default_protocol();
        assert_eq!(protocol.damage_type, "general");
        assert!(protocol.requires_photo_evidence);
        assert!(protocol.replacement_eligible);
    }

    #[test]
    fn policy_serializes_without_empty_category() {
        let policy = PolicyRecord::default_return();
        let json = serde_json::to_value(&policy).unwrap();
        assert!(json.get("category").is_none());
        assert_eq!(json["days_allowed"], 30);
    }
}
