//! Context retrieval stage.
//!
//! Decides which policy-store lookups to make from the classified query
//! type and assembles the context bundle for generation. The orchestrator
//! only invokes this stage when `requires_lookup` is set — the flag is the
//! gate, the query type just picks the facts.
//!
//! Store failures are absorbed here: a request with default policy facts
//! beats a failed request, so lookups fall back to the built-in defaults
//! instead of propagating.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::pipeline::types::{Classification, QueryType};
use crate::store::model::{DamageProtocol, PolicyRecord};
use crate::store::traits::PolicyStore;

/// Context key for return-policy facts.
pub const RETURN_POLICY_KEY: &str = "return_policy";

/// Context key for damage-protocol facts.
pub const DAMAGE_PROTOCOL_KEY: &str = "damage_protocol";

/// Context retrieval stage — zero or more read-only store lookups.
pub struct ContextRetriever {
    store: Arc<dyn PolicyStore>,
}

impl ContextRetriever {
    pub fn new(store: Arc<dyn PolicyStore>) -> Self {
        Self { store }
    }

    /// Assemble the context bundle for a classification. Infallible — store
    /// errors degrade to built-in default facts.
    pub async fn retrieve(
        &self,
        classification: &Classification,
    ) -> serde_json::Map<String, Value> {
        let mut context = serde_json::Map::new();

        match classification.query_type {
            QueryType::ProductReturn | QueryType::RefundRequest => {
                let policy = match self.store.get_return_policy(None).await {
                    Ok(policy) => policy,
                    Err(e) => {
                        warn!(error = %e, "Return-policy lookup failed — using default policy");
                        PolicyRecord::default_return()
                    }
                };
                context.insert(
                    RETURN_POLICY_KEY.to_string(),
                    serde_json::to_value(policy).unwrap_or(Value::Null),
                );
            }
            QueryType::ProductDamage => {
                let protocol = match self.store.get_damage_protocol("general").await {
                    Ok(protocol) => protocol,
                    Err(e) => {
                        warn!(error = %e, "Damage-protocol lookup failed — using default protocol");
                        DamageProtocol::default_protocol()
                    }
                };
                context.insert(
                    DAMAGE_PROTOCOL_KEY.to_string(),
                    serde_json::to_value(protocol).unwrap_or(Value::Null),
                );
            }
            _ => {
                debug!(
                    query_type = %classification.query_type,
                    "Query type needs no policy facts"
                );
            }
        }

        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatabaseError;
    use crate::pipeline::types::Classification;
    use crate::store::model::{
        OrderRecord, ProductRecord, RefundRecord, ReturnabilityRecord,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Mock store that counts lookups and can be switched to fail.
    struct MockStore {
        fail: bool,
        policy_calls: AtomicUsize,
        protocol_calls: AtomicUsize,
    }

    impl MockStore {
        fn healthy() -> Self {
            Self {
                fail: false,
                policy_calls: AtomicUsize::new(0),
                protocol_calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                policy_calls: AtomicUsize::new(0),
                protocol_calls: AtomicUsize::new(0),
            }
        }

        fn total_calls(&self) -> usize {
            self.policy_calls.load(Ordering::SeqCst) + self.protocol_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl PolicyStore for MockStore {
        async fn get_return_policy(
            &self,
            _category: Option<&str>,
        ) -> Result<PolicyRecord, DatabaseError> {
            self.policy_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DatabaseError::Query("store offline".into()));
            }
            let mut policy = PolicyRecord::default_return();
            policy.details = "14-day express returns".to_string();
            policy.days_allowed = 14;
            Ok(policy)
        }

        async fn check_returnable(
            &self,
            _product_id: Option<&str>,
            _category: Option<&str>,
        ) -> Result<ReturnabilityRecord, DatabaseError> {
            unimplemented!("not used by the retriever")
        }

        async fn calculate_refund(
            &self,
            _amount: f64,
            _days_since_purchase: i64,
            _condition: &str,
        ) -> Result<RefundRecord, DatabaseError> {
            unimplemented!("not used by the retriever")
        }

        async fn get_damage_protocol(
            &self,
            _damage_type: &str,
        ) -> Result<DamageProtocol, DatabaseError> {
            self.protocol_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DatabaseError::Query("store offline".into()));
            }
            Ok(DamageProtocol::default_protocol())
        }

        async fn get_product_info(
            &self,
            _product_id: Option<&str>,
            _name: Option<&str>,
        ) -> Result<Option<ProductRecord>, DatabaseError> {
            unimplemented!("not used by the retriever")
        }

        async fn get_order(
            &self,
            _order_id: &str,
        ) -> Result<Option<OrderRecord>, DatabaseError> {
            unimplemented!("not used by the retriever")
        }
    }

    fn classification_for(query_type: QueryType) -> Classification {
        Classification {
            query_type,
            confidence: 0.9,
            keywords: vec![],
            requires_lookup: true,
            reasoning: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn return_query_fetches_return_policy() {
        let store = Arc::new(MockStore::healthy());
        let retriever = ContextRetriever::new(store.clone());

        let context = retriever
            .retrieve(&classification_for(QueryType::ProductReturn))
            .await;

        assert!(context.contains_key(RETURN_POLICY_KEY));
        assert_eq!(context[RETURN_POLICY_KEY]["days_allowed"], 14);
        assert_eq!(store.policy_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn refund_query_fetches_return_policy() {
        let store = Arc::new(MockStore::healthy());
        let retriever = ContextRetriever::new(store.clone());

        let context = retriever
            .retrieve(&classification_for(QueryType::RefundRequest))
            .await;

        assert!(context.contains_key(RETURN_POLICY_KEY));
        assert!(!context.contains_key(DAMAGE_PROTOCOL_KEY));
    }

    #[tokio::test]
    async fn damage_query_fetches_protocol() {
        let store = Arc::new(MockStore::healthy());
        let retriever = ContextRetriever::new(store.clone());

        let context = retriever
            .retrieve(&classification_for(QueryType::ProductDamage))
            .await;

        assert!(context.contains_key(DAMAGE_PROTOCOL_KEY));
        assert!(!context.contains_key(RETURN_POLICY_KEY));
        assert_eq!(store.protocol_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn other_query_types_make_no_lookups() {
        let store = Arc::new(MockStore::healthy());
        let retriever = ContextRetriever::new(store.clone());

        for query_type in [
            QueryType::DeliveryIssue,
            QueryType::ProductInquiry,
            QueryType::WarrantyClaim,
            QueryType::General,
            QueryType::Other,
        ] {
            let context = retriever.retrieve(&classification_for(query_type)).await;
            assert!(context.is_empty(), "{query_type} should yield empty context");
        }
        assert_eq!(store.total_calls(), 0);
    }

    #[tokio::test]
    async fn store_failure_falls_back_to_default_policy() {
        let store = Arc::new(MockStore::failing());
        let retriever = ContextRetriever::new(store);

        let context = retriever
            .retrieve(&classification_for(QueryType::ProductReturn))
            .await;

        // The bundle still carries a policy — the built-in default.
        assert_eq!(context[RETURN_POLICY_KEY]["days_allowed"], 30);
        assert_eq!(context[RETURN_POLICY_KEY]["refund_percentage"], 100);
    }

    #[tokio::test]
    async fn store_failure_falls_back_to_default_protocol() {
        let store = Arc::new(MockStore::failing());
        let retriever = ContextRetriever::new(store);

        let context = retriever
            .retrieve(&classification_for(QueryType::ProductDamage))
            .await;

        assert_eq!(context[DAMAGE_PROTOCOL_KEY]["damage_type"], "general");
    }
}
