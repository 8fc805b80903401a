//! `PolicyStore` trait — read-only lookup of policy and product facts.
//!
//! Backend-agnostic so pipelines and tests can run against libSQL or mock
//! stores interchangeably. Implementations never write from this interface.

use async_trait::async_trait;

use crate::error::DatabaseError;
use crate::store::model::{
    DamageProtocol, OrderRecord, PolicyRecord, ProductRecord, RefundRecord, ReturnabilityRecord,
};

/// Read-only policy and product lookups.
#[async_trait]
pub trait PolicyStore: Send + Sync {
    /// Get the return policy for a category, the store default when no
    /// category is given or no category row matches.
    async fn get_return_policy(
        &self,
        category: Option<&str>,
    ) -> Result<PolicyRecord, DatabaseError>;

    /// Check whether a product (by id, falling back to category policy)
    /// can be returned and under what terms.
    async fn check_returnable(
        &self,
        product_id: Option<&str>,
        category: Option<&str>,
    ) -> Result<ReturnabilityRecord, DatabaseError>;

    /// Calculate the refund for an amount given the purchase age and the
    /// item's condition.
    async fn calculate_refund(
        &self,
        amount: f64,
        days_since_purchase: i64,
        condition: &str,
    ) -> Result<RefundRecord, DatabaseError>;

    /// Get the handling protocol for a damage type.
    async fn get_damage_protocol(&self, damage_type: &str)
        -> Result<DamageProtocol, DatabaseError>;

    /// Look up a product by id, falling back to a name search.
    async fn get_product_info(
        &self,
        product_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Option<ProductRecord>, DatabaseError>;

    /// Look up an order by id.
    async fn get_order(&self, order_id: &str) -> Result<Option<OrderRecord>, DatabaseError>;
}
