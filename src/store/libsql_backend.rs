//! libSQL backend — async `PolicyStore` implementation.
//!
//! Supports local file and in-memory databases. List-valued columns
//! (conditions, protocol steps) are stored as JSON text.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::info;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::model::{
    DamageProtocol, OrderRecord, PolicyRecord, ProductRecord, RefundRecord, ReturnabilityRecord,
};
use crate::store::seed;
use crate::store::traits::PolicyStore;

/// Fallback refund processing terms when no refund policy row exists.
const DEFAULT_PROCESSING_DAYS: u32 = 5;
const DEFAULT_REFUND_METHOD: &str = "original_payment";

/// libSQL policy store.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;
        info!(path = %path.display(), "Policy database opened");

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        migrations::run_migrations(&conn).await?;

        Ok(Self {
            db: Arc::new(db),
            conn,
        })
    }

    /// Seed the default catalog/policies if the store is empty.
    pub async fn seed_defaults(&self) -> Result<usize, DatabaseError> {
        seed::seed_store(&self.conn).await
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

fn query_err(e: libsql::Error) -> DatabaseError {
    DatabaseError::Query(e.to_string())
}

/// Parse a JSON list column into strings. Malformed data yields an empty
/// list rather than failing the lookup.
fn parse_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Map a policies row to a `PolicyRecord`.
///
/// Column order: 0:policy_type, 1:category, 2:days_allowed, 3:conditions,
/// 4:refund_percentage, 5:details
fn row_to_policy(row: &libsql::Row) -> Result<PolicyRecord, libsql::Error> {
    let policy_type: String = row.get(0)?;
    let category: Option<String> = row.get(1).ok();
    let days_allowed: i64 = row.get(2)?;
    let conditions: String = row.get(3)?;
    let refund_percentage: i64 = row.get(4)?;
    let details: String = row.get(5)?;

    Ok(PolicyRecord {
        policy_type,
        category,
        days_allowed: days_allowed.max(0) as u32,
        conditions: parse_list(&conditions),
        refund_percentage: refund_percentage.max(0) as u32,
        details,
    })
}

/// Map a products row to a `ProductRecord`.
///
/// Column order: 0:product_id, 1:name, 2:category, 3:price,
/// 4:warranty_months, 5:returnable, 6:return_window, 7:return_conditions,
/// 8:restocking_fee
fn row_to_product(row: &libsql::Row) -> Result<ProductRecord, libsql::Error> {
    let product_id: String = row.get(0)?;
    let name: String = row.get(1)?;
    let category: String = row.get(2)?;
    let price: f64 = row.get(3)?;
    let warranty_months: i64 = row.get(4)?;
    let returnable: i64 = row.get(5)?;
    let return_window: i64 = row.get(6)?;
    let return_conditions: String = row.get(7)?;
    let restocking_fee: f64 = row.get(8)?;

    Ok(ProductRecord {
        product_id,
        name,
        category,
        price,
        warranty_months: warranty_months.max(0) as u32,
        returnable: returnable != 0,
        return_window: return_window.max(0) as u32,
        return_conditions: parse_list(&return_conditions),
        restocking_fee,
    })
}

const POLICY_COLUMNS: &str =
    "policy_type, category, days_allowed, conditions, refund_percentage, details";

const PRODUCT_COLUMNS: &str = "product_id, name, category, price, warranty_months, returnable, \
     return_window, return_conditions, restocking_fee";

/// Refund percentage modifier based on the item's reported condition.
fn condition_modifier(condition: &str) -> f64 {
    match condition.to_lowercase().as_str() {
        "new" | "unopened" | "unused" => 1.0,
        "damaged" | "defective" => 0.5,
        _ => 0.8,
    }
}

#[async_trait]
impl PolicyStore for LibSqlStore {
    async fn get_return_policy(
        &self,
        category: Option<&str>,
    ) -> Result<PolicyRecord, DatabaseError> {
        if let Some(category) = category {
            let mut rows = self
                .conn()
                .query(
                    &format!(
                        "SELECT {POLICY_COLUMNS} FROM policies \
                         WHERE policy_type = 'return' AND category = ?1"
                    ),
                    params![category],
                )
                .await
                .map_err(query_err)?;

            if let Some(row) = rows.next().await.map_err(query_err)? {
                return row_to_policy(&row).map_err(query_err);
            }
        }

        // No category given, or no category-specific row — the store's
        // first return policy is its default.
        let mut rows = self
            .conn()
            .query(
                &format!(
                    "SELECT {POLICY_COLUMNS} FROM policies \
                     WHERE policy_type = 'return' ORDER BY id LIMIT 1"
                ),
                (),
            )
            .await
            .map_err(query_err)?;

        match rows.next().await.map_err(query_err)? {
            Some(row) => row_to_policy(&row).map_err(query_err),
            None => Ok(PolicyRecord::default_return()),
        }
    }

    async fn check_returnable(
        &self,
        product_id: Option<&str>,
        category: Option<&str>,
    ) -> Result<ReturnabilityRecord, DatabaseError> {
        if let Some(id) = product_id {
            let mut rows = self
                .conn()
                .query(
                    &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = ?1"),
                    params![id],
                )
                .await
                .map_err(query_err)?;

            if let Some(row) = rows.next().await.map_err(query_err)? {
                let product = row_to_product(&row).map_err(query_err)?;
                return Ok(ReturnabilityRecord {
                    product_id: Some(product.product_id),
                    returnable: product.returnable,
                    return_window_days: product.return_window,
                    conditions: product.return_conditions,
                    restocking_fee: product.restocking_fee,
                });
            }
        }

        // Unknown product — fall back to the category (or default) policy.
        let policy = self.get_return_policy(category).await?;
        Ok(ReturnabilityRecord {
            product_id: None,
            returnable: true,
            return_window_days: policy.days_allowed,
            conditions: policy.conditions,
            restocking_fee: 0.0,
        })
    }

    async fn calculate_refund(
        &self,
        amount: f64,
        days_since_purchase: i64,
        condition: &str,
    ) -> Result<RefundRecord, DatabaseError> {
        let policy = self.get_return_policy(None).await?;

        // Refund processing terms from the refund policy row, if any.
        let mut rows = self
            .conn()
            .query(
                "SELECT processing_days, method FROM policies \
                 WHERE policy_type = 'refund' LIMIT 1",
                (),
            )
            .await
            .map_err(query_err)?;
        let (processing_days, method) = match rows.next().await.map_err(query_err)? {
            Some(row) => {
                let days: i64 = row.get(0).unwrap_or(DEFAULT_PROCESSING_DAYS as i64);
                let method: String = row
                    .get(1)
                    .unwrap_or_else(|_| DEFAULT_REFUND_METHOD.to_string());
                (days.max(0) as u32, method)
            }
            None => (DEFAULT_PROCESSING_DAYS, DEFAULT_REFUND_METHOD.to_string()),
        };

        if days_since_purchase > policy.days_allowed as i64 {
            return Ok(RefundRecord {
                eligible: false,
                refund_percentage: 0,
                refund_amount: 0.0,
                processing_days,
                method,
                reason: format!(
                    "Purchase is outside the {}-day return window",
                    policy.days_allowed
                ),
            });
        }

        let modifier = condition_modifier(condition);
        let percentage = (policy.refund_percentage as f64 * modifier).round() as u32;
        let refund_amount = (amount * percentage as f64).round() / 100.0;

        Ok(RefundRecord {
            eligible: true,
            refund_percentage: percentage,
            refund_amount,
            processing_days,
            method,
            reason: format!("{percentage}% refund for item in {condition} condition"),
        })
    }

    async fn get_damage_protocol(
        &self,
        damage_type: &str,
    ) -> Result<DamageProtocol, DatabaseError> {
        for lookup in [damage_type, "general"] {
            let mut rows = self
                .conn()
                .query(
                    "SELECT damage_type, steps, requires_photo_evidence, \
                            replacement_eligible, response_hours \
                     FROM damage_protocols WHERE damage_type = ?1",
                    params![lookup],
                )
                .await
                .map_err(query_err)?;

            if let Some(row) = rows.next().await.map_err(query_err)? {
                let damage_type: String = row.get(0).map_err(query_err)?;
                let steps: String = row.get(1).map_err(query_err)?;
                let requires_photo: i64 = row.get(2).map_err(query_err)?;
                let replacement: i64 = row.get(3).map_err(query_err)?;
                let response_hours: i64 = row.get(4).map_err(query_err)?;

                return Ok(DamageProtocol {
                    damage_type,
                    steps: parse_list(&steps),
                    requires_photo_evidence: requires_photo != 0,
                    replacement_eligible: replacement != 0,
                    response_hours: response_hours.max(0) as u32,
                });
            }
        }

        Ok(DamageProtocol::default_protocol())
    }

    async fn get_product_info(
        &self,
        product_id: Option<&str>,
        name: Option<&str>,
    ) -> Result<Option<ProductRecord>, DatabaseError> {
        if let Some(id) = product_id {
            let mut rows = self
                .conn()
                .query(
                    &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE product_id = ?1"),
                    params![id],
                )
                .await
                .map_err(query_err)?;

            if let Some(row) = rows.next().await.map_err(query_err)? {
                return Ok(Some(row_to_product(&row).map_err(query_err)?));
            }
        }

        if let Some(name) = name {
            let pattern = format!("%{name}%");
            let mut rows = self
                .conn()
                .query(
                    &format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE name LIKE ?1 LIMIT 1"),
                    params![pattern],
                )
                .await
                .map_err(query_err)?;

            if let Some(row) = rows.next().await.map_err(query_err)? {
                return Ok(Some(row_to_product(&row).map_err(query_err)?));
            }
        }

        Ok(None)
    }

    async fn get_order(&self, order_id: &str) -> Result<Option<OrderRecord>, DatabaseError> {
        let mut rows = self
            .conn()
            .query(
                "SELECT order_id, customer_email, product_id, order_date, amount, status \
                 FROM orders WHERE order_id = ?1",
                params![order_id],
            )
            .await
            .map_err(query_err)?;

        match rows.next().await.map_err(query_err)? {
            Some(row) => {
                let order_id: String = row.get(0).map_err(query_err)?;
                let customer_email: String = row.get(1).map_err(query_err)?;
                let product_id: String = row.get(2).map_err(query_err)?;
                let order_date: String = row.get(3).map_err(query_err)?;
                let amount: f64 = row.get(4).map_err(query_err)?;
                let status: String = row.get(5).map_err(query_err)?;

                Ok(Some(OrderRecord {
                    order_id,
                    customer_email,
                    product_id,
                    order_date: parse_datetime(&order_date),
                    amount,
                    status,
                }))
            }
            None => Ok(None),
        }
    }
}
