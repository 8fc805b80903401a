//! Seed data for the policy store — product catalog, policies, damage
//! protocols, and sample orders. Applied on startup when the tables are
//! empty, and by tests against in-memory stores.

use chrono::{TimeZone, Utc};
use libsql::{Connection, params};
use tracing::info;

use crate::error::DatabaseError;

fn query_err(e: libsql::Error) -> DatabaseError {
    DatabaseError::Query(e.to_string())
}

fn json_list(items: &[&str]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Seed the store with the default catalog and policies if it is empty.
///
/// Returns the number of products inserted (0 when already seeded).
pub async fn seed_store(conn: &Connection) -> Result<usize, DatabaseError> {
    let mut rows = conn
        .query("SELECT COUNT(*) FROM products", ())
        .await
        .map_err(query_err)?;
    let row = rows.next().await.map_err(query_err)?;
    let existing: i64 = row.and_then(|r| r.get(0).ok()).unwrap_or(0);
    if existing > 0 {
        return Ok(0);
    }

    let inserted = seed_products(conn).await?;
    seed_policies(conn).await?;
    seed_damage_protocols(conn).await?;
    seed_orders(conn).await?;

    info!(products = inserted, "Policy store seeded");
    Ok(inserted)
}

async fn seed_products(conn: &Connection) -> Result<usize, DatabaseError> {
    let products: &[(&str, &str, &str, f64, u32, u32, Vec<&str>, f64)] = &[
        (
            "LAPTOP-001",
            "Premium Laptop 15 inch",
            "electronics",
            899.99,
            24,
            30,
            vec!["Unused", "Original packaging", "All accessories included"],
            0.0,
        ),
        (
            "PHONE-001",
            "Smartphone Pro Max",
            "electronics",
            1199.99,
            12,
            14,
            vec!["Unopened box", "Factory seal intact"],
            50.0,
        ),
        (
            "SHOE-001",
            "Running Shoes Premium",
            "footwear",
            129.99,
            6,
            30,
            vec!["Unworn", "Original tags attached"],
            0.0,
        ),
        (
            "WATCH-001",
            "Smart Watch Sport Edition",
            "electronics",
            299.99,
            12,
            30,
            vec!["Unused", "Original packaging"],
            0.0,
        ),
        (
            "HEADPHONE-001",
            "Wireless Headphones Premium",
            "electronics",
            249.99,
            12,
            30,
            vec!["Unused", "Hygiene seal intact"],
            0.0,
        ),
    ];

    for (id, name, category, price, warranty, window, conditions, fee) in products {
        conn.execute(
            "INSERT INTO products
                (product_id, name, category, price, warranty_months, returnable,
                 return_window, return_conditions, restocking_fee)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7, ?8)",
            params![
                *id,
                *name,
                *category,
                *price,
                *warranty as i64,
                *window as i64,
                json_list(conditions),
                *fee
            ],
        )
        .await
        .map_err(query_err)?;
    }

    Ok(products.len())
}

async fn seed_policies(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO policies (policy_type, category, days_allowed, conditions, refund_percentage, details)
         VALUES ('return', 'electronics', 30, ?1, 100,
                 'Full refund within 30 days for electronics. Some items may have restocking fee.')",
        params![json_list(&[
            "Product must be in original condition",
            "All accessories and packaging must be included",
            "Proof of purchase required",
            "No signs of use or damage",
        ])],
    )
    .await
    .map_err(query_err)?;

    conn.execute(
        "INSERT INTO policies (policy_type, category, days_allowed, conditions, refund_percentage, details)
         VALUES ('return', 'footwear', 30, ?1, 100,
                 'Full refund within 30 days for unworn footwear')",
        params![json_list(&[
            "Shoes must be unworn",
            "Original tags must be attached",
            "Must be in original box",
        ])],
    )
    .await
    .map_err(query_err)?;

    conn.execute(
        "INSERT INTO policies (policy_type, category, processing_days, method, details)
         VALUES ('refund', 'general', 5, 'original_payment',
                 'Refunds processed within 5-7 business days to original payment method')",
        (),
    )
    .await
    .map_err(query_err)?;

    conn.execute(
        "INSERT INTO policies (policy_type, category, days_allowed, conditions, details)
         VALUES ('warranty', 'electronics', 365, ?1,
                 '12-month manufacturer warranty on all electronics')",
        params![json_list(&[
            "Manufacturing defects",
            "Hardware failures",
            "Battery issues",
        ])],
    )
    .await
    .map_err(query_err)?;

    Ok(())
}

async fn seed_damage_protocols(conn: &Connection) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO damage_protocols
            (damage_type, steps, requires_photo_evidence, replacement_eligible, response_hours)
         VALUES ('general', ?1, 1, 1, 48)",
        params![json_list(&[
            "Request photos of the damage",
            "Verify the order and purchase date",
            "Offer replacement or refund",
        ])],
    )
    .await
    .map_err(query_err)?;

    conn.execute(
        "INSERT INTO damage_protocols
            (damage_type, steps, requires_photo_evidence, replacement_eligible, response_hours)
         VALUES ('shipping', ?1, 1, 1, 24)",
        params![json_list(&[
            "Request photos of the packaging and product",
            "File a claim with the carrier",
            "Ship a replacement immediately",
        ])],
    )
    .await
    .map_err(query_err)?;

    Ok(())
}

async fn seed_orders(conn: &Connection) -> Result<(), DatabaseError> {
    let orders = &[
        ("ORD-12345", "customer@example.com", "LAPTOP-001", Utc.with_ymd_and_hms(2024, 11, 1, 0, 0, 0), 899.99),
        ("ORD-12346", "customer2@example.com", "PHONE-001", Utc.with_ymd_and_hms(2024, 11, 15, 0, 0, 0), 1199.99),
    ];

    for (id, email, product, date, amount) in orders {
        let order_date = date
            .single()
            .map(|d| d.to_rfc3339())
            .unwrap_or_default();
        conn.execute(
            "INSERT INTO orders (order_id, customer_email, product_id, order_date, amount, status)
             VALUES (?1, ?2, ?3, ?4, ?5, 'delivered')",
            params![*id, *email, *product, order_date, *amount],
        )
        .await
        .map_err(query_err)?;
    }

    Ok(())
}
