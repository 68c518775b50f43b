//! # Inventory Reservation
//!
//! Moves units out of (`reserve`) and back into (`release`) a product's
//! `remaining` count. Both run on a connection the caller has already put
//! inside a transaction; neither commits.
//!
//! ## Reserve
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  UPDATE products SET remaining = remaining - q                          │
//! │  WHERE id = ? AND user_id = ? AND remaining >= q                        │
//! │  RETURNING *                                                            │
//! │       │                                                                 │
//! │       ├── 1 row  ──► Ok(product after decrement)                       │
//! │       │                                                                 │
//! │       └── 0 rows ──► SELECT product                                    │
//! │                         ├── missing/foreign ──► NotFound                │
//! │                         └── present         ──► InsufficientStock       │
//! │                                                 {requested, available}  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The check and the decrement are one statement, so two writers can never
//! both pass the check against the same units.
//!
//! ## Release
//! `remaining = MIN(quantity, remaining + q)`. Units that would push
//! `remaining` above the lifetime `quantity` are dropped with a warning.
//! Releasing against a product that no longer exists is skipped.

use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::{debug, warn};

use super::error::{LedgerError, LedgerResult};
use crate::error::DbError;
use crate::repository::product::find_in;
use crate::repository::PRODUCT_COLUMNS;
use nile_core::Product;

/// Takes `quantity` units from a product's remaining stock.
///
/// Returns the product as it stands after the decrement. The caller prices
/// the line from [`Product::pricing`].
pub async fn reserve(
    conn: &mut SqliteConnection,
    user_id: &str,
    product_id: &str,
    quantity: i64,
) -> LedgerResult<Product> {
    let sql = format!(
        r#"
        UPDATE products
        SET remaining = remaining - ?1, updated_at = ?2
        WHERE id = ?3 AND user_id = ?4 AND remaining >= ?1
        RETURNING {PRODUCT_COLUMNS}
        "#
    );

    let reserved = sqlx::query_as::<_, Product>(&sql)
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DbError::from)?;

    if let Some(product) = reserved {
        debug!(
            product_id = %product_id,
            quantity,
            remaining = product.remaining,
            "Stock reserved"
        );
        return Ok(product);
    }

    match find_in(conn, user_id, product_id).await? {
        None => Err(LedgerError::not_found("Product", product_id)),
        Some(product) => {
            product.ensure_available(quantity)?;
            // Guarded update missed a row that passes the same check
            Err(LedgerError::internal(
                "reserve",
                format!("reservation of {quantity} on {product_id} did not apply"),
            ))
        }
    }
}

/// Returns `quantity` units to a product's remaining stock.
///
/// ## Returns
/// * `Ok(Some(Product))` - Product after the release
/// * `Ok(None)` - Product no longer exists; nothing to return stock to
pub async fn release(
    conn: &mut SqliteConnection,
    user_id: &str,
    product_id: &str,
    quantity: i64,
) -> LedgerResult<Option<Product>> {
    let Some(before) = find_in(conn, user_id, product_id).await? else {
        warn!(
            product_id = %product_id,
            quantity,
            "Release skipped: product no longer exists"
        );
        return Ok(None);
    };

    let sql = format!(
        r#"
        UPDATE products
        SET remaining = MIN(quantity, remaining + ?1), updated_at = ?2
        WHERE id = ?3 AND user_id = ?4
        RETURNING {PRODUCT_COLUMNS}
        "#
    );

    let after = sqlx::query_as::<_, Product>(&sql)
        .bind(quantity)
        .bind(Utc::now())
        .bind(product_id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(DbError::from)?
        .ok_or_else(|| LedgerError::not_found("Product", product_id))?;

    let restored = after.remaining - before.remaining;
    if restored < quantity {
        warn!(
            product_id = %product_id,
            released = quantity,
            restored,
            discarded = quantity - restored,
            quantity = after.quantity,
            "Release clamped to lifetime quantity"
        );
    } else {
        debug!(product_id = %product_id, quantity, remaining = after.remaining, "Stock released");
    }

    Ok(Some(after))
}

// =============================================================================
// Unit Tests
// =============================================================================
