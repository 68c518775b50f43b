//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD scoped by owner
//! - Lifetime quantity edits that keep `remaining` consistent
//!
//! ## Quantity Edits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                Editing quantity on a partly sold product                │
//! │                                                                         │
//! │  Stored:  quantity=10  remaining=4   (6 units out on invoices)         │
//! │                                                                         │
//! │  update quantity → 12   remaining = 4 + (12 - 10) = 6                  │
//! │  update quantity →  5   remaining = 4 + ( 5 - 10) = -1 → clamped to 0  │
//! │                                                                         │
//! │  One UPDATE statement, so a concurrent reservation can never slip      │
//! │  between reading and writing `remaining`.                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `remaining` is otherwise only moved by `ledger::reservation`.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{generate_id, PRODUCT_COLUMNS};
use crate::error::{DbError, DbResult};
use nile_core::validation::{validate_new_product, validate_product_update};
use nile_core::{NewProduct, Product, ProductUpdate};

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let product = repo.create(&user_id, new_product).await?;
/// let all = repo.list(&user_id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Stocks a new product. `remaining` starts equal to `quantity`.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Stored product
    /// * `Err(DbError::Validation)` - Missing name, negative price, ...
    pub async fn create(&self, user_id: &str, new: NewProduct) -> DbResult<Product> {
        validate_new_product(&new)?;

        let now = Utc::now();
        let product = Product {
            id: generate_id(),
            user_id: user_id.to_string(),
            name: new.name.trim().to_string(),
            description: new.description,
            quantity: new.quantity,
            remaining: new.quantity,
            price_sdg: new.price_sdg,
            price_usd: new.price_usd,
            purchase_date: new.purchase_date.unwrap_or(now),
            exchange_rate: new.exchange_rate,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %product.id, name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, user_id, name, description, quantity, remaining,
                price_sdg, price_usd, purchase_date, exchange_rate,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&product.id)
        .bind(&product.user_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.quantity)
        .bind(product.remaining)
        .bind(product.price_sdg)
        .bind(product.price_usd)
        .bind(product.purchase_date)
        .bind(product.exchange_rate)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        info!(id = %product.id, quantity = product.quantity, "Product stocked");
        Ok(product)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Missing, or owned by another user
    pub async fn get(&self, user_id: &str, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        find_in(&mut conn, user_id, id).await
    }

    /// Lists the user's products, newest first.
    pub async fn list(&self, user_id: &str) -> DbResult<Vec<Product>> {
        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE user_id = ?1 ORDER BY created_at DESC"
        );

        let products = sqlx::query_as::<_, Product>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    /// Applies a partial update.
    ///
    /// A new `quantity` shifts `remaining` by the same difference, never
    /// below zero. Everything else is a plain overwrite.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product after the update
    /// * `Err(DbError::NotFound)` - Missing, or owned by another user
    pub async fn update(
        &self,
        user_id: &str,
        id: &str,
        changes: ProductUpdate,
    ) -> DbResult<Product> {
        validate_product_update(&changes)?;

        debug!(id = %id, "Updating product");

        let sql = format!(
            r#"
            UPDATE products SET
                name          = COALESCE(?3, name),
                description   = COALESCE(?4, description),
                remaining     = CASE WHEN ?5 IS NULL THEN remaining
                                     ELSE MAX(0, remaining + (?5 - quantity)) END,
                quantity      = COALESCE(?5, quantity),
                price_sdg     = COALESCE(?6, price_sdg),
                price_usd     = COALESCE(?7, price_usd),
                purchase_date = COALESCE(?8, purchase_date),
                exchange_rate = COALESCE(?9, exchange_rate),
                updated_at    = ?10
            WHERE id = ?1 AND user_id = ?2
            RETURNING {PRODUCT_COLUMNS}
            "#
        );

        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(changes.name.as_deref().map(str::trim))
            .bind(changes.description)
            .bind(changes.quantity)
            .bind(changes.price_sdg)
            .bind(changes.price_usd)
            .bind(changes.purchase_date)
            .bind(changes.exchange_rate)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        product.ok_or_else(|| DbError::not_found("Product", id))
    }

    /// Deletes a product.
    ///
    /// Products still referenced by invoice lines cannot be deleted and
    /// fail with `DbError::ForeignKeyViolation`.
    pub async fn delete(&self, user_id: &str, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1 AND user_id = ?2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts the user's products (for diagnostics).
    pub async fn count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Loads a product on an existing connection or transaction.
pub(crate) async fn find_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND user_id = ?2");

    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(product)
}

// =============================================================================
// Unit Tests
// =============================================================================
