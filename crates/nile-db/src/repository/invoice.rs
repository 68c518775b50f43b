//! # Invoice Repository
//!
//! Reads and status edits for invoices, plus the row-level helpers the
//! ledger runs inside its transactions.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Invoice Lifecycle                                  │
//! │                                                                         │
//! │  InvoiceLedger::create_invoice                                         │
//! │       │  insert_header_for_customer → insert_item × N → set_totals     │
//! │       ▼                                                                 │
//! │  ┌────────────┐   update(status/payment/notes)   ┌────────────┐        │
//! │  │   Issued   │ ───────────────────────────────► │ Delivered  │        │
//! │  └────────────┘                                   └────────────┘        │
//! │       │                                                                 │
//! │       │  InvoiceLedger::delete_invoice                                 │
//! │       ▼  touch → items_for → release × N → delete_items → delete_header │
//! │   (gone, stock returned)                                               │
//! │                                                                         │
//! │  Totals and lines are written once and never recomputed.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use super::{INVOICE_COLUMNS, INVOICE_ITEM_COLUMNS};
use crate::error::{DbError, DbResult};
use nile_core::pricing::InvoiceTotals;
use nile_core::{Invoice, InvoiceItem, InvoiceStatus, InvoiceUpdate, InvoiceWithItems, PaymentStatus};

#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    pool: SqlitePool,
}

impl InvoiceRepository {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceRepository { pool }
    }

    /// Gets an invoice with its lines, exactly as stored.
    pub async fn get(&self, user_id: &str, id: &str) -> DbResult<Option<InvoiceWithItems>> {
        let mut conn = self.pool.acquire().await?;
        with_items(&mut conn, user_id, id).await
    }

    /// Lists invoice headers, newest date first.
    pub async fn list(&self, user_id: &str) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE user_id = ?1 \
             ORDER BY date DESC, created_at DESC"
        );

        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Lists a customer's invoices, newest date first.
    pub async fn list_for_customer(&self, user_id: &str, customer_id: &str) -> DbResult<Vec<Invoice>> {
        let sql = format!(
            "SELECT {INVOICE_COLUMNS} FROM invoices WHERE user_id = ?1 AND customer_id = ?2 \
             ORDER BY date DESC, created_at DESC"
        );

        let invoices = sqlx::query_as::<_, Invoice>(&sql)
            .bind(user_id)
            .bind(customer_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(invoices)
    }

    /// Edits status, payment status and notes. Nothing else is editable.
    ///
    /// ## Returns
    /// * `Ok(Invoice)` - Header after the edit
    /// * `Err(DbError::NotFound)` - Missing, or owned by another user
    pub async fn update(&self, user_id: &str, id: &str, changes: InvoiceUpdate) -> DbResult<Invoice> {
        debug!(id = %id, "Updating invoice");

        let sql = format!(
            r#"
            UPDATE invoices SET
                status         = COALESCE(?3, status),
                payment_status = COALESCE(?4, payment_status),
                notes          = COALESCE(?5, notes),
                updated_at     = ?6
            WHERE id = ?1 AND user_id = ?2
            RETURNING {INVOICE_COLUMNS}
            "#
        );

        let invoice = sqlx::query_as::<_, Invoice>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(changes.status)
            .bind(changes.payment_status)
            .bind(changes.notes)
            .bind(Utc::now())
            .fetch_optional(&self.pool)
            .await?;

        invoice.ok_or_else(|| DbError::not_found("Invoice", id))
    }

    /// Counts the user's invoices (for diagnostics).
    pub async fn count(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices WHERE user_id = ?1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

/// Header fields for a new invoice. Totals start at zero.
pub(crate) struct NewHeader<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub customer_id: &'a str,
    pub date: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub payment_status: PaymentStatus,
    pub notes: &'a str,
    pub now: DateTime<Utc>,
}

/// Inserts the header only if the customer belongs to the same user.
///
/// Returns `false` when the customer is missing or foreign, in which case
/// nothing was written.
pub(crate) async fn insert_header_for_customer(
    conn: &mut SqliteConnection,
    header: &NewHeader<'_>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO invoices (
            id, user_id, customer_id, date, status, payment_status, notes,
            created_at, updated_at
        )
        SELECT ?1, ?2, c.id, ?4, ?5, ?6, ?7, ?8, ?8
        FROM customers c
        WHERE c.id = ?3 AND c.user_id = ?2
        "#,
    )
    .bind(header.id)
    .bind(header.user_id)
    .bind(header.customer_id)
    .bind(header.date)
    .bind(header.status)
    .bind(header.payment_status)
    .bind(header.notes)
    .bind(header.now)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}

pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &InvoiceItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO invoice_items (
            id, invoice_id, product_id, name, quantity,
            price_usd, original_price_sdg, current_price_sdg,
            total_usd, total_original_sdg, total_current_sdg,
            exchange_rate_at_purchase, current_exchange_rate, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
        "#,
    )
    .bind(&item.id)
    .bind(&item.invoice_id)
    .bind(&item.product_id)
    .bind(&item.name)
    .bind(item.quantity)
    .bind(item.price_usd)
    .bind(item.original_price_sdg)
    .bind(item.current_price_sdg)
    .bind(item.total_usd)
    .bind(item.total_original_sdg)
    .bind(item.total_current_sdg)
    .bind(item.exchange_rate_at_purchase)
    .bind(item.current_exchange_rate)
    .bind(item.created_at)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Writes the aggregate totals and returns the finished header.
pub(crate) async fn set_totals(
    conn: &mut SqliteConnection,
    id: &str,
    totals: &InvoiceTotals,
) -> DbResult<Invoice> {
    let sql = format!(
        r#"
        UPDATE invoices SET
            total_usd = ?2,
            total_original_sdg = ?3,
            total_current_sdg = ?4,
            profit_loss = ?5
        WHERE id = ?1
        RETURNING {INVOICE_COLUMNS}
        "#
    );

    let invoice = sqlx::query_as::<_, Invoice>(&sql)
        .bind(id)
        .bind(totals.total_usd)
        .bind(totals.total_original_sdg)
        .bind(totals.total_current_sdg)
        .bind(totals.profit_loss)
        .fetch_optional(&mut *conn)
        .await?;

    invoice.ok_or_else(|| DbError::not_found("Invoice", id))
}

/// Bumps `updated_at`. Used as the opening write of a delete.
///
/// Returns `false` when the invoice is missing or foreign.
pub(crate) async fn touch(conn: &mut SqliteConnection, user_id: &str, id: &str) -> DbResult<bool> {
    let result = sqlx::query("UPDATE invoices SET updated_at = ?3 WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Lines of an invoice in insertion order.
pub(crate) async fn items_for(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<Vec<InvoiceItem>> {
    let sql = format!(
        "SELECT {INVOICE_ITEM_COLUMNS} FROM invoice_items WHERE invoice_id = ?1 ORDER BY rowid"
    );

    let items = sqlx::query_as::<_, InvoiceItem>(&sql)
        .bind(invoice_id)
        .fetch_all(&mut *conn)
        .await?;

    Ok(items)
}

pub(crate) async fn delete_items(conn: &mut SqliteConnection, invoice_id: &str) -> DbResult<u64> {
    let result = sqlx::query("DELETE FROM invoice_items WHERE invoice_id = ?1")
        .bind(invoice_id)
        .execute(&mut *conn)
        .await?;

    Ok(result.rows_affected())
}

pub(crate) async fn delete_header(conn: &mut SqliteConnection, user_id: &str, id: &str) -> DbResult<()> {
    let result = sqlx::query("DELETE FROM invoices WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Invoice", id));
    }

    Ok(())
}

/// Loads a header and its lines on an existing connection.
pub(crate) async fn with_items(
    conn: &mut SqliteConnection,
    user_id: &str,
    id: &str,
) -> DbResult<Option<InvoiceWithItems>> {
    let sql = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1 AND user_id = ?2");

    let invoice = sqlx::query_as::<_, Invoice>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?;

    let Some(invoice) = invoice else {
        return Ok(None);
    };

    let items = items_for(conn, &invoice.id).await?;
    Ok(Some(InvoiceWithItems { invoice, items }))
}
