//! # Invoice Ledger
//!
//! The transactional workflows that move stock: invoice creation, invoice
//! deletion and direct withdrawal.
//!
//! ## Invoice Creation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   create_invoice(user_id, request)                      │
//! │                                                                         │
//! │  validate_create_invoice ──► ValidationError                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  BEGIN                                                                  │
//! │  INSERT invoices … SELECT FROM customers ──► 0 rows: NotFound(Customer)│
//! │       │                                                                 │
//! │       ▼  for each line, in request order                               │
//! │  ┌──────────────────────────────────────────┐                          │
//! │  │ reserve ──► NotFound / InsufficientStock │                          │
//! │  │ price_line                               │                          │
//! │  │ INSERT invoice_items (snapshot)          │                          │
//! │  │ totals += line                           │                          │
//! │  └──────────────────────────────────────────┘                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  UPDATE invoices SET totals                                            │
//! │  COMMIT  (any error above: ROLLBACK, nothing persisted)                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Serialization
//! Every transaction here opens with a write. SQLite hands out one write
//! lock per database, so the second of two concurrent invoices waits (up to
//! the busy timeout) until the first commits or rolls back, then sees its
//! effects. Together with the guarded decrement in `reservation`, two
//! invoices can never sell the same units.

use chrono::Utc;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use tracing::{error, info, warn};

use super::error::{LedgerError, LedgerResult};
use super::reservation::{release, reserve};
use crate::repository::generate_id;
use crate::repository::invoice::{
    delete_header, delete_items, insert_header_for_customer, insert_item, items_for, set_totals,
    touch, NewHeader,
};
use nile_core::validation::{require_rate, validate_create_invoice, validate_required_id, validate_withdrawal};
use nile_core::{
    price_line, CreateInvoiceRequest, FxRate, InvoiceItem, InvoiceTotals, InvoiceWithItems,
    WithdrawRequest, WithdrawalResult,
};

/// Entry point for stock-moving operations.
///
/// ## Usage
/// ```rust,ignore
/// let ledger = db.ledger();
///
/// let invoice = ledger.create_invoice(&user_id, request).await?;
/// ledger.delete_invoice(&user_id, &invoice.invoice.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct InvoiceLedger {
    pool: SqlitePool,
}

impl InvoiceLedger {
    pub fn new(pool: SqlitePool) -> Self {
        InvoiceLedger { pool }
    }

    /// Creates an invoice, reserving stock for every line.
    ///
    /// ## Returns
    /// * `Ok(InvoiceWithItems)` - The stored invoice with lines and totals
    /// * `Err(LedgerError::Validation)` - Missing customer, items or line fields
    /// * `Err(LedgerError::NotFound)` - Customer or product missing or foreign
    /// * `Err(LedgerError::InsufficientStock)` - First line that can't be covered
    ///
    /// On any error nothing is persisted.
    pub async fn create_invoice(
        &self,
        user_id: &str,
        request: CreateInvoiceRequest,
    ) -> LedgerResult<InvoiceWithItems> {
        validate_create_invoice(&request)?;

        let invoice_id = generate_id();
        let mut tx = self.begin().await?;
        let result = create_in(&mut tx, user_id, &invoice_id, &request).await;
        let created = finish(tx, result, "create_invoice").await?;

        info!(
            invoice_id = %created.invoice.id,
            customer_id = %created.invoice.customer_id,
            lines = created.items.len(),
            total_current_sdg = %created.invoice.total_current_sdg,
            profit_loss = %created.invoice.profit_loss,
            "Invoice created"
        );

        Ok(created)
    }

    /// Deletes an invoice and returns every line's units to stock.
    ///
    /// Lines whose product has since been deleted are skipped. Release is
    /// clamped so `remaining` never exceeds the product's `quantity`.
    pub async fn delete_invoice(&self, user_id: &str, invoice_id: &str) -> LedgerResult<()> {
        validate_required_id("invoiceId", invoice_id)?;

        let mut tx = self.begin().await?;
        let result = delete_in(&mut tx, user_id, invoice_id).await;
        let released = finish(tx, result, "delete_invoice").await?;

        info!(invoice_id = %invoice_id, lines = released, "Invoice deleted");
        Ok(())
    }

    /// Takes stock out without an invoice and prices the withdrawal.
    ///
    /// Only the product's `remaining` changes; nothing else is recorded.
    pub async fn withdraw_product(
        &self,
        user_id: &str,
        product_id: &str,
        request: WithdrawRequest,
    ) -> LedgerResult<WithdrawalResult> {
        validate_required_id("productId", product_id)?;
        let rate = validate_withdrawal(&request)?;

        let mut tx = self.begin().await?;
        let result = withdraw_in(&mut tx, user_id, product_id, request.quantity, rate).await;
        let withdrawal = finish(tx, result, "withdraw_product").await?;

        info!(
            product_id = %product_id,
            quantity = withdrawal.withdrawn_quantity,
            remaining = withdrawal.product.remaining,
            price_difference = %withdrawal.price_difference,
            "Stock withdrawn"
        );

        Ok(withdrawal)
    }

    async fn begin(&self) -> LedgerResult<Transaction<'static, Sqlite>> {
        self.pool
            .begin()
            .await
            .map_err(|e| LedgerError::internal("begin transaction", e))
    }
}

// =============================================================================
// Transaction Bodies
// =============================================================================

async fn create_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    invoice_id: &str,
    request: &CreateInvoiceRequest,
) -> LedgerResult<InvoiceWithItems> {
    let now = Utc::now();
    let header = NewHeader {
        id: invoice_id,
        user_id,
        customer_id: &request.customer_id,
        date: request.date.unwrap_or(now),
        status: request.status.unwrap_or_default(),
        payment_status: request.payment_status.unwrap_or_default(),
        notes: request.notes.as_deref().unwrap_or(""),
        now,
    };

    if !insert_header_for_customer(conn, &header).await? {
        return Err(LedgerError::not_found("Customer", &request.customer_id));
    }

    let mut totals = InvoiceTotals::default();
    let mut items = Vec::with_capacity(request.items.len());

    for (idx, line) in request.items.iter().enumerate() {
        let rate = require_rate(
            &format!("items[{idx}].currentExchangeRate"),
            line.current_exchange_rate,
        )?;

        let product = reserve(conn, user_id, &line.product_id, line.quantity).await?;
        let priced = price_line(&product.pricing(), line.quantity, rate)?;

        let item = InvoiceItem::snapshot(generate_id(), invoice_id, &product, &priced, now);
        insert_item(conn, &item).await?;

        totals.add_line(&priced)?;
        items.push(item);
    }

    let invoice = set_totals(conn, invoice_id, &totals).await?;
    Ok(InvoiceWithItems { invoice, items })
}

/// Returns the number of lines released.
async fn delete_in(conn: &mut SqliteConnection, user_id: &str, invoice_id: &str) -> LedgerResult<usize> {
    if !touch(conn, user_id, invoice_id).await? {
        return Err(LedgerError::not_found("Invoice", invoice_id));
    }

    let items = items_for(conn, invoice_id).await?;
    for item in &items {
        release(conn, user_id, &item.product_id, item.quantity).await?;
    }

    delete_items(conn, invoice_id).await?;
    delete_header(conn, user_id, invoice_id).await?;

    Ok(items.len())
}

async fn withdraw_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    product_id: &str,
    quantity: i64,
    rate: FxRate,
) -> LedgerResult<WithdrawalResult> {
    let product = reserve(conn, user_id, product_id, quantity).await?;
    let priced = price_line(&product.pricing(), quantity, rate)?;
    Ok(WithdrawalResult::new(product, &priced)?)
}

/// Commits on success, rolls back on failure.
///
/// A failed rollback is logged and the original error is returned.
async fn finish<T>(
    tx: Transaction<'static, Sqlite>,
    result: LedgerResult<T>,
    operation: &'static str,
) -> LedgerResult<T> {
    match result {
        Ok(value) => {
            tx.commit()
                .await
                .map_err(|e| LedgerError::internal(operation, format!("commit failed: {e}")))?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                error!(operation, error = %rollback_err, "Rollback failed");
            }
            warn!(operation, error = %err, "Transaction rolled back");
            Err(err)
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
