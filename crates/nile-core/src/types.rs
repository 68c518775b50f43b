//! # Domain Types
//!
//! Core domain types used throughout Nile Ledger.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │◄──│     Invoice     │──►│  InvoiceItem    │       │
//! │  │  ─────────────  │   │  ─────────────  │ 1:N  ─────────────  │       │
//! │  │  id, user_id    │   │  status         │   │  quantity       │       │
//! │  │  name, phone    │   │  payment_status │   │  unit prices    │       │
//! │  └─────────────────┘   │  totals         │   │  line totals    │       │
//! │                        └─────────────────┘   │  rates          │       │
//! │                                              └────────┬────────┘       │
//! │  ┌─────────────────┐   ┌─────────────────┐            │ product_id     │
//! │  │  ExchangeRate   │   │    Product      │◄───────────┘                │
//! │  │  ─────────────  │   │  ─────────────  │                             │
//! │  │  rate, date     │   │  quantity       │  lifetime stocked           │
//! │  └─────────────────┘   │  remaining      │  currently available        │
//! │                        │  price_usd/sdg  │  fixed at stocking time     │
//! │                        └─────────────────┘                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ownership
//! Every record carries `user_id`. A record owned by another user is
//! indistinguishable from a missing one.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{FxRate, Money};
use crate::pricing::{LinePricing, PricingSnapshot, StockValuation};

// =============================================================================
// Product
// =============================================================================

/// A stocked product with dual-currency pricing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Owner of this product.
    pub user_id: String,

    pub name: String,

    pub description: Option<String>,

    /// Lifetime stocked amount.
    pub quantity: i64,

    /// Currently available amount. Never negative.
    pub remaining: i64,

    /// Unit price in SDG, fixed at stocking time.
    pub price_sdg: Money,

    /// Unit price in USD, fixed at stocking time.
    pub price_usd: Money,

    pub purchase_date: DateTime<Utc>,

    /// SDG per USD when the product was stocked.
    pub exchange_rate: FxRate,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the prices a reservation hands to the pricing engine.
    #[inline]
    pub fn pricing(&self) -> PricingSnapshot {
        PricingSnapshot {
            price_usd: self.price_usd,
            price_sdg: self.price_sdg,
            exchange_rate: self.exchange_rate,
        }
    }

    /// Checks that `requested` units can be taken from stock.
    pub fn ensure_available(&self, requested: i64) -> CoreResult<()> {
        if self.remaining >= requested {
            return Ok(());
        }

        Err(CoreError::InsufficientStock {
            product_id: self.id.clone(),
            product: self.name.clone(),
            available: self.remaining,
            requested,
        })
    }

    /// Values the remaining stock at purchase-time and at `current_rate`.
    pub fn valuation(&self, current_rate: FxRate) -> CoreResult<StockValuation> {
        StockValuation::of(self, current_rate)
    }
}

// =============================================================================
// Customer
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Exchange Rate
// =============================================================================

/// A recorded SDG/USD rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    pub id: String,
    pub user_id: String,
    pub rate: FxRate,
    pub date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Delivery state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Issued,
    Delivered,
    Cancelled,
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Partial,
    Paid,
}

// =============================================================================
// Invoice
// =============================================================================

/// An invoice header with its aggregate totals.
///
/// Totals are written once, when the invoice is created, and never
/// recomputed afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: String,
    pub user_id: String,
    pub customer_id: String,
    pub date: DateTime<Utc>,
    pub status: InvoiceStatus,
    pub payment_status: PaymentStatus,
    pub notes: String,
    pub total_usd: Money,
    pub total_original_sdg: Money,
    pub total_current_sdg: Money,
    /// `total_current_sdg - total_original_sdg`
    pub profit_loss: Money,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line on an invoice.
/// Uses snapshot pattern to freeze product prices and rates at invoice time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
pub struct InvoiceItem {
    pub id: String,
    pub invoice_id: String,
    pub product_id: String,
    /// Product name at time of invoice (frozen).
    pub name: String,
    pub quantity: i64,
    /// Unit price in USD (frozen).
    pub price_usd: Money,
    /// Unit price in SDG at the stocking-time rate (frozen).
    pub original_price_sdg: Money,
    /// Unit price in SDG at the invoice-time rate.
    pub current_price_sdg: Money,
    pub total_usd: Money,
    pub total_original_sdg: Money,
    pub total_current_sdg: Money,
    pub exchange_rate_at_purchase: FxRate,
    pub current_exchange_rate: FxRate,
    pub created_at: DateTime<Utc>,
}

impl InvoiceItem {
    /// Builds the frozen line record from a priced line.
    pub fn snapshot(
        id: String,
        invoice_id: &str,
        product: &Product,
        line: &LinePricing,
        created_at: DateTime<Utc>,
    ) -> Self {
        InvoiceItem {
            id,
            invoice_id: invoice_id.to_string(),
            product_id: product.id.clone(),
            name: product.name.clone(),
            quantity: line.quantity,
            price_usd: line.price_usd,
            original_price_sdg: line.original_price_sdg,
            current_price_sdg: line.current_price_sdg,
            total_usd: line.total_usd,
            total_original_sdg: line.total_original_sdg,
            total_current_sdg: line.total_current_sdg,
            exchange_rate_at_purchase: line.exchange_rate_at_purchase,
            current_exchange_rate: line.current_exchange_rate,
            created_at,
        }
    }
}

/// An invoice together with its lines, as returned by create and get.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceWithItems {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub items: Vec<InvoiceItem>,
}

// =============================================================================
// Requests
// =============================================================================

/// Request body for invoice creation.
///
/// Every field defaults when absent so that missing input surfaces as a
/// `ValidationError` from `validate_create_invoice`, not a parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateInvoiceRequest {
    pub customer_id: String,
    pub items: Vec<InvoiceLineRequest>,
    pub date: Option<DateTime<Utc>>,
    pub status: Option<InvoiceStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceLineRequest {
    pub product_id: String,
    pub quantity: i64,
    pub current_exchange_rate: Option<FxRate>,
}

impl InvoiceLineRequest {
    pub fn new(product_id: impl Into<String>, quantity: i64, current_exchange_rate: FxRate) -> Self {
        InvoiceLineRequest {
            product_id: product_id.into(),
            quantity,
            current_exchange_rate: Some(current_exchange_rate),
        }
    }
}

/// Editable invoice fields. Totals and lines are not editable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvoiceUpdate {
    pub status: Option<InvoiceStatus>,
    pub payment_status: Option<PaymentStatus>,
    pub notes: Option<String>,
}

/// Request body for a direct stock withdrawal.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WithdrawRequest {
    pub quantity: i64,
    pub current_exchange_rate: Option<FxRate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: i64,
    pub price_sdg: Money,
    pub price_usd: Money,
    #[serde(default)]
    pub purchase_date: Option<DateTime<Utc>>,
    pub exchange_rate: FxRate,
}

/// Partial product update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub quantity: Option<i64>,
    pub price_sdg: Option<Money>,
    pub price_usd: Option<Money>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub exchange_rate: Option<FxRate>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewCustomer {
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Withdrawal Result
// =============================================================================

/// Outcome of taking stock out directly, without an invoice.
///
/// Unit prices and line totals are separate fields, with the same meaning
/// as on [`InvoiceItem`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WithdrawalResult {
    /// Product after the withdrawal.
    pub product: Product,
    pub withdrawn_quantity: i64,
    pub price_usd: Money,
    /// Unit price in SDG at the stocking-time rate.
    pub original_price_sdg: Money,
    /// Unit price in SDG at the withdrawal-time rate.
    pub current_price_sdg: Money,
    pub total_usd: Money,
    pub original_total_sdg: Money,
    pub current_total_sdg: Money,
    /// `current_total_sdg - original_total_sdg`
    pub price_difference: Money,
    pub exchange_rate_at_purchase: FxRate,
    pub current_exchange_rate: FxRate,
}

impl WithdrawalResult {
    pub fn new(product: Product, line: &LinePricing) -> CoreResult<Self> {
        Ok(WithdrawalResult {
            product,
            withdrawn_quantity: line.quantity,
            price_usd: line.price_usd,
            original_price_sdg: line.original_price_sdg,
            current_price_sdg: line.current_price_sdg,
            total_usd: line.total_usd,
            original_total_sdg: line.total_original_sdg,
            current_total_sdg: line.total_current_sdg,
            price_difference: line.price_difference()?,
            exchange_rate_at_purchase: line.exchange_rate_at_purchase,
            current_exchange_rate: line.current_exchange_rate,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::price_line;

    fn product(remaining: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            user_id: "u-1".to_string(),
            name: "Sugar 10kg".to_string(),
            description: None,
            quantity: 10,
            remaining,
            price_sdg: Money::from_units(6000),
            price_usd: Money::from_units(10),
            purchase_date: now,
            exchange_rate: FxRate::from_units(600).unwrap(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_ensure_available() {
        let p = product(2);
        assert!(p.ensure_available(2).is_ok());

        match p.ensure_available(5) {
            Err(CoreError::InsufficientStock {
                available,
                requested,
                ..
            }) => {
                assert_eq!(available, 2);
                assert_eq!(requested, 5);
            }
            other => panic!("expected InsufficientStock, got {:?}", other),
        }
    }

    #[test]
    fn test_status_defaults() {
        assert_eq!(InvoiceStatus::default(), InvoiceStatus::Issued);
        assert_eq!(PaymentStatus::default(), PaymentStatus::Unpaid);
    }

    #[test]
    fn test_create_request_missing_fields_default() {
        let req: CreateInvoiceRequest = serde_json::from_str("{}").unwrap();
        assert!(req.customer_id.is_empty());
        assert!(req.items.is_empty());

        let req: CreateInvoiceRequest = serde_json::from_str(
            r#"{"customerId":"c-1","items":[{"productId":"p-1","quantity":3,"currentExchangeRate":600}],"status":"delivered"}"#,
        )
        .unwrap();
        assert_eq!(req.items[0].quantity, 3);
        assert_eq!(
            req.items[0].current_exchange_rate,
            Some(FxRate::from_units(600).unwrap())
        );
        assert_eq!(req.status, Some(InvoiceStatus::Delivered));
    }

    #[test]
    fn test_withdrawal_result_from_line() {
        let p = product(6);
        let line = price_line(&p.pricing(), 4, FxRate::from_units(650).unwrap()).unwrap();
        let result = WithdrawalResult::new(p, &line).unwrap();

        assert_eq!(result.withdrawn_quantity, 4);
        assert_eq!(result.original_price_sdg, Money::from_units(6000));
        assert_eq!(result.current_price_sdg, Money::from_units(6500));
        assert_eq!(result.original_total_sdg, Money::from_units(24000));
        assert_eq!(result.current_total_sdg, Money::from_units(26000));
        assert_eq!(result.price_difference, Money::from_units(2000));
    }
}
