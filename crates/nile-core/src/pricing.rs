//! # Pricing Engine
//!
//! Pure computation of line and invoice totals in USD, original SDG
//! (stocking-time rate) and current SDG (transaction-time rate).
//!
//! ## Formulas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Per line (quantity q, current rate r)                                  │
//! │                                                                         │
//! │    total_usd           = price_usd × q                                  │
//! │    total_original_sdg  = price_sdg × q                                  │
//! │    total_current_sdg   = round(price_usd × r × q)                       │
//! │                                                                         │
//! │    current_price_sdg   = round(price_usd × r)      (unit)               │
//! │                                                                         │
//! │  Per invoice                                                            │
//! │                                                                         │
//! │    total_*      = Σ line total_*                                        │
//! │    profit_loss  = total_current_sdg − total_original_sdg                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `total_current_sdg` is rounded once from the exact product, so it can
//! differ by a fraction of a cent from `current_price_sdg × q`. Invoice
//! totals are sums of already-rounded line totals, which keeps them equal
//! to what re-adding the stored lines gives.
//!
//! ## Example
//! ```rust
//! use nile_core::money::{FxRate, Money};
//! use nile_core::pricing::{price_line, InvoiceTotals, PricingSnapshot};
//!
//! let snapshot = PricingSnapshot {
//!     price_usd: Money::from_units(10),
//!     price_sdg: Money::from_units(5500),
//!     exchange_rate: FxRate::from_units(550).unwrap(),
//! };
//!
//! let line = price_line(&snapshot, 3, FxRate::from_units(600).unwrap()).unwrap();
//! let totals = InvoiceTotals::from_lines([&line]).unwrap();
//!
//! assert_eq!(totals.total_usd, Money::from_units(30));
//! assert_eq!(totals.total_original_sdg, Money::from_units(16500));
//! assert_eq!(totals.total_current_sdg, Money::from_units(18000));
//! assert_eq!(totals.profit_loss, Money::from_units(1500));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::{FxRate, Money};
use crate::types::Product;

// =============================================================================
// Pricing Snapshot
// =============================================================================

/// Product prices captured at reservation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingSnapshot {
    pub price_usd: Money,
    pub price_sdg: Money,
    /// Rate in effect when the product was stocked.
    pub exchange_rate: FxRate,
}

// =============================================================================
// Line Pricing
// =============================================================================

/// Unit prices and line totals for one priced line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinePricing {
    pub quantity: i64,
    pub price_usd: Money,
    pub original_price_sdg: Money,
    pub current_price_sdg: Money,
    pub total_usd: Money,
    pub total_original_sdg: Money,
    pub total_current_sdg: Money,
    pub exchange_rate_at_purchase: FxRate,
    pub current_exchange_rate: FxRate,
}

impl LinePricing {
    /// Gain (positive) or loss (negative) in SDG from the rate moving.
    pub fn price_difference(&self) -> CoreResult<Money> {
        self.total_current_sdg.checked_sub(self.total_original_sdg)
    }
}

/// Prices `quantity` units of a product at `current_rate`.
///
/// ## Errors
/// - `Validation` when quantity is not positive
/// - `AmountOverflow` when a product leaves the decimal range
pub fn price_line(
    snapshot: &PricingSnapshot,
    quantity: i64,
    current_rate: FxRate,
) -> CoreResult<LinePricing> {
    if quantity <= 0 {
        return Err(ValidationError::must_be_positive("quantity").into());
    }

    let qty = Decimal::from(quantity);
    let usd_at_rate = snapshot
        .price_usd
        .amount()
        .checked_mul(current_rate.value())
        .ok_or_else(|| CoreError::overflow("current SDG unit price"))?;
    let total_current = usd_at_rate
        .checked_mul(qty)
        .ok_or_else(|| CoreError::overflow("current SDG line total"))?;

    Ok(LinePricing {
        quantity,
        price_usd: snapshot.price_usd,
        original_price_sdg: snapshot.price_sdg,
        current_price_sdg: Money::new(usd_at_rate),
        total_usd: snapshot.price_usd.multiply_quantity(quantity)?,
        total_original_sdg: snapshot.price_sdg.multiply_quantity(quantity)?,
        total_current_sdg: Money::new(total_current),
        exchange_rate_at_purchase: snapshot.exchange_rate,
        current_exchange_rate: current_rate,
    })
}

// =============================================================================
// Invoice Totals
// =============================================================================

/// Aggregate totals stored on an invoice header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceTotals {
    pub total_usd: Money,
    pub total_original_sdg: Money,
    pub total_current_sdg: Money,
    pub profit_loss: Money,
}

impl InvoiceTotals {
    /// Sums line totals and derives profit/loss.
    pub fn from_lines<'a, I>(lines: I) -> CoreResult<Self>
    where
        I: IntoIterator<Item = &'a LinePricing>,
    {
        let mut totals = InvoiceTotals::default();
        for line in lines {
            totals.add_line(line)?;
        }
        Ok(totals)
    }

    /// Folds one more line into the running totals.
    pub fn add_line(&mut self, line: &LinePricing) -> CoreResult<()> {
        self.total_usd = self.total_usd.checked_add(line.total_usd)?;
        self.total_original_sdg = self.total_original_sdg.checked_add(line.total_original_sdg)?;
        self.total_current_sdg = self.total_current_sdg.checked_add(line.total_current_sdg)?;
        self.profit_loss = self.total_current_sdg.checked_sub(self.total_original_sdg)?;
        Ok(())
    }
}

// =============================================================================
// Stock Valuation
// =============================================================================

/// What a product's remaining stock is worth, then and now.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockValuation {
    pub product_id: String,
    pub remaining: i64,
    /// `price_sdg × remaining`
    pub original_value_sdg: Money,
    /// `price_usd × current_rate × remaining`
    pub current_value_sdg: Money,
    pub current_exchange_rate: FxRate,
}

impl StockValuation {
    pub fn of(product: &Product, current_rate: FxRate) -> CoreResult<Self> {
        let current = product
            .price_usd
            .amount()
            .checked_mul(current_rate.value())
            .and_then(|v| v.checked_mul(Decimal::from(product.remaining)))
            .ok_or_else(|| CoreError::overflow("stock valuation"))?;

        Ok(StockValuation {
            product_id: product.id.clone(),
            remaining: product.remaining,
            original_value_sdg: product.price_sdg.multiply_quantity(product.remaining)?,
            current_value_sdg: Money::new(current),
            current_exchange_rate: current_rate,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
