//! # nile-core: Pure Business Logic for Nile Ledger
//!
//! Domain types, dual-currency money, pricing and validation for a
//! multi-tenant inventory and invoicing backend. Zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Nile Ledger Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    HTTP layer (external)                        │   │
//! │  │    createInvoice, deleteInvoice, withdrawProduct, ...          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 nile-db (Database + Ledger)                     │   │
//! │  │         Transactions, reservations, repositories                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ nile-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  pricing  │  │ validation│  │   │
//! │  │   │  Product  │  │   Money   │  │ LineTotal │  │  requests │  │   │
//! │  │   │  Invoice  │  │  FxRate   │  │  Totals   │  │  fields   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Invoice, InvoiceItem, requests)
//! - [`money`] - Decimal `Money` and `FxRate` (no floating point!)
//! - [`pricing`] - Line and invoice totals in USD and SDG
//! - [`error`] - Domain error types
//! - [`validation`] - Request validation
//!
//! ## Example Usage
//!
//! ```rust
//! use nile_core::money::{FxRate, Money};
//! use nile_core::pricing::{price_line, PricingSnapshot};
//!
//! let snapshot = PricingSnapshot {
//!     price_usd: Money::from_units(10),
//!     price_sdg: Money::from_units(6000),
//!     exchange_rate: FxRate::from_units(600).unwrap(),
//! };
//!
//! let line = price_line(&snapshot, 4, FxRate::from_units(650).unwrap()).unwrap();
//! assert_eq!(line.total_current_sdg, Money::from_units(26000));
//! assert_eq!(line.price_difference().unwrap(), Money::from_units(2000));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{FxRate, Money};
pub use pricing::{price_line, InvoiceTotals, LinePricing, PricingSnapshot, StockValuation};
pub use types::*;
