//! # Repository Module
//!
//! Database repository implementations for Nile Ledger.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.products().list(&user_id)                                  │
//! │       ▼                                                                 │
//! │  ProductRepository                                                     │
//! │  ├── create(&self, user_id, new)                                       │
//! │  ├── get(&self, user_id, id)                                           │
//! │  ├── update(&self, user_id, id, changes)                               │
//! │  └── delete(&self, user_id, id)                                        │
//! │       │                                                                 │
//! │       │  SQL Query (always scoped by user_id)                          │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Stock-moving writes do NOT live here. They go through                 │
//! │  `ledger::InvoiceLedger`, which owns the transaction.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`] - Product CRUD
//! - [`CustomerRepository`] - Customer records
//! - [`InvoiceRepository`] - Invoice reads and status edits
//! - [`ExchangeRateRepository`] - Recorded SDG/USD rates

pub mod customer;
pub mod exchange_rate;
pub mod invoice;
pub mod product;

pub use customer::CustomerRepository;
pub use exchange_rate::ExchangeRateRepository;
pub use invoice::InvoiceRepository;
pub use product::ProductRepository;

/// Column list matching `nile_core::Product`.
pub(crate) const PRODUCT_COLUMNS: &str = "id, user_id, name, description, quantity, remaining, \
     price_sdg, price_usd, purchase_date, exchange_rate, created_at, updated_at";

pub(crate) const CUSTOMER_COLUMNS: &str =
    "id, user_id, name, phone, email, address, notes, created_at, updated_at";

pub(crate) const INVOICE_COLUMNS: &str = "id, user_id, customer_id, date, status, payment_status, \
     notes, total_usd, total_original_sdg, total_current_sdg, profit_loss, created_at, updated_at";

pub(crate) const INVOICE_ITEM_COLUMNS: &str = "id, invoice_id, product_id, name, quantity, \
     price_usd, original_price_sdg, current_price_sdg, total_usd, total_original_sdg, \
     total_current_sdg, exchange_rate_at_purchase, current_exchange_rate, created_at";

pub(crate) const EXCHANGE_RATE_COLUMNS: &str =
    "id, user_id, rate, date, created_at, updated_at";

/// Generates a new record ID.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
