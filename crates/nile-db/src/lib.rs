//! # nile-db: Database Layer and Invoice Ledger for Nile Ledger
//!
//! This crate owns every write to the Nile Ledger database. It uses SQLite
//! through sqlx, with money stored as exact decimal TEXT.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Nile Ledger Data Flow                            │
//! │                                                                         │
//! │  HTTP handler (POST /invoices)                                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     nile-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ InvoiceLedger │    │  Repositories │    │   Database   │  │   │
//! │  │   │  (ledger/)    │    │ (repository/) │    │  (pool.rs)   │  │   │
//! │  │   │               │    │               │    │              │  │   │
//! │  │   │ create/delete │───►│ invoice rows  │    │ SqlitePool   │  │   │
//! │  │   │ withdraw      │    │ ProductRepo   │    │ migrations   │  │   │
//! │  │   │ reserve       │    │ CustomerRepo  │    │ config       │  │   │
//! │  │   └───────┬───────┘    └───────────────┘    └──────────────┘  │   │
//! │  │           │ pricing + validation                               │   │
//! │  │           ▼                                                     │   │
//! │  │      nile-core (pure)                                          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys, busy timeout)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`config`] - Environment-driven settings
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Products, customers, invoices, exchange rates
//! - [`ledger`] - Transactional invoice and withdrawal workflows
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nile_db::{Database, LedgerConfig};
//!
//! let config = LedgerConfig::load()?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let invoice = db.ledger().create_invoice(&user_id, request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, LedgerConfig};
pub use error::{DbError, DbResult};
pub use ledger::{ErrorBody, ErrorCode, InvoiceLedger, LedgerError, LedgerResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::{
    CustomerRepository, ExchangeRateRepository, InvoiceRepository, ProductRepository,
};
