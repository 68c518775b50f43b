//! # Ledger Module
//!
//! Stock-moving workflows and the errors they surface.
//!
//! - [`reservation`] - Guarded decrement and clamped release of `remaining`
//! - [`invoice`] - [`InvoiceLedger`]: create/delete invoice, withdraw product
//! - [`error`] - [`LedgerError`] with codes and HTTP-equivalent status

pub mod error;
pub mod invoice;
pub mod reservation;

pub use error::{ErrorBody, ErrorCode, LedgerError, LedgerResult};
pub use invoice::InvoiceLedger;
