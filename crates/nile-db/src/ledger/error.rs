//! # Ledger Error Type
//!
//! The error every ledger and repository operation surfaces to the HTTP
//! layer.
//!
//! ## Taxonomy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  LedgerError            ErrorCode            HTTP   Message             │
//! │  ───────────────────    ──────────────────   ────   ──────────────────  │
//! │  Validation             VALIDATION_ERROR     400    field detail        │
//! │  NotFound               NOT_FOUND            404    entity + id         │
//! │  InsufficientStock      INSUFFICIENT_STOCK   400    requested/available │
//! │  Internal               INTERNAL             500    generic             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Internal failures are logged with full context when they are converted
//! and never leak their detail through [`LedgerError::public_message`].

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::error::DbError;
use nile_core::{CoreError, ValidationError};

/// Caller-facing ledger error.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Malformed or missing request fields.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Referenced entity is absent or owned by another user.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A reservation asked for more than the product has left.
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        product: String,
        requested: i64,
        available: i64,
    },

    /// Persistence or transaction failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    ValidationError,
    NotFound,
    InsufficientStock,
    Internal,
}

/// Serialized error body.
///
/// ```json
/// { "code": "INSUFFICIENT_STOCK", "message": "Insufficient stock for Rice: requested 5, available 2",
///   "requested": 5, "available": 2 }
/// ```
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<i64>,
}

impl LedgerError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Logs an internal failure and wraps it.
    pub fn internal(context: &str, detail: impl std::fmt::Display) -> Self {
        error!(context, error = %detail, "Internal ledger failure");
        LedgerError::Internal(format!("{context}: {detail}"))
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LedgerError::Validation(_) => ErrorCode::ValidationError,
            LedgerError::NotFound { .. } => ErrorCode::NotFound,
            LedgerError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            LedgerError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// HTTP-equivalent status.
    pub fn status_code(&self) -> u16 {
        match self.code() {
            ErrorCode::ValidationError | ErrorCode::InsufficientStock => 400,
            ErrorCode::NotFound => 404,
            ErrorCode::Internal => 500,
        }
    }

    /// Message safe to show the caller.
    pub fn public_message(&self) -> String {
        match self {
            LedgerError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        let (requested, available) = match self {
            LedgerError::InsufficientStock {
                requested,
                available,
                ..
            } => (Some(*requested), Some(*available)),
            _ => (None, None),
        };

        ErrorBody {
            code: self.code(),
            message: self.public_message(),
            requested,
            available,
        }
    }
}

/// Converts database errors to ledger errors.
impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LedgerError::NotFound { entity, id },
            DbError::Validation(v) => LedgerError::Validation(v),
            DbError::ForeignKeyViolation { message } => {
                LedgerError::Validation(ValidationError::InvalidReference { reason: message })
            }
            other => LedgerError::internal("database", other),
        }
    }
}

/// Converts core errors to ledger errors.
impl From<CoreError> for LedgerError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InsufficientStock {
                product_id,
                product,
                available,
                requested,
            } => LedgerError::InsufficientStock {
                product_id,
                product,
                requested,
                available,
            },
            CoreError::AmountOverflow { context } => {
                LedgerError::Validation(ValidationError::TooLarge { field: context })
            }
            CoreError::Validation(v) => LedgerError::Validation(v),
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_and_status() {
        let err = LedgerError::not_found("Customer", "c-1");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.status_code(), 404);
        assert_eq!(err.public_message(), "Customer not found: c-1");

        let err: LedgerError = ValidationError::required("customerId").into();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_insufficient_stock_from_core() {
        let err: LedgerError = CoreError::InsufficientStock {
            product_id: "p-1".to_string(),
            product: "Rice".to_string(),
            available: 2,
            requested: 5,
        }
        .into();

        assert_eq!(err.status_code(), 400);
        let body = serde_json::to_value(err.to_body()).unwrap();
        assert_eq!(body["code"], "INSUFFICIENT_STOCK");
        assert_eq!(body["requested"], 5);
        assert_eq!(body["available"], 2);
    }

    #[test]
    fn test_internal_hides_detail() {
        let err: LedgerError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(err.code(), ErrorCode::Internal);
        assert_eq!(err.status_code(), 500);
        assert_eq!(err.public_message(), "Internal server error");
        assert!(err.to_string().contains("disk I/O error"));

        let body = serde_json::to_value(err.to_body()).unwrap();
        assert!(body.get("requested").is_none());
    }

    #[test]
    fn test_db_not_found_keeps_entity() {
        let err: LedgerError = DbError::not_found("Invoice", "inv-9").into();
        assert!(matches!(err, LedgerError::NotFound { ref entity, .. } if entity == "Invoice"));
    }

    #[test]
    fn test_overflow_is_validation() {
        let err: LedgerError = CoreError::overflow("current SDG line total").into();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }
}
