//! # Error Types
//!
//! Domain-specific error types for nile-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  nile-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Malformed or missing request fields            │
//! │                                                                         │
//! │  nile-db errors (separate crate)                                       │
//! │  ├── DbError          - Database operation failures                    │
//! │  └── LedgerError      - What the HTTP layer sees                       │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → LedgerError ← DbError             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Missing entities are a storage concern and are reported by nile-db.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Not enough remaining stock to back a reservation.
    ///
    /// ## User Workflow
    /// ```text
    /// Invoice line: Rice 50kg × 5
    ///      │
    ///      ▼
    /// Check stock: remaining=2
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Rice 50kg", available: 2, requested: 5, .. }
    ///      │
    ///      ▼
    /// Whole invoice is rolled back
    /// ```
    #[error("Insufficient stock for {product}: available {available}, requested {requested}")]
    InsufficientStock {
        product_id: String,
        product: String,
        available: i64,
        requested: i64,
    },

    /// A monetary computation left the representable decimal range.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow { context: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    pub fn overflow(context: impl Into<String>) -> Self {
        CoreError::AmountOverflow {
            context: context.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when a request doesn't meet requirements.
/// Checked before any database work starts.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, unparsable decimal).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Amount or quantity too large to compute with.
    #[error("{field} is too large")]
    TooLarge { field: String },

    /// Record is referenced by, or references, something it must not.
    #[error("Invalid reference: {reason}")]
    InvalidReference { reason: String },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn must_be_positive(field: impl Into<String>) -> Self {
        ValidationError::MustBePositive {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
