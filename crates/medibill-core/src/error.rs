//! # Error Types
//!
//! Domain-specific error types for medibill-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  medibill-core errors (this file)                                      │
//! │  ├── CoreError        - Draft and catalog failures                     │
//! │  └── ValidationError  - Document not ready for submission              │
//! │                                                                         │
//! │  medibill-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  desk app errors                                                       │
//! │  └── ApiError         - What the form sees (serialized)                │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Form         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## What Is NOT an Error
//! The pricing engine never fails. Bad numeric input ("", "abc", "-3") is
//! coerced to zero at the field boundary (see [`crate::input`]) and the
//! arithmetic runs on whatever is left.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A draft operation referenced a row that does not exist.
    #[error("Row {index} is out of range (draft has {len} rows)")]
    RowOutOfRange { index: usize, len: usize },

    /// Medicine cannot be found in the catalog.
    #[error("Medicine not found: {0}")]
    MedicineNotFound(String),

    /// Batch cannot be found for the selected medicine.
    #[error("Batch {batch_no} not found for medicine {medicine}")]
    BatchNotFound { medicine: String, batch_no: String },

    /// Supplier or customer cannot be found.
    #[error("{role} not found: {id}")]
    PartyNotFound { role: String, id: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Reasons a document cannot be submitted yet.
///
/// These are checked right before the payload is built. Computing totals
/// never needs them.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    /// A required header field is missing or blank.
    #[error("{field} is required")]
    Required { field: String },

    /// Every row is empty; there is nothing to submit.
    #[error("Document has no line items")]
    NoLines,

    /// A row has quantities or prices but no medicine.
    #[error("Row {row} has no medicine")]
    MissingMedicine { row: usize },

    /// Invalid format (e.g. unparsable date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
