//! # Error Types
//!
//! Domain-specific error types for shelf-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  shelf-core errors (this file)                                         │
//! │  ├── CoreError        - Pricing and cart failures                      │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  bundle-quote errors (app)                                             │
//! │  └── ConfigError      - Config file / environment problems             │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → anyhow (CLI exit message)         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing in this crate panics on bad input. A malformed cart snapshot is
//! reported to the caller as a validation failure.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Pricing and cart errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A line of the cart snapshot failed validation.
    ///
    /// ## When This Occurs
    /// - Negative quantity or negative unit price
    /// - Blank title
    ///
    /// `index` is the zero-based position of the line in the snapshot.
    #[error("Invalid cart line {index}: {source}")]
    InvalidLine {
        index: usize,
        #[source]
        source: ValidationError,
    },

    /// An amount left the range of `Money`.
    #[error("Amount overflow while totalling {context}")]
    AmountOverflow { context: String },

    /// The book is not in the cart.
    #[error("Cart item not found: {0}")]
    CartItemNotFound(String),

    /// Cart has exceeded maximum allowed lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Error, PartialEq, Eq)]
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

    /// Value must be zero or more.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Structurally invalid value (e.g. a gap in the discount tiers).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g. two tiers for the same bundle size).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_line_message() {
        let err = CoreError::InvalidLine {
            index: 2,
            source: ValidationError::MustNotBeNegative {
                field: "quantity".to_string(),
            },
        };
        assert_eq!(err.to_string(), "Invalid cart line 2: quantity must not be negative");
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "title".to_string(),
        };
        assert_eq!(err.to_string(), "title is required");

        let err = ValidationError::Duplicate {
            field: "bundle size".to_string(),
            value: "3".to_string(),
        };
        assert_eq!(err.to_string(), "bundle size '3' already exists");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "title".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
