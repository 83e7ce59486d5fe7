//! # Validation Module
//!
//! Input validation for cart snapshots and cart mutations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                      │
//! │  └── Non-integer quantities never become a CartLineItem                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── Snapshot lines: title present, price >= 0, quantity >= 0          │
//! │  └── Cart mutations: title length, quantity 1..=999, cart size         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Bundle engine                                                │
//! │  └── Assumes validated input, only guards arithmetic overflow          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::money::Money;
//! use shelf_core::types::CartLineItem;
//! use shelf_core::validation::{validate_line_item, validate_quantity};
//!
//! assert!(validate_line_item(&CartLineItem::new("Dune", Money::new(2595, 1), 1)).is_ok());
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::CartLineItem;
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_TITLE_LENGTH};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a book title.
///
/// ## Rules
/// - Must not be blank
/// - At most `MAX_TITLE_LENGTH` characters
///
/// ```rust
/// use shelf_core::validation::validate_title;
///
/// assert!(validate_title("The Hobbit").is_ok());
/// assert!(validate_title("   ").is_err());
/// ```
pub fn validate_title(title: &str) -> ValidationResult<()> {
    require_title(title)?;

    if title.trim().chars().count() > MAX_TITLE_LENGTH {
        return Err(ValidationError::TooLong {
            field: "title".to_string(),
            max: MAX_TITLE_LENGTH,
        });
    }

    Ok(())
}

/// Checks that a title is not blank. Snapshot lines need nothing more.
pub fn require_title(title: &str) -> ValidationResult<()> {
    if title.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }

    Ok(())
}

/// Validates a cart store book id. Any non-blank string is accepted.
pub fn validate_book_id(book_id: &str) -> ValidationResult<()> {
    if book_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "bookid".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity being set through the cart.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a quantity read from a cart snapshot.
///
/// Zero is allowed (the line simply contributes nothing); negative is not.
pub fn validate_snapshot_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates a unit price.
///
/// ```rust
/// use shelf_core::money::Money;
/// use shelf_core::validation::validate_price;
///
/// assert!(validate_price(Money::new(2595, 1)).is_ok());
/// assert!(validate_price(Money::zero()).is_ok());     // giveaway copy
/// assert!(validate_price(Money::from(-100)).is_err());
/// ```
pub fn validate_price(price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::MustNotBeNegative {
            field: "unitPrice".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates one line of a cart snapshot before it is priced.
///
/// Title length is a cart policy and is not checked here.
pub fn validate_line_item(item: &CartLineItem) -> ValidationResult<()> {
    require_title(&item.title)?;
    validate_price(item.unit_price)?;
    validate_snapshot_quantity(item.quantity)?;
    Ok(())
}

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
