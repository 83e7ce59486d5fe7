//! # shelf-core: Pure Pricing Logic for the Bookstore
//!
//! This crate prices the shopping cart. It contains the bundle discount
//! engine and the types around it as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Bookstore Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               Storefront (React) + HTTP routes                  │   │
//! │  │    Catalog ──► Add to cart ──► Cart page (items + totals)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ cart snapshot                          │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ shelf-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │ discount  │  │  bundle   │  │   cart    │  │   │
//! │  │   │ LineItem  │  │  Table    │  │  Engine   │  │ snapshot  │  │   │
//! │  │   │  Totals   │  │  Tiers    │  │  Rounds   │  │ response  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Line items, rounds, totals, discount rates
//! - [`money`] - Exact decimal money type
//! - [`discount`] - Bundle-size to discount-rate table
//! - [`bundle`] - The bundle discount engine
//! - [`cart`] - In-memory cart that produces snapshots and responses
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use shelf_core::{compute_totals, CartLineItem, Money};
//!
//! let totals = compute_totals(&[
//!     CartLineItem::new("A", Money::from(100), 2),
//!     CartLineItem::new("B", Money::from(100), 1),
//!     CartLineItem::new("C", Money::from(100), 1),
//! ])
//! .unwrap();
//!
//! assert_eq!(totals.total_price, Money::from(340));
//! assert_eq!(totals.discount_percent, 15.0);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod bundle;
pub mod cart;
pub mod discount;
pub mod error;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use bundle::{compute_totals, BundleDiscountEngine, BundleRounds};
pub use cart::{Cart, CartItem, CartResponse};
pub use discount::{DiscountTable, DiscountTier};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line when set through the cart.
///
/// Snapshots from the cart store are not capped; the engine only rejects
/// negative quantities.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Maximum length of a book title added through the cart, in characters.
pub const MAX_TITLE_LENGTH: usize = 200;
