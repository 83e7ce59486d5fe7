//! # Cart Snapshot Model
//!
//! In-memory stand-in for the storefront's cart store. It supplies the
//! line-item snapshot the bundle engine prices and builds the `get-cart`
//! response (raw listing plus totals).
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Operations                                      │
//! │                                                                         │
//! │  Storefront Route         Method                  Cart Change           │
//! │  ────────────────         ──────                  ───────────           │
//! │                                                                         │
//! │  POST add-to-cart ───────► add_item() ──────────► push or qty += n     │
//! │                                                                         │
//! │  PUT update-cart ────────► update_quantity() ───► items[i].qty = n     │
//! │                                                                         │
//! │  DELETE remove-from-cart ► remove_item() ───────► items.remove(i)      │
//! │                                                                         │
//! │  DELETE remove-cart ─────► clear() ─────────────► items.clear()        │
//! │                                                                         │
//! │  GET get-cart ───────────► CartResponse::build() (read only)           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use crate::bundle::BundleDiscountEngine;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{CartLineItem, Totals};
use crate::validation::{validate_book_id, validate_cart_size, validate_price, validate_quantity, validate_title};
use crate::MAX_ITEM_QUANTITY;

/// A line in the cart.
///
/// Title and price are frozen when the book is added, so the quote does not
/// move if the catalog entry is edited afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartItem {
    /// Catalog id of the book.
    #[serde(rename = "bookid")]
    pub book_id: String,

    /// Title at time of adding (frozen).
    pub title: String,

    /// Unit price at time of adding (frozen).
    pub unit_price: Money,

    pub quantity: i64,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// The pricing view of this line.
    pub fn to_line_item(&self) -> CartLineItem {
        CartLineItem::new(self.title.clone(), self.unit_price, self.quantity)
    }
}

/// The shopping cart.
///
/// ## Invariants
/// - Lines are unique by `book_id` (adding the same book increases quantity)
/// - Quantity is always in `1..=MAX_ITEM_QUANTITY`
/// - At most `MAX_CART_ITEMS` lines
/// - Lines keep insertion order, which is the order titles appear in rounds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub items: Vec<CartItem>,

    /// When the cart was created or last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a book or increases its quantity if it is already in the cart.
    ///
    /// When the book is already present the stored title and price are kept.
    pub fn add_item(
        &mut self,
        book_id: &str,
        title: &str,
        unit_price: Money,
        quantity: i64,
    ) -> CoreResult<()> {
        validate_book_id(book_id)?;
        validate_quantity(quantity)?;

        if let Some(item) = self.items.iter_mut().find(|i| i.book_id == book_id) {
            let new_qty = item.quantity + quantity;
            if new_qty > MAX_ITEM_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested: new_qty,
                    max: MAX_ITEM_QUANTITY,
                });
            }
            item.quantity = new_qty;
            return Ok(());
        }

        validate_title(title)?;
        validate_price(unit_price)?;
        validate_cart_size(self.items.len()).map_err(|_| CoreError::CartTooLarge {
            max: crate::MAX_CART_ITEMS,
        })?;

        self.items.push(CartItem {
            book_id: book_id.to_string(),
            title: title.trim().to_string(),
            unit_price,
            quantity,
            added_at: Utc::now(),
        });
        Ok(())
    }

    /// Sets the quantity of a line. Quantity 0 removes it.
    pub fn update_quantity(&mut self, book_id: &str, quantity: i64) -> CoreResult<()> {
        if quantity == 0 {
            return self.remove_item(book_id);
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }
        validate_quantity(quantity)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.book_id == book_id)
            .ok_or_else(|| CoreError::CartItemNotFound(book_id.to_string()))?;
        item.quantity = quantity;
        Ok(())
    }

    /// Removes a line by book id.
    pub fn remove_item(&mut self, book_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|i| i.book_id != book_id);

        if self.items.len() == initial_len {
            Err(CoreError::CartItemNotFound(book_id.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Snapshot handed to the bundle engine, in insertion order.
    pub fn line_items(&self) -> Vec<CartLineItem> {
        self.items.iter().map(CartItem::to_line_item).collect()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

/// The `get-cart` payload: raw listing plus bundle totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartResponse {
    pub status: String,
    pub data: Vec<CartItem>,
    pub totals: Totals,
}

impl CartResponse {
    pub fn build(cart: &Cart, engine: &BundleDiscountEngine) -> CoreResult<Self> {
        let totals = engine.compute_totals(&cart.line_items())?;
        debug!(
            lines = cart.item_count(),
            units = cart.total_quantity(),
            total = %totals.total_price,
            "Cart response built"
        );
        Ok(CartResponse {
            status: "Success".to_string(),
            data: cart.items.clone(),
            totals,
        })
    }
}
