//! # Domain Types
//!
//! Types that flow into and out of the bundle discount engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  INPUT                       PER ROUND                OUTPUT            │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────────┐   │
//! │  │  CartLineItem   │   │  BundleRound    │   │      Totals         │   │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────────  │   │
//! │  │  title          │──►│  titles         │──►│  total_base_price   │   │
//! │  │  unit_price     │   │  bundle_size    │   │  total_discount     │   │
//! │  │  quantity       │   │  base_price     │   │  total_price        │   │
//! │  └─────────────────┘   │  discount_rate  │   │  discount_percent   │   │
//! │                        │  discount       │   └─────────────────────┘   │
//! │  ┌─────────────────┐   └─────────────────┘                             │
//! │  │  DiscountRate   │                                                    │
//! │  │  bps (u32)      │   BundleQuote = rounds + totals                    │
//! │  │  1000 = 10%     │                                                    │
//! │  └─────────────────┘                                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Discount rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000, so every tier in the bundle table
/// (10% .. 60%) is an exact integer and discount math never touches floats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a rate from a percentage, rounded to the nearest basis point.
    ///
    /// Negative or NaN input saturates to zero.
    pub fn from_percentage(pct: f64) -> Self {
        DiscountRate((pct * 100.0).round() as u32)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (10.0 for 10%).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Returns the rate as an exact fraction in `[0, 1]` (0.10 for 10%).
    #[inline]
    pub fn fraction(&self) -> Decimal {
        Decimal::new(i64::from(self.0), 4)
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Cart Line Item
// =============================================================================

/// One line of a cart snapshot as the cart store hands it over.
///
/// Only the three pricing fields are read; anything else on the stored
/// record (`bookid`, `image`, `author`, timestamps) is ignored on
/// deserialization. `price` is accepted as an alias of `unitPrice` because
/// that is what the storefront's cart documents call it. The generated
/// TypeScript type only names `unitPrice`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CartLineItem {
    /// Book title. Lines with the same title are one product for bundling.
    pub title: String,

    /// Price of one unit; any non-negative number, fractions included.
    #[serde(alias = "price")]
    #[ts(rename = "unitPrice")]
    pub unit_price: Money,

    /// Units of this title on the line.
    pub quantity: i64,
}

impl CartLineItem {
    pub fn new(title: impl Into<String>, unit_price: Money, quantity: i64) -> Self {
        CartLineItem {
            title: title.into(),
            unit_price,
            quantity,
        }
    }
}

// =============================================================================
// Bundle Round
// =============================================================================

/// One pass of the bundling loop: a single unit of every title that still
/// had stock in the cart at that point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BundleRound {
    /// Titles bundled this round, in the order they first appeared in the cart.
    pub titles: Vec<String>,

    /// Number of distinct titles in the bundle.
    pub bundle_size: usize,

    /// Sum of one unit price per bundled title.
    pub base_price: Money,

    /// Rate looked up for `bundle_size`.
    pub discount_rate: DiscountRate,

    /// `base_price` x `discount_rate`.
    pub discount: Money,
}

// =============================================================================
// Totals
// =============================================================================

/// Cart totals after bundle discounts.
///
/// Serialized camelCase so it can sit next to the raw cart listing in the
/// storefront's `get-cart` response.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Totals {
    pub total_base_price: Money,
    pub total_discount: Money,
    /// Always `total_base_price - total_discount`.
    pub total_price: Money,
    /// `total_discount / total_base_price * 100`, or 0 for an empty cart.
    pub discount_percent: f64,
}

impl Totals {
    /// Totals of an empty cart: all zero, never NaN.
    pub const fn empty() -> Self {
        Totals {
            total_base_price: Money::zero(),
            total_discount: Money::zero(),
            total_price: Money::zero(),
            discount_percent: 0.0,
        }
    }

    /// Derives the price and percentage from the two accumulated sums.
    pub fn from_sums(total_base_price: Money, total_discount: Money) -> Self {
        Totals {
            total_base_price,
            total_discount,
            total_price: total_base_price - total_discount,
            discount_percent: total_base_price.share_percent(total_discount),
        }
    }
}

impl Default for Totals {
    fn default() -> Self {
        Totals::empty()
    }
}

// =============================================================================
// Bundle Quote
// =============================================================================

/// Totals plus the round-by-round breakdown that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BundleQuote {
    pub rounds: Vec<BundleRound>,
    pub totals: Totals,
}

impl BundleQuote {
    /// Number of units of `title` consumed across all rounds.
    pub fn units_of(&self, title: &str) -> usize {
        self.rounds
            .iter()
            .filter(|round| round.titles.iter().any(|t| t == title))
            .count()
    }

    /// Total units consumed across all rounds.
    pub fn total_units(&self) -> usize {
        self.rounds.iter().map(|round| round.bundle_size).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
