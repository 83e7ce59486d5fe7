//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  Summing bundle rounds in floating point:                               │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A cart with 40 rounds accumulates 40 of those errors into the total.   │
//! │                                                                         │
//! │  OUR SOLUTION: Exact Decimals                                           │
//! │    Prices are base-10 decimals (259, 259.5, 12.99). A round's discount  │
//! │    is base x rate computed exactly, with no rounding, and totals are    │
//! │    exact sums. Totals always reconcile: base - discount == price.       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use shelf_core::money::Money;
//! use shelf_core::types::DiscountRate;
//!
//! let base = Money::from(259) + Money::from(199);
//! let discount = base.percentage_of(DiscountRate::from_bps(1000)); // 10%
//! assert_eq!(discount, Money::new(458, 1)); // 45.8
//! assert_eq!(base - discount, Money::new(4122, 1)); // 412.2
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Sub};
use ts_rs::TS;

use crate::types::DiscountRate;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary amount in the store's currency unit.
///
/// ## Design Decisions
/// - **Decimal**: prices such as 259.5 are held exactly
/// - **Signed**: arithmetic stays closed under subtraction; validation
///   keeps prices and totals non-negative
/// - **Wire format**: a plain JSON number (`400`, `45.8`)
///
/// ## Where Money Flows
/// ```text
/// CartLineItem.unit_price ──► BundleRound.base_price ──► BundleRound.discount
///                                        │                       │
///                                        ▼                       ▼
///                              Totals.total_base_price   Totals.total_discount
///                                        └──────────┬────────────┘
///                                                   ▼
///                                         Totals.total_price
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "number")] Decimal);

impl Money {
    /// Creates an amount from an integer mantissa and a decimal scale.
    ///
    /// ```rust
    /// use shelf_core::money::Money;
    ///
    /// assert_eq!(Money::new(2595, 1).to_string(), "259.5");
    /// assert_eq!(Money::new(1299, 2).to_string(), "12.99");
    /// ```
    #[inline]
    pub fn new(num: i64, scale: u32) -> Self {
        Money(Decimal::new(num, scale))
    }

    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Adds two amounts, returning `None` if the result is out of range.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Multiplies a unit price by a count, returning `None` if the result is
    /// out of range.
    #[inline]
    pub fn checked_mul_count(self, count: i64) -> Option<Money> {
        self.0.checked_mul(Decimal::from(count)).map(Money)
    }

    /// Returns `rate` of this amount, exactly.
    ///
    /// ```rust
    /// use shelf_core::money::Money;
    /// use shelf_core::types::DiscountRate;
    ///
    /// let base = Money::new(4115, 2); // 41.15
    /// assert_eq!(base.percentage_of(DiscountRate::from_bps(3000)), Money::new(12345, 3));
    /// ```
    pub fn percentage_of(&self, rate: DiscountRate) -> Money {
        Money(self.0 * rate.fraction())
    }

    /// Expresses `part` as a percentage of this amount.
    ///
    /// Returns `0.0` when this amount is zero so empty carts never produce NaN.
    pub fn share_percent(&self, part: Money) -> f64 {
        match part.0.checked_div(self.0) {
            Some(share) => (share * Decimal::ONE_HUNDRED)
                .normalize()
                .to_f64()
                .unwrap_or_default(),
            None => 0.0,
        }
    }

    /// The amount as a JSON-friendly float.
    pub fn to_f64(&self) -> f64 {
        self.0.normalize().to_f64().unwrap_or_default()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

impl From<i64> for Money {
    fn from(amount: i64) -> Self {
        Money(Decimal::from(amount))
    }
}

/// Plain decimal (`412.2`). Currency formatting is localized on the frontend.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.normalize())
    }
}

/// Whole amounts serialize as integers, fractional ones as floats.
impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let amount = self.0.normalize();
        match amount.to_i64() {
            Some(whole) if amount.scale() == 0 => serializer.serialize_i64(whole),
            _ => serializer.serialize_f64(self.to_f64()),
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
