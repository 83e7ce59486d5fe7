//! # Discount Table
//!
//! Maps a bundle size (number of distinct titles bought together in one
//! round) to the discount rate applied to that round.
//!
//! ## Standard Table
//! ```text
//! ┌──────────────┬──────┬──────┬──────┬──────┬──────┬──────┬──────┬──────┐
//! │ bundle size  │  1   │  2   │  3   │  4   │  5   │  6   │  7   │  8+  │
//! ├──────────────┼──────┼──────┼──────┼──────┼──────┼──────┼──────┼──────┤
//! │ discount     │  0%  │ 10%  │ 20%  │ 30%  │ 40%  │ 50%  │ 60%  │  0%  │
//! └──────────────┴──────┴──────┴──────┴──────┴──────┴──────┴──────┴──────┘
//! ```
//!
//! ## Shape Invariants
//! The engine always bundles every title still in the cart. That greedy
//! choice is only optimal while the table never decreases from one bundle
//! size to the next, so custom tables are checked on construction:
//! - tiers start at size 2 (a lone book is never discounted)
//! - tiers are contiguous: no gap between 2 and the largest size
//! - rates never decrease as the size grows
//! - every rate is below 100%
//!
//! Sizes above the largest tier fall back to 0%, matching the storefront's
//! published table.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::types::DiscountRate;
use crate::validation::ValidationResult;

/// Smallest bundle size that may carry a discount.
pub const MIN_DISCOUNTED_BUNDLE: usize = 2;

/// Standard tiers in basis points, indexed from `MIN_DISCOUNTED_BUNDLE`.
const STANDARD_TIERS_BPS: [u32; 6] = [1000, 2000, 3000, 4000, 5000, 6000];

/// One row of the discount table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DiscountTier {
    pub bundle_size: usize,
    pub rate: DiscountRate,
}

impl DiscountTier {
    pub const fn new(bundle_size: usize, rate: DiscountRate) -> Self {
        DiscountTier { bundle_size, rate }
    }
}

/// Read-only bundle-size to discount-rate lookup.
///
/// Built once at startup and shared by reference; it is never mutated
/// after construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountTable {
    /// Rate for bundle size `MIN_DISCOUNTED_BUNDLE + i`.
    rates: Vec<DiscountRate>,
}

impl DiscountTable {
    /// The storefront's published table: 10% for two titles up to 60% for seven.
    pub fn standard() -> Self {
        DiscountTable {
            rates: STANDARD_TIERS_BPS
                .iter()
                .copied()
                .map(DiscountRate::from_bps)
                .collect(),
        }
    }

    /// A table that never discounts.
    pub fn none() -> Self {
        DiscountTable { rates: Vec::new() }
    }

    /// Builds a table from explicit tiers, enforcing the shape invariants.
    ///
    /// Tiers may be given in any order.
    ///
    /// ```rust
    /// use shelf_core::discount::{DiscountTable, DiscountTier};
    /// use shelf_core::types::DiscountRate;
    ///
    /// let table = DiscountTable::from_tiers([
    ///     DiscountTier::new(3, DiscountRate::from_bps(1500)),
    ///     DiscountTier::new(2, DiscountRate::from_bps(500)),
    /// ])
    /// .unwrap();
    /// assert_eq!(table.rate_for(3).bps(), 1500);
    /// assert_eq!(table.rate_for(4).bps(), 0);
    ///
    /// // 20% for pairs but only 10% for triples breaks the greedy bundling
    /// assert!(DiscountTable::from_tiers([
    ///     DiscountTier::new(2, DiscountRate::from_bps(2000)),
    ///     DiscountTier::new(3, DiscountRate::from_bps(1000)),
    /// ])
    /// .is_err());
    /// ```
    pub fn from_tiers<I>(tiers: I) -> ValidationResult<Self>
    where
        I: IntoIterator<Item = DiscountTier>,
    {
        let mut by_size = BTreeMap::new();

        for tier in tiers {
            if tier.bundle_size < MIN_DISCOUNTED_BUNDLE {
                return Err(ValidationError::OutOfRange {
                    field: "bundle size".to_string(),
                    min: MIN_DISCOUNTED_BUNDLE as i64,
                    max: i64::MAX,
                });
            }

            if tier.rate.bps() >= 10_000 {
                return Err(ValidationError::OutOfRange {
                    field: format!("discount for bundle size {}", tier.bundle_size),
                    min: 0,
                    max: 9_999,
                });
            }

            if by_size.insert(tier.bundle_size, tier.rate).is_some() {
                return Err(ValidationError::Duplicate {
                    field: "bundle size".to_string(),
                    value: tier.bundle_size.to_string(),
                });
            }
        }

        let mut rates: Vec<DiscountRate> = Vec::with_capacity(by_size.len());
        for (expected, (size, rate)) in (MIN_DISCOUNTED_BUNDLE..).zip(by_size) {
            if size != expected {
                return Err(ValidationError::InvalidFormat {
                    field: "discount tiers".to_string(),
                    reason: format!("missing tier for bundle size {}", expected),
                });
            }

            if let Some(previous) = rates.last() {
                if rate < *previous {
                    return Err(ValidationError::InvalidFormat {
                        field: "discount tiers".to_string(),
                        reason: format!(
                            "rate for bundle size {} ({}bps) is lower than for size {} ({}bps)",
                            size,
                            rate.bps(),
                            size - 1,
                            previous.bps()
                        ),
                    });
                }
            }

            rates.push(rate);
        }

        Ok(DiscountTable { rates })
    }

    /// Discount rate for a round bundling `bundle_size` distinct titles.
    ///
    /// Sizes outside the table (0, 1, or above the largest tier) get 0%.
    pub fn rate_for(&self, bundle_size: usize) -> DiscountRate {
        bundle_size
            .checked_sub(MIN_DISCOUNTED_BUNDLE)
            .and_then(|i| self.rates.get(i))
            .copied()
            .unwrap_or_default()
    }

    /// Largest bundle size that still earns a discount, if any.
    pub fn max_bundle_size(&self) -> Option<usize> {
        if self.rates.is_empty() {
            None
        } else {
            Some(MIN_DISCOUNTED_BUNDLE + self.rates.len() - 1)
        }
    }

    /// The table as tiers, smallest bundle first.
    pub fn tiers(&self) -> impl Iterator<Item = DiscountTier> + '_ {
        (MIN_DISCOUNTED_BUNDLE..)
            .zip(self.rates.iter())
            .map(|(size, rate)| DiscountTier::new(size, *rate))
    }
}

impl Default for DiscountTable {
    fn default() -> Self {
        DiscountTable::standard()
    }
}

/// Parses the compact `size:percent` list used by environment overrides.
///
/// ```rust
/// use shelf_core::discount::DiscountTable;
///
/// let table: DiscountTable = "2:5, 3:12.5".parse().unwrap();
/// assert_eq!(table.rate_for(3).bps(), 1250);
/// ```
impl FromStr for DiscountTable {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |entry: &str| ValidationError::InvalidFormat {
            field: "discount tiers".to_string(),
            reason: format!("expected 'size:percent', got '{}'", entry),
        };

        let mut tiers = Vec::new();
        for entry in s.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (size, pct) = entry.split_once(':').ok_or_else(|| invalid(entry))?;
            let size: usize = size.trim().parse().map_err(|_| invalid(entry))?;
            let pct: f64 = pct.trim().parse().map_err(|_| invalid(entry))?;
            if !pct.is_finite() || pct < 0.0 {
                return Err(invalid(entry));
            }
            tiers.push(DiscountTier::new(size, DiscountRate::from_percentage(pct)));
        }

        DiscountTable::from_tiers(tiers)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(size: usize, bps: u32) -> DiscountTier {
        DiscountTier::new(size, DiscountRate::from_bps(bps))
    }

    #[test]
    fn test_standard_table_values() {
        let table = DiscountTable::standard();
        let expected = [(2, 1000), (3, 2000), (4, 3000), (5, 4000), (6, 5000), (7, 6000)];
        for (size, bps) in expected {
            assert_eq!(table.rate_for(size).bps(), bps, "bundle size {}", size);
        }
    }

    #[test]
    fn test_standard_table_edges_are_zero() {
        let table = DiscountTable::standard();
        assert!(table.rate_for(0).is_zero());
        assert!(table.rate_for(1).is_zero());
        assert!(table.rate_for(8).is_zero());
        assert!(table.rate_for(usize::MAX).is_zero());
        assert_eq!(table.max_bundle_size(), Some(7));
    }

    #[test]
    fn test_standard_table_is_monotonic() {
        let rates: Vec<u32> = DiscountTable::standard().tiers().map(|t| t.rate.bps()).collect();
        assert!(rates.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_from_tiers_round_trips_standard() {
        let standard = DiscountTable::standard();
        let rebuilt = DiscountTable::from_tiers(standard.tiers()).unwrap();
        assert_eq!(rebuilt, standard);
    }

    #[test]
    fn test_from_tiers_accepts_flat_steps() {
        let table = DiscountTable::from_tiers([tier(2, 1000), tier(3, 1000)]).unwrap();
        assert_eq!(table.rate_for(3).bps(), 1000);
    }

    #[test]
    fn test_from_tiers_rejects_single_book_tier() {
        let err = DiscountTable::from_tiers([tier(1, 500)]).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));
    }

    #[test]
    fn test_from_tiers_rejects_full_discount() {
        assert!(DiscountTable::from_tiers([tier(2, 10_000)]).is_err());
        assert!(DiscountTable::from_tiers([tier(2, 9_999)]).is_ok());
    }

    #[test]
    fn test_from_tiers_rejects_gap() {
        let err = DiscountTable::from_tiers([tier(2, 1000), tier(4, 3000)]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn test_from_tiers_rejects_decreasing_rate() {
        let err = DiscountTable::from_tiers([tier(2, 2000), tier(3, 1000)]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidFormat { .. }));
    }

    #[test]
    fn test_from_tiers_rejects_duplicate() {
        let err = DiscountTable::from_tiers([tier(2, 1000), tier(2, 1000)]).unwrap_err();
        assert!(matches!(err, ValidationError::Duplicate { .. }));
    }

    #[test]
    fn test_empty_table_never_discounts() {
        let table = DiscountTable::from_tiers(Vec::<DiscountTier>::new()).unwrap();
        assert_eq!(table, DiscountTable::none());
        assert!(table.rate_for(2).is_zero());
        assert_eq!(table.max_bundle_size(), None);
    }

    #[test]
    fn test_parse_compact_list() {
        let table: DiscountTable = "2:10,3:20,4:30,5:40,6:50,7:60".parse().unwrap();
        assert_eq!(table, DiscountTable::standard());

        assert!("2-10".parse::<DiscountTable>().is_err());
        assert!("2:ten".parse::<DiscountTable>().is_err());
        assert!("2:-5".parse::<DiscountTable>().is_err());
        assert!("3:10".parse::<DiscountTable>().is_err());
        assert_eq!("".parse::<DiscountTable>().unwrap(), DiscountTable::none());
    }
}
