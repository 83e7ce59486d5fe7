//! # Bundle Discount Engine
//!
//! Prices a cart under the "distinct-title bundle" scheme: the more
//! different books bought together, the bigger the discount on that bundle.
//!
//! ## How Rounds Are Formed
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Cart: A x2 (100)   B x1 (100)   C x1 (100)                             │
//! │                                                                         │
//! │  Ledger (first-seen order)     remaining                                │
//! │  ─────────────────────────     ─────────                                │
//! │  A  100                        2                                        │
//! │  B  100                        1                                        │
//! │  C  100                        1                                        │
//! │                                                                         │
//! │  Round 1: {A, B, C}  size 3 → 20%   base 300    discount 60             │
//! │  Round 2: {A}        size 1 →  0%   base 100    discount 0              │
//! │  ────────────────────────────────────────────────────────────────       │
//! │  Totals:                            base 400    discount 60             │
//! │                                     price 340   (15% off)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every round takes exactly one unit of each title that still has units
//! left. With a table that never decreases in bundle size this greedy
//! choice is never worse than splitting titles across rounds (see
//! [`crate::discount`] for the shape checks).
//!
//! ## Complexity
//! Consecutive rounds stay identical until some title runs out, so the
//! ledger hands them out as runs: one run per distinct quantity level.
//! Totals cost `O(titles²)` whatever the quantities are. Only the
//! per-round breakdown materializes every round.
//!
//! ## Thread Safety
//! The engine only holds the immutable discount table. Each call builds its
//! own ledger, so one engine can be shared across threads by reference.

use std::collections::HashMap;
use std::iter::FusedIterator;
use std::sync::OnceLock;

use tracing::{debug, warn};

use crate::discount::DiscountTable;
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{BundleQuote, BundleRound, CartLineItem, Totals};
use crate::validation::validate_line_item;

// =============================================================================
// Title Ledger
// =============================================================================

/// A title as it was first seen in the cart.
#[derive(Debug, Clone)]
struct LedgerTitle {
    title: String,
    unit_price: Money,
}

/// Cart snapshot collapsed to one entry per title.
///
/// `titles` keeps first-seen order, which is the order titles are listed
/// inside every [`BundleRound`]. `remaining[i]` is the number of units of
/// `titles[i]` not yet placed in a round.
#[derive(Debug, Clone)]
struct TitleLedger {
    titles: Vec<LedgerTitle>,
    remaining: Vec<i64>,
}

impl TitleLedger {
    /// Validates each line and merges lines that share a title.
    ///
    /// ## Price Conflicts
    /// When two lines share a title but disagree on price, the first line's
    /// price is kept and the disagreement is logged at WARN.
    ///
    /// ## Overflow
    /// The undiscounted grand total (sum of price x units) is checked here.
    /// Every run's base price and every running total is bounded by it.
    fn from_items(items: &[CartLineItem]) -> CoreResult<Self> {
        let mut positions: HashMap<&str, usize> = HashMap::with_capacity(items.len());
        let mut titles: Vec<LedgerTitle> = Vec::with_capacity(items.len());
        let mut remaining: Vec<i64> = Vec::with_capacity(items.len());

        for (index, item) in items.iter().enumerate() {
            validate_line_item(item).map_err(|source| CoreError::InvalidLine { index, source })?;

            match positions.get(item.title.as_str()) {
                Some(&pos) => {
                    let kept = titles[pos].unit_price;
                    if kept != item.unit_price {
                        warn!(
                            title = %item.title,
                            kept = %kept,
                            ignored = %item.unit_price,
                            line = index,
                            "Conflicting unit price for title; keeping first occurrence"
                        );
                    }
                    remaining[pos] = remaining[pos]
                        .checked_add(item.quantity)
                        .ok_or_else(|| CoreError::AmountOverflow {
                            context: format!("quantity of '{}'", item.title),
                        })?;
                }
                None => {
                    positions.insert(item.title.as_str(), titles.len());
                    titles.push(LedgerTitle {
                        title: item.title.clone(),
                        unit_price: item.unit_price,
                    });
                    remaining.push(item.quantity);
                }
            }
        }

        let ledger = TitleLedger { titles, remaining };
        ledger.undiscounted_total()?;
        Ok(ledger)
    }

    /// Sum of `unit_price x remaining` over all titles, overflow-checked.
    fn undiscounted_total(&self) -> CoreResult<Money> {
        let overflow = || CoreError::AmountOverflow {
            context: "cart base price".to_string(),
        };

        self.titles
            .iter()
            .zip(&self.remaining)
            .try_fold(Money::zero(), |acc, (entry, &count)| {
                let line = entry.unit_price.checked_mul_count(count).ok_or_else(overflow)?;
                acc.checked_add(line).ok_or_else(overflow)
            })
    }

    /// Takes the next run of identical rounds off the ledger.
    ///
    /// A run holds one unit of every title with units left, repeated until
    /// the scarcest of those titles is used up.
    fn next_run(&mut self) -> Option<RoundRun> {
        let repeats = self.remaining.iter().copied().filter(|&count| count > 0).min()?;

        let mut members = Vec::new();
        let mut base_price = Money::zero();
        for (index, count) in self.remaining.iter_mut().enumerate() {
            if *count > 0 {
                members.push(index);
                base_price += self.titles[index].unit_price;
                *count -= repeats;
            }
        }

        Some(RoundRun {
            members,
            base_price,
            repeats,
        })
    }

    fn rounds_left(&self) -> i64 {
        self.remaining.iter().copied().max().unwrap_or(0).max(0)
    }
}

/// `repeats` consecutive rounds over the same ledger titles.
#[derive(Debug, Clone)]
struct RoundRun {
    members: Vec<usize>,
    base_price: Money,
    repeats: i64,
}

// =============================================================================
// Round Iterator
// =============================================================================

/// Lazily produces the bundling rounds for one cart snapshot.
///
/// Created by [`BundleDiscountEngine::rounds`]. Owns its ledger, so the
/// caller's line items are never touched.
#[derive(Debug, Clone)]
pub struct BundleRounds<'t> {
    ledger: TitleLedger,
    table: &'t DiscountTable,
    current: Option<BundleRound>,
    repeats_left: i64,
}

impl<'t> BundleRounds<'t> {
    fn new(ledger: TitleLedger, table: &'t DiscountTable) -> Self {
        BundleRounds {
            ledger,
            table,
            current: None,
            repeats_left: 0,
        }
    }
}

impl Iterator for BundleRounds<'_> {
    type Item = BundleRound;

    fn next(&mut self) -> Option<BundleRound> {
        if self.repeats_left == 0 {
            let run = self.ledger.next_run()?;
            let titles = run
                .members
                .iter()
                .map(|&index| self.ledger.titles[index].title.clone())
                .collect();
            self.current = Some(priced_round(self.table, titles, run.base_price));
            self.repeats_left = run.repeats;
        }

        self.repeats_left -= 1;
        if self.repeats_left == 0 {
            self.current.take()
        } else {
            self.current.clone()
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let rounds_left = self.repeats_left.saturating_add(self.ledger.rounds_left());
        let rounds_left = usize::try_from(rounds_left).unwrap_or(usize::MAX);
        (rounds_left, Some(rounds_left))
    }
}

impl FusedIterator for BundleRounds<'_> {}

fn priced_round(table: &DiscountTable, titles: Vec<String>, base_price: Money) -> BundleRound {
    let bundle_size = titles.len();
    let discount_rate = table.rate_for(bundle_size);

    BundleRound {
        titles,
        bundle_size,
        base_price,
        discount_rate,
        discount: base_price.percentage_of(discount_rate),
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Computes cart totals under a bundle discount table.
///
/// ## Usage
/// ```rust
/// use shelf_core::bundle::BundleDiscountEngine;
/// use shelf_core::money::Money;
/// use shelf_core::types::CartLineItem;
///
/// let engine = BundleDiscountEngine::standard();
/// let totals = engine
///     .compute_totals(&[
///         CartLineItem::new("Emma", Money::from(259), 1),
///         CartLineItem::new("Persuasion", Money::from(199), 1),
///     ])
///     .unwrap();
///
/// assert_eq!(totals.total_base_price, Money::from(458));
/// assert_eq!(totals.total_discount, Money::new(458, 1));
/// assert_eq!(totals.total_price, Money::new(4122, 1));
/// assert_eq!(totals.discount_percent, 10.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct BundleDiscountEngine {
    table: DiscountTable,
}

impl BundleDiscountEngine {
    pub fn new(table: DiscountTable) -> Self {
        BundleDiscountEngine { table }
    }

    /// Engine using the storefront's published 10%..60% table.
    pub fn standard() -> Self {
        BundleDiscountEngine::new(DiscountTable::standard())
    }

    pub fn table(&self) -> &DiscountTable {
        &self.table
    }

    /// Validates the snapshot and returns its bundling rounds.
    pub fn rounds(&self, items: &[CartLineItem]) -> CoreResult<BundleRounds<'_>> {
        Ok(BundleRounds::new(TitleLedger::from_items(items)?, &self.table))
    }

    /// Computes the cart totals.
    ///
    /// An empty cart (or one where every quantity is 0) yields all-zero
    /// totals with `discount_percent == 0.0`.
    pub fn compute_totals(&self, items: &[CartLineItem]) -> CoreResult<Totals> {
        let mut ledger = TitleLedger::from_items(items)?;
        let overflow = || CoreError::AmountOverflow {
            context: "bundle totals".to_string(),
        };

        let mut rounds: i64 = 0;
        let mut base = Money::zero();
        let mut discount = Money::zero();
        while let Some(run) = ledger.next_run() {
            let rate = self.table.rate_for(run.members.len());
            let run_base = run.base_price.checked_mul_count(run.repeats).ok_or_else(overflow)?;
            let run_discount = run
                .base_price
                .percentage_of(rate)
                .checked_mul_count(run.repeats)
                .ok_or_else(overflow)?;

            rounds = rounds.saturating_add(run.repeats);
            base = base.checked_add(run_base).ok_or_else(overflow)?;
            discount = discount.checked_add(run_discount).ok_or_else(overflow)?;
        }

        let totals = Totals::from_sums(base, discount);
        debug!(
            lines = items.len(),
            rounds,
            base = %totals.total_base_price,
            discount = %totals.total_discount,
            "Bundle totals computed"
        );
        Ok(totals)
    }

    /// Computes the totals together with the per-round breakdown.
    pub fn quote(&self, items: &[CartLineItem]) -> CoreResult<BundleQuote> {
        let rounds: Vec<BundleRound> = self.rounds(items)?.collect();
        let base: Money = rounds.iter().map(|r| r.base_price).sum();
        let discount: Money = rounds.iter().map(|r| r.discount).sum();

        debug!(lines = items.len(), rounds = rounds.len(), "Bundle quote computed");
        Ok(BundleQuote {
            rounds,
            totals: Totals::from_sums(base, discount),
        })
    }
}

/// Computes totals with the standard table.
///
/// Shorthand for `BundleDiscountEngine::standard().compute_totals(items)`
/// without rebuilding the table on every call.
pub fn compute_totals(items: &[CartLineItem]) -> CoreResult<Totals> {
    static STANDARD: OnceLock<BundleDiscountEngine> = OnceLock::new();
    STANDARD
        .get_or_init(BundleDiscountEngine::standard)
        .compute_totals(items)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discount::DiscountTier;
    use crate::error::ValidationError;
    use crate::types::DiscountRate;
    use crate::MAX_TITLE_LENGTH;
    use rust_decimal::Decimal;

    fn line(title: &str, price: i64, quantity: i64) -> CartLineItem {
        CartLineItem::new(title, Money::from(price), quantity)
    }

    #[test]
    fn test_empty_cart_is_all_zero() {
        let totals = compute_totals(&[]).unwrap();
        assert_eq!(totals, Totals::empty());
        assert!(!totals.discount_percent.is_nan());
    }

    #[test]
    fn test_all_zero_quantities_is_all_zero() {
        let totals = compute_totals(&[line("A", 100, 0), line("B", 250, 0)]).unwrap();
        assert_eq!(totals, Totals::empty());
    }

    #[test]
    fn test_single_title_single_unit() {
        let totals = compute_totals(&[line("A", 100, 1)]).unwrap();
        assert_eq!(totals.total_base_price, Money::from(100));
        assert!(totals.total_discount.is_zero());
        assert_eq!(totals.total_price, Money::from(100));
        assert_eq!(totals.discount_percent, 0.0);
    }

    #[test]
    fn test_two_distinct_titles() {
        let totals = compute_totals(&[line("A", 100, 1), line("B", 50, 1)]).unwrap();
        assert_eq!(totals.total_base_price, Money::from(150));
        assert_eq!(totals.total_discount, Money::from(15));
        assert_eq!(totals.total_price, Money::from(135));
        assert_eq!(totals.discount_percent, 10.0);
    }

    #[test]
    fn test_fractional_discount_is_exact() {
        let totals = compute_totals(&[line("Emma", 259, 1), line("Persuasion", 199, 1)]).unwrap();
        assert_eq!(totals.total_base_price, Money::from(458));
        assert_eq!(totals.total_discount, Money::new(458, 1));
        assert_eq!(totals.total_price, Money::new(4122, 1));
        assert_eq!(totals.discount_percent, 10.0);

        let totals = compute_totals(&[line("A", 10, 1), line("B", 5, 1)]).unwrap();
        assert_eq!(totals.total_discount, Money::new(15, 1));
        assert_eq!(totals.total_price, Money::new(135, 1));
    }

    #[test]
    fn test_fractional_prices() {
        let items = [
            CartLineItem::new("A", Money::new(2595, 1), 2),
            CartLineItem::new("B", Money::new(1999, 2), 1),
        ];
        let totals = compute_totals(&items).unwrap();
        // {A, B} at 10% of 279.49, then A alone
        assert_eq!(totals.total_base_price, Money::new(53899, 2));
        assert_eq!(totals.total_discount, Money::new(27949, 3));
        assert_eq!(
            totals.total_price,
            totals.total_base_price - totals.total_discount
        );
    }

    #[test]
    fn test_three_titles_uneven_quantities() {
        let items = [line("A", 100, 2), line("B", 100, 1), line("C", 100, 1)];
        let quote = BundleDiscountEngine::standard().quote(&items).unwrap();

        assert_eq!(quote.rounds.len(), 2);
        assert_eq!(quote.rounds[0].titles, vec!["A", "B", "C"]);
        assert_eq!(quote.rounds[0].bundle_size, 3);
        assert_eq!(quote.rounds[0].base_price, Money::from(300));
        assert_eq!(quote.rounds[0].discount, Money::from(60));
        assert_eq!(quote.rounds[1].titles, vec!["A"]);
        assert!(quote.rounds[1].discount.is_zero());

        let totals = quote.totals;
        assert_eq!(totals.total_base_price, Money::from(400));
        assert_eq!(totals.total_discount, Money::from(60));
        assert_eq!(totals.total_price, Money::from(340));
        assert_eq!(totals.discount_percent, 15.0);
    }

    #[test]
    fn test_quote_and_compute_totals_agree() {
        let items = [
            CartLineItem::new("A", Money::new(1299, 2), 3),
            CartLineItem::new("B", Money::new(899, 2), 1),
            CartLineItem::new("C", Money::new(45, 1), 2),
        ];
        let engine = BundleDiscountEngine::standard();
        assert_eq!(engine.quote(&items).unwrap().totals, engine.compute_totals(&items).unwrap());
    }

    #[test]
    fn test_identical_rounds_are_repeated() {
        let items = [line("A", 100, 3), line("B", 100, 3), line("C", 100, 1)];
        let rounds: Vec<BundleRound> = BundleDiscountEngine::standard().rounds(&items).unwrap().collect();

        assert_eq!(rounds.len(), 3);
        assert_eq!(rounds[0].titles, vec!["A", "B", "C"]);
        assert_eq!(rounds[1].titles, vec!["A", "B"]);
        assert_eq!(rounds[1], rounds[2]);
    }

    #[test]
    fn test_huge_quantity_totals() {
        let items = [line("A", 10, 1_000_000_000), line("B", 10, 1)];
        let totals = compute_totals(&items).unwrap();

        assert_eq!(totals.total_base_price, Money::from(10_000_000_010));
        assert_eq!(totals.total_discount, Money::from(2));
        assert_eq!(totals.total_price, Money::from(10_000_000_008));

        let engine = BundleDiscountEngine::standard();
        let rounds = engine.rounds(&items).unwrap();
        assert_eq!(rounds.size_hint(), (1_000_000_000, Some(1_000_000_000)));
    }

    #[test]
    fn test_lines_with_same_title_are_merged() {
        let split = [line("A", 100, 1), line("B", 100, 1), line("A", 100, 1)];
        let merged = [line("A", 100, 2), line("B", 100, 1)];
        assert_eq!(compute_totals(&split).unwrap(), compute_totals(&merged).unwrap());
    }

    #[test]
    fn test_price_conflict_keeps_first_occurrence() {
        let items = [line("A", 100, 1), line("A", 900, 1)];
        let totals = compute_totals(&items).unwrap();
        // Two rounds of a lone "A" at the first price
        assert_eq!(totals.total_base_price, Money::from(200));
        assert!(totals.total_discount.is_zero());
    }

    #[test]
    fn test_rounds_list_titles_in_first_seen_order() {
        let items = [line("Zed", 100, 1), line("Alpha", 100, 1), line("Mid", 100, 1)];
        let quote = BundleDiscountEngine::standard().quote(&items).unwrap();
        assert_eq!(quote.rounds[0].titles, vec!["Zed", "Alpha", "Mid"]);
    }

    #[test]
    fn test_long_titles_are_priced() {
        let title = "T".repeat(MAX_TITLE_LENGTH + 1);
        let totals = compute_totals(&[line(&title, 100, 1), line("B", 100, 1)]).unwrap();
        assert_eq!(totals.total_discount, Money::from(20));
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let err = compute_totals(&[line("A", 100, 1), line("B", 100, -1)]).unwrap_err();
        match err {
            CoreError::InvalidLine { index, source } => {
                assert_eq!(index, 1);
                assert!(matches!(source, ValidationError::MustNotBeNegative { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_price_is_rejected() {
        let err = compute_totals(&[line("A", -100, 1)]).unwrap_err();
        assert!(matches!(err, CoreError::InvalidLine { index: 0, .. }));
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let err = compute_totals(&[line("  ", 100, 1)]).unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidLine {
                source: ValidationError::Required { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_overflowing_cart_is_rejected() {
        let items = [CartLineItem::new("A", Money::from_decimal(Decimal::MAX), 2)];
        let err = compute_totals(&items).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
    }

    #[test]
    fn test_free_books_do_not_divide_by_zero() {
        let totals = compute_totals(&[line("A", 0, 2), line("B", 0, 1)]).unwrap();
        assert_eq!(totals, Totals::empty());
    }

    #[test]
    fn test_custom_table() {
        let table = DiscountTable::from_tiers([
            DiscountTier::new(2, DiscountRate::from_bps(500)),
            DiscountTier::new(3, DiscountRate::from_bps(500)),
        ])
        .unwrap();
        let engine = BundleDiscountEngine::new(table);

        let totals = engine
            .compute_totals(&[line("A", 1000, 1), line("B", 1000, 1), line("C", 1000, 1)])
            .unwrap();
        assert_eq!(totals.total_discount, Money::from(150));
    }

    #[test]
    fn test_rounds_size_hint_matches_largest_quantity() {
        let engine = BundleDiscountEngine::standard();
        let mut rounds = engine.rounds(&[line("A", 100, 4), line("B", 100, 2)]).unwrap();
        assert_eq!(rounds.size_hint(), (4, Some(4)));
        rounds.next();
        assert_eq!(rounds.size_hint(), (3, Some(3)));
        assert_eq!(rounds.count(), 3);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let items = vec![line("A", 100, 2), line("B", 100, 1)];
        let before = items.clone();
        compute_totals(&items).unwrap();
        assert_eq!(items, before);
    }
}
