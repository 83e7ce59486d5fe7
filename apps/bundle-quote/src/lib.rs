//! # bundle-quote
//!
//! Prices a cart snapshot from the command line. The input is the cart
//! store's listing as JSON; the output is the `get-cart` response the
//! storefront renders (raw listing plus bundle totals).
//!
//! ## Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  argv ──► CliArgs (clap) ──► QuoteConfig::load ──► DiscountTable        │
//! │                                                          │              │
//! │  file/stdin ──► parse_snapshot ──► Vec<CartLineItem> ────┤              │
//! │                     │                                    ▼              │
//! │                     └── raw records ──────────► QuoteResponse ──► JSON  │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shelf_core::{BundleDiscountEngine, BundleRound, CartLineItem, Totals};
use tracing::debug;

pub use config::{ConfigError, QuoteConfig};

// =============================================================================
// Command Line
// =============================================================================

/// Reads a cart snapshot (a JSON array of line items, or `{"items": [...]}`)
/// and prints the cart with its bundle totals.
#[derive(Debug, Clone, Parser)]
#[command(name = "bundle-quote", version)]
pub struct CliArgs {
    /// Config file (default: $SHELF_CONFIG or the user config dir)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Include the per-round bundle breakdown
    #[arg(short, long)]
    pub breakdown: bool,

    /// Print the JSON on a single line
    #[arg(long)]
    pub compact: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub print_config: bool,

    /// Cart snapshot file; stdin when omitted or "-"
    #[arg(value_name = "CART_JSON_FILE")]
    pub input: Option<PathBuf>,
}

impl CliArgs {
    /// The snapshot file to read, or `None` for stdin.
    pub fn input_path(&self) -> Option<&Path> {
        self.input.as_deref().filter(|path| *path != Path::new("-"))
    }
}

// =============================================================================
// Snapshot Parsing
// =============================================================================

/// Accepted input shapes: a bare listing, or the listing under `items`
/// (or `data`, as in a saved `get-cart` response).
#[derive(Deserialize)]
#[serde(untagged)]
enum SnapshotDocument {
    Listing(Vec<Value>),
    Wrapped {
        #[serde(alias = "data")]
        items: Vec<Value>,
    },
}

/// A cart snapshot: the records as given, and their pricing view.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<Value>,
    pub lines: Vec<CartLineItem>,
}

/// Parses a cart snapshot document.
///
/// Each record must carry `title`, a numeric `unitPrice` (or `price`) and
/// an integer `quantity`; other fields are kept in the listing but ignored
/// for pricing.
pub fn parse_snapshot(input: &str) -> Result<Snapshot> {
    let document: SnapshotDocument = serde_json::from_str(input)
        .context("Cart snapshot must be a JSON array of line items or {\"items\": [...]}")?;

    let records = match document {
        SnapshotDocument::Listing(records) => records,
        SnapshotDocument::Wrapped { items } => items,
    };

    let lines = records
        .iter()
        .enumerate()
        .map(|(index, record)| {
            CartLineItem::deserialize(record)
                .with_context(|| format!("Invalid cart line {}", index))
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(lines = lines.len(), "Parsed cart snapshot");
    Ok(Snapshot { records, lines })
}

// =============================================================================
// Quote Output
// =============================================================================

/// The `get-cart` response, optionally with the round breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct QuoteResponse {
    pub status: &'static str,
    pub data: Vec<Value>,
    pub totals: Totals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rounds: Option<Vec<BundleRound>>,
}

impl QuoteResponse {
    /// Prices `snapshot` with `engine`.
    pub fn build(
        engine: &BundleDiscountEngine,
        snapshot: Snapshot,
        breakdown: bool,
    ) -> Result<Self> {
        let (totals, rounds) = if breakdown {
            let quote = engine.quote(&snapshot.lines)?;
            (quote.totals, Some(quote.rounds))
        } else {
            (engine.compute_totals(&snapshot.lines)?, None)
        };

        Ok(QuoteResponse {
            status: "Success",
            data: snapshot.records,
            totals,
            rounds,
        })
    }

    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}

/// Parses, prices and renders one snapshot document.
pub fn quote_document(
    engine: &BundleDiscountEngine,
    input: &str,
    breakdown: bool,
    pretty: bool,
) -> Result<String> {
    let snapshot = parse_snapshot(input)?;
    QuoteResponse::build(engine, snapshot, breakdown)?.to_json(pretty)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use shelf_core::DiscountTable;

    const STOREFRONT_CART: &str = r#"[
        {"_id": "1", "bookid": "b1", "title": "A", "author": "X", "price": 100, "quantity": 2},
        {"_id": "2", "bookid": "b2", "title": "B", "author": "Y", "price": 100, "quantity": 1},
        {"_id": "3", "bookid": "b3", "title": "C", "author": "Z", "price": 100, "quantity": 1}
    ]"#;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        CliArgs::command().debug_assert();
    }

    #[test]
    fn test_parse_args() {
        let parsed =
            CliArgs::try_parse_from(["bundle-quote", "-c", "q.toml", "--breakdown", "cart.json"]).unwrap();
        assert_eq!(parsed.config, Some(PathBuf::from("q.toml")));
        assert_eq!(parsed.input_path(), Some(Path::new("cart.json")));
        assert!(parsed.breakdown);
        assert!(!parsed.compact);
        assert!(!parsed.print_config);

        let bare = CliArgs::try_parse_from(["bundle-quote"]).unwrap();
        assert_eq!(bare.config, None);
        assert_eq!(bare.input_path(), None);

        let stdin = CliArgs::try_parse_from(["bundle-quote", "--compact", "-"]).unwrap();
        assert!(stdin.compact);
        assert_eq!(stdin.input_path(), None);
    }

    #[test]
    fn test_parse_args_errors() {
        use clap::error::ErrorKind;

        assert!(CliArgs::try_parse_from(["bundle-quote", "--config"]).is_err());
        assert!(CliArgs::try_parse_from(["bundle-quote", "--frobnicate"]).is_err());
        assert!(CliArgs::try_parse_from(["bundle-quote", "a.json", "b.json"]).is_err());

        let help = CliArgs::try_parse_from(["bundle-quote", "-h"]).unwrap_err();
        assert_eq!(help.kind(), ErrorKind::DisplayHelp);
    }

    #[test]
    fn test_parse_snapshot_shapes() {
        let bare = parse_snapshot(STOREFRONT_CART).unwrap();
        assert_eq!(bare.lines.len(), 3);
        assert_eq!(bare.records[0]["author"], "X");

        let wrapped = parse_snapshot(r#"{"items": [{"title": "A", "unitPrice": 250, "quantity": 1}]}"#)
            .unwrap();
        assert_eq!(wrapped.lines[0].unit_price, shelf_core::Money::from(250));

        let saved = parse_snapshot(r#"{"status": "Success", "data": []}"#).unwrap();
        assert!(saved.lines.is_empty());
    }

    #[test]
    fn test_parse_snapshot_rejects_bad_lines() {
        let err = parse_snapshot(r#"[{"title": "A", "price": 100, "quantity": 1.5}]"#).unwrap_err();
        assert!(err.to_string().contains("Invalid cart line 0"));

        assert!(parse_snapshot(r#"[{"title": "A", "quantity": 1}]"#).is_err());
        assert!(parse_snapshot("42").is_err());
        assert!(parse_snapshot("not json").is_err());
    }

    #[test]
    fn test_quote_document() {
        let engine = BundleDiscountEngine::standard();
        let json = quote_document(&engine, STOREFRONT_CART, false, false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["status"], "Success");
        assert_eq!(value["data"][0]["bookid"], "b1");
        assert_eq!(value["totals"]["totalBasePrice"], 400);
        assert_eq!(value["totals"]["totalDiscount"], 60);
        assert_eq!(value["totals"]["totalPrice"], 340);
        assert_eq!(value["totals"]["discountPercent"], 15.0);
        assert!(value.get("rounds").is_none());
    }

    #[test]
    fn test_quote_document_breakdown() {
        let engine = BundleDiscountEngine::standard();
        let json = quote_document(&engine, STOREFRONT_CART, true, true).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        let rounds = value["rounds"].as_array().unwrap();
        assert_eq!(rounds.len(), 2);
        assert_eq!(rounds[0]["bundleSize"], 3);
        assert_eq!(rounds[0]["discount"], 60);
        assert_eq!(rounds[1]["titles"][0], "A");
    }

    #[test]
    fn test_quote_document_fractional_totals() {
        let engine = BundleDiscountEngine::standard();
        let cart = r#"[
            {"bookid": "b1", "title": "Emma", "price": 259, "quantity": 1},
            {"bookid": "b2", "title": "Persuasion", "price": 199, "quantity": 1}
        ]"#;
        let json = quote_document(&engine, cart, false, false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["totals"]["totalBasePrice"], 458);
        assert_eq!(value["totals"]["totalDiscount"], 45.8);
        assert_eq!(value["totals"]["totalPrice"], 412.2);
        assert_eq!(value["totals"]["discountPercent"], 10.0);
    }

    #[test]
    fn test_quote_document_accepts_long_titles() {
        let engine = BundleDiscountEngine::standard();
        let cart = serde_json::json!([
            {"title": "T".repeat(shelf_core::MAX_TITLE_LENGTH + 1), "price": 100, "quantity": 1},
            {"title": "B", "price": 100, "quantity": 1}
        ]);
        let json = quote_document(&engine, &cart.to_string(), false, false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totals"]["totalDiscount"], 20);
    }

    #[test]
    fn test_quote_document_uses_engine_table() {
        let engine = BundleDiscountEngine::new(DiscountTable::none());
        let json = quote_document(&engine, STOREFRONT_CART, false, false).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["totals"]["totalPrice"], 400);
    }

    #[test]
    fn test_quote_document_reports_negative_quantity() {
        let engine = BundleDiscountEngine::standard();
        let err = quote_document(
            &engine,
            r#"[{"title": "A", "price": 100, "quantity": -1}]"#,
            false,
            true,
        )
        .unwrap_err();
        assert!(err.to_string().contains("line 0"));
    }
}
