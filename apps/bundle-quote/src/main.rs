//! # Bundle Quote
//!
//! Prints the bundle-discounted totals for a cart snapshot.
//!
//! ## Usage
//! ```bash
//! # Quote a saved cart listing
//! cargo run -p bundle-quote -- cart.json
//!
//! # Pipe the listing in and show every bundle round
//! cat cart.json | cargo run -p bundle-quote -- --breakdown
//!
//! # Use a custom discount table
//! SHELF_DISCOUNT_TIERS="2:5,3:15" cargo run -p bundle-quote -- cart.json
//! ```

use std::io::Read;

use anyhow::{Context, Result};
use bundle_quote::{quote_document, CliArgs, QuoteConfig};
use clap::Parser;
use shelf_core::BundleDiscountEngine;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    let args = CliArgs::parse();

    let config = QuoteConfig::load(args.config.clone())?;
    init_tracing(&config.logging.filter);
    info!(source = ?config.source, tiers = config.discount.tiers.len(), "Configuration loaded");

    if args.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    let engine = BundleDiscountEngine::new(config.discount_table()?);

    let input = match args.input_path() {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cart file {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read cart snapshot from stdin")?;
            buf
        }
    };

    let breakdown = args.breakdown || config.output.breakdown;
    let pretty = config.output.pretty && !args.compact;
    println!("{}", quote_document(&engine, &input, breakdown, pretty)?);

    Ok(())
}

/// Initializes the tracing subscriber on stderr so stdout stays pure JSON.
///
/// `RUST_LOG` overrides the configured filter.
fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
