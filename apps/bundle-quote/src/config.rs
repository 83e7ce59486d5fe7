//! # Quote Configuration
//!
//! Settings for the `bundle-quote` tool: the discount tiers, output format
//! and log filter.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     SHELF_DISCOUNT_TIERS="2:10,3:20,4:30"                              │
//! │     SHELF_LOG=debug                                                    │
//! │     SHELF_OUTPUT_PRETTY=false                                          │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     --config PATH, or SHELF_CONFIG, or                                 │
//! │     ~/.config/bookstore/quote.toml (Linux)                             │
//! │     ~/Library/Application Support/com.shelf.bookstore/quote.toml       │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     Standard table (10% .. 60%), pretty output, "info,shelf=debug"     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # quote.toml
//! [discount]
//! tiers = [
//!     { bundle_size = 2, percent = 10.0 },
//!     { bundle_size = 3, percent = 20.0 },
//! ]
//!
//! [output]
//! pretty = true
//! breakdown = false
//!
//! [logging]
//! filter = "info,shelf=debug"
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use shelf_core::{DiscountRate, DiscountTable, DiscountTier, ValidationError};
use tracing::{debug, info};

/// Env var naming the config file when `--config` is not given.
pub const CONFIG_PATH_ENV: &str = "SHELF_CONFIG";

// =============================================================================
// Discount Settings
// =============================================================================

/// One configured tier: `percent` off for rounds of `bundle_size` titles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierSetting {
    pub bundle_size: usize,
    pub percent: f64,
}

impl From<DiscountTier> for TierSetting {
    fn from(tier: DiscountTier) -> Self {
        TierSetting {
            bundle_size: tier.bundle_size,
            percent: tier.rate.percentage(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountSettings {
    /// Bundle-size tiers. An empty list disables bundle discounts.
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierSetting>,
}

fn default_tiers() -> Vec<TierSetting> {
    DiscountTable::standard().tiers().map(TierSetting::from).collect()
}

impl Default for DiscountSettings {
    fn default() -> Self {
        DiscountSettings {
            tiers: default_tiers(),
        }
    }
}

// =============================================================================
// Output Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Indent the JSON document.
    #[serde(default = "default_true")]
    pub pretty: bool,

    /// Always include the per-round breakdown.
    #[serde(default)]
    pub breakdown: bool,
}

fn default_true() -> bool {
    true
}

impl Default for OutputSettings {
    fn default() -> Self {
        OutputSettings {
            pretty: true,
            breakdown: false,
        }
    }
}

// =============================================================================
// Logging Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directives. `RUST_LOG` still wins when set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "info,shelf=debug".to_string()
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            filter: default_filter(),
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete configuration for the quote tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuoteConfig {
    #[serde(default)]
    pub discount: DiscountSettings,

    #[serde(default)]
    pub output: OutputSettings,

    #[serde(default)]
    pub logging: LoggingSettings,

    /// File the settings were read from, if any.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl QuoteConfig {
    /// Loads configuration from file and environment.
    ///
    /// ## Loading Order
    /// 1. Start with defaults
    /// 2. Read the TOML file, if one exists
    /// 3. Apply `SHELF_*` environment overrides
    /// 4. Validate (the tiers must form a valid discount table)
    ///
    /// A path given explicitly (argument or `SHELF_CONFIG`) must exist; the
    /// per-user default path is optional.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with an explicit variable lookup.
    pub fn load_with<F>(config_path: Option<PathBuf>, vars: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = config_path.or_else(|| vars(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigError::NotFound(path));
                }
                Self::from_file(path)?
            }
            None => match Self::default_config_path() {
                Some(path) if path.exists() => Self::from_file(path)?,
                Some(path) => {
                    debug!(?path, "Config file not found, using defaults");
                    Self::default()
                }
                None => Self::default(),
            },
        };

        config.apply_overrides(vars)?;
        config.validate()?;

        Ok(config)
    }

    /// Parses a TOML document. Missing sections take their defaults.
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    /// Renders the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        info!(?path, "Loading quote config from file");
        let contents = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        let mut config = Self::from_toml(&contents)?;
        config.source = Some(path);
        Ok(config)
    }

    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.discount_table()?;

        if self.logging.filter.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "logging.filter must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Builds the discount table from the configured tiers.
    pub fn discount_table(&self) -> Result<DiscountTable, ConfigError> {
        let mut tiers = Vec::with_capacity(self.discount.tiers.len());
        for tier in &self.discount.tiers {
            if !tier.percent.is_finite() || tier.percent < 0.0 {
                return Err(ConfigError::InvalidValue(format!(
                    "discount for bundle size {} must be a non-negative percentage, got {}",
                    tier.bundle_size, tier.percent
                )));
            }
            tiers.push(DiscountTier::new(
                tier.bundle_size,
                DiscountRate::from_percentage(tier.percent),
            ));
        }

        Ok(DiscountTable::from_tiers(tiers)?)
    }

    /// Applies `SHELF_*` overrides read through `vars`.
    fn apply_overrides<F>(&mut self, vars: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(tiers) = vars("SHELF_DISCOUNT_TIERS") {
            let table: DiscountTable = tiers.parse()?;
            debug!(tiers = %tiers, "Overriding discount tiers from environment");
            self.discount.tiers = table.tiers().map(TierSetting::from).collect();
        }

        if let Some(filter) = vars("SHELF_LOG") {
            self.logging.filter = filter;
        }

        if let Some(pretty) = vars("SHELF_OUTPUT_PRETTY") {
            self.output.pretty = parse_flag(&pretty)
                .ok_or_else(|| ConfigError::InvalidValue("SHELF_OUTPUT_PRETTY".to_string()))?;
        }

        Ok(())
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "shelf", "bookstore")
            .map(|dirs| dirs.config_dir().join("quote.toml"))
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid discount tiers: {0}")]
    DiscountTiers(#[from] ValidationError),

    #[error("Invalid value for {0}")]
    InvalidValue(String),
}

// =============================================================================
// Unit Tests
// =============================================================================
