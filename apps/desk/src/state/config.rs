//! # Configuration State
//!
//! Application configuration loaded at startup.
//!
//! ## Configuration Sources (later overrides earlier)
//! 1. Defaults (this file)
//! 2. Config file: `--config <path>`, else `MEDIBILL_CONFIG`, else the
//!    platform config dir (`~/.config/medibill/medibill.toml` on Linux)
//! 3. Environment variables (`MEDIBILL_*`)
//!
//! ## Example Config File
//! ```toml
//! database_path = "/srv/pharmacy/medibill.db"
//! currency_symbol = "₹"
//! tax_mode = "inclusive"
//! default_tax_rate = 12.0
//! initial_rows = 2
//! suggestion_limit = 10
//! expiry_warning_days = 60
//! recent_activity_limit = 10
//!
//! [stock_thresholds]
//! critical = 10
//! warning = 20
//! low = 30
//! ```
//!
//! Configuration is read-only after startup, so no lock is needed.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use medibill_core::input::clamp_percent;
use medibill_core::pricing::format_amount;
use medibill_core::stock::StockThresholds;
use medibill_core::{
    DocumentDraft, DocumentKind, TaxMode, DEFAULT_DRAFT_ROWS, DEFAULT_TAX_RATE_PERCENT,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::ConfigError;

pub const CONFIG_FILE_NAME: &str = "medibill.toml";
pub const DATABASE_FILE_NAME: &str = "medibill.db";

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file. `None` means the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Prefix for displayed amounts
    pub currency_symbol: String,

    /// Tax mode new drafts start in
    pub tax_mode: TaxMode,

    /// Tax rate for new rows and blank tax cells, in percent
    pub default_tax_rate: f64,

    /// Empty rows a new draft starts with
    pub initial_rows: usize,

    /// Maximum autocomplete suggestions
    pub suggestion_limit: usize,

    /// Unit counts for the low-stock alert levels
    pub stock_thresholds: StockThresholds,

    /// Batches expiring within this many days count as expiring soon
    pub expiry_warning_days: u32,

    /// Entries in the dashboard's recent purchases/sales feed
    pub recent_activity_limit: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database_path: None,
            currency_symbol: "₹".to_string(),
            tax_mode: TaxMode::Exclusive,
            default_tax_rate: DEFAULT_TAX_RATE_PERCENT,
            initial_rows: DEFAULT_DRAFT_ROWS,
            suggestion_limit: 10,
            stock_thresholds: StockThresholds::default(),
            expiry_warning_days: 90,
            recent_activity_limit: 10,
        }
    }
}

impl AppConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// A missing config file is not an error; an unreadable or malformed one is.
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = AppConfig::default();

        let path = config_path
            .or_else(|| std::env::var("MEDIBILL_CONFIG").ok().map(PathBuf::from))
            .or_else(Self::default_config_path);

        if let Some(path) = path {
            if path.exists() {
                info!(?path, "Loading config from file");
                config = Self::from_file(&path)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config.normalize();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Applies `MEDIBILL_*` overrides read through `lookup`.
    pub(crate) fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup("MEDIBILL_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database_path = Some(PathBuf::from(path));
        }

        if let Some(symbol) = lookup("MEDIBILL_CURRENCY_SYMBOL") {
            self.currency_symbol = symbol;
        }

        if let Some(mode) = lookup("MEDIBILL_TAX_MODE") {
            match TaxMode::parse(&mode) {
                Some(parsed) => self.tax_mode = parsed,
                None => warn!(mode = %mode, "Unknown tax mode in environment"),
            }
        }

        if let Some(rate) = lookup("MEDIBILL_DEFAULT_TAX_RATE") {
            match rate.trim().parse::<f64>() {
                Ok(parsed) => self.default_tax_rate = parsed,
                Err(_) => warn!(rate = %rate, "Invalid default tax rate in environment"),
            }
        }

        if let Some(days) = lookup("MEDIBILL_EXPIRY_WARNING_DAYS") {
            match days.trim().parse::<u32>() {
                Ok(parsed) => self.expiry_warning_days = parsed,
                Err(_) => warn!(days = %days, "Invalid expiry warning days in environment"),
            }
        }
    }

    /// Pulls out-of-range values back to something usable.
    pub(crate) fn normalize(&mut self) {
        let clamped = clamp_percent(self.default_tax_rate);
        if clamped != self.default_tax_rate {
            warn!(
                configured = self.default_tax_rate,
                using = clamped,
                "Default tax rate out of range"
            );
            self.default_tax_rate = clamped;
        }

        if self.initial_rows == 0 {
            warn!("initial_rows must be at least 1");
            self.initial_rows = 1;
        }

        if self.suggestion_limit == 0 {
            warn!("suggestion_limit must be at least 1");
            self.suggestion_limit = 1;
        }

        let thresholds = self.stock_thresholds.normalized();
        if thresholds != self.stock_thresholds {
            warn!(?thresholds, "Stock thresholds reordered");
            self.stock_thresholds = thresholds;
        }
    }

    fn project_dirs() -> Option<ProjectDirs> {
        ProjectDirs::from("com", "medibill", "medibill")
    }

    fn default_config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
    }

    /// Returns the database file to open, creating the platform data
    /// directory when no explicit path is configured.
    pub fn resolve_database_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.database_path {
            return Ok(path.clone());
        }

        let dirs = Self::project_dirs().ok_or(ConfigError::NoDataDir)?;
        let data_dir = dirs.data_dir();
        std::fs::create_dir_all(data_dir)?;
        Ok(data_dir.join(DATABASE_FILE_NAME))
    }

    /// A fresh draft using the configured rows, tax rate and tax mode.
    pub fn new_draft(&self, kind: DocumentKind) -> DocumentDraft {
        DocumentDraft::new(kind, self.initial_rows)
            .with_default_tax_rate(self.default_tax_rate)
            .with_tax_mode(self.tax_mode)
    }

    /// Formats an amount with the configured currency symbol.
    pub fn format_currency(&self, value: f64) -> String {
        format_amount(value, &self.currency_symbol)
    }
}
