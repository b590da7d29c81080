//! Startup configuration.
//!
//! Loaded once from a file (format picked by extension) with `LOBX_DASH_*`
//! environment overrides, e.g. `LOBX_DASH_ORDER_BOOK_LEN=40` or
//! `LOBX_DASH_FEED__MODE=replay`. Never reloaded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    Simulated,
    Replay,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedSettings {
    pub mode: FeedMode,
    /// JSON-lines file for the replay source.
    pub path: Option<PathBuf>,
    pub pace_ms: u64,
    pub mid_price: f64,
    pub seed: Option<u64>,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self { mode: FeedMode::Simulated, path: None, pace_ms: 50, mid_price: 30_000.0, seed: None }
    }
}

impl FeedSettings {
    pub fn pace(&self) -> Duration {
        Duration::from_millis(self.pace_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pair: String,
    pub order_book_len: usize,
    pub positions_len: usize,
    pub orders_len: usize,
    pub highlight_trades_over: f64,
    pub highlight_order_book_over: f64,
    /// Seconds per history bucket.
    pub history_record_period: u64,
    /// Rows of the history chart; 0 hides it.
    pub history_height: usize,
    pub log_file: Option<PathBuf>,
    pub log_filter: String,
    pub metrics_port: u16,
    pub feed: FeedSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pair: "BTCUSD".to_string(),
            order_book_len: 25,
            positions_len: 3,
            orders_len: 10,
            highlight_trades_over: 1.0,
            highlight_order_book_over: 10.0,
            history_record_period: 10,
            history_height: 10,
            log_file: None,
            log_filter: "info".to_string(),
            metrics_port: 9000,
            feed: FeedSettings::default(),
        }
    }
}

impl Settings {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let settings: Settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .add_source(
                ::config::Environment::with_prefix("LOBX_DASH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pair.trim().is_empty() {
            return Err(ConfigError::Invalid("pair must not be empty".into()));
        }
        if self.order_book_len == 0 {
            return Err(ConfigError::Invalid("order_book_len must be at least 1".into()));
        }
        if self.highlight_trades_over < 0.0 || self.highlight_order_book_over < 0.0 {
            return Err(ConfigError::Invalid("highlight thresholds must not be negative".into()));
        }
        if self.history_record_period == 0 {
            return Err(ConfigError::Invalid("history_record_period must be at least 1 second".into()));
        }
        if self.feed.mode == FeedMode::Replay && self.feed.path.is_none() {
            return Err(ConfigError::Invalid("replay feed requires feed.path".into()));
        }
        if self.feed.mode == FeedMode::Simulated && !(self.feed.mid_price > 0.0) {
            return Err(ConfigError::Invalid("feed.mid_price must be positive".into()));
        }
        Ok(())
    }

    pub fn history_period(&self) -> Duration {
        Duration::from_secs(self.history_record_period)
    }
}
