//! TOML configuration loading and validation.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Seed for the split and fill feeders. Unset means seeded from the OS.
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub split: SplitConfig,
    #[serde(default)]
    pub fill: FillConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_ms: u64,
    #[serde(default = "default_split_interval")]
    pub split_interval_ms: u64,
    #[serde(default = "default_fill_min_interval")]
    pub fill_min_interval_ms: u64,
    #[serde(default = "default_fill_max_interval")]
    pub fill_max_interval_ms: u64,
}

fn default_cycle_interval() -> u64 {
    10_000
}
fn default_split_interval() -> u64 {
    30_000
}
fn default_fill_min_interval() -> u64 {
    1_000
}
fn default_fill_max_interval() -> u64 {
    10_000
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            cycle_interval_ms: default_cycle_interval(),
            split_interval_ms: default_split_interval(),
            fill_min_interval_ms: default_fill_min_interval(),
            fill_max_interval_ms: default_fill_max_interval(),
        }
    }
}

impl ScheduleConfig {
    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(self.cycle_interval_ms)
    }

    pub fn split_interval(&self) -> Duration {
        Duration::from_millis(self.split_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SplitConfig {
    #[serde(default = "default_max_accounts")]
    pub max_accounts: usize,
    #[serde(default = "default_account_prefix")]
    pub account_prefix: String,
}

fn default_max_accounts() -> usize {
    10
}
fn default_account_prefix() -> String {
    "account".into()
}

impl Default for SplitConfig {
    fn default() -> Self {
        SplitConfig {
            max_accounts: default_max_accounts(),
            account_prefix: default_account_prefix(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FillConfig {
    #[serde(default = "default_tickers")]
    pub tickers: Vec<String>,
    #[serde(default = "default_max_quantity")]
    pub max_quantity: u64,
    #[serde(default = "default_price_precision")]
    pub price_precision: usize,
}

fn default_tickers() -> Vec<String> {
    [
        "AXA", "08OCTAVA", "11BIT", "3RGAMES", "ABPL", "ACAUTOGAZ", "ACTION", "ADIUVO", "AGORA",
        "AGROTON",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}
fn default_max_quantity() -> u64 {
    100_000_000
}
fn default_price_precision() -> usize {
    2
}

impl Default for FillConfig {
    fn default() -> Self {
        FillConfig {
            tickers: default_tickers(),
            max_quantity: default_max_quantity(),
            price_precision: default_price_precision(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_dir")]
    pub dir: String,
    #[serde(default = "default_audit_file")]
    pub audit_file: String,
}

fn default_log_dir() -> String {
    "./logs".into()
}
fn default_audit_file() -> String {
    "audit.jsonl".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            dir: default_log_dir(),
            audit_file: default_audit_file(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::ConfigRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::from_toml(&contents)
    }

    /// Parse and validate config from a TOML string.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate config invariants.
    fn validate(&self) -> Result<()> {
        let s = &self.schedule;
        if s.cycle_interval_ms == 0 || s.split_interval_ms == 0 {
            return Err(Error::Config("intervals must be > 0".into()));
        }
        if s.fill_min_interval_ms == 0 || s.fill_min_interval_ms > s.fill_max_interval_ms {
            return Err(Error::Config(
                "fill intervals must satisfy 0 < fill_min_interval_ms <= fill_max_interval_ms"
                    .into(),
            ));
        }
        if !(1..=99).contains(&self.split.max_accounts) {
            return Err(Error::Config("max_accounts must be in 1..=99".into()));
        }
        if self.split.account_prefix.trim().is_empty() {
            return Err(Error::Config("account_prefix must not be empty".into()));
        }
        if self.fill.tickers.is_empty() {
            return Err(Error::Config("tickers must not be empty".into()));
        }
        if let Some(bad) = self
            .fill
            .tickers
            .iter()
            .find(|t| t.is_empty() || t.contains(char::is_whitespace))
        {
            return Err(Error::Config(format!(
                "ticker {bad:?} must be a single non-empty word"
            )));
        }
        if self.fill.max_quantity == 0 {
            return Err(Error::Config("max_quantity must be > 0".into()));
        }
        if self.fill.price_precision > 8 {
            return Err(Error::Config("price_precision must be <= 8".into()));
        }
        Ok(())
    }

    /// Full path to the audit log file.
    pub fn audit_path(&self) -> std::path::PathBuf {
        Path::new(&self.logging.dir).join(&self.logging.audit_file)
    }
}
