//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! This is the static, operator-edited configuration; the runtime
//! thresholds live in the persisted settings store.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub scanner: ScannerConfig,
    pub rundown: RundownConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScannerConfig {
    /// Cadence of the scan cycle; one pagination step per firing.
    pub scan_interval_secs: u64,
    /// Optional hour around which all activity is suppressed
    /// (window: anchor−10min through anchor+70min).
    #[serde(default)]
    pub exclusion_anchor_hour: Option<u32>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RundownConfig {
    /// Proxy-wallet identity whose open positions the rundown covers.
    pub wallet: String,
    /// Cadence of the rundown hour check.
    #[serde(default = "default_rundown_check_secs")]
    pub check_interval_secs: u64,
}

fn default_rundown_check_secs() -> u64 {
    15 * 60
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub settings_file: String,
    pub flagged_file: String,
    pub in_sheet_file: String,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        let config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {path}"))?;
        Ok(config)
    }
}
