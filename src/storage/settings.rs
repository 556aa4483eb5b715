//! Persisted scanner settings and scan cursor.
//!
//! A single JSON record holds the named numeric thresholds consumed by
//! the flag rule, the pagination cursor (`offset`), and the scanner
//! enable flag. Thresholds change only through the validated setter;
//! the cursor moves only through the advance/reset helpers.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::types::SentinelError;

/// The persisted settings record.
///
/// `offset` and `scanner_on` together form the scan state: the offset
/// only ever advances by +1 per processed market or wraps to 0 when the
/// feed is exhausted, and it survives process restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub scanner_on: bool,
    pub offset: u64,
    /// Hour (0–24, military time) at which the daily rundown fires.
    pub rundown_time: u32,
    pub min_volume: u64,
    pub min_growth_rate_diff: i64,
    /// Validated and stored but not yet consulted by the flag rule.
    pub min_pnl_diff: i64,
    /// Validated and stored but not yet consulted by the flag rule.
    pub min_bot_count_diff: u32,
    pub min_share_price: f64,
    pub max_share_price: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scanner_on: false,
            offset: 0,
            rundown_time: 9,
            min_volume: 10_000,
            min_growth_rate_diff: 50,
            min_pnl_diff: 100,
            min_bot_count_diff: 3,
            min_share_price: 0.05,
            max_share_price: 0.95,
        }
    }
}

/// JSON-file-backed settings store.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Load the settings record, seeding defaults when the file does
    /// not exist yet.
    pub fn load(&self) -> Result<Settings> {
        if !Path::new(&self.path).exists() {
            info!(path = %self.path.display(), "No settings file found, seeding defaults");
            let defaults = Settings::default();
            self.save(&defaults)?;
            return Ok(defaults);
        }
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read settings from {}", self.path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse settings from {}", self.path.display()))
    }

    fn save(&self, settings: &Settings) -> Result<()> {
        let json =
            serde_json::to_string_pretty(settings).context("Failed to serialise settings")?;
        std::fs::write(&self.path, &json)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))?;
        debug!(path = %self.path.display(), offset = settings.offset, "Settings saved");
        Ok(())
    }

    /// Update one named setting from its textual value, validating the
    /// declared domain. On rejection the stored state is unchanged.
    ///
    /// Returns the whole updated record.
    pub fn update(&self, key: &str, value: &str) -> Result<Settings, SentinelError> {
        let mut settings = self.load()?;

        match key {
            "min_share_price" | "max_share_price" => {
                let v: f64 = value.parse().map_err(|_| {
                    SentinelError::InvalidSetting(format!(
                        "{key} requires a float value, got '{value}'"
                    ))
                })?;
                if !(0.0..=1.0).contains(&v) {
                    return Err(SentinelError::InvalidSetting(format!(
                        "{key} must be between 0.0 and 1.0"
                    )));
                }
                if key == "min_share_price" {
                    settings.min_share_price = v;
                } else {
                    settings.max_share_price = v;
                }
            }
            "offset" | "min_volume" | "min_growth_rate_diff" | "min_pnl_diff"
            | "min_bot_count_diff" | "rundown_time" => {
                let v: i64 = value.parse().map_err(|_| {
                    SentinelError::InvalidSetting(format!(
                        "{key} requires an integer value, got '{value}'"
                    ))
                })?;
                if v <= 0 {
                    return Err(SentinelError::InvalidSetting(format!(
                        "{key} must be greater than 0"
                    )));
                }
                match key {
                    "min_bot_count_diff" if v > 20 => {
                        return Err(SentinelError::InvalidSetting(
                            "min_bot_count_diff must be between 0 and 20".to_string(),
                        ));
                    }
                    "rundown_time" if v > 24 => {
                        return Err(SentinelError::InvalidSetting(
                            "rundown_time must be between 0 and 24 (military time)".to_string(),
                        ));
                    }
                    _ => {}
                }
                match key {
                    "offset" => settings.offset = v as u64,
                    "min_volume" => settings.min_volume = v as u64,
                    "min_growth_rate_diff" => settings.min_growth_rate_diff = v,
                    "min_pnl_diff" => settings.min_pnl_diff = v,
                    "min_bot_count_diff" => settings.min_bot_count_diff = v as u32,
                    "rundown_time" => settings.rundown_time = v as u32,
                    _ => unreachable!(),
                }
            }
            other => {
                return Err(SentinelError::InvalidSetting(format!(
                    "unknown setting '{other}'"
                )));
            }
        }

        self.save(&settings)?;
        info!(key, value, "Setting updated");
        Ok(settings)
    }

    /// Increment a named integer setting by `delta`. Non-integer
    /// settings are left untouched (no-op), mirroring the store
    /// contract. Returns the whole record.
    pub fn increment(&self, key: &str, delta: i64) -> Result<Settings> {
        let mut settings = self.load()?;
        match key {
            "offset" => settings.offset = settings.offset.saturating_add_signed(delta),
            "min_volume" => settings.min_volume = settings.min_volume.saturating_add_signed(delta),
            "min_growth_rate_diff" => settings.min_growth_rate_diff += delta,
            "min_pnl_diff" => settings.min_pnl_diff += delta,
            "min_bot_count_diff" => {
                settings.min_bot_count_diff =
                    (settings.min_bot_count_diff as i64 + delta).max(0) as u32;
            }
            "rundown_time" => {
                settings.rundown_time = (settings.rundown_time as i64 + delta).max(0) as u32;
            }
            _ => return Ok(settings),
        }
        self.save(&settings)?;
        Ok(settings)
    }

    /// Advance the pagination cursor by one processed market.
    pub fn advance_offset(&self) -> Result<Settings> {
        self.increment("offset", 1)
    }

    /// Wrap the pagination cursor back to 0 (feed exhausted).
    pub fn reset_offset(&self) -> Result<Settings> {
        let mut settings = self.load()?;
        settings.offset = 0;
        self.save(&settings)?;
        Ok(settings)
    }

    pub fn set_scanner_on(&self, on: bool) -> Result<Settings> {
        let mut settings = self.load()?;
        settings.scanner_on = on;
        self.save(&settings)?;
        Ok(settings)
    }

    /// Operator-facing catalogue of the current settings and their
    /// declared domains.
    pub fn describe(&self) -> Result<String> {
        let s = self.load()?;
        Ok(format!(
            "rundown_time:         {} <between 0 and 24, integer>\n\
             offset:               {} <greater than 0, integer>\n\
             min_volume:           {} <greater than 0, integer>\n\
             min_growth_rate_diff: {} <greater than 0, integer>\n\
             min_pnl_diff:         {} <greater than 0, integer>\n\
             min_bot_count_diff:   {} <between 0 and 20, integer>\n\
             min_share_price:      {} <between 0.0 and 1.0, float>\n\
             max_share_price:      {} <between 0.0 and 1.0, float>",
            s.rundown_time,
            s.offset,
            s.min_volume,
            s.min_growth_rate_diff,
            s.min_pnl_diff,
            s.min_bot_count_diff,
            s.min_share_price,
            s.max_share_price,
        ))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
