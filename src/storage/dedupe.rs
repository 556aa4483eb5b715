//! Persisted dedupe sets.
//!
//! A `MarketSet` is a named list of market identifiers in a JSON file.
//! Two independent instances back the "already flagged" set and the
//! "already exported to the sheet" set. Membership is monotonic except
//! through the explicit administrative `remove`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Default, Serialize, Deserialize)]
struct MarketList {
    markets: Vec<String>,
}

/// JSON-file-backed set of market identifiers.
#[derive(Debug, Clone)]
pub struct MarketSet {
    path: PathBuf,
}

impl MarketSet {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Result<MarketList> {
        if !Path::new(&self.path).exists() {
            return Ok(MarketList::default());
        }
        let json = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read market set from {}", self.path.display()))?;
        serde_json::from_str(&json)
            .with_context(|| format!("Failed to parse market set from {}", self.path.display()))
    }

    fn save(&self, list: &MarketList) -> Result<()> {
        let json = serde_json::to_string_pretty(list).context("Failed to serialise market set")?;
        std::fs::write(&self.path, &json)
            .with_context(|| format!("Failed to write market set to {}", self.path.display()))?;
        Ok(())
    }

    /// Read-only membership query.
    pub fn contains(&self, condition_id: &str) -> Result<bool> {
        Ok(self.load()?.markets.iter().any(|m| m == condition_id))
    }

    /// Add an identifier. Idempotent: appending an existing member
    /// never produces a duplicate entry.
    pub fn append(&self, condition_id: &str) -> Result<()> {
        let mut list = self.load()?;
        if !list.markets.iter().any(|m| m == condition_id) {
            list.markets.push(condition_id.to_string());
            self.save(&list)?;
            debug!(condition_id, path = %self.path.display(), "Market recorded");
        }
        Ok(())
    }

    /// Administrative unflag: remove an identifier if present.
    pub fn remove(&self, condition_id: &str) -> Result<()> {
        let mut list = self.load()?;
        let before = list.markets.len();
        list.markets.retain(|m| m != condition_id);
        if list.markets.len() != before {
            self.save(&list)?;
            debug!(condition_id, path = %self.path.display(), "Market removed");
        }
        Ok(())
    }

    /// All recorded identifiers, insertion order.
    pub fn all(&self) -> Result<Vec<String>> {
        Ok(self.load()?.markets)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
