//! Mock upstream and recording sinks for integration testing.
//!
//! Provides a deterministic `Upstream` implementation backed by plain
//! maps (markets indexed by offset, holder cohorts, PnL histories,
//! positions, account values, and trade activity all controllable from
//! test code) plus sinks that record every emission.

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use sentinel::sinks::{AlertSink, SheetSink};
use sentinel::storage::{MarketSet, SettingsStore};
use sentinel::types::{MarketReport, Verdict};
use sentinel::upstream::{ActivityRecord, FetchError, PnlPoint, RawMarket, Upstream};

// ---------------------------------------------------------------------------
// Mock upstream
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MockUpstream {
    /// Market feed, indexed by offset.
    pub markets: Vec<RawMarket>,
    /// condition_id -> cohort wallet lists (yes-side, no-side).
    pub holder_groups: HashMap<String, Vec<Vec<String>>>,
    /// wallet -> PnL history, oldest first.
    pub pnl: HashMap<String, Vec<PnlPoint>>,
    /// (wallet, condition_id) -> (current_value, cash_pnl).
    pub positions: HashMap<(String, String), (f64, f64)>,
    /// wallet -> account value.
    pub values: HashMap<String, f64>,
    /// wallet -> trade activity, newest first.
    pub activity: HashMap<String, Vec<ActivityRecord>>,
    /// Open positions for the rundown wallet.
    pub open: Vec<String>,
    /// When set, the market feed rejects with this HTTP status.
    pub reject_status: Option<u16>,
    pub market_fetches: AtomicUsize,
    pub cohort_fetches: AtomicUsize,
}

impl MockUpstream {
    /// Register a wallet on one side of a market with a linear PnL
    /// history producing the given daily growth rate.
    pub fn add_holder(
        &mut self,
        condition_id: &str,
        side: usize,
        wallet: &str,
        growth_per_day: f64,
        position_value: f64,
        account_value: f64,
    ) {
        let groups = self
            .holder_groups
            .entry(condition_id.to_string())
            .or_insert_with(|| vec![Vec::new(), Vec::new()]);
        groups[side].push(wallet.to_string());

        let days = 10.0;
        self.pnl.insert(
            wallet.to_string(),
            vec![
                PnlPoint { t: 0, p: 0.0 },
                PnlPoint {
                    t: (days * 86_400.0) as i64,
                    p: growth_per_day * days,
                },
            ],
        );
        self.positions.insert(
            (wallet.to_string(), condition_id.to_string()),
            (position_value, 0.0),
        );
        self.values.insert(wallet.to_string(), account_value);
        self.activity.insert(
            wallet.to_string(),
            vec![
                ActivityRecord {
                    timestamp: 200 * 86_400,
                },
                ActivityRecord { timestamp: 0 },
            ],
        );
    }
}

#[async_trait]
impl Upstream for MockUpstream {
    async fn next_market(
        &self,
        _min_volume: u64,
        offset: u64,
    ) -> Result<Option<RawMarket>, FetchError> {
        self.market_fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(status) = self.reject_status {
            return Err(FetchError::Rejected {
                status,
                body: "rate limited".to_string(),
            });
        }
        Ok(self.markets.get(offset as usize).cloned())
    }

    async fn market_by_condition(
        &self,
        condition_id: &str,
    ) -> Result<Option<RawMarket>, FetchError> {
        Ok(self
            .markets
            .iter()
            .find(|m| m.condition_id == condition_id)
            .cloned())
    }

    async fn holder_groups(&self, condition_id: &str) -> Result<Vec<Vec<String>>, FetchError> {
        self.cohort_fetches.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .holder_groups
            .get(condition_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn pnl_history(&self, wallet: &str) -> Result<Vec<PnlPoint>, FetchError> {
        Ok(self.pnl.get(wallet).cloned().unwrap_or_default())
    }

    async fn position(&self, wallet: &str, condition_id: &str) -> Result<(f64, f64), FetchError> {
        Ok(self
            .positions
            .get(&(wallet.to_string(), condition_id.to_string()))
            .copied()
            .unwrap_or((0.0, 0.0)))
    }

    async fn account_value(&self, wallet: &str) -> Result<f64, FetchError> {
        Ok(self.values.get(wallet).copied().unwrap_or(0.0))
    }

    async fn trade_activity(&self, wallet: &str) -> Result<Vec<ActivityRecord>, FetchError> {
        Ok(self.activity.get(wallet).cloned().unwrap_or_default())
    }

    async fn open_positions(&self, _wallet: &str) -> Result<Vec<String>, FetchError> {
        Ok(self.open.clone())
    }
}

// ---------------------------------------------------------------------------
// Recording sinks
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingAlerts {
    pub flagged: Mutex<Vec<(Verdict, String)>>,
    pub unfiltered: Mutex<Vec<String>>,
    pub rundowns: Mutex<Vec<String>>,
    pub notices: Mutex<Vec<String>>,
}

#[async_trait]
impl AlertSink for RecordingAlerts {
    async fn flagged(&self, verdict: Verdict, report: &MarketReport) -> Result<()> {
        self.flagged
            .lock()
            .unwrap()
            .push((verdict, report.market.condition_id.clone()));
        Ok(())
    }

    async fn unfiltered(&self, report: &MarketReport) -> Result<()> {
        self.unfiltered
            .lock()
            .unwrap()
            .push(report.market.condition_id.clone());
        Ok(())
    }

    async fn rundown(&self, summary: &str) -> Result<()> {
        self.rundowns.lock().unwrap().push(summary.to_string());
        Ok(())
    }

    async fn notice(&self, message: &str) -> Result<()> {
        self.notices.lock().unwrap().push(message.to_string());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingSheet {
    pub rows: Mutex<Vec<Vec<String>>>,
}

#[async_trait]
impl SheetSink for RecordingSheet {
    async fn insert_row(&self, row: &[String]) -> Result<()> {
        self.rows.lock().unwrap().push(row.to_vec());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Fixture helpers
// ---------------------------------------------------------------------------

/// A complete, well-formed raw market record.
pub fn raw_market(condition_id: &str, price_yes: f64) -> RawMarket {
    RawMarket {
        condition_id: condition_id.to_string(),
        question: format!("Will {condition_id} resolve YES?"),
        outcome_prices: Some(format!("[\"{price_yes}\",\"{}\"]", 1.0 - price_yes)),
        volume: Some("100,000".to_string()),
        volume_num: None,
        ticker: Some(condition_id.to_uppercase()),
        end_date: Some("2027-01-01".to_string()),
    }
}

pub fn temp_settings() -> SettingsStore {
    let mut p = std::env::temp_dir();
    p.push(format!("sentinel_it_settings_{}.json", uuid::Uuid::new_v4()));
    SettingsStore::new(p)
}

pub fn temp_set() -> MarketSet {
    let mut p = std::env::temp_dir();
    p.push(format!("sentinel_it_markets_{}.json", uuid::Uuid::new_v4()));
    MarketSet::new(p)
}
