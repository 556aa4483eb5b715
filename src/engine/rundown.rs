//! Daily position rundown.
//!
//! On a coarse check cadence, fires once per day at the configured hour:
//! enumerates the configured wallet's open positions, re-runs the
//! aggregation and flag pipeline per position read-only (the flagged
//! set is neither consulted nor mutated), and emits one composite
//! summary. A per-hour gate prevents double-firing within the trigger
//! hour and re-arms once the wall clock moves past it.

use anyhow::Result;
use chrono::{DateTime, Local, Timelike};
use std::sync::Arc;
use tracing::{info, warn};

use crate::engine::aggregator::CohortAggregator;
use crate::engine::flag::flag_market;
use crate::sinks::AlertSink;
use crate::storage::SettingsStore;
use crate::types::MarketReport;
use crate::upstream::Upstream;

// ---------------------------------------------------------------------------
// Gate
// ---------------------------------------------------------------------------

/// Latched once per calendar hour. `poll` answers whether the rundown
/// may fire now; the caller latches after a successful emit.
#[derive(Debug, Default)]
pub struct RundownGate {
    latched: bool,
}

impl RundownGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the current hour matches the target and the gate has
    /// not fired this hour. Unlatches as a side effect once the hour
    /// moves off the target.
    pub fn poll(&mut self, hour: u32, target_hour: u32) -> bool {
        if hour == target_hour {
            !self.latched
        } else {
            self.latched = false;
            false
        }
    }

    pub fn latch(&mut self) {
        self.latched = true;
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }
}

// ---------------------------------------------------------------------------
// Rundown runner
// ---------------------------------------------------------------------------

pub struct Rundown {
    upstream: Arc<dyn Upstream>,
    aggregator: CohortAggregator,
    settings: SettingsStore,
    alerts: Arc<dyn AlertSink>,
    wallet: String,
    gate: RundownGate,
}

impl Rundown {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        settings: SettingsStore,
        alerts: Arc<dyn AlertSink>,
        wallet: String,
    ) -> Self {
        Self {
            aggregator: CohortAggregator::new(upstream.clone()),
            upstream,
            settings,
            alerts,
            wallet,
            gate: RundownGate::new(),
        }
    }

    /// Check the gate against `now` and run the rundown if due.
    /// Returns whether a rundown was emitted.
    pub async fn check(&mut self, now: DateTime<Local>) -> Result<bool> {
        let settings = self.settings.load()?;
        if !self.gate.poll(now.hour(), settings.rundown_time) {
            return Ok(false);
        }

        let condition_ids = self.upstream.open_positions(&self.wallet).await?;
        info!(positions = condition_ids.len(), "Running daily rundown");

        let mut summary = format!(
            "-------- Daily Rundown --------\n\
             Date: {}\n\
             Time: {}\n\
             Total Positions: {}\n\
             -------------------------------\n",
            now.date_naive(),
            now.format("%I:%M %p"),
            condition_ids.len(),
        );

        for condition_id in &condition_ids {
            let Some(raw) = self.upstream.market_by_condition(condition_id).await? else {
                warn!(condition_id, "Held market not found upstream, skipping");
                continue;
            };
            let market = match raw.to_market() {
                Ok(m) => m,
                Err(e) => {
                    warn!(condition_id, error = %e, "Held market malformed, skipping");
                    continue;
                }
            };

            let mut cohorts = self.aggregator.aggregate(condition_id).await?.into_iter();
            let yes = cohorts.next().unwrap_or_default();
            let no = cohorts.next().unwrap_or_default();
            let verdict = flag_market(&market, &yes, &no, &settings);

            let report = MarketReport {
                market,
                yes,
                no,
                verdict,
            };
            summary.push_str(&report.summary());
            summary.push_str("-------------------------------\n");
        }

        self.alerts.rundown(&summary).await?;
        self.gate.latch();
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
