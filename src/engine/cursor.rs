//! Cursor/pagination state machine and the scan cycle.
//!
//! One `tick` performs exactly one pagination step: fetch the market at
//! the persisted offset, aggregate its holder cohorts, run the flag
//! rule, emit to the sinks, and commit the new cursor position. The
//! enable flag is consulted only at the top of a cycle, so an in-flight
//! market is always fully processed before the scanner stops.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::engine::aggregator::CohortAggregator;
use crate::engine::flag::flag_market;
use crate::sinks::{AlertSink, SheetSink};
use crate::storage::{MarketSet, Settings, SettingsStore};
use crate::types::{MarketReport, Verdict};
use crate::upstream::Upstream;

/// Scanner lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScannerState {
    Idle,
    Scanning,
    Stopped,
}

/// What one pagination step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Scanner disabled; nothing fetched.
    Disabled,
    /// Feed returned no market at the offset; cursor wrapped to 0.
    Exhausted,
    /// Record at the offset was missing required fields; cursor advanced.
    SkippedMalformed,
    /// Market already decided in a previous pass; cursor advanced
    /// without re-evaluating cohorts.
    SkippedFlagged { condition_id: String },
    /// Market fully evaluated; cursor advanced.
    Scanned {
        condition_id: String,
        verdict: Option<Verdict>,
    },
}

/// The stateful scanning component. All collaborators are explicit
/// construction-time dependencies.
pub struct Scanner {
    upstream: Arc<dyn Upstream>,
    aggregator: CohortAggregator,
    settings: SettingsStore,
    flagged: MarketSet,
    in_sheet: MarketSet,
    alerts: Arc<dyn AlertSink>,
    sheet: Arc<dyn SheetSink>,
    state: ScannerState,
}

impl Scanner {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        settings: SettingsStore,
        flagged: MarketSet,
        in_sheet: MarketSet,
        alerts: Arc<dyn AlertSink>,
        sheet: Arc<dyn SheetSink>,
    ) -> Self {
        Self {
            aggregator: CohortAggregator::new(upstream.clone()),
            upstream,
            settings,
            flagged,
            in_sheet,
            alerts,
            sheet,
            state: ScannerState::Idle,
        }
    }

    pub fn state(&self) -> ScannerState {
        self.state
    }

    /// Run one pagination step.
    ///
    /// A cycle-level failure (an upstream rejection, a sink or storage
    /// fault) aborts this cycle only; state committed for prior markets
    /// remains valid and the error is surfaced to the operator notice
    /// channel before propagating.
    pub async fn tick(&mut self) -> Result<CycleOutcome> {
        let settings = self.settings.load()?;
        if !settings.scanner_on {
            self.state = ScannerState::Stopped;
            return Ok(CycleOutcome::Disabled);
        }
        self.state = ScannerState::Scanning;

        match self.cycle(&settings).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                warn!(error = %e, "Cycle aborted");
                let _ = self
                    .alerts
                    .notice(&format!("Error during scan: {e}"))
                    .await;
                Err(e)
            }
        }
    }

    async fn cycle(&self, settings: &Settings) -> Result<CycleOutcome> {
        let raw = self
            .upstream
            .next_market(settings.min_volume, settings.offset)
            .await?;

        let Some(raw) = raw else {
            info!(offset = settings.offset, "Feed exhausted, wrapping cursor to 0");
            self.settings.reset_offset()?;
            return Ok(CycleOutcome::Exhausted);
        };

        let market = match raw.to_market() {
            Ok(m) => m,
            Err(e) => {
                warn!(offset = settings.offset, error = %e, "Malformed market record, skipping");
                self.settings.advance_offset()?;
                return Ok(CycleOutcome::SkippedMalformed);
            }
        };

        if self.flagged.contains(&market.condition_id)? {
            debug!(condition_id = %market.condition_id, "Already flagged, skipping");
            self.settings.advance_offset()?;
            return Ok(CycleOutcome::SkippedFlagged {
                condition_id: market.condition_id,
            });
        }

        info!(question = %market.question, offset = settings.offset, "Evaluating market");

        let cohorts = self.aggregator.aggregate(&market.condition_id).await?;
        let mut cohorts = cohorts.into_iter();
        let yes = cohorts.next().unwrap_or_default();
        let no = cohorts.next().unwrap_or_default();

        let verdict = flag_market(&market, &yes, &no, settings);
        let report = MarketReport {
            market,
            yes,
            no,
            verdict,
        };
        let condition_id = report.market.condition_id.clone();

        if let Some(v) = verdict {
            self.flagged.append(&condition_id)?;
            self.alerts.flagged(v, &report).await?;
        }
        self.alerts.unfiltered(&report).await?;

        // Sheet export dedupe: first sight always exports; repeats only
        // when this cycle flagged.
        if !self.in_sheet.contains(&condition_id)? {
            self.sheet.insert_row(&report.sheet_row()).await?;
            self.in_sheet.append(&condition_id)?;
        } else if verdict.is_some() {
            self.sheet.insert_row(&report.sheet_row()).await?;
        }

        self.settings.advance_offset()?;
        Ok(CycleOutcome::Scanned {
            condition_id,
            verdict,
        })
    }
}
