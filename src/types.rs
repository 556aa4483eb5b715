//! Shared types for the SENTINEL scanner.
//!
//! These types form the data model used across all modules.
//! They are designed to be stable so that upstream, storage,
//! and engine modules can depend on them without circular references.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Market
// ---------------------------------------------------------------------------

/// A single addressable prediction market, fetched fresh each cycle.
///
/// Mutable fields (prices, volume) reflect the moment of the fetch;
/// nothing here is cached between cycles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    /// Upstream market identifier (`conditionId`).
    pub condition_id: String,
    pub question: String,
    /// Current YES share price (0.0–1.0).
    pub price_yes: f64,
    /// Current NO share price (0.0–1.0).
    pub price_no: f64,
    /// Aggregate traded volume, thousands separators stripped.
    pub volume: u64,
    /// External display ticker.
    pub ticker: String,
    /// Market resolution deadline.
    pub end_date: DateTime<Utc>,
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] (YES: {:.0}¢ | NO: {:.0}¢ | vol: {})",
            self.question,
            self.ticker,
            self.price_yes * 100.0,
            self.price_no * 100.0,
            self.volume,
        )
    }
}

// ---------------------------------------------------------------------------
// Verdict
// ---------------------------------------------------------------------------

/// A raised flag: which outcome side the asymmetry favours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    Yes,
    No,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Yes => write!(f, "YES"),
            Verdict::No => write!(f, "NO"),
        }
    }
}

// ---------------------------------------------------------------------------
// Holder metrics
// ---------------------------------------------------------------------------

/// Per-holder derived figures, computed from upstream PnL history.
///
/// Holders with fewer than 2 history samples (or a zero-day span)
/// never produce a metric; they are filtered before construction.
#[derive(Debug, Clone, PartialEq)]
pub struct HolderMetric {
    /// Realised PnL change per elapsed day, rounded.
    pub growth_rate: i64,
    /// Raw PnL net of realised cash PnL, rounded.
    pub pnl: i64,
    /// Current position value in this market, rounded.
    pub position_size: i64,
    /// Current total account value, rounded.
    pub account_size: i64,
    /// Bot-likelihood heuristic result.
    pub is_bot: bool,
}

/// Per-outcome, per-market scalar summary over the retained holders
/// of that side. Derived, stateless, recomputed each cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CohortAggregate {
    /// Size-weighted average growth rate.
    pub scaled_growth_avg: f64,
    /// Size-weighted average PnL.
    pub scaled_pnl_avg: f64,
    /// Average proportion of account committed to this market.
    pub avg_account_prop: f64,
    /// Count of bot-like holders on this side.
    pub bot_count: usize,
}

// ---------------------------------------------------------------------------
// Market report
// ---------------------------------------------------------------------------

/// The structured result record for one evaluated market: pass-through
/// market fields, the cohort aggregate pair, and the flag verdict.
///
/// The core emits reports; delivery (chat, spreadsheet) belongs to
/// external sinks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketReport {
    pub market: Market,
    pub yes: CohortAggregate,
    pub no: CohortAggregate,
    pub verdict: Option<Verdict>,
}

impl MarketReport {
    /// Render the human-readable summary payload for notification sinks.
    pub fn summary(&self) -> String {
        format!(
            "{question} [{ticker}]\n\
             Resolves: {date}\n\
             Volume: {volume}\n\
             Prices: YES {py:.2} | NO {pn:.2}\n\
             Scaled Growth Avg: YES {gy:.2} | NO {gn:.2}\n\
             Scaled PnL Avg: YES {pyl:.2} | NO {pnl:.2}\n\
             Avg Account Prop: YES {ay:.4} | NO {an:.4}\n\
             Bot Count: YES {by} | NO {bn}\n",
            question = self.market.question,
            ticker = self.market.ticker,
            date = self.market.end_date.format("%Y-%m-%d"),
            volume = self.market.volume,
            py = self.market.price_yes,
            pn = self.market.price_no,
            gy = self.yes.scaled_growth_avg,
            gn = self.no.scaled_growth_avg,
            pyl = self.yes.scaled_pnl_avg,
            pnl = self.no.scaled_pnl_avg,
            ay = self.yes.avg_account_prop,
            an = self.no.avg_account_prop,
            by = self.yes.bot_count,
            bn = self.no.bot_count,
        )
    }

    /// The ordered row of scalar values for the spreadsheet sink.
    /// The first cell carries the flag verdict (or "NO FLAG").
    pub fn sheet_row(&self) -> Vec<String> {
        let flag = match self.verdict {
            Some(v) => format!("BUY {v}"),
            None => "NO FLAG".to_string(),
        };
        vec![
            flag,
            self.market.question.clone(),
            self.market.ticker.clone(),
            self.market.volume.to_string(),
            format!("{:.2}", self.market.price_yes),
            format!("{:.2}", self.market.price_no),
            self.market.end_date.format("%Y-%m-%d").to_string(),
            format!("{:.2}", self.yes.scaled_growth_avg),
            format!("{:.2}", self.no.scaled_growth_avg),
            format!("{:.2}", self.yes.scaled_pnl_avg),
            format!("{:.2}", self.no.scaled_pnl_avg),
            format!("{:.4}", self.yes.avg_account_prop),
            format!("{:.4}", self.no.avg_account_prop),
            self.yes.bot_count.to_string(),
            self.no.bot_count.to_string(),
        ]
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for SENTINEL.
///
/// Insufficient holder history is deliberately absent: it is a
/// per-holder data-quality filter, not an error.
#[derive(Debug, thiserror::Error)]
pub enum SentinelError {
    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error("Malformed market record ({condition_id}): missing or unparseable {field}")]
    MalformedMarket {
        condition_id: String,
        field: &'static str,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
