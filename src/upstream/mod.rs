//! Upstream data-source contract.
//!
//! Defines the wire-level record types, the retrying JSON fetch helper,
//! and the `Upstream` trait that abstracts the market/holder/activity
//! feeds. The real HTTP implementation lives in `polymarket.rs`; tests
//! substitute an in-memory mock.

pub mod polymarket;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::types::{Market, SentinelError};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Maximum attempts per fetch before degrading to "no data".
pub const FETCH_ATTEMPTS: u32 = 5;

/// Fixed delay between retry attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(2);

/// Page cap on the trade-activity feed. Also feeds the bot heuristic:
/// a holder whose history exactly hits the cap has a truncated record.
pub const ACTIVITY_PAGE_LIMIT: usize = 500;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Fetch-layer failure taxonomy.
///
/// Transient failures are retried internally and never normally escape
/// (`fetch_json` degrades them to `Ok(None)`); a well-formed error
/// response is not retried and propagates to the calling cycle.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transient fetch failure: {0}")]
    Transient(#[from] reqwest::Error),

    #[error("upstream rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

// ---------------------------------------------------------------------------
// Retrying fetch helper
// ---------------------------------------------------------------------------

/// GET `url` with `params` and parse the JSON body.
///
/// Network-level failures and timeouts are retried up to
/// [`FETCH_ATTEMPTS`] with a fixed [`RETRY_DELAY`] between attempts;
/// after exhaustion the call returns `Ok(None)` so callers can apply
/// domain-specific fallback ("no market found"). Error status responses
/// are not retried and return [`FetchError::Rejected`] immediately.
///
/// Stateless; safe to call concurrently.
pub async fn fetch_json<T: DeserializeOwned>(
    http: &Client,
    url: &str,
    params: &[(&str, String)],
) -> Result<Option<T>, FetchError> {
    for attempt in 1..=FETCH_ATTEMPTS {
        match http.get(url).query(params).send().await {
            Ok(resp) => {
                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(FetchError::Rejected {
                        status: status.as_u16(),
                        body,
                    });
                }
                match resp.json::<T>().await {
                    Ok(parsed) => return Ok(Some(parsed)),
                    Err(e) if e.is_decode() => {
                        // A 2xx body we cannot use is an upstream defect,
                        // not a connectivity problem.
                        return Err(FetchError::Rejected {
                            status: status.as_u16(),
                            body: format!("undecodable body: {e}"),
                        });
                    }
                    Err(e) => {
                        warn!(attempt, url, error = %e, "Body read failed");
                    }
                }
            }
            Err(e) => {
                warn!(attempt, url, error = %e, "Fetch attempt failed");
            }
        }
        if attempt < FETCH_ATTEMPTS {
            tokio::time::sleep(RETRY_DELAY).await;
        }
    }

    debug!(url, "Retries exhausted, treating as no data");
    Ok(None)
}

// ---------------------------------------------------------------------------
// Wire records
// ---------------------------------------------------------------------------

/// Raw market record from the market feed.
///
/// All fields default so a partial record still deserialises; required
/// fields are enforced in [`RawMarket::to_market`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMarket {
    #[serde(default, rename = "conditionId")]
    pub condition_id: String,
    #[serde(default)]
    pub question: String,
    /// Outcome prices as a JSON string: `"[\"0.65\",\"0.35\"]"`.
    #[serde(default, rename = "outcomePrices")]
    pub outcome_prices: Option<String>,
    /// Volume as formatted text, possibly with thousands separators.
    #[serde(default)]
    pub volume: Option<String>,
    #[serde(default, rename = "volumeNum")]
    pub volume_num: Option<f64>,
    #[serde(default)]
    pub ticker: Option<String>,
    #[serde(default, rename = "endDate")]
    pub end_date: Option<String>,
}

impl RawMarket {
    /// Validate and convert into the internal [`Market`] type.
    ///
    /// A record missing prices, ticker, or resolution date is
    /// `MalformedMarket`; the cycle treats it like an empty slot at the
    /// current offset and advances rather than crashing.
    pub fn to_market(&self) -> Result<Market, SentinelError> {
        let malformed = |field: &'static str| SentinelError::MalformedMarket {
            condition_id: self.condition_id.clone(),
            field,
        };

        if self.condition_id.is_empty() {
            return Err(malformed("conditionId"));
        }
        if self.question.is_empty() {
            return Err(malformed("question"));
        }

        let (price_yes, price_no) = self
            .outcome_prices
            .as_deref()
            .and_then(parse_outcome_prices)
            .ok_or_else(|| malformed("outcomePrices"))?;

        let ticker = self
            .ticker
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| malformed("ticker"))?
            .to_string();

        let end_date = self
            .end_date
            .as_deref()
            .and_then(parse_end_date)
            .ok_or_else(|| malformed("endDate"))?;

        Ok(Market {
            condition_id: self.condition_id.clone(),
            question: self.question.clone(),
            price_yes,
            price_no,
            volume: self.parse_volume(),
            ticker,
            end_date,
        })
    }

    /// Traded volume as an integer, thousands separators stripped.
    /// Missing volume is 0, not malformed.
    fn parse_volume(&self) -> u64 {
        self.volume
            .as_deref()
            .and_then(|v| v.replace(',', "").parse::<f64>().ok())
            .or(self.volume_num)
            .map(|v| v.round().max(0.0) as u64)
            .unwrap_or(0)
    }
}

/// Parse outcome prices from the feed's string format.
/// Handles `"[\"0.65\",\"0.35\"]"` and `"0.65, 0.35"`.
pub fn parse_outcome_prices(s: &str) -> Option<(f64, f64)> {
    let cleaned = s.replace(['[', ']', '"', '\\'], "");
    let parts: Vec<&str> = cleaned.split(',').map(|p| p.trim()).collect();
    if parts.len() >= 2 {
        let yes = parts[0].parse::<f64>().ok()?;
        let no = parts[1].parse::<f64>().ok()?;
        Some((yes, no))
    } else {
        None
    }
}

/// Parse a resolution date: RFC 3339 first, plain date as fallback.
fn parse_end_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|nd| nd.and_hms_opt(23, 59, 59))
                .map(|ndt| ndt.and_utc())
        })
}

/// One sample of a holder's PnL history.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PnlPoint {
    /// Unix timestamp of the sample.
    pub t: i64,
    /// Cumulative PnL at the sample.
    pub p: f64,
}

/// One trade-activity record; only the timestamp matters to the core.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ActivityRecord {
    pub timestamp: i64,
}

/// One outcome side's holder list.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HolderGroup {
    #[serde(default)]
    pub holders: Vec<HolderEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HolderEntry {
    #[serde(rename = "proxyWallet")]
    pub proxy_wallet: String,
}

/// One open-position record for a wallet.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionRecord {
    #[serde(default, rename = "conditionId")]
    pub condition_id: String,
    #[serde(default, rename = "currentValue")]
    pub current_value: f64,
    #[serde(default, rename = "cashPnl")]
    pub cash_pnl: f64,
}

/// Wallet total-value record.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ValueRecord {
    pub value: f64,
}

// ---------------------------------------------------------------------------
// Upstream trait
// ---------------------------------------------------------------------------

/// Abstraction over the upstream market/holder/activity feeds.
///
/// Each method degrades to an empty result when the fetch layer exhausts
/// its retries; `Err` is reserved for well-formed upstream rejections.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Zero-or-one active, open market with at least `min_volume`,
    /// skipping `offset` entries.
    async fn next_market(
        &self,
        min_volume: u64,
        offset: u64,
    ) -> Result<Option<RawMarket>, FetchError>;

    /// Look a market up by its condition id (used by the rundown).
    async fn market_by_condition(
        &self,
        condition_id: &str,
    ) -> Result<Option<RawMarket>, FetchError>;

    /// The two holder cohorts (yes-side wallets, no-side wallets).
    async fn holder_groups(&self, condition_id: &str) -> Result<Vec<Vec<String>>, FetchError>;

    /// Full PnL history for a wallet, oldest sample first.
    async fn pnl_history(&self, wallet: &str) -> Result<Vec<PnlPoint>, FetchError>;

    /// `(current_value, cash_pnl)` for a wallet in a market;
    /// `(0, 0)` when no position exists.
    async fn position(&self, wallet: &str, condition_id: &str) -> Result<(f64, f64), FetchError>;

    /// Current total account value for a wallet.
    async fn account_value(&self, wallet: &str) -> Result<f64, FetchError>;

    /// Most recent trades, newest first, capped at [`ACTIVITY_PAGE_LIMIT`].
    async fn trade_activity(&self, wallet: &str) -> Result<Vec<ActivityRecord>, FetchError>;

    /// Condition ids of all markets the wallet currently holds.
    async fn open_positions(&self, wallet: &str) -> Result<Vec<String>, FetchError>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
