//! Holder cohort aggregation.
//!
//! For each outcome side of a market, fetches the holder wallets,
//! derives per-holder metrics from their PnL history, and reduces them
//! to a per-side `CohortAggregate`. Everything here is transient and
//! recomputed every cycle; nothing is cached or persisted.

use futures::future::join_all;
use std::sync::Arc;
use tracing::debug;

use crate::types::{CohortAggregate, HolderMetric};
use crate::upstream::{FetchError, Upstream, ACTIVITY_PAGE_LIMIT};

const SECS_PER_DAY: f64 = 86_400.0;

// ---------------------------------------------------------------------------
// Bot heuristic
// ---------------------------------------------------------------------------

/// Span threshold for the bot heuristic, in days.
pub const BOT_SPAN_DAYS: f64 = 50.0;

/// Swappable bot-likelihood predicate over `(trade_count, span_days)`.
pub type BotPredicate = fn(usize, f64) -> bool;

/// Default heuristic: a trade history that exactly hits the page cap
/// within a short real-world span implies automated high-frequency
/// trading rather than a complete record.
pub fn page_cap_bot_predicate(trade_count: usize, span_days: f64) -> bool {
    trade_count == ACTIVITY_PAGE_LIMIT && span_days < BOT_SPAN_DAYS
}

// ---------------------------------------------------------------------------
// Weighted averages
// ---------------------------------------------------------------------------

/// Size-weighted scaled average: `Σ(v·w) / (Σw · len(vals))`.
///
/// Defined as 0 when the weight sum or the value count is 0; a
/// degenerate-case policy, not an error.
pub fn scaled_avg(vals: &[f64], weights: &[f64]) -> f64 {
    let weight_sum: f64 = weights.iter().sum();
    if vals.is_empty() || weight_sum == 0.0 {
        return 0.0;
    }
    let weighted: f64 = vals.iter().zip(weights).map(|(v, w)| v * w).sum();
    weighted / (weight_sum * vals.len() as f64)
}

/// Average proportion of account committed.
///
/// Pairs with a zero account contribute 0 to the numerator but still
/// count in the denominator; defined as 0 when the account sum is 0.
pub fn avg_prop(sizes: &[f64], accounts: &[f64]) -> f64 {
    if sizes.is_empty() || accounts.iter().sum::<f64>() == 0.0 {
        return 0.0;
    }
    let numerator: f64 = sizes
        .iter()
        .zip(accounts)
        .filter(|(_, a)| **a != 0.0)
        .map(|(s, a)| s / a)
        .sum();
    numerator / sizes.len() as f64
}

// ---------------------------------------------------------------------------
// Aggregator
// ---------------------------------------------------------------------------

/// Computes per-outcome cohort aggregates for one market.
pub struct CohortAggregator {
    upstream: Arc<dyn Upstream>,
    is_bot: BotPredicate,
}

impl CohortAggregator {
    pub fn new(upstream: Arc<dyn Upstream>) -> Self {
        Self {
            upstream,
            is_bot: page_cap_bot_predicate,
        }
    }

    /// Construct with a replacement bot heuristic.
    pub fn with_bot_predicate(upstream: Arc<dyn Upstream>, is_bot: BotPredicate) -> Self {
        Self { upstream, is_bot }
    }

    /// Aggregate all holder cohorts of a market, one `CohortAggregate`
    /// per outcome side, in upstream group order (yes, no).
    ///
    /// Holders in the same cohort are fetched concurrently; the calls
    /// for a single holder stay sequential because each depends on the
    /// one before it.
    pub async fn aggregate(&self, condition_id: &str) -> Result<Vec<CohortAggregate>, FetchError> {
        let groups = self.upstream.holder_groups(condition_id).await?;
        let mut aggregates = Vec::with_capacity(groups.len());

        for wallets in &groups {
            let fetched = join_all(
                wallets
                    .iter()
                    .map(|w| self.holder_metric(w, condition_id)),
            )
            .await;

            let mut metrics = Vec::new();
            for result in fetched {
                if let Some(metric) = result? {
                    metrics.push(metric);
                }
            }

            debug!(
                condition_id,
                holders = wallets.len(),
                retained = metrics.len(),
                "Cohort aggregated"
            );
            aggregates.push(summarize(&metrics));
        }

        Ok(aggregates)
    }

    /// Derive one holder's metrics.
    ///
    /// Returns `Ok(None)` for holders with insufficient history (< 2
    /// PnL samples) or a zero-day sample span: a data-quality filter,
    /// not an error.
    async fn holder_metric(
        &self,
        wallet: &str,
        condition_id: &str,
    ) -> Result<Option<HolderMetric>, FetchError> {
        let history = self.upstream.pnl_history(wallet).await?;
        if history.len() < 2 {
            return Ok(None);
        }

        let start = history[0];
        let end = history[history.len() - 1];
        let days = (end.t - start.t) as f64 / SECS_PER_DAY;
        if days <= 0.0 {
            // Zero-span history makes the realised rate unmeasurable.
            return Ok(None);
        }

        let (current_value, cash_pnl) = self.upstream.position(wallet, condition_id).await?;
        let account = self.upstream.account_value(wallet).await?;
        let trades = self.upstream.trade_activity(wallet).await?;

        let is_bot = if trades.len() >= 2 {
            let span_days =
                (trades[0].timestamp - trades[trades.len() - 1].timestamp) as f64 / SECS_PER_DAY;
            (self.is_bot)(trades.len(), span_days)
        } else {
            false
        };

        Ok(Some(HolderMetric {
            growth_rate: ((end.p - start.p - cash_pnl) / days).round() as i64,
            pnl: (end.p - cash_pnl).round() as i64,
            position_size: current_value.round() as i64,
            account_size: account.round() as i64,
            is_bot,
        }))
    }
}

/// Reduce a cohort's holder metrics to its scalar summary.
fn summarize(metrics: &[HolderMetric]) -> CohortAggregate {
    let growth: Vec<f64> = metrics.iter().map(|m| m.growth_rate as f64).collect();
    let pnls: Vec<f64> = metrics.iter().map(|m| m.pnl as f64).collect();
    let sizes: Vec<f64> = metrics.iter().map(|m| m.position_size as f64).collect();
    let accounts: Vec<f64> = metrics.iter().map(|m| m.account_size as f64).collect();

    CohortAggregate {
        scaled_growth_avg: scaled_avg(&growth, &sizes),
        scaled_pnl_avg: scaled_avg(&pnls, &sizes),
        avg_account_prop: avg_prop(&sizes, &accounts),
        bot_count: metrics.iter().filter(|m| m.is_bot).count(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
