//! Flag decision rule.
//!
//! A pure function of the cohort aggregate pair, the market prices, and
//! the configured thresholds. The YES branch is evaluated first; first
//! match wins. Price bounds are a strict open interval and the growth
//! differential is strict greater-than, so boundary values never flag.
//!
//! The PnL-diff, bot-count-diff, and account-proportion thresholds are
//! validated and stored but not consulted here; they stay available as
//! an extension point.

use crate::storage::Settings;
use crate::types::{CohortAggregate, Market, Verdict};

/// Evaluate the decision table for one market.
pub fn flag_market(
    market: &Market,
    yes: &CohortAggregate,
    no: &CohortAggregate,
    settings: &Settings,
) -> Option<Verdict> {
    let growth_diff = settings.min_growth_rate_diff as f64;

    if in_price_band(market.price_yes, settings)
        && yes.scaled_growth_avg - no.scaled_growth_avg > growth_diff
    {
        return Some(Verdict::Yes);
    }

    if in_price_band(market.price_no, settings)
        && no.scaled_growth_avg - yes.scaled_growth_avg > growth_diff
    {
        return Some(Verdict::No);
    }

    None
}

/// Strict open interval: `min_share_price < price < max_share_price`.
fn in_price_band(price: f64, settings: &Settings) -> bool {
    price > settings.min_share_price && price < settings.max_share_price
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
