//! Polymarket feed client.
//!
//! Implements the `Upstream` trait over three public read-only APIs:
//! the Gamma API for market discovery, the Data API for holders,
//! positions, account values, and trade activity, and the PnL API for
//! per-wallet PnL history. No authentication required.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::upstream::{
    fetch_json, ActivityRecord, FetchError, HolderGroup, PnlPoint, PositionRecord, RawMarket,
    Upstream, ValueRecord, ACTIVITY_PAGE_LIMIT,
};

const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";
const DATA_API_URL: &str = "https://data-api.polymarket.com";
const PNL_API_URL: &str = "https://user-pnl-api.polymarket.com";

/// Per-request timeout. Bounds a stuck upstream call so one cycle can
/// never block the loop indefinitely.
const HTTP_TIMEOUT_SECS: u64 = 30;

pub struct PolymarketClient {
    http: Client,
}

impl PolymarketClient {
    pub fn new() -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(HTTP_TIMEOUT_SECS))
            .build()
            .context("Failed to build Polymarket HTTP client")?;
        Ok(Self { http })
    }

    /// Query the positions feed; with a market filter for single-market
    /// lookups, without for the full open-position enumeration.
    async fn positions(
        &self,
        wallet: &str,
        condition_id: Option<&str>,
    ) -> Result<Vec<PositionRecord>, FetchError> {
        let url = format!("{DATA_API_URL}/positions");
        let mut params = vec![("user", wallet.to_string())];
        if let Some(id) = condition_id {
            params.push(("market", id.to_string()));
        }
        let records: Option<Vec<PositionRecord>> = fetch_json(&self.http, &url, &params).await?;
        Ok(records.unwrap_or_default())
    }
}

#[async_trait]
impl Upstream for PolymarketClient {
    async fn next_market(
        &self,
        min_volume: u64,
        offset: u64,
    ) -> Result<Option<RawMarket>, FetchError> {
        let url = format!("{GAMMA_API_URL}/markets");
        let params = [
            ("limit", "1".to_string()),
            ("offset", offset.to_string()),
            ("active", "true".to_string()),
            ("closed", "false".to_string()),
            ("volume_num_min", min_volume.to_string()),
        ];
        debug!(offset, min_volume, "Fetching next market");
        let markets: Option<Vec<RawMarket>> = fetch_json(&self.http, &url, &params).await?;
        Ok(markets.and_then(|mut m| {
            if m.is_empty() {
                None
            } else {
                Some(m.remove(0))
            }
        }))
    }

    async fn market_by_condition(
        &self,
        condition_id: &str,
    ) -> Result<Option<RawMarket>, FetchError> {
        let url = format!("{GAMMA_API_URL}/markets");
        let params = [("condition_ids", condition_id.to_string())];
        let markets: Option<Vec<RawMarket>> = fetch_json(&self.http, &url, &params).await?;
        Ok(markets.and_then(|mut m| {
            if m.is_empty() {
                None
            } else {
                Some(m.remove(0))
            }
        }))
    }

    async fn holder_groups(&self, condition_id: &str) -> Result<Vec<Vec<String>>, FetchError> {
        let url = format!("{DATA_API_URL}/holders");
        let params = [("market", condition_id.to_string())];
        let groups: Option<Vec<HolderGroup>> = fetch_json(&self.http, &url, &params).await?;
        Ok(groups
            .unwrap_or_default()
            .into_iter()
            .map(|g| g.holders.into_iter().map(|h| h.proxy_wallet).collect())
            .collect())
    }

    async fn pnl_history(&self, wallet: &str) -> Result<Vec<PnlPoint>, FetchError> {
        let url = format!("{PNL_API_URL}/user-pnl");
        let params = [
            ("user_address", wallet.to_string()),
            ("interval", "max".to_string()),
            ("fidelity", "12h".to_string()),
        ];
        let history: Option<Vec<PnlPoint>> = fetch_json(&self.http, &url, &params).await?;
        Ok(history.unwrap_or_default())
    }

    async fn position(&self, wallet: &str, condition_id: &str) -> Result<(f64, f64), FetchError> {
        let records = self.positions(wallet, Some(condition_id)).await?;
        Ok(records
            .first()
            .map(|r| (r.current_value, r.cash_pnl))
            .unwrap_or((0.0, 0.0)))
    }

    async fn account_value(&self, wallet: &str) -> Result<f64, FetchError> {
        let url = format!("{DATA_API_URL}/value");
        let params = [("user", wallet.to_string())];
        let records: Option<Vec<ValueRecord>> = fetch_json(&self.http, &url, &params).await?;
        Ok(records
            .unwrap_or_default()
            .first()
            .map(|r| r.value)
            .unwrap_or(0.0))
    }

    async fn trade_activity(&self, wallet: &str) -> Result<Vec<ActivityRecord>, FetchError> {
        let url = format!("{DATA_API_URL}/activity");
        let params = [
            ("user", wallet.to_string()),
            ("limit", ACTIVITY_PAGE_LIMIT.to_string()),
            ("sortDirection", "DESC".to_string()),
            ("type", "TRADE".to_string()),
        ];
        let trades: Option<Vec<ActivityRecord>> = fetch_json(&self.http, &url, &params).await?;
        Ok(trades.unwrap_or_default())
    }

    async fn open_positions(&self, wallet: &str) -> Result<Vec<String>, FetchError> {
        let records = self.positions(wallet, None).await?;
        Ok(records
            .into_iter()
            .filter(|r| !r.condition_id.is_empty())
            .map(|r| r.condition_id)
            .collect())
    }
}
