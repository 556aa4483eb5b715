//! External delivery sinks.
//!
//! The core only produces structured records; chat notification and
//! spreadsheet export are collaborators behind these traits. The
//! binary wires up the tracing-backed implementations; integration
//! tests substitute recording mocks.

use anyhow::Result;
use async_trait::async_trait;
use tracing::info;

use crate::types::{MarketReport, Verdict};

/// Notification surface for alerts and operator messages.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// A market met the flag criteria.
    async fn flagged(&self, verdict: Verdict, report: &MarketReport) -> Result<()>;

    /// Unfiltered per-market summary, sent for every evaluated market.
    async fn unfiltered(&self, report: &MarketReport) -> Result<()>;

    /// The daily rundown composite summary.
    async fn rundown(&self, summary: &str) -> Result<()>;

    /// Operator-facing notice (startup status, cycle errors, settings).
    async fn notice(&self, message: &str) -> Result<()>;
}

/// Spreadsheet surface: accepts an ordered row of scalar values to be
/// inserted at a fixed position in an external sheet.
#[async_trait]
pub trait SheetSink: Send + Sync {
    async fn insert_row(&self, row: &[String]) -> Result<()>;
}

// ---------------------------------------------------------------------------
// Logging implementations
// ---------------------------------------------------------------------------

/// Alert sink that writes everything to the structured log.
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    async fn flagged(&self, verdict: Verdict, report: &MarketReport) -> Result<()> {
        info!(
            verdict = %verdict,
            condition_id = %report.market.condition_id,
            "FLAG: Buy {verdict}\n{}",
            report.summary()
        );
        Ok(())
    }

    async fn unfiltered(&self, report: &MarketReport) -> Result<()> {
        info!(condition_id = %report.market.condition_id, "{}", report.summary());
        Ok(())
    }

    async fn rundown(&self, summary: &str) -> Result<()> {
        info!("{summary}");
        Ok(())
    }

    async fn notice(&self, message: &str) -> Result<()> {
        info!("{message}");
        Ok(())
    }
}

/// Sheet sink that writes rows to the structured log.
pub struct LogSheetSink;

#[async_trait]
impl SheetSink for LogSheetSink {
    async fn insert_row(&self, row: &[String]) -> Result<()> {
        info!(row = ?row, "Sheet row");
        Ok(())
    }
}
