//! SENTINEL: Prediction Market Holder-Cohort Scanner
//!
//! Entry point. Loads configuration, initialises structured logging,
//! wires the upstream client, stores, and sinks into the scanner, and
//! drives the scan cycle and the daily rundown check as two periodic
//! tasks with graceful shutdown.

use anyhow::Result;
use chrono::Local;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use sentinel::config::AppConfig;
use sentinel::engine::cursor::{CycleOutcome, Scanner};
use sentinel::engine::rundown::Rundown;
use sentinel::engine::window;
use sentinel::sinks::{AlertSink, LogAlertSink, LogSheetSink};
use sentinel::storage::{MarketSet, SettingsStore};
use sentinel::upstream::polymarket::PolymarketClient;
use sentinel::upstream::Upstream;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;
    init_logging();

    info!(
        scan_interval_secs = cfg.scanner.scan_interval_secs,
        rundown_check_secs = cfg.rundown.check_interval_secs,
        "SENTINEL starting up"
    );

    // -- Wire components --------------------------------------------------

    let upstream: Arc<dyn Upstream> = Arc::new(PolymarketClient::new()?);
    for file in [
        &cfg.storage.settings_file,
        &cfg.storage.flagged_file,
        &cfg.storage.in_sheet_file,
    ] {
        if let Some(dir) = std::path::Path::new(file).parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
    }
    let settings = SettingsStore::new(&cfg.storage.settings_file);
    let flagged = MarketSet::new(&cfg.storage.flagged_file);
    let in_sheet = MarketSet::new(&cfg.storage.in_sheet_file);
    let alerts: Arc<dyn AlertSink> = Arc::new(LogAlertSink);
    let sheet = Arc::new(LogSheetSink);

    let startup = settings.load()?;
    if startup.scanner_on {
        alerts.notice("Starting scanner...").await?;
    } else {
        alerts
            .notice("Scanner is not enabled. Enable scanner_on to start scanning.")
            .await?;
    }
    alerts
        .notice(&format!("Current settings:\n{}", settings.describe()?))
        .await?;

    let mut scanner = Scanner::new(
        upstream.clone(),
        settings.clone(),
        flagged,
        in_sheet,
        alerts.clone(),
        sheet,
    );
    let mut rundown = Rundown::new(
        upstream,
        settings,
        alerts,
        cfg.rundown.wallet.clone(),
    );

    // -- Main loop ---------------------------------------------------------

    let mut scan_interval =
        tokio::time::interval(Duration::from_secs(cfg.scanner.scan_interval_secs));
    let mut rundown_interval =
        tokio::time::interval(Duration::from_secs(cfg.rundown.check_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!("Entering main loop. Press Ctrl+C to stop.");

    loop {
        tokio::select! {
            _ = scan_interval.tick() => {
                if !window::is_allowed_now(cfg.scanner.exclusion_anchor_hour) {
                    continue;
                }
                match scanner.tick().await {
                    Ok(CycleOutcome::Disabled) => {}
                    Ok(outcome) => info!(?outcome, "Scan cycle complete"),
                    // tick() already surfaced the error to the notice
                    // channel; committed cursor state remains valid.
                    Err(e) => error!(error = %e, "Scan cycle failed; continuing"),
                }
            }
            _ = rundown_interval.tick() => {
                match rundown.check(Local::now()).await {
                    Ok(true) => info!("Daily rundown emitted"),
                    Ok(false) => {}
                    Err(e) => error!(error = %e, "Rundown check failed; continuing"),
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    info!("SENTINEL shut down cleanly.");
    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sentinel=info"));

    let json_logging = std::env::var("SENTINEL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt().with_env_filter(env_filter).with_target(true).init();
    }
}
