//! Daily rundown scenarios: gate latching and the composite summary.

use chrono::{Local, TimeZone};
use std::sync::Arc;

use sentinel::engine::rundown::Rundown;

use super::mock_upstream::{raw_market, temp_settings, MockUpstream, RecordingAlerts};

fn at_hour(hour: u32) -> chrono::DateTime<Local> {
    Local.with_ymd_and_hms(2026, 8, 26, hour, 5, 0).unwrap()
}

#[tokio::test]
async fn rundown_fires_once_within_target_hour() {
    let mut upstream = MockUpstream::default();
    upstream.markets.push(raw_market("0xheld", 0.50));
    upstream.add_holder("0xheld", 0, "0xalice", 100.0, 100.0, 1000.0);
    upstream.add_holder("0xheld", 1, "0xbob", 50.0, 100.0, 1000.0);
    upstream.open.push("0xheld".to_string());

    let settings = temp_settings();
    let alerts = Arc::new(RecordingAlerts::default());
    let mut rundown = Rundown::new(
        Arc::new(upstream),
        settings.clone(),
        alerts.clone(),
        "0xwallet".to_string(),
    );

    let target = settings.load().unwrap().rundown_time;

    // Outside the target hour: quiet.
    assert!(!rundown.check(at_hour((target + 1) % 24)).await.unwrap());
    assert!(alerts.rundowns.lock().unwrap().is_empty());

    // Inside the target hour: fires exactly once.
    assert!(rundown.check(at_hour(target)).await.unwrap());
    assert!(!rundown.check(at_hour(target)).await.unwrap());

    let rundowns = alerts.rundowns.lock().unwrap().clone();
    assert_eq!(rundowns.len(), 1);
    assert!(rundowns[0].contains("Daily Rundown"));
    assert!(rundowns[0].contains("Total Positions: 1"));
    assert!(rundowns[0].contains("0XHELD"));
}

#[tokio::test]
async fn rundown_rearms_after_hour_moves_off_target() {
    let settings = temp_settings();
    let alerts = Arc::new(RecordingAlerts::default());
    let mut rundown = Rundown::new(
        Arc::new(MockUpstream::default()),
        settings.clone(),
        alerts.clone(),
        "0xwallet".to_string(),
    );

    let target = settings.load().unwrap().rundown_time;
    assert!(rundown.check(at_hour(target)).await.unwrap());
    assert!(!rundown.check(at_hour(target)).await.unwrap());
    // Hour moves off the target, gate unlatches, next day fires again.
    assert!(!rundown.check(at_hour((target + 1) % 24)).await.unwrap());
    assert!(rundown.check(at_hour(target)).await.unwrap());
    assert_eq!(alerts.rundowns.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn rundown_ignores_flagged_set() {
    // A rundown over a held market is read-only: it evaluates the
    // pipeline but never touches the dedupe sets.
    let mut upstream = MockUpstream::default();
    upstream.markets.push(raw_market("0xheld", 0.50));
    upstream.add_holder("0xheld", 0, "0xalice", 1000.0, 100.0, 1000.0);
    upstream.add_holder("0xheld", 1, "0xbob", 0.0, 100.0, 1000.0);
    upstream.open.push("0xheld".to_string());

    let settings = temp_settings();
    let alerts = Arc::new(RecordingAlerts::default());
    let mut rundown = Rundown::new(
        Arc::new(upstream),
        settings.clone(),
        alerts.clone(),
        "0xwallet".to_string(),
    );

    let target = settings.load().unwrap().rundown_time;
    assert!(rundown.check(at_hour(target)).await.unwrap());
    // Asymmetric enough to flag in a scan cycle, yet only the rundown
    // channel sees it.
    assert!(alerts.flagged.lock().unwrap().is_empty());
    assert!(alerts.unfiltered.lock().unwrap().is_empty());
    assert_eq!(alerts.rundowns.lock().unwrap().len(), 1);
}
