//! Detects expected crons whose last completed run is too old.
//!
//! Only the first stale cron (in expected-list order) is reported: one alert
//! is enough to get someone looking at the crons.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use cronwatch_notify::Alert;

use crate::store::{window_start, CronStatsRow};

/// First row older than `now - tolerance`. Missing crons always qualify.
pub fn find_stale(
    rows: &[CronStatsRow],
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Option<&CronStatsRow> {
    let threshold = window_start(now, tolerance);

    rows.iter().find(|row| {
        info!(cron = %row.name, updated_at = %row.updated_at, "Row last updated");
        row.is_missing() || row.updated_at < threshold
    })
}

/// `tolerance_text` is the tolerance as the operator wrote it (`1d`, `90m`).
pub fn staleness_message(row: &CronStatsRow, tolerance_text: &str) -> String {
    format!(
        "Fleet cron '{}' hasn't updated in more than {}. Last status was '{}' at {}.",
        row.name, tolerance_text, row.status, row.updated_at
    )
}

/// The single `cronSystem` alert for this run, if any cron is stale.
pub fn check_staleness(
    rows: &[CronStatsRow],
    tolerance: Duration,
    tolerance_text: &str,
    now: DateTime<Utc>,
) -> Option<Alert> {
    let row = find_stale(rows, tolerance, now)?;
    warn!(
        cron = %row.name,
        status = %row.status,
        tolerance = tolerance_text,
        "Cron hasn't updated within tolerance, alerting"
    );
    Some(Alert::system(staleness_message(row, tolerance_text)))
}
