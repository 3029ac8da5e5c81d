//! Per-cron error digest over the lookback window.

use tracing::warn;

use cronwatch_notify::Alert;

use crate::store::CronStatsDigestRow;

/// Failure alert for one digest group, or `None` when the group had no errors.
pub fn digest_alert(row: &CronStatsDigestRow) -> Option<Alert> {
    if row.error_count == 0 {
        return None;
    }

    let error = row.most_recent_error.as_deref().unwrap_or_default();
    warn!(
        cron = %row.name,
        runs = row.occurrence_count,
        errors = row.error_count,
        most_recent_error = %error,
        "Cron job had errors, alerting"
    );

    let body = if row.occurrence_count == 1 {
        format!(
            "Fleet cron '{}' (last updated {}) raised errors during its last run:\n{}",
            row.name, row.last_updated_at, error
        )
    } else {
        format!(
            "Fleet cron '{}' (last updated {}) raised errors in {} of the previous {} runs; \
             the most recent is:\n{}",
            row.name, row.last_updated_at, row.error_count, row.occurrence_count, error
        )
    };

    Some(Alert::job_failure(body))
}

/// One `cronJobFailure` alert per group with at least one error.
pub fn digest_alerts(rows: &[CronStatsDigestRow]) -> Vec<Alert> {
    rows.iter().filter_map(digest_alert).collect()
}
