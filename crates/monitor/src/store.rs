//! Read model for the `cron_stats` table.
//!
//! [`CronStatsSource`] is the seam between the checks and the database;
//! [`StoreConnector`] opens one source per invocation.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cronwatch_core::MonitorError;

/// Status reported for an expected cron that has never completed.
pub const MISSING_CRON_STATUS: &str = "missing cron";

/// Latest completed run of one expected cron.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronStatsRow {
    pub name: String,
    pub status: String,
    pub updated_at: DateTime<Utc>,
}

impl CronStatsRow {
    /// Placeholder for an expected cron with no completed row; dated at the Unix epoch.
    pub fn missing(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: MISSING_CRON_STATUS.to_string(),
            updated_at: DateTime::<Utc>::default(),
        }
    }

    pub fn is_missing(&self) -> bool {
        self.status == MISSING_CRON_STATUS
    }
}

/// Per-name aggregate of the runs created inside the digest window.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct CronStatsDigestRow {
    pub name: String,
    pub occurrence_count: i64,
    pub error_count: i64,
    pub last_updated_at: DateTime<Utc>,
    /// Latest non-null error in the window; ties on `updated_at` go to the highest id.
    pub most_recent_error: Option<String>,
}

/// Start of a lookback window ending at `now`.
///
/// Spans too large to represent clamp to the earliest representable instant.
pub fn window_start(now: DateTime<Utc>, span: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(span)
        .ok()
        .and_then(|d| now.checked_sub_signed(d))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Queries the checks need from a live connection.
#[async_trait]
pub trait CronStatsSource: Send {
    /// One row per `expected` name, in the same order, with
    /// [`CronStatsRow::missing`] for names that never completed.
    async fn latest_completed(
        &mut self,
        expected: &[String],
    ) -> Result<Vec<CronStatsRow>, MonitorError>;

    /// Aggregates over runs created at or after `since`, ordered by name.
    async fn digest_since(
        &mut self,
        since: DateTime<Utc>,
    ) -> Result<Vec<CronStatsDigestRow>, MonitorError>;

    /// Release the underlying connection.
    async fn close(self: Box<Self>) -> Result<(), MonitorError>;
}

/// Opens a [`CronStatsSource`], resolving credentials as needed.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Box<dyn CronStatsSource>, MonitorError>;
}
