//! MySQL-backed [`CronStatsSource`].
//!
//! Holds a single connection for the duration of one invocation. All
//! caller-supplied values (cron names, window start) are bound as
//! parameters.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection};
use sqlx::Connection;
use tracing::{debug, info, warn};

use cronwatch_core::config::MySqlConfig;
use cronwatch_core::MonitorError;

use crate::secrets::CredentialProvider;
use crate::store::{CronStatsDigestRow, CronStatsRow, CronStatsSource, StoreConnector};

/// `created_at` bound in the same sortable form the cron writer uses.
const WINDOW_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

const LATEST_COMPLETED_SQL: &str = "\
SELECT b.name AS name, a.status AS status, a.updated_at AS updated_at \
FROM ({expected}) b \
LEFT JOIN ( \
    SELECT name, status, updated_at FROM cron_stats \
    WHERE id IN (SELECT MAX(id) FROM cron_stats WHERE status = 'completed' GROUP BY name) \
) a ON a.name = b.name \
ORDER BY b.ord";

const DIGEST_SQL: &str = "\
SELECT \
    s.name AS name, \
    COUNT(*) AS occurrence_count, \
    COUNT(s.errors) AS error_count, \
    MAX(s.updated_at) AS last_updated_at, \
    ( \
        SELECT CAST(e.errors AS CHAR) FROM cron_stats e \
        WHERE e.name = s.name AND e.created_at >= ? AND e.errors IS NOT NULL \
        ORDER BY e.updated_at DESC, e.id DESC \
        LIMIT 1 \
    ) AS most_recent_error \
FROM cron_stats s \
WHERE s.created_at >= ? \
GROUP BY s.name \
ORDER BY s.name";

/// Derived table of expected names, one placeholder per name, carrying the
/// list position so the join result keeps the configured order.
fn expected_names_sql(count: usize) -> String {
    (0..count)
        .map(|ord| format!("SELECT {ord} AS ord, CAST(? AS CHAR) AS name"))
        .collect::<Vec<_>>()
        .join(" UNION ALL ")
}

fn latest_completed_sql(count: usize) -> String {
    LATEST_COMPLETED_SQL.replace("{expected}", &expected_names_sql(count))
}

pub fn format_window_timestamp(since: DateTime<Utc>) -> String {
    since.format(WINDOW_TIMESTAMP_FORMAT).to_string()
}

/// Split sqlx failures into "the query failed" and "a row could not be read".
fn classify(err: sqlx::Error) -> MonitorError {
    match err {
        sqlx::Error::ColumnDecode { .. }
        | sqlx::Error::ColumnNotFound(_)
        | sqlx::Error::ColumnIndexOutOfBounds { .. }
        | sqlx::Error::Decode(_)
        | sqlx::Error::TypeNotFound { .. } => MonitorError::Scan(err.to_string()),
        other => MonitorError::Query(other.to_string()),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LatestCompletedRecord {
    name: String,
    status: Option<String>,
    updated_at: Option<DateTime<Utc>>,
}

impl From<LatestCompletedRecord> for CronStatsRow {
    fn from(rec: LatestCompletedRecord) -> Self {
        match (rec.status, rec.updated_at) {
            (Some(status), Some(updated_at)) => CronStatsRow {
                name: rec.name,
                status,
                updated_at,
            },
            _ => CronStatsRow::missing(rec.name),
        }
    }
}

// ── Source ───────────────────────────────────────────────────────────

pub struct MySqlCronStats {
    conn: MySqlConnection,
}

impl MySqlCronStats {
    pub fn new(conn: MySqlConnection) -> Self {
        Self { conn }
    }
}

#[async_trait]
impl CronStatsSource for MySqlCronStats {
    async fn latest_completed(
        &mut self,
        expected: &[String],
    ) -> Result<Vec<CronStatsRow>, MonitorError> {
        if expected.is_empty() {
            return Ok(Vec::new());
        }

        let sql = latest_completed_sql(expected.len());
        let mut query = sqlx::query_as::<_, LatestCompletedRecord>(&sql);
        for name in expected {
            query = query.bind(name);
        }

        let records = query.fetch_all(&mut self.conn).await.map_err(classify)?;
        debug!(rows = records.len(), "Fetched latest completed cron runs");

        Ok(records.into_iter().map(CronStatsRow::from).collect())
    }

    async fn digest_since(
        &mut self,
        since: DateTime<Utc>,
    ) -> Result<Vec<CronStatsDigestRow>, MonitorError> {
        let bound = format_window_timestamp(since);

        let rows = sqlx::query_as::<_, CronStatsDigestRow>(DIGEST_SQL)
            .bind(&bound)
            .bind(&bound)
            .fetch_all(&mut self.conn)
            .await
            .map_err(classify)?;
        debug!(since = %bound, groups = rows.len(), "Fetched cron digest");

        Ok(rows)
    }

    async fn close(self: Box<Self>) -> Result<(), MonitorError> {
        self.conn
            .close()
            .await
            .map_err(|e| MonitorError::Connection(e.to_string()))
    }
}

// ── Connector ────────────────────────────────────────────────────────

/// Resolves the MySQL password, connects, and pings.
pub struct MySqlConnector {
    config: MySqlConfig,
    credentials: Arc<dyn CredentialProvider>,
}

impl MySqlConnector {
    pub fn new(config: MySqlConfig, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { config, credentials }
    }

    fn connect_options(&self, password: &str) -> MySqlConnectOptions {
        MySqlConnectOptions::new()
            .host(&self.config.host)
            .port(self.config.port)
            .username(&self.config.user)
            .password(password)
            .database(&self.config.database)
    }
}

#[async_trait]
impl StoreConnector for MySqlConnector {
    async fn connect(&self) -> Result<Box<dyn CronStatsSource>, MonitorError> {
        let password = self.credentials.secret_string(&self.config.secret_id).await?;

        let connected = async {
            let options = self.connect_options(&password);
            let mut conn = MySqlConnection::connect_with(&options).await?;
            conn.ping().await?;
            Ok::<_, sqlx::Error>(conn)
        }
        .await;

        match connected {
            Ok(conn) => {
                info!(
                    host = %self.config.host,
                    database = %self.config.database,
                    "Connected to database"
                );
                Ok(Box::new(MySqlCronStats::new(conn)))
            }
            Err(e) => {
                // The password may have been rotated; fetch it again next time.
                warn!(host = %self.config.host, error = %e, "Database connection failed");
                self.credentials.invalidate(&self.config.secret_id);
                Err(MonitorError::Connection(e.to_string()))
            }
        }
    }
}
