//! The cron_stats queries against a real MySQL server.

use chrono::{DateTime, TimeZone, Utc};
use sqlx::{Connection, MySqlConnection};

use cronwatch_monitor::store::window_start;
use cronwatch_monitor::{CronStatsSource, MySqlCronStats};

const CREATE_CRON_STATS: &str = "\
CREATE TABLE cron_stats ( \
    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY, \
    name VARCHAR(255) NOT NULL, \
    status VARCHAR(255) NOT NULL, \
    errors JSON NULL, \
    created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP, \
    updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP \
)";

struct Seed {
    id: u64,
    name: &'static str,
    status: &'static str,
    errors: Option<&'static str>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn at(hour: u32, min: u32, sec: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 1, hour, min, sec).unwrap()
}

fn seed(
    id: u64,
    name: &'static str,
    status: &'static str,
    errors: Option<&'static str>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Seed {
    Seed {
        id,
        name,
        status,
        errors,
        created_at,
        updated_at,
    }
}

fn rows() -> Vec<Seed> {
    let never = Some(r#"{"err": "never"}"#);
    let too_old = Some(r#"{"err": "too-old"}"#);
    let first = Some(r#"{"err": "first"}"#);
    let second = Some(r#"{"err": "second"}"#);

    vec![
        // Highest id among completed rows wins, even with an older updated_at.
        seed(1, "vulnerabilities", "completed", None, at(8, 0, 0), at(10, 0, 0)),
        seed(2, "vulnerabilities", "completed", None, at(8, 30, 0), at(9, 0, 0)),
        seed(3, "vulnerabilities", "pending", None, at(8, 40, 0), at(11, 50, 0)),
        // Never completed.
        seed(4, "usage_statistics", "failed", never, at(8, 0, 0), at(8, 10, 0)),
        // Digest window starts at 11:00:00.
        seed(5, "digest_job", "completed", too_old, at(10, 59, 59), at(11, 0, 30)),
        seed(6, "digest_job", "completed", None, at(11, 0, 0), at(11, 5, 0)),
        seed(7, "digest_job", "completed", first, at(11, 10, 0), at(11, 30, 0)),
        seed(8, "digest_job", "completed", second, at(11, 20, 0), at(11, 30, 0)),
        seed(9, "digest_job", "completed", None, at(11, 40, 0), at(11, 45, 0)),
    ]
}

async fn reset_cron_stats(conn: &mut MySqlConnection) {
    sqlx::query("DROP TABLE IF EXISTS cron_stats")
        .execute(&mut *conn)
        .await
        .expect("Failed to drop cron_stats");
    sqlx::query(CREATE_CRON_STATS)
        .execute(&mut *conn)
        .await
        .expect("Failed to create cron_stats");

    for row in rows() {
        sqlx::query(
            "INSERT INTO cron_stats (id, name, status, errors, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(row.id)
        .bind(row.name)
        .bind(row.status)
        .bind(row.errors)
        .bind(row.created_at)
        .bind(row.updated_at)
        .execute(&mut *conn)
        .await
        .expect("Failed to seed cron_stats");
    }
}

/// Requires a reachable MySQL server and a throwaway database: the test drops
/// and recreates `cron_stats` in it.
///
/// Run with: `cargo test test_real_cron_stats_queries -- --ignored`
///
/// Set environment variables before running:
/// - `CRON_MONITOR_TEST_MYSQL_URL=mysql://<user>:<password>@<host>:3306/<database>`
#[test]
#[ignore]
fn test_real_cron_stats_queries() {
    let rt = tokio::runtime::Runtime::new().unwrap();

    rt.block_on(async {
        let url = std::env::var("CRON_MONITOR_TEST_MYSQL_URL")
            .expect("CRON_MONITOR_TEST_MYSQL_URL must point at a throwaway database");
        let mut conn = MySqlConnection::connect(&url)
            .await
            .expect("Failed to connect to MySQL");
        reset_cron_stats(&mut conn).await;

        let mut source = MySqlCronStats::new(conn);

        // Latest completed run per expected name, in configured order.
        let order = ["cleanups_then_aggregation", "vulnerabilities", "usage_statistics"];
        let expected: Vec<String> = order.iter().map(|s| s.to_string()).collect();
        let latest = source
            .latest_completed(&expected)
            .await
            .expect("Latest-completed query failed");

        let names: Vec<&str> = latest.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, order);
        assert!(latest[0].is_missing());
        assert_eq!(latest[0].updated_at.timestamp(), 0);
        assert_eq!(latest[1].status, "completed");
        assert_eq!(latest[1].updated_at, at(9, 0, 0));
        assert!(latest[2].is_missing());

        // Error digest over the hour before noon.
        let since = window_start(at(12, 0, 0), std::time::Duration::from_secs(3600));
        let digest = source.digest_since(since).await.expect("Digest query failed");

        assert_eq!(digest.len(), 1);
        let group = &digest[0];
        assert_eq!(group.name, "digest_job");
        // Created exactly at the window start counts; a second earlier does not.
        assert_eq!(group.occurrence_count, 4);
        // NULL errors are not counted.
        assert_eq!(group.error_count, 2);
        assert_eq!(group.last_updated_at, at(11, 45, 0));
        // Equal updated_at: the higher id supplies the text, NULL rows never do.
        let error = group.most_recent_error.as_deref().expect("Missing most recent error");
        assert!(error.contains("second"), "unexpected error text: {error}");

        Box::new(source).close().await.expect("Failed to close connection");
    });
}
