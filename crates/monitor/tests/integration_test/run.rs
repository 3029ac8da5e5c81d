//! Full monitoring passes: check ordering, isolation, and connection handling.

use std::sync::{Arc, Mutex};

use cronwatch_monitor::{CheckOutcome, Monitor};
use cronwatch_notify::{AlertCategory, AlertDispatcher, TopicMap};

use crate::support::*;

fn build(connect: Connect) -> (Monitor, Sent, Arc<Calls>) {
    let sent: Sent = Arc::new(Mutex::new(Vec::new()));
    let calls = Arc::new(Calls::default());
    let config = config(&["arn:system"], &[]);
    let dispatcher = AlertDispatcher::new(
        config.environment.clone(),
        TopicMap::from_config(&config),
        Box::new(RecordingPublisher {
            sent: sent.clone(),
            fail_on: None,
        }),
    );
    let connector = ScriptedConnector {
        connect,
        calls: calls.clone(),
    };
    (Monitor::new(config, Box::new(connector), dispatcher), sent, calls)
}

#[tokio::test]
async fn credential_failure_alerts_once_and_skips_checks() {
    let (monitor, sent, calls) = build(Connect::CredentialsDenied);

    let report = monitor.run_at(now()).await;

    assert!(!report.connected);
    assert_eq!(report.alerts.len(), 1);
    assert_eq!(Calls::get(&calls.latest), 0);
    assert_eq!(Calls::get(&calls.digest), 0);
    assert_eq!(Calls::get(&calls.closed), 0);
    assert_eq!(
        sent.lock().unwrap()[0].1,
        "Environment: staging\nMessage: \
         Unable to retrieve SecretsManager secret.  Cron status is unknown."
    );
}

#[tokio::test]
async fn cron_absent_from_table_is_reported_missing() {
    let (monitor, sent, calls) = build(Connect::Ok {
        latest: vec![completed("vulnerabilities", 10)],
        digest: Vec::new(),
    });

    let report = monitor.run_at(now()).await;

    assert_eq!(report.staleness, CheckOutcome::Alerted(1));
    assert_eq!(report.digest, CheckOutcome::Healthy);
    assert_eq!(
        sent.lock().unwrap()[0].1,
        "Environment: staging\nMessage: \
         Fleet cron 'cleanups_then_aggregation' hasn't updated in more than 2h. \
         Last status was 'missing cron' at 1970-01-01 00:00:00 UTC."
    );
    assert_eq!(Calls::get(&calls.closed), 1);
}

#[tokio::test]
async fn only_first_stale_cron_is_reported() {
    let (monitor, _sent, _calls) = build(Connect::Ok {
        latest: vec![
            completed("vulnerabilities", 500),
            completed("cleanups_then_aggregation", 900),
        ],
        digest: Vec::new(),
    });

    let report = monitor.run_at(now()).await;

    assert_eq!(report.alerts.len(), 1);
    assert!(report.alerts[0].alert.body.contains("'vulnerabilities'"));
}

#[tokio::test]
async fn digest_window_starts_one_interval_back() {
    let (monitor, _sent, calls) = build(Connect::Ok {
        latest: vec![
            completed("vulnerabilities", 5),
            completed("cleanups_then_aggregation", 5),
        ],
        digest: vec![digest("vulnerabilities", 3, 0, None)],
    });

    let report = monitor.run_at(now()).await;

    assert_eq!(report.staleness, CheckOutcome::Healthy);
    assert_eq!(report.digest, CheckOutcome::Healthy);
    assert!(report.alerts.is_empty());
    assert_eq!(
        *calls.last_since.lock().unwrap(),
        Some(now() - chrono::Duration::hours(1))
    );
}

#[tokio::test]
async fn staleness_and_digest_both_alert() {
    let (monitor, _sent, calls) = build(Connect::Ok {
        latest: vec![
            completed("vulnerabilities", 300),
            completed("cleanups_then_aggregation", 5),
        ],
        digest: vec![
            digest("vulnerabilities", 1, 1, Some("scan timed out")),
            digest("cleanups_then_aggregation", 6, 0, None),
            digest("usage_statistics", 4, 3, Some("deadlock")),
        ],
    });

    let report = monitor.run_at(now()).await;

    assert_eq!(report.staleness, CheckOutcome::Alerted(1));
    assert_eq!(report.digest, CheckOutcome::Alerted(2));
    let categories: Vec<_> = report.alerts.iter().map(|d| d.alert.category).collect();
    assert_eq!(
        categories,
        vec![
            AlertCategory::CronSystem,
            AlertCategory::CronJobFailure,
            AlertCategory::CronJobFailure,
        ]
    );
    assert!(report.alerts[1].alert.body.ends_with("during its last run:\nscan timed out"));
    assert!(report.alerts[2].alert.body.contains("raised errors in 3 of the previous 4 runs"));
    assert_eq!(Calls::get(&calls.closed), 1);
}
