//! cron-monitor: checks Fleet's `cron_stats` table and publishes SNS alerts.
//!
//! Runs as an AWS Lambda handler when `AWS_LAMBDA_RUNTIME_API` is set,
//! otherwise performs a single local run and exits.

use std::sync::Arc;

use lambda_runtime::{service_fn, LambdaEvent};
use tracing::{error, info};

use cronwatch_core::config::load_dotenv;
use cronwatch_core::MonitorConfig;
use cronwatch_monitor::{Monitor, RunReport};

/// Log the outcome of a run, naming every alert that reached no topic.
fn log_report(report: &RunReport) {
    for delivery in report.undelivered() {
        let errors: Vec<&str> = delivery.errors().collect();
        error!(
            category = %delivery.alert.category,
            destinations = delivery.results.len(),
            errors = ?errors,
            body = %delivery.alert.body,
            "Alert undelivered"
        );
    }
    info!(
        connected = report.connected,
        alerts = report.alerts.len(),
        delivered = report.delivered_count(),
        "Run complete"
    );
}

// ── main ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_file(true)
        .with_line_number(true)
        .init();

    let config = Arc::new(MonitorConfig::from_args()?);
    config.log_summary();

    let monitor = Arc::new(Monitor::from_config(config.clone()).await);

    if config.is_lambda() {
        info!("Starting Lambda handler");
        lambda_runtime::run(service_fn(move |event: LambdaEvent<serde_json::Value>| {
            let monitor = monitor.clone();
            async move {
                info!(request_id = %event.context.request_id, "Invocation received");
                let report = monitor.run().await;
                log_report(&report);
                // Check failures were already alerted; the invocation itself succeeds.
                Ok::<(), lambda_runtime::Error>(())
            }
        }))
        .await
        .map_err(|e| anyhow::anyhow!("lambda runtime exited: {e}"))?;
    } else {
        info!("Lambda execution environment not found, falling back to local execution");
        let report = monitor.run().await;
        log_report(&report);
        info!("cron-monitor exited cleanly");
    }

    Ok(())
}
