//! One monitoring pass: connect, check staleness, check the error digest,
//! disconnect.
//!
//! Failures after configuration never escape [`Monitor::run`]; they become
//! `cronSystem` alerts so the trigger itself always succeeds.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use cronwatch_core::{MonitorConfig, MonitorError};
use cronwatch_notify::{Alert, AlertDispatcher, DispatchResult, SnsPublisher, TopicMap};

use crate::aws::load_sdk_config;
use crate::digest::digest_alerts;
use crate::mysql::MySqlConnector;
use crate::secrets::{SecretCache, SecretsManagerProvider};
use crate::staleness::check_staleness;
use crate::store::{window_start, CronStatsSource, StoreConnector};

/// How a single check ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckOutcome {
    /// Not run because no connection was available.
    Skipped,
    /// Ran and found nothing to report.
    Healthy,
    /// Ran and raised this many alerts.
    Alerted(usize),
    /// Ended early on a store error (already alerted).
    Failed(String),
}

/// An alert and the outcome at each destination it was routed to.
#[derive(Debug, Clone)]
pub struct AlertDelivery {
    pub alert: Alert,
    /// One entry per destination; empty when the category has no topics.
    pub results: Vec<DispatchResult>,
}

impl AlertDelivery {
    /// At least one destination accepted the alert.
    pub fn delivered(&self) -> bool {
        self.results.iter().any(|r| r.success)
    }

    /// Publish errors, one per failed destination.
    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.results.iter().filter_map(|r| r.error.as_deref())
    }
}

/// Summary of one invocation, for logs and tests.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub connected: bool,
    pub staleness: CheckOutcome,
    pub digest: CheckOutcome,
    /// Every alert handed to the dispatcher, in order.
    pub alerts: Vec<AlertDelivery>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            connected: false,
            staleness: CheckOutcome::Skipped,
            digest: CheckOutcome::Skipped,
            alerts: Vec::new(),
        }
    }

    /// Alerts that reached at least one destination.
    pub fn delivered_count(&self) -> usize {
        self.alerts.iter().filter(|d| d.delivered()).count()
    }

    /// Alerts that reached no destination at all.
    pub fn undelivered(&self) -> impl Iterator<Item = &AlertDelivery> {
        self.alerts.iter().filter(|d| !d.delivered())
    }
}

pub struct Monitor {
    config: Arc<MonitorConfig>,
    connector: Box<dyn StoreConnector>,
    dispatcher: AlertDispatcher,
}

impl Monitor {
    pub fn new(
        config: Arc<MonitorConfig>,
        connector: Box<dyn StoreConnector>,
        dispatcher: AlertDispatcher,
    ) -> Self {
        Self {
            config,
            connector,
            dispatcher,
        }
    }

    /// Wire up SNS, Secrets Manager, and MySQL from configuration.
    pub async fn from_config(config: Arc<MonitorConfig>) -> Self {
        let sdk_config = load_sdk_config(&config.aws).await;

        let secrets = SecretsManagerProvider::from_sdk_config(&sdk_config);
        let credentials = Arc::new(SecretCache::new(secrets));
        let connector = MySqlConnector::new(config.mysql.clone(), credentials);
        let dispatcher = AlertDispatcher::new(
            config.environment.clone(),
            TopicMap::from_config(&config),
            Box::new(SnsPublisher::from_sdk_config(&sdk_config)),
        );

        Self::new(config, Box::new(connector), dispatcher)
    }

    pub async fn run(&self) -> RunReport {
        self.run_at(Utc::now()).await
    }

    /// Run both checks as of `now`.
    pub async fn run_at(&self, now: DateTime<Utc>) -> RunReport {
        let mut report = RunReport::new();

        let mut source = match self.connector.connect().await {
            Ok(source) => source,
            Err(e) => {
                error!(error = %e, "Unable to open cron_stats source");
                self.alert(&mut report, Alert::system(e.alert_text())).await;
                return report;
            }
        };
        report.connected = true;

        report.staleness = self.check_staleness(source.as_mut(), now, &mut report.alerts).await;
        report.digest = self.check_digest(source.as_mut(), now, &mut report.alerts).await;

        if let Err(e) = source.close().await {
            warn!(error = %e, "Failed to close database connection");
        }

        info!(
            staleness = ?report.staleness,
            digest = ?report.digest,
            alerts = report.alerts.len(),
            delivered = report.delivered_count(),
            "Cron monitor run finished"
        );
        report
    }

    async fn check_staleness(
        &self,
        source: &mut dyn CronStatsSource,
        now: DateTime<Utc>,
        sent: &mut Vec<AlertDelivery>,
    ) -> CheckOutcome {
        let rows = match source.latest_completed(&self.config.expected_jobs).await {
            Ok(rows) => rows,
            Err(e) => return self.fail_check("staleness", e, sent).await,
        };

        let tolerance = self.config.delay_tolerance;
        match check_staleness(&rows, tolerance, &self.config.delay_tolerance_text, now) {
            Some(alert) => {
                self.publish(alert, sent).await;
                CheckOutcome::Alerted(1)
            }
            None => CheckOutcome::Healthy,
        }
    }

    async fn check_digest(
        &self,
        source: &mut dyn CronStatsSource,
        now: DateTime<Utc>,
        sent: &mut Vec<AlertDelivery>,
    ) -> CheckOutcome {
        let since = window_start(now, self.config.monitor_interval);
        let rows = match source.digest_since(since).await {
            Ok(rows) => rows,
            Err(e) => return self.fail_check("digest", e, sent).await,
        };

        let alerts = digest_alerts(&rows);
        if alerts.is_empty() {
            return CheckOutcome::Healthy;
        }

        let count = alerts.len();
        for alert in alerts {
            self.publish(alert, sent).await;
        }
        CheckOutcome::Alerted(count)
    }

    async fn fail_check(
        &self,
        check: &str,
        e: MonitorError,
        sent: &mut Vec<AlertDelivery>,
    ) -> CheckOutcome {
        error!(check, error = %e, "Cron check failed");
        self.publish(Alert::system(e.alert_text()), sent).await;
        CheckOutcome::Failed(e.to_string())
    }

    async fn alert(&self, report: &mut RunReport, alert: Alert) {
        self.publish(alert, &mut report.alerts).await;
    }

    async fn publish(&self, alert: Alert, sent: &mut Vec<AlertDelivery>) {
        let results = self.dispatcher.send(&alert).await;
        let delivery = AlertDelivery { alert, results };
        if !delivery.delivered() {
            error!(
                category = %delivery.alert.category,
                destinations = delivery.results.len(),
                "Alert was not delivered to any topic"
            );
        }
        sent.push(delivery);
    }
}
