//! Routes alerts to the topics configured for their category.
//!
//! Every alert body is prefixed with the deployment environment and
//! published to each destination of its category. Individual destination
//! failures don't block the remaining destinations.

use std::collections::HashMap;

use cronwatch_core::MonitorConfig;

use crate::traits::{Alert, AlertCategory, DispatchResult, Publisher};

/// Category → ordered destination list.
#[derive(Debug, Clone)]
pub struct TopicMap {
    topics: HashMap<AlertCategory, Vec<String>>,
}

impl TopicMap {
    /// Build the routing table. Job-failure alerts go to the system topics
    /// when no dedicated topics are configured.
    pub fn new(system: Vec<String>, job_failure: Vec<String>) -> Self {
        let job_failure = if job_failure.is_empty() {
            system.clone()
        } else {
            job_failure
        };

        let mut topics = HashMap::new();
        topics.insert(AlertCategory::CronSystem, system);
        topics.insert(AlertCategory::CronJobFailure, job_failure);
        Self { topics }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(
            config.system_topic_arns.clone(),
            config.job_failure_topic_arns.clone(),
        )
    }

    pub fn destinations(&self, category: AlertCategory) -> &[String] {
        self.topics.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Publishes alerts through a [`Publisher`] according to a [`TopicMap`].
pub struct AlertDispatcher {
    environment: String,
    topics: TopicMap,
    publisher: Box<dyn Publisher>,
}

impl AlertDispatcher {
    pub fn new(
        environment: impl Into<String>,
        topics: TopicMap,
        publisher: Box<dyn Publisher>,
    ) -> Self {
        Self {
            environment: environment.into(),
            topics,
            publisher,
        }
    }

    /// The exact text sent to every destination.
    pub fn compose(&self, body: &str) -> String {
        format!("Environment: {}\nMessage: {}", self.environment, body)
    }

    pub async fn send(&self, alert: &Alert) -> Vec<DispatchResult> {
        self.dispatch(alert.category, &alert.body).await
    }

    /// Publish `body` to every destination of `category`.
    ///
    /// Returns one result per destination. An unrouted category is logged
    /// and yields no results.
    pub async fn dispatch(&self, category: AlertCategory, body: &str) -> Vec<DispatchResult> {
        let destinations = self.topics.destinations(category);
        if destinations.is_empty() {
            tracing::warn!(%category, "No topics configured for alert category, dropping alert");
            return Vec::new();
        }

        let message = self.compose(body);
        let mut results = Vec::with_capacity(destinations.len());

        for destination in destinations {
            tracing::info!(
                %category,
                destination = %destination,
                message = %message,
                "Sending alert"
            );
            let start = std::time::Instant::now();
            let result = self.publisher.publish(destination, &message).await;
            let duration_ms = start.elapsed().as_millis() as u64;

            let (success, message_id, error) = match result {
                Ok(id) => {
                    tracing::info!(
                        %category,
                        channel = self.publisher.channel_name(),
                        destination = %destination,
                        message_id = %id,
                        duration_ms,
                        "Alert delivered"
                    );
                    (true, Some(id), None)
                }
                Err(e) => {
                    tracing::warn!(
                        %category,
                        channel = self.publisher.channel_name(),
                        destination = %destination,
                        error = %e,
                        duration_ms,
                        "Alert delivery failed"
                    );
                    (false, None, Some(e.to_string()))
                }
            };

            results.push(DispatchResult {
                destination: destination.clone(),
                success,
                message_id,
                error,
                duration_ms,
            });
        }

        results
    }
}
