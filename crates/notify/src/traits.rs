//! Publisher trait definition and shared alert types.

use std::fmt;

/// Errors that can occur during alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("SNS publish failed: {0}")]
    Sns(String),
}

/// Routing class of an alert. Each category maps to its own set of topics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertCategory {
    /// Monitor infrastructure problems and stale crons.
    CronSystem,
    /// Errors raised by individual cron runs.
    CronJobFailure,
}

impl AlertCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCategory::CronSystem => "cronSystem",
            AlertCategory::CronJobFailure => "cronJobFailure",
        }
    }
}

impl fmt::Display for AlertCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A category-tagged alert body, before the environment prefix is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub category: AlertCategory,
    pub body: String,
}

impl Alert {
    pub fn system(body: impl Into<String>) -> Self {
        Self {
            category: AlertCategory::CronSystem,
            body: body.into(),
        }
    }

    pub fn job_failure(body: impl Into<String>) -> Self {
        Self {
            category: AlertCategory::CronJobFailure,
            body: body.into(),
        }
    }
}

/// Trait for delivery transports.
#[async_trait::async_trait]
pub trait Publisher: Send + Sync {
    /// Publish `message` to a single destination (e.g. an SNS topic ARN).
    ///
    /// Returns the transport's message id.
    async fn publish(&self, destination: &str, message: &str) -> Result<String, NotifyError>;

    /// Human-readable name for this transport (e.g., "sns").
    fn channel_name(&self) -> &str;
}

/// Result of publishing an alert to a single destination.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub destination: String,
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
    pub duration_ms: u64,
}
