use thiserror::Error;

use crate::duration::DurationParseError;

/// Rejected settings. Raised before any check runs and aborts the process.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),

    #[error("Invalid duration: {0}")]
    Duration(#[from] DurationParseError),
}

/// A failed step of a monitoring pass, reported through a `cronSystem` alert.
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Secret retrieval failed: {0}")]
    CredentialRetrieval(String),

    #[error("Database connection failed: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Row scan failed: {0}")]
    Scan(String),
}

impl MonitorError {
    /// The `cronSystem` alert text published when this error ends a step.
    pub fn alert_text(&self) -> &'static str {
        match self {
            MonitorError::CredentialRetrieval(_) => {
                "Unable to retrieve SecretsManager secret.  Cron status is unknown."
            }
            MonitorError::Connection(_) => "Unable to connect to database. Cron status unknown.",
            MonitorError::Query(_) => "Unable to SELECT cron_stats table.  Unable to continue.",
            MonitorError::Scan(_) => {
                "Error scanning row in cron_stats table.  Unable to continue."
            }
        }
    }
}
