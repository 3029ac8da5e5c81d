//! AWS SNS publisher.

use aws_config::SdkConfig;
use tracing::info;

use crate::traits::{NotifyError, Publisher};

/// Publishes alerts to SNS topics; the destination is a topic ARN.
pub struct SnsPublisher {
    client: aws_sdk_sns::Client,
}

impl SnsPublisher {
    pub fn new(client: aws_sdk_sns::Client) -> Self {
        Self { client }
    }

    /// Create a publisher sharing the region/endpoint of an already-loaded SDK config.
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        info!(
            region = ?sdk_config.region(),
            "SNS publisher initialised"
        );
        Self::new(aws_sdk_sns::Client::new(sdk_config))
    }
}

#[async_trait::async_trait]
impl Publisher for SnsPublisher {
    async fn publish(&self, destination: &str, message: &str) -> Result<String, NotifyError> {
        let resp = self
            .client
            .publish()
            .topic_arn(destination)
            .message(message)
            .send()
            .await
            .map_err(|e| NotifyError::Sns(format!("{e:?}")))?;

        Ok(resp.message_id().unwrap_or("unknown").to_string())
    }

    fn channel_name(&self) -> &str {
        "sns"
    }
}
