//! Shared AWS SDK configuration for the SNS and Secrets Manager clients.

use aws_config::{BehaviorVersion, Region, SdkConfig};
use tracing::info;

use cronwatch_core::config::AwsConfig;

/// Load SDK config for the configured region, honouring an endpoint override
/// (e.g. LocalStack) when one is set.
pub async fn load_sdk_config(aws: &AwsConfig) -> SdkConfig {
    let mut loader =
        aws_config::defaults(BehaviorVersion::latest()).region(Region::new(aws.region.clone()));

    if let Some(endpoint) = aws.endpoint_url.as_deref() {
        let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            endpoint.to_string()
        } else {
            format!("https://{endpoint}")
        };
        loader = loader.endpoint_url(url);
    }

    let sdk_config = loader.load().await;
    info!(
        region = %aws.region,
        endpoint = aws.endpoint_url.as_deref().unwrap_or("(default)"),
        "AWS config loaded"
    );
    sdk_config
}
