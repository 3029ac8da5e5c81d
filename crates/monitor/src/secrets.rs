//! Credential lookup for the database password.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use aws_config::SdkConfig;
use tracing::debug;

use cronwatch_core::MonitorError;

/// Resolves secret identifiers to their string value.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn secret_string(&self, secret_id: &str) -> Result<String, MonitorError>;

    /// Drop any cached value for `secret_id`. No-op for uncached providers.
    fn invalidate(&self, _secret_id: &str) {}
}

/// AWS Secrets Manager lookup, one API call per request.
pub struct SecretsManagerProvider {
    client: aws_sdk_secretsmanager::Client,
}

impl SecretsManagerProvider {
    pub fn from_sdk_config(sdk_config: &SdkConfig) -> Self {
        Self {
            client: aws_sdk_secretsmanager::Client::new(sdk_config),
        }
    }
}

#[async_trait]
impl CredentialProvider for SecretsManagerProvider {
    async fn secret_string(&self, secret_id: &str) -> Result<String, MonitorError> {
        let resp = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| {
                MonitorError::CredentialRetrieval(format!("GetSecretValue failed: {e:?}"))
            })?;

        resp.secret_string().map(String::from).ok_or_else(|| {
            MonitorError::CredentialRetrieval(format!("secret '{secret_id}' has no string value"))
        })
    }
}

/// Process-wide cache in front of another provider, so warm Lambda
/// invocations skip the lookup.
pub struct SecretCache<P> {
    inner: P,
    values: Mutex<HashMap<String, String>>,
}

impl<P: CredentialProvider> SecretCache<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            values: Mutex::new(HashMap::new()),
        }
    }

    fn cached(&self, secret_id: &str) -> Option<String> {
        self.values
            .lock()
            .ok()
            .and_then(|values| values.get(secret_id).cloned())
    }
}

#[async_trait]
impl<P: CredentialProvider> CredentialProvider for SecretCache<P> {
    async fn secret_string(&self, secret_id: &str) -> Result<String, MonitorError> {
        if let Some(value) = self.cached(secret_id) {
            debug!(secret_id, "Secret served from cache");
            return Ok(value);
        }

        let value = self.inner.secret_string(secret_id).await?;
        if let Ok(mut values) = self.values.lock() {
            values.insert(secret_id.to_string(), value.clone());
        }
        Ok(value)
    }

    fn invalidate(&self, secret_id: &str) {
        if let Ok(mut values) = self.values.lock() {
            values.remove(secret_id);
        }
        self.inner.invalidate(secret_id);
    }
}
