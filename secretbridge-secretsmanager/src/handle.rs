//! Caller-owned handle around one live Secrets Manager client

use std::future::Future;
use std::sync::Arc;

use aws_sdk_secretsmanager::config::BehaviorVersion;
use aws_sdk_secretsmanager::operation::describe_secret::DescribeSecretInput;
use aws_sdk_secretsmanager::{Client, Config};
use parking_lot::RwLock;
use secretbridge_core::{Error, Operation, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::{SdkFault, SecretsManagerApi};
use crate::config::ConnectionConfig;
use crate::credentials::CredentialSource;
use crate::types::{
    BatchGetSecretValueRequest, BatchSecretValue, SecretDescription, SecretValue, VersionSelector,
};

/// Handle owning at most one live client.
///
/// A handle starts empty. [`ClientHandle::init`] stores a client and
/// [`ClientHandle::close`] releases it; dropping the handle releases it too.
/// Operations on an empty handle fail with [`Error::NotInitialized`].
///
/// Requests run as spawned tokio tasks sharing the client, so several
/// operations may be in flight on one handle with no ordering between them.
/// A request already in flight keeps its client alive until it completes,
/// even if the handle is closed meanwhile.
#[derive(Default)]
pub struct ClientHandle {
    client: RwLock<Option<Arc<dyn SecretsManagerApi>>>,
}

impl ClientHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the structural configuration and store a client built from it.
    /// On failure the handle is left untouched.
    pub fn init(&self, configuration: &Value) -> Result<()> {
        let config = ConnectionConfig::from_value(configuration).map_err(Error::init)?;
        self.init_with_config(&config)
    }

    pub fn init_with_config(&self, config: &ConnectionConfig) -> Result<()> {
        let credentials = CredentialSource::resolve(&config.auth);
        info!(
            region = %config.region,
            credentials = credentials.name(),
            endpoint_url = config.endpoint_url.as_deref(),
            "Initializing AWS secret manager client"
        );

        let mut builder = Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(config.region.to_sdk_region())
            .credentials_provider(credentials.into_provider());
        if let Some(endpoint_url) = &config.endpoint_url {
            builder = builder.endpoint_url(endpoint_url);
        }

        self.init_with_client(Client::from_conf(builder.build()));
        Ok(())
    }

    /// Store an already built client. A previously stored client is closed.
    pub fn init_with_client(&self, client: impl SecretsManagerApi) {
        let previous = self.client.write().replace(Arc::new(client));
        if let Some(previous) = previous {
            debug!("Replacing previously initialized client");
            release(&*previous);
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.client.read().is_some()
    }

    /// Retrieve the details of a secret, without its value
    pub async fn describe_secret(&self, secret_id: &str) -> Result<SecretDescription> {
        let operation = Operation::DescribeSecret;
        let client = self.client()?;
        let input = DescribeSecretInput::builder()
            .secret_id(secret_id)
            .build()
            .map_err(|e| Error::operation(operation, e.to_string(), e))?;

        debug!(%operation, secret_id, "Dispatching request");
        let output = dispatch(operation, async move { client.describe_secret(input).await }).await?;
        Ok(output.into())
    }

    /// Retrieve the value of a secret, optionally of a specific version
    pub async fn get_secret_value(
        &self,
        secret_id: &str,
        selector: &VersionSelector,
    ) -> Result<SecretValue> {
        let operation = Operation::GetSecretValue;
        let client = self.client()?;
        let input = selector
            .to_input(secret_id)
            .map_err(|e| Error::operation(operation, e.to_string(), e))?;

        debug!(%operation, secret_id, ?selector, "Dispatching request");
        let output =
            dispatch(operation, async move { client.get_secret_value(input).await }).await?;
        Ok(output.into())
    }

    /// Retrieve the values of several secrets at once
    pub async fn batch_get_secret_value(
        &self,
        request: BatchGetSecretValueRequest,
    ) -> Result<BatchSecretValue> {
        let operation = Operation::BatchGetSecretValue;
        let client = self.client()?;
        let input = request
            .into_input()
            .map_err(|e| Error::operation(operation, e.to_string(), e))?;

        debug!(
            %operation,
            secret_ids = input.secret_id_list.as_ref().map_or(0, Vec::len),
            filters = input.filters.as_ref().map_or(0, Vec::len),
            "Dispatching request"
        );
        let output = dispatch(operation, async move {
            client.batch_get_secret_value(input).await
        })
        .await?;
        Ok(output.into())
    }

    /// Release the stored client. The handle is empty afterwards even when
    /// closing the client fails.
    pub fn close(&self) -> Result<()> {
        let client = self.client.write().take().ok_or(Error::NotInitialized)?;
        client.close().map_err(|fault| {
            let (message, source) = fault.into_parts();
            Error::close(message, source)
        })?;
        info!("Closed AWS secret manager client");
        Ok(())
    }

    fn client(&self) -> Result<Arc<dyn SecretsManagerApi>> {
        self.client.read().clone().ok_or(Error::NotInitialized)
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        if let Some(client) = self.client.get_mut().take() {
            release(&*client);
        }
    }
}

fn release(client: &dyn SecretsManagerApi) {
    if let Err(fault) = client.close() {
        warn!(error = fault.message(), "Failed to close AWS secret manager client");
    }
}

/// Run a client call on the runtime's worker pool and wait for it without
/// blocking the caller's task.
async fn dispatch<T, F>(operation: Operation, request: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, SdkFault>> + Send + 'static,
    T: Send + 'static,
{
    match tokio::spawn(request).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(fault)) => {
            warn!(%operation, error = fault.message(), "Request failed");
            let (message, source) = fault.into_parts();
            Err(Error::operation(operation, message, source))
        }
        Err(join_error) => {
            warn!(%operation, error = %join_error, "Request task did not complete");
            Err(Error::operation(operation, join_error.to_string(), join_error))
        }
    }
}
