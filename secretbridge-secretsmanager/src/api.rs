//! Seam between the adaptor and the vendor SDK client

use std::fmt;

use async_trait::async_trait;
use aws_sdk_secretsmanager::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_secretsmanager::operation::batch_get_secret_value::{
    BatchGetSecretValueInput, BatchGetSecretValueOutput,
};
use aws_sdk_secretsmanager::operation::describe_secret::{
    DescribeSecretInput, DescribeSecretOutput,
};
use aws_sdk_secretsmanager::operation::get_secret_value::{
    GetSecretValueInput, GetSecretValueOutput,
};
use aws_sdk_secretsmanager::Client;
use secretbridge_core::BoxError;

/// A fault raised by the underlying client, with a human readable message
/// and the original error.
pub struct SdkFault {
    message: String,
    source: BoxError,
}

impl SdkFault {
    pub fn new(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: source.into(),
        }
    }

    /// Fault whose source is its own message
    pub fn msg(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            source: message.clone().into(),
            message,
        }
    }

    /// Service errors report `code: message`; transport and other failures
    /// report their whole error chain.
    pub fn from_sdk<E>(err: SdkError<E>) -> Self
    where
        E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    {
        let message = match (err.code(), err.message()) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (None, Some(message)) => message.to_string(),
            _ => DisplayErrorContext(&err).to_string(),
        };
        Self::new(message, err)
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn into_parts(self) -> (String, BoxError) {
        (self.message, self.source)
    }
}

impl fmt::Debug for SdkFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SdkFault")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Operations the adaptor needs from a Secrets Manager client.
///
/// Implemented for [`aws_sdk_secretsmanager::Client`]; tests plug in fakes
/// to simulate vendor responses and faults.
#[async_trait]
pub trait SecretsManagerApi: Send + Sync + 'static {
    async fn describe_secret(
        &self,
        input: DescribeSecretInput,
    ) -> Result<DescribeSecretOutput, SdkFault>;

    async fn get_secret_value(
        &self,
        input: GetSecretValueInput,
    ) -> Result<GetSecretValueOutput, SdkFault>;

    async fn batch_get_secret_value(
        &self,
        input: BatchGetSecretValueInput,
    ) -> Result<BatchGetSecretValueOutput, SdkFault>;

    /// Release client resources
    fn close(&self) -> Result<(), SdkFault> {
        Ok(())
    }
}

// The SDK client releases its connection pool once the last clone is
// dropped, so the default `close` is enough.
#[async_trait]
impl SecretsManagerApi for Client {
    async fn describe_secret(
        &self,
        input: DescribeSecretInput,
    ) -> Result<DescribeSecretOutput, SdkFault> {
        Client::describe_secret(self)
            .set_secret_id(input.secret_id)
            .send()
            .await
            .map_err(SdkFault::from_sdk)
    }

    async fn get_secret_value(
        &self,
        input: GetSecretValueInput,
    ) -> Result<GetSecretValueOutput, SdkFault> {
        Client::get_secret_value(self)
            .set_secret_id(input.secret_id)
            .set_version_id(input.version_id)
            .set_version_stage(input.version_stage)
            .send()
            .await
            .map_err(SdkFault::from_sdk)
    }

    async fn batch_get_secret_value(
        &self,
        input: BatchGetSecretValueInput,
    ) -> Result<BatchGetSecretValueOutput, SdkFault> {
        Client::batch_get_secret_value(self)
            .set_secret_id_list(input.secret_id_list)
            .set_filters(input.filters)
            .set_max_results(input.max_results)
            .set_next_token(input.next_token)
            .send()
            .await
            .map_err(SdkFault::from_sdk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_secretsmanager::operation::describe_secret::DescribeSecretError;

    #[test]
    fn test_fault_from_transport_error_keeps_chain() {
        let err = SdkError::<DescribeSecretError>::timeout_error("socket timed out");
        let fault = SdkFault::from_sdk(err);

        assert!(fault.message().contains("socket timed out"));
        let (_, source) = fault.into_parts();
        assert!(source.downcast_ref::<SdkError<DescribeSecretError>>().is_some());
    }

    #[test]
    fn test_msg_fault() {
        let fault = SdkFault::msg("Rate exceeded");
        assert_eq!(fault.message(), "Rate exceeded");

        let (message, source) = fault.into_parts();
        assert_eq!(message, source.to_string());
    }
}
