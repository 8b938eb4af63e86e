//! AWS Secrets Manager adaptor for secretbridge
//!
//! Lets a host runtime drive Secrets Manager through the AWS SDK:
//! - Structural configuration → region and credential provider selection
//! - DescribeSecret, GetSecretValue, BatchGetSecretValue
//! - SDK responses → serde-serializable records, SDK faults → [`Error`]
//!
//! ```rust,no_run
//! use secretbridge_secretsmanager::{ClientHandle, VersionSelector};
//! use serde_json::json;
//!
//! # async fn run() -> secretbridge_secretsmanager::Result<()> {
//! let handle = ClientHandle::new();
//! handle.init(&json!({ "region": "eu-west-1", "auth": "ECS_CONTAINER_ROLE" }))?;
//!
//! let value = handle
//!     .get_secret_value("prod/db", &VersionSelector::stage("AWSCURRENT"))
//!     .await?;
//! println!("{:?}", value.secret_string);
//!
//! handle.close()?;
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod credentials;
pub mod handle;
pub mod types;

pub use api::{SdkFault, SecretsManagerApi};
pub use config::{AuthConfig, AwsRegion, ConfigError, ConnectionConfig, GlobalRegion};
pub use credentials::CredentialSource;
pub use handle::ClientHandle;
pub use secretbridge_core::{Error, Operation, Result};
pub use types::{
    BatchGetSecretValueRequest, BatchSecretValue, ReplicationStatus, RotationRules,
    SecretDescription, SecretFilter, SecretValue, SecretValueError, Tag, VersionSelector,
};
