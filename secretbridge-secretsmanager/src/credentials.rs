//! Credential provider selection

use aws_config::ecs::EcsCredentialsProvider;
use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_credential_types::provider::SharedCredentialsProvider;
use aws_credential_types::Credentials;

use crate::config::AuthConfig;

const STATIC_PROVIDER_NAME: &str = "SecretBridgeStaticCredentials";

/// Credential acquisition strategy chosen for an [`AuthConfig`].
///
/// Static keys never refresh. Role based sources delegate polling and
/// refresh timing to the SDK providers.
#[derive(Debug, Clone)]
pub enum CredentialSource {
    /// Long-lived access key pair
    Basic(Credentials),
    /// Access key pair plus a fixed session token
    Session(Credentials),
    /// ECS container credentials endpoint
    Container,
    /// EC2 instance metadata service
    InstanceProfile,
}

impl CredentialSource {
    pub fn resolve(auth: &AuthConfig) -> Self {
        match auth {
            AuthConfig::StaticKeys {
                access_key_id,
                secret_access_key,
            } => Self::Basic(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                STATIC_PROVIDER_NAME,
            )),
            AuthConfig::StaticKeysWithSession {
                access_key_id,
                secret_access_key,
                session_token,
            } => Self::Session(Credentials::new(
                access_key_id,
                secret_access_key,
                Some(session_token.clone()),
                None,
                STATIC_PROVIDER_NAME,
            )),
            AuthConfig::ContainerRole => Self::Container,
            AuthConfig::InstanceProfileRole => Self::InstanceProfile,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Basic(_) => "static",
            Self::Session(_) => "static-session",
            Self::Container => "ecs-container-role",
            Self::InstanceProfile => "ec2-instance-profile",
        }
    }

    pub fn into_provider(self) -> SharedCredentialsProvider {
        match self {
            Self::Basic(credentials) | Self::Session(credentials) => {
                SharedCredentialsProvider::new(credentials)
            }
            Self::Container => SharedCredentialsProvider::new(EcsCredentialsProvider::builder().build()),
            Self::InstanceProfile => {
                SharedCredentialsProvider::new(ImdsCredentialsProvider::builder().build())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_credential_types::provider::ProvideCredentials;

    #[test]
    fn test_basic_credentials() {
        let source = CredentialSource::resolve(&AuthConfig::StaticKeys {
            access_key_id: "AKID".to_string(),
            secret_access_key: "SECRET".to_string(),
        });

        let CredentialSource::Basic(credentials) = source else {
            panic!("expected basic credentials, got {source:?}");
        };
        assert_eq!(credentials.access_key_id(), "AKID");
        assert_eq!(credentials.secret_access_key(), "SECRET");
        assert_eq!(credentials.session_token(), None);
        assert_eq!(credentials.expiry(), None);
    }

    #[test]
    fn test_session_credentials() {
        let source = CredentialSource::resolve(&AuthConfig::StaticKeysWithSession {
            access_key_id: "AKID".to_string(),
            secret_access_key: "SECRET".to_string(),
            session_token: "TOKEN".to_string(),
        });

        let CredentialSource::Session(credentials) = source else {
            panic!("expected session credentials, got {source:?}");
        };
        assert_eq!(credentials.access_key_id(), "AKID");
        assert_eq!(credentials.secret_access_key(), "SECRET");
        assert_eq!(credentials.session_token(), Some("TOKEN"));
    }

    #[test]
    fn test_role_sources() {
        assert!(matches!(
            CredentialSource::resolve(&AuthConfig::ContainerRole),
            CredentialSource::Container
        ));
        assert!(matches!(
            CredentialSource::resolve(&AuthConfig::InstanceProfileRole),
            CredentialSource::InstanceProfile
        ));
    }

    #[tokio::test]
    async fn test_static_provider_yields_configured_keys() {
        let provider = CredentialSource::resolve(&AuthConfig::StaticKeysWithSession {
            access_key_id: "AKID".to_string(),
            secret_access_key: "SECRET".to_string(),
            session_token: "TOKEN".to_string(),
        })
        .into_provider();

        let credentials = provider.provide_credentials().await.unwrap();
        assert_eq!(credentials.access_key_id(), "AKID");
        assert_eq!(credentials.session_token(), Some("TOKEN"));
    }
}
