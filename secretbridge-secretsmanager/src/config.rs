//! Client connection configuration
//!
//! Decodes the structural configuration map handed over by the host into a
//! [`ConnectionConfig`]. The expected shape is:
//!
//! ```json
//! {
//!   "region": "us-east-1",
//!   "auth": { "accessKeyId": "...", "secretAccessKey": "...", "sessionToken": "..." },
//!   "endpointUrl": "http://localhost:4584"
//! }
//! ```
//!
//! `auth` may also be the literal string `"ECS_CONTAINER_ROLE"`. Any other
//! value, or no `auth` key at all, selects the EC2 instance profile role.

use std::fmt;

use aws_sdk_secretsmanager::config::Region;
use serde_json::{Map, Value};
use tracing::warn;

const REGION: &str = "region";
const AUTH: &str = "auth";
const ENDPOINT_URL: &str = "endpointUrl";
const ACCESS_KEY_ID: &str = "accessKeyId";
const SECRET_ACCESS_KEY: &str = "secretAccessKey";
const SESSION_TOKEN: &str = "sessionToken";

/// Tag selecting the ECS container role credentials
pub const ECS_CONTAINER_ROLE: &str = "ECS_CONTAINER_ROLE";

/// Partition-wide pseudo regions with a fixed identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlobalRegion {
    AwsGlobal,
    AwsCnGlobal,
    AwsUsGovGlobal,
    AwsIsoGlobal,
    AwsIsoBGlobal,
}

impl GlobalRegion {
    pub const ALL: [GlobalRegion; 5] = [
        Self::AwsGlobal,
        Self::AwsCnGlobal,
        Self::AwsUsGovGlobal,
        Self::AwsIsoGlobal,
        Self::AwsIsoBGlobal,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Self::AwsGlobal => "aws-global",
            Self::AwsCnGlobal => "aws-cn-global",
            Self::AwsUsGovGlobal => "aws-us-gov-global",
            Self::AwsIsoGlobal => "aws-iso-global",
            Self::AwsIsoBGlobal => "aws-iso-b-global",
        }
    }

    fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|region| region.id() == id)
    }
}

/// Region the client talks to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AwsRegion {
    Global(GlobalRegion),
    /// Any other identifier, passed to the SDK verbatim
    Custom(String),
}

impl AwsRegion {
    /// Resolve a region identifier. Unknown identifiers are not rejected here.
    pub fn parse(id: &str) -> Self {
        GlobalRegion::from_id(id).map_or_else(|| Self::Custom(id.to_string()), Self::Global)
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Global(global) => global.id(),
            Self::Custom(id) => id,
        }
    }

    pub fn to_sdk_region(&self) -> Region {
        match self {
            Self::Global(global) => Region::from_static(global.id()),
            Self::Custom(id) => Region::new(id.clone()),
        }
    }
}

impl fmt::Display for AwsRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// How the client obtains request-signing credentials
#[derive(Clone, PartialEq, Eq)]
pub enum AuthConfig {
    StaticKeys {
        access_key_id: String,
        secret_access_key: String,
    },
    StaticKeysWithSession {
        access_key_id: String,
        secret_access_key: String,
        session_token: String,
    },
    ContainerRole,
    InstanceProfileRole,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaticKeys { access_key_id, .. } => f
                .debug_struct("StaticKeys")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"** redacted **")
                .finish(),
            Self::StaticKeysWithSession { access_key_id, .. } => f
                .debug_struct("StaticKeysWithSession")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"** redacted **")
                .field("session_token", &"** redacted **")
                .finish(),
            Self::ContainerRole => f.write_str("ContainerRole"),
            Self::InstanceProfileRole => f.write_str("InstanceProfileRole"),
        }
    }
}

impl AuthConfig {
    fn from_value(value: Option<&Value>) -> Result<Self, ConfigError> {
        match value {
            Some(Value::Object(map)) => Self::from_static_map(map),
            Some(Value::String(tag)) if tag == ECS_CONTAINER_ROLE => Ok(Self::ContainerRole),
            Some(Value::String(tag)) => {
                warn!(auth = %tag, "Unrecognized auth tag, using EC2 instance profile role");
                Ok(Self::InstanceProfileRole)
            }
            _ => Ok(Self::InstanceProfileRole),
        }
    }

    fn from_static_map(map: &Map<String, Value>) -> Result<Self, ConfigError> {
        let access_key_id = required_string(map, ACCESS_KEY_ID)?;
        let secret_access_key = required_string(map, SECRET_ACCESS_KEY)?;

        match optional_string(map, SESSION_TOKEN)? {
            Some(session_token) => Ok(Self::StaticKeysWithSession {
                access_key_id,
                secret_access_key,
                session_token,
            }),
            None => Ok(Self::StaticKeys {
                access_key_id,
                secret_access_key,
            }),
        }
    }
}

/// Validated connection descriptor, built once per client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub region: AwsRegion,
    pub auth: AuthConfig,
    /// Endpoint override, e.g. a local emulator
    pub endpoint_url: Option<String>,
}

impl ConnectionConfig {
    pub fn new(region: AwsRegion, auth: AuthConfig) -> Self {
        Self {
            region,
            auth,
            endpoint_url: None,
        }
    }

    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Decode the host's structural configuration map
    pub fn from_value(value: &Value) -> Result<Self, ConfigError> {
        let map = value.as_object().ok_or(ConfigError::NotAMap)?;

        let region = AwsRegion::parse(&required_string(map, REGION)?);
        let auth = AuthConfig::from_value(map.get(AUTH))?;
        let endpoint_url = optional_string(map, ENDPOINT_URL)?;

        Ok(Self {
            region,
            auth,
            endpoint_url,
        })
    }
}

fn required_string(map: &Map<String, Value>, key: &'static str) -> Result<String, ConfigError> {
    match map.get(key) {
        Some(Value::String(s)) if !s.is_empty() => Ok(s.clone()),
        Some(Value::String(_)) => Err(ConfigError::EmptyField(key)),
        Some(_) => Err(ConfigError::InvalidField(key)),
        None => Err(ConfigError::MissingField(key)),
    }
}

fn optional_string(
    map: &Map<String, Value>,
    key: &'static str,
) -> Result<Option<String>, ConfigError> {
    match map.get(key) {
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(Value::Null) | None => Ok(None),
        Some(_) => Err(ConfigError::InvalidField(key)),
    }
}

/// Configuration decoding errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("client configuration must be a map")]
    NotAMap,

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{0}` must be a string")]
    InvalidField(&'static str),

    #[error("field `{0}` must not be empty")]
    EmptyField(&'static str),
}
