//! Structural request and response records
//!
//! Responses mirror the Secrets Manager output shapes field for field.
//! Fields the service leaves unset stay `None` and are omitted when
//! serialized.

use std::collections::HashMap;

use aws_sdk_secretsmanager::error::BuildError;
use aws_sdk_secretsmanager::operation::batch_get_secret_value::{
    BatchGetSecretValueInput, BatchGetSecretValueOutput,
};
use aws_sdk_secretsmanager::operation::describe_secret::DescribeSecretOutput;
use aws_sdk_secretsmanager::operation::get_secret_value::{
    GetSecretValueInput, GetSecretValueOutput,
};
use aws_sdk_secretsmanager::primitives::DateTime;
use aws_sdk_secretsmanager::types::{
    ApiErrorType, Filter, FilterNameStringType, ReplicationStatusType, RotationRulesType,
    SecretValueEntry, Tag as SdkTag,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Selects which version of a secret to fetch. Set at most one field; the
/// service rejects requests carrying both.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSelector {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_stage: Option<String>,
}

impl VersionSelector {
    pub fn id(version_id: impl Into<String>) -> Self {
        Self {
            version_id: Some(version_id.into()),
            version_stage: None,
        }
    }

    pub fn stage(version_stage: impl Into<String>) -> Self {
        Self {
            version_id: None,
            version_stage: Some(version_stage.into()),
        }
    }

    pub(crate) fn to_input(&self, secret_id: &str) -> Result<GetSecretValueInput, BuildError> {
        GetSecretValueInput::builder()
            .secret_id(secret_id)
            .set_version_id(self.version_id.clone())
            .set_version_stage(self.version_stage.clone())
            .build()
    }
}

/// Filter applied by batch-get-secret-value when no id list is given
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretFilter {
    /// One of `description`, `name`, `tag-key`, `tag-value`,
    /// `primary-region`, `owning-service` or `all`
    pub key: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl SecretFilter {
    fn into_sdk(self) -> Filter {
        Filter::builder()
            .key(FilterNameStringType::from(self.key.as_str()))
            .set_values(Some(self.values))
            .build()
    }
}

/// Batch request. The service caps the id list at 20 entries; the count is
/// not checked locally.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchGetSecretValueRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<SecretFilter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl BatchGetSecretValueRequest {
    pub fn secret_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            secret_ids: Some(ids.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub(crate) fn into_input(self) -> Result<BatchGetSecretValueInput, BuildError> {
        let filters = self
            .filters
            .map(|filters| filters.into_iter().map(SecretFilter::into_sdk).collect());

        BatchGetSecretValueInput::builder()
            .set_secret_id_list(self.secret_ids)
            .set_filters(filters)
            .set_max_results(self.max_results)
            .set_next_token(self.next_token)
            .build()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl From<SdkTag> for Tag {
    fn from(tag: SdkTag) -> Self {
        Self {
            key: tag.key,
            value: tag.value,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RotationRules {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub automatically_after_days: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_expression: Option<String>,
}

impl From<RotationRulesType> for RotationRules {
    fn from(rules: RotationRulesType) -> Self {
        Self {
            automatically_after_days: rules.automatically_after_days,
            duration: rules.duration,
            schedule_expression: rules.schedule_expression,
        }
    }
}

/// Replication state of a secret in one replica region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplicationStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_date: Option<chrono::DateTime<Utc>>,
}

impl From<ReplicationStatusType> for ReplicationStatus {
    fn from(status: ReplicationStatusType) -> Self {
        Self {
            region: status.region,
            kms_key_id: status.kms_key_id,
            status: status.status.map(|s| s.as_str().to_string()),
            status_message: status.status_message,
            last_accessed_date: status.last_accessed_date.and_then(to_utc),
        }
    }
}

/// Secret metadata returned by describe-secret. Never contains the value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kms_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_enabled: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_lambda_arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation_rules: Option<RotationRules>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_rotated_date: Option<chrono::DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed_date: Option<chrono::DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_accessed_date: Option<chrono::DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_date: Option<chrono::DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_rotation_date: Option<chrono::DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<Tag>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_ids_to_stages: Option<HashMap<String, Vec<String>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owning_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<chrono::DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub replication_status: Option<Vec<ReplicationStatus>>,
}

impl From<DescribeSecretOutput> for SecretDescription {
    fn from(output: DescribeSecretOutput) -> Self {
        Self {
            arn: output.arn,
            name: output.name,
            description: output.description,
            kms_key_id: output.kms_key_id,
            rotation_enabled: output.rotation_enabled,
            rotation_lambda_arn: output.rotation_lambda_arn,
            rotation_rules: output.rotation_rules.map(RotationRules::from),
            last_rotated_date: output.last_rotated_date.and_then(to_utc),
            last_changed_date: output.last_changed_date.and_then(to_utc),
            last_accessed_date: output.last_accessed_date.and_then(to_utc),
            deleted_date: output.deleted_date.and_then(to_utc),
            next_rotation_date: output.next_rotation_date.and_then(to_utc),
            tags: output
                .tags
                .map(|tags| tags.into_iter().map(Tag::from).collect()),
            version_ids_to_stages: output.version_ids_to_stages,
            owning_service: output.owning_service,
            created_date: output.created_date.and_then(to_utc),
            primary_region: output.primary_region,
            replication_status: output
                .replication_status
                .map(|statuses| statuses.into_iter().map(ReplicationStatus::from).collect()),
        }
    }
}

/// A decrypted secret value with its version metadata
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretValue {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arn: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,
    /// Base64 encoded when serialized
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "base64_bytes"
    )]
    pub secret_binary: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_stages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<chrono::DateTime<Utc>>,
}

impl From<GetSecretValueOutput> for SecretValue {
    fn from(output: GetSecretValueOutput) -> Self {
        Self {
            arn: output.arn,
            name: output.name,
            version_id: output.version_id,
            secret_binary: output.secret_binary.map(|blob| blob.into_inner()),
            secret_string: output.secret_string,
            version_stages: output.version_stages,
            created_date: output.created_date.and_then(to_utc),
        }
    }
}

impl From<SecretValueEntry> for SecretValue {
    fn from(entry: SecretValueEntry) -> Self {
        Self {
            arn: entry.arn,
            name: entry.name,
            version_id: entry.version_id,
            secret_binary: entry.secret_binary.map(|blob| blob.into_inner()),
            secret_string: entry.secret_string,
            version_stages: entry.version_stages,
            created_date: entry.created_date.and_then(to_utc),
        }
    }
}

/// A secret the batch call could not retrieve
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecretValueError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<ApiErrorType> for SecretValueError {
    fn from(error: ApiErrorType) -> Self {
        Self {
            secret_id: error.secret_id,
            error_code: error.error_code,
            message: error.message,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSecretValue {
    #[serde(default)]
    pub secret_values: Vec<SecretValue>,
    #[serde(default)]
    pub errors: Vec<SecretValueError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

impl From<BatchGetSecretValueOutput> for BatchSecretValue {
    fn from(output: BatchGetSecretValueOutput) -> Self {
        Self {
            secret_values: output
                .secret_values
                .unwrap_or_default()
                .into_iter()
                .map(SecretValue::from)
                .collect(),
            errors: output
                .errors
                .unwrap_or_default()
                .into_iter()
                .map(SecretValueError::from)
                .collect(),
            next_token: output.next_token,
        }
    }
}

fn to_utc(date: DateTime) -> Option<chrono::DateTime<Utc>> {
    chrono::DateTime::from_timestamp(date.secs(), date.subsec_nanos())
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Vec<u8>>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|encoded| STANDARD.decode(encoded).map_err(serde::de::Error::custom))
            .transpose()
    }
}
