//! Secrets Manager in-memory storage

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

const AWSCURRENT: &str = "AWSCURRENT";
const AWSPREVIOUS: &str = "AWSPREVIOUS";

/// Largest id list a batch request may carry
pub const MAX_BATCH_SECRET_IDS: usize = 20;

/// A secret with its versions
#[derive(Debug, Clone)]
pub struct Secret {
    /// Secret ARN
    pub arn: String,
    /// Secret name
    pub name: String,
    /// Description
    pub description: Option<String>,
    /// KMS Key ID (optional, not actually used for encryption)
    pub kms_key_id: Option<String>,
    /// Secret versions (version_id -> SecretVersion)
    pub versions: HashMap<String, SecretVersion>,
    /// Current version ID (AWSCURRENT)
    pub current_version_id: Option<String>,
    /// Previous version ID (AWSPREVIOUS)
    pub previous_version_id: Option<String>,
    /// Creation date
    pub created_date: DateTime<Utc>,
    /// Last changed date
    pub last_changed_date: DateTime<Utc>,
    /// Last accessed date
    pub last_accessed_date: Option<DateTime<Utc>>,
    /// Tags
    pub tags: HashMap<String, String>,
}

/// A version of a secret
#[derive(Debug, Clone)]
pub struct SecretVersion {
    /// Version ID
    pub version_id: String,
    /// Secret string value
    pub secret_string: Option<String>,
    /// Secret binary value (base64 encoded)
    pub secret_binary: Option<String>,
    /// Creation date
    pub created_date: DateTime<Utc>,
    /// Version stages (e.g., AWSCURRENT, AWSPREVIOUS)
    pub version_stages: Vec<String>,
}

/// Filter over the stored secrets, as sent by BatchGetSecretValue
#[derive(Debug, Clone)]
pub struct SecretFilter {
    pub key: String,
    pub values: Vec<String>,
}

impl SecretFilter {
    /// Matching is by prefix, like the service does for names
    fn matches(&self, secret: &Secret) -> bool {
        let prefixed = |field: &str| self.values.iter().any(|v| field.starts_with(v.as_str()));
        match self.key.as_str() {
            "name" => prefixed(secret.name.as_str()),
            "description" => secret.description.as_deref().is_some_and(prefixed),
            "tag-key" => secret.tags.keys().any(|k| prefixed(k.as_str())),
            "tag-value" => secret.tags.values().any(|v| prefixed(v.as_str())),
            "all" => {
                prefixed(secret.name.as_str())
                    || secret.description.as_deref().is_some_and(prefixed)
                    || secret
                        .tags
                        .iter()
                        .any(|(k, v)| prefixed(k.as_str()) || prefixed(v.as_str()))
            }
            _ => false,
        }
    }
}

/// Result of a batch read: found values and per-secret failures
#[derive(Debug, Default)]
pub struct BatchResult {
    pub values: Vec<(Secret, SecretVersion)>,
    pub errors: Vec<(String, SecretsManagerError)>,
    pub next_token: Option<String>,
}

/// In-memory storage for secrets
#[derive(Debug)]
pub struct SecretsManagerStorage {
    /// Secrets indexed by name
    secrets: DashMap<String, Secret>,
    region: String,
    account_id: String,
}

impl Default for SecretsManagerStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl SecretsManagerStorage {
    pub fn new() -> Self {
        Self::with_location("us-east-1", "000000000000")
    }

    /// Storage whose ARNs carry the given region and account
    pub fn with_location(region: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            secrets: DashMap::new(),
            region: region.into(),
            account_id: account_id.into(),
        }
    }

    /// Create a new secret
    pub fn create_secret(
        &self,
        name: &str,
        description: Option<String>,
        kms_key_id: Option<String>,
        secret_string: Option<String>,
        secret_binary: Option<String>,
        tags: HashMap<String, String>,
    ) -> Result<Secret, SecretsManagerError> {
        if self.secrets.contains_key(name) {
            return Err(SecretsManagerError::ResourceExists(name.to_string()));
        }

        let now = Utc::now();
        let version_id = Uuid::new_v4().to_string();
        let arn = format!(
            "arn:aws:secretsmanager:{}:{}:secret:{}-{}",
            self.region,
            self.account_id,
            name,
            &Uuid::new_v4().simple().to_string()[..6]
        );

        let mut versions = HashMap::new();
        let current_version_id = if secret_string.is_some() || secret_binary.is_some() {
            versions.insert(
                version_id.clone(),
                SecretVersion {
                    version_id: version_id.clone(),
                    secret_string,
                    secret_binary,
                    created_date: now,
                    version_stages: vec![AWSCURRENT.to_string()],
                },
            );
            Some(version_id)
        } else {
            None
        };

        let secret = Secret {
            arn,
            name: name.to_string(),
            description,
            kms_key_id,
            versions,
            current_version_id,
            previous_version_id: None,
            created_date: now,
            last_changed_date: now,
            last_accessed_date: None,
            tags,
        };

        self.secrets.insert(name.to_string(), secret.clone());
        Ok(secret)
    }

    /// Map a secret id (name or ARN) to the stored name
    fn resolve(&self, secret_id: &str) -> Result<String, SecretsManagerError> {
        if self.secrets.contains_key(secret_id) {
            return Ok(secret_id.to_string());
        }
        self.secrets
            .iter()
            .find(|entry| entry.arn == secret_id)
            .map(|entry| entry.key().clone())
            .ok_or_else(|| SecretsManagerError::ResourceNotFound(secret_id.to_string()))
    }

    /// Describe a secret
    pub fn describe_secret(&self, secret_id: &str) -> Result<Secret, SecretsManagerError> {
        let name = self.resolve(secret_id)?;
        self.secrets
            .get(&name)
            .map(|s| s.clone())
            .ok_or(SecretsManagerError::ResourceNotFound(name))
    }

    /// Get secret value
    pub fn get_secret_value(
        &self,
        secret_id: &str,
        version_id: Option<&str>,
        version_stage: Option<&str>,
    ) -> Result<(Secret, SecretVersion), SecretsManagerError> {
        if version_id.is_some() && version_stage.is_some() {
            return Err(SecretsManagerError::InvalidParameter(
                "You can't specify both VersionId and VersionStage".to_string(),
            ));
        }

        let name = self.resolve(secret_id)?;
        let mut secret = self
            .secrets
            .get_mut(&name)
            .ok_or_else(|| SecretsManagerError::ResourceNotFound(secret_id.to_string()))?;

        secret.last_accessed_date = Some(Utc::now());

        let version = match (version_id, version_stage) {
            (Some(vid), _) => secret.versions.get(vid),
            (None, stage) => {
                let stage = stage.unwrap_or(AWSCURRENT);
                secret
                    .versions
                    .values()
                    .find(|v| v.version_stages.iter().any(|s| s == stage))
            }
        }
        .cloned()
        .ok_or_else(|| {
            SecretsManagerError::ResourceNotFound(format!(
                "{secret_id} has no version matching {}",
                version_id.or(version_stage).unwrap_or(AWSCURRENT)
            ))
        })?;

        Ok((secret.clone(), version))
    }

    /// Put a new secret value
    pub fn put_secret_value(
        &self,
        secret_id: &str,
        secret_string: Option<String>,
        secret_binary: Option<String>,
    ) -> Result<(Secret, SecretVersion), SecretsManagerError> {
        let name = self.resolve(secret_id)?;
        let mut secret = self
            .secrets
            .get_mut(&name)
            .ok_or_else(|| SecretsManagerError::ResourceNotFound(secret_id.to_string()))?;

        let now = Utc::now();
        let new_version_id = Uuid::new_v4().to_string();

        // Clone the IDs we need before mutating
        let current_vid = secret.current_version_id.clone();
        let prev_vid = secret.previous_version_id.clone();

        // Move current to previous
        if let Some(ref cvid) = current_vid {
            if let Some(current_version) = secret.versions.get_mut(cvid) {
                current_version.version_stages.retain(|s| s != AWSCURRENT);
                current_version.version_stages.push(AWSPREVIOUS.to_string());
            }
            // Remove AWSPREVIOUS from old previous
            if let Some(ref pvid) = prev_vid {
                if let Some(prev_version) = secret.versions.get_mut(pvid) {
                    prev_version.version_stages.retain(|s| s != AWSPREVIOUS);
                }
            }
            secret.previous_version_id = Some(cvid.clone());
        }

        let new_version = SecretVersion {
            version_id: new_version_id.clone(),
            secret_string,
            secret_binary,
            created_date: now,
            version_stages: vec![AWSCURRENT.to_string()],
        };

        secret
            .versions
            .insert(new_version_id.clone(), new_version.clone());
        secret.current_version_id = Some(new_version_id);
        secret.last_changed_date = now;

        Ok((secret.clone(), new_version))
    }

    /// Read the current version of several secrets, either by id or by
    /// filter. Secrets that cannot be read are reported per id.
    pub fn batch_get_secret_value(
        &self,
        secret_ids: Option<&[String]>,
        filters: Option<&[SecretFilter]>,
        max_results: Option<usize>,
        next_token: Option<&str>,
    ) -> Result<BatchResult, SecretsManagerError> {
        match (secret_ids, filters) {
            (Some(_), Some(_)) => Err(SecretsManagerError::InvalidParameter(
                "Either SecretIdList or Filters must be provided, not both".to_string(),
            )),
            (None, None) => Err(SecretsManagerError::InvalidParameter(
                "One of SecretIdList or Filters is required".to_string(),
            )),
            (Some(ids), None) => {
                if ids.len() > MAX_BATCH_SECRET_IDS {
                    return Err(SecretsManagerError::InvalidParameter(format!(
                        "SecretIdList accepts at most {MAX_BATCH_SECRET_IDS} entries"
                    )));
                }
                let mut result = BatchResult::default();
                for id in ids {
                    match self.get_secret_value(id, None, None) {
                        Ok(value) => result.values.push(value),
                        Err(e) => result.errors.push((id.clone(), e)),
                    }
                }
                Ok(result)
            }
            (None, Some(filters)) => {
                let mut names: Vec<String> = self
                    .secrets
                    .iter()
                    .filter(|entry| filters.iter().all(|f| f.matches(entry.value())))
                    .map(|entry| entry.key().clone())
                    .collect();
                names.sort();

                let start = match next_token {
                    Some(token) => token.parse::<usize>().map_err(|_| {
                        SecretsManagerError::InvalidParameter(format!("Invalid NextToken: {token}"))
                    })?,
                    None => 0,
                };
                let page_size = max_results.unwrap_or(MAX_BATCH_SECRET_IDS);
                let end = names.len().min(start.saturating_add(page_size));

                let mut result = BatchResult::default();
                for name in names.get(start..end).unwrap_or_default() {
                    match self.get_secret_value(name, None, None) {
                        Ok(value) => result.values.push(value),
                        Err(e) => result.errors.push((name.clone(), e)),
                    }
                }
                if end < names.len() {
                    result.next_token = Some(end.to_string());
                }
                Ok(result)
            }
        }
    }
}

/// Secrets Manager errors
#[derive(Debug, thiserror::Error)]
pub enum SecretsManagerError {
    #[error("Secret already exists: {0}")]
    ResourceExists(String),

    #[error("Secret not found: {0}")]
    ResourceNotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

impl SecretsManagerError {
    /// Exception name reported on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Self::ResourceExists(_) => "ResourceExistsException",
            Self::ResourceNotFound(_) => "ResourceNotFoundException",
            Self::InvalidParameter(_) => "InvalidParameterException",
        }
    }
}

/// State for Secrets Manager handlers
pub struct SecretsManagerState {
    pub storage: Arc<SecretsManagerStorage>,
}

impl SecretsManagerState {
    pub fn new() -> Self {
        Self {
            storage: Arc::new(SecretsManagerStorage::new()),
        }
    }
}

impl Default for SecretsManagerState {
    fn default() -> Self {
        Self::new()
    }
}
