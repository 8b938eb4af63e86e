//! HTTP handlers for Secrets Manager

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::storage::{
    BatchResult, Secret, SecretFilter, SecretVersion, SecretsManagerError, SecretsManagerState,
};

const TARGET_PREFIX: &str = "secretsmanager.";
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Handle Secrets Manager requests based on X-Amz-Target header
pub async fn handle_request(
    State(state): State<Arc<SecretsManagerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let target = headers
        .get("x-amz-target")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    info!(target = %target, "Secrets Manager request");

    let operation = target.strip_prefix(TARGET_PREFIX).unwrap_or(target);
    match operation {
        "CreateSecret" => handle_create_secret(&state, &body),
        "PutSecretValue" => handle_put_secret_value(&state, &body),
        "DescribeSecret" => handle_describe_secret(&state, &body),
        "GetSecretValue" => handle_get_secret_value(&state, &body),
        "BatchGetSecretValue" => handle_batch_get_secret_value(&state, &body),
        _ => {
            warn!(target = %target, "Unknown Secrets Manager operation");
            error_response(
                StatusCode::BAD_REQUEST,
                "UnknownOperationException",
                &format!("Unknown operation: {target}"),
            )
        }
    }
}

// === Request/Response types ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSecretRequest {
    name: String,
    description: Option<String>,
    kms_key_id: Option<String>,
    secret_string: Option<String>,
    secret_binary: Option<String>,
    #[serde(default)]
    tags: Vec<Tag>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
struct Tag {
    key: String,
    value: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct CreateSecretResponse {
    #[serde(rename = "ARN")]
    arn: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PutSecretValueRequest {
    secret_id: String,
    secret_string: Option<String>,
    secret_binary: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct PutSecretValueResponse {
    #[serde(rename = "ARN")]
    arn: String,
    name: String,
    version_id: String,
    version_stages: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSecretRequest {
    secret_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeSecretResponse {
    #[serde(rename = "ARN")]
    arn: String,
    name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kms_key_id: Option<String>,
    created_date: f64,
    last_changed_date: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_accessed_date: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tags: Vec<Tag>,
    version_ids_to_stages: HashMap<String, Vec<String>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct GetSecretValueRequest {
    secret_id: String,
    version_id: Option<String>,
    version_stage: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SecretValueEntry {
    #[serde(rename = "ARN")]
    arn: String,
    name: String,
    version_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_string: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secret_binary: Option<String>,
    version_stages: Vec<String>,
    created_date: f64,
}

impl SecretValueEntry {
    fn new(secret: Secret, version: SecretVersion) -> Self {
        Self {
            arn: secret.arn,
            name: secret.name,
            version_id: version.version_id,
            secret_string: version.secret_string,
            secret_binary: version.secret_binary,
            version_stages: version.version_stages,
            created_date: epoch_seconds(version.created_date),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Filter {
    key: String,
    #[serde(default)]
    values: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct BatchGetSecretValueRequest {
    secret_id_list: Option<Vec<String>>,
    filters: Option<Vec<Filter>>,
    max_results: Option<usize>,
    next_token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct ApiErrorType {
    secret_id: String,
    error_code: String,
    message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct BatchGetSecretValueResponse {
    secret_values: Vec<SecretValueEntry>,
    errors: Vec<ApiErrorType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
}

impl From<BatchResult> for BatchGetSecretValueResponse {
    fn from(result: BatchResult) -> Self {
        Self {
            secret_values: result
                .values
                .into_iter()
                .map(|(secret, version)| SecretValueEntry::new(secret, version))
                .collect(),
            errors: result
                .errors
                .into_iter()
                .map(|(secret_id, e)| ApiErrorType {
                    secret_id,
                    error_code: e.code().to_string(),
                    message: e.to_string(),
                })
                .collect(),
            next_token: result.next_token,
        }
    }
}

// === Handlers ===

fn handle_create_secret(state: &SecretsManagerState, body: &[u8]) -> Response {
    let req: CreateSecretRequest = match parse(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    let tags: HashMap<String, String> = req.tags.into_iter().map(|t| (t.key, t.value)).collect();

    match state.storage.create_secret(
        &req.name,
        req.description,
        req.kms_key_id,
        req.secret_string,
        req.secret_binary,
        tags,
    ) {
        Ok(secret) => json_response(&CreateSecretResponse {
            arn: secret.arn,
            name: secret.name,
            version_id: secret.current_version_id,
        }),
        Err(e) => storage_error(&e),
    }
}

fn handle_put_secret_value(state: &SecretsManagerState, body: &[u8]) -> Response {
    let req: PutSecretValueRequest = match parse(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match state
        .storage
        .put_secret_value(&req.secret_id, req.secret_string, req.secret_binary)
    {
        Ok((secret, version)) => json_response(&PutSecretValueResponse {
            arn: secret.arn,
            name: secret.name,
            version_id: version.version_id,
            version_stages: version.version_stages,
        }),
        Err(e) => storage_error(&e),
    }
}

fn handle_describe_secret(state: &SecretsManagerState, body: &[u8]) -> Response {
    let req: DescribeSecretRequest = match parse(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match state.storage.describe_secret(&req.secret_id) {
        Ok(secret) => {
            let version_ids_to_stages = secret
                .versions
                .iter()
                .map(|(k, v)| (k.clone(), v.version_stages.clone()))
                .collect();
            let mut tags: Vec<Tag> = secret
                .tags
                .into_iter()
                .map(|(key, value)| Tag { key, value })
                .collect();
            tags.sort_by(|a, b| a.key.cmp(&b.key));

            json_response(&DescribeSecretResponse {
                arn: secret.arn,
                name: secret.name,
                description: secret.description,
                kms_key_id: secret.kms_key_id,
                created_date: epoch_seconds(secret.created_date),
                last_changed_date: epoch_seconds(secret.last_changed_date),
                last_accessed_date: secret.last_accessed_date.map(epoch_seconds),
                tags,
                version_ids_to_stages,
            })
        }
        Err(e) => storage_error(&e),
    }
}

fn handle_get_secret_value(state: &SecretsManagerState, body: &[u8]) -> Response {
    let req: GetSecretValueRequest = match parse(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    match state.storage.get_secret_value(
        &req.secret_id,
        req.version_id.as_deref(),
        req.version_stage.as_deref(),
    ) {
        Ok((secret, version)) => json_response(&SecretValueEntry::new(secret, version)),
        Err(e) => storage_error(&e),
    }
}

fn handle_batch_get_secret_value(state: &SecretsManagerState, body: &[u8]) -> Response {
    let req: BatchGetSecretValueRequest = match parse(body) {
        Ok(r) => r,
        Err(response) => return response,
    };

    let filters: Option<Vec<SecretFilter>> = req.filters.map(|filters| {
        filters
            .into_iter()
            .map(|f| SecretFilter {
                key: f.key,
                values: f.values,
            })
            .collect()
    });

    match state.storage.batch_get_secret_value(
        req.secret_id_list.as_deref(),
        filters.as_deref(),
        req.max_results,
        req.next_token.as_deref(),
    ) {
        Ok(result) => {
            debug!(
                values = result.values.len(),
                errors = result.errors.len(),
                "Batch read complete"
            );
            json_response(&BatchGetSecretValueResponse::from(result))
        }
        Err(e) => storage_error(&e),
    }
}

// === Helpers ===

fn parse<T: DeserializeOwned>(body: &[u8]) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            "ValidationException",
            &e.to_string(),
        )
    })
}

#[allow(clippy::cast_precision_loss)]
fn epoch_seconds(date: chrono::DateTime<chrono::Utc>) -> f64 {
    date.timestamp_millis() as f64 / 1000.0
}

fn json_response<T: Serialize>(body: &T) -> Response {
    match serde_json::to_string(body) {
        Ok(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, CONTENT_TYPE)],
            body,
        )
            .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "InternalServiceError",
            &e.to_string(),
        ),
    }
}

fn storage_error(error: &SecretsManagerError) -> Response {
    error_response(StatusCode::BAD_REQUEST, error.code(), &error.to_string())
}

fn error_response(status: StatusCode, error_type: &str, message: &str) -> Response {
    let body = serde_json::json!({
        "__type": error_type,
        "message": message
    });
    (
        status,
        [
            (header::CONTENT_TYPE, CONTENT_TYPE.to_string()),
            (
                header::HeaderName::from_static("x-amzn-errortype"),
                error_type.to_string(),
            ),
        ],
        body.to_string(),
    )
        .into_response()
}
