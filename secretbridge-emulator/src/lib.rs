//! In-memory AWS Secrets Manager endpoint
//!
//! Speaks the JSON 1.1 protocol the AWS SDK uses, enough for:
//! - CreateSecret, PutSecretValue
//! - DescribeSecret, GetSecretValue, BatchGetSecretValue
//! - Secret versioning (AWSCURRENT, AWSPREVIOUS)

pub mod handlers;
mod storage;

use axum::{
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use handlers::handle_request;
pub use storage::{
    BatchResult, Secret, SecretFilter, SecretVersion, SecretsManagerError, SecretsManagerState,
    SecretsManagerStorage, MAX_BATCH_SECRET_IDS,
};

/// Create the emulator router
pub fn router(state: Arc<SecretsManagerState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/", post(handle_request))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, r#"{"status": "running", "services": ["secretsmanager"]}"#)
}
