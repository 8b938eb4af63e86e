//! Drives the real SDK client through a handle against the in-process emulator

use std::collections::HashMap;

use secretbridge_secretsmanager::{
    BatchGetSecretValueRequest, ClientHandle, Error, Operation, SecretFilter, VersionSelector,
};
use secretbridge_test::TestServer;
use serde_json::json;

async fn setup() -> (TestServer, ClientHandle) {
    let server = TestServer::start().await.unwrap();
    let handle = ClientHandle::new();
    handle
        .init(&json!({
            "region": "us-east-1",
            "auth": { "accessKeyId": "test", "secretAccessKey": "test" },
            "endpointUrl": server.url(),
        }))
        .unwrap();
    (server, handle)
}

fn seed(server: &TestServer, name: &str, value: &str) {
    server
        .storage()
        .create_secret(
            name,
            Some(format!("{name} credentials")),
            None,
            Some(value.to_string()),
            None,
            HashMap::from([("team".to_string(), "payments".to_string())]),
        )
        .unwrap();
}

#[tokio::test]
async fn test_describe_secret() {
    let (server, handle) = setup().await;
    seed(&server, "prod/db", "hunter2");

    let description = handle.describe_secret("prod/db").await.unwrap();

    assert_eq!(description.name.as_deref(), Some("prod/db"));
    assert_eq!(description.description.as_deref(), Some("prod/db credentials"));
    assert!(description.arn.unwrap().contains(":secret:prod/db-"));
    assert!(description.created_date.is_some());
    let tags = description.tags.unwrap();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].key.as_deref(), Some("team"));

    let stages = description.version_ids_to_stages.unwrap();
    assert_eq!(stages.len(), 1);
    assert_eq!(stages.values().next().unwrap(), &vec!["AWSCURRENT".to_string()]);

    handle.close().unwrap();
}

#[tokio::test]
async fn test_get_secret_value_by_stage_and_id() {
    let (server, handle) = setup().await;
    seed(&server, "api-key", "v1");
    server
        .storage()
        .put_secret_value("api-key", Some("v2".to_string()), None)
        .unwrap();

    let current = handle
        .get_secret_value("api-key", &VersionSelector::default())
        .await
        .unwrap();
    assert_eq!(current.secret_string.as_deref(), Some("v2"));

    let previous = handle
        .get_secret_value("api-key", &VersionSelector::stage("AWSPREVIOUS"))
        .await
        .unwrap();
    assert_eq!(previous.secret_string.as_deref(), Some("v1"));
    assert_eq!(previous.version_stages, Some(vec!["AWSPREVIOUS".to_string()]));

    let by_id = handle
        .get_secret_value(
            "api-key",
            &VersionSelector::id(previous.version_id.clone().unwrap()),
        )
        .await
        .unwrap();
    assert_eq!(by_id.version_id, previous.version_id);
    assert_eq!(by_id.secret_string.as_deref(), Some("v1"));
}

#[tokio::test]
async fn test_get_binary_secret() {
    let (server, handle) = setup().await;
    server
        .storage()
        .create_secret(
            "cert",
            None,
            None,
            None,
            Some("aGVsbG8=".to_string()),
            HashMap::new(),
        )
        .unwrap();

    let value = handle
        .get_secret_value("cert", &VersionSelector::default())
        .await
        .unwrap();

    assert_eq!(value.secret_binary.as_deref(), Some(b"hello".as_slice()));
    assert_eq!(value.secret_string, None);
}

#[tokio::test]
async fn test_batch_keeps_values_and_errors() {
    let (server, handle) = setup().await;
    seed(&server, "a", "1");
    seed(&server, "b", "2");

    let batch = handle
        .batch_get_secret_value(BatchGetSecretValueRequest::secret_ids(["a", "missing", "b"]))
        .await
        .unwrap();

    let names: Vec<_> = batch
        .secret_values
        .iter()
        .filter_map(|v| v.name.as_deref())
        .collect();
    assert_eq!(names, ["a", "b"]);
    assert_eq!(batch.errors.len(), 1);
    assert_eq!(batch.errors[0].secret_id.as_deref(), Some("missing"));
    assert_eq!(
        batch.errors[0].error_code.as_deref(),
        Some("ResourceNotFoundException")
    );
}

#[tokio::test]
async fn test_batch_by_filter_pages() {
    let (server, handle) = setup().await;
    for name in ["prod/a", "prod/b", "prod/c", "dev/a"] {
        seed(&server, name, "x");
    }

    let request = BatchGetSecretValueRequest {
        filters: Some(vec![SecretFilter {
            key: "name".to_string(),
            values: vec!["prod/".to_string()],
        }]),
        max_results: Some(2),
        ..BatchGetSecretValueRequest::default()
    };

    let first = handle.batch_get_secret_value(request.clone()).await.unwrap();
    assert_eq!(first.secret_values.len(), 2);
    assert!(first.next_token.is_some());

    let second = handle
        .batch_get_secret_value(BatchGetSecretValueRequest {
            next_token: first.next_token,
            ..request
        })
        .await
        .unwrap();
    assert_eq!(second.secret_values.len(), 1);
    assert_eq!(second.secret_values[0].name.as_deref(), Some("prod/c"));
    assert_eq!(second.next_token, None);
}

#[tokio::test]
async fn test_missing_secret_is_an_operation_error() {
    let (_server, handle) = setup().await;

    let error = handle.describe_secret("nope").await.unwrap_err();

    assert_eq!(error.operation_name(), Some(Operation::DescribeSecret));
    let message = error.to_string();
    assert!(message.starts_with("Error occurred while executing describe-secret request"));
    assert!(message.contains("ResourceNotFoundException"));
}

#[tokio::test]
async fn test_exclusive_selector_is_rejected_by_service() {
    let (server, handle) = setup().await;
    seed(&server, "db", "x");

    let selector = VersionSelector {
        version_id: Some("v1".to_string()),
        version_stage: Some("AWSCURRENT".to_string()),
    };
    let error = handle.get_secret_value("db", &selector).await.unwrap_err();

    assert_eq!(error.operation_name(), Some(Operation::GetSecretValue));
    assert!(error.to_string().contains("InvalidParameterException"));
}

#[tokio::test]
async fn test_operations_after_close_fail() {
    let (server, handle) = setup().await;
    seed(&server, "db", "x");

    handle.close().unwrap();

    assert!(!handle.is_initialized());
    let error = handle.describe_secret("db").await.unwrap_err();
    assert!(matches!(error, Error::NotInitialized));
}
