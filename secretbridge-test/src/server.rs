//! Test server management

use secretbridge_emulator::{SecretsManagerState, SecretsManagerStorage};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::STARTUP_TIMEOUT_SECS;

/// A running emulator bound to a local port
pub struct TestServer {
    state: Arc<SecretsManagerState>,
    addr: SocketAddr,
    base_url: String,
    task: JoinHandle<()>,
}

impl TestServer {
    /// Start the emulator on a random available port
    pub async fn start() -> Result<Self, TestError> {
        Self::start_with(SecretsManagerState::new()).await
    }

    /// Start the emulator over existing state
    pub async fn start_with(state: SecretsManagerState) -> Result<Self, TestError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(state);
        let app = secretbridge_emulator::router(state.clone());

        info!(port = addr.port(), "Starting Secrets Manager emulator");

        let task = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                warn!(error = %e, "Emulator stopped");
            }
        });

        let server = Self {
            state,
            addr,
            base_url: format!("http://{addr}"),
            task,
        };
        server.wait_ready().await?;
        Ok(server)
    }

    async fn wait_ready(&self) -> Result<(), TestError> {
        let health = format!("{}/health", self.base_url);
        let start = std::time::Instant::now();

        while start.elapsed() < Duration::from_secs(STARTUP_TIMEOUT_SECS) {
            if let Ok(response) = reqwest::get(&health).await {
                if response.status().is_success() {
                    info!(port = self.port(), "Emulator ready");
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        Err(TestError::StartupTimeout)
    }

    /// Get the base URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Get the port
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Storage behind the endpoint, for seeding secrets
    pub fn storage(&self) -> &SecretsManagerStorage {
        &self.state.storage
    }

    /// Stop the server
    pub fn stop(&self) {
        info!(port = self.port(), "Stopping Secrets Manager emulator");
        self.task.abort();
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Errors that can occur with test server
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("Failed to bind emulator: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Emulator startup timed out")]
    StartupTimeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_start_serves_health() {
        let server = TestServer::start().await.unwrap();

        let response = reqwest::get(format!("{}/health", server.url())).await.unwrap();
        assert!(response.status().is_success());
        assert!(server.url().ends_with(&server.port().to_string()));
    }

    #[tokio::test]
    async fn test_storage_is_shared_with_endpoint() {
        let server = TestServer::start().await.unwrap();
        server
            .storage()
            .create_secret("seeded", None, None, Some("v".to_string()), None, HashMap::new())
            .unwrap();

        let response = reqwest::Client::new()
            .post(server.url())
            .header("x-amz-target", "secretsmanager.GetSecretValue")
            .header("content-type", "application/x-amz-json-1.1")
            .body(r#"{"SecretId":"seeded"}"#)
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
        assert!(response.text().await.unwrap().contains(r#""SecretString":"v""#));
    }
}
