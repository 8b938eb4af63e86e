//! Test utilities for secretbridge
//!
//! Runs the Secrets Manager emulator in-process so integration tests can
//! point a real SDK client at it:
//! - Start the emulator on an ephemeral port
//! - Wait for it to answer health checks
//! - Seed secrets directly through its storage
//!
//! ## Usage
//!
//! ```rust,no_run
//! use secretbridge_test::TestServer;
//!
//! #[tokio::test]
//! async fn test_get_secret() {
//!     let server = TestServer::start().await.unwrap();
//!
//!     // Point the client's endpointUrl at the server
//!     println!("Emulator running at: {}", server.url());
//! }
//! ```

pub mod server;

pub use server::{TestError, TestServer};

/// Timeout for waiting on the emulator
pub const STARTUP_TIMEOUT_SECS: u64 = 10;
