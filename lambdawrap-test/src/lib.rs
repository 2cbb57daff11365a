//! Test utilities for lambdawrap
//!
//! Provides an in-process stub of the Lambda invoke API plus a few plain HTTP
//! endpoints, bound to a random local port:
//! - Register canned responses per function name
//! - Inspect the requests the stub received
//! - Echo and failing routes for HTTP invocation
//!
//! ## Usage
//!
//! ```rust,no_run
//! use lambdawrap_test::{CannedResponse, StubServer};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_remote() {
//!     let server = StubServer::start().await.unwrap();
//!     server.register("orders", CannedResponse::ok(json!({ "total": 3 })));
//!
//!     // Point the Lambda client at the stub
//!     println!("Stub running at: {}", server.url());
//! }
//! ```

pub mod server;

pub use server::{CannedResponse, RecordedRequest, StubServer, TestError};

/// Route that answers with `{"echo": <request body>}`
pub const ECHO_PATH: &str = "/echo";

/// Route that always answers 500
pub const FAIL_PATH: &str = "/fail";

/// Route that answers 200 with a body that is not JSON
pub const TEXT_PATH: &str = "/text";

/// Install a test-friendly tracing subscriber. Safe to call more than once.
pub fn init_test_logging() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "lambdawrap=debug".into()),
        )
        .with_test_writer()
        .try_init();
}
