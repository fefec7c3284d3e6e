//! Common test utilities for in-process API testing with mocks.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use ticketgate_core::{
    testing::{MockLockStore, MockTransport},
    Config, LockStore, TicketOrchestrator, TicketTransport,
};

/// Re-export fixtures for test convenience
pub use ticketgate_core::testing::fixtures;

/// Test fixture for API testing with mock collaborators.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock transport - configure remote responses, inspect sent tickets
    pub transport: Arc<MockTransport>,
    /// Mock lock store - pre-hold keys, inject failures
    pub locks: Arc<MockLockStore>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with the default test configuration.
    pub fn new() -> Self {
        Self::with_config(fixtures::test_config())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(config: Config) -> Self {
        let transport = Arc::new(MockTransport::new());
        let locks = Arc::new(MockLockStore::new());

        let orchestrator = Arc::new(TicketOrchestrator::from_parts(
            &config,
            Arc::clone(&transport) as Arc<dyn TicketTransport>,
            Arc::clone(&locks) as Arc<dyn LockStore>,
        ));
        let state = Arc::new(ticketgate_server::state::AppState::new(config, orchestrator));
        let router = ticketgate_server::api::create_router(state);

        Self {
            router,
            transport,
            locks,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a GET request and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = match body {
            Some(json) => {
                request_builder = request_builder.header("Content-Type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(request_builder.body(body).unwrap())
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
