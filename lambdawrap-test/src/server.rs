//! Stub Lambda server

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use bytes::Bytes;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::{ECHO_PATH, FAIL_PATH, TEXT_PATH};

/// Answer the stub gives for one function
#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub payload: String,
    pub function_error: Option<String>,
    pub log_result: Option<String>,
    pub executed_version: String,
}

impl CannedResponse {
    pub fn ok(payload: Value) -> Self {
        Self::raw(payload.to_string())
    }

    /// Payload sent verbatim, JSON or not
    pub fn raw(payload: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            function_error: None,
            log_result: None,
            executed_version: "$LATEST".to_string(),
        }
    }

    /// A function that ran and failed
    pub fn function_error(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            function_error: Some(kind.into()),
            ..Self::ok(payload)
        }
    }

    pub fn with_log_result(mut self, log_result: impl Into<String>) -> Self {
        self.log_result = Some(log_result.into());
        self
    }
}

/// One invoke request as the stub received it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub function_name: String,
    pub invocation_type: Option<String>,
    pub log_type: Option<String>,
    /// Region from the signature's credential scope
    pub region: Option<String>,
    pub payload: Value,
}

#[derive(Default)]
struct StubState {
    functions: Mutex<HashMap<String, CannedResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

/// A running stub server
pub struct StubServer {
    base_url: String,
    state: Arc<StubState>,
    handle: JoinHandle<()>,
}

impl StubServer {
    /// Start the stub on a random local port
    pub async fn start() -> Result<Self, TestError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(StubState::default());

        let router = Router::new()
            .route(
                "/2015-03-31/functions/:function_name/invocations",
                post(invoke_function),
            )
            .route(ECHO_PATH, post(echo))
            .route(FAIL_PATH, post(fail))
            .route(TEXT_PATH, post(text))
            .with_state(state.clone());

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!(error = %e, "Stub server stopped");
            }
        });

        let base_url = format!("http://{}", addr);
        info!(url = %base_url, "Stub server started");

        Ok(Self {
            base_url,
            state,
            handle,
        })
    }

    /// Base URL, usable as a Lambda endpoint URL
    pub fn url(&self) -> &str {
        &self.base_url
    }

    /// Full URL of a route on the stub
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Register the answer for `function_name`. Unregistered functions get
    /// a `ResourceNotFoundException`.
    pub fn register(&self, function_name: impl Into<String>, response: CannedResponse) {
        self.state
            .functions
            .lock()
            .insert(function_name.into(), response);
    }

    /// Invoke requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().clone()
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Errors that can occur starting the stub
#[derive(Debug, thiserror::Error)]
pub enum TestError {
    #[error("Failed to bind stub server: {0}")]
    Bind(#[from] std::io::Error),
}

async fn invoke_function(
    State(state): State<Arc<StubState>>,
    Path(function_name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    info!(function_name = %function_name, payload_size = %body.len(), "Invoke");

    let invocation_type = header_value(&headers, "X-Amz-Invocation-Type");
    let request = RecordedRequest {
        function_name: function_name.clone(),
        invocation_type: invocation_type.clone(),
        log_type: header_value(&headers, "X-Amz-Log-Type"),
        region: header_value(&headers, header::AUTHORIZATION.as_str())
            .as_deref()
            .and_then(credential_region),
        payload: serde_json::from_slice(&body).unwrap_or(Value::Null),
    };
    debug!(?request, "Recorded invoke request");
    state.requests.lock().push(request);

    let Some(canned) = state.functions.lock().get(&function_name).cloned() else {
        return resource_not_found(&function_name);
    };

    let status = match invocation_type.as_deref() {
        Some("Event") => StatusCode::ACCEPTED,
        Some("DryRun") => StatusCode::NO_CONTENT,
        _ => StatusCode::OK,
    };

    let mut builder = Response::builder()
        .status(status)
        .header("X-Amz-Executed-Version", &canned.executed_version);

    if let Some(error) = &canned.function_error {
        builder = builder.header("X-Amz-Function-Error", error);
    }
    if let Some(logs) = &canned.log_result {
        builder = builder.header("X-Amz-Log-Result", logs);
    }

    let body = if status == StatusCode::OK {
        Body::from(canned.payload)
    } else {
        Body::empty()
    };

    builder
        .body(body)
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

async fn echo(Json(event): Json<Value>) -> Json<Value> {
    Json(json!({ "echo": event }))
}

async fn fail() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "stub failure").into_response()
}

async fn text() -> Response {
    (StatusCode::OK, "plain text").into_response()
}

fn resource_not_found(function_name: &str) -> Response {
    let message = format!(
        "Function not found: arn:aws:lambda:us-east-1:000000000000:function:{}",
        function_name
    );
    let body = json!({
        "Type": "User",
        "Message": message,
        "message": message
    });

    (
        StatusCode::NOT_FOUND,
        [
            (header::CONTENT_TYPE.as_str(), "application/json"),
            ("x-amzn-ErrorType", "ResourceNotFoundException"),
        ],
        body.to_string(),
    )
        .into_response()
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Region of a SigV4 `Authorization` header, taken from
/// `Credential=<key>/<date>/<region>/<service>/aws4_request`
fn credential_region(authorization: &str) -> Option<String> {
    let scope = authorization.split("Credential=").nth(1)?;
    let scope = scope.split(',').next()?;
    scope.split('/').nth(2).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_region() {
        let authorization = "AWS4-HMAC-SHA256 Credential=test/20240101/eu-west-1/lambda/aws4_request, SignedHeaders=host, Signature=abc";
        assert_eq!(credential_region(authorization).as_deref(), Some("eu-west-1"));
        assert_eq!(credential_region("Bearer token"), None);
    }

    #[tokio::test]
    async fn test_echo_route() {
        let server = StubServer::start().await.unwrap();
        let response = reqwest::Client::new()
            .post(server.endpoint(ECHO_PATH))
            .json(&json!({ "n": 1 }))
            .send()
            .await
            .unwrap();

        assert!(response.status().is_success());
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "echo": { "n": 1 } }));
    }

    #[tokio::test]
    async fn test_unregistered_function() {
        let server = StubServer::start().await.unwrap();
        let response = reqwest::Client::new()
            .post(server.endpoint("/2015-03-31/functions/missing/invocations"))
            .body("{}")
            .send()
            .await
            .unwrap();

        assert_eq!(response.status(), 404);
        assert_eq!(
            response.headers()["x-amzn-ErrorType"],
            "ResourceNotFoundException"
        );
        assert_eq!(server.requests()[0].function_name, "missing");
    }
}
