//! HTTP invocation

use async_trait::async_trait;
use lambdawrap_core::TransportError;
use serde_json::Value;
use tracing::{info, warn};

use crate::codec::decode_payload;

/// Transport that sends an event to an HTTP-invokable function unit
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send_event(&self, event: &Value, url: &str) -> Result<Value, TransportError>;
}

/// [`HttpTransport`] that POSTs the event as JSON with `reqwest`.
///
/// The response body is decoded like a remote payload; a non-success status
/// is a transport error.
#[derive(Debug, Clone, Default)]
pub struct ReqwestHttpTransport {
    client: reqwest::Client,
}

impl ReqwestHttpTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestHttpTransport {
    async fn send_event(&self, event: &Value, url: &str) -> Result<Value, TransportError> {
        info!(url = %url, "Sending event over HTTP");

        let response = self
            .client
            .post(url)
            .json(event)
            .send()
            .await
            .map_err(TransportError::request)?;

        let status = response.status();
        let body = response.bytes().await.map_err(TransportError::request)?;

        if !status.is_success() {
            warn!(url = %url, status = status.as_u16(), "HTTP invocation failed");
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }

        Ok(decode_payload(Some(body.as_ref())))
    }
}
