//! Remote invocation
//!
//! Issues the call through a [`RemoteTransport`] and normalizes the raw
//! result: the payload is decoded, and a result flagged with a function error
//! becomes a [`FunctionError`] carrying the remote message plus every field of
//! the raw result.

use async_trait::async_trait;
use bytes::Bytes;
use lambdawrap_core::{
    ClientConfig, FunctionError, InvocationError, SharedClientConfig, TransportError,
};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::codec::{decode_payload, encode_event};
use crate::options::{InvocationOptions, InvocationType, LogType};
use crate::strategy::RemoteTarget;

/// Request handed to the remote transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    pub function_name: String,
    pub invocation_type: InvocationType,
    pub log_type: LogType,
    /// JSON-encoded event
    pub payload: String,
}

/// Raw result returned by the remote transport
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokeOutput {
    pub status_code: i32,
    pub payload: Option<Bytes>,
    /// Set when the function ran and failed (`Handled` or `Unhandled`)
    pub function_error: Option<String>,
    pub log_result: Option<String>,
    pub executed_version: Option<String>,
    /// Any further transport metadata
    pub metadata: Map<String, Value>,
}

impl InvokeOutput {
    pub fn success(payload: impl Into<Bytes>) -> Self {
        Self {
            status_code: 200,
            payload: Some(payload.into()),
            ..Default::default()
        }
    }

    /// Result of a function that ran and failed; the service still answers 200
    pub fn function_error(kind: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        Self {
            status_code: 200,
            payload: Some(payload.into()),
            function_error: Some(kind.into()),
            ..Default::default()
        }
    }

    pub fn with_log_result(mut self, log_result: impl Into<String>) -> Self {
        self.log_result = Some(log_result.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Every field present on the result, keyed the way the service names them
    pub fn fields(&self) -> Map<String, Value> {
        let mut fields = Map::new();
        fields.insert("StatusCode".to_string(), json!(self.status_code));
        if let Some(payload) = &self.payload {
            fields.insert(
                "Payload".to_string(),
                Value::String(String::from_utf8_lossy(payload).into_owned()),
            );
        }
        if let Some(function_error) = &self.function_error {
            fields.insert("FunctionError".to_string(), json!(function_error));
        }
        if let Some(log_result) = &self.log_result {
            fields.insert("LogResult".to_string(), json!(log_result));
        }
        if let Some(version) = &self.executed_version {
            fields.insert("ExecutedVersion".to_string(), json!(version));
        }
        fields.extend(self.metadata.clone());
        fields
    }
}

/// Transport that invokes a remote function by name
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Invoke with the client settings current at call time
    async fn invoke(
        &self,
        config: &ClientConfig,
        request: InvokeRequest,
    ) -> Result<InvokeOutput, TransportError>;
}

/// Invoke `target` and normalize the result.
///
/// A region on the target is written into `client_config` first and stays
/// there for later calls.
pub(crate) async fn invoke_remote(
    transport: &dyn RemoteTransport,
    client_config: &SharedClientConfig,
    target: &RemoteTarget,
    options: &InvocationOptions,
    event: &Value,
) -> Result<Value, InvocationError> {
    if let Some(region) = &target.region {
        debug!(region = %region, "Updating client region");
        client_config.update_region(region.clone());
    }

    let request = InvokeRequest {
        function_name: target.function_name.clone(),
        invocation_type: options.invocation_type,
        log_type: options.log_type,
        payload: encode_event(event)?,
    };

    info!(
        function_name = %request.function_name,
        invocation_type = request.invocation_type.as_str(),
        payload_size = request.payload.len(),
        "Invoke"
    );

    let config = client_config.snapshot();
    let output = transport.invoke(&config, request).await.map_err(|e| {
        warn!(error = %e, "Remote invocation failed");
        e
    })?;

    decode_output(output)
}

/// Decode a raw result into the function's return value or its error
pub fn decode_output(output: InvokeOutput) -> Result<Value, InvocationError> {
    let payload = decode_payload(output.payload.as_deref());

    if let Some(kind) = &output.function_error {
        let message = match payload.get("errorMessage") {
            Some(Value::String(message)) => message.clone(),
            Some(Value::Null) | None => String::new(),
            Some(other) => other.to_string(),
        };
        debug!(function_error = %kind, error_message = %message, "Function returned an error");
        return Err(FunctionError::new(message).with_fields(output.fields()).into());
    }

    Ok(payload)
}
