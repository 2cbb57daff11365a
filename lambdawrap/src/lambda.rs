//! AWS Lambda transport
//!
//! A client is built for every call from the client configuration current at
//! call time, so a region written by an earlier invocation is picked up.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_lambda::config::{Credentials, Region};
use aws_sdk_lambda::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_lambda::operation::RequestId;
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::Client;
use bytes::Bytes;
use lambdawrap_core::{ClientConfig, TransportError};
use serde_json::{json, Map};
use tracing::debug;

use crate::remote::{InvokeOutput, InvokeRequest, RemoteTransport};

const CREDENTIALS_PROVIDER: &str = "lambdawrap";

/// [`RemoteTransport`] backed by `aws-sdk-lambda`
#[derive(Debug, Clone, Copy, Default)]
pub struct LambdaTransport;

impl LambdaTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl RemoteTransport for LambdaTransport {
    async fn invoke(
        &self,
        config: &ClientConfig,
        request: InvokeRequest,
    ) -> Result<InvokeOutput, TransportError> {
        let client = build_client(config).await;

        let output = client
            .invoke()
            .function_name(request.function_name)
            .invocation_type(aws_sdk_lambda::types::InvocationType::from(
                request.invocation_type.as_str(),
            ))
            .log_type(aws_sdk_lambda::types::LogType::from(request.log_type.as_str()))
            .payload(Blob::new(request.payload.into_bytes()))
            .send()
            .await
            .map_err(transport_error)?;

        let mut metadata = Map::new();
        if let Some(request_id) = output.request_id() {
            metadata.insert("RequestId".to_string(), json!(request_id));
        }

        Ok(InvokeOutput {
            status_code: output.status_code(),
            payload: output.payload().map(|p| Bytes::copy_from_slice(p.as_ref())),
            function_error: output.function_error().map(str::to_string),
            log_result: output.log_result().map(str::to_string),
            executed_version: output.executed_version().map(str::to_string),
            metadata,
        })
    }
}

async fn build_client(config: &ClientConfig) -> Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());

    if let Some(region) = &config.region {
        loader = loader.region(Region::new(region.clone()));
    }
    if let Some(endpoint_url) = &config.endpoint_url {
        debug!(endpoint_url = %endpoint_url, "Using custom Lambda endpoint");
        loader = loader.endpoint_url(endpoint_url);
    }
    if let Some(credentials) = &config.credentials {
        loader = loader.credentials_provider(Credentials::new(
            credentials.access_key_id.clone(),
            credentials.secret_access_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        ));
    }

    Client::new(&loader.load().await)
}

fn transport_error<E, R>(error: SdkError<E, R>) -> TransportError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    if let Some(code) = error.code().map(str::to_string) {
        return TransportError::Service {
            code,
            message: error.message().unwrap_or_default().to_string(),
        };
    }

    TransportError::request(DisplayErrorContext(error).to_string())
}
