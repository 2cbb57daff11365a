//! Invocation error types

use serde_json::{Map, Value};
use thiserror::Error;

/// Boxed error used for handler-signaled and transport-level failures
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Broad class of an invocation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The descriptor resolves to no usable strategy
    Configuration,
    /// The remote or HTTP call itself could not complete
    Transport,
    /// The remote function ran and signaled failure
    Function,
    /// The legacy facade was used before `init`
    NotInitialized,
    /// The selected execution path failed while running
    Fault,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "ConfigurationError",
            Self::Transport => "TransportError",
            Self::Function => "FunctionError",
            Self::NotInitialized => "NotInitialized",
            Self::Fault => "Fault",
        }
    }
}

/// Failure of the underlying transport
#[derive(Debug, Error)]
pub enum TransportError {
    /// The service answered with an error response
    #[error("{code}: {message}")]
    Service { code: String, message: String },

    /// The endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request could not be sent or its response could not be read
    #[error("Request error: {0}")]
    Request(#[source] BoxError),
}

impl TransportError {
    pub fn request(error: impl Into<BoxError>) -> Self {
        Self::Request(error.into())
    }

    /// Service error code, if the service returned one
    pub fn code(&self) -> Option<&str> {
        match self {
            Self::Service { code, .. } => Some(code),
            _ => None,
        }
    }
}

/// Error reported by a remote function that ran and failed.
///
/// `message` comes from the `errorMessage` of the decoded payload. `fields`
/// holds every field of the raw invocation result (status code, log output,
/// executed version and any extra transport metadata).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct FunctionError {
    pub message: String,
    pub fields: Map<String, Value>,
}

impl FunctionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: Map::new(),
        }
    }

    /// Extend the error with additional fields. Existing keys are overwritten.
    pub fn with_fields(mut self, fields: Map<String, Value>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// `Handled` or `Unhandled`, as reported by the remote service
    pub fn function_error(&self) -> Option<&str> {
        self.field("FunctionError").and_then(Value::as_str)
    }

    /// Format as a JSON object: the fields plus `errorMessage`
    pub fn to_json(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert(
            "errorMessage".to_string(),
            Value::String(self.message.clone()),
        );
        Value::Object(object)
    }
}

/// Error surfaced through the completion path of an invocation
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("Handler is not a function")]
    InvalidHandler,

    #[error("No usable invocation strategy: {0}")]
    Unresolved(String),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Function(#[from] FunctionError),

    #[error("Module not initialized")]
    NotInitialized,

    #[error("{0}")]
    Handler(#[source] BoxError),

    #[error("Handler panicked: {0}")]
    Panicked(String),

    #[error("Handler returned without signaling completion")]
    NotCompleted,

    #[error("Failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("No tokio runtime to run the invocation on")]
    NoRuntime,
}

impl InvocationError {
    /// Wrap an error signaled by a handler
    pub fn handler(error: impl Into<BoxError>) -> Self {
        Self::Handler(error.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidHandler | Self::Unresolved(_) => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Function(_) => ErrorKind::Function,
            Self::NotInitialized => ErrorKind::NotInitialized,
            Self::Handler(_)
            | Self::Panicked(_)
            | Self::NotCompleted
            | Self::Encode(_)
            | Self::NoRuntime => ErrorKind::Fault,
        }
    }

    /// The reconstructed remote error, if this is a functional error
    pub fn as_function_error(&self) -> Option<&FunctionError> {
        match self {
            Self::Function(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_function_error_fields() {
        let mut fields = Map::new();
        fields.insert("FunctionError".to_string(), json!("Unhandled"));
        fields.insert("StatusCode".to_string(), json!(200));

        let error = FunctionError::new("boom").with_fields(fields);
        assert_eq!(error.to_string(), "boom");
        assert_eq!(error.function_error(), Some("Unhandled"));
        assert_eq!(error.field("StatusCode"), Some(&json!(200)));

        let body = error.to_json();
        assert_eq!(body["errorMessage"], "boom");
        assert_eq!(body["StatusCode"], 200);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(InvocationError::InvalidHandler.kind(), ErrorKind::Configuration);
        assert_eq!(InvocationError::NotInitialized.kind(), ErrorKind::NotInitialized);
        assert_eq!(
            InvocationError::handler("nope").kind(),
            ErrorKind::Fault
        );
        assert_eq!(InvocationError::NoRuntime.kind(), ErrorKind::Fault);

        let transport = InvocationError::from(TransportError::Service {
            code: "ResourceNotFoundException".to_string(),
            message: "Function not found".to_string(),
        });
        assert_eq!(transport.kind(), ErrorKind::Transport);
        assert_eq!(
            transport.to_string(),
            "ResourceNotFoundException: Function not found"
        );
    }

    #[test]
    fn test_not_initialized_message() {
        assert_eq!(
            InvocationError::NotInitialized.to_string(),
            "Module not initialized"
        );
        assert_eq!(ErrorKind::NotInitialized.as_str(), "NotInitialized");
    }
}
