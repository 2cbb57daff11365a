//! Invocation options

use serde::{Deserialize, Serialize};

/// Default name of the entry point looked up on a handler module
pub const DEFAULT_HANDLER_NAME: &str = "handler";

/// Invocation type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InvocationType {
    /// Synchronous invocation (wait for response)
    #[default]
    RequestResponse,
    /// Asynchronous invocation (fire and forget)
    Event,
    /// Validation only (don't actually invoke)
    DryRun,
}

impl InvocationType {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "RequestResponse" => Some(Self::RequestResponse),
            "Event" => Some(Self::Event),
            "DryRun" => Some(Self::DryRun),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestResponse => "RequestResponse",
            Self::Event => "Event",
            Self::DryRun => "DryRun",
        }
    }

    pub fn is_fire_and_forget(&self) -> bool {
        matches!(self, Self::Event)
    }
}

/// Whether the remote service should return the tail of the execution log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogType {
    #[default]
    None,
    Tail,
}

impl LogType {
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "None" => Some(Self::None),
            "Tail" => Some(Self::Tail),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Tail => "Tail",
        }
    }
}

/// Options fixed for the lifetime of a wrapper
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InvocationOptions {
    /// Name of the entry point looked up on a handler module
    #[serde(alias = "handler")]
    pub handler_name: String,
    #[serde(alias = "InvocationType")]
    pub invocation_type: InvocationType,
    #[serde(alias = "LogType")]
    pub log_type: LogType,
}

impl Default for InvocationOptions {
    fn default() -> Self {
        Self {
            handler_name: DEFAULT_HANDLER_NAME.to_string(),
            invocation_type: InvocationType::RequestResponse,
            log_type: LogType::None,
        }
    }
}

impl InvocationOptions {
    pub fn with_handler_name(mut self, name: impl Into<String>) -> Self {
        self.handler_name = name.into();
        self
    }

    pub fn with_invocation_type(mut self, invocation_type: InvocationType) -> Self {
        self.invocation_type = invocation_type;
        self
    }

    pub fn with_log_type(mut self, log_type: LogType) -> Self {
        self.log_type = log_type;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let options = InvocationOptions::default();
        assert_eq!(options.handler_name, "handler");
        assert_eq!(options.invocation_type, InvocationType::RequestResponse);
        assert_eq!(options.log_type, LogType::None);
    }

    #[test]
    fn test_deserialize_with_legacy_keys() {
        let options: InvocationOptions = serde_json::from_value(json!({
            "handler": "main",
            "InvocationType": "Event",
            "LogType": "Tail"
        }))
        .unwrap();

        assert_eq!(options.handler_name, "main");
        assert!(options.invocation_type.is_fire_and_forget());
        assert_eq!(options.log_type, LogType::Tail);
    }

    #[test]
    fn test_deserialize_partial() {
        let options: InvocationOptions =
            serde_json::from_value(json!({ "invocationType": "DryRun" })).unwrap();

        assert_eq!(options.handler_name, DEFAULT_HANDLER_NAME);
        assert_eq!(options.invocation_type, InvocationType::DryRun);
    }

    #[test]
    fn test_parse_invocation_type() {
        assert_eq!(InvocationType::from_str("Event"), Some(InvocationType::Event));
        assert_eq!(InvocationType::from_str("event"), None);
        assert_eq!(LogType::from_str("Tail").map(|t| t.as_str()), Some("Tail"));
    }
}
