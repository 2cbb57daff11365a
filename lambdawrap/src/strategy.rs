//! Execution strategy selection

use lambdawrap_core::InvocationError;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::descriptor::{Descriptor, Export, Handler};

/// Remote function targeted by a remote invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteTarget {
    pub function_name: String,
    pub region: Option<String>,
}

/// Why a descriptor cannot be invoked
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Unusable {
    /// The entry point exists but is not a handler
    NotCallable,
    /// Neither a handler export nor a remote function name
    NoTarget,
}

impl Unusable {
    pub fn to_error(&self) -> InvocationError {
        match self {
            Self::NotCallable => InvocationError::InvalidHandler,
            Self::NoTarget => InvocationError::Unresolved(
                "descriptor has no handler export and no function name".to_string(),
            ),
        }
    }
}

/// How a wrapper executes its invocations, decided once at construction
#[derive(Clone)]
pub enum Strategy {
    /// Call an in-process handler
    Direct(Arc<dyn Handler>),
    /// Invoke a function through the remote transport
    Remote(RemoteTarget),
    /// Send the event to an HTTP endpoint
    Http(String),
    /// Reported through the completion path on every call
    Invalid(Unusable),
}

/// Tag of a [`Strategy`], without its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Direct,
    Remote,
    Http,
    Invalid,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::Remote => "remote",
            Self::Http => "http",
            Self::Invalid => "invalid",
        }
    }
}

impl Strategy {
    /// Classify a descriptor. A module's export under `handler_name` wins over
    /// any remote function name the module also carries.
    pub fn resolve(descriptor: Descriptor, handler_name: &str) -> Self {
        let module = match descriptor {
            Descriptor::Endpoint(url) => return Self::Http(url),
            Descriptor::Module(module) => module,
        };

        match module.export(handler_name) {
            Some(Export::Handler(handler)) => return Self::Direct(handler.clone()),
            Some(Export::Value(value)) if !is_empty_export(value) => {
                return Self::Invalid(Unusable::NotCallable)
            }
            _ => {}
        }

        match module.function_name() {
            Some(function_name) => Self::Remote(RemoteTarget {
                function_name: function_name.to_string(),
                region: module.region().map(str::to_string),
            }),
            None => Self::Invalid(Unusable::NoTarget),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Direct(_) => StrategyKind::Direct,
            Self::Remote(_) => StrategyKind::Remote,
            Self::Http(_) => StrategyKind::Http,
            Self::Invalid(_) => StrategyKind::Invalid,
        }
    }
}

/// `null`, `false`, zero and `""` under the entry-point name count as no
/// export at all
fn is_empty_export(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

impl fmt::Debug for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(_) => f.write_str("Direct(..)"),
            Self::Remote(target) => f.debug_tuple("Remote").field(target).finish(),
            Self::Http(url) => f.debug_tuple("Http").field(url).finish(),
            Self::Invalid(reason) => f.debug_tuple("Invalid").field(reason).finish(),
        }
    }
}
