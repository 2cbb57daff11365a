//! Function-unit descriptors
//!
//! A descriptor names the thing being invoked: a module exporting an
//! in-process handler, a remote function (optionally pinned to a region), or
//! an HTTP endpoint.

use async_trait::async_trait;
use lambdawrap_core::{BoxError, InvocationError};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::context::Context;

/// In-process function unit
#[async_trait]
pub trait Handler: Send + Sync {
    /// Handle one event. The outcome is signaled through `context`; it may be
    /// signaled after this returns, from any task holding a clone of the
    /// context. A returned error completes the invocation with that error.
    async fn handle(&self, event: Value, context: Context) -> Result<(), BoxError>;
}

/// Handler built from an async closure that returns its result
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap an async closure as a [`Handler`]. The closure's result completes the
/// invocation.
pub fn handler_fn<F, Fut>(f: F) -> HandlerFn<F>
where
    F: Fn(Value, Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, BoxError>> + Send,
{
    HandlerFn { f }
}

#[async_trait]
impl<F, Fut> Handler for HandlerFn<F>
where
    F: Fn(Value, Context) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Value, BoxError>> + Send,
{
    async fn handle(&self, event: Value, context: Context) -> Result<(), BoxError> {
        let result = (self.f)(event, context.clone()).await;
        context
            .completion()
            .complete(result.map_err(InvocationError::Handler));
        Ok(())
    }
}

/// A named export of a module
#[derive(Clone)]
pub enum Export {
    Handler(Arc<dyn Handler>),
    /// Non-callable export; selecting it as the entry point is an error
    Value(Value),
}

impl fmt::Debug for Export {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Handler(_) => f.write_str("Handler(..)"),
            Self::Value(v) => f.debug_tuple("Value").field(v).finish(),
        }
    }
}

/// Module-shaped descriptor.
///
/// May carry handler exports and a remote function name at the same time; a
/// handler under the configured entry-point name takes precedence.
#[derive(Debug, Clone, Default)]
pub struct Module {
    exports: HashMap<String, Export>,
    function_name: Option<String>,
    region: Option<String>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    /// Descriptor of a remote function
    pub fn remote(function_name: impl Into<String>) -> Self {
        Self::new().with_function_name(function_name)
    }

    pub fn with_handler(self, name: impl Into<String>, handler: impl Handler + 'static) -> Self {
        self.with_export(name, Export::Handler(Arc::new(handler)))
    }

    pub fn with_value(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.with_export(name, Export::Value(value.into()))
    }

    pub fn with_export(mut self, name: impl Into<String>, export: Export) -> Self {
        self.exports.insert(name.into(), export);
        self
    }

    pub fn with_function_name(mut self, function_name: impl Into<String>) -> Self {
        self.function_name = Some(function_name.into());
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn export(&self, name: &str) -> Option<&Export> {
        self.exports.get(name)
    }

    pub fn function_name(&self) -> Option<&str> {
        self.function_name.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }
}

/// Function-unit descriptor
#[derive(Debug, Clone)]
pub enum Descriptor {
    /// URL of an HTTP-invokable function unit
    Endpoint(String),
    Module(Module),
}

impl Descriptor {
    /// Module exporting `handler` under the default entry-point name
    pub fn handler(handler: impl Handler + 'static) -> Self {
        Self::Module(Module::new().with_handler(crate::options::DEFAULT_HANDLER_NAME, handler))
    }

    pub fn remote(function_name: impl Into<String>) -> Self {
        Self::Module(Module::remote(function_name))
    }

    pub fn endpoint(url: impl Into<String>) -> Self {
        Self::Endpoint(url.into())
    }
}

impl From<Module> for Descriptor {
    fn from(module: Module) -> Self {
        Self::Module(module)
    }
}

impl From<&str> for Descriptor {
    fn from(url: &str) -> Self {
        Self::Endpoint(url.to_string())
    }
}

impl From<String> for Descriptor {
    fn from(url: String) -> Self {
        Self::Endpoint(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_remote_module() {
        let module = Module::remote("orders").with_region("eu-west-1");
        assert_eq!(module.function_name(), Some("orders"));
        assert_eq!(module.region(), Some("eu-west-1"));
        assert!(module.export("handler").is_none());
    }

    #[test]
    fn test_exports() {
        let module = Module::new()
            .with_handler("main", handler_fn(|event, _ctx| async move { Ok::<_, BoxError>(event) }))
            .with_value("version", json!("1.0"));

        assert!(matches!(module.export("main"), Some(Export::Handler(_))));
        assert!(matches!(module.export("version"), Some(Export::Value(v)) if v == "1.0"));
    }

    #[test]
    fn test_string_is_endpoint() {
        let descriptor = Descriptor::from("https://example.com/fn");
        assert!(matches!(descriptor, Descriptor::Endpoint(url) if url == "https://example.com/fn"));
    }
}
