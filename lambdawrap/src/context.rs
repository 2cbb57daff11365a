//! Invocation context handed to direct handlers

use lambdawrap_core::{BoxError, InvocationError};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::completion::Completion;

pub type SucceedHook = Arc<dyn Fn(Value) + Send + Sync>;
pub type FailHook = Arc<dyn Fn(BoxError) + Send + Sync>;
pub type DoneHook = Arc<dyn Fn(Option<BoxError>, Value) + Send + Sync>;

/// Caller-supplied context entries.
///
/// Fields are exposed to the handler as-is. A hook replaces the default
/// completion alias of the same name, so a signal through that alias no
/// longer completes the invocation.
#[derive(Clone, Default)]
pub struct CustomContext {
    fields: Map<String, Value>,
    succeed: Option<SucceedHook>,
    fail: Option<FailHook>,
    done: Option<DoneHook>,
}

impl CustomContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn on_succeed(mut self, hook: impl Fn(Value) + Send + Sync + 'static) -> Self {
        self.succeed = Some(Arc::new(hook));
        self
    }

    pub fn on_fail(mut self, hook: impl Fn(BoxError) + Send + Sync + 'static) -> Self {
        self.fail = Some(Arc::new(hook));
        self
    }

    pub fn on_done(mut self, hook: impl Fn(Option<BoxError>, Value) + Send + Sync + 'static) -> Self {
        self.done = Some(Arc::new(hook));
        self
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

impl From<Map<String, Value>> for CustomContext {
    fn from(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            ..Default::default()
        }
    }
}

impl fmt::Debug for CustomContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomContext")
            .field("fields", &self.fields)
            .field("succeed", &self.succeed.is_some())
            .field("fail", &self.fail.is_some())
            .field("done", &self.done.is_some())
            .finish()
    }
}

/// Context of a single direct invocation.
///
/// `succeed`, `fail` and `done` all route into the invocation's one
/// [`Completion`]; only the first signal counts.
#[derive(Clone, Debug)]
pub struct Context {
    completion: Completion,
    custom: CustomContext,
}

impl Context {
    pub(crate) fn new(completion: Completion, custom: CustomContext) -> Self {
        Self { completion, custom }
    }

    pub fn succeed(&self, value: impl Into<Value>) {
        let value = value.into();
        match &self.custom.succeed {
            Some(hook) => hook(value),
            None => {
                self.completion.complete(Ok(value));
            }
        }
    }

    pub fn fail(&self, error: impl Into<BoxError>) {
        let error = error.into();
        match &self.custom.fail {
            Some(hook) => hook(error),
            None => {
                self.completion.complete(Err(InvocationError::Handler(error)));
            }
        }
    }

    pub fn done(&self, error: Option<BoxError>, value: impl Into<Value>) {
        let value = value.into();
        if let Some(hook) = &self.custom.done {
            hook(error, value);
            return;
        }

        let result = match error {
            Some(error) => Err(InvocationError::Handler(error)),
            None => Ok(value),
        };
        self.completion.complete(result);
    }

    /// The raw completion, for handlers that report through a callback
    pub fn completion(&self) -> &Completion {
        &self.completion
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.custom.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.custom.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn context(custom: CustomContext) -> (Context, tokio::sync::oneshot::Receiver<crate::InvocationResult>) {
        let (completion, rx) = Completion::channel();
        (Context::new(completion, custom), rx)
    }

    #[tokio::test]
    async fn test_succeed() {
        let (ctx, rx) = context(CustomContext::new());
        ctx.succeed(json!({ "ok": true }));
        assert_eq!(rx.await.unwrap().unwrap(), json!({ "ok": true }));
    }

    #[tokio::test]
    async fn test_fail() {
        let (ctx, rx) = context(CustomContext::new());
        ctx.fail("bad input");
        let error = rx.await.unwrap().unwrap_err();
        assert_eq!(error.to_string(), "bad input");
    }

    #[tokio::test]
    async fn test_done_prefers_error() {
        let (ctx, rx) = context(CustomContext::new());
        ctx.done(Some("broken".into()), json!(1));
        assert!(matches!(rx.await.unwrap(), Err(InvocationError::Handler(_))));

        let (ctx, rx) = context(CustomContext::new());
        ctx.done(None, json!(1));
        assert_eq!(rx.await.unwrap().unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_first_signal_wins() {
        let (ctx, rx) = context(CustomContext::new());
        ctx.succeed("first");
        ctx.fail("second");
        ctx.done(None, "third");
        assert_eq!(rx.await.unwrap().unwrap(), json!("first"));
    }

    #[test]
    fn test_fields_visible() {
        let custom = CustomContext::new()
            .with_field("functionName", "orders")
            .with_field("memoryLimitInMB", 128);
        let (ctx, _rx) = context(custom);

        assert_eq!(ctx.get("functionName"), Some(&json!("orders")));
        assert_eq!(ctx.fields().len(), 2);
        assert!(ctx.get("awsRequestId").is_none());
    }

    #[test]
    fn test_hook_overrides_default_alias() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = calls.clone();
        let custom = CustomContext::new().on_succeed(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let (ctx, _rx) = context(custom);

        ctx.succeed("value");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!ctx.completion().is_completed());

        ctx.fail("still routed to the default");
        assert!(ctx.completion().is_completed());
    }
}
