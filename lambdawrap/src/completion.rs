//! Completion bridge
//!
//! Every invocation funnels into one [`Completion`]. Callers observe the
//! outcome either through a [`Callback`] or through a [`Deferred`] value;
//! both are adapters over the same result.

use futures::future::{BoxFuture, FutureExt};
use lambdawrap_core::InvocationError;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context as TaskContext, Poll};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::context::CustomContext;

/// Outcome of a single invocation
pub type InvocationResult = Result<Value, InvocationError>;

/// Completion callback supplied by the caller
pub type Callback = Box<dyn FnOnce(InvocationResult) + Send + 'static>;

/// Box a closure as a [`Callback`]
pub fn callback<F>(f: F) -> Callback
where
    F: FnOnce(InvocationResult) + Send + 'static,
{
    Box::new(f)
}

/// The single completion of an invocation. Fires at most once; clones share
/// the same slot.
#[derive(Clone)]
pub struct Completion {
    slot: Arc<Mutex<Option<oneshot::Sender<InvocationResult>>>>,
}

impl Completion {
    /// Create a completion and the receiver its result is delivered to.
    ///
    /// The receiver errors if every clone is dropped without completing.
    pub fn channel() -> (Self, oneshot::Receiver<InvocationResult>) {
        let (tx, rx) = oneshot::channel();
        let completion = Self {
            slot: Arc::new(Mutex::new(Some(tx))),
        };
        (completion, rx)
    }

    /// Deliver the result. Returns `false` if the completion already fired.
    pub fn complete(&self, result: InvocationResult) -> bool {
        let Some(tx) = self.slot.lock().take() else {
            warn!("Completion already signaled, ignoring");
            return false;
        };

        if tx.send(result).is_err() {
            debug!("Completion receiver dropped");
        }
        true
    }

    pub fn is_completed(&self) -> bool {
        self.slot.lock().is_none()
    }
}

impl fmt::Debug for Completion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Completion")
            .field("completed", &self.is_completed())
            .finish()
    }
}

/// Deferred result of an invocation.
///
/// The invocation is already running when the value is created; awaiting it
/// only observes the outcome.
pub struct Deferred {
    inner: BoxFuture<'static, InvocationResult>,
}

impl Deferred {
    /// Spawn `future` on the current tokio runtime. Outside a runtime the
    /// value is rejected with [`InvocationError::NoRuntime`].
    pub(crate) fn spawn<F>(future: F) -> Self
    where
        F: Future<Output = InvocationResult> + Send + 'static,
    {
        let Ok(runtime) = Handle::try_current() else {
            warn!("No tokio runtime, rejecting invocation");
            return Self::rejected(InvocationError::NoRuntime);
        };

        let handle = runtime.spawn(future);
        Self {
            inner: async move {
                handle.await.unwrap_or_else(|e| {
                    if e.is_panic() {
                        Err(InvocationError::Panicked(panic_message(e.into_panic().as_ref())))
                    } else {
                        Err(InvocationError::Panicked(e.to_string()))
                    }
                })
            }
            .boxed(),
        }
    }

    pub fn rejected(error: InvocationError) -> Self {
        Self {
            inner: futures::future::ready(Err(error)).boxed(),
        }
    }
}

impl Future for Deferred {
    type Output = InvocationResult;

    fn poll(mut self: Pin<&mut Self>, cx: &mut TaskContext<'_>) -> Poll<Self::Output> {
        self.inner.poll_unpin(cx)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

/// The argument in context position of `run`
pub enum ContextArg {
    Omitted,
    Context(CustomContext),
    /// Legacy form: the callback passed where the context belongs
    Callback(Callback),
}

impl ContextArg {
    pub fn callback<F>(f: F) -> Self
    where
        F: FnOnce(InvocationResult) + Send + 'static,
    {
        Self::Callback(Box::new(f))
    }
}

impl From<()> for ContextArg {
    fn from((): ()) -> Self {
        Self::Omitted
    }
}

impl From<CustomContext> for ContextArg {
    fn from(context: CustomContext) -> Self {
        Self::Context(context)
    }
}

impl From<Map<String, Value>> for ContextArg {
    fn from(fields: Map<String, Value>) -> Self {
        Self::Context(CustomContext::from(fields))
    }
}

impl From<Callback> for ContextArg {
    fn from(callback: Callback) -> Self {
        Self::Callback(callback)
    }
}

/// Arguments of `run` after resolving the legacy overload
pub(crate) struct RunArgs {
    pub context: CustomContext,
    pub callback: Option<Callback>,
}

impl RunArgs {
    /// A callback in context position replaces both the context (which becomes
    /// empty) and any explicit callback.
    pub(crate) fn normalize(context: ContextArg, callback: Option<Callback>) -> Self {
        match context {
            ContextArg::Callback(legacy) => {
                if callback.is_some() {
                    debug!("Callback passed as context, ignoring explicit callback");
                }
                Self {
                    context: CustomContext::default(),
                    callback: Some(legacy),
                }
            }
            ContextArg::Context(context) => Self { context, callback },
            ContextArg::Omitted => Self {
                context: CustomContext::default(),
                callback,
            },
        }
    }
}

/// Best-effort text of a panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_completion_fires_once() {
        let (completion, rx) = Completion::channel();
        let other = completion.clone();

        assert!(completion.complete(Ok(json!(1))));
        assert!(!other.complete(Ok(json!(2))));
        assert!(other.is_completed());

        assert_eq!(rx.await.unwrap().unwrap(), json!(1));
    }

    #[tokio::test]
    async fn test_completion_dropped() {
        let (completion, rx) = Completion::channel();
        drop(completion);
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_deferred_spawned() {
        let deferred = Deferred::spawn(async { Ok(json!({ "ok": true })) });
        assert_eq!(deferred.await.unwrap(), json!({ "ok": true }));

        let rejected = Deferred::spawn(async { Err(InvocationError::NotInitialized) });
        assert!(matches!(rejected.await, Err(InvocationError::NotInitialized)));
    }

    #[tokio::test]
    async fn test_deferred_spawned_panic() {
        fn explode() -> InvocationResult {
            panic!("kaboom")
        }

        let deferred = Deferred::spawn(async { explode() });
        match deferred.await {
            Err(InvocationError::Panicked(message)) => assert_eq!(message, "kaboom"),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_deferred_outside_runtime() {
        let deferred = Deferred::spawn(async { Ok(json!(1)) });
        let result = futures::executor::block_on(deferred);
        assert!(matches!(result, Err(InvocationError::NoRuntime)));
    }

    #[test]
    fn test_normalize_legacy_callback() {
        let args = RunArgs::normalize(ContextArg::callback(|_| {}), None);
        assert!(args.callback.is_some());
        assert!(args.context.fields().is_empty());
    }

    #[test]
    fn test_normalize_context() {
        let context = CustomContext::new().with_field("functionName", "orders");
        let args = RunArgs::normalize(context.into(), None);
        assert!(args.callback.is_none());
        assert_eq!(args.context.fields()["functionName"], "orders");

        let args = RunArgs::normalize(().into(), Some(callback(|_| {})));
        assert!(args.callback.is_some());
        assert!(args.context.fields().is_empty());
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");

        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
