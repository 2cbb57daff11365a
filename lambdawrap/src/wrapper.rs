//! Invocation wrapper
//!
//! [`Wrapped`] owns a classified descriptor and its options and exposes the
//! single call surface. `invoke` is the one result-producing operation; `run`
//! adapts it to either a callback or a [`Deferred`] value.

use futures::FutureExt;
use lambdawrap_core::{InvocationError, InvocationId, SharedClientConfig};
use serde_json::Value;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info_span, warn, Instrument};

use crate::completion::{panic_message, Callback, Completion, ContextArg, Deferred, InvocationResult, RunArgs};
use crate::context::{Context, CustomContext};
use crate::descriptor::{Descriptor, Handler};
use crate::http::{HttpTransport, ReqwestHttpTransport};
use crate::lambda::LambdaTransport;
use crate::options::InvocationOptions;
use crate::remote::{self, RemoteTransport};
use crate::strategy::Strategy;

/// Wrap a function unit with the default transports and the process-wide
/// client configuration
pub fn wrap(descriptor: impl Into<Descriptor>, options: InvocationOptions) -> Wrapped {
    Wrapped::builder(descriptor).options(options).build()
}

/// Builder for [`Wrapped`]
pub struct WrappedBuilder {
    descriptor: Descriptor,
    options: InvocationOptions,
    remote: Option<Arc<dyn RemoteTransport>>,
    http: Option<Arc<dyn HttpTransport>>,
    client_config: Option<SharedClientConfig>,
}

impl WrappedBuilder {
    pub fn options(mut self, options: InvocationOptions) -> Self {
        self.options = options;
        self
    }

    pub fn remote_transport(mut self, transport: impl RemoteTransport + 'static) -> Self {
        self.remote = Some(Arc::new(transport));
        self
    }

    pub fn http_transport(mut self, transport: impl HttpTransport + 'static) -> Self {
        self.http = Some(Arc::new(transport));
        self
    }

    /// Use `config` instead of [`SharedClientConfig::global`]
    pub fn client_config(mut self, config: SharedClientConfig) -> Self {
        self.client_config = Some(config);
        self
    }

    pub fn build(self) -> Wrapped {
        let strategy = Strategy::resolve(self.descriptor, &self.options.handler_name);
        debug!(
            strategy = strategy.kind().as_str(),
            handler_name = %self.options.handler_name,
            "Resolved invocation strategy"
        );

        Wrapped {
            inner: Arc::new(Inner {
                strategy,
                options: self.options,
                remote: self.remote.unwrap_or_else(|| Arc::new(LambdaTransport::new())),
                http: self.http.unwrap_or_else(|| Arc::new(ReqwestHttpTransport::new())),
                client_config: self.client_config.unwrap_or_else(SharedClientConfig::global),
            }),
        }
    }
}

struct Inner {
    strategy: Strategy,
    options: InvocationOptions,
    remote: Arc<dyn RemoteTransport>,
    http: Arc<dyn HttpTransport>,
    client_config: SharedClientConfig,
}

/// A wrapped function unit. Cheap to clone; clones share the same unit.
#[derive(Clone)]
pub struct Wrapped {
    inner: Arc<Inner>,
}

impl Wrapped {
    pub fn builder(descriptor: impl Into<Descriptor>) -> WrappedBuilder {
        WrappedBuilder {
            descriptor: descriptor.into(),
            options: InvocationOptions::default(),
            remote: None,
            http: None,
            client_config: None,
        }
    }

    pub fn options(&self) -> &InvocationOptions {
        &self.inner.options
    }

    pub fn strategy(&self) -> &Strategy {
        &self.inner.strategy
    }

    pub fn client_config(&self) -> &SharedClientConfig {
        &self.inner.client_config
    }

    /// Run one invocation to completion.
    ///
    /// Every failure, including a panic in the selected execution path, is
    /// returned as an error.
    pub async fn invoke(&self, event: Value, context: CustomContext) -> InvocationResult {
        let invocation_id = InvocationId::new();
        let span = info_span!(
            "invoke",
            invocation_id = %invocation_id,
            strategy = self.inner.strategy.kind().as_str()
        );

        AssertUnwindSafe(self.dispatch(event, context))
            .catch_unwind()
            .instrument(span)
            .await
            .unwrap_or_else(|panic| Err(InvocationError::Panicked(panic_message(panic.as_ref()))))
    }

    /// Start an invocation.
    ///
    /// `context` may be a [`CustomContext`], `()` or, in the legacy form, a
    /// callback ([`ContextArg::Callback`]) which then replaces `callback`.
    /// With a callback the result is delivered to it and `None` is returned;
    /// otherwise the returned [`Deferred`] resolves with the result. The
    /// invocation starts immediately in both forms, on the current tokio
    /// runtime. Without one the result is [`InvocationError::NoRuntime`].
    pub fn run(
        &self,
        event: Value,
        context: impl Into<ContextArg>,
        callback: Option<Callback>,
    ) -> Option<Deferred> {
        let RunArgs { context, callback } = RunArgs::normalize(context.into(), callback);
        let this = self.clone();

        match callback {
            Some(callback) => {
                match Handle::try_current() {
                    Ok(runtime) => {
                        runtime.spawn(async move {
                            callback(this.invoke(event, context).await);
                        });
                    }
                    Err(_) => {
                        warn!("No tokio runtime, rejecting invocation");
                        callback(Err(InvocationError::NoRuntime));
                    }
                }
                None
            }
            None => Some(Deferred::spawn(async move {
                this.invoke(event, context).await
            })),
        }
    }

    async fn dispatch(&self, event: Value, context: CustomContext) -> InvocationResult {
        let inner = &self.inner;
        match &inner.strategy {
            Strategy::Direct(handler) => run_direct(handler.as_ref(), event, context).await,
            Strategy::Remote(target) => {
                remote::invoke_remote(
                    inner.remote.as_ref(),
                    &inner.client_config,
                    target,
                    &inner.options,
                    &event,
                )
                .await
            }
            Strategy::Http(url) => Ok(inner.http.send_event(&event, url).await?),
            Strategy::Invalid(reason) => Err(reason.to_error()),
        }
    }
}

impl fmt::Debug for Wrapped {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapped")
            .field("strategy", &self.inner.strategy)
            .field("options", &self.inner.options)
            .finish_non_exhaustive()
    }
}

/// Call an in-process handler with a fresh context and wait for its single
/// completion
async fn run_direct(handler: &dyn Handler, event: Value, custom: CustomContext) -> InvocationResult {
    let (completion, rx) = Completion::channel();
    let context = Context::new(completion.clone(), custom);

    match AssertUnwindSafe(handler.handle(event, context)).catch_unwind().await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            completion.complete(Err(InvocationError::Handler(error)));
        }
        Err(panic) => {
            completion.complete(Err(InvocationError::Panicked(panic_message(panic.as_ref()))));
        }
    }
    drop(completion);

    rx.await.unwrap_or_else(|_| Err(InvocationError::NotCompleted))
}
