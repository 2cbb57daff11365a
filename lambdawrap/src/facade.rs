//! Latest-instance facade
//!
//! Holds the most recently initialized [`Wrapped`] for callers that use the
//! init-then-run convention. [`Facade::global`] backs the free [`init`] and
//! [`run`] functions; a facade can also be owned and passed explicitly.

use lambdawrap_core::InvocationError;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde_json::Value;
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::completion::{Callback, ContextArg, Deferred, RunArgs};
use crate::descriptor::Descriptor;
use crate::options::InvocationOptions;
use crate::wrapper::{wrap, Wrapped};

static GLOBAL: Lazy<Facade> = Lazy::new(Facade::new);

/// Slot holding at most one wrapper; each `init` replaces it
#[derive(Debug, Default)]
pub struct Facade {
    latest: RwLock<Option<Wrapped>>,
}

impl Facade {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide facade
    pub fn global() -> &'static Facade {
        &GLOBAL
    }

    /// Wrap a function unit and make it the current instance
    pub fn init(&self, descriptor: impl Into<Descriptor>, options: InvocationOptions) -> Wrapped {
        self.set(wrap(descriptor, options))
    }

    /// Make `wrapped` the current instance, replacing any previous one
    pub fn set(&self, wrapped: Wrapped) -> Wrapped {
        if self.latest.write().replace(wrapped.clone()).is_some() {
            debug!("Replaced current instance");
        }
        wrapped
    }

    pub fn get(&self) -> Option<Wrapped> {
        self.latest.read().clone()
    }

    /// Clear the current instance, returning it
    pub fn reset(&self) -> Option<Wrapped> {
        self.latest.write().take()
    }

    /// Run against the current instance.
    ///
    /// - No instance: the callback, if any, receives
    ///   [`InvocationError::NotInitialized`] and a rejected [`Deferred`] is
    ///   returned as well.
    /// - Instance in `Event` mode: the invocation is dispatched and not
    ///   observed. The callback is never called and `None` is returned.
    /// - Otherwise behaves like [`Wrapped::run`].
    pub fn run(
        &self,
        event: Value,
        context: impl Into<ContextArg>,
        callback: Option<Callback>,
    ) -> Option<Deferred> {
        let RunArgs { context, callback } = RunArgs::normalize(context.into(), callback);

        let Some(latest) = self.get() else {
            warn!("Run called before init");
            if let Some(callback) = callback {
                callback(Err(InvocationError::NotInitialized));
            }
            return Some(Deferred::rejected(InvocationError::NotInitialized));
        };

        if latest.options().invocation_type.is_fire_and_forget() {
            let Ok(runtime) = Handle::try_current() else {
                warn!("No tokio runtime, dropping fire-and-forget invocation");
                return None;
            };
            debug!("Dispatching fire-and-forget invocation");
            runtime.spawn(async move {
                if let Err(e) = latest.invoke(event, context).await {
                    warn!(error = %e, "Fire-and-forget invocation failed");
                }
            });
            return None;
        }

        latest.run(event, context, callback)
    }
}

/// Initialize the process-wide facade
pub fn init(descriptor: impl Into<Descriptor>, options: InvocationOptions) -> Wrapped {
    Facade::global().init(descriptor, options)
}

/// Run against the process-wide facade
pub fn run(event: Value, context: impl Into<ContextArg>, callback: Option<Callback>) -> Option<Deferred> {
    Facade::global().run(event, context, callback)
}
