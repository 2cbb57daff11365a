//! Uniform invocation of function units
//!
//! Wraps an in-process handler, a remote Lambda function or an HTTP endpoint
//! behind one call surface. Results are delivered through a callback or a
//! deferred value.

pub mod codec;
pub mod completion;
pub mod context;
pub mod descriptor;
pub mod facade;
pub mod http;
pub mod lambda;
pub mod options;
pub mod remote;
pub mod strategy;
pub mod wrapper;

pub use completion::{callback, Callback, Completion, ContextArg, Deferred, InvocationResult};
pub use context::{Context, CustomContext};
pub use descriptor::{handler_fn, Descriptor, Export, Handler, HandlerFn, Module};
pub use facade::{init, run, Facade};
pub use http::{HttpTransport, ReqwestHttpTransport};
pub use lambda::LambdaTransport;
pub use options::{InvocationOptions, InvocationType, LogType};
pub use remote::{decode_output, InvokeOutput, InvokeRequest, RemoteTransport};
pub use strategy::{RemoteTarget, Strategy, StrategyKind};
pub use wrapper::{wrap, Wrapped, WrappedBuilder};

pub use lambdawrap_core::{
    BoxError, ClientConfig, ErrorKind, FunctionError, InvocationError, SharedClientConfig,
    StaticCredentials, TransportError,
};
