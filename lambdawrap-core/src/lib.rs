//! Core types for lambdawrap
//!
//! This crate provides the error taxonomy, the shared client configuration and
//! invocation ids used by the `lambdawrap` crates.

pub mod client_config;
pub mod error;
pub mod invocation_id;

pub use client_config::{ClientConfig, SharedClientConfig, StaticCredentials};
pub use error::{BoxError, ErrorKind, FunctionError, InvocationError, TransportError};
pub use invocation_id::InvocationId;
