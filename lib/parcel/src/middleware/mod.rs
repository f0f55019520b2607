//! Tower middleware for the hyper transport.
//!
//! Layers wrap the transport itself, so they only see exchanges that reach
//! the network; interceptor short-circuits never get here. For per-call
//! behavior (authentication, caching) prefer an [`crate::Interceptor`].
//!
//! - [`LoggingLayer`] - Logs requests/responses using `tracing`
//!
//! Any tower layer whose service speaks [`crate::Request`] /
//! [`crate::Response`] can be added with
//! [`crate::HyperTransportBuilder::layer`].

mod logging;

pub use logging::{LogLevel, Logging, LoggingLayer};

// Re-export tower types for convenience
pub use tower::{Layer, ServiceBuilder};
