//! Ready-made interceptors.
//!
//! - [`BearerAuthInterceptor`] - Adds `Authorization: Bearer <token>`
//! - [`BasicAuthInterceptor`] - Adds `Authorization: Basic <base64>`
//! - [`LoggingInterceptor`] - Logs every call, including short-circuits
//! - [`ResponseCache`] - In-memory GET cache driven by [`crate::CacheDirective`]
//!
//! # Example
//!
//! ```ignore
//! use parcel::prelude::*;
//! use parcel::interceptors::{BearerAuthInterceptor, ResponseCache};
//!
//! let client = Client::builder(HyperTransport::new(), base_url)
//!     .interceptor(ResponseCache::new())
//!     .interceptor(BearerAuthInterceptor::new("my-token"))
//!     .build();
//! ```

mod auth;
mod cache;
mod logging;

pub use auth::{BasicAuthInterceptor, BearerAuthInterceptor};
pub use cache::{DEFAULT_CACHE_CAPACITY, ResponseCache};
pub use logging::LoggingInterceptor;
