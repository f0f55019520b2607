//! Typed HTTP client with interceptors, multipart forms and record encoding.
//!
//! A [`Client`] resolves paths against a base URL, runs every call through an
//! interceptor chain, sends it over a [`Transport`] and decodes the response
//! into the type the caller asks for.
//!
//! # Example
//!
//! ```ignore
//! use parcel::prelude::*;
//!
//! #[derive(Debug, Deserialize)]
//! pub struct User {
//!     id: u64,
//!     name: String,
//! }
//!
//! #[derive(Record)]
//! #[record(rename_all = "camelCase")]
//! pub struct Search {
//!     name_prefix: String,
//!     page: Option<u32>,
//! }
//!
//! let client = Client::builder(HyperTransport::new(), Url::parse("https://api.example.com/")?)
//!     .interceptor(BearerAuthInterceptor::new("token"))
//!     .build();
//!
//! let users = client
//!     .get("users")
//!     .query_record(&Search { name_prefix: "a".into(), page: Some(2) })
//!     .send::<Json<Vec<User>>>()
//!     .await?;
//! ```

mod config;
mod connector;
pub mod interceptors;
pub mod middleware;
pub mod prelude;
mod transport;

// Re-export transport types
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_USER_AGENT};
pub use interceptors::{
    BasicAuthInterceptor, BearerAuthInterceptor, LoggingInterceptor, ResponseCache,
};
pub use transport::{BoxedService, HyperTransport, HyperTransportBuilder, ServiceFuture};

// Re-export tower for middleware composition
pub use tower;

// Re-export core types
pub use parcel_core::{
    Body, CacheDirective, Call, CancellationToken, Client, ClientBuilder, Decode, DecodingError,
    DecodingErrorKind, DiagnosticSink, EncodeError, Error, Exchange, Form, Headers, InterceptFuture,
    Intercepted, Interceptor, InterceptorChain, Json, Method, MimeResolver, MultipartFile,
    NoopSink, NullPolicy, Part, Record, Request, RequestBuilder, RequestOutcome, Response, Result,
    SHORT_CIRCUIT_STATUS, StatusClass, ToWire, TracingSink, Transport, TypedResponse,
    UNKNOWN_STATUS, Url, WireMap, WireValue, decode_response, from_json, merge_query,
    pretty_error, resolve_url,
};
pub use parcel_core::multipart;

// Re-export http types for status codes and headers
pub use parcel_core::{StatusCode, header};

pub use url;

// Re-export macros
pub use parcel_macro::Record;
