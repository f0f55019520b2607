//! Core types and traits for the parcel HTTP client.
//!
//! This crate is transport-agnostic. It provides:
//! - [`ToWire`], [`WireValue`] and [`Record`] - object-to-wire encoding
//! - [`Form`] and [`MultipartFile`] - `multipart/form-data` bodies
//! - [`Request`] and [`RequestBuilder`] - URL resolution, query merge, headers
//! - [`Interceptor`] and [`InterceptorChain`] - request/response hooks
//! - [`Client`] - the dispatch pipeline over any [`Transport`]
//! - [`Decode`] and [`TypedResponse`] - typed payload decoding
//! - [`Error`] and [`Result`] - error handling
//! - [`DiagnosticSink`] and [`pretty_error`] - failure reports
//! - [`StatusCode`] - HTTP status codes (re-exported from `http` crate)
//! - [`header`] - HTTP header names (re-exported from `http` crate)

mod cache;
mod curl;
mod decode;
mod diagnostic;
mod dispatch;
mod error;
mod headers;
mod interceptor;
mod method;
pub mod multipart;
pub mod prelude;
mod record;
mod request;
mod response;
mod transport;
mod wire;

pub use cache::CacheDirective;
pub use decode::{Decode, Json, decode_response, from_json};
pub use diagnostic::{DiagnosticSink, NoopSink, TracingSink, pretty_error};
pub use dispatch::{Body, Call, Client, ClientBuilder};
pub use error::{DecodingError, DecodingErrorKind, EncodeError, Error, Result, StatusClass};
pub use headers::Headers;
pub use interceptor::{
    Exchange, InterceptFuture, Intercepted, Interceptor, InterceptorChain, RequestOutcome,
};
pub use method::Method;
pub use multipart::{Form, MimeResolver, MultipartFile, Part};
pub use record::{NullPolicy, Record};
pub use request::{Request, RequestBuilder, merge_query, resolve_url};
pub use response::{Response, SHORT_CIRCUIT_STATUS, TypedResponse, UNKNOWN_STATUS};
pub use transport::Transport;
pub use wire::{ToWire, WireMap, WireValue};

// Re-export http crate types for status codes and headers
pub use http::{StatusCode, header};

pub use tokio_util::sync::CancellationToken;
pub use url::{self, Url};
