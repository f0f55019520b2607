//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types, traits and macros
//! for easy glob importing:
//!
//! ```ignore
//! use parcel::prelude::*;
//! ```

pub use crate::{
    BasicAuthInterceptor, BearerAuthInterceptor, Body, CacheDirective, CancellationToken, Client,
    ClientConfig, Decode, Error, Exchange, Form, Headers, HyperTransport, InterceptFuture,
    Interceptor, Json, LoggingInterceptor, Method, MultipartFile, Record, Request, RequestOutcome,
    Response, ResponseCache, Result, StatusCode, ToWire, Transport, TypedResponse, Url, WireValue,
    header,
};
pub use serde::{Deserialize, Serialize};
