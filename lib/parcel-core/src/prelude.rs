//! Prelude module for convenient imports.
//!
//! ```ignore
//! use parcel_core::prelude::*;
//! ```

pub use crate::{
    Body, CacheDirective, CancellationToken, Client, Decode, Error, Exchange, Form, Headers,
    InterceptFuture, Interceptor, Json, Method, MultipartFile, Record, Request, RequestBuilder,
    RequestOutcome, Response, Result, ToWire, Transport, TypedResponse, Url, WireMap, WireValue,
};
