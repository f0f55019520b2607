//! HTTP response handling.
//!
//! [`Response`] is what a transport returns and what response interceptors
//! rewrite. [`TypedResponse`] is what callers get back: the status plus the
//! payload decoded into the type they asked for.

use bytes::Bytes;

use crate::{Error, Headers, Result};

/// Status reported when a request interceptor served the response.
pub const SHORT_CIRCUIT_STATUS: u16 = 298;

/// Status reported when the transport did not provide one.
pub const UNKNOWN_STATUS: u16 = 299;

// ============================================================================
// Raw Response
// ============================================================================

/// Raw HTTP response: optional status, headers and body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    status: Option<u16>,
    headers: Headers,
    body: Bytes,
}

impl Response {
    /// Creates a response with a known status.
    #[must_use]
    pub fn new(status: u16, headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            status: Some(status),
            headers,
            body: body.into(),
        }
    }

    /// Creates a response whose status the transport could not report.
    #[must_use]
    pub fn without_status(headers: Headers, body: impl Into<Bytes>) -> Self {
        Self {
            status: None,
            headers,
            body: body.into(),
        }
    }

    /// HTTP status code, if known.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        self.status
    }

    /// Response headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Single header value by name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Response body.
    #[must_use]
    pub const fn body(&self) -> &Bytes {
        &self.body
    }

    /// Status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_some_and(|status| (200..300).contains(&status))
    }

    /// Copy with a different status.
    #[must_use]
    pub const fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Copy with a different body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Copy with a header set (overwriting).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Consume into (status, headers, body).
    #[must_use]
    pub fn into_parts(self) -> (Option<u16>, Headers, Bytes) {
        (self.status, self.headers, self.body)
    }
}

// ============================================================================
// Typed Response
// ============================================================================

/// Status plus decoded payload.
///
/// The payload is `None` when the decoder produced no value, e.g. a text
/// payload that is not valid UTF-8.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedResponse<T> {
    status: u16,
    headers: Headers,
    payload: Option<T>,
}

impl<T> TypedResponse<T> {
    /// Creates a typed response.
    #[must_use]
    pub const fn new(status: u16, headers: Headers, payload: Option<T>) -> Self {
        Self {
            status,
            headers,
            payload,
        }
    }

    /// Status code. [`SHORT_CIRCUIT_STATUS`] when an interceptor served it,
    /// [`UNKNOWN_STATUS`] when the transport reported none.
    #[must_use]
    pub const fn status(&self) -> u16 {
        self.status
    }

    /// Response headers (empty for short-circuited responses).
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Decoded payload.
    #[must_use]
    pub const fn payload(&self) -> Option<&T> {
        self.payload.as_ref()
    }

    /// Consume into the decoded payload.
    #[must_use]
    pub fn into_payload(self) -> Option<T> {
        self.payload
    }

    /// `true` iff the status is in 200..=299 and is not one of the
    /// [`SHORT_CIRCUIT_STATUS`] / [`UNKNOWN_STATUS`] sentinels.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self.status, 200..=299)
            && self.status != SHORT_CIRCUIT_STATUS
            && self.status != UNKNOWN_STATUS
    }

    /// `true` when a request interceptor served this response.
    #[must_use]
    pub const fn is_short_circuited(&self) -> bool {
        self.status == SHORT_CIRCUIT_STATUS
    }

    /// Status is 4xx.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        self.status >= 400 && self.status < 500
    }

    /// Status is 5xx.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status >= 500 && self.status < 600
    }

    /// Fail with [`Error::Http`] on a 4xx or 5xx status.
    pub fn error_for_status(self) -> Result<Self> {
        if self.status >= 400 {
            Err(Error::http(self.status))
        } else {
            Ok(self)
        }
    }

    /// Transform the payload with a function.
    pub fn map<U, F>(self, f: F) -> TypedResponse<U>
    where
        F: FnOnce(T) -> U,
    {
        TypedResponse {
            status: self.status,
            headers: self.headers,
            payload: self.payload.map(f),
        }
    }
}
