//! Error types for parcel.

use std::fmt;

use derive_more::{Display, Error, From};

// ============================================================================
// Decoding Errors
// ============================================================================

/// The shape mismatch behind a [`DecodingError`].
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum DecodingErrorKind {
    /// A required key is absent from the payload.
    #[display("key not found: `{key}`")]
    KeyNotFound {
        /// The missing key.
        key: String,
    },

    /// A value is present but has the wrong type.
    #[display("type mismatch: expected {expected}")]
    TypeMismatch {
        /// Description of the expected type.
        expected: String,
    },

    /// A value was expected but `null` was found.
    #[display("value not found: expected {expected}")]
    ValueNotFound {
        /// Description of the expected type.
        expected: String,
    },

    /// The payload is not valid JSON.
    #[display("data corrupted")]
    DataCorrupted,

    /// Any other decoding failure.
    #[display("unknown decoding error")]
    Unknown,
}

/// A response body did not match the expected result shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct DecodingError {
    kind: DecodingErrorKind,
    path: Vec<String>,
    message: String,
}

impl DecodingError {
    /// Create a decoding error.
    #[must_use]
    pub fn new(kind: DecodingErrorKind, path: Vec<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path,
            message: message.into(),
        }
    }

    /// What went wrong.
    #[must_use]
    pub const fn kind(&self) -> &DecodingErrorKind {
        &self.kind
    }

    /// Coding path to the offending value, outermost first. Empty at the root.
    #[must_use]
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Dotted form of [`Self::path`] (e.g. `user.tags.2`), empty at the root.
    #[must_use]
    pub fn path_string(&self) -> String {
        self.path.join(".")
    }

    /// Underlying decoder message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for DecodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{} at root: {}", self.kind, self.message)
        } else {
            write!(f, "{} at '{}': {}", self.kind, self.path_string(), self.message)
        }
    }
}

// ============================================================================
// Encoding Errors
// ============================================================================

/// A record field could not be converted to a wire value.
#[derive(Debug, Clone, PartialEq, Display, Error)]
pub enum EncodeError {
    /// `NaN` and infinities have no JSON representation.
    #[display("non-finite number: {_0}")]
    NonFiniteNumber(#[error(not(source))] f64),

    /// A hand-written field encoder rejected its value.
    #[display("cannot encode field `{field}`: {message}")]
    Field {
        /// Wire key of the field.
        field: String,
        /// Reason.
        message: String,
    },
}

impl EncodeError {
    /// Create a field-level encoding error.
    #[must_use]
    pub fn field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Field {
            field: field.into(),
            message: message.into(),
        }
    }
}

// ============================================================================
// Status Classification
// ============================================================================

/// Coarse classification of a failing HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum StatusClass {
    /// 400.
    #[display("bad request")]
    BadRequest,
    /// 401.
    #[display("unauthorized request")]
    Unauthorized,
    /// 403.
    #[display("forbidden request")]
    Forbidden,
    /// 404.
    #[display("not found")]
    NotFound,
    /// Any other 4xx.
    #[display("client error")]
    ClientError,
    /// 5xx.
    #[display("server error")]
    ServerError,
    /// Anything else outside the success range.
    #[display("something went wrong")]
    Other,
}

impl StatusClass {
    /// Classify a status code.
    #[must_use]
    pub const fn of(status: u16) -> Self {
        match status {
            400 => Self::BadRequest,
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            402..=499 => Self::ClientError,
            500..=599 => Self::ServerError,
            _ => Self::Other,
        }
    }
}

// ============================================================================
// Error Type
// ============================================================================

/// Main error type for parcel operations.
#[derive(Debug, Display, Error, From)]
pub enum Error {
    /// The path and base URL do not resolve to an absolute URL.
    #[display("invalid URL: {_0}")]
    #[from(skip)]
    InvalidUrl(#[error(not(source))] String),

    /// The response body does not match the expected result type.
    #[display("decoding error: {_0}")]
    #[from]
    Decoding(DecodingError),

    /// A record could not be encoded (strict encoder paths only).
    #[display("encoding error: {_0}")]
    #[from]
    Encode(EncodeError),

    /// Network/connection errors.
    #[display("connection error: {_0}")]
    #[from(skip)]
    Connection(#[error(not(source))] String),

    /// TLS/SSL errors.
    #[display("TLS error: {_0}")]
    #[from(skip)]
    Tls(#[error(not(source))] String),

    /// Request timeout.
    #[display("request timeout")]
    #[from(skip)]
    Timeout,

    /// The transport could not express the request.
    #[display("invalid request: {_0}")]
    #[from(skip)]
    InvalidRequest(#[error(not(source))] String),

    /// Opaque failure reported by a transport.
    #[display("transport error: {_0}")]
    #[from(skip)]
    Transport(#[error(not(source))] String),

    /// An interceptor aborted the dispatch.
    #[display("interceptor '{interceptor}' failed: {message}")]
    #[from(skip)]
    Interceptor {
        /// Name of the failing interceptor.
        interceptor: String,
        /// Reason.
        message: String,
    },

    /// Non-success status, raised by [`crate::TypedResponse::error_for_status`].
    #[display("HTTP error {status}: {class}")]
    #[from(skip)]
    Http {
        /// HTTP status code.
        status: u16,
        /// Classification of the status.
        class: StatusClass,
    },

    /// The dispatch was cancelled before completing.
    #[display("request cancelled")]
    #[from(skip)]
    Cancelled,
}

/// Result type alias using [`crate::Error`].
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create an invalid URL error.
    #[must_use]
    pub fn invalid_url(message: impl Into<String>) -> Self {
        Self::InvalidUrl(message.into())
    }

    /// Create a connection error.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection(message.into())
    }

    /// Create a TLS error.
    #[must_use]
    pub fn tls(message: impl Into<String>) -> Self {
        Self::Tls(message.into())
    }

    /// Create an invalid request error.
    #[must_use]
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Create an opaque transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create an interceptor error.
    #[must_use]
    pub fn interceptor(interceptor: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Interceptor {
            interceptor: interceptor.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error.
    #[must_use]
    pub const fn http(status: u16) -> Self {
        Self::Http {
            status,
            class: StatusClass::of(status),
        }
    }

    /// Returns `true` if this is an invalid URL error.
    #[must_use]
    pub const fn is_invalid_url(&self) -> bool {
        matches!(self, Self::InvalidUrl(_))
    }

    /// Returns `true` if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Returns `true` if this is a connection error.
    #[must_use]
    pub const fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }

    /// Returns `true` if the transport failed (connection, TLS, timeout, opaque).
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Connection(_)
                | Self::Tls(_)
                | Self::Timeout
                | Self::InvalidRequest(_)
                | Self::Transport(_)
        )
    }

    /// Returns `true` if this is a cancellation.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns the decoding details if this is a decoding error.
    #[must_use]
    pub const fn as_decoding(&self) -> Option<&DecodingError> {
        match self {
            Self::Decoding(err) => Some(err),
            _ => None,
        }
    }

    /// Returns the HTTP status code if this is an HTTP error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns `true` for a 401.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Returns `true` for a 403.
    #[must_use]
    pub fn is_forbidden(&self) -> bool {
        self.status() == Some(403)
    }

    /// Returns `true` for a 404.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Returns `true` if this is a client error (4xx).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status().is_some_and(|s| (400..500).contains(&s))
    }

    /// Returns `true` if this is a server error (5xx).
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status().is_some_and(|s| (500..600).contains(&s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        assert_eq!(Error::http(404).to_string(), "HTTP error 404: not found");
        assert_eq!(Error::Timeout.to_string(), "request timeout");
        assert_eq!(
            Error::connection("failed to connect").to_string(),
            "connection error: failed to connect"
        );
        assert_eq!(
            Error::interceptor("auth", "token expired").to_string(),
            "interceptor 'auth' failed: token expired"
        );
        assert_eq!(
            Error::invalid_url("::bad::").to_string(),
            "invalid URL: ::bad::"
        );
    }

    #[test]
    fn decoding_error_display() {
        let err = DecodingError::new(
            DecodingErrorKind::KeyNotFound {
                key: "city".to_string(),
            },
            vec!["user".to_string(), "address".to_string()],
            "missing field `city`",
        );
        assert_eq!(
            err.to_string(),
            "key not found: `city` at 'user.address': missing field `city`"
        );

        let err = DecodingError::new(DecodingErrorKind::DataCorrupted, Vec::new(), "EOF");
        assert_eq!(err.to_string(), "data corrupted at root: EOF");
    }

    #[test]
    fn status_classification() {
        assert_eq!(StatusClass::of(400), StatusClass::BadRequest);
        assert_eq!(StatusClass::of(401), StatusClass::Unauthorized);
        assert_eq!(StatusClass::of(403), StatusClass::Forbidden);
        assert_eq!(StatusClass::of(404), StatusClass::NotFound);
        assert_eq!(StatusClass::of(418), StatusClass::ClientError);
        assert_eq!(StatusClass::of(500), StatusClass::ServerError);
        assert_eq!(StatusClass::of(302), StatusClass::Other);
    }

    #[test]
    fn error_status() {
        let err = Error::http(404);
        assert_eq!(err.status(), Some(404));
        assert!(err.is_not_found());
        assert!(err.is_client_error());
        assert!(!err.is_server_error());

        let err = Error::http(401);
        assert!(err.is_unauthorized());
        assert!(!err.is_forbidden());

        let err = Error::http(500);
        assert!(err.is_server_error());

        assert_eq!(Error::Timeout.status(), None);
    }

    #[test]
    fn error_predicates() {
        assert!(Error::Timeout.is_timeout());
        assert!(Error::Timeout.is_transport());
        assert!(Error::connection("refused").is_connection());
        assert!(Error::transport("boom").is_transport());
        assert!(!Error::Cancelled.is_transport());
        assert!(Error::Cancelled.is_cancelled());
        assert!(Error::invalid_url("x").is_invalid_url());
    }

    #[test]
    fn decoding_converts() {
        let err: Error =
            DecodingError::new(DecodingErrorKind::Unknown, Vec::new(), "odd").into();
        assert!(err.as_decoding().is_some());
    }
}
