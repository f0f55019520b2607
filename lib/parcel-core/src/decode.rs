//! Response body decoding.
//!
//! The result type of a call picks the decoding strategy through [`Decode`]:
//!
//! | Type | Payload |
//! |------|---------|
//! | [`Bytes`], `Vec<u8>` | body verbatim |
//! | [`String`] | UTF-8 text, `None` when invalid |
//! | `()` | body ignored |
//! | [`Json<T>`], [`serde_json::Value`] | structured JSON decode |

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::{DecodingError, DecodingErrorKind, Error, Headers, Result, TypedResponse};

/// Decoding strategy for a response payload type.
pub trait Decode: Sized {
    /// Decode a body. `Ok(None)` means "no value" rather than a failure.
    fn decode(body: &Bytes) -> Result<Option<Self>>;
}

impl Decode for Bytes {
    fn decode(body: &Bytes) -> Result<Option<Self>> {
        Ok(Some(body.clone()))
    }
}

impl Decode for Vec<u8> {
    fn decode(body: &Bytes) -> Result<Option<Self>> {
        Ok(Some(body.to_vec()))
    }
}

impl Decode for String {
    fn decode(body: &Bytes) -> Result<Option<Self>> {
        Ok(Self::from_utf8(body.to_vec()).ok())
    }
}

impl Decode for () {
    fn decode(_body: &Bytes) -> Result<Option<Self>> {
        Ok(Some(()))
    }
}

impl Decode for serde_json::Value {
    fn decode(body: &Bytes) -> Result<Option<Self>> {
        from_json(body).map(Some)
    }
}

/// Structured JSON payload.
///
/// ```ignore
/// let response = client.get("users/1").send::<Json<User>>().await?;
/// let user: Option<User> = response.into_payload().map(Json::into_inner);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    /// Unwrap the decoded value.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T: DeserializeOwned> Decode for Json<T> {
    fn decode(body: &Bytes) -> Result<Option<Self>> {
        from_json(body).map(|value| Some(Self(value)))
    }
}

impl<T> TypedResponse<Json<T>> {
    /// Consume into the decoded JSON value.
    #[must_use]
    pub fn into_json(self) -> Option<T> {
        self.into_payload().map(Json::into_inner)
    }
}

/// Deserialize JSON bytes with path-aware errors.
///
/// # Errors
///
/// Returns [`Error::Decoding`] carrying the coding path and the kind of
/// mismatch.
///
/// # Example
///
/// ```
/// use parcel_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct User { name: String }
///
/// let user: User = from_json(br#"{"name":"Alice"}"#).expect("deserialize");
/// assert_eq!(user, User { name: "Alice".to_string() });
/// ```
pub fn from_json<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize(&mut deserializer).map_err(decoding_error)?;
    deserializer
        .end()
        .map_err(|err| Error::Decoding(classify(&err, Vec::new())))?;
    Ok(value)
}

/// Build a [`TypedResponse`] from a status and body.
pub fn decode_response<T: Decode>(
    status: u16,
    headers: Headers,
    body: &Bytes,
) -> Result<TypedResponse<T>> {
    let payload = T::decode(body)?;
    Ok(TypedResponse::new(status, headers, payload))
}

fn decoding_error(err: serde_path_to_error::Error<serde_json::Error>) -> Error {
    let path = err
        .path()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>();
    Error::Decoding(classify(err.inner(), path))
}

fn classify(err: &serde_json::Error, path: Vec<String>) -> DecodingError {
    let message = strip_position(&err.to_string()).to_string();
    let kind = match err.classify() {
        Category::Syntax | Category::Eof | Category::Io => DecodingErrorKind::DataCorrupted,
        Category::Data => classify_data(&message),
    };
    DecodingError::new(kind, path, message)
}

fn classify_data(message: &str) -> DecodingErrorKind {
    if let Some(rest) = message.strip_prefix("missing field `") {
        let key = rest.split('`').next().unwrap_or_default();
        return DecodingErrorKind::KeyNotFound {
            key: key.to_string(),
        };
    }

    let expected = message
        .split_once(", expected ")
        .map(|(_, expected)| expected.to_string());

    match expected {
        Some(expected) if message.starts_with("invalid type: null") => {
            DecodingErrorKind::ValueNotFound { expected }
        }
        Some(expected)
            if message.starts_with("invalid type")
                || message.starts_with("invalid value")
                || message.starts_with("invalid length") =>
        {
            DecodingErrorKind::TypeMismatch { expected }
        }
        _ => DecodingErrorKind::Unknown,
    }
}

fn strip_position(message: &str) -> &str {
    message
        .rfind(" at line ")
        .and_then(|index| message.get(..index))
        .unwrap_or(message)
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Deserialize)]
    struct User {
        id: u64,
        name: String,
        address: Address,
    }

    #[derive(Debug, PartialEq, Deserialize)]
    struct Address {
        city: String,
    }

    fn decode_err<T: Decode>(body: &'static [u8]) -> DecodingError {
        match T::decode(&Bytes::from_static(body)) {
            Err(Error::Decoding(err)) => err,
            other => panic!("expected decoding error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn same_bytes_three_ways() {
        let body = Bytes::from_static(b"hello");

        let raw = Bytes::decode(&body).expect("raw").expect("payload");
        assert_eq!(raw, body);

        let text = String::decode(&body).expect("text").expect("payload");
        assert_eq!(text, "hello");

        let err = decode_err::<Json<User>>(b"hello");
        assert_eq!(err.kind(), &DecodingErrorKind::DataCorrupted);
    }

    #[test]
    fn invalid_utf8_text_is_none() {
        let body = Bytes::from_static(&[0xFF, 0xFE]);
        assert_eq!(String::decode(&body).expect("never fails"), None);
    }

    #[test]
    fn json_decodes() {
        let body = Bytes::from_static(br#"{"id":1,"name":"Ada","address":{"city":"London"}}"#);
        let user = Json::<User>::decode(&body)
            .expect("decodes")
            .expect("payload")
            .into_inner();
        assert_eq!(user.address.city, "London");
    }

    #[test]
    fn missing_key() {
        let err = decode_err::<Json<User>>(br#"{"id":1,"name":"Ada","address":{}}"#);
        assert_eq!(
            err.kind(),
            &DecodingErrorKind::KeyNotFound {
                key: "city".to_string()
            }
        );
        assert_eq!(err.path(), ["address"]);
    }

    #[test]
    fn type_mismatch() {
        let err = decode_err::<Json<User>>(br#"{"id":"one","name":"Ada","address":{"city":"x"}}"#);
        assert_eq!(
            err.kind(),
            &DecodingErrorKind::TypeMismatch {
                expected: "u64".to_string()
            }
        );
        assert_eq!(err.path_string(), "id");
        assert!(!err.message().contains("at line"));
    }

    #[test]
    fn value_not_found() {
        let err = decode_err::<Json<User>>(br#"{"id":1,"name":null,"address":{"city":"x"}}"#);
        assert!(matches!(
            err.kind(),
            DecodingErrorKind::ValueNotFound { .. }
        ));
        assert_eq!(err.path(), ["name"]);
    }

    #[test]
    fn empty_body_is_corrupted() {
        let err = decode_err::<serde_json::Value>(b"");
        assert_eq!(err.kind(), &DecodingErrorKind::DataCorrupted);
        assert!(err.path().is_empty());
    }

    #[test]
    fn trailing_garbage_is_corrupted() {
        let err = decode_err::<serde_json::Value>(b"{} {}");
        assert_eq!(err.kind(), &DecodingErrorKind::DataCorrupted);
    }

    #[test]
    fn decode_response_keeps_status() {
        let response =
            decode_response::<String>(404, Headers::new(), &Bytes::from_static(b"nope"))
                .expect("decodes");
        assert_eq!(response.status(), 404);
        assert_eq!(response.payload().map(String::as_str), Some("nope"));
        assert!(!response.is_success());
    }
}
