//! Human-readable failure reports.
//!
//! Every dispatch failure is rendered with [`pretty_error`] and handed to the
//! client's [`DiagnosticSink`] before the error is returned to the caller.

use tracing::warn;

use crate::{DecodingError, DecodingErrorKind, Error};

const RULE: &str = "------------------------";

/// Receives rendered failure reports.
pub trait DiagnosticSink: Send + Sync {
    /// Handle one report.
    fn report(&self, message: &str);
}

impl<F> DiagnosticSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn report(&self, message: &str) {
        self(message);
    }
}

/// Forwards reports to `tracing` at warn level. The default sink.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, message: &str) {
        warn!(target: "parcel::diagnostic", "{message}");
    }
}

/// Discards reports.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl DiagnosticSink for NoopSink {
    fn report(&self, _message: &str) {}
}

/// Render an error as a multi-line report.
///
/// Decoding errors get a kind-specific header, the coding path and a hint:
///
/// ```text
/// ❌ Key Not Found Error
/// ------------------------
/// Missing Key: city
/// Location: address
/// Details: missing field `city`
///
/// 💡 Solution: Please ensure the JSON contains the required key "city"
/// ```
///
/// Other errors render as a generic block with their display text.
#[must_use]
pub fn pretty_error(error: &Error) -> String {
    match error {
        Error::Decoding(err) => pretty_decoding_error(err),
        other => [String::from("❌ Error"), RULE.to_string(), other.to_string()].join("\n"),
    }
}

fn pretty_decoding_error(err: &DecodingError) -> String {
    let location = format!("Location: {}", location(err.path()));
    let details = format!("Details: {}", err.message());

    let lines = match err.kind() {
        DecodingErrorKind::KeyNotFound { key } => vec![
            "❌ Key Not Found Error".to_string(),
            format!("Missing Key: {key}"),
            location,
            details,
            format!("💡 Solution: Please ensure the JSON contains the required key \"{key}\""),
        ],
        DecodingErrorKind::ValueNotFound { expected } => vec![
            "❌ Value Not Found Error".to_string(),
            format!("Expected Type: {expected}"),
            location,
            details,
            "💡 Solution: Please check if the value is null or missing".to_string(),
        ],
        DecodingErrorKind::TypeMismatch { expected } => vec![
            "❌ Type Mismatch Error".to_string(),
            format!("Expected Type: {expected}"),
            location,
            details,
            "💡 Solution: Please ensure the value matches the expected type".to_string(),
        ],
        DecodingErrorKind::DataCorrupted => vec![
            "❌ Data Corrupted Error".to_string(),
            location,
            details,
            "💡 Solution: Please verify the data format is valid".to_string(),
        ],
        DecodingErrorKind::Unknown => vec![
            "❌ Unknown Decoding Error".to_string(),
            details,
            "💡 Solution: Please check the data structure and format".to_string(),
        ],
    };

    // header, rule, body lines, blank line, solution
    let (header, rest) = lines.split_at(1);
    let (body, solution) = rest.split_at(rest.len() - 1);
    let mut out = Vec::with_capacity(lines.len() + 2);
    out.extend_from_slice(header);
    out.push(RULE.to_string());
    out.extend_from_slice(body);
    out.push(String::new());
    out.extend_from_slice(solution);
    out.join("\n")
}

fn location(path: &[String]) -> String {
    if path.is_empty() {
        "Root".to_string()
    } else {
        path.join(" → ")
    }
}
