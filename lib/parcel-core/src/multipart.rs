//! `multipart/form-data` bodies built from records or by hand.
//!
//! A [`Form`] is an ordered list of [`Part`]s rendered as
//! `multipart/form-data`. Forms are usually built from a record's wire map:
//! files become file parts, lists repeat the field name, everything else
//! becomes a text field.
//!
//! # Example
//!
//! ```ignore
//! use parcel::multipart::{Form, MultipartFile};
//!
//! let form = Form::new()
//!     .text("name", "John Doe")
//!     .file("avatar", MultipartFile::from_bytes("photo.jpg", photo_bytes));
//!
//! let (content_type, body) = form.into_body();
//! ```

use std::ffi::OsStr;
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use rand::Rng;
use rand::distributions::Alphanumeric;

use crate::{Headers, Record, WireMap, WireValue};

/// Content type used when a file's type cannot be resolved.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Literal prefix of generated boundaries.
pub const BOUNDARY_PREFIX: &str = "----ParcelFormBoundary";

const BOUNDARY_TOKEN_LEN: usize = 70;

// ============================================================================
// MIME Resolution
// ============================================================================

/// Resolves a content type from a file extension.
pub trait MimeResolver: Send + Sync {
    /// Content type for `extension` (without the dot), or `None` if unknown.
    fn resolve(&self, extension: &str) -> Option<String>;
}

/// [`MimeResolver`] backed by the `mime_guess` extension table.
#[derive(Debug, Clone, Copy, Default)]
pub struct GuessMime;

impl MimeResolver for GuessMime {
    fn resolve(&self, extension: &str) -> Option<String> {
        mime_guess::from_ext(extension)
            .first_raw()
            .map(str::to_string)
    }
}

/// Content type for `filename`, falling back to [`DEFAULT_CONTENT_TYPE`].
#[must_use]
pub fn content_type_for(filename: &str, resolver: &dyn MimeResolver) -> String {
    Path::new(filename)
        .extension()
        .and_then(OsStr::to_str)
        .and_then(|extension| resolver.resolve(extension))
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

// ============================================================================
// File Reference
// ============================================================================

/// A file to upload: name, content type and contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartFile {
    filename: String,
    content_type: String,
    data: Bytes,
}

impl MultipartFile {
    /// Create a file with an explicit content type.
    #[must_use]
    pub fn new(
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            filename: filename.into(),
            content_type: content_type.into(),
            data: data.into(),
        }
    }

    /// Create a file whose content type is guessed from its extension.
    #[must_use]
    pub fn from_bytes(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self::from_bytes_with(filename, data, &GuessMime)
    }

    /// Create a file whose content type comes from `resolver`.
    #[must_use]
    pub fn from_bytes_with(
        filename: impl Into<String>,
        data: impl Into<Bytes>,
        resolver: &dyn MimeResolver,
    ) -> Self {
        let filename = filename.into();
        let content_type = content_type_for(&filename, resolver);
        Self::new(filename, content_type, data)
    }

    /// Read a file from disk, guessing its content type.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::from_path_with(path, &GuessMime)
    }

    /// Read a file from disk, resolving its content type with `resolver`.
    pub fn from_path_with(
        path: impl AsRef<Path>,
        resolver: &dyn MimeResolver,
    ) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self::from_bytes_with(filename, data, resolver))
    }

    /// File name sent in the `Content-Disposition` header.
    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Content type of the file part.
    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// File contents.
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }
}

// ============================================================================
// Part
// ============================================================================

/// One field or file of a [`Form`].
///
/// Text fields carry no content type; file parts carry a filename and a
/// content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    data: Bytes,
}

impl Part {
    /// Plain field part.
    #[must_use]
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: Bytes::from(value.into()),
        }
    }

    /// File part carrying the file's name and content type.
    #[must_use]
    pub fn file(name: impl Into<String>, file: MultipartFile) -> Self {
        Self {
            name: name.into(),
            filename: Some(file.filename),
            content_type: Some(file.content_type),
            data: file.data,
        }
    }

    /// Form field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Filename of a file part.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Content type of a file part.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Raw content.
    #[must_use]
    pub const fn data(&self) -> &Bytes {
        &self.data
    }

    /// Returns `true` for file parts.
    #[must_use]
    pub const fn is_file(&self) -> bool {
        self.filename.is_some()
    }

    /// Part headers up to and including the blank line before the content.
    fn head(&self) -> String {
        let mut head = format!(
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quoted(&self.name)
        );
        if let Some(filename) = &self.filename {
            head.push_str(&format!("; filename=\"{}\"", escape_quoted(filename)));
        }
        head.push_str("\r\n");
        if let Some(content_type) = &self.content_type {
            let content_type: String = content_type
                .chars()
                .filter(|c| !matches!(c, '\r' | '\n'))
                .collect();
            head.push_str(&format!("Content-Type: {content_type}\r\n"));
        }
        head.push_str("\r\n");
        head
    }
}

/// Percent-encode `"`, CR and LF in a quoted disposition parameter, as
/// browsers do for `multipart/form-data` names and filenames.
fn escape_quoted(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            c => escaped.push(c),
        }
    }
    escaped
}

fn unescape_quoted(value: &str) -> String {
    value
        .replace("%22", "\"")
        .replace("%0D", "\r")
        .replace("%0A", "\n")
}

// ============================================================================
// Form
// ============================================================================

/// Ordered `multipart/form-data` parts sharing one boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Form {
    parts: Vec<Part>,
    boundary: String,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Empty form with a freshly generated boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(generate_boundary())
    }

    /// Empty form with a caller-chosen boundary, which must not occur in any
    /// part content.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            parts: Vec::new(),
            boundary: boundary.into(),
        }
    }

    /// Build a form from a wire map.
    ///
    /// Files become file parts, lists of files one file part per element,
    /// other lists one text part per element, and anything else a single
    /// text part holding [`WireValue::to_text`].
    #[must_use]
    pub fn from_wire_map(map: &WireMap, boundary: impl Into<String>) -> Self {
        let mut form = Self::with_boundary(boundary);
        for (name, value) in map.iter() {
            match value {
                WireValue::File(file) => form.push(Part::file(name, file.clone())),
                WireValue::List(items) => {
                    for item in items {
                        match item {
                            WireValue::File(file) => form.push(Part::file(name, file.clone())),
                            other => form.push(Part::text(name, other.to_text())),
                        }
                    }
                }
                other => form.push(Part::text(name, other.to_text())),
            }
        }
        form
    }

    /// Build a form from a record with a fresh boundary.
    ///
    /// A record with nothing to send yields a form without parts.
    #[must_use]
    pub fn from_record<R: Record + ?Sized>(record: &R) -> Self {
        let map = record.wire_map().unwrap_or_default();
        Self::from_wire_map(&map, generate_boundary())
    }

    /// Append a part.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.push(part);
        self
    }

    /// Append a field part.
    #[must_use]
    pub fn text(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.part(Part::text(name, value))
    }

    /// Append a file part.
    #[must_use]
    pub fn file(self, name: impl Into<String>, file: MultipartFile) -> Self {
        self.part(Part::file(name, file))
    }

    fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Boundary token, without the leading dashes.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Parts in insertion order.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Headers required to send this form: `Content-Type` and `Accept`.
    #[must_use]
    pub fn headers(&self) -> Headers {
        Headers::new()
            .with("Content-Type", self.content_type())
            .with("Accept", "application/json")
    }

    /// Content type and encoded body, in that order.
    #[must_use]
    pub fn into_body(self) -> (String, Bytes) {
        let content_type = self.content_type();
        let body = self.encode();
        (content_type, body)
    }

    /// RFC 2046 body: every part framed by `--{boundary}\r\n`, in insertion
    /// order, then the closing `--{boundary}--\r\n`.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();
        for part in &self.parts {
            buf.put_slice(format!("--{}\r\n", self.boundary).as_bytes());
            buf.put_slice(part.head().as_bytes());
            buf.put_slice(&part.data);
            buf.put_slice(b"\r\n");
        }
        buf.put_slice(format!("--{}--\r\n", self.boundary).as_bytes());
        buf.freeze()
    }

    /// Parse an encoded body back into parts.
    ///
    /// Returns `None` if the body is not framed by `boundary`.
    #[must_use]
    pub fn parse(body: &[u8], boundary: &str) -> Option<Self> {
        let delimiter = format!("--{boundary}");
        let closing = format!("\r\n{delimiter}");
        let mut rest = body.strip_prefix(delimiter.as_bytes())?;
        let mut form = Self::with_boundary(boundary);

        loop {
            if rest.starts_with(b"--") {
                return Some(form);
            }
            rest = rest.strip_prefix(b"\r\n")?;

            let head_end = find(rest, b"\r\n\r\n")?;
            let (head, tail) = rest.split_at_checked(head_end)?;
            let tail = tail.get(4..)?;

            let data_end = find(tail, closing.as_bytes())?;
            let (data, tail) = tail.split_at_checked(data_end)?;
            rest = tail.get(closing.len()..)?;

            form.push(parse_part(std::str::from_utf8(head).ok()?, data)?);
        }
    }
}

fn parse_part(head: &str, data: &[u8]) -> Option<Part> {
    let mut name = None;
    let mut filename = None;
    let mut content_type = None;

    for line in head.split("\r\n") {
        let (header, value) = line.split_once(':')?;
        if header.eq_ignore_ascii_case("Content-Disposition") {
            for (key, value) in disposition_params(value) {
                match key {
                    "name" => name = Some(unescape_quoted(value)),
                    "filename" => filename = Some(unescape_quoted(value)),
                    _ => {}
                }
            }
        } else if header.eq_ignore_ascii_case("Content-Type") {
            content_type = Some(value.trim().to_string());
        }
    }

    Some(Part {
        name: name?,
        filename,
        content_type,
        data: Bytes::copy_from_slice(data),
    })
}

/// `key=value` parameters of a `Content-Disposition` value, quotes removed.
/// Quoted values may contain `;`.
fn disposition_params(value: &str) -> Vec<(&str, &str)> {
    let mut params = Vec::new();
    let mut rest = value;
    while let Some((_, tail)) = rest.split_once(';') {
        let tail = tail.trim_start();
        let Some((key, tail)) = tail.split_once('=') else {
            break;
        };
        let (value, tail) = match tail.strip_prefix('"') {
            Some(quoted) => match quoted.split_once('"') {
                Some((value, tail)) => (value, tail),
                None => (quoted, ""),
            },
            None => tail.split_at(tail.find(';').unwrap_or(tail.len())),
        };
        params.push((key.trim(), value));
        rest = tail;
    }
    params
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// Generate a random boundary string.
///
/// The boundary is [`BOUNDARY_PREFIX`] followed by 70 random ASCII
/// alphanumerics.
#[must_use]
pub fn generate_boundary() -> String {
    let token: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(BOUNDARY_TOKEN_LEN)
        .map(char::from)
        .collect();
    format!("{BOUNDARY_PREFIX}{token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NoMime;

    impl MimeResolver for NoMime {
        fn resolve(&self, _extension: &str) -> Option<String> {
            None
        }
    }

    fn text_file() -> MultipartFile {
        MultipartFile::new("f.txt", "text/plain", "hi")
    }

    #[test]
    fn boundary_shape() {
        let boundary = generate_boundary();
        let token = boundary.strip_prefix(BOUNDARY_PREFIX).expect("prefix");
        assert_eq!(token.len(), 70);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(boundary, generate_boundary());
    }

    #[test]
    fn content_type_resolution() {
        assert_eq!(content_type_for("photo.png", &GuessMime), "image/png");
        assert_eq!(content_type_for("notes.txt", &GuessMime), "text/plain");
        assert_eq!(content_type_for("blob", &GuessMime), DEFAULT_CONTENT_TYPE);
        assert_eq!(content_type_for("photo.png", &NoMime), DEFAULT_CONTENT_TYPE);
    }

    #[test]
    fn field_part_layout() {
        let body = Form::with_boundary("b").text("k", "value").encode();
        assert_eq!(
            body.as_ref(),
            b"--b\r\nContent-Disposition: form-data; name=\"k\"\r\n\r\nvalue\r\n--b--\r\n"
        );
    }

    #[test]
    fn file_part_layout() {
        let body = Form::with_boundary("b").file("doc", text_file()).encode();
        assert_eq!(
            body.as_ref(),
            b"--b\r\nContent-Disposition: form-data; name=\"doc\"; filename=\"f.txt\"\r\n\
              Content-Type: text/plain\r\n\r\nhi\r\n--b--\r\n"
        );
    }

    #[test]
    fn quotes_and_line_breaks_are_escaped() {
        let file = MultipartFile::new("a\";x=\"y.txt", "text/plain", "hi");
        let form = Form::with_boundary("b").file("do\"c\r\n", file);
        let body = form.encode();
        assert_eq!(
            body.as_ref(),
            b"--b\r\nContent-Disposition: form-data; name=\"do%22c%0D%0A\"; \
              filename=\"a%22;x=%22y.txt\"\r\nContent-Type: text/plain\r\n\r\nhi\r\n--b--\r\n"
        );

        let parsed = Form::parse(&body, "b").expect("well framed");
        let [part] = parsed.parts() else {
            panic!("expected one part, got {:?}", parsed.parts());
        };
        assert_eq!(part.name(), "do\"c\r\n");
        assert_eq!(part.filename(), Some("a\";x=\"y.txt"));
    }

    #[test]
    fn empty_form_is_terminator_only() {
        assert_eq!(Form::with_boundary("b").encode().as_ref(), b"--b--\r\n");
    }

    #[test]
    fn wire_map_partitioning() {
        let map = WireMap::new()
            .with("title", "report")
            .with("tags", WireValue::List(vec!["a".into(), "b".into()]))
            .with(
                "files",
                WireValue::List(vec![
                    text_file().into(),
                    MultipartFile::new("g.bin", DEFAULT_CONTENT_TYPE, vec![0_u8, 1]).into(),
                ]),
            )
            .with("count", 3_u64)
            .with("draft", false);

        let form = Form::from_wire_map(&map, "b");
        let summary: Vec<_> = form
            .parts()
            .iter()
            .map(|part| (part.name(), part.filename(), part.data().as_ref()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("title", None, b"report".as_slice()),
                ("tags", None, b"a".as_slice()),
                ("tags", None, b"b".as_slice()),
                ("files", Some("f.txt"), b"hi".as_slice()),
                ("files", Some("g.bin"), [0_u8, 1].as_slice()),
                ("count", None, b"3".as_slice()),
                ("draft", None, b"false".as_slice()),
            ]
        );
    }

    #[test]
    fn round_trip_field_and_file() {
        let map = WireMap::new().with("a", "1").with("upload", text_file());
        let form = Form::from_wire_map(&map, generate_boundary());
        let boundary = form.boundary().to_string();
        let body = form.encode();

        assert!(body.starts_with(format!("--{boundary}").as_bytes()));
        assert!(body.ends_with(format!("--{boundary}--\r\n").as_bytes()));

        let parsed = Form::parse(&body, &boundary).expect("well framed");
        let [field, file] = parsed.parts() else {
            panic!("expected two parts, got {:?}", parsed.parts());
        };
        assert_eq!(field.name(), "a");
        assert!(!field.is_file());
        assert_eq!(field.data().as_ref(), b"1");

        assert_eq!(file.name(), "upload");
        assert_eq!(file.filename(), Some("f.txt"));
        assert_eq!(file.content_type(), Some("text/plain"));
        assert_eq!(file.data().as_ref(), b"hi");
    }

    #[test]
    fn parse_rejects_foreign_boundary() {
        let body = Form::with_boundary("one").text("a", "1").encode();
        assert!(Form::parse(&body, "two").is_none());
    }

    #[test]
    fn form_headers() {
        let headers = Form::with_boundary("xyz").headers();
        assert_eq!(
            headers.get("content-type"),
            Some("multipart/form-data; boundary=xyz")
        );
        assert_eq!(headers.get("accept"), Some("application/json"));
    }

    #[test]
    fn from_bytes_guesses_type() {
        let file = MultipartFile::from_bytes("photo.jpg", vec![0xFF, 0xD8]);
        assert_eq!(file.content_type(), "image/jpeg");
        let file = MultipartFile::from_bytes("data.unknownext", "x");
        assert_eq!(file.content_type(), DEFAULT_CONTENT_TYPE);
    }
}
