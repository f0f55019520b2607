//! HTTP request building.
//!
//! A [`Request`] is the immutable, transport-ready descriptor of one call.
//! [`RequestBuilder`] composes it from a base URL, a path, query parameters,
//! headers, a body and a cache directive.
//!
//! # Example
//!
//! ```
//! use parcel_core::{Method, RequestBuilder};
//!
//! let base = url::Url::parse("https://api.example.com/v1/").unwrap();
//! let request = RequestBuilder::resolve(Method::Get, &base, "users?page=1")
//!     .unwrap()
//!     .header("Accept", "application/json")
//!     .query("page", "2")
//!     .build();
//!
//! assert_eq!(request.url().as_str(), "https://api.example.com/v1/users?page=2");
//! ```

use bytes::Bytes;
use url::{Url, form_urlencoded};

use crate::multipart::Form;
use crate::{CacheDirective, Error, Headers, Method, Record, Result};

/// An HTTP request with method, URL, headers, optional body and cache directive.
///
/// Requests are values: interceptors receive one and return a new one
/// through the `with_*` methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: Url,
    headers: Headers,
    body: Option<Bytes>,
    cache: Option<CacheDirective>,
}

impl Request {
    /// Creates a new [`RequestBuilder`].
    #[must_use]
    pub fn builder(method: Method, url: Url) -> RequestBuilder {
        RequestBuilder::new(method, url)
    }

    /// Rebuild a request from its parts.
    #[must_use]
    pub fn from_parts(
        method: Method,
        url: Url,
        headers: Headers,
        body: Option<Bytes>,
        cache: Option<CacheDirective>,
    ) -> Self {
        Self {
            method,
            url,
            headers,
            body,
            cache,
        }
    }

    /// HTTP method.
    #[must_use]
    pub const fn method(&self) -> Method {
        self.method
    }

    /// Request URL, query included.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Request headers.
    #[must_use]
    pub const fn headers(&self) -> &Headers {
        &self.headers
    }

    /// Single header value by name (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    /// Request body.
    #[must_use]
    pub const fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Cache directive, if one was supplied.
    #[must_use]
    pub const fn cache(&self) -> Option<CacheDirective> {
        self.cache
    }

    /// Copy with a header set (overwriting).
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Copy without the named header.
    #[must_use]
    pub fn without_header(mut self, name: &str) -> Self {
        self.headers.remove(name);
        self
    }

    /// Copy with a different URL.
    #[must_use]
    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    /// Copy with a different body.
    #[must_use]
    pub fn with_body(mut self, body: Option<Bytes>) -> Self {
        self.body = body;
        self
    }

    /// Copy with a different cache directive.
    #[must_use]
    pub const fn with_cache(mut self, cache: Option<CacheDirective>) -> Self {
        self.cache = cache;
        self
    }

    /// Consume into (method, url, headers, body, cache).
    #[must_use]
    pub fn into_parts(self) -> (Method, Url, Headers, Option<Bytes>, Option<CacheDirective>) {
        (self.method, self.url, self.headers, self.body, self.cache)
    }
}

// ============================================================================
// URL Composition
// ============================================================================

/// Resolve `path` against `base`.
///
/// An empty path yields `base` unchanged. An absolute URL is used as is;
/// anything else is joined to `base` with standard reference resolution, so
/// `base` should end with `/` when it carries a path prefix.
///
/// Fails with [`Error::InvalidUrl`] for paths containing whitespace or
/// control characters, relative references whose first segment contains a
/// colon, and anything the URL parser rejects.
pub fn resolve_url(base: &Url, path: &str) -> Result<Url> {
    if path.is_empty() {
        return Ok(base.clone());
    }

    if path.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(Error::invalid_url(format!(
            "'{path}' contains whitespace or control characters"
        )));
    }

    let url = match Url::parse(path) {
        Ok(url) => url,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let first_segment = path.split(['/', '?', '#']).next().unwrap_or_default();
            if first_segment.contains(':') {
                return Err(Error::invalid_url(format!(
                    "'{path}' is neither an absolute URL nor a relative path"
                )));
            }
            base.join(path)
                .map_err(|err| Error::invalid_url(format!("'{path}': {err}")))?
        }
        Err(err) => return Err(Error::invalid_url(format!("'{path}': {err}"))),
    };

    if url.scheme().is_empty() {
        return Err(Error::invalid_url(format!("'{url}' has no scheme")));
    }

    Ok(url)
}

/// Merge query parameters into `url`.
///
/// Existing parameters come first. A supplied parameter replaces the value
/// of the first existing parameter with the same name, keeping its position;
/// otherwise it is appended. Parameters that are not replaced keep their
/// exact encoding, valueless ones included. The URL is left untouched when
/// `pairs` is empty.
pub fn merge_query<K, V>(url: &mut Url, pairs: &[(K, V)])
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    if pairs.is_empty() {
        return;
    }

    // (decoded name, raw segment)
    let mut segments: Vec<(String, String)> = url
        .query()
        .unwrap_or_default()
        .split('&')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let name = form_urlencoded::parse(segment.as_bytes())
                .next()
                .map(|(name, _)| name.into_owned())
                .unwrap_or_default();
            (name, segment.to_string())
        })
        .collect();

    for (name, value) in pairs {
        let (name, value) = (name.as_ref(), value.as_ref());
        let encoded = form_urlencoded::Serializer::new(String::new())
            .append_pair(name, value)
            .finish();
        match segments.iter_mut().find(|(existing, _)| existing == name) {
            Some(segment) => segment.1 = encoded,
            None => segments.push((name.to_string(), encoded)),
        }
    }

    let query = segments
        .iter()
        .map(|(_, raw)| raw.as_str())
        .collect::<Vec<_>>()
        .join("&");
    url.set_query(Some(&query));
}

// ============================================================================
// Builder
// ============================================================================

/// Builder for constructing [`Request`] instances.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    url: Url,
    headers: Headers,
    query: Vec<(String, String)>,
    body: Option<Bytes>,
    cache: Option<CacheDirective>,
}

impl RequestBuilder {
    /// Creates a new builder targeting an already-resolved URL.
    #[must_use]
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Headers::new(),
            query: Vec::new(),
            body: None,
            cache: None,
        }
    }

    /// Creates a builder for `path` resolved against `base`.
    ///
    /// See [`resolve_url`].
    pub fn resolve(method: Method, base: &Url, path: &str) -> Result<Self> {
        resolve_url(base, path).map(|url| Self::new(method, url))
    }

    /// Sets a header, overwriting any previous value (case-insensitive).
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets multiple headers.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.merge(headers);
        self
    }

    /// Adds a query parameter; it replaces an existing one with the same name.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    /// Adds multiple query parameters.
    #[must_use]
    pub fn query_pairs(mut self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Sets the request body, sent verbatim.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the cache directive.
    #[must_use]
    pub const fn cache(mut self, cache: CacheDirective) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets a JSON body from a record.
    ///
    /// A record with nothing to send leaves the request without a body.
    #[must_use]
    pub fn json<R: Record + ?Sized>(self, record: &R) -> Self {
        match record.to_data() {
            Some(data) => self.header("Content-Type", "application/json").body(data),
            None => self,
        }
    }

    /// Sets a multipart body.
    ///
    /// The form's `Content-Type` and `Accept` headers override any set by
    /// the caller.
    #[must_use]
    pub fn multipart(self, form: &Form) -> Self {
        let headers = form.headers();
        self.headers(headers).body(form.encode())
    }

    /// Builds the [`Request`].
    #[must_use]
    pub fn build(self) -> Request {
        let mut url = self.url;
        merge_query(&mut url, &self.query);
        Request {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
            cache: self.cache,
        }
    }
}
