//! The dispatching client.
//!
//! [`Client`] binds a base URL, a [`Transport`], an [`InterceptorChain`] and a
//! [`DiagnosticSink`]. Each verb method returns a [`Call`] that composes the
//! request; `send` runs the pipeline:
//!
//! 1. request interceptors, in order;
//! 2. on short-circuit, decode the supplied body with status 298;
//! 3. otherwise the transport, then the response interceptors;
//! 4. decode with the transport status (299 when it reported none).
//!
//! The client holds only immutable shared state, so clones are cheap and
//! concurrent calls are independent.

use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, Level, debug, span, trace};
use url::Url;

use crate::diagnostic::{DiagnosticSink, TracingSink, pretty_error};
use crate::interceptor::{Exchange, Interceptor, InterceptorChain};
use crate::multipart::Form;
use crate::{
    CacheDirective, Decode, Error, Headers, Method, Record, Request, RequestBuilder, Result,
    SHORT_CIRCUIT_STATUS, Transport, TypedResponse, UNKNOWN_STATUS, decode_response,
};

// ============================================================================
// Body
// ============================================================================

/// Payload attached by the `post`/`put`/`patch` verbs.
#[derive(Debug, Clone, Default)]
pub enum Body {
    /// No body.
    #[default]
    Empty,
    /// Raw bytes, sent verbatim.
    Bytes(Bytes),
    /// A multipart form; sets `Content-Type` with the form boundary.
    Multipart(Form),
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes.into())
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::Bytes(text.into())
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::Bytes(Bytes::from_static(text.as_bytes()))
    }
}

impl From<Form> for Body {
    fn from(form: Form) -> Self {
        Self::Multipart(form)
    }
}

impl From<Option<Bytes>> for Body {
    fn from(bytes: Option<Bytes>) -> Self {
        bytes.map_or(Self::Empty, Self::Bytes)
    }
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client dispatching through an interceptor chain and a transport.
///
/// # Example
///
/// ```ignore
/// let client = Client::builder(transport, Url::parse("https://api.example.com/v1/")?)
///     .interceptor(BearerAuthInterceptor::new("token"))
///     .build();
///
/// let user = client.get("users/1").send::<Json<User>>().await?;
/// ```
pub struct Client<T> {
    base_url: Url,
    transport: Arc<T>,
    chain: InterceptorChain,
    diagnostics: Arc<dyn DiagnosticSink>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            base_url: self.base_url.clone(),
            transport: Arc::clone(&self.transport),
            chain: self.chain.clone(),
            diagnostics: Arc::clone(&self.diagnostics),
        }
    }
}

impl<T> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("interceptors", &self.chain)
            .finish_non_exhaustive()
    }
}

impl<T: Transport> Client<T> {
    /// Creates a client with no interceptors and the [`TracingSink`].
    #[must_use]
    pub fn new(transport: T, base_url: Url) -> Self {
        Self::builder(transport, base_url).build()
    }

    /// Creates a [`ClientBuilder`].
    #[must_use]
    pub fn builder(transport: T, base_url: Url) -> ClientBuilder<T> {
        ClientBuilder::new(transport, base_url)
    }

    /// Base URL that call paths are resolved against.
    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Registered interceptors.
    #[must_use]
    pub const fn interceptors(&self) -> &InterceptorChain {
        &self.chain
    }

    /// Start a call with any method.
    pub fn request(&self, method: Method, path: &str) -> Call<'_, T> {
        Call {
            client: self,
            builder: RequestBuilder::resolve(method, &self.base_url, path),
        }
    }

    /// Start a GET call.
    pub fn get(&self, path: &str) -> Call<'_, T> {
        self.request(Method::Get, path)
    }

    /// Start a POST call.
    pub fn post(&self, path: &str, body: impl Into<Body>) -> Call<'_, T> {
        self.request(Method::Post, path).body(body)
    }

    /// Start a PUT call.
    pub fn put(&self, path: &str, body: impl Into<Body>) -> Call<'_, T> {
        self.request(Method::Put, path).body(body)
    }

    /// Start a PATCH call.
    pub fn patch(&self, path: &str, body: impl Into<Body>) -> Call<'_, T> {
        self.request(Method::Patch, path).body(body)
    }

    /// Start a DELETE call.
    pub fn delete(&self, path: &str) -> Call<'_, T> {
        self.request(Method::Delete, path)
    }

    /// Run a fully built request through the pipeline and decode the result.
    ///
    /// Failures are reported to the diagnostics sink before being returned.
    ///
    /// # Errors
    ///
    /// Returns the first interceptor, transport or decoding failure.
    pub async fn dispatch<R: Decode>(&self, request: Request) -> Result<TypedResponse<R>> {
        let span = span!(
            Level::INFO,
            "parcel.dispatch",
            method = %request.method(),
            url = %request.url()
        );

        let result = self.execute(request).instrument(span).await;
        if let Err(err) = &result {
            self.report(err);
        }
        result
    }

    async fn execute<R: Decode>(&self, request: Request) -> Result<TypedResponse<R>> {
        trace!(curl = %request.to_curl(), "dispatching");

        let original = request.clone();
        let intercepted = self.chain.run_request(request).await?;

        if let Some(body) = intercepted.short_circuit {
            debug!(bytes = body.len(), "served by interceptor");
            return decode_response(SHORT_CIRCUIT_STATUS, Headers::new(), &body);
        }

        let sent = intercepted.request.clone();
        let response = self.transport.send(intercepted.request).await?;
        debug!(status = ?response.status(), bytes = response.body().len(), "transport responded");

        let exchange = Exchange::new(original, sent);
        let response = self.chain.run_response(&exchange, response).await?;
        let (status, headers, body) = response.into_parts();
        decode_response(status.unwrap_or(UNKNOWN_STATUS), headers, &body)
    }

    fn report(&self, err: &Error) {
        self.diagnostics.report(&pretty_error(err));
    }
}

// ============================================================================
// Client Builder
// ============================================================================

/// Builder for [`Client`].
pub struct ClientBuilder<T> {
    transport: T,
    base_url: Url,
    interceptors: Vec<Arc<dyn Interceptor>>,
    diagnostics: Option<Arc<dyn DiagnosticSink>>,
}

impl<T: Transport> ClientBuilder<T> {
    /// Creates a builder.
    #[must_use]
    pub fn new(transport: T, base_url: Url) -> Self {
        Self {
            transport,
            base_url,
            interceptors: Vec::new(),
            diagnostics: None,
        }
    }

    /// Append an interceptor; interceptors run in registration order.
    #[must_use]
    pub fn interceptor(mut self, interceptor: impl Interceptor + 'static) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Append an already shared interceptor.
    #[must_use]
    pub fn shared_interceptor(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Set the sink receiving failure reports (default: [`TracingSink`]).
    #[must_use]
    pub fn diagnostics(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.diagnostics = Some(Arc::new(sink));
        self
    }

    /// Build the client.
    #[must_use]
    pub fn build(self) -> Client<T> {
        Client {
            base_url: self.base_url,
            transport: Arc::new(self.transport),
            chain: InterceptorChain::new(self.interceptors),
            diagnostics: self.diagnostics.unwrap_or_else(|| Arc::new(TracingSink)),
        }
    }
}

// ============================================================================
// Call
// ============================================================================

/// A request being composed against a [`Client`].
///
/// An unresolvable path is remembered and reported by `send`, without
/// reaching any interceptor or the transport.
#[must_use = "a call does nothing until sent"]
pub struct Call<'c, T> {
    client: &'c Client<T>,
    builder: Result<RequestBuilder>,
}

impl<T: Transport> Call<'_, T> {
    fn map(mut self, f: impl FnOnce(RequestBuilder) -> RequestBuilder) -> Self {
        self.builder = self.builder.map(f);
        self
    }

    /// Sets a header, overwriting any previous value.
    pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map(|builder| builder.header(name, value))
    }

    /// Sets multiple headers.
    pub fn headers(self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.map(|builder| builder.headers(headers))
    }

    /// Adds a query parameter, replacing one of the same name.
    pub fn query(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.map(|builder| builder.query(name, value))
    }

    /// Adds multiple query parameters.
    pub fn query_pairs(self, pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        self.map(|builder| builder.query_pairs(pairs))
    }

    /// Adds every field of a record as a query parameter.
    pub fn query_record<R: Record + ?Sized>(self, record: &R) -> Self {
        match record.to_query_params() {
            Some(pairs) => self.query_pairs(pairs),
            None => self,
        }
    }

    /// Replaces the body.
    pub fn body(self, body: impl Into<Body>) -> Self {
        match body.into() {
            Body::Empty => self,
            Body::Bytes(bytes) => self.map(|builder| builder.body(bytes)),
            Body::Multipart(form) => self.map(|builder| builder.multipart(&form)),
        }
    }

    /// Sets a JSON body from a record.
    pub fn json<R: Record + ?Sized>(self, record: &R) -> Self {
        self.map(|builder| builder.json(record))
    }

    /// Sets the cache directive.
    pub fn cache(self, cache: CacheDirective) -> Self {
        self.map(|builder| builder.cache(cache))
    }

    /// Build the request without sending it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] if the path did not resolve.
    pub fn build(self) -> Result<Request> {
        self.builder.map(RequestBuilder::build)
    }

    /// Send the call and decode the payload as `R`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidUrl`] for an unresolvable path, or any
    /// interceptor, transport or decoding failure.
    pub async fn send<R: Decode>(self) -> Result<TypedResponse<R>> {
        let client = self.client;
        match self.build() {
            Ok(request) => client.dispatch(request).await,
            Err(err) => {
                client.report(&err);
                Err(err)
            }
        }
    }

    /// Like [`Call::send`], but gives up with [`Error::Cancelled`] once
    /// `token` is cancelled.
    ///
    /// # Errors
    ///
    /// Same as [`Call::send`], plus [`Error::Cancelled`].
    pub async fn send_with_cancel<R: Decode>(
        self,
        token: &CancellationToken,
    ) -> Result<TypedResponse<R>> {
        let client = self.client;
        tokio::select! {
            biased;
            () = token.cancelled() => {
                let err = Error::Cancelled;
                client.report(&err);
                Err(err)
            }
            result = self.send() => result,
        }
    }
}
