//! Request/response interceptors.
//!
//! An [`Interceptor`] sees every request before it is sent and every
//! response after it arrives. Request hooks may rewrite the request or
//! answer it themselves (a short-circuit, e.g. a cache hit); response hooks
//! may rewrite status, headers or body.
//!
//! The [`InterceptorChain`] runs request hooks in registration order, each
//! receiving the previous hook's request. Every request hook runs; when
//! several short-circuit, the first body wins. Response hooks run in
//! registration order, and only when the transport was actually called.
//! They receive an [`Exchange`] holding both the request as built and the
//! request as sent.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use tracing::debug;

use crate::{Request, Response, Result};

/// Boxed future returned by interceptor hooks.
pub type InterceptFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// What a request hook decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Continue with this request.
    Proceed(Request),
    /// Answer with `body` instead of calling the transport.
    ShortCircuit {
        /// The request, possibly rewritten.
        request: Request,
        /// Response body served in place of the network.
        body: Bytes,
    },
}

impl RequestOutcome {
    /// The request carried by this outcome.
    #[must_use]
    pub const fn request(&self) -> &Request {
        match self {
            Self::Proceed(request) | Self::ShortCircuit { request, .. } => request,
        }
    }
}

/// The two forms of one request seen by response hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    original: Request,
    sent: Request,
}

impl Exchange {
    /// Pair the request as built with the request handed to the transport.
    #[must_use]
    pub const fn new(original: Request, sent: Request) -> Self {
        Self { original, sent }
    }

    /// The request as built, before any request hook ran.
    #[must_use]
    pub const fn original(&self) -> &Request {
        &self.original
    }

    /// The request after every request hook, as given to the transport.
    #[must_use]
    pub const fn sent(&self) -> &Request {
        &self.sent
    }
}

/// A pluggable request/response transformer.
///
/// Both hooks default to pass-through. Implementations must not share
/// mutable state with other interceptors; the chain is reused across
/// concurrent dispatches.
///
/// # Example
///
/// ```ignore
/// struct Tenant(String);
///
/// impl Interceptor for Tenant {
///     fn on_request<'a>(&'a self, request: Request) -> InterceptFuture<'a, RequestOutcome> {
///         Box::pin(async move {
///             Ok(RequestOutcome::Proceed(request.with_header("X-Tenant", &self.0)))
///         })
///     }
/// }
/// ```
pub trait Interceptor: Send + Sync {
    /// Name used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Inspect or rewrite an outgoing request, or short-circuit it.
    fn on_request<'a>(&'a self, request: Request) -> InterceptFuture<'a, RequestOutcome> {
        Box::pin(async move { Ok(RequestOutcome::Proceed(request)) })
    }

    /// Inspect or rewrite a response to the request described by `exchange`.
    fn on_response<'a>(
        &'a self,
        exchange: &'a Exchange,
        response: Response,
    ) -> InterceptFuture<'a, Response> {
        let _ = exchange;
        Box::pin(async move { Ok(response) })
    }
}

/// Result of running every request hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Intercepted {
    /// Request after all rewrites.
    pub request: Request,
    /// Body of the first short-circuit, if any.
    pub short_circuit: Option<Bytes>,
}

/// Ordered, immutable list of interceptors.
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Arc<[Arc<dyn Interceptor>]>,
}

impl fmt::Debug for InterceptorChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.interceptors.iter().map(|interceptor| interceptor.name()))
            .finish()
    }
}

impl InterceptorChain {
    /// Creates a chain running `interceptors` in order.
    #[must_use]
    pub fn new(interceptors: Vec<Arc<dyn Interceptor>>) -> Self {
        Self {
            interceptors: interceptors.into(),
        }
    }

    /// Number of interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if the chain is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Run every request hook in order.
    pub async fn run_request(&self, request: Request) -> Result<Intercepted> {
        let mut request = request;
        let mut short_circuit = None;

        for interceptor in self.interceptors.iter() {
            match interceptor.on_request(request).await? {
                RequestOutcome::Proceed(next) => request = next,
                RequestOutcome::ShortCircuit { request: next, body } => {
                    request = next;
                    if short_circuit.is_none() {
                        debug!(interceptor = interceptor.name(), "request short-circuited");
                        short_circuit = Some(body);
                    }
                }
            }
        }

        Ok(Intercepted {
            request,
            short_circuit,
        })
    }

    /// Run every response hook in order.
    pub async fn run_response(&self, exchange: &Exchange, response: Response) -> Result<Response> {
        let mut response = response;
        for interceptor in self.interceptors.iter() {
            response = interceptor.on_response(exchange, response).await?;
        }
        Ok(response)
    }
}

impl<I: Interceptor + 'static> FromIterator<I> for InterceptorChain {
    fn from_iter<T: IntoIterator<Item = I>>(iter: T) -> Self {
        Self::new(
            iter.into_iter()
                .map(|interceptor| Arc::new(interceptor) as Arc<dyn Interceptor>)
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Error, Headers, Method};

    fn request() -> Request {
        Request::builder(
            Method::Get,
            url::Url::parse("https://example.com/a").expect("valid URL"),
        )
        .build()
    }

    struct Tag(&'static str);

    impl Interceptor for Tag {
        fn on_request<'a>(&'a self, request: Request) -> InterceptFuture<'a, RequestOutcome> {
            Box::pin(async move {
                let trail = request.header("X-Trail").unwrap_or_default().to_string();
                Ok(RequestOutcome::Proceed(
                    request.with_header("X-Trail", format!("{trail}{}", self.0)),
                ))
            })
        }

        fn on_response<'a>(
            &'a self,
            exchange: &'a Exchange,
            response: Response,
        ) -> InterceptFuture<'a, Response> {
            Box::pin(async move {
                assert!(exchange.original().header("X-Trail").is_none());
                assert!(exchange.sent().header("X-Trail").is_some());
                let body = format!("{}{}", String::from_utf8_lossy(response.body()), self.0);
                Ok(response.with_body(body))
            })
        }
    }

    struct Serve(&'static str);

    impl Interceptor for Serve {
        fn on_request<'a>(&'a self, request: Request) -> InterceptFuture<'a, RequestOutcome> {
            Box::pin(async move {
                Ok(RequestOutcome::ShortCircuit {
                    request,
                    body: Bytes::from_static(self.0.as_bytes()),
                })
            })
        }
    }

    struct Fail;

    impl Interceptor for Fail {
        fn name(&self) -> &str {
            "fail"
        }

        fn on_request<'a>(&'a self, _request: Request) -> InterceptFuture<'a, RequestOutcome> {
            Box::pin(async move { Err(Error::interceptor(self.name(), "refused")) })
        }
    }

    #[tokio::test]
    async fn request_hooks_run_in_order() {
        let chain: InterceptorChain = [Tag("a"), Tag("b"), Tag("c")].into_iter().collect();
        let intercepted = chain.run_request(request()).await.expect("runs");
        assert_eq!(intercepted.request.header("X-Trail"), Some("abc"));
        assert!(intercepted.short_circuit.is_none());
    }

    #[tokio::test]
    async fn response_hooks_thread_output() {
        let chain: InterceptorChain = [Tag("1"), Tag("2")].into_iter().collect();
        let response = Response::new(200, Headers::new(), "body:");
        let sent = request().with_header("X-Trail", "12");
        let exchange = Exchange::new(request(), sent);
        let response = chain
            .run_response(&exchange, response)
            .await
            .expect("runs");
        assert_eq!(response.body().as_ref(), b"body:12");
    }

    #[tokio::test]
    async fn first_short_circuit_wins() {
        let chain = InterceptorChain::new(vec![
            Arc::new(Serve("first")),
            Arc::new(Tag("x")),
            Arc::new(Serve("second")),
        ]);
        let intercepted = chain.run_request(request()).await.expect("runs");
        assert_eq!(intercepted.short_circuit.as_deref(), Some(b"first".as_slice()));
        assert_eq!(intercepted.request.header("X-Trail"), Some("x"));
    }

    #[tokio::test]
    async fn failure_aborts() {
        let chain = InterceptorChain::new(vec![Arc::new(Fail), Arc::new(Tag("never"))]);
        let err = chain.run_request(request()).await.expect_err("fails");
        assert_eq!(err.to_string(), "interceptor 'fail' failed: refused");
    }

    #[test]
    fn chain_debug_lists_names() {
        let chain = InterceptorChain::new(vec![Arc::new(Fail)]);
        assert_eq!(format!("{chain:?}"), r#"["fail"]"#);
    }
}
