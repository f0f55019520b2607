//! Transport-level logging middleware.
//!
//! Wraps each exchange that reaches the network in a `parcel.transport`
//! span and fills its `status` and `elapsed_ms` fields once it completes.
//! Short-circuited calls never get here.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;

use tower::{Layer, Service};
use tracing::{Instrument, Level, Span, debug, field, info, span, warn};

use crate::{Error, Request, Response, Result};

/// Layer that adds request/response logging.
///
/// # Example
///
/// ```ignore
/// use parcel::HyperTransport;
/// use parcel::middleware::LoggingLayer;
///
/// let transport = HyperTransport::builder()
///     .layer(LoggingLayer::debug())
///     .build();
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingLayer {
    level: LogLevel,
}

/// Log level for the logging middleware.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Also log the cURL form of each request and the response headers.
    Debug,
    /// Log at info level (summary only).
    #[default]
    Info,
}

impl LoggingLayer {
    /// Create a new logging layer with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a logging layer that logs at debug level.
    #[must_use]
    pub fn debug() -> Self {
        Self {
            level: LogLevel::Debug,
        }
    }

    /// Configured level.
    #[must_use]
    pub const fn level(&self) -> LogLevel {
        self.level
    }
}

impl<S> Layer<S> for LoggingLayer {
    type Service = Logging<S>;

    fn layer(&self, inner: S) -> Self::Service {
        Logging {
            inner,
            level: self.level,
        }
    }
}

/// Service that logs requests and responses.
#[derive(Debug, Clone)]
pub struct Logging<S> {
    inner: S,
    level: LogLevel,
}

impl<S> Service<Request> for Logging<S>
where
    S: Service<Request, Response = Response, Error = Error> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<()>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, request: Request) -> Self::Future {
        let span = span!(
            Level::INFO,
            "parcel.transport",
            method = %request.method(),
            url = %request.url(),
            status = field::Empty,
            elapsed_ms = field::Empty,
        );
        if self.level == LogLevel::Debug {
            debug!(parent: &span, curl = %request.to_curl(), "sending request");
        }

        let level = self.level;
        let mut inner = self.inner.clone();
        Box::pin(
            async move {
                let start = Instant::now();
                let result = inner.call(request).await;
                let elapsed_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

                let current = Span::current();
                current.record("elapsed_ms", elapsed_ms);
                match &result {
                    Ok(response) => {
                        if let Some(status) = response.status() {
                            current.record("status", status);
                        }
                        if response.is_success() {
                            info!("exchange completed");
                        } else {
                            warn!("exchange completed without success status");
                        }
                        if level == LogLevel::Debug {
                            debug!(
                                headers = %response.headers(),
                                body_bytes = response.body().len(),
                                "response received"
                            );
                        }
                    }
                    Err(err) => warn!(error = %err, "exchange failed"),
                }

                result
            }
            .instrument(span),
        )
    }
}

#[cfg(test)]
mod tests {
    use tower::ServiceExt;
    use tower::service_fn;

    use super::*;
    use crate::{Headers, Method};

    #[test]
    fn logging_layer_default() {
        assert_eq!(LoggingLayer::new().level(), LogLevel::Info);
    }

    #[test]
    fn logging_layer_debug() {
        assert_eq!(LoggingLayer::debug().level(), LogLevel::Debug);
    }

    #[tokio::test]
    async fn passes_responses_through() {
        let inner = service_fn(|_request: Request| async {
            Ok::<_, Error>(Response::new(418, Headers::new(), "teapot"))
        });
        let service = LoggingLayer::debug().layer(inner);

        let request = Request::builder(
            Method::Get,
            url::Url::parse("https://example.com/").expect("valid URL"),
        )
        .build();
        let response = service.oneshot(request).await.expect("responds");

        assert_eq!(response.status(), Some(418));
        assert_eq!(response.body().as_ref(), b"teapot");
    }
}
