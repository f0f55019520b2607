//! Call-level logging.

use tracing::{debug, info, warn};

use crate::{Exchange, InterceptFuture, Interceptor, Request, RequestOutcome, Response};

/// Logs each request as a `curl` command and the status of each response
/// that came back from the transport.
///
/// Calls answered by a short-circuit never reach response hooks, so only
/// their outgoing request is logged. Place it after the interceptors whose
/// rewrites should show up in the `curl` line.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingInterceptor {
    bodies: bool,
}

impl LoggingInterceptor {
    /// Create a logging interceptor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also log request and response body sizes.
    #[must_use]
    pub const fn with_bodies(mut self) -> Self {
        self.bodies = true;
        self
    }

    /// Returns `true` if body sizes are logged.
    #[must_use]
    pub const fn logs_bodies(&self) -> bool {
        self.bodies
    }
}

impl Interceptor for LoggingInterceptor {
    fn name(&self) -> &str {
        "logging"
    }

    fn on_request<'a>(&'a self, request: Request) -> InterceptFuture<'a, RequestOutcome> {
        Box::pin(async move {
            if self.bodies {
                let body_bytes = request.body().map_or(0, |body| body.len());
                debug!(curl = %request.to_curl(), body_bytes, "outgoing request");
            } else {
                debug!(curl = %request.to_curl(), "outgoing request");
            }
            Ok(RequestOutcome::Proceed(request))
        })
    }

    fn on_response<'a>(
        &'a self,
        exchange: &'a Exchange,
        response: Response,
    ) -> InterceptFuture<'a, Response> {
        Box::pin(async move {
            let sent = exchange.sent();
            let body_bytes = self.bodies.then(|| response.body().len());
            if response.is_success() {
                info!(
                    method = %sent.method(),
                    url = %sent.url(),
                    status = ?response.status(),
                    body_bytes,
                    "response"
                );
            } else {
                warn!(
                    method = %sent.method(),
                    url = %sent.url(),
                    status = ?response.status(),
                    body_bytes,
                    "unsuccessful response"
                );
            }
            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Headers, Method};

    #[tokio::test]
    async fn passes_through_untouched() {
        let interceptor = LoggingInterceptor::new().with_bodies();
        let request = Request::builder(
            Method::Post,
            url::Url::parse("https://example.com/items").expect("valid URL"),
        )
        .body("{}")
        .build();

        let outcome = interceptor
            .on_request(request.clone())
            .await
            .expect("proceeds");
        assert_eq!(outcome, RequestOutcome::Proceed(request.clone()));

        assert!(interceptor.logs_bodies());
        assert!(!LoggingInterceptor::new().logs_bodies());

        let exchange = Exchange::new(request.clone(), request);
        let response = Response::new(500, Headers::new(), "boom");
        let logged = interceptor
            .on_response(&exchange, response.clone())
            .await
            .expect("passes");
        assert_eq!(logged, response);
    }
}
