//! Authentication interceptors.
//!
//! Both overwrite any `Authorization` header already on the request.

use std::sync::Arc;

use base64::Engine;

use crate::{InterceptFuture, Interceptor, Request, RequestOutcome};

/// Adds `Authorization: Bearer <token>` to every request.
#[derive(Debug, Clone)]
pub struct BearerAuthInterceptor {
    header: Arc<str>,
}

impl BearerAuthInterceptor {
    /// Create a bearer auth interceptor with the given token.
    pub fn new(token: impl AsRef<str>) -> Self {
        Self {
            header: Arc::from(format!("Bearer {}", token.as_ref())),
        }
    }
}

impl Interceptor for BearerAuthInterceptor {
    fn name(&self) -> &str {
        "bearer-auth"
    }

    fn on_request<'a>(&'a self, request: Request) -> InterceptFuture<'a, RequestOutcome> {
        let request = request.with_header("Authorization", &*self.header);
        Box::pin(async move { Ok(RequestOutcome::Proceed(request)) })
    }
}

/// Adds `Authorization: Basic <base64(user:pass)>` to every request.
#[derive(Debug, Clone)]
pub struct BasicAuthInterceptor {
    /// `Basic ` followed by base64-encoded "username:password".
    header: Arc<str>,
}

impl BasicAuthInterceptor {
    /// Create a basic auth interceptor with the given username and password.
    pub fn new(username: impl AsRef<str>, password: impl AsRef<str>) -> Self {
        let credentials = format!("{}:{}", username.as_ref(), password.as_ref());
        let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
        Self {
            header: Arc::from(format!("Basic {encoded}")),
        }
    }
}

impl Interceptor for BasicAuthInterceptor {
    fn name(&self) -> &str {
        "basic-auth"
    }

    fn on_request<'a>(&'a self, request: Request) -> InterceptFuture<'a, RequestOutcome> {
        let request = request.with_header("Authorization", &*self.header);
        Box::pin(async move { Ok(RequestOutcome::Proceed(request)) })
    }
}
