//! Transport abstraction.
//!
//! A [`Transport`] performs one HTTP exchange. The dispatch core never talks
//! to the network directly, so tests substitute a stub and production uses
//! the hyper-based transport from the `parcel` crate.

use std::future::Future;
use std::sync::Arc;

use crate::{Request, Response, Result};

/// Performs a single HTTP exchange.
///
/// Implementations must be safe to call concurrently. Failures should map
/// onto [`crate::Error::Connection`], [`crate::Error::Tls`],
/// [`crate::Error::Timeout`] or [`crate::Error::Transport`].
pub trait Transport: Send + Sync {
    /// Send `request` and return the raw response.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails for any reason.
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send;
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        T::send(self, request)
    }
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response>> + Send {
        T::send(self, request)
    }
}
