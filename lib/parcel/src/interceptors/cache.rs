//! In-memory response cache.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use tracing::debug;

use crate::{
    CacheDirective, Error, Exchange, InterceptFuture, Interceptor, Method, Request,
    RequestOutcome, Response,
};

/// Entries kept by [`ResponseCache::new`].
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// Caches successful GET bodies by URL and serves them according to the
/// request's [`CacheDirective`]:
///
/// | Directive | Hit | Miss |
/// |-----------|-----|------|
/// | none / `UseProtocolDefault` | network | network |
/// | `ReloadIgnoringCache` | network | network |
/// | `ReturnCacheElseLoad` | cached body | network |
/// | `ReturnCacheDontLoad` | cached body | [`Error::Interceptor`] |
///
/// Entries are keyed by the URL the request reaches this interceptor with,
/// which is also the URL sent to the transport once every request hook ran.
/// Register it after interceptors that rewrite the URL; interceptors after
/// it must leave the URL alone.
///
/// Every successful (2xx) GET response refreshes the entry. Cached bodies
/// are served as a short-circuit, so callers see status 298. Once full, the
/// oldest entry is evicted first.
///
/// Clones share the same store.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    store: Arc<Mutex<Store>>,
}

#[derive(Debug)]
struct Store {
    capacity: usize,
    entries: HashMap<String, Bytes>,
    order: VecDeque<String>,
}

impl Store {
    fn insert(&mut self, key: String, body: Bytes) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.insert(key.clone(), body).is_some() {
            return;
        }
        self.order.push_back(key);
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                debug!(url = %oldest, "cache eviction");
                self.entries.remove(&oldest);
            }
        }
    }

    fn remove(&mut self, key: &str) -> Option<Bytes> {
        let body = self.entries.remove(key)?;
        self.order.retain(|entry| entry != key);
        Some(body)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CACHE_CAPACITY)
    }
}

impl ResponseCache {
    /// Create an empty cache holding up to [`DEFAULT_CACHE_CAPACITY`] entries.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty cache holding up to `capacity` entries.
    /// A zero capacity stores nothing.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let store = Store {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
        };
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Returns `true` if a body is cached for `url`.
    #[must_use]
    pub fn contains(&self, url: &url::Url) -> bool {
        self.lock().entries.contains_key(url.as_str())
    }

    /// Drop the entry for `url`, returning its body.
    pub fn invalidate(&self, url: &url::Url) -> Option<Bytes> {
        self.lock().remove(url.as_str())
    }

    /// Drop every entry.
    pub fn clear(&self) {
        let mut store = self.lock();
        store.entries.clear();
        store.order.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn lookup(&self, request: &Request) -> Option<Bytes> {
        self.lock().entries.get(request.url().as_str()).cloned()
    }
}

impl Interceptor for ResponseCache {
    fn name(&self) -> &str {
        "response-cache"
    }

    fn on_request<'a>(&'a self, request: Request) -> InterceptFuture<'a, RequestOutcome> {
        Box::pin(async move {
            let directive = request.cache().unwrap_or_default();
            if request.method() != Method::Get || !directive.allows_cached() {
                return Ok(RequestOutcome::Proceed(request));
            }

            match self.lookup(&request) {
                Some(body) => {
                    debug!(url = %request.url(), "cache hit");
                    Ok(RequestOutcome::ShortCircuit { request, body })
                }
                None if directive.forbids_load() => Err(Error::interceptor(
                    self.name(),
                    format!("no cached response for {}", request.url()),
                )),
                None => Ok(RequestOutcome::Proceed(request)),
            }
        })
    }

    fn on_response<'a>(
        &'a self,
        exchange: &'a Exchange,
        response: Response,
    ) -> InterceptFuture<'a, Response> {
        Box::pin(async move {
            let sent = exchange.sent();
            if sent.method() == Method::Get && response.is_success() {
                self.lock()
                    .insert(sent.url().to_string(), response.body().clone());
            }
            Ok(response)
        })
    }
}
