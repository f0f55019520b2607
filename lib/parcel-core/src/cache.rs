//! Per-request cache directives.

/// How a request may be served from a cache.
///
/// Attached to a [`crate::Request`] only when the caller asks for it; without
/// one the transport's own policy applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CacheDirective {
    /// Defer to the protocol's caching rules.
    #[default]
    UseProtocolDefault,
    /// Always go to the network.
    ReloadIgnoringCache,
    /// Use a cached response of any age, else load.
    ReturnCacheElseLoad,
    /// Use a cached response or fail; never load.
    ReturnCacheDontLoad,
}

impl CacheDirective {
    /// `Cache-Control` request value expressing this directive, if any.
    #[must_use]
    pub const fn cache_control(self) -> Option<&'static str> {
        match self {
            Self::UseProtocolDefault => None,
            Self::ReloadIgnoringCache => Some("no-cache"),
            Self::ReturnCacheElseLoad => Some("max-stale"),
            Self::ReturnCacheDontLoad => Some("only-if-cached"),
        }
    }

    /// Returns `true` if a stored response may answer the request without
    /// going to the network.
    #[must_use]
    pub const fn allows_cached(self) -> bool {
        matches!(self, Self::ReturnCacheElseLoad | Self::ReturnCacheDontLoad)
    }

    /// Returns `true` if a miss must fail instead of loading.
    #[must_use]
    pub const fn forbids_load(self) -> bool {
        matches!(self, Self::ReturnCacheDontLoad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_control_values() {
        assert_eq!(CacheDirective::UseProtocolDefault.cache_control(), None);
        assert_eq!(
            CacheDirective::ReloadIgnoringCache.cache_control(),
            Some("no-cache")
        );
        assert_eq!(
            CacheDirective::ReturnCacheDontLoad.cache_control(),
            Some("only-if-cached")
        );
    }

    #[test]
    fn only_return_cache_directives_use_stored_responses() {
        assert!(!CacheDirective::ReloadIgnoringCache.allows_cached());
        assert!(!CacheDirective::UseProtocolDefault.allows_cached());
        assert!(CacheDirective::ReturnCacheElseLoad.allows_cached());
        assert!(CacheDirective::ReturnCacheDontLoad.allows_cached());

        assert!(CacheDirective::ReturnCacheDontLoad.forbids_load());
        assert!(!CacheDirective::ReturnCacheElseLoad.forbids_load());
    }
}
