//! Settings for the bundled hyper transport.

use std::time::Duration;

/// `User-Agent` sent by [`crate::HyperTransport`] unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = concat!("parcel/", env!("CARGO_PKG_VERSION"));

/// Hyper transport settings.
///
/// Connection reuse and TLS follow hyper-util's defaults; only the knobs
/// below are exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Whole-exchange timeout, from sending the request to the last body byte.
    pub timeout: Duration,
    /// TCP connect timeout.
    pub connect_timeout: Duration,
    /// Maximum idle connections kept per host.
    pub pool_idle_per_host: usize,
    /// How long an idle connection stays in the pool.
    pub pool_idle_timeout: Duration,
    /// Disable Nagle's algorithm on new connections.
    pub tcp_nodelay: bool,
    /// `User-Agent` added when the request has none; `None` sends nothing.
    pub user_agent: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            pool_idle_per_host: 32,
            pool_idle_timeout: Duration::from_secs(90),
            tcp_nodelay: true,
            user_agent: Some(DEFAULT_USER_AGENT.to_string()),
        }
    }
}

impl ClientConfig {
    /// Start from the defaults.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`], seeded with the defaults or with an
/// existing configuration (`ClientConfigBuilder::from(config)`).
#[derive(Debug, Clone, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl From<ClientConfig> for ClientConfigBuilder {
    fn from(config: ClientConfig) -> Self {
        Self { config }
    }
}

impl ClientConfigBuilder {
    /// Whole-exchange timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// TCP connect timeout.
    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Maximum idle connections per host.
    #[must_use]
    pub fn pool_idle_per_host(mut self, count: usize) -> Self {
        self.config.pool_idle_per_host = count;
        self
    }

    /// Idle connection lifetime.
    #[must_use]
    pub fn pool_idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    /// Toggle `TCP_NODELAY`.
    #[must_use]
    pub fn tcp_nodelay(mut self, nodelay: bool) -> Self {
        self.config.tcp_nodelay = nodelay;
        self
    }

    /// Default `User-Agent`.
    #[must_use]
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(user_agent.into());
        self
    }

    /// Send no `User-Agent` unless the request sets one.
    #[must_use]
    pub fn no_user_agent(mut self) -> Self {
        self.config.user_agent = None;
        self
    }

    /// Finish the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.connect_timeout, Duration::from_secs(10));
        assert_eq!(config.pool_idle_per_host, 32);
        assert!(config.tcp_nodelay);
        assert!(
            config
                .user_agent
                .as_deref()
                .is_some_and(|agent| agent.starts_with("parcel/"))
        );
    }

    #[test]
    fn builder_keeps_untouched_fields() {
        let config = ClientConfig::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("demo/1.0")
            .build();

        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.pool_idle_timeout, Duration::from_secs(90));
        assert_eq!(config.user_agent.as_deref(), Some("demo/1.0"));
    }

    #[test]
    fn builder_from_existing_config() {
        let base = ClientConfig::builder().no_user_agent().build();
        let config = ClientConfigBuilder::from(base.clone())
            .connect_timeout(Duration::from_secs(1))
            .build();

        assert_eq!(config.user_agent, None);
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert_eq!(config.timeout, base.timeout);
    }
}
