// Transport settings for the REST HTTP client

use std::time::Duration;

/// Settings applied to the underlying reqwest client
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Whole-request timeout (`httpRequestTimeout`)
    pub timeout: Duration,
    /// TCP/TLS connect timeout (`httpOpenTimeout`)
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Option<Duration>,
    pub pool_max_idle_per_host: usize,
    /// Scheme, host and optional port; no trailing slash
    pub base_url: String,
    /// Append a random `request_id` query parameter to every request
    pub add_request_ids: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(4),
            pool_idle_timeout: Some(Duration::from_secs(90)),
            pool_max_idle_per_host: 32,
            base_url: "https://rest.ably.io".to_string(),
            add_request_ids: false,
        }
    }
}

impl HttpConfig {
    pub fn builder() -> HttpConfigBuilder {
        HttpConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct HttpConfigBuilder {
    config: HttpConfig,
}

impl HttpConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// `None` keeps idle connections until the server closes them
    pub fn pool_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.pool_idle_timeout = timeout;
        self
    }

    pub fn pool_max_idle_per_host(mut self, max: usize) -> Self {
        self.config.pool_max_idle_per_host = max;
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.config.base_url = url.trim_end_matches('/').to_string();
        self
    }

    pub fn add_request_ids(mut self, enabled: bool) -> Self {
        self.config.add_request_ids = enabled;
        self
    }

    pub fn build(self) -> HttpConfig {
        self.config
    }
}
