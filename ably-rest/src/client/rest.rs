// REST client entry point

use crate::auth::TokenProvider;
use crate::client::channel::RestChannel;
use crate::client::options::ClientOptions;
use crate::error::{AblyError, AblyResult};
use crate::http::AblyHttpClient;
use base64::Engine;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Main REST client for Ably API
///
/// Cheap to clone; clones share one connection pool.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: Arc<AblyHttpClient>,
    client_id: Option<String>,
    idempotent_publishing: bool,
}

impl RestClient {
    pub fn new(options: ClientOptions) -> AblyResult<Self> {
        let auth = options.auth_mode()?;
        let mut http = AblyHttpClient::new(options.http_config(), auth)?;
        for (key, value) in &options.default_headers {
            http.add_default_header(key.clone(), value.clone());
        }

        info!(
            host = %options.host(),
            basic_auth = http.auth_mode().is_basic(),
            "REST client created"
        );
        Ok(Self::from_http_client(http, &options))
    }

    /// Create a new REST client with an API key
    pub fn from_key(key: impl Into<String>) -> AblyResult<Self> {
        Self::builder().key(key).build()
    }

    /// Create a new REST client with a token
    pub fn from_token(token: impl Into<String>) -> AblyResult<Self> {
        Self::builder().token(token).build()
    }

    /// Wrap an already configured HTTP client.
    ///
    /// Only `client_id` and `idempotent_rest_publishing` are taken from
    /// `options`; host and credentials come from `http`.
    pub fn from_http_client(mut http: AblyHttpClient, options: &ClientOptions) -> Self {
        if let Some(client_id) = &options.client_id {
            if http.auth_mode().is_basic() {
                let engine = base64::engine::general_purpose::STANDARD;
                http.add_default_header("X-Ably-ClientId", engine.encode(client_id));
            }
        }

        Self {
            http: Arc::new(http),
            client_id: options.client_id.clone(),
            idempotent_publishing: options.idempotent_rest_publishing,
        }
    }

    /// Create a builder for advanced configuration
    pub fn builder() -> RestClientBuilder {
        RestClientBuilder::default()
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    /// Get a channel reference
    pub fn channel(&self, name: impl Into<String>) -> AblyResult<RestChannel> {
        let name = name.into();
        if name.is_empty() {
            return Err(AblyError::invalid_argument("channel name must not be empty"));
        }

        Ok(RestChannel::new(
            name,
            Arc::clone(&self.http),
            self.client_id.clone(),
            self.idempotent_publishing,
        ))
    }

    /// Get server time in milliseconds since the epoch
    pub async fn time(&self) -> AblyResult<i64> {
        let times: Vec<i64> = self.http.get("/time").send().await?.json().await?;

        times
            .first()
            .copied()
            .ok_or_else(|| AblyError::decode("Empty time response"))
    }
}

/// Builder for REST client with advanced options
#[derive(Default)]
pub struct RestClientBuilder {
    options: ClientOptions,
}

impl RestClientBuilder {
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.options.key = Some(key.into());
        self
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.options.token = Some(token.into());
        self
    }

    pub fn token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.options.token_provider = Some(provider);
        self
    }

    pub fn use_token_auth(mut self, enabled: bool) -> Self {
        self.options.use_token_auth = enabled;
        self
    }

    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.options.client_id = Some(client_id.into());
        self
    }

    pub fn environment(mut self, env: impl Into<String>) -> Self {
        self.options.environment = Some(env.into());
        self
    }

    pub fn rest_host(mut self, host: impl Into<String>) -> Self {
        self.options.rest_host = Some(host.into());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.options.port = Some(port);
        self
    }

    pub fn tls(mut self, tls: bool) -> Self {
        self.options.tls = tls;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.http_request_timeout = timeout;
        self
    }

    pub fn idempotent_rest_publishing(mut self, enabled: bool) -> Self {
        self.options.idempotent_rest_publishing = enabled;
        self
    }

    pub fn add_request_ids(mut self, enabled: bool) -> Self {
        self.options.add_request_ids = enabled;
        self
    }

    pub fn custom_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.default_headers.push((key.into(), value.into()));
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn build(self) -> AblyResult<RestClient> {
        RestClient::new(self.options)
    }
}

impl From<ClientOptions> for RestClientBuilder {
    fn from(options: ClientOptions) -> Self {
        Self { options }
    }
}
