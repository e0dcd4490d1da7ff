// Client configuration

use crate::auth::{AuthMode, TokenProvider};
use crate::error::{AblyError, AblyErrorCode, AblyResult};
use crate::http::HttpConfig;
use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_REST_HOST: &str = "rest.ably.io";
pub const PRODUCTION_ENVIRONMENT: &str = "production";

/// Options accepted by `RestClient::new`
#[derive(Clone)]
pub struct ClientOptions {
    /// API key, `<key name>:<key secret>`
    pub key: Option<String>,
    /// Token obtained out of band
    pub token: Option<String>,
    /// External source of tokens, consulted per request
    pub token_provider: Option<Arc<dyn TokenProvider>>,
    /// Refuse basic auth even when a key is present
    pub use_token_auth: bool,
    pub client_id: Option<String>,
    pub environment: Option<String>,
    /// Overrides the host derived from `environment`
    pub rest_host: Option<String>,
    pub port: Option<u16>,
    pub tls: bool,
    pub http_request_timeout: Duration,
    pub http_open_timeout: Duration,
    /// Assign ids to published messages so retried publishes are deduplicated
    pub idempotent_rest_publishing: bool,
    pub add_request_ids: bool,
    pub default_headers: Vec<(String, String)>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            key: None,
            token: None,
            token_provider: None,
            use_token_auth: false,
            client_id: None,
            environment: None,
            rest_host: None,
            port: None,
            tls: true,
            http_request_timeout: Duration::from_secs(10),
            http_open_timeout: Duration::from_secs(4),
            idempotent_rest_publishing: false,
            add_request_ids: false,
            default_headers: Vec::new(),
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("key", &self.key.as_deref().map(crate::logging::redact_key))
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("token_provider", &self.token_provider.is_some())
            .field("use_token_auth", &self.use_token_auth)
            .field("client_id", &self.client_id)
            .field("environment", &self.environment)
            .field("rest_host", &self.rest_host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("http_request_timeout", &self.http_request_timeout)
            .field("http_open_timeout", &self.http_open_timeout)
            .field("idempotent_rest_publishing", &self.idempotent_rest_publishing)
            .field("add_request_ids", &self.add_request_ids)
            .finish()
    }
}

impl ClientOptions {
    /// Read options from `ABLY_KEY`, `ABLY_TOKEN`, `ABLY_CLIENT_ID`,
    /// `ABLY_ENVIRONMENT` and `ABLY_REST_HOST`.
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());

        Self {
            key: var("ABLY_KEY"),
            token: var("ABLY_TOKEN"),
            client_id: var("ABLY_CLIENT_ID"),
            environment: var("ABLY_ENVIRONMENT"),
            rest_host: var("ABLY_REST_HOST"),
            ..Default::default()
        }
    }

    /// Host requests are sent to
    pub fn host(&self) -> String {
        if let Some(host) = &self.rest_host {
            return host.clone();
        }
        match self.environment.as_deref() {
            None | Some("") | Some(PRODUCTION_ENVIRONMENT) => DEFAULT_REST_HOST.to_string(),
            Some(environment) => format!("{}-{}", environment, DEFAULT_REST_HOST),
        }
    }

    pub fn base_url(&self) -> String {
        let scheme = if self.tls { "https" } else { "http" };
        match self.port {
            Some(port) => format!("{}://{}:{}", scheme, self.host(), port),
            None => format!("{}://{}", scheme, self.host()),
        }
    }

    /// Pick the credential to attach to requests.
    ///
    /// Token credentials win over a key; a key is only usable over TLS.
    pub fn auth_mode(&self) -> AblyResult<AuthMode> {
        if let Some(provider) = &self.token_provider {
            return Ok(AuthMode::token_provider(Arc::clone(provider)));
        }
        if let Some(token) = &self.token {
            return Ok(AuthMode::token(token.clone()));
        }
        if self.use_token_auth {
            return Err(AblyError::authentication(
                "use_token_auth is set but no token or token provider was given",
                AblyErrorCode::NoMeansToRenewToken,
            ));
        }

        let key = self.key.as_deref().ok_or_else(|| {
            AblyError::authentication(
                "No key or token provided",
                AblyErrorCode::InvalidCredentials,
            )
        })?;
        if !self.tls {
            return Err(AblyError::authentication(
                AblyErrorCode::InvalidUseOfBasicAuthOverHttp.default_message(),
                AblyErrorCode::InvalidUseOfBasicAuthOverHttp,
            ));
        }
        AuthMode::api_key(key)
    }

    pub(crate) fn http_config(&self) -> HttpConfig {
        HttpConfig {
            timeout: self.http_request_timeout,
            connect_timeout: self.http_open_timeout,
            base_url: self.base_url(),
            add_request_ids: self.add_request_ids,
            ..HttpConfig::default()
        }
    }
}
