// Authentication module for Ably REST requests
//
// The client never issues tokens itself; it only attaches whichever
// credential it was configured with.

use crate::error::{AblyError, AblyErrorCode, AblyResult};
use async_trait::async_trait;
use base64::Engine;
use std::fmt;
use std::sync::Arc;

/// An Ably API key, `<key name>:<key secret>`
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey {
    name: String,
    secret: String,
}

impl ApiKey {
    pub fn parse(key: &str) -> AblyResult<Self> {
        match key.split_once(':') {
            Some((name, secret)) if !name.is_empty() && !secret.is_empty() => Ok(Self {
                name: name.to_string(),
                secret: secret.to_string(),
            }),
            _ => Err(AblyError::authentication(
                "API key must have the form <name>:<secret>",
                AblyErrorCode::InvalidCredentials,
            )),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn basic_credentials(&self) -> String {
        let engine = base64::engine::general_purpose::STANDARD;
        engine.encode(format!("{}:{}", self.name, self.secret))
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiKey({})", crate::logging::redact_key(&format!("{}:{}", self.name, self.secret)))
    }
}

/// Supplies tokens obtained elsewhere (an auth server, a token request
/// signed by a backend, ...). Consulted once per request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> AblyResult<String>;
}

/// Where token credentials come from
#[derive(Clone)]
pub enum TokenSource {
    Static(String),
    Provider(Arc<dyn TokenProvider>),
}

impl TokenSource {
    async fn current(&self) -> AblyResult<String> {
        match self {
            TokenSource::Static(token) => Ok(token.clone()),
            TokenSource::Provider(provider) => provider.token().await,
        }
    }
}

impl fmt::Debug for TokenSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenSource::Static(_) => f.write_str("TokenSource::Static([REDACTED])"),
            TokenSource::Provider(_) => f.write_str("TokenSource::Provider"),
        }
    }
}

/// Authentication modes supported by Ably
#[derive(Debug, Clone)]
pub enum AuthMode {
    /// Basic authentication with an API key
    Basic(ApiKey),
    /// Token authentication
    Token(TokenSource),
}

impl AuthMode {
    /// Create basic authentication from key string
    pub fn api_key(key: &str) -> AblyResult<Self> {
        ApiKey::parse(key).map(Self::Basic)
    }

    /// Create token authentication with a fixed token
    pub fn token(token: impl Into<String>) -> Self {
        Self::Token(TokenSource::Static(token.into()))
    }

    pub fn token_provider(provider: Arc<dyn TokenProvider>) -> Self {
        Self::Token(TokenSource::Provider(provider))
    }

    pub fn is_basic(&self) -> bool {
        matches!(self, AuthMode::Basic(_))
    }

    /// Value for the `Authorization` header
    pub async fn authorization_header(&self) -> AblyResult<String> {
        match self {
            AuthMode::Basic(key) => Ok(format!("Basic {}", key.basic_credentials())),
            AuthMode::Token(source) => {
                let token = source.current().await?;
                if token.is_empty() {
                    return Err(AblyError::authentication(
                        "Token source returned an empty token",
                        AblyErrorCode::NoMeansToRenewToken,
                    ));
                }
                let engine = base64::engine::general_purpose::STANDARD;
                Ok(format!("Bearer {}", engine.encode(token)))
            }
        }
    }
}
