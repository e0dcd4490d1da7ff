// HTTP client for the Ably REST API
// Attaches credentials and maps failures; never retries.

use crate::auth::AuthMode;
use crate::error::{AblyError, AblyResult};
use base64::Engine;
use rand::RngCore;
use reqwest::{Client, Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, trace};

pub use self::config::{HttpConfig, HttpConfigBuilder};
pub use self::link::{ContinuationParams, Link};

mod config;
pub mod link;

/// Protocol version announced on every request
pub const ABLY_PROTOCOL_VERSION: &str = "2";

const AGENT: &str = concat!("ably-rust-rest/", env!("CARGO_PKG_VERSION"));

/// Ably HTTP client for REST API operations
#[derive(Debug)]
pub struct AblyHttpClient {
    client: Client,
    auth_mode: AuthMode,
    base_url: String,
    default_headers: Vec<(String, String)>,
    add_request_ids: bool,
}

impl AblyHttpClient {
    /// Create new HTTP client with authentication
    pub fn new(config: HttpConfig, auth_mode: AuthMode) -> AblyResult<Self> {
        let mut builder = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host);
        if let Some(idle) = config.pool_idle_timeout {
            builder = builder.pool_idle_timeout(idle);
        }

        let client = builder.build().map_err(|e| AblyError::Network {
            message: format!("Failed to build HTTP client: {}", e),
            source: Some(Box::new(e)),
            timeout: false,
        })?;

        Ok(Self {
            client,
            auth_mode,
            base_url: config.base_url,
            default_headers: Vec::new(),
            add_request_ids: config.add_request_ids,
        })
    }

    /// Get the authentication mode
    pub fn auth_mode(&self) -> &AuthMode {
        &self.auth_mode
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Add a default header that will be included in all requests
    pub fn add_default_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.default_headers.push((key.into(), value.into()));
    }

    /// Create a GET request builder
    pub fn get(&self, path: &str) -> HttpRequestBuilder<'_> {
        HttpRequestBuilder::new(self, Method::GET, path)
    }

    /// Create a POST request builder
    pub fn post(&self, path: &str) -> HttpRequestBuilder<'_> {
        HttpRequestBuilder::new(self, Method::POST, path)
    }
}

/// HTTP request builder for fluent API
pub struct HttpRequestBuilder<'a> {
    client: &'a AblyHttpClient,
    method: Method,
    path: String,
    query_params: Vec<(String, String)>,
    body: Option<AblyResult<Vec<u8>>>,
}

impl<'a> HttpRequestBuilder<'a> {
    fn new(client: &'a AblyHttpClient, method: Method, path: &str) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            query_params: Vec::new(),
            body: None,
        }
    }

    /// Add query parameters
    pub fn query(mut self, params: &[(String, String)]) -> Self {
        self.query_params.extend_from_slice(params);
        self
    }

    /// Set JSON body
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        self.body = Some(serde_json::to_vec(body).map_err(|e| AblyError::Decode {
            message: format!("Failed to serialize request body: {}", e),
            source: Some(Box::new(e)),
        }));
        self
    }

    /// Send the request; non-2xx statuses become `AblyError::Http`
    pub async fn send(self) -> AblyResult<HttpResponse> {
        let url = format!("{}{}", self.client.base_url, self.path);
        let mut request = self
            .client
            .client
            .request(self.method.clone(), &url)
            .header("Accept", "application/json")
            .header("X-Ably-Version", ABLY_PROTOCOL_VERSION)
            .header("Ably-Agent", AGENT)
            .header(
                "Authorization",
                self.client.auth_mode.authorization_header().await?,
            );

        for (key, value) in &self.client.default_headers {
            request = request.header(key.as_str(), value.as_str());
        }

        let mut query = self.query_params;
        if self.client.add_request_ids {
            query.push(("request_id".to_string(), request_id()));
        }
        if !query.is_empty() {
            request = request.query(&query);
        }

        if let Some(body) = self.body {
            request = request
                .header("Content-Type", "application/json")
                .body(body?);
        }

        debug!(method = %self.method, path = %self.path, params = query.len(), "sending request");
        let response = request.send().await?;
        let status = response.status();
        trace!(method = %self.method, path = %self.path, status = status.as_u16(), "response received");

        if !status.is_success() {
            let header_code = response
                .headers()
                .get("x-ably-errorcode")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u32>().ok());
            let body = error_body(response.text().await);
            debug!(path = %self.path, status = status.as_u16(), "request failed");
            return Err(AblyError::from_response(status.as_u16(), body, header_code));
        }

        Ok(HttpResponse {
            path: self.path,
            inner: response,
        })
    }
}

/// HTTP response wrapper
#[derive(Debug)]
pub struct HttpResponse {
    path: String,
    inner: Response,
}

impl HttpResponse {
    /// Get response status code
    pub fn status(&self) -> reqwest::StatusCode {
        self.inner.status()
    }

    /// Get response headers
    pub fn headers(&self) -> &reqwest::header::HeaderMap {
        self.inner.headers()
    }

    /// Pagination relations advertised in `Link` headers
    pub fn links(&self) -> AblyResult<HashMap<String, Link>> {
        let values = self
            .inner
            .headers()
            .get_all(reqwest::header::LINK)
            .iter()
            .filter_map(|v| v.to_str().ok());
        link::parse_links(values, &self.path)
    }

    /// Parse response as JSON
    pub async fn json<T: DeserializeOwned>(self) -> AblyResult<T> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Get response as bytes
    pub async fn bytes(self) -> AblyResult<Vec<u8>> {
        self.inner
            .bytes()
            .await
            .map(|b| b.to_vec())
            .map_err(|e| AblyError::network(format!("Failed to read response: {}", e)))
    }
}

/// Body of a failed response, or why it could not be read
fn error_body<E: fmt::Display>(read: Result<String, E>) -> String {
    read.unwrap_or_else(|e| format!("failed to read error response body: {}", e))
}

fn request_id() -> String {
    let mut bytes = [0u8; 12];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
