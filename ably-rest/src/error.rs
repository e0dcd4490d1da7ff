// Error handling for the REST client
// Every failure surfaces to the caller; nothing here retries.

pub mod ably_codes;

use crate::protocol::messages::ErrorInfo;
use thiserror::Error;

pub use ably_codes::{http_to_ably_code, AblyErrorCode};

/// Type alias for Ably results
pub type AblyResult<T> = Result<T, AblyError>;

#[derive(Debug, Error)]
pub enum AblyError {
    /// The request never produced an HTTP response.
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        timeout: bool,
    },

    /// The server answered with a non-2xx status.
    #[error("HTTP {status}: {}", info.as_ref().and_then(|i| i.message.as_deref()).unwrap_or(body.as_str()))]
    Http {
        status: u16,
        body: String,
        info: Option<ErrorInfo>,
    },

    #[error("Decode error: {message}")]
    Decode {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The page carries no link for the requested relation.
    #[error("No {relation} page after this one")]
    NoMoreRelation { relation: String },

    #[error("Authentication failed: {message}")]
    Authentication {
        message: String,
        code: Option<AblyErrorCode>,
    },

    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },
}

impl AblyError {
    /// Create a network error
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
            timeout: false,
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn authentication(message: impl Into<String>, code: AblyErrorCode) -> Self {
        Self::Authentication {
            message: message.into(),
            code: Some(code),
        }
    }

    pub fn no_more(relation: impl Into<String>) -> Self {
        Self::NoMoreRelation {
            relation: relation.into(),
        }
    }

    /// Build an error from a non-2xx response.
    ///
    /// Ably answers failures with `{"error": {...}}`; when the body has that
    /// shape the parsed `ErrorInfo` is kept next to the raw body. The
    /// `X-Ably-Errorcode` header fills in the code when the body lacks one.
    pub fn from_response(status: u16, body: String, header_code: Option<u32>) -> Self {
        let mut info = serde_json::from_str::<ErrorEnvelope>(&body)
            .ok()
            .map(|envelope| envelope.error);

        if info.is_none() {
            if let Some(code) = header_code {
                info = Some(ErrorInfo {
                    code,
                    message: None,
                    status_code: Some(status),
                    href: None,
                    cause: None,
                });
            }
        }

        Self::Http { status, body, info }
    }

    /// HTTP status for server-reported failures
    pub fn status(&self) -> Option<u16> {
        match self {
            AblyError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Ably error code, when one is known
    pub fn code(&self) -> Option<u32> {
        match self {
            AblyError::Http { info, status, .. } => Some(
                info.as_ref()
                    .map(|i| i.code)
                    .unwrap_or_else(|| http_to_ably_code(*status)),
            ),
            AblyError::Authentication { code, .. } => code.map(|c| c as u32),
            AblyError::NoMoreRelation { .. } => Some(AblyErrorCode::NotFound as u32),
            AblyError::InvalidArgument { .. } => Some(AblyErrorCode::BadRequest as u32),
            _ => None,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            AblyError::Network { .. } => ErrorCategory::Network,
            AblyError::Http { .. } => self
                .code()
                .map(ErrorCategory::from_code)
                .unwrap_or(ErrorCategory::Unknown),
            AblyError::Decode { .. } => ErrorCategory::Decode,
            AblyError::NoMoreRelation { .. } => ErrorCategory::Pagination,
            AblyError::Authentication { .. } => ErrorCategory::Auth,
            AblyError::InvalidArgument { .. } => ErrorCategory::BadRequest,
        }
    }

    /// Network failure or non-2xx status
    pub fn is_transport(&self) -> bool {
        matches!(self, AblyError::Network { .. } | AblyError::Http { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AblyError::Network { timeout: true, .. })
    }
}

impl From<reqwest::Error> for AblyError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("Request timeout: {}", err)
        } else if err.is_connect() {
            format!("Connection failed: {}", err)
        } else {
            format!("Network error: {}", err)
        };

        AblyError::Network {
            message,
            timeout: err.is_timeout(),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for AblyError {
    fn from(err: serde_json::Error) -> Self {
        AblyError::Decode {
            message: format!("Failed to parse response: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

#[derive(serde::Deserialize)]
struct ErrorEnvelope {
    error: ErrorInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Network,
    Auth,
    Decode,
    Pagination,
    BadRequest,
    Forbidden,
    NotFound,
    RateLimit,
    Internal,
    Unknown,
}

impl ErrorCategory {
    pub fn from_code(code: u32) -> Self {
        match code {
            40000..=40099 => ErrorCategory::BadRequest,
            40100..=40199 => ErrorCategory::Auth,
            40300..=40399 => ErrorCategory::Forbidden,
            40400..=40499 => ErrorCategory::NotFound,
            42900..=42999 => ErrorCategory::RateLimit,
            50000..=50099 => ErrorCategory::Internal,
            _ => ErrorCategory::Unknown,
        }
    }
}
