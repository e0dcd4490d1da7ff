// Ably error codes seen by REST channel operations

/// Ably error code definitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AblyErrorCode {
    // 400xx Client errors
    BadRequest = 40000,
    InvalidRequestBody = 40001,
    InvalidParameterName = 40002,
    InvalidParameterValue = 40003,
    InvalidChannelName = 40010,
    EncodingError = 40013,

    // 401xx Authentication errors
    Unauthorized = 40100,
    InvalidCredentials = 40101,
    IncompatibleCredentials = 40102,
    InvalidUseOfBasicAuthOverHttp = 40103,
    TokenExpired = 40142,
    NoMeansToRenewToken = 40171,

    // 403xx Authorization errors
    Forbidden = 40300,

    // 404xx Not found errors
    NotFound = 40400,

    // 429xx Rate limiting
    TooManyRequests = 42900,

    // 500xx Server errors
    InternalServerError = 50000,
    TimeoutError = 50003,
    RequestFailed = 50004,
}

impl AblyErrorCode {
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            40000 => Some(Self::BadRequest),
            40001 => Some(Self::InvalidRequestBody),
            40002 => Some(Self::InvalidParameterName),
            40003 => Some(Self::InvalidParameterValue),
            40010 => Some(Self::InvalidChannelName),
            40013 => Some(Self::EncodingError),

            40100 => Some(Self::Unauthorized),
            40101 => Some(Self::InvalidCredentials),
            40102 => Some(Self::IncompatibleCredentials),
            40103 => Some(Self::InvalidUseOfBasicAuthOverHttp),
            40142 => Some(Self::TokenExpired),
            40171 => Some(Self::NoMeansToRenewToken),

            40300 => Some(Self::Forbidden),
            40400 => Some(Self::NotFound),
            42900 => Some(Self::TooManyRequests),

            50000 => Some(Self::InternalServerError),
            50003 => Some(Self::TimeoutError),
            50004 => Some(Self::RequestFailed),

            _ => None,
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::BadRequest => "Bad request",
            Self::InvalidRequestBody => "Invalid request body",
            Self::InvalidParameterName => "Invalid parameter name",
            Self::InvalidParameterValue => "Invalid parameter value",
            Self::InvalidChannelName => "Invalid channel name",
            Self::EncodingError => "Message data could not be encoded",

            Self::Unauthorized => "Unauthorized",
            Self::InvalidCredentials => "Invalid credentials",
            Self::IncompatibleCredentials => "Incompatible credentials",
            Self::InvalidUseOfBasicAuthOverHttp => "Invalid use of basic auth over non-TLS connection",
            Self::TokenExpired => "Token expired",
            Self::NoMeansToRenewToken => "No means provided to renew auth token",

            Self::Forbidden => "Forbidden",
            Self::NotFound => "Not found",
            Self::TooManyRequests => "Too many requests",

            Self::InternalServerError => "Internal server error",
            Self::TimeoutError => "Timeout error",
            Self::RequestFailed => "Request failed",
        }
    }
}

/// Convert HTTP status codes to Ably error codes
pub fn http_to_ably_code(status: u16) -> u32 {
    match status {
        400 => AblyErrorCode::BadRequest as u32,
        401 => AblyErrorCode::Unauthorized as u32,
        403 => AblyErrorCode::Forbidden as u32,
        404 => AblyErrorCode::NotFound as u32,
        429 => AblyErrorCode::TooManyRequests as u32,
        500 => AblyErrorCode::InternalServerError as u32,
        502..=504 => AblyErrorCode::RequestFailed as u32,
        other => u32::from(other) * 100,
    }
}
