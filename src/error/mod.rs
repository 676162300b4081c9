//! Error Types
//!
//! Error hierarchy for tenant OAuth operations. Every failure surfaces to
//! the caller on the originating call; nothing here retries or swallows.

use thiserror::Error;

/// Root error type for OAuth operations.
#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Token endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Authorization wait was cancelled")]
    Cancelled,
}

impl OAuthError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "OAUTH_CONFIG",
            Self::Protocol(_) => "OAUTH_PROTOCOL",
            Self::Network(_) => "OAUTH_NETWORK",
            Self::HttpStatus { .. } => "OAUTH_HTTP_STATUS",
            Self::Parse(_) => "OAUTH_PARSE",
            Self::Cancelled => "OAUTH_CANCELLED",
        }
    }

    /// Check if error means the caller must authorize (or supply a secret)
    /// before requesting a token again.
    pub fn needs_authorization(&self) -> bool {
        matches!(self, Self::Configuration(ConfigurationError::NotAuthorized))
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("token request must be preceded by an authorization call when no client secret is specified")]
    NotAuthorized,

    #[error("invalid tenant URL: {url}")]
    InvalidTenantUrl { url: String },
}

/// Protocol error: the peer (or the caller's input) violated the flow contract.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("authorization callback does not contain the \"code\" parameter")]
    MissingCode,

    #[error("invalid redirect URI: {uri}")]
    InvalidRedirectUri { uri: String },

    #[error("token response is missing required field: {field}")]
    MissingField { field: String },
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("failed to bind callback listener on {addr}: {source}")]
    BindFailed {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request to token endpoint failed: {message}")]
    RequestFailed { message: String },

    #[error("failed to build HTTP client: {message}")]
    ClientBuild { message: String },
}

/// Response parsing error.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("token response is not valid JSON: {message}")]
    InvalidJson { message: String },
}

/// Result type for OAuth operations.
pub type OAuthResult<T> = Result<T, OAuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            OAuthError::Configuration(ConfigurationError::NotAuthorized).error_code(),
            "OAUTH_CONFIG"
        );
        assert_eq!(OAuthError::Cancelled.error_code(), "OAUTH_CANCELLED");
        assert_eq!(
            OAuthError::HttpStatus {
                status: 401,
                body: String::new()
            }
            .error_code(),
            "OAUTH_HTTP_STATUS"
        );
    }

    #[test]
    fn test_needs_authorization() {
        assert!(OAuthError::Configuration(ConfigurationError::NotAuthorized).needs_authorization());
        assert!(!OAuthError::Cancelled.needs_authorization());
        assert!(!OAuthError::Protocol(ProtocolError::MissingCode).needs_authorization());
    }

    #[test]
    fn test_cancellation_is_distinct_from_protocol() {
        // Cancellation must never be reported as a protocol failure.
        let err = OAuthError::Cancelled;
        assert!(!matches!(err, OAuthError::Protocol(_)));
    }
}
