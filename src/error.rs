//! Error types for the NHS FHIR client
//!
//! Every public API returns `Result<T, Error>`. Errors are grouped into
//! categories (see [`ErrorCategory`]) so callers can branch on the kind of
//! failure without matching on message text.

use crate::http::Response;
use crate::types::JwtAlgorithm;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("auth base url is missing")]
    BaseUrlMissing,

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] UrlError),

    #[error("kid (key identifier) is missing")]
    KidMissing,

    #[error("client id is missing")]
    ClientIdMissing,

    #[error("no private key, key file or custom signer configured")]
    KeyMissing,

    #[error("signing algorithm {0:?} is not an RSA algorithm")]
    InvalidSigningAlgorithm(JwtAlgorithm),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    // ============================================================================
    // Signing Errors
    // ============================================================================
    #[error("failed to read private key '{}': {source}", .path.display())]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse RSA private key: {0}")]
    KeyParse(#[source] jsonwebtoken::errors::Error),

    #[error("failed to sign client assertion: {message}")]
    Signing { message: String },

    // ============================================================================
    // Transport Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("request deadline exceeded")]
    DeadlineExceeded,

    // ============================================================================
    // Response Errors
    // ============================================================================
    #[error("You have exceeded the rate limit for this API (request {request_id})")]
    RateLimitExceeded {
        request_id: String,
        retry_after_seconds: Option<u64>,
    },

    #[error("HTTP {status}: {body}")]
    HttpStatus {
        status: u16,
        body: String,
        response: Box<Response>,
    },

    #[error("Failed to decode response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        response: Box<Response>,
    },

    #[error("Failed to encode request body: {0}")]
    Encode(#[source] serde_json::Error),

    // ============================================================================
    // Domain Validation Errors
    // ============================================================================
    #[error("invalid NHS number '{value}': {reason}")]
    InvalidNhsNumber {
        value: String,
        reason: NhsNumberError,
    },
}

/// Reasons an absolute URL check can fail
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlError {
    #[error("url scheme is empty")]
    SchemeMissing,

    #[error("url host is empty")]
    HostMissing,

    #[error("{0}")]
    Parse(url::ParseError),
}

/// Reasons an NHS number is rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NhsNumberError {
    #[error("must be exactly 10 digits")]
    Length,

    #[error("must contain only digits")]
    NonDigit,

    #[error("check digit does not match")]
    Checksum,
}

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Missing or malformed configuration; never retryable
    Configuration,
    /// Key material could not be read, parsed or used
    Signing,
    /// Connection, TLS, timeout or cancellation failures
    Transport,
    /// The API answered 429
    RateLimit,
    /// The API answered with a non-success status
    Status,
    /// The response body did not match the expected shape
    Decode,
    /// Input rejected before any request was made
    Validation,
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a signing error, for use by custom signers
    pub fn signing(message: impl Into<String>) -> Self {
        Self::Signing {
            message: message.into(),
        }
    }

    /// Classify this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::BaseUrlMissing
            | Error::InvalidUrl(_)
            | Error::KidMissing
            | Error::ClientIdMissing
            | Error::KeyMissing
            | Error::InvalidSigningAlgorithm(_)
            | Error::Config { .. }
            | Error::YamlParse(_) => ErrorCategory::Configuration,
            Error::KeyRead { .. } | Error::KeyParse(_) | Error::Signing { .. } => {
                ErrorCategory::Signing
            }
            Error::Http(_) | Error::Cancelled | Error::DeadlineExceeded => {
                ErrorCategory::Transport
            }
            Error::RateLimitExceeded { .. } => ErrorCategory::RateLimit,
            Error::HttpStatus { .. } => ErrorCategory::Status,
            Error::Decode { .. } | Error::Encode(_) => ErrorCategory::Decode,
            Error::InvalidNhsNumber { .. } => ErrorCategory::Validation,
        }
    }

    /// True for HTTP 429 responses
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Error::RateLimitExceeded { .. })
    }

    /// True for configuration problems detected before any I/O
    pub fn is_configuration(&self) -> bool {
        self.category() == ErrorCategory::Configuration
    }

    /// True if the caller's context was cancelled or its deadline passed
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled | Error::DeadlineExceeded)
    }

    /// Response metadata, when the server answered at all
    pub fn response(&self) -> Option<&Response> {
        match self {
            Error::HttpStatus { response, .. } | Error::Decode { response, .. } => {
                Some(response.as_ref())
            }
            _ => None,
        }
    }

    /// Status code of the failing response, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::RateLimitExceeded { .. } => Some(429),
            Error::HttpStatus { status, .. } => Some(*status),
            Error::Decode { response, .. } => Some(response.status().as_u16()),
            _ => None,
        }
    }
}

/// Result type alias for the client
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("test message");
        assert_eq!(err.to_string(), "Configuration error: test message");

        let err = Error::InvalidUrl(UrlError::HostMissing);
        assert_eq!(err.to_string(), "invalid url: url host is empty");

        let err = Error::InvalidNhsNumber {
            value: "123".to_string(),
            reason: NhsNumberError::Length,
        };
        assert_eq!(
            err.to_string(),
            "invalid NHS number '123': must be exactly 10 digits"
        );
    }

    #[test]
    fn test_category() {
        assert_eq!(Error::KidMissing.category(), ErrorCategory::Configuration);
        assert_eq!(
            Error::InvalidSigningAlgorithm(JwtAlgorithm::HS256).category(),
            ErrorCategory::Configuration
        );
        assert_eq!(Error::signing("hsm offline").category(), ErrorCategory::Signing);
        assert_eq!(Error::Cancelled.category(), ErrorCategory::Transport);
        assert_eq!(
            Error::RateLimitExceeded {
                request_id: "r".to_string(),
                retry_after_seconds: None
            }
            .category(),
            ErrorCategory::RateLimit
        );
        assert_eq!(
            Error::InvalidNhsNumber {
                value: "x".to_string(),
                reason: NhsNumberError::NonDigit
            }
            .category(),
            ErrorCategory::Validation
        );
    }

    #[test]
    fn test_predicates() {
        let limited = Error::RateLimitExceeded {
            request_id: "abc".to_string(),
            retry_after_seconds: Some(5),
        };
        assert!(limited.is_rate_limited());
        assert_eq!(limited.status(), Some(429));
        assert!(limited.response().is_none());

        assert!(Error::DeadlineExceeded.is_cancelled());
        assert!(Error::KeyMissing.is_configuration());
        assert!(!Error::Cancelled.is_configuration());
    }
}
