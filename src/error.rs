//! Unified error handling for the printquote CLI
//!
//! This module provides:
//! - Unique error codes for debugging and documentation
//! - Structured error information with context
//! - Convenient constructor methods
//! - Automatic conversions from common error types

use std::fmt;
use thiserror::Error;

use crate::validation::FieldErrors;

/// Unified Result type for all printquote operations
pub type Result<T> = std::result::Result<T, PqError>;

/// Error codes for printquote operations
///
/// Each error has a unique code in the format `PQXXX` where:
/// - PQ1XX: Authentication and authorization errors
/// - PQ2XX: Network and API errors
/// - PQ3XX: File and I/O errors
/// - PQ4XX: Configuration errors
/// - PQ5XX: Validation and input errors
/// - PQ7XX: Quote and resource errors
/// - PQ8XX: UI and interaction errors
/// - PQ9XX: Internal errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Authentication (PQ1XX)
    /// PQ101: Authentication failed
    AuthenticationFailed,
    /// PQ102: Authorization denied
    AuthorizationDenied,
    /// PQ103: Session expired or rejected by the server
    SessionExpired,
    /// PQ105: No session stored
    NotLoggedIn,

    // Network (PQ2XX)
    /// PQ201: HTTP request failed
    HttpError,
    /// PQ202: Connection timeout
    ConnectionTimeout,
    /// PQ204: Connection refused
    ConnectionRefused,
    /// PQ205: API returned error response
    ApiError,
    /// PQ206: Invalid API response format
    InvalidResponse,

    // File/IO (PQ3XX)
    /// PQ301: File not found
    FileNotFound,
    /// PQ302: File read error
    FileReadError,
    /// PQ303: File write error
    FileWriteError,

    // Configuration (PQ4XX)
    /// PQ401: Configuration error
    ConfigError,
    /// PQ402: Invalid endpoint URL
    InvalidEndpoint,

    // Validation (PQ5XX)
    /// PQ501: Invalid input
    InvalidInput,
    /// PQ502: Validation failed
    ValidationFailed,
    /// PQ503: Quote draft rejected by the submission gate
    DraftRejected,

    // Quote/Resource (PQ7XX)
    /// PQ701: Quote not found
    QuoteNotFound,
    /// PQ702: Conflicting state on the server
    Conflict,
    /// PQ703: Optimization not available for this quote
    OptimizationUnavailable,
    /// PQ704: Another fetch or apply is pending
    Busy,

    // UI (PQ8XX)
    /// PQ801: Dialog error
    DialogError,

    // Internal (PQ9XX)
    /// PQ901: Internal error
    InternalError,
    /// PQ902: Serialization error
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u16 {
        match self {
            ErrorCode::AuthenticationFailed => 101,
            ErrorCode::AuthorizationDenied => 102,
            ErrorCode::SessionExpired => 103,
            ErrorCode::NotLoggedIn => 105,

            ErrorCode::HttpError => 201,
            ErrorCode::ConnectionTimeout => 202,
            ErrorCode::ConnectionRefused => 204,
            ErrorCode::ApiError => 205,
            ErrorCode::InvalidResponse => 206,

            ErrorCode::FileNotFound => 301,
            ErrorCode::FileReadError => 302,
            ErrorCode::FileWriteError => 303,

            ErrorCode::ConfigError => 401,
            ErrorCode::InvalidEndpoint => 402,

            ErrorCode::InvalidInput => 501,
            ErrorCode::ValidationFailed => 502,
            ErrorCode::DraftRejected => 503,

            ErrorCode::QuoteNotFound => 701,
            ErrorCode::Conflict => 702,
            ErrorCode::OptimizationUnavailable => 703,
            ErrorCode::Busy => 704,

            ErrorCode::DialogError => 801,

            ErrorCode::InternalError => 901,
            ErrorCode::SerializationError => 902,
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PQ{}", self.code())
    }
}

/// Main error type for all printquote operations
#[derive(Error, Debug)]
pub enum PqError {
    // ==================== Authentication Errors (PQ1XX) ====================
    /// Authentication failed
    #[error("[{code}] Authentication failed: {message}")]
    Authentication { code: ErrorCode, message: String },

    /// Authorization denied
    #[error("[{code}] Authorization denied: {message}")]
    Authorization { code: ErrorCode, message: String },

    // ==================== Network Errors (PQ2XX) ====================
    /// Request never got a response
    #[error("[{code}] Network error: {message}")]
    Network {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<reqwest::Error>,
    },

    /// Error status reported by the server
    #[error("[{code}] API error ({status}): {message}")]
    Api {
        code: ErrorCode,
        status: u16,
        message: String,
    },

    // ==================== File/IO Errors (PQ3XX) ====================
    #[error("[{code}] {context}: {message}")]
    Io {
        code: ErrorCode,
        context: String,
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // ==================== Configuration Errors (PQ4XX) ====================
    #[error("[{code}] Configuration error: {message}")]
    Config {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<config::ConfigError>,
    },

    // ==================== Validation Errors (PQ5XX) ====================
    #[error("[{code}] Validation error: {message}")]
    Validation {
        code: ErrorCode,
        message: String,
        field: Option<String>,
    },

    /// Submission gate refused a draft; carries every field message
    #[error("[{code}] Quote has {} invalid field(s)", errors.len())]
    InvalidDraft { code: ErrorCode, errors: FieldErrors },

    #[error("[{code}] Invalid input: {message}")]
    InvalidInput { code: ErrorCode, message: String },

    // ==================== Quote/Resource Errors (PQ7XX) ====================
    #[error("[{code}] Not found: {resource}")]
    NotFound { code: ErrorCode, resource: String },

    #[error("[{code}] Conflict: {message}")]
    Conflict { code: ErrorCode, message: String },

    /// Optimization workflow refused the operation
    #[error("[{code}] Optimization: {message}")]
    Optimization { code: ErrorCode, message: String },

    // ==================== UI Errors (PQ8XX) ====================
    #[error("[{code}] UI error: {message}")]
    Ui { code: ErrorCode, message: String },

    // ==================== Internal Errors (PQ9XX) ====================
    #[error("[{code}] Internal error: {message}")]
    Internal { code: ErrorCode, message: String },

    #[error("[{code}] Serialization error: {message}")]
    Serialization {
        code: ErrorCode,
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },
}

// ==================== Constructor Methods ====================

impl PqError {
    // --- Authentication ---

    /// Create authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::AuthenticationFailed,
            message: message.into(),
        }
    }

    /// Create session expired error (server answered 401 to a protected request)
    pub fn session_expired(message: impl Into<String>) -> Self {
        Self::Authentication {
            code: ErrorCode::SessionExpired,
            message: message.into(),
        }
    }

    /// Create not logged in error
    pub fn not_logged_in() -> Self {
        Self::Authentication {
            code: ErrorCode::NotLoggedIn,
            message: "Not logged in. Run `printquote login` first.".to_string(),
        }
    }

    /// Create authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        Self::Authorization {
            code: ErrorCode::AuthorizationDenied,
            message: message.into(),
        }
    }

    // --- Network ---

    /// Create network error from reqwest error
    pub fn network_from_reqwest(err: reqwest::Error) -> Self {
        let code = if err.is_timeout() {
            ErrorCode::ConnectionTimeout
        } else if err.is_connect() {
            ErrorCode::ConnectionRefused
        } else {
            ErrorCode::HttpError
        };

        Self::Network {
            code,
            message: err.to_string(),
            source: Some(err),
        }
    }

    /// Create API error
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::ApiError,
            status,
            message: message.into(),
        }
    }

    /// Create invalid response error
    pub fn invalid_response(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            code: ErrorCode::InvalidResponse,
            status,
            message: message.into(),
        }
    }

    // --- File/IO ---

    /// Create IO error from std::io::Error
    pub fn io_from_error(context: impl Into<String>, err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::FileWriteError,
            _ => ErrorCode::FileReadError,
        };

        Self::Io {
            code,
            context: context.into(),
            message: err.to_string(),
            source: Some(err),
        }
    }

    // --- Configuration ---

    /// Create configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: message.into(),
            source: None,
        }
    }

    /// Create invalid endpoint error
    pub fn invalid_endpoint(message: impl Into<String>) -> Self {
        Self::Config {
            code: ErrorCode::InvalidEndpoint,
            message: message.into(),
            source: None,
        }
    }

    // --- Validation ---

    /// Create validation error with field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create rejected draft error
    pub fn invalid_draft(errors: FieldErrors) -> Self {
        Self::InvalidDraft {
            code: ErrorCode::DraftRejected,
            errors,
        }
    }

    /// Create invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            code: ErrorCode::InvalidInput,
            message: message.into(),
        }
    }

    // --- Quote/Resource ---

    /// Create quote not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            code: ErrorCode::QuoteNotFound,
            resource: resource.into(),
        }
    }

    /// Create conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            code: ErrorCode::Conflict,
            message: message.into(),
        }
    }

    /// Create optimization unavailable error
    pub fn optimization_unavailable(message: impl Into<String>) -> Self {
        Self::Optimization {
            code: ErrorCode::OptimizationUnavailable,
            message: message.into(),
        }
    }

    /// Create busy error
    pub fn busy(message: impl Into<String>) -> Self {
        Self::Optimization {
            code: ErrorCode::Busy,
            message: message.into(),
        }
    }

    // --- Internal ---

    /// Create internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            code: ErrorCode::InternalError,
            message: message.into(),
        }
    }

    // --- Utility Methods ---

    /// Get the error code
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Authentication { code, .. } => *code,
            Self::Authorization { code, .. } => *code,
            Self::Network { code, .. } => *code,
            Self::Api { code, .. } => *code,
            Self::Io { code, .. } => *code,
            Self::Config { code, .. } => *code,
            Self::Validation { code, .. } => *code,
            Self::InvalidDraft { code, .. } => *code,
            Self::InvalidInput { code, .. } => *code,
            Self::NotFound { code, .. } => *code,
            Self::Conflict { code, .. } => *code,
            Self::Optimization { code, .. } => *code,
            Self::Ui { code, .. } => *code,
            Self::Internal { code, .. } => *code,
            Self::Serialization { code, .. } => *code,
        }
    }

    /// Field messages of a rejected draft
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::InvalidDraft { errors, .. } => Some(errors),
            _ => None,
        }
    }
}

// ==================== From Implementations ====================

impl From<std::io::Error> for PqError {
    fn from(err: std::io::Error) -> Self {
        Self::io_from_error("IO operation", err)
    }
}

impl From<reqwest::Error> for PqError {
    fn from(err: reqwest::Error) -> Self {
        Self::network_from_reqwest(err)
    }
}

impl From<serde_json::Error> for PqError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            code: ErrorCode::SerializationError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<config::ConfigError> for PqError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config {
            code: ErrorCode::ConfigError,
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<url::ParseError> for PqError {
    fn from(err: url::ParseError) -> Self {
        Self::invalid_endpoint(format!("Invalid endpoint URL: {}", err))
    }
}

impl From<dialoguer::Error> for PqError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Ui {
            code: ErrorCode::DialogError,
            message: format!("Dialog error: {}", err),
        }
    }
}

impl From<validator::ValidationErrors> for PqError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field = err.field_errors().keys().next().map(|key| key.to_string());
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: err.to_string(),
            field,
        }
    }
}

// Manual Clone implementation that drops non-cloneable sources
impl Clone for PqError {
    fn clone(&self) -> Self {
        match self {
            Self::Authentication { code, message } => Self::Authentication {
                code: *code,
                message: message.clone(),
            },
            Self::Authorization { code, message } => Self::Authorization {
                code: *code,
                message: message.clone(),
            },
            Self::Network {
                code,
                message,
                source: _,
            } => Self::Network {
                code: *code,
                message: message.clone(),
                source: None,
            },
            Self::Api {
                code,
                status,
                message,
            } => Self::Api {
                code: *code,
                status: *status,
                message: message.clone(),
            },
            Self::Io {
                code,
                context,
                message,
                source: _,
            } => Self::Io {
                code: *code,
                context: context.clone(),
                message: message.clone(),
                source: None,
            },
            Self::Config {
                code,
                message,
                source: _,
            } => Self::Config {
                code: *code,
                message: message.clone(),
                source: None,
            },
            Self::Validation {
                code,
                message,
                field,
            } => Self::Validation {
                code: *code,
                message: message.clone(),
                field: field.clone(),
            },
            Self::InvalidDraft { code, errors } => Self::InvalidDraft {
                code: *code,
                errors: errors.clone(),
            },
            Self::InvalidInput { code, message } => Self::InvalidInput {
                code: *code,
                message: message.clone(),
            },
            Self::NotFound { code, resource } => Self::NotFound {
                code: *code,
                resource: resource.clone(),
            },
            Self::Conflict { code, message } => Self::Conflict {
                code: *code,
                message: message.clone(),
            },
            Self::Optimization { code, message } => Self::Optimization {
                code: *code,
                message: message.clone(),
            },
            Self::Ui { code, message } => Self::Ui {
                code: *code,
                message: message.clone(),
            },
            Self::Internal { code, message } => Self::Internal {
                code: *code,
                message: message.clone(),
            },
            Self::Serialization {
                code,
                message,
                source: _,
            } => Self::Serialization {
                code: *code,
                message: message.clone(),
                source: None,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::Field;

    #[test]
    fn test_error_codes() {
        assert_eq!(ErrorCode::AuthenticationFailed.code(), 101);
        assert_eq!(ErrorCode::HttpError.code(), 201);
        assert_eq!(ErrorCode::DraftRejected.code(), 503);
        assert_eq!(ErrorCode::OptimizationUnavailable.code(), 703);
    }

    #[test]
    fn test_error_code_string() {
        assert_eq!(ErrorCode::AuthenticationFailed.to_string(), "PQ101");
        assert_eq!(ErrorCode::Busy.to_string(), "PQ704");
    }

    #[test]
    fn test_error_display() {
        let err = PqError::authentication("Invalid credentials");
        assert!(err.to_string().contains("PQ101"));
        assert!(err.to_string().contains("Invalid credentials"));

        let err = PqError::api(500, "boom");
        assert_eq!(err.to_string(), "[PQ205] API error (500): boom");
    }

    #[test]
    fn test_invalid_draft_carries_field_errors() {
        let mut errors = FieldErrors::default();
        errors.set(Field::PrinterWatts, Some("Watts must be > 0"));
        let err = PqError::invalid_draft(errors);

        assert_eq!(err.code(), ErrorCode::DraftRejected);
        assert!(err.to_string().contains("1 invalid field"));
        let cloned = err.clone();
        assert_eq!(
            cloned.field_errors().and_then(|e| e.get(Field::PrinterWatts)),
            Some("Watts must be > 0")
        );
    }
}
