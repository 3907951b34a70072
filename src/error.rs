//! Error types for batch-media
//!
//! This module provides error handling for the crate, including:
//! - Request-level errors that abort a batch before it starts
//! - Item-level fetch and codec errors that batches absorb and log
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for batch-media operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for batch-media
///
/// Only request-level problems ever reach a caller through this type. Per-URL and
/// per-file failures are folded into batch summaries and reports instead.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "fetch.max_concurrent")
        key: Option<String>,
    },

    /// A required multipart field was not present in the request
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The multipart body could not be read
    #[error("invalid multipart body: {0}")]
    InvalidMultipart(String),

    /// The uploaded table could not be parsed
    #[error("invalid table: {0}")]
    InvalidTable(String),

    /// The uploaded table lacks required columns
    #[error("table is missing required columns: {}", missing.join(", "))]
    MissingColumns {
        /// Names of the required columns that were not found in the header
        missing: Vec<String>,
    },

    /// No files were uploaded for compression
    #[error("no files uploaded")]
    EmptyUpload,

    /// Writing the output archive failed
    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The request was cancelled before the batch completed
    #[error("request cancelled")]
    Cancelled,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a configuration error tied to a specific key
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
            key: Some(key.into()),
        }
    }
}

/// Classified failure of a single image fetch
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The URL could not be parsed
    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Why parsing failed
        reason: String,
    },

    /// The request exceeded the configured timeout
    #[error("timeout fetching '{url}' (exceeded {timeout_secs} seconds)")]
    Timeout {
        /// The URL being fetched
        url: String,
        /// Timeout that was exceeded, in seconds
        timeout_secs: u64,
    },

    /// The remote host could not be reached
    #[error("connection failed for '{url}': {reason}")]
    Connect {
        /// The URL being fetched
        url: String,
        /// Underlying connection error
        reason: String,
    },

    /// The remote host answered with a non-success status
    #[error("HTTP {status} fetching '{url}'")]
    Status {
        /// The URL being fetched
        url: String,
        /// The HTTP status code returned
        status: u16,
    },

    /// The response body could not be read
    #[error("failed to read response body from '{url}': {reason}")]
    Body {
        /// The URL being fetched
        url: String,
        /// Underlying read error
        reason: String,
    },

    /// Any other transport-level failure
    #[error("failed to fetch '{url}': {reason}")]
    Transport {
        /// The URL being fetched
        url: String,
        /// Underlying transport error
        reason: String,
    },

    /// The owning request was cancelled while the fetch was in flight
    #[error("fetch of '{url}' cancelled")]
    Cancelled {
        /// The URL being fetched
        url: String,
    },
}

impl FetchError {
    /// The URL this failure refers to
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Connect { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Body { url, .. }
            | FetchError::Transport { url, .. }
            | FetchError::Cancelled { url } => url,
        }
    }

    /// Short machine-readable classification of the failure
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl { .. } => "invalid_url",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Connect { .. } => "connect",
            FetchError::Status { .. } => "status",
            FetchError::Body { .. } => "body",
            FetchError::Transport { .. } => "transport",
            FetchError::Cancelled { .. } => "cancelled",
        }
    }
}

/// Image codec failures
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// The bytes are not in any recognised image format
    #[error("unrecognized image format")]
    Unrecognized,

    /// The format was recognised but the data could not be decoded
    #[error("failed to decode {format} image: {reason}")]
    Decode {
        /// Detected format name
        format: String,
        /// Underlying decoder error
        reason: String,
    },

    /// Re-encoding failed
    #[error("failed to encode {format} image: {reason}")]
    Encode {
        /// Target format name
        format: String,
        /// Underlying encoder error
        reason: String,
    },

    /// The input exceeds the configured per-file limit
    #[error("image of {size} bytes exceeds the {limit} byte processing limit")]
    TooLarge {
        /// Size of the input in bytes
        size: u64,
        /// Configured limit in bytes
        limit: u64,
    },
}

/// API error response format
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": {
///     "code": "missing_columns",
///     "message": "table is missing required columns: images",
///     "details": {
///       "missing": ["images"]
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// The error details
    pub error: ErrorDetail,
}

/// Detailed error information for API responses
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g., "empty_upload", "invalid_table")
    pub code: String,

    /// Human-readable error message
    pub message: String,

    /// Optional additional context about the error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed request structure
            Error::Config { .. } => 400,
            Error::MissingField(_) => 400,
            Error::InvalidMultipart(_) => 400,
            Error::InvalidTable(_) => 400,
            Error::MissingColumns { .. } => 400,
            Error::EmptyUpload => 400,

            // 503 Service Unavailable
            Error::Cancelled => 503,

            // 500 Internal Server Error
            Error::Archive(_) => 500,
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::MissingField(_) => "missing_field",
            Error::InvalidMultipart(_) => "invalid_multipart",
            Error::InvalidTable(_) => "invalid_table",
            Error::MissingColumns { .. } => "missing_columns",
            Error::EmptyUpload => "empty_upload",
            Error::Archive(_) => "archive_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::Cancelled => "cancelled",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            Error::MissingField(field) => Some(serde_json::json!({
                "field": field,
            })),
            Error::MissingColumns { missing } => Some(serde_json::json!({
                "missing": missing,
            })),
            _ => None,
        };

        ApiError {
            error: ErrorDetail {
                code,
                message,
                details,
            },
        }
    }
}
