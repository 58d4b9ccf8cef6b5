use thiserror::Error;

/// Application-wide error type covering every way a forwarding request can fail.
///
/// Each variant maps to exactly one HTTP status in the error handler, so the
/// caller can tell a bad request apart from an upstream failure without
/// parsing the message.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or mismatched shared secret
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    /// Missing or malformed request field
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    /// Request body could not be parsed
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// The referenced media could not be downloaded
    #[error("Media fetch failed: {message}")]
    MediaFetch { message: String, timed_out: bool },

    /// The referenced media is not of the expected class
    #[error("URL does not point to {expected} (content-type {actual})")]
    MediaType { expected: String, actual: String },

    /// A step of the VK upload handshake failed
    #[error("Upload failed at {step}: {message}")]
    Upload {
        step: String,
        message: String,
        error_code: Option<i64>,
        timed_out: bool,
    },

    /// VK rejected the final send or post call
    #[error("Delivery failed: {message}")]
    Delivery {
        method: String,
        message: String,
        error_code: Option<i64>,
        timed_out: bool,
    },

    /// Configuration value missing or unusable at request time
    #[error("Configuration error: {key} - {message}")]
    Configuration { key: String, message: String },

    /// Internal error for unexpected failures
    #[error("Internal error")]
    Internal {
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    pub fn unauthorized() -> Self {
        AppError::Unauthorized {
            message: "Invalid token".to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn configuration(key: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Configuration {
            key: key.into(),
            message: message.into(),
        }
    }

    /// True when the failure was caused by an upstream timeout.
    pub fn is_timeout(&self) -> bool {
        match self {
            AppError::MediaFetch { timed_out, .. }
            | AppError::Upload { timed_out, .. }
            | AppError::Delivery { timed_out, .. } => *timed_out,
            _ => false,
        }
    }

    /// True for failures caused by a remote party rather than the caller.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            AppError::MediaFetch { .. }
                | AppError::MediaType { .. }
                | AppError::Upload { .. }
                | AppError::Delivery { .. }
        )
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal { source: error }
    }
}

impl From<crate::config::error::ConfigError> for AppError {
    fn from(error: crate::config::error::ConfigError) -> Self {
        match error {
            crate::config::error::ConfigError::ValidationError { field, message } => {
                AppError::Configuration {
                    key: field,
                    message,
                }
            }
            other => AppError::Configuration {
                key: "config".to_string(),
                message: other.to_string(),
            },
        }
    }
}

/// Type alias for Result with AppError to simplify function signatures
pub type AppResult<T> = Result<T, AppError>;
