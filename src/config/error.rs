//! Configuration error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// A setting is present but unusable, or a required one is missing
    #[error("Validation error: {field} - {message}")]
    ValidationError { field: String, message: String },

    /// A deployment variable such as `VK_REQUEST_TIMEOUT` holds a value of the wrong shape
    #[error("Environment variable {name} is invalid: expected {expected}, got '{value}'")]
    InvalidEnvVar {
        name: String,
        value: String,
        expected: &'static str,
    },

    /// Unknown application environment name
    #[error("Unknown environment '{0}'. Valid values are: development, test, staging, production")]
    UnknownEnvironment(String),

    #[error("Mutual exclusivity error: {0}")]
    MutualExclusivityError(String),

    #[error("Configuration error: {0}")]
    Other(#[from] config::ConfigError),
}

impl ConfigError {
    pub fn validation<S: Into<String>>(field: S, message: S) -> Self {
        ConfigError::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Required setting that ended up empty, named by both its key and its env var.
    pub fn missing(field: &str, env_var: &str) -> Self {
        ConfigError::ValidationError {
            field: field.to_string(),
            message: format!("{} is not set", env_var),
        }
    }

    pub fn invalid_env(name: &str, value: &str, expected: &'static str) -> Self {
        ConfigError::InvalidEnvVar {
            name: name.to_string(),
            value: value.to_string(),
            expected,
        }
    }

    pub fn file_not_found<S: Into<String>>(path: S) -> Self {
        ConfigError::FileNotFound(path.into())
    }

    pub fn mutual_exclusivity<S: Into<String>>(message: S) -> Self {
        ConfigError::MutualExclusivityError(message.into())
    }
}
