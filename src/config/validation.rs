//! Configuration validation logic
//!
//! Every check names the settings key that failed so startup errors point
//! straight at the offending variable.

use reqwest::Url;

use crate::config::error::ConfigError;
use crate::config::settings::{AuthConfig, LoggerSettings, ServerConfig, Settings, VkConfig};

/// Valid log levels
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Valid log formats
const VALID_LOG_FORMATS: &[&str] = &["full", "compact", "json"];

impl ServerConfig {
    /// Port must be non-zero and the host non-empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::validation(
                "server.host",
                "Host must not be empty.",
            ));
        }

        if self.port == 0 {
            return Err(ConfigError::validation(
                "server.port",
                "Port must be between 1 and 65535. Please specify a valid port number.",
            ));
        }

        Ok(())
    }
}

impl AuthConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.internal_token.is_empty() {
            return Err(ConfigError::missing("auth.internal_token", "INTERNAL_TOKEN"));
        }
        Ok(())
    }
}

impl VkConfig {
    /// Validate VK credentials and endpoints
    ///
    /// # Validation Rules
    /// - access token and peer id must be set
    /// - group id, when set, must be an integer
    /// - API URL must be an absolute http(s) URL
    /// - timeouts must be positive and finite
    /// - the media size limit must be non-zero
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_token.is_empty() {
            return Err(ConfigError::missing("vk.access_token", "VK_ACCESS_TOKEN"));
        }

        if self.peer_id.trim().is_empty() {
            return Err(ConfigError::missing("vk.peer_id", "VK_PEER_ID"));
        }

        if self
            .group_id
            .as_deref()
            .is_some_and(|value| !value.trim().is_empty())
        {
            self.group_id()?;
        }

        if self.api_version.trim().is_empty() {
            return Err(ConfigError::validation(
                "vk.api_version",
                "API version must not be empty.",
            ));
        }

        let url = Url::parse(&self.api_url).map_err(|_| {
            ConfigError::validation("vk.api_url", "API URL must be an absolute URL.")
        })?;
        if url.scheme() != "https" && url.scheme() != "http" {
            return Err(ConfigError::validation(
                "vk.api_url",
                "API URL must use http or https protocol.",
            ));
        }

        if !(self.request_timeout.is_finite() && self.request_timeout > 0.0) {
            return Err(ConfigError::validation(
                "vk.request_timeout",
                "Request timeout must be greater than 0 seconds.",
            ));
        }

        if !(self.connect_timeout.is_finite() && self.connect_timeout > 0.0) {
            return Err(ConfigError::validation(
                "vk.connect_timeout",
                "Connect timeout must be greater than 0 seconds.",
            ));
        }

        if self.max_media_bytes == 0 {
            return Err(ConfigError::validation(
                "vk.max_media_bytes",
                "Media size limit must be greater than 0 bytes.",
            ));
        }

        Ok(())
    }
}

impl LoggerSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.level".to_string(),
                message: format!(
                    "Invalid log level '{}'. Valid levels are: {}",
                    self.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        let format = self.file.format.to_lowercase();
        if !VALID_LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: format!(
                    "Invalid log format '{}'. Valid formats are: {}",
                    self.file.format,
                    VALID_LOG_FORMATS.join(", ")
                ),
            });
        }

        if self.file.enabled && self.file.path.trim().is_empty() {
            return Err(ConfigError::validation(
                "logger.file.path",
                "Log file path is required when file output is enabled.",
            ));
        }

        if !self.console.enabled && !self.file.enabled {
            return Err(ConfigError::validation(
                "logger",
                "At least one output (console or file) must be enabled.",
            ));
        }

        Ok(())
    }
}

impl Settings {
    /// Validate every section, stopping at the first failure
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.auth.validate()?;
        self.vk.validate()?;
        self.logger.validate()?;
        Ok(())
    }
}
