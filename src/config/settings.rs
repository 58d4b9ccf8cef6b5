//! Configuration settings structures for vk-notify
//!
//! This module defines all configuration structures that can be loaded from
//! TOML files and environment variables.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::error::ConfigError;
use crate::logger::{ConsoleConfig, FileConfig, LogFormat, LoggerConfig};

// ============================================================================
// Default value functions
// ============================================================================

fn default_app_name() -> String {
    "vk-notify".to_string()
}

fn default_app_version() -> String {
    crate::pkg_version().to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_api_version() -> String {
    "5.131".to_string()
}

fn default_api_url() -> String {
    "https://api.vk.com/method".to_string()
}

fn default_request_timeout() -> f64 {
    10.0
}

fn default_connect_timeout() -> f64 {
    5.0
}

fn default_max_media_bytes() -> u64 {
    200 * 1024 * 1024
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_log_path() -> String {
    "logs/vk-notify.log".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

const REDACTED: &str = "***";

fn redact(value: &str) -> &'static str {
    if value.is_empty() { "<unset>" } else { REDACTED }
}

// ============================================================================
// Application Configuration
// ============================================================================

/// Application basic information configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Application name
    #[serde(default = "default_app_name")]
    pub name: String,

    /// Application version
    #[serde(default = "default_app_version")]
    pub version: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            version: default_app_version(),
        }
    }
}

// ============================================================================
// Server Configuration
// ============================================================================

/// Axum HTTP server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,
}

impl ServerConfig {
    /// Get the full server address (host:port)
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

// ============================================================================
// Inbound Authentication
// ============================================================================

/// Shared secret the calling automation has to present in every request body
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    #[serde(default)]
    pub internal_token: String,
}

impl AuthConfig {
    /// Compares a caller-supplied token with the configured secret.
    ///
    /// An empty configured secret never matches.
    pub fn accepts(&self, candidate: Option<&str>) -> bool {
        match candidate {
            Some(token) if !self.internal_token.is_empty() => {
                constant_time_eq(token.as_bytes(), self.internal_token.as_bytes())
            }
            _ => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("internal_token", &redact(&self.internal_token))
            .finish()
    }
}

// ============================================================================
// VK Provider Configuration
// ============================================================================

/// Credentials and endpoints of the VK API
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct VkConfig {
    /// Community access token used for regular sends
    #[serde(default)]
    pub access_token: String,

    /// User token with community-admin rights, used for wall posts and uploads
    #[serde(default)]
    pub wall_access_token: Option<String>,

    /// Recipient of `messages.send`
    #[serde(default)]
    pub peer_id: String,

    /// Community id; required for wall posts only
    #[serde(default)]
    pub group_id: Option<String>,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Base URL under which API methods live
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Timeout in seconds applied to every outbound call
    #[serde(default = "default_request_timeout")]
    pub request_timeout: f64,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: f64,

    /// Largest media download accepted, in bytes
    #[serde(default = "default_max_media_bytes")]
    pub max_media_bytes: u64,
}

impl VkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout)
    }

    /// Wall token when configured, the community token otherwise.
    pub fn wall_token(&self) -> &str {
        self.wall_access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .unwrap_or(&self.access_token)
    }

    pub fn has_wall_token(&self) -> bool {
        self.wall_access_token
            .as_deref()
            .is_some_and(|token| !token.is_empty())
    }

    /// Positive community id parsed from `group_id`.
    pub fn group_id(&self) -> Result<u64, ConfigError> {
        let raw = self
            .group_id
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| ConfigError::validation("vk.group_id", "VK_GROUP_ID is not set"))?;

        raw.parse::<i64>()
            .map(|id| id.unsigned_abs())
            .map_err(|_| ConfigError::validation("vk.group_id", "VK_GROUP_ID must be an integer"))
    }

    /// Owner id of the community wall (negative group id).
    pub fn wall_owner_id(&self) -> Result<i64, ConfigError> {
        let group_id = self.group_id()?;
        i64::try_from(group_id)
            .map(|id| -id)
            .map_err(|_| ConfigError::validation("vk.group_id", "VK_GROUP_ID is out of range"))
    }

    /// Full URL of an API method.
    pub fn method_url(&self, method: &str) -> String {
        format!("{}/{}", self.api_url.trim_end_matches('/'), method)
    }
}

impl Default for VkConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            wall_access_token: None,
            peer_id: String::new(),
            group_id: None,
            api_version: default_api_version(),
            api_url: default_api_url(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            max_media_bytes: default_max_media_bytes(),
        }
    }
}

impl fmt::Debug for VkConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VkConfig")
            .field("access_token", &redact(&self.access_token))
            .field(
                "wall_access_token",
                &self.wall_access_token.as_deref().map(redact),
            )
            .field("peer_id", &self.peer_id)
            .field("group_id", &self.group_id)
            .field("api_version", &self.api_version)
            .field("api_url", &self.api_url)
            .field("request_timeout", &self.request_timeout)
            .field("connect_timeout", &self.connect_timeout)
            .field("max_media_bytes", &self.max_media_bytes)
            .finish()
    }
}

// ============================================================================
// Logger Settings (compatible with LoggerConfig)
// ============================================================================

/// Console output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSettings {
    /// Whether console output is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether to use colored output
    #[serde(default = "default_true")]
    pub colored: bool,
}

impl Default for ConsoleSettings {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            colored: default_true(),
        }
    }
}

/// File output settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSettings {
    /// Whether file output is enabled
    #[serde(default)]
    pub enabled: bool,

    /// Path to the log file
    #[serde(default = "default_log_path")]
    pub path: String,

    /// Whether to append to existing file
    #[serde(default = "default_true")]
    pub append: bool,

    /// Log format: "full", "compact", or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            path: default_log_path(),
            append: default_true(),
            format: default_log_format(),
        }
    }
}

/// Logger configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggerSettings {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Console output settings
    #[serde(default)]
    pub console: ConsoleSettings,

    /// File output settings
    #[serde(default)]
    pub file: FileSettings,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            console: ConsoleSettings::default(),
            file: FileSettings::default(),
        }
    }
}

impl LoggerSettings {
    /// Convert LoggerSettings to the runtime LoggerConfig
    pub fn into_logger_config(self) -> Result<LoggerConfig, ConfigError> {
        let console = ConsoleConfig::new(self.console.enabled, self.console.colored);
        let file = self.file.into_file_config()?;

        LoggerConfig::new(console, file, self.level).map_err(|e| ConfigError::ValidationError {
            field: "logger".to_string(),
            message: e.to_string(),
        })
    }
}

impl FileSettings {
    /// Convert FileSettings to FileConfig
    pub fn into_file_config(self) -> Result<FileConfig, ConfigError> {
        let format = self
            .format
            .parse::<LogFormat>()
            .map_err(|e| ConfigError::ValidationError {
                field: "logger.file.format".to_string(),
                message: e.to_string(),
            })?;

        Ok(FileConfig::new(
            self.enabled,
            PathBuf::from(self.path),
            self.append,
            format,
        ))
    }
}

// ============================================================================
// Main Settings Structure
// ============================================================================

/// Complete application settings
///
/// Built once at startup and shared read-only by every request handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Application information
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Inbound shared secret
    #[serde(default)]
    pub auth: AuthConfig,

    /// VK credentials and endpoints
    #[serde(default)]
    pub vk: VkConfig,

    /// Logger configuration
    #[serde(default)]
    pub logger: LoggerSettings,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_application_config_defaults() {
        let config = ApplicationConfig::default();
        assert_eq!(config.name, "vk-notify");
        assert_eq!(config.version, crate::pkg_version());
    }

    #[test]
    fn test_server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.address(), "0.0.0.0:8000");
    }

    #[test]
    fn test_vk_config_defaults() {
        let config = VkConfig::default();
        assert_eq!(config.api_version, "5.131");
        assert_eq!(config.api_url, "https://api.vk.com/method");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.wall_access_token.is_none());
    }

    #[test]
    fn test_method_url_strips_trailing_slash() {
        let config = VkConfig {
            api_url: "http://localhost:9000/method/".to_string(),
            ..VkConfig::default()
        };
        assert_eq!(
            config.method_url("messages.send"),
            "http://localhost:9000/method/messages.send"
        );
    }

    #[test]
    fn test_wall_token_falls_back_to_access_token() {
        let mut config = VkConfig {
            access_token: "community".to_string(),
            ..VkConfig::default()
        };
        assert_eq!(config.wall_token(), "community");
        assert!(!config.has_wall_token());

        config.wall_access_token = Some(String::new());
        assert_eq!(config.wall_token(), "community");

        config.wall_access_token = Some("user".to_string());
        assert_eq!(config.wall_token(), "user");
        assert!(config.has_wall_token());
    }

    #[test]
    fn test_group_id_parsing() {
        let mut config = VkConfig::default();
        assert!(config.group_id().is_err());

        config.group_id = Some(" -12345 ".to_string());
        assert_eq!(config.group_id().unwrap(), 12345);
        assert_eq!(config.wall_owner_id().unwrap(), -12345);

        config.group_id = Some("club1".to_string());
        let err = config.group_id().unwrap_err();
        assert!(err.to_string().contains("must be an integer"));
    }

    #[test]
    fn test_debug_output_redacts_secrets() {
        let settings = Settings {
            auth: AuthConfig {
                internal_token: "inbound-secret".to_string(),
            },
            vk: VkConfig {
                access_token: "vk1.a.community-secret".to_string(),
                wall_access_token: Some("vk1.a.user-secret".to_string()),
                peer_id: "2000000001".to_string(),
                ..VkConfig::default()
            },
            ..Settings::default()
        };

        let rendered = format!("{:?}", settings);
        assert!(!rendered.contains("inbound-secret"));
        assert!(!rendered.contains("community-secret"));
        assert!(!rendered.contains("user-secret"));
        assert!(rendered.contains("2000000001"));
    }

    #[test]
    fn test_auth_accepts_only_exact_token() {
        let auth = AuthConfig {
            internal_token: "T".to_string(),
        };
        assert!(auth.accepts(Some("T")));
        assert!(!auth.accepts(Some("t")));
        assert!(!auth.accepts(Some("TT")));
        assert!(!auth.accepts(Some("")));
        assert!(!auth.accepts(None));
    }

    #[test]
    fn test_auth_with_empty_secret_rejects_everything() {
        let auth = AuthConfig::default();
        assert!(!auth.accepts(Some("")));
        assert!(!auth.accepts(None));
    }

    #[test]
    fn test_logger_settings_conversion() {
        let settings = LoggerSettings {
            level: "debug".to_string(),
            ..LoggerSettings::default()
        };
        let config = settings.into_logger_config().unwrap();
        assert_eq!(config.level, "debug");
        assert!(config.console.enabled);
        assert!(!config.file.enabled);
    }

    #[test]
    fn test_logger_settings_invalid_format() {
        let settings = LoggerSettings {
            file: FileSettings {
                format: "xml".to_string(),
                ..FileSettings::default()
            },
            ..LoggerSettings::default()
        };
        assert!(settings.into_logger_config().is_err());
    }

    proptest! {
        #[test]
        fn prop_auth_rejects_any_other_token(secret in "[A-Za-z0-9]{1,32}", other in "[A-Za-z0-9]{0,32}") {
            let auth = AuthConfig { internal_token: secret.clone() };
            prop_assert!(auth.accepts(Some(&secret)));
            prop_assert_eq!(auth.accepts(Some(&other)), other == secret);
        }
    }
}
