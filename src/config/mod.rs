//! Configuration management module for vk-notify
//!
//! This module provides layered configuration loading with support for:
//! - TOML configuration files
//! - `VKNOTIFY_*` environment variable overrides
//! - The flat deployment variables (`INTERNAL_TOKEN`, `VK_*`, `PORT`)
//!
//! # Configuration Priority (lowest to highest)
//! 1. `default.toml` - Base default configuration
//! 2. `{environment}.toml` - Environment-specific configuration
//! 3. `local.toml` - Local overrides (not committed to version control)
//! 4. `VKNOTIFY_*` environment variables
//! 5. Flat deployment variables

pub mod environment;
pub mod error;
pub mod loader;
pub mod settings;
pub mod validation;

pub use environment::Environment;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use settings::{AuthConfig, Settings, VkConfig};
