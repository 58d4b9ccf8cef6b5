//! Configuration loader for vk-notify
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from multiple sources with proper precedence.

use std::path::{Path, PathBuf};

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, Environment, File, FileFormat, Value};

use crate::config::environment::Environment as AppEnvironment;
use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for configuration directory
const CONFIG_DIR_ENV: &str = "VKNOTIFY_CONFIG_DIR";

/// Environment variable for specific configuration file
pub const CONFIG_FILE_ENV: &str = "VKNOTIFY_CONFIG_FILE";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for nested configuration overrides
const ENV_PREFIX: &str = "VKNOTIFY";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Flat deployment variables and the settings keys they override.
///
/// These are the names the service has always been deployed with, so they
/// take precedence over files and `VKNOTIFY_*` variables.
const DEPLOYMENT_VARS: &[(&str, &str)] = &[
    ("INTERNAL_TOKEN", "auth.internal_token"),
    ("VK_ACCESS_TOKEN", "vk.access_token"),
    ("VK_WALL_ACCESS_TOKEN", "vk.wall_access_token"),
    ("VK_PEER_ID", "vk.peer_id"),
    ("VK_GROUP_ID", "vk.group_id"),
    ("VK_API_VERSION", "vk.api_version"),
    ("VK_API_URL", "vk.api_url"),
];

/// `PORT` wins over `HOST_PORT` when both are set
const PORT_VARS: &[&str] = &["PORT", "HOST_PORT"];

const REQUEST_TIMEOUT_VAR: &str = "VK_REQUEST_TIMEOUT";

/// Configuration loader that handles layered configuration loading
///
/// Sources, lowest priority first:
/// 1. built-in defaults
/// 2. `default.toml`, `{environment}.toml`, `local.toml` (all optional),
///    or a single file when `VKNOTIFY_CONFIG_FILE` is set
/// 3. `VKNOTIFY_*` environment variables
/// 4. flat deployment variables (`INTERNAL_TOKEN`, `VK_*`, `PORT`)
#[derive(Debug)]
pub struct ConfigLoader {
    config_dir: PathBuf,
    config_file: Option<PathBuf>,
    environment: AppEnvironment,
}

impl ConfigLoader {
    /// Create a loader from `VKNOTIFY_CONFIG_DIR`, `VKNOTIFY_CONFIG_FILE` and
    /// `VKNOTIFY_APP_ENV`.
    ///
    /// # Errors
    ///
    /// Returns an error if both the directory and the file variable are set.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from);
        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && config_dir.is_some() {
            return Err(ConfigError::mutual_exclusivity(
                "VKNOTIFY_CONFIG_DIR and VKNOTIFY_CONFIG_FILE cannot both be set. \
                 Use VKNOTIFY_CONFIG_DIR for layered configuration or \
                 VKNOTIFY_CONFIG_FILE for a single configuration file.",
            ));
        }

        Ok(Self {
            config_dir: config_dir.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR)),
            config_file,
            environment: AppEnvironment::from_env(),
        })
    }

    /// Loader reading a single configuration file instead of the layered directory.
    pub fn from_file(path: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: Some(path.into()),
            environment: AppEnvironment::from_env(),
        }
    }

    /// Loader reading the layered files of `config_dir` for `environment`.
    pub fn from_dir(config_dir: impl Into<PathBuf>, environment: AppEnvironment) -> Self {
        Self {
            config_dir: config_dir.into(),
            config_file: None,
            environment,
        }
    }

    /// Select the `{environment}.toml` overlay explicitly.
    pub fn with_environment(mut self, environment: AppEnvironment) -> Self {
        self.environment = environment;
        self
    }

    pub fn environment(&self) -> AppEnvironment {
        self.environment
    }

    /// Load and validate configuration using the process environment.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        self.load_with(|name| std::env::var(name).ok())
    }

    /// Load and validate configuration, resolving deployment variables through `lookup`.
    pub fn load_with<F>(&self, lookup: F) -> Result<Settings, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = self.build_config(&lookup)?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {}", e))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    fn build_config<F>(&self, lookup: &F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let builder = Config::builder();

        let builder = if let Some(ref config_file) = self.config_file {
            Self::add_file_source(builder, config_file, true)?
        } else {
            self.build_layered_config(builder)?
        };

        let mut builder = Self::add_env_source(builder);

        for (key, value) in deployment_overrides(lookup)? {
            builder = builder.set_override(key, value)?;
        }

        builder.build().map_err(ConfigError::from)
    }

    fn build_layered_config(
        &self,
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        let default_path = self.config_dir.join("default.toml");
        let builder = Self::add_file_source(builder, &default_path, false)?;

        let env_path = self
            .config_dir
            .join(format!("{}.toml", self.environment.as_str()));
        let builder = Self::add_file_source(builder, &env_path, false)?;

        let local_path = self.config_dir.join("local.toml");
        Self::add_file_source(builder, &local_path, false)
    }

    fn add_file_source(
        builder: ConfigBuilder<DefaultState>,
        path: &Path,
        required: bool,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        if required && !path.exists() {
            return Err(ConfigError::file_not_found(format!(
                "Required configuration file not found: {}",
                path.display()
            )));
        }

        Ok(builder.add_source(File::from(path).format(FileFormat::Toml).required(required)))
    }

    /// `VKNOTIFY_SERVER__PORT` -> `server.port`, `VKNOTIFY_VK__PEER_ID` -> `vk.peer_id`
    fn add_env_source(builder: ConfigBuilder<DefaultState>) -> ConfigBuilder<DefaultState> {
        builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        )
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
            environment: AppEnvironment::default(),
        })
    }
}

/// Resolve the flat deployment variables into typed settings overrides.
///
/// Empty values are treated as unset.
pub fn deployment_overrides<F>(lookup: &F) -> Result<Vec<(&'static str, Value)>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let read = |name: &str| {
        lookup(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    };

    let mut overrides: Vec<(&'static str, Value)> = DEPLOYMENT_VARS
        .iter()
        .filter_map(|(name, key)| read(name).map(|value| (*key, Value::from(value))))
        .collect();

    if let Some((name, raw)) = PORT_VARS
        .iter()
        .find_map(|name| read(name).map(|value| (*name, value)))
    {
        let port: u16 = raw
            .parse()
            .map_err(|_| ConfigError::invalid_env(name, &raw, "a port number"))?;
        overrides.push(("server.port", Value::from(i64::from(port))));
    }

    if let Some(raw) = read(REQUEST_TIMEOUT_VAR) {
        let timeout: f64 = raw
            .parse()
            .map_err(|_| ConfigError::invalid_env(REQUEST_TIMEOUT_VAR, &raw, "seconds as a number"))?;
        overrides.push(("vk.request_timeout", Value::from(timeout)));
    }

    Ok(overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    // Tests touching process environment variables run one at a time
    static TEST_MUTEX: Mutex<()> = Mutex::new(());

    fn setup_config_dir(files: &[(&str, &str)]) -> TempDir {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        for (name, content) in files {
            fs::write(temp_dir.path().join(name), content).expect("Failed to write config file");
        }
        temp_dir
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    const REQUIRED_VARS: &[(&str, &str)] = &[
        ("INTERNAL_TOKEN", "inbound"),
        ("VK_ACCESS_TOKEN", "community"),
        ("VK_PEER_ID", "2000000001"),
    ];

    struct EnvGuard {
        vars_to_restore: Vec<(String, Option<String>)>,
    }

    impl EnvGuard {
        fn new() -> Self {
            Self {
                vars_to_restore: Vec::new(),
            }
        }

        fn set(&mut self, key: &str, value: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::set_var(key, value);
            }
        }

        fn remove(&mut self, key: &str) {
            self.vars_to_restore
                .push((key.to_string(), std::env::var(key).ok()));
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            for (key, original_value) in self.vars_to_restore.iter().rev() {
                unsafe {
                    match original_value {
                        Some(value) => std::env::set_var(key, value),
                        None => std::env::remove_var(key),
                    }
                }
            }
        }
    }

    #[test]
    fn test_env_only_deployment_without_files() {
        let temp_dir = setup_config_dir(&[]);
        let loader = ConfigLoader::from_dir(temp_dir.path(), AppEnvironment::Production);

        let settings = loader
            .load_with(vars(REQUIRED_VARS))
            .expect("Should load from deployment variables alone");

        assert_eq!(settings.auth.internal_token, "inbound");
        assert_eq!(settings.vk.access_token, "community");
        assert_eq!(settings.vk.peer_id, "2000000001");
        assert_eq!(settings.vk.api_version, "5.131");
        assert_eq!(settings.server.port, 8000);
    }

    #[test]
    fn test_missing_internal_token_is_rejected() {
        let temp_dir = setup_config_dir(&[]);
        let loader = ConfigLoader::from_dir(temp_dir.path(), AppEnvironment::Development);

        let err = loader
            .load_with(vars(&[("VK_ACCESS_TOKEN", "community"), ("VK_PEER_ID", "1")]))
            .unwrap_err();
        assert!(err.to_string().contains("INTERNAL_TOKEN is not set"));
    }

    #[test]
    fn test_deployment_vars_override_files() {
        let default_config = r#"
[server]
port = 3000

[auth]
internal_token = "from-file"

[vk]
access_token = "file-token"
peer_id = "1"
api_version = "5.100"
request_timeout = 2.5
"#;
        let temp_dir = setup_config_dir(&[("default.toml", default_config)]);
        let loader = ConfigLoader::from_dir(temp_dir.path(), AppEnvironment::Development);

        let settings = loader
            .load_with(vars(&[
                ("INTERNAL_TOKEN", "from-env"),
                ("HOST_PORT", "9100"),
                ("VK_API_VERSION", "5.199"),
            ]))
            .expect("Should load settings");

        assert_eq!(settings.auth.internal_token, "from-env");
        assert_eq!(settings.server.port, 9100);
        assert_eq!(settings.vk.api_version, "5.199");
        assert_eq!(settings.vk.access_token, "file-token");
        assert_eq!(settings.vk.request_timeout, 2.5);
    }

    #[test]
    fn test_layered_files_precedence() {
        let default_config = r#"
[application]
name = "default-app"

[server]
port = 3000
"#;
        let staging_config = r#"
[application]
name = "staging-app"

[server]
port = 3001
"#;
        let local_config = r#"
[server]
port = 3002
"#;
        let temp_dir = setup_config_dir(&[
            ("default.toml", default_config),
            ("staging.toml", staging_config),
            ("local.toml", local_config),
        ]);
        let loader = ConfigLoader::from_dir(temp_dir.path(), AppEnvironment::Staging);

        let settings = loader.load_with(vars(REQUIRED_VARS)).expect("Should load");
        assert_eq!(settings.application.name, "staging-app");
        assert_eq!(settings.server.port, 3002);
    }

    #[test]
    fn test_single_file_mode_requires_file() {
        let loader = ConfigLoader::from_file("/nonexistent/vk-notify.toml");
        let err = loader.load_with(vars(REQUIRED_VARS)).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_single_file_mode() {
        let single_config = r#"
[server]
host = "127.0.0.1"
port = 5000

[auth]
internal_token = "file-secret"

[vk]
access_token = "file-token"
wall_access_token = "wall-token"
peer_id = "42"
group_id = "-777"
"#;
        let temp_dir = setup_config_dir(&[("single.toml", single_config)]);
        let loader = ConfigLoader::from_file(temp_dir.path().join("single.toml"));

        let settings = loader.load_with(vars(&[])).expect("Should load settings");
        assert_eq!(settings.server.address(), "127.0.0.1:5000");
        assert_eq!(settings.vk.wall_token(), "wall-token");
        assert_eq!(settings.vk.group_id().unwrap(), 777);
    }

    #[test]
    fn test_deployment_overrides_parse_types() {
        let overrides = deployment_overrides(&vars(&[
            ("PORT", "8080"),
            ("HOST_PORT", "9090"),
            ("VK_REQUEST_TIMEOUT", "3.5"),
            ("VK_WALL_ACCESS_TOKEN", "  "),
        ]))
        .unwrap();

        let keys: Vec<&str> = overrides.iter().map(|(k, _)| *k).collect();
        assert!(keys.contains(&"server.port"));
        assert!(keys.contains(&"vk.request_timeout"));
        assert!(!keys.contains(&"vk.wall_access_token"));

        let port = overrides
            .iter()
            .find(|(k, _)| *k == "server.port")
            .map(|(_, v)| v.clone().into_int().unwrap())
            .unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn test_deployment_overrides_reject_bad_values() {
        let err = deployment_overrides(&vars(&[("VK_REQUEST_TIMEOUT", "ten")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref name, .. } if name == "VK_REQUEST_TIMEOUT"));

        let err = deployment_overrides(&vars(&[("PORT", "70000")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnvVar { ref name, .. } if name == "PORT"));
    }

    #[test]
    fn test_prefixed_env_var_override() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.remove("VKNOTIFY_SERVER__PORT");
        env.set("VKNOTIFY_VK__API_URL", "http://127.0.0.1:9999/method");

        let temp_dir = setup_config_dir(&[]);
        let loader = ConfigLoader::from_dir(temp_dir.path(), AppEnvironment::Test);
        let settings = loader.load_with(vars(REQUIRED_VARS)).expect("Should load");

        assert_eq!(settings.vk.api_url, "http://127.0.0.1:9999/method");
    }

    #[test]
    fn test_config_loader_mutual_exclusivity_error() {
        let _guard = TEST_MUTEX.lock().unwrap();
        let mut env = EnvGuard::new();
        env.set("VKNOTIFY_CONFIG_DIR", "/etc/vk-notify");
        env.set("VKNOTIFY_CONFIG_FILE", "/etc/vk-notify/config.toml");

        let result = ConfigLoader::new();
        assert!(matches!(result, Err(ConfigError::MutualExclusivityError(_))));
    }
}
