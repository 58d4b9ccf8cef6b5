//! check-config command handler
//!
//! Prints the effective configuration with every credential reduced to
//! "configured"/"not set".

use crate::config::settings::Settings;
use crate::error::AppResult;

pub struct CheckConfigHandler {
    config: Settings,
}

impl CheckConfigHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    pub fn execute(&self) -> AppResult<()> {
        self.config.validate()?;

        for line in summary_lines(&self.config) {
            println!("{}", line);
        }
        println!("Configuration is valid");
        Ok(())
    }
}

fn flag(configured: bool) -> &'static str {
    if configured { "configured" } else { "not set" }
}

/// Human readable configuration summary. Never contains secret values.
pub fn summary_lines(config: &Settings) -> Vec<String> {
    let vk = &config.vk;
    vec![
        format!(
            "application: {} {}",
            config.application.name, config.application.version
        ),
        format!("listen address: {}", config.server.address()),
        format!(
            "internal token: {}",
            flag(!config.auth.internal_token.is_empty())
        ),
        format!("vk access token: {}", flag(!vk.access_token.is_empty())),
        format!("vk wall access token: {}", flag(vk.has_wall_token())),
        format!("vk peer id: {}", vk.peer_id),
        format!(
            "vk group id: {}",
            vk.group_id.as_deref().unwrap_or("not set")
        ),
        format!("vk api: {} (v{})", vk.api_url, vk.api_version),
        format!(
            "timeouts: request {}s, connect {}s",
            vk.request_timeout, vk.connect_timeout
        ),
        format!("log level: {}", config.logger.level),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Settings {
        let mut config = Settings::default();
        config.auth.internal_token = "inbound-secret".to_string();
        config.vk.access_token = "community-secret".to_string();
        config.vk.wall_access_token = Some("wall-secret".to_string());
        config.vk.peer_id = "2000000001".to_string();
        config
    }

    #[test]
    fn test_summary_hides_secrets() {
        let summary = summary_lines(&config()).join("\n");
        assert!(!summary.contains("secret"));
        assert!(summary.contains("vk wall access token: configured"));
        assert!(summary.contains("vk group id: not set"));
        assert!(summary.contains("vk peer id: 2000000001"));
    }

    #[test]
    fn test_execute_rejects_invalid_config() {
        let mut invalid = config();
        invalid.vk.peer_id.clear();
        assert!(CheckConfigHandler::new(invalid).execute().is_err());
        assert!(CheckConfigHandler::new(config()).execute().is_ok());
    }
}
