//! Command executor for dispatching CLI commands
//!
//! Entry point for running a parsed command once configuration is loaded.

use super::handlers::{CheckConfigHandler, ServeCommandHandler};
use super::parser::{Cli, Commands};
use crate::config::settings::Settings;

/// Execute a CLI command with the given settings.
///
/// Without a subcommand the server is started.
///
/// # Errors
/// Returns errors from command handlers, including server startup failures
pub async fn execute_command(cli: &Cli, settings: Settings) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Serve { dry_run, .. }) => {
            ServeCommandHandler::new(settings).execute(*dry_run).await
        }
        None => ServeCommandHandler::new(settings).execute(false).await,
        Some(Commands::CheckConfig) => {
            CheckConfigHandler::new(settings).execute()?;
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.auth.internal_token = "inbound".to_string();
        settings.vk.access_token = "community".to_string();
        settings.vk.peer_id = "2000000001".to_string();
        settings
    }

    #[tokio::test]
    async fn test_dry_run_does_not_bind() {
        let cli = Cli::try_parse_from(["vk-notify", "serve", "--dry-run"]).unwrap();
        assert!(execute_command(&cli, valid_settings()).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_config_reports_invalid_settings() {
        let cli = Cli::try_parse_from(["vk-notify", "check-config"]).unwrap();
        assert!(execute_command(&cli, Settings::default()).await.is_err());
        assert!(execute_command(&cli, valid_settings()).await.is_ok());
    }
}
