//! Serve command handler
//!
//! Handles the serve command including dry-run validation and server startup.

use crate::cli::handlers::check_config::summary_lines;
use crate::config::settings::Settings;
use crate::server::Server;

/// Handler for the serve command
pub struct ServeCommandHandler {
    config: Settings,
}

impl ServeCommandHandler {
    pub fn new(config: Settings) -> Self {
        Self { config }
    }

    /// Run the server, or with `dry_run` only validate and report what it
    /// would bind to.
    ///
    /// # Errors
    /// - Configuration validation errors
    /// - Server startup errors (if not dry-run)
    pub async fn execute(self, dry_run: bool) -> anyhow::Result<()> {
        if dry_run {
            self.validate_only()
        } else {
            Server::new(self.config).run().await
        }
    }

    /// Validate configuration without starting the server
    pub fn validate_only(&self) -> anyhow::Result<()> {
        self.config.validate()?;

        for line in summary_lines(&self.config) {
            println!("✓ {}", line);
        }
        println!(
            "Dry run completed successfully - server would bind to {}",
            self.config.server.address()
        );
        Ok(())
    }

    pub fn config(&self) -> &Settings {
        &self.config
    }
}
