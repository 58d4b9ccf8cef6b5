//! Command handlers for CLI operations
//!
//! Each handler owns the merged settings and runs one subcommand.

pub mod check_config;
pub mod serve;

pub use check_config::CheckConfigHandler;
pub use serve::ServeCommandHandler;
