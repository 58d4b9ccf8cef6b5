//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use anyhow::Context;

use crate::config::Settings;
use crate::external::build_http_client;
use crate::services::Services;

/// Application state containing all shared services and resources.
///
/// Settings are immutable after startup. Cloning is cheap since settings
/// sit behind an `Arc` and the HTTP client is internally reference counted.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Validated settings the process started with
    pub settings: Arc<Settings>,
}

impl AppState {
    /// Creates a new AppState, building the shared HTTP client from the
    /// VK timeouts.
    ///
    /// # Example
    /// ```ignore
    /// let settings = ConfigLoader::new()?.load()?;
    /// let state = AppState::new(settings)?;
    /// ```
    pub fn new(settings: Settings) -> anyhow::Result<Self> {
        let http = build_http_client(&settings.vk).context("Failed to build HTTP client")?;
        let vk = Arc::new(settings.vk.clone());

        Ok(Self {
            services: Services::new(http, vk),
            settings: Arc::new(settings),
        })
    }
}
