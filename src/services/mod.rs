//! Service layer for business logic operations.
//!
//! Services sit between the HTTP handlers and the outbound clients.

pub mod forwarder;

pub use forwarder::{Delivery, NotificationForwarder, VideoSendMode};

use std::sync::Arc;

use crate::config::VkConfig;

/// Aggregates all services for convenient access.
///
/// Cloning is cheap since the HTTP client and configuration are shared.
#[derive(Clone)]
pub struct Services {
    pub forwarder: NotificationForwarder,
}

impl Services {
    /// Creates the services over one shared HTTP client.
    pub fn new(http: reqwest::Client, vk: Arc<VkConfig>) -> Self {
        Self {
            forwarder: NotificationForwarder::new(http, vk),
        }
    }
}
