//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `notify` - Forwarding request/response bodies
//! - `health` - Health check bodies
//! - `error` - Common error response DTOs

mod error;
mod health;
mod notify;

pub use error::ErrorResponse;
pub use health::{ComponentHealth, HealthResponse, HealthStatus};
pub use notify::{ForwardResponse, NotificationRequest, body_token, parse_media_url};
