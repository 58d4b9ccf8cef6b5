//! Health check endpoint handlers.
//!
//! Health checks never call VK and never require the shared secret; they only
//! report on the configuration the process started with.

use std::collections::BTreeMap;

use axum::{Router, extract::State, http::StatusCode, response::Json, routing::get};

use crate::api::dto::{ComponentHealth, HealthResponse, HealthStatus};
use crate::config::VkConfig;
use crate::state::AppState;

/// Creates health check routes.
///
/// # Routes
/// - `GET /health` - Health summary
/// - `GET /health/live` - Liveness check
pub fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/health/live", get(liveness_check))
}

/// Health summary endpoint.
///
/// # Example Response
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "timestamp": "2024-01-01T12:00:00Z",
///   "checks": {
///     "vk_credentials": {
///       "status": "healthy",
///       "message": "wall token configured, group id configured"
///     }
///   }
/// }
/// ```
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let credentials = check_credentials(&state.settings.vk);
    let status = credentials.status;

    let mut checks = BTreeMap::new();
    checks.insert("vk_credentials".to_string(), credentials);

    Json(HealthResponse {
        status,
        version: state.settings.application.version.clone(),
        timestamp: jiff::Timestamp::now().to_string(),
        checks,
    })
}

/// Liveness check endpoint.
pub async fn liveness_check() -> StatusCode {
    StatusCode::OK
}

/// Degraded when `/send_post` cannot work because no usable group id is set.
fn check_credentials(vk: &VkConfig) -> ComponentHealth {
    if vk.access_token.is_empty() || vk.peer_id.is_empty() {
        return ComponentHealth {
            status: HealthStatus::Unhealthy,
            message: Some("VK access token or peer id missing".to_string()),
        };
    }

    let wall = if vk.has_wall_token() {
        "wall token configured"
    } else {
        "no wall token, using community token"
    };

    match vk.group_id() {
        Ok(_) => ComponentHealth {
            status: HealthStatus::Healthy,
            message: Some(format!("{}, group id configured", wall)),
        },
        Err(e) => ComponentHealth {
            status: HealthStatus::Degraded,
            message: Some(format!("{}, wall posts unavailable: {}", wall, e)),
        },
    }
}
