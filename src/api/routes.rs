//! Router configuration for the API.
//!
//! This module provides centralized route registration and middleware
//! configuration for the application.

use axum::{Router, middleware};
use tower_http::catch_panic::CatchPanicLayer;

use crate::api::handlers;
use crate::api::middleware::{
    global_error_handler, logging_middleware, panic_response, request_id_middleware,
};
use crate::state::AppState;

/// Creates the main application router with all routes and middleware.
///
/// # Middleware Order
/// Middleware is applied in reverse order of declaration (last added runs first):
/// 1. Request ID middleware - generates/propagates request IDs
/// 2. Logging middleware - logs requests with request IDs
/// 3. Global error handler - JSON bodies for router-level errors
/// 4. Panic catcher - turns handler panics into a 500 `ErrorResponse`
///
/// # Routes
/// - `POST /send_message`, `/send_image`, `/send_video`, `/send_post`
/// - `GET /health`, `/health/live`
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .merge(handlers::notify::notify_routes())
        .merge(handlers::health::health_routes())
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(middleware::from_fn(global_error_handler))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(request_id_middleware))
        .with_state(state)
}
