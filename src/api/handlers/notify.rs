//! Forwarding endpoint handlers.
//!
//! Every handler checks the shared secret on the raw JSON body first, then
//! the field types and its own required fields, and only then touches the
//! network.

use axum::{Router, extract::State, response::Json, routing::post};
use serde_json::Value;

use crate::api::dto::{ForwardResponse, NotificationRequest, body_token};
use crate::api::extract::ApiJson;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Creates forwarding routes.
///
/// # Routes
/// - `POST /send_message` - Text message to the configured peer
/// - `POST /send_image` - Image by URL to the configured peer
/// - `POST /send_video` - Video by URL to the configured peer
/// - `POST /send_post` - Community wall post, optionally with an image
pub fn notify_routes() -> Router<AppState> {
    Router::new()
        .route("/send_message", post(send_message))
        .route("/send_image", post(send_image))
        .route("/send_video", post(send_video))
        .route("/send_post", post(send_post))
}

/// Missing, mistyped and mismatched tokens are indistinguishable to the
/// caller, whatever the rest of the body holds.
fn authorize(state: &AppState, body: Value) -> AppResult<NotificationRequest> {
    if !state.settings.auth.accepts(body_token(&body)) {
        return Err(AppError::unauthorized());
    }
    NotificationRequest::from_body(body)
}

pub async fn send_message(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<ForwardResponse>> {
    let request = authorize(&state, body)?;
    let message = request.required_message()?;

    let delivery = state.services.forwarder.send_message(message).await?;
    Ok(Json(delivery.into()))
}

pub async fn send_image(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<ForwardResponse>> {
    let request = authorize(&state, body)?;
    let image = request.required_image()?;

    let delivery = state.services.forwarder.send_image(&image).await?;
    Ok(Json(delivery.into()))
}

pub async fn send_video(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<ForwardResponse>> {
    let request = authorize(&state, body)?;
    let video = request.required_video()?;
    let mode = request.video_mode()?;

    let delivery = state.services.forwarder.send_video(&video, mode).await?;
    Ok(Json(delivery.into()))
}

pub async fn send_post(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<Value>,
) -> AppResult<Json<ForwardResponse>> {
    let request = authorize(&state, body)?;
    let message = request.required_message()?;
    let image = request.optional_image()?;

    let delivery = state
        .services
        .forwarder
        .send_post(message, image.as_ref())
        .await?;
    Ok(Json(delivery.into()))
}
