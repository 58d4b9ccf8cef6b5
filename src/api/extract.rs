use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use serde::de::DeserializeOwned;

use crate::error::{AppError, AppResult};

/// JSON body extractor that reports failures as [`AppError::BadRequest`].
///
/// Unlike `axum::Json` it does not insist on a `Content-Type` header, so
/// plain `curl -d '{...}'` calls from scripts are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> AppResult<Self> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::BadRequest {
                message: rejection.body_text(),
            })?;

        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(AppError::BadRequest {
                message: "Request body is empty".to_string(),
            });
        }

        serde_json::from_slice(&body)
            .map(ApiJson)
            .map_err(|e| AppError::BadRequest {
                message: format!("Invalid JSON body: {}", e),
            })
    }
}
