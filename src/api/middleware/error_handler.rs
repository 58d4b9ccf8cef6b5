//! Error handler for converting AppError to HTTP responses.
//!
//! This module implements the IntoResponse trait for AppError,
//! providing consistent error response formatting across the API.
//! Failures are logged here, at the handler boundary: caller errors at
//! `warn`, upstream and internal failures at `error`.

use std::any::Any;

use axum::{
    Json,
    http::{StatusCode, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
};
use serde_json::{Map, Value, json};

use crate::api::dto::ErrorResponse;
use crate::error::AppError;

impl IntoResponse for AppError {
    /// Converts an AppError into an HTTP response.
    ///
    /// # Status Code Mapping
    /// - Unauthorized → 401 UNAUTHORIZED
    /// - Validation, BadRequest → 400 BAD_REQUEST
    /// - MediaFetch, MediaType, Upload, Delivery → 502 BAD_GATEWAY
    ///   (504 GATEWAY_TIMEOUT when the upstream call timed out)
    /// - Configuration, Internal → 500 INTERNAL_SERVER_ERROR
    fn into_response(self) -> Response {
        let status = error_to_status_code(&self);
        log_error(&self, status);

        let code = error_to_code(&self);
        let error_response = match &self {
            AppError::Validation { field, reason } => ErrorResponse::validation_error(field, reason),
            AppError::Unauthorized { message } | AppError::BadRequest { message } => {
                ErrorResponse::new(code, message)
            }
            AppError::MediaFetch { message, timed_out } => {
                ErrorResponse::new(code, message).with_details(json!({
                    "timed_out": timed_out
                }))
            }
            AppError::MediaType { expected, actual } => {
                ErrorResponse::new(code, &self.to_string()).with_details(json!({
                    "expected": expected,
                    "actual": actual
                }))
            }
            AppError::Upload {
                step,
                message,
                error_code,
                timed_out,
            } => ErrorResponse::new(code, message)
                .with_details(upstream_details("step", step, *error_code, *timed_out)),
            AppError::Delivery {
                method,
                message,
                error_code,
                timed_out,
            } => ErrorResponse::new(code, message)
                .with_details(upstream_details("method", method, *error_code, *timed_out)),
            AppError::Configuration { key, message } => {
                ErrorResponse::new(code, message).with_details(json!({
                    "key": key
                }))
            }
            AppError::Internal { .. } => ErrorResponse::new(code, "An internal error occurred"),
        };

        (status, Json(error_response)).into_response()
    }
}

fn upstream_details(
    name: &str,
    value: &str,
    error_code: Option<i64>,
    timed_out: bool,
) -> Value {
    let mut details = Map::new();
    details.insert(name.to_string(), json!(value));
    if let Some(code) = error_code {
        details.insert("error_code".to_string(), json!(code));
    }
    details.insert("timed_out".to_string(), json!(timed_out));
    Value::Object(details)
}

fn log_error(error: &AppError, status: StatusCode) {
    let code = error_to_code(error);
    match error {
        AppError::Internal { source } => {
            tracing::error!(status = status.as_u16(), code = code, error = %format!("{:#}", source), "Request failed")
        }
        _ if status.is_server_error() => {
            tracing::error!(status = status.as_u16(), code = code, error = %error, "Request failed")
        }
        _ => tracing::warn!(status = status.as_u16(), code = code, error = %error, "Request rejected"),
    }
}

/// Maps an AppError variant to its corresponding HTTP status code.
pub fn error_to_status_code(error: &AppError) -> StatusCode {
    if error.is_timeout() {
        return StatusCode::GATEWAY_TIMEOUT;
    }

    match error {
        AppError::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
        AppError::Validation { .. } | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        AppError::MediaFetch { .. }
        | AppError::MediaType { .. }
        | AppError::Upload { .. }
        | AppError::Delivery { .. } => StatusCode::BAD_GATEWAY,
        AppError::Configuration { .. } | AppError::Internal { .. } => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Maps an AppError variant to its error code string.
pub fn error_to_code(error: &AppError) -> &'static str {
    match error {
        AppError::Unauthorized { .. } => "UNAUTHORIZED",
        AppError::Validation { .. } => "VALIDATION_ERROR",
        AppError::BadRequest { .. } => "BAD_REQUEST",
        AppError::MediaFetch { .. } => "MEDIA_FETCH_ERROR",
        AppError::MediaType { .. } => "MEDIA_TYPE_ERROR",
        AppError::Upload { .. } => "UPLOAD_ERROR",
        AppError::Delivery { .. } => "DELIVERY_ERROR",
        AppError::Configuration { .. } => "CONFIGURATION_ERROR",
        AppError::Internal { .. } => "INTERNAL_ERROR",
    }
}

/// Global error handling middleware that rewrites bodiless or non-JSON error
/// responses produced by the router itself (unknown route, wrong method,
/// oversized body) into the standard ErrorResponse format.
pub async fn global_error_handler(
    request: axum::extract::Request,
    next: axum::middleware::Next,
) -> Response {
    let response = next.run(request).await;
    let status = response.status();

    if !(status.is_client_error() || status.is_server_error()) {
        return response;
    }

    let is_json = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.contains("application/json"));
    if is_json {
        return response;
    }

    let error_response = match status {
        StatusCode::NOT_FOUND => ErrorResponse::new("NOT_FOUND", "The requested resource was not found"),
        StatusCode::METHOD_NOT_ALLOWED => {
            ErrorResponse::new("METHOD_NOT_ALLOWED", "HTTP method not allowed for this endpoint")
        }
        StatusCode::PAYLOAD_TOO_LARGE => {
            ErrorResponse::new("PAYLOAD_TOO_LARGE", "Request payload too large")
        }
        _ if status.is_client_error() => ErrorResponse::new("BAD_REQUEST", "Bad request"),
        _ => ErrorResponse::new("INTERNAL_ERROR", "An internal error occurred"),
    };

    let (mut parts, _body) = response.into_parts();
    parts.headers.remove(CONTENT_TYPE);
    parts.headers.remove(axum::http::header::CONTENT_LENGTH);
    (parts, Json(error_response)).into_response()
}

/// Response for a handler panic caught by `CatchPanicLayer`.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");

    AppError::Internal {
        source: anyhow::anyhow!("handler panicked: {}", detail),
    }
    .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            error_to_status_code(&AppError::unauthorized()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            error_to_status_code(&AppError::validation("message", "is required")),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            error_to_status_code(&AppError::configuration("vk.group_id", "VK_GROUP_ID is not set")),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            error_to_status_code(&AppError::MediaType {
                expected: "an image".to_string(),
                actual: "text/html".to_string(),
            }),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_timeouts_map_to_gateway_timeout() {
        let error = AppError::Delivery {
            method: "messages.send".to_string(),
            message: "VK API request failed: operation timed out".to_string(),
            error_code: None,
            timed_out: true,
        };
        assert_eq!(error_to_status_code(&error), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(error_to_code(&error), "DELIVERY_ERROR");
    }

    #[tokio::test]
    async fn test_upload_error_body() {
        let error = AppError::Upload {
            step: "video.save".to_string(),
            message: "video.save: Access denied".to_string(),
            error_code: Some(15),
            timed_out: false,
        };
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let body = body_json(response).await;
        assert_eq!(body["code"], "UPLOAD_ERROR");
        assert_eq!(body["message"], "video.save: Access denied");
        assert_eq!(body["details"]["step"], "video.save");
        assert_eq!(body["details"]["error_code"], 15);
    }

    #[tokio::test]
    async fn test_internal_error_is_sanitized() {
        let error = AppError::Internal {
            source: anyhow::anyhow!("token=abc leaked"),
        };
        let body = body_json(error.into_response()).await;
        assert_eq!(body["message"], "An internal error occurred");
        assert!(!body.to_string().contains("abc"));
    }

    #[tokio::test]
    async fn test_panic_response() {
        let response = panic_response(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(response).await["code"], "INTERNAL_ERROR");
    }
}
