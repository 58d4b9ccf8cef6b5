//! Request and response bodies of the forwarding endpoints.

use std::fmt;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::services::{Delivery, VideoSendMode};

/// Fields read from a request body; each must be a string or null.
const STRING_FIELDS: [&str; 5] = ["token", "message", "image", "video", "type"];

/// `token` of a raw request body, `None` unless it is a string.
pub fn body_token(body: &Value) -> Option<&str> {
    body.get("token").and_then(Value::as_str)
}

/// Body accepted by every forwarding endpoint.
///
/// Handlers check the shared secret on the raw body first and only then
/// build this typed view. Unknown fields are ignored.
#[derive(Clone, Default, Deserialize)]
pub struct NotificationRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub video: Option<String>,
    #[serde(default, rename = "type")]
    pub send_type: Option<String>,
}

impl NotificationRequest {
    /// Typed request from an already authorized body.
    ///
    /// A known field holding anything but a string or null fails validation
    /// under its own name.
    pub fn from_body(body: Value) -> AppResult<Self> {
        let mistyped = STRING_FIELDS.into_iter().find(|field| {
            body.get(*field)
                .is_some_and(|value| !(value.is_string() || value.is_null()))
        });
        if let Some(field) = mistyped {
            return Err(AppError::validation(field, "must be a string"));
        }

        serde_json::from_value(body).map_err(|e| AppError::BadRequest {
            message: format!("Invalid JSON body: {}", e),
        })
    }

    /// Non-blank `message`.
    pub fn required_message(&self) -> AppResult<&str> {
        match self.message.as_deref() {
            None => Err(AppError::validation("message", "is required")),
            Some(text) if text.trim().is_empty() => {
                Err(AppError::validation("message", "must not be empty"))
            }
            Some(text) => Ok(text),
        }
    }

    /// Required `image` URL.
    pub fn required_image(&self) -> AppResult<Url> {
        let raw = self
            .image
            .as_deref()
            .ok_or_else(|| AppError::validation("image", "is required"))?;
        parse_media_url("image", raw)
    }

    /// `image` URL when the field is present.
    pub fn optional_image(&self) -> AppResult<Option<Url>> {
        self.image
            .as_deref()
            .map(|raw| parse_media_url("image", raw))
            .transpose()
    }

    /// Required `video` URL.
    pub fn required_video(&self) -> AppResult<Url> {
        let raw = self
            .video
            .as_deref()
            .ok_or_else(|| AppError::validation("video", "is required"))?;
        parse_media_url("video", raw)
    }

    /// Delivery mode of `/send_video`, `video` when `type` is absent.
    pub fn video_mode(&self) -> AppResult<VideoSendMode> {
        self.send_type
            .as_deref()
            .map(str::parse::<VideoSendMode>)
            .transpose()
            .map(Option::unwrap_or_default)
    }
}

impl fmt::Debug for NotificationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationRequest")
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("message", &self.message)
            .field("image", &self.image)
            .field("video", &self.video)
            .field("send_type", &self.send_type)
            .finish()
    }
}

/// Parses a caller-supplied media URL; only absolute http(s) URLs with a
/// host are accepted.
pub fn parse_media_url(field: &str, raw: &str) -> AppResult<Url> {
    let url = Url::parse(raw.trim())
        .map_err(|e| AppError::validation(field, format!("must be a valid URL ({})", e)))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(AppError::validation(field, "must use http or https"));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(AppError::validation(field, "must include a host"));
    }

    Ok(url)
}

/// Body of a successful forward.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForwardResponse {
    pub ok: bool,
    /// `response` value of the final VK call
    pub response: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<String>,
}

impl From<Delivery> for ForwardResponse {
    fn from(delivery: Delivery) -> Self {
        Self {
            ok: true,
            response: delivery.response,
            attachment: delivery.attachment.map(|attachment| attachment.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(value: Value) -> NotificationRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_body_token_requires_string() {
        assert_eq!(body_token(&json!({"token": "t"})), Some("t"));
        assert_eq!(body_token(&json!({"token": 123})), None);
        assert_eq!(body_token(&json!(["token"])), None);
        assert_eq!(body_token(&json!("token")), None);
    }

    #[test]
    fn test_from_body_names_mistyped_field() {
        let error = NotificationRequest::from_body(json!({"token": "t", "image": 5})).unwrap_err();
        assert!(matches!(
            error,
            AppError::Validation { ref field, ref reason } if field == "image" && reason == "must be a string"
        ));

        let error =
            NotificationRequest::from_body(json!({"token": "t", "type": ["video"]})).unwrap_err();
        assert!(matches!(error, AppError::Validation { ref field, .. } if field == "type"));
    }

    #[test]
    fn test_from_body_accepts_null_fields() {
        let parsed =
            NotificationRequest::from_body(json!({"token": "t", "message": "hi", "image": null}))
                .unwrap();
        assert_eq!(parsed.optional_image().unwrap(), None);
        assert_eq!(parsed.required_message().unwrap(), "hi");
    }

    #[test]
    fn test_unknown_fields_are_ignored() {
        let parsed = request(json!({"token": "t", "message": "hi", "extra": 1}));
        assert_eq!(parsed.required_message().unwrap(), "hi");
    }

    #[test]
    fn test_required_message() {
        assert!(matches!(
            request(json!({"token": "t"})).required_message(),
            Err(AppError::Validation { ref field, .. }) if field == "message"
        ));
        assert!(request(json!({"message": "   "})).required_message().is_err());
    }

    #[test]
    fn test_media_url_validation() {
        assert!(parse_media_url("image", "https://example.com/a.jpg").is_ok());
        assert!(parse_media_url("image", "ftp://example.com/a.jpg").is_err());
        assert!(parse_media_url("image", "not a url").is_err());
        assert!(parse_media_url("video", "file:///etc/passwd").is_err());
    }

    #[test]
    fn test_optional_image() {
        assert_eq!(request(json!({"message": "m"})).optional_image().unwrap(), None);
        assert!(
            request(json!({"image": "http://x.test/y.png"}))
                .optional_image()
                .unwrap()
                .is_some()
        );
        assert!(request(json!({"image": ""})).optional_image().is_err());
    }

    #[test]
    fn test_video_mode() {
        assert_eq!(request(json!({})).video_mode().unwrap(), VideoSendMode::Video);
        assert_eq!(
            request(json!({"type": "document"})).video_mode().unwrap(),
            VideoSendMode::Document
        );
        assert!(request(json!({"type": "sticker"})).video_mode().is_err());
    }

    #[test]
    fn test_debug_hides_token() {
        let parsed = request(json!({"token": "super-secret"}));
        assert!(!format!("{:?}", parsed).contains("super-secret"));
    }

    #[test]
    fn test_forward_response_serialization() {
        let body = ForwardResponse {
            ok: true,
            response: json!(17),
            attachment: None,
        };
        assert_eq!(serde_json::to_value(body).unwrap(), json!({"ok": true, "response": 17}));
    }
}
