//! Error response DTOs.

use serde::Serialize;
use serde_json::{Value, json};

/// Standard error response format.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

impl ErrorResponse {
    /// Creates a new error response with code and message.
    pub fn new(code: &str, message: &str) -> Self {
        Self {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    /// Adds structured details to the error response.
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Error response for a rejected request field.
    pub fn validation_error(field: &str, reason: &str) -> Self {
        Self::new(
            "VALIDATION_ERROR",
            &format!("Validation failed for {}: {}", field, reason),
        )
        .with_details(json!({
            "field": field,
            "reason": reason
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_details_are_omitted_when_absent() {
        let body = serde_json::to_value(ErrorResponse::new("UNAUTHORIZED", "Invalid token")).unwrap();
        assert_eq!(body, json!({"code": "UNAUTHORIZED", "message": "Invalid token"}));
    }

    #[test]
    fn test_validation_error_shape() {
        let body = serde_json::to_value(ErrorResponse::validation_error("message", "is required"))
            .unwrap();
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["message"], "Validation failed for message: is required");
        assert_eq!(body["details"]["field"], "message");
    }
}
