//! Thin VK API client.
//!
//! Every method call is a form-encoded POST to `{api_url}/{method}` carrying
//! `access_token`, `v` and the method parameters, so credentials never end up
//! in a URL. The client knows nothing about the forwarding flows; it only
//! turns HTTP exchanges into a `response` value or a [`VkApiError`].

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use thiserror::Error;

use crate::config::VkConfig;
use crate::error::AppError;
use crate::external::media::MediaPayload;
use crate::external::summary::{content_type, describe_transport, summarize};

/// VK error code for "Group authorization failed"
pub const GROUP_AUTH_FAILED: i64 = 27;

/// Failure of a single VK exchange
#[derive(Debug, Error)]
#[error("{message}")]
pub struct VkApiError {
    /// API method or upload step that failed
    pub method: String,
    pub message: String,
    /// `error_code` from a VK error payload
    pub error_code: Option<i64>,
    pub timed_out: bool,
}

impl VkApiError {
    fn new(method: &str, message: impl Into<String>) -> Self {
        Self {
            method: method.to_string(),
            message: message.into(),
            error_code: None,
            timed_out: false,
        }
    }

    fn transport(method: &str, context: &str, error: reqwest::Error) -> Self {
        let timed_out = error.is_timeout();
        Self {
            method: method.to_string(),
            message: format!("{}: {}", context, describe_transport(error)),
            error_code: None,
            timed_out,
        }
    }

    /// Whether VK refused the call because the token cannot act for the group.
    pub fn is_group_auth_failure(&self) -> bool {
        group_auth_failed(self.error_code, &self.message)
    }

    /// Classifies the failure as part of an upload handshake.
    pub fn into_upload(self, step: &str) -> AppError {
        AppError::Upload {
            step: step.to_string(),
            message: self.message,
            error_code: self.error_code,
            timed_out: self.timed_out,
        }
    }

    /// Classifies the failure as the final send or post call.
    pub fn into_delivery(self) -> AppError {
        AppError::Delivery {
            method: self.method,
            message: self.message,
            error_code: self.error_code,
            timed_out: self.timed_out,
        }
    }
}

/// VK API client sharing the application HTTP client
#[derive(Clone)]
pub struct VkClient {
    http: reqwest::Client,
    config: Arc<VkConfig>,
}

impl VkClient {
    pub fn new(http: reqwest::Client, config: Arc<VkConfig>) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &VkConfig {
        &self.config
    }

    /// Calls an API method and returns its `response` value.
    ///
    /// # Errors
    /// - transport failure or timeout
    /// - HTTP status >= 400, or a body that is not JSON (with a response summary)
    /// - a VK `error` payload, as `"{method}: {error_msg}"`
    /// - a JSON body without `response`
    pub async fn call(
        &self,
        method: &str,
        token: &str,
        params: &[(&str, String)],
    ) -> Result<Value, VkApiError> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("access_token", token)
            .append_pair("v", &self.config.api_version)
            .extend_pairs(params.iter().map(|(key, value)| (*key, value.as_str())))
            .finish();

        tracing::debug!(method = method, "Calling VK API");

        let response = self
            .http
            .post(self.config.method_url(method))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body)
            .send()
            .await
            .map_err(|e| VkApiError::transport(method, "VK API request failed", e))?;

        let status = response.status();
        let reported_type = content_type(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| VkApiError::transport(method, "VK API response could not be read", e))?;

        if status.is_client_error() || status.is_server_error() {
            return Err(VkApiError::new(
                method,
                format!(
                    "VK API HTTP error ({})",
                    summarize(status, reported_type.as_deref(), &text)
                ),
            ));
        }

        let payload: Value = serde_json::from_str(&text).map_err(|_| {
            VkApiError::new(
                method,
                format!(
                    "Invalid response from VK API ({})",
                    summarize(status, reported_type.as_deref(), &text)
                ),
            )
        })?;

        parse_payload(method, payload)
    }

    /// Posts a media file to a VK upload server and returns the raw body.
    ///
    /// The upload URL is signed by VK and is kept out of error messages.
    pub async fn upload(
        &self,
        step: &str,
        upload_url: &str,
        field: &str,
        payload: &MediaPayload,
    ) -> Result<String, VkApiError> {
        let form = reqwest::multipart::Form::new().part(field.to_string(), payload.to_part());

        tracing::debug!(
            step = step,
            field = field,
            bytes = payload.len(),
            "Uploading media to VK"
        );

        let response = self
            .http
            .post(upload_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| VkApiError::transport(step, "Upload request failed", e))?;

        let status = response.status();
        let reported_type = content_type(response.headers());
        let text = response
            .text()
            .await
            .map_err(|e| VkApiError::transport(step, "Upload response could not be read", e))?;

        if status.is_client_error() || status.is_server_error() {
            return Err(VkApiError::new(
                step,
                format!(
                    "Upload server error ({})",
                    summarize(status, reported_type.as_deref(), &text)
                ),
            ));
        }

        Ok(text)
    }
}

/// "Group authorization failed" by code or by message text.
pub fn group_auth_failed(error_code: Option<i64>, message: &str) -> bool {
    error_code == Some(GROUP_AUTH_FAILED)
        || message.to_lowercase().contains("group authorization failed")
}

/// Splits a decoded VK body into its `response` value or an error.
pub fn parse_payload(method: &str, payload: Value) -> Result<Value, VkApiError> {
    if let Some(error) = payload.get("error") {
        let error_msg = error
            .get("error_msg")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(VkApiError {
            method: method.to_string(),
            message: format!("{}: {}", method, error_msg),
            error_code: error.get("error_code").and_then(Value::as_i64),
            timed_out: false,
        });
    }

    match payload {
        Value::Object(mut map) => map
            .remove("response")
            .ok_or_else(|| VkApiError::new(method, "Invalid response from VK API")),
        _ => Err(VkApiError::new(method, "Invalid response from VK API")),
    }
}
