//! VK upload handshakes.
//!
//! Each flavour is one sequential flow: ask VK for an upload target, post the
//! bytes there, register the result, and return an [`Attachment`]. Any failed
//! step becomes [`AppError::Upload`] naming the step.

use serde_json::Value;

use super::client::{VkClient, group_auth_failed};
use super::types::{self, Attachment, PhotoReceipt, VideoTicket};
use crate::error::{AppError, AppResult};
use crate::external::media::MediaPayload;

impl VkClient {
    /// Photo for a private message: `photos.getMessagesUploadServer` ->
    /// upload `photo` -> `photos.saveMessagesPhoto`.
    pub async fn upload_message_photo(
        &self,
        token: &str,
        peer_id: &str,
        payload: &MediaPayload,
    ) -> AppResult<Attachment> {
        let upload_url = self
            .upload_server(
                "photos.getMessagesUploadServer",
                token,
                &[("peer_id", peer_id.to_string())],
            )
            .await?;

        let receipt = self.upload_photo(&upload_url, payload).await?;

        let saved = self
            .call(
                "photos.saveMessagesPhoto",
                token,
                &[
                    ("server", receipt.server),
                    ("photo", receipt.photo),
                    ("hash", receipt.hash),
                ],
            )
            .await
            .map_err(|e| e.into_upload("photos.saveMessagesPhoto"))?;

        types::saved_photo(&saved)
            .ok_or_else(|| malformed("photos.saveMessagesPhoto", "Photo was not saved"))
    }

    /// Photo for a community wall post: `photos.getWallUploadServer` ->
    /// upload `photo` -> `photos.saveWallPhoto`.
    pub async fn upload_wall_photo(
        &self,
        token: &str,
        group_id: u64,
        payload: &MediaPayload,
    ) -> AppResult<Attachment> {
        let upload_url = self
            .upload_server(
                "photos.getWallUploadServer",
                token,
                &[("group_id", group_id.to_string())],
            )
            .await?;

        let receipt = self.upload_photo(&upload_url, payload).await?;

        let saved = self
            .call(
                "photos.saveWallPhoto",
                token,
                &[
                    ("group_id", group_id.to_string()),
                    ("server", receipt.server),
                    ("photo", receipt.photo),
                    ("hash", receipt.hash),
                ],
            )
            .await
            .map_err(|e| e.into_upload("photos.saveWallPhoto"))?;

        types::saved_photo(&saved)
            .ok_or_else(|| malformed("photos.saveWallPhoto", "Photo was not saved"))
    }

    /// Document for a private message: `docs.getMessagesUploadServer` ->
    /// upload `file` -> `docs.save`.
    pub async fn upload_message_document(
        &self,
        token: &str,
        peer_id: &str,
        payload: &MediaPayload,
    ) -> AppResult<Attachment> {
        let upload_url = self
            .upload_server(
                "docs.getMessagesUploadServer",
                token,
                &[("peer_id", peer_id.to_string()), ("type", "doc".to_string())],
            )
            .await?;

        let body = self
            .upload("document upload", &upload_url, "file", payload)
            .await
            .map_err(|e| e.into_upload("document upload"))?;
        let reply = upload_reply("document upload", &body)?;
        let file = reply
            .get("file")
            .and_then(Value::as_str)
            .filter(|file| !file.is_empty())
            .ok_or_else(|| rejected_upload("document upload", &reply))?;

        let saved = self
            .call(
                "docs.save",
                token,
                &[
                    ("file", file.to_string()),
                    ("title", payload.file_name.clone()),
                ],
            )
            .await
            .map_err(|e| e.into_upload("docs.save"))?;

        types::saved_doc(&saved).ok_or_else(|| malformed("docs.save", "Document was not saved"))
    }

    /// Video: `video.save` reserves the video and returns the upload target,
    /// then the bytes are posted as `video_file`.
    pub async fn upload_video(&self, token: &str, payload: &MediaPayload) -> AppResult<Attachment> {
        let ticket = self
            .call(
                "video.save",
                token,
                &[
                    ("name", payload.file_name.clone()),
                    ("is_private", "1".to_string()),
                ],
            )
            .await
            .map_err(|e| e.into_upload("video.save"))?;

        let ticket = VideoTicket::from_value(&ticket)
            .ok_or_else(|| malformed("video.save", "Upload URL not received from VK API"))?;

        self.upload("video upload", &ticket.upload_url, "video_file", payload)
            .await
            .map_err(|e| e.into_upload("video upload"))?;

        Ok(ticket.attachment)
    }

    async fn upload_server(
        &self,
        method: &str,
        token: &str,
        params: &[(&str, String)],
    ) -> AppResult<String> {
        let server = self
            .call(method, token, params)
            .await
            .map_err(|e| e.into_upload(method))?;

        types::upload_url(&server)
            .ok_or_else(|| malformed(method, "Upload URL not received from VK API"))
    }

    async fn upload_photo(&self, upload_url: &str, payload: &MediaPayload) -> AppResult<PhotoReceipt> {
        let body = self
            .upload("photo upload", upload_url, "photo", payload)
            .await
            .map_err(|e| e.into_upload("photo upload"))?;
        let reply = upload_reply("photo upload", &body)?;

        PhotoReceipt::from_value(&reply).ok_or_else(|| rejected_upload("photo upload", &reply))
    }
}

/// Whether `video.save` was refused because the token cannot act for the
/// community.
pub fn is_group_auth_failure(error: &AppError) -> bool {
    match error {
        AppError::Upload {
            step,
            message,
            error_code,
            ..
        } => step == "video.save" && group_auth_failed(*error_code, message),
        _ => false,
    }
}

fn upload_reply(step: &str, body: &str) -> AppResult<Value> {
    serde_json::from_str(body)
        .map_err(|_| malformed(step, "Upload server returned a non-JSON reply"))
}

/// Upload servers report problems as `{"error": "..."}` with status 200.
fn rejected_upload(step: &str, reply: &Value) -> AppError {
    let message = match reply.get("error") {
        Some(Value::String(reason)) => format!("Upload rejected: {}", reason),
        Some(other) => format!("Upload rejected: {}", other),
        None => "Upload server reply is missing required fields".to_string(),
    };
    malformed(step, message)
}

fn malformed(step: &str, message: impl Into<String>) -> AppError {
    AppError::Upload {
        step: step.to_string(),
        message: message.into(),
        error_code: None,
        timed_out: false,
    }
}
