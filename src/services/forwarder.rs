//! Notification forwarding to VK.
//!
//! Turns a validated request into the VK call sequence for its endpoint. Each
//! operation is a straight pipeline: fetch media, run the upload handshake,
//! issue the final `messages.send` or `wall.post`. Nothing is retried.

use std::str::FromStr;
use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;

use crate::config::VkConfig;
use crate::error::{AppError, AppResult};
use crate::external::media::{MediaFetcher, MediaKind};
use crate::external::vk::client::group_auth_failed;
use crate::external::vk::{Attachment, VkClient, is_group_auth_failure};

/// How `/send_video` delivers the clip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSendMode {
    /// Upload through `video.save`, falling back to a document when the
    /// community token cannot save videos
    #[default]
    Video,
    /// Upload as a message document
    Document,
}

impl FromStr for VideoSendMode {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "video" => Ok(VideoSendMode::Video),
            "document" | "doc" => Ok(VideoSendMode::Document),
            _ => Err(AppError::validation(
                "type",
                "must be either 'video' or 'document'",
            )),
        }
    }
}

/// Outcome of a successful forward
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// `response` value of the final VK call
    pub response: Value,
    pub attachment: Option<Attachment>,
}

/// Forwards notifications to the configured VK peer or community wall
#[derive(Clone)]
pub struct NotificationForwarder {
    vk: VkClient,
    media: MediaFetcher,
}

impl NotificationForwarder {
    /// Creates a forwarder sharing one HTTP client between media downloads
    /// and VK calls.
    pub fn new(http: reqwest::Client, config: Arc<VkConfig>) -> Self {
        Self {
            media: MediaFetcher::new(http.clone(), config.max_media_bytes),
            vk: VkClient::new(http, config),
        }
    }

    fn config(&self) -> &VkConfig {
        self.vk.config()
    }

    /// Sends a text message to the configured peer.
    pub async fn send_message(&self, text: &str) -> AppResult<Delivery> {
        let response = self.send_to_peer(Some(text), None).await?;
        Ok(Delivery {
            response,
            attachment: None,
        })
    }

    /// Downloads an image and sends it to the configured peer.
    pub async fn send_image(&self, url: &Url) -> AppResult<Delivery> {
        let config = self.config();
        let payload = self.media.fetch(url, MediaKind::Image).await?;

        let attachment = self
            .vk
            .upload_message_photo(&config.access_token, &config.peer_id, &payload)
            .await?;
        drop(payload);

        let response = self.send_to_peer(None, Some(&attachment)).await?;
        Ok(Delivery {
            response,
            attachment: Some(attachment),
        })
    }

    /// Downloads a video and sends it to the configured peer.
    ///
    /// - `Document` mode uploads a message document with the community token.
    /// - With a wall token configured, `video.save` runs under that token and
    ///   the message is still sent with the community token.
    /// - Otherwise `video.save` runs under the community token, and a
    ///   "Group authorization failed" answer switches to a document upload.
    pub async fn send_video(&self, url: &Url, mode: VideoSendMode) -> AppResult<Delivery> {
        let config = self.config();
        let payload = self.media.fetch(url, MediaKind::Video).await?;

        let attachment = match mode {
            VideoSendMode::Document => {
                self.vk
                    .upload_message_document(&config.access_token, &config.peer_id, &payload)
                    .await?
            }
            VideoSendMode::Video if config.has_wall_token() => {
                self.vk.upload_video(config.wall_token(), &payload).await?
            }
            VideoSendMode::Video => {
                match self.vk.upload_video(&config.access_token, &payload).await {
                    Ok(attachment) => attachment,
                    Err(error) if is_group_auth_failure(&error) => {
                        tracing::warn!(
                            error = %error,
                            "Community token cannot save videos, sending as document"
                        );
                        self.vk
                            .upload_message_document(
                                &config.access_token,
                                &config.peer_id,
                                &payload,
                            )
                            .await?
                    }
                    Err(error) => return Err(error),
                }
            }
        };
        drop(payload);

        let response = self.send_to_peer(None, Some(&attachment)).await?;
        Ok(Delivery {
            response,
            attachment: Some(attachment),
        })
    }

    /// Publishes a post on the community wall, optionally with a photo.
    ///
    /// Uses the wall token when configured and the community token otherwise.
    /// The group id is checked before any remote call.
    pub async fn send_post(&self, text: &str, image: Option<&Url>) -> AppResult<Delivery> {
        let config = self.config();
        let group_id = config.group_id()?;
        let owner_id = config.wall_owner_id()?;
        let token = config.wall_token();

        let attachment = match image {
            Some(url) => {
                let payload = self.media.fetch(url, MediaKind::Image).await?;
                let attachment = self
                    .vk
                    .upload_wall_photo(token, group_id, &payload)
                    .await
                    .map_err(explain_wall_upload_failure)?;
                Some(attachment)
            }
            None => None,
        };

        let mut params = vec![
            ("owner_id", owner_id.to_string()),
            ("from_group", "1".to_string()),
            ("message", text.to_string()),
        ];
        if let Some(attachment) = &attachment {
            params.push(("attachments", attachment.to_string()));
        }

        let response = self
            .vk
            .call("wall.post", token, &params)
            .await
            .map_err(|e| e.into_delivery())?;

        let token_text = attachment.as_ref().map(ToString::to_string).unwrap_or_default();
        tracing::info!(
            owner_id = owner_id,
            attachment = %token_text,
            "Wall post published"
        );

        Ok(Delivery {
            response,
            attachment,
        })
    }

    /// `messages.send` to the configured peer with the community token.
    async fn send_to_peer(
        &self,
        text: Option<&str>,
        attachment: Option<&Attachment>,
    ) -> AppResult<Value> {
        let config = self.config();
        let mut params = vec![
            ("peer_id", config.peer_id.clone()),
            ("random_id", "0".to_string()),
        ];
        if let Some(text) = text.filter(|text| !text.is_empty()) {
            params.push(("message", text.to_string()));
        }
        if let Some(attachment) = attachment {
            params.push(("attachment", attachment.to_string()));
        }

        let response = self
            .vk
            .call("messages.send", &config.access_token, &params)
            .await
            .map_err(|e| e.into_delivery())?;

        let token_text = attachment.map(ToString::to_string).unwrap_or_default();
        tracing::info!(
            peer_id = %config.peer_id,
            attachment = %token_text,
            "Message delivered"
        );

        Ok(response)
    }
}

/// Community tokens cannot upload wall photos; say which token to fix.
fn explain_wall_upload_failure(error: AppError) -> AppError {
    match error {
        AppError::Upload {
            step,
            message,
            error_code,
            timed_out,
        } if group_auth_failed(error_code, &message) => {
            AppError::Upload {
                step,
                message: format!(
                    "{} (VK_WALL_ACCESS_TOKEN must be a user token with wall, photos and offline access)",
                    message
                ),
                error_code,
                timed_out,
            }
        }
        other => other,
    }
}
