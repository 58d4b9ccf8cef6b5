//! VK API payload shapes used by the upload handshakes.
//!
//! VK is loose about numeric fields (ids arrive as numbers or strings,
//! `server` is a number on some upload hosts and a string on others), so the
//! payloads are read from `serde_json::Value` rather than strict structs.

use std::fmt;

use serde_json::Value;

/// Kind prefix of an attachment token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentKind {
    Photo,
    Video,
    Doc,
}

impl AttachmentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttachmentKind::Photo => "photo",
            AttachmentKind::Video => "video",
            AttachmentKind::Doc => "doc",
        }
    }
}

/// Attachment token referenced by `messages.send` and `wall.post`
///
/// Renders as `{kind}{owner_id}_{item_id}` with `_{access_key}` appended when
/// VK returned one, e.g. `photo-123_456_abcdef`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub kind: AttachmentKind,
    pub owner_id: i64,
    pub item_id: i64,
    pub access_key: Option<String>,
}

impl Attachment {
    /// Reads an attachment from a saved-object payload.
    ///
    /// `id_keys` are tried in order because VK names the item id differently
    /// across methods (`id`, `photo_id`, `video_id`, `vid`, `doc_id`).
    pub fn from_object(kind: AttachmentKind, object: &Value, id_keys: &[&str]) -> Option<Self> {
        let owner_id = int_field(object, "owner_id")?;
        let item_id = id_keys.iter().find_map(|key| int_field(object, key))?;
        let access_key = object
            .get("access_key")
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .map(str::to_string);

        Some(Self {
            kind,
            owner_id,
            item_id,
            access_key,
        })
    }
}

impl fmt::Display for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}_{}", self.kind.as_str(), self.owner_id, self.item_id)?;
        if let Some(key) = &self.access_key {
            write!(f, "_{}", key)?;
        }
        Ok(())
    }
}

/// Reply of an upload server to a photo upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoReceipt {
    pub server: String,
    pub photo: String,
    pub hash: String,
}

impl PhotoReceipt {
    /// Extracts `server`, `photo` and `hash`; an empty photo list (`[]`) means
    /// the upload server rejected the file.
    pub fn from_value(value: &Value) -> Option<Self> {
        let server = scalar_field(value, "server")?;
        let photo = value.get("photo").and_then(Value::as_str)?;
        let hash = scalar_field(value, "hash")?;

        if photo.is_empty() || photo == "[]" {
            return None;
        }

        Some(Self {
            server,
            photo: photo.to_string(),
            hash,
        })
    }
}

/// Answer of `video.save`: where to upload and what the video will be called
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoTicket {
    pub upload_url: String,
    pub attachment: Attachment,
}

impl VideoTicket {
    pub fn from_value(value: &Value) -> Option<Self> {
        let upload_url = upload_url(value)?;
        let attachment =
            Attachment::from_object(AttachmentKind::Video, value, &["video_id", "vid", "id"])?;
        Some(Self {
            upload_url,
            attachment,
        })
    }
}

/// `upload_url` field of a `*.get*UploadServer` or `video.save` answer.
pub fn upload_url(value: &Value) -> Option<String> {
    value
        .get("upload_url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .map(str::to_string)
}

/// First saved photo of a `photos.save*Photo` answer.
pub fn saved_photo(value: &Value) -> Option<Attachment> {
    let first = value.as_array()?.first()?;
    Attachment::from_object(AttachmentKind::Photo, first, &["id", "photo_id"])
}

/// Saved document of a `docs.save` answer.
///
/// Current API versions wrap it as `{"type": "doc", "doc": {...}}`, older
/// ones return a list of documents.
pub fn saved_doc(value: &Value) -> Option<Attachment> {
    let object = match value {
        Value::Array(items) => items.first()?,
        Value::Object(map) => map.get("doc").unwrap_or(value),
        _ => return None,
    };
    Attachment::from_object(AttachmentKind::Doc, object, &["id", "doc_id"])
}

fn int_field(object: &Value, key: &str) -> Option<i64> {
    match object.get(key)? {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn scalar_field(object: &Value, key: &str) -> Option<String> {
    match object.get(key)? {
        Value::Number(number) => Some(number.to_string()),
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_attachment_display() {
        let attachment = Attachment {
            kind: AttachmentKind::Photo,
            owner_id: -123,
            item_id: 456,
            access_key: None,
        };
        assert_eq!(attachment.to_string(), "photo-123_456");

        let keyed = Attachment {
            access_key: Some("abc".to_string()),
            ..attachment
        };
        assert_eq!(keyed.to_string(), "photo-123_456_abc");
    }

    #[test]
    fn test_saved_photo_uses_first_item() {
        let value = json!([
            {"owner_id": 100, "id": 7, "access_key": "k1"},
            {"owner_id": 100, "id": 8}
        ]);
        assert_eq!(saved_photo(&value).unwrap().to_string(), "photo100_7_k1");
    }

    #[test]
    fn test_saved_photo_accepts_photo_id_and_string_ids() {
        let value = json!([{"owner_id": "-5", "photo_id": "42"}]);
        assert_eq!(saved_photo(&value).unwrap().to_string(), "photo-5_42");
    }

    #[test]
    fn test_saved_photo_empty_list() {
        assert!(saved_photo(&json!([])).is_none());
        assert!(saved_photo(&json!({"owner_id": 1, "id": 2})).is_none());
    }

    #[test]
    fn test_saved_doc_shapes() {
        let wrapped = json!({"type": "doc", "doc": {"owner_id": 9, "id": 10}});
        assert_eq!(saved_doc(&wrapped).unwrap().to_string(), "doc9_10");

        let listed = json!([{"owner_id": 9, "doc_id": 11}]);
        assert_eq!(saved_doc(&listed).unwrap().to_string(), "doc9_11");

        assert!(saved_doc(&json!("doc")).is_none());
    }

    #[test]
    fn test_photo_receipt() {
        let value = json!({"server": 8311, "photo": "[{\"photo\":\"x\"}]", "hash": "h"});
        let receipt = PhotoReceipt::from_value(&value).unwrap();
        assert_eq!(receipt.server, "8311");
        assert_eq!(receipt.hash, "h");

        let rejected = json!({"server": 8311, "photo": "[]", "hash": "h"});
        assert!(PhotoReceipt::from_value(&rejected).is_none());

        assert!(PhotoReceipt::from_value(&json!({"photo": "x", "hash": "h"})).is_none());
    }

    #[test]
    fn test_video_ticket() {
        let value = json!({
            "upload_url": "https://upload.example/video",
            "owner_id": -77,
            "vid": 5,
            "access_key": "secret"
        });
        let ticket = VideoTicket::from_value(&value).unwrap();
        assert_eq!(ticket.upload_url, "https://upload.example/video");
        assert_eq!(ticket.attachment.to_string(), "video-77_5_secret");

        assert!(VideoTicket::from_value(&json!({"owner_id": 1, "video_id": 2})).is_none());
    }
}
