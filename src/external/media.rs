//! Downloading of caller-referenced media.
//!
//! The forwarder never accepts file uploads from callers. Images and videos are
//! referenced by URL and fetched here, then handed to the VK upload handshakes
//! as an in-memory [`MediaPayload`].

use reqwest::Url;
use reqwest::multipart::Part;

use super::summary::{content_type, describe_transport, summarize};
use crate::error::{AppError, AppResult};

/// Content type assumed when the remote server does not send one
pub const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Class of media a URL is expected to point at
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Whether a reported content type is acceptable for this kind.
    pub fn accepts(&self, content_type: &str) -> bool {
        let essence = essence(content_type);
        match self {
            MediaKind::Image => essence.starts_with("image/"),
            MediaKind::Video => essence.starts_with("video/") || essence == FALLBACK_CONTENT_TYPE,
        }
    }

    /// Noun phrase used in user-facing errors.
    pub fn noun(&self) -> &'static str {
        match self {
            MediaKind::Image => "an image",
            MediaKind::Video => "a video",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }
}

/// A downloaded media file held in memory
#[derive(Clone)]
pub struct MediaPayload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub file_name: String,
}

impl MediaPayload {
    /// Multipart part for an upload-server POST.
    ///
    /// Falls back to `application/octet-stream` when the remote content type
    /// is not a valid MIME string.
    pub fn to_part(&self) -> Part {
        let part = || Part::bytes(self.bytes.clone()).file_name(self.file_name.clone());
        part()
            .mime_str(&self.content_type)
            .unwrap_or_else(|_| part())
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for MediaPayload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaPayload")
            .field("len", &self.bytes.len())
            .field("content_type", &self.content_type)
            .field("file_name", &self.file_name)
            .finish()
    }
}

/// Downloads media over the shared HTTP client
#[derive(Clone)]
pub struct MediaFetcher {
    client: reqwest::Client,
    max_bytes: u64,
}

impl MediaFetcher {
    /// Fetcher refusing bodies larger than `max_bytes`.
    pub fn new(client: reqwest::Client, max_bytes: u64) -> Self {
        Self { client, max_bytes }
    }

    /// Downloads `url` and checks it is the expected kind of media.
    ///
    /// Redirects are followed. The content type is only enforced when the
    /// server reports one, and it is checked before the body is read so a
    /// mismatched page is never buffered. Bodies over the size limit are
    /// refused from `Content-Length` when announced, otherwise while streaming.
    pub async fn fetch(&self, url: &Url, kind: MediaKind) -> AppResult<MediaPayload> {
        let label = kind.as_str();

        tracing::debug!(url = %url, kind = label, "Downloading media");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| AppError::MediaFetch {
                timed_out: e.is_timeout(),
                message: format!("Failed to download {}: {}", label, describe_transport(e)),
            })?;

        let status = response.status();
        let reported_type = content_type(response.headers());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::MediaFetch {
                message: format!(
                    "Failed to download {} ({})",
                    label,
                    summarize(status, reported_type.as_deref(), &body)
                ),
                timed_out: false,
            });
        }

        if let Some(actual) = reported_type.as_deref()
            && !kind.accepts(actual)
        {
            return Err(AppError::MediaType {
                expected: kind.noun().to_string(),
                actual: actual.to_string(),
            });
        }

        if let Some(length) = response.content_length()
            && length > self.max_bytes
        {
            return Err(self.too_large(label));
        }

        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| AppError::MediaFetch {
            timed_out: e.is_timeout(),
            message: format!("Failed to read {} body: {}", label, describe_transport(e)),
        })? {
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(self.too_large(label));
            }
            bytes.extend_from_slice(&chunk);
        }

        if bytes.is_empty() {
            return Err(AppError::MediaFetch {
                message: format!("Downloaded {} is empty", label),
                timed_out: false,
            });
        }

        let content_type = reported_type.unwrap_or_else(|| FALLBACK_CONTENT_TYPE.to_string());
        let file_name = file_name_for(url, kind, &content_type);

        tracing::debug!(
            kind = label,
            bytes = bytes.len(),
            content_type = %content_type,
            file_name = %file_name,
            "Media downloaded"
        );

        Ok(MediaPayload {
            bytes,
            content_type,
            file_name,
        })
    }

    fn too_large(&self, label: &str) -> AppError {
        AppError::MediaFetch {
            message: format!(
                "Downloaded {} exceeds the {} byte limit",
                label, self.max_bytes
            ),
            timed_out: false,
        }
    }
}

/// Derives an upload filename from the last URL path segment.
///
/// Uses `image` or `video` when the path has no usable segment and appends an
/// extension when the name has none and the content type maps to one.
pub fn file_name_for(url: &Url, kind: MediaKind, content_type: &str) -> String {
    let mut name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .unwrap_or(kind.as_str())
        .to_string();

    if !name.contains('.')
        && let Some(extension) = extension_for(content_type)
    {
        name.push('.');
        name.push_str(extension);
    }

    name
}

/// File extension for the common image and video content types.
pub fn extension_for(content_type: &str) -> Option<&'static str> {
    let extension = match essence(content_type).as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/bmp" => "bmp",
        "image/heic" => "heic",
        "video/mp4" => "mp4",
        "video/quicktime" => "mov",
        "video/webm" => "webm",
        "video/x-matroska" => "mkv",
        "video/x-msvideo" => "avi",
        "video/mpeg" => "mpeg",
        "video/3gpp" => "3gp",
        _ => return None,
    };
    Some(extension)
}

/// Lowercased media type without parameters (`Image/PNG; q=1` -> `image/png`).
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> MediaFetcher {
        MediaFetcher::new(reqwest::Client::new(), 1024)
    }

    #[test]
    fn test_media_kind_accepts() {
        assert!(MediaKind::Image.accepts("image/png"));
        assert!(MediaKind::Image.accepts("IMAGE/JPEG; charset=binary"));
        assert!(!MediaKind::Image.accepts("text/html; charset=utf-8"));
        assert!(!MediaKind::Image.accepts("application/octet-stream"));

        assert!(MediaKind::Video.accepts("video/mp4"));
        assert!(MediaKind::Video.accepts("application/octet-stream"));
        assert!(!MediaKind::Video.accepts("image/gif"));
    }

    #[test]
    fn test_file_name_from_path() {
        let url = Url::parse("https://cdn.example.com/a/b/cat.jpg?size=large").unwrap();
        assert_eq!(file_name_for(&url, MediaKind::Image, "image/jpeg"), "cat.jpg");
    }

    #[test]
    fn test_file_name_adds_extension() {
        let url = Url::parse("https://cdn.example.com/media/12345").unwrap();
        assert_eq!(file_name_for(&url, MediaKind::Image, "image/png"), "12345.png");
    }

    #[test]
    fn test_file_name_fallback() {
        let url = Url::parse("https://cdn.example.com/").unwrap();
        assert_eq!(file_name_for(&url, MediaKind::Video, "video/mp4"), "video.mp4");
        assert_eq!(
            file_name_for(&url, MediaKind::Video, "application/octet-stream"),
            "video"
        );
    }

    #[tokio::test]
    async fn test_fetch_image() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/pic"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(vec![0x89, 0x50, 0x4e, 0x47], "image/png"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/pic", server.uri())).unwrap();
        let payload = fetcher().fetch(&url, MediaKind::Image).await.unwrap();

        assert_eq!(payload.len(), 4);
        assert_eq!(payload.content_type, "image/png");
        assert_eq!(payload.file_name, "pic.png");
    }

    #[tokio::test]
    async fn test_fetch_rejects_html_page() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("<html></html>", "text/html"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let error = fetcher().fetch(&url, MediaKind::Image).await.unwrap_err();

        match error {
            AppError::MediaType { expected, actual } => {
                assert_eq!(expected, "an image");
                assert_eq!(actual, "text/html");
            }
            other => panic!("Expected MediaType error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_reports_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(404).set_body_raw("not   found", "text/plain"),
            )
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let error = fetcher().fetch(&url, MediaKind::Video).await.unwrap_err();

        match error {
            AppError::MediaFetch { message, timed_out } => {
                assert!(message.contains("HTTP 404"), "message: {}", message);
                assert!(message.contains("body: not found"), "message: {}", message);
                assert!(!timed_out);
            }
            other => panic!("Expected MediaFetch error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).insert_header("content-type", "video/mp4"))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let error = fetcher().fetch(&url, MediaKind::Video).await.unwrap_err();

        assert!(matches!(error, AppError::MediaFetch { ref message, .. } if message == "Downloaded video is empty"));
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 2048], "video/mp4"))
            .mount(&server)
            .await;

        let url = Url::parse(&server.uri()).unwrap();
        let error = fetcher().fetch(&url, MediaKind::Video).await.unwrap_err();

        assert!(matches!(
            error,
            AppError::MediaFetch { ref message, timed_out: false }
                if message == "Downloaded video exceeds the 1024 byte limit"
        ));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_flagged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw(vec![1u8; 16], "image/png")
                    .set_delay(std::time::Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(300))
            .build()
            .unwrap();
        let url = Url::parse(&server.uri()).unwrap();
        let error = MediaFetcher::new(client, 1024)
            .fetch(&url, MediaKind::Image)
            .await
            .unwrap_err();

        match error {
            AppError::MediaFetch { message, timed_out } => {
                assert!(timed_out);
                assert!(message.contains("timed out"), "message: {}", message);
            }
            other => panic!("Expected MediaFetch error, got {:?}", other),
        }
    }
}
