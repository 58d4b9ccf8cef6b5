//! Short, log-safe descriptions of remote HTTP responses.

use reqwest::StatusCode;
use reqwest::header::{CONTENT_TYPE, HeaderMap};

/// Maximum number of body characters kept in a summary
pub const BODY_SNIPPET_LIMIT: usize = 200;

/// Content type of a response, if the header is present and readable.
pub fn content_type(headers: &HeaderMap) -> Option<String> {
    headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Status, content type and a whitespace-collapsed body snippet.
///
/// Produces `HTTP 403, content-type text/html, body: <snippet>...`
pub fn summarize(status: StatusCode, content_type: Option<&str>, body: &str) -> String {
    format!(
        "HTTP {}, content-type {}, body: {}",
        status.as_u16(),
        content_type.unwrap_or("unknown"),
        snippet(body)
    )
}

/// Transport failure with its cause chain and without the request URL.
///
/// Timeouts always say so, whatever the underlying error prints.
pub fn describe_transport(error: reqwest::Error) -> String {
    let timed_out = error.is_timeout();
    let error = error.without_url();

    let mut text = error.to_string();
    let mut source = std::error::Error::source(&error);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }

    if timed_out && !text.contains("timed out") {
        text.push_str(" (timed out)");
    }
    text
}

/// First [`BODY_SNIPPET_LIMIT`] characters of `body` with runs of whitespace
/// collapsed to a single space. Truncated snippets end with `...`.
pub fn snippet(body: &str) -> String {
    let collapsed = body.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= BODY_SNIPPET_LIMIT {
        return collapsed;
    }

    let mut truncated: String = collapsed.chars().take(BODY_SNIPPET_LIMIT).collect();
    truncated.push_str("...");
    truncated
}
