//! Outbound HTTP: the shared client, media downloads and the VK API.

pub mod client;
pub mod media;
pub mod summary;
pub mod vk;

pub use client::build_http_client;
pub use media::{MediaFetcher, MediaKind, MediaPayload};
