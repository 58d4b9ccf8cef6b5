//! VK API access: method calls, upload handshakes and payload shapes.

pub mod client;
pub mod types;
pub mod upload;

pub use client::{VkApiError, VkClient};
pub use types::{Attachment, AttachmentKind};
pub use upload::is_group_auth_failure;
