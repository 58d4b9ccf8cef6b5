use std::time::Duration;

use crate::config::VkConfig;

/// Builds the shared outbound HTTP client.
///
/// One client serves media downloads, VK API calls and upload-server posts so
/// they share a connection pool. Both timeouts come from the VK section of the
/// settings and apply to every request made through the client.
///
/// # Features
/// - **Timeouts**: `vk.request_timeout` per request, `vk.connect_timeout` per connect
/// - **Redirects**: followed (reqwest default policy, up to 10 hops)
/// - **Compression**: gzip, deflate, brotli and zstd
/// - **Security**: Rustls for TLS
pub fn build_http_client(config: &VkConfig) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.connect_timeout())
        // Connection pooling
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Duration::from_secs(90))
        .gzip(true)
        .deflate(true)
        .brotli(true)
        .zstd(true)
        .user_agent(user_agent())
        .build()
}

fn user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), crate::pkg_version())
}
