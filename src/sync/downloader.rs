//! Thumbnail download over HTTP

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use tracing::debug;
use url::Url;

/// Fetches a resource by URL
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes>;
}

/// `HttpFetch` over a shared reqwest client
#[derive(Clone)]
pub struct ReqwestFetcher {
    http_client: Client,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self> {
        let http_client = Client::builder()
            .user_agent(concat!("ytdumper/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes> {
        debug!("Fetching: {}", url);

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch {}", url))?;

        if !response.status().is_success() {
            anyhow::bail!("Fetching {} failed (status {})", url, response.status());
        }

        response
            .bytes()
            .await
            .context("Failed to read response body")
    }
}

/// Whether a thumbnail URL points at JPEG content
///
/// Only the path is inspected, so `?sqp=...jpg` style query noise is ignored.
pub fn is_jpeg_url(url: &str) -> bool {
    let path = match Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url.split('?').next().unwrap_or_default().to_ascii_lowercase(),
    };
    path.contains("jpg") || path.contains("jpeg")
}
