//! Remote image download for image-backed video entries.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use clipline_common::error::{ClipError, ClipResult};

use crate::scratch::Scratch;

const KNOWN_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "bmp"];

/// Downloads a still image into scratch space.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch `url` and return the local path. Every failure is a
    /// [`ClipError::RemoteFetch`].
    async fn fetch(&self, url: &str, scratch: &Scratch) -> ClipResult<PathBuf>;
}

/// HTTP(S) fetcher with a per-download deadline and a body size cap.
#[derive(Debug, Clone)]
pub struct HttpImageFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: u64,
}

impl HttpImageFetcher {
    pub fn new(timeout_secs: u64, max_bytes: u64) -> ClipResult<Self> {
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .user_agent(concat!("clipline/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ClipError::config(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, timeout, max_bytes))
    }

    pub fn with_client(client: reqwest::Client, timeout: Duration, max_bytes: u64) -> Self {
        Self {
            client,
            timeout,
            max_bytes,
        }
    }

    async fn download(&self, url: &Url) -> ClipResult<Vec<u8>> {
        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ClipError::fetch(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClipError::fetch(format!("{url}: HTTP {status}")));
        }

        if let Some(declared) = response.content_length() {
            check_body_size(url, declared, self.max_bytes)?;
        }

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| ClipError::fetch(format!("{url}: {e}")))?
        {
            body.extend_from_slice(&chunk);
            check_body_size(url, body.len() as u64, self.max_bytes)?;
        }
        if body.is_empty() {
            return Err(ClipError::fetch(format!("{url}: empty body")));
        }
        Ok(body)
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &str, scratch: &Scratch) -> ClipResult<PathBuf> {
        let parsed = parse_image_url(url)?;
        let secs = self.timeout.as_secs();

        let bytes = tokio::time::timeout(self.timeout, self.download(&parsed))
            .await
            .map_err(|_| ClipError::fetch(format!("{parsed}: timed out after {secs}s")))??;

        let path = scratch.file("image", image_extension(&parsed));
        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| ClipError::fetch(format!("failed to store {parsed}: {e}")))?;

        tracing::debug!(url = %parsed, bytes = bytes.len(), path = %path.display(), "Fetched image");
        Ok(path)
    }
}

/// Parse and check an image URL. Only `http` and `https` are accepted.
pub fn parse_image_url(url: &str) -> ClipResult<Url> {
    let parsed = Url::parse(url.trim()).map_err(|e| ClipError::fetch(format!("{url}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(ClipError::fetch(format!(
            "{url}: unsupported scheme '{other}'"
        ))),
    }
}

fn check_body_size(url: &Url, len: u64, max: u64) -> ClipResult<()> {
    if len > max {
        return Err(ClipError::fetch(format!(
            "{url}: body of {len} bytes exceeds limit of {max}"
        )));
    }
    Ok(())
}

/// File extension to store a downloaded image under.
pub fn image_extension(url: &Url) -> &'static str {
    let last = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .unwrap_or_default();
    let ext = last
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    KNOWN_IMAGE_EXTENSIONS
        .iter()
        .copied()
        .find(|known| *known == ext)
        .unwrap_or("jpg")
}
