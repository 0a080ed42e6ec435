//! Asset Fetching
//!
//! Resolves an [`AssetRef`] to its bytes. Remote references are downloaded
//! over http/https only; local files are read from disk; inline buffers are
//! returned as-is.

use std::path::Path;

use async_trait::async_trait;
use tracing::debug;

use crate::core::{AssetRef, CoreError, CoreResult};

/// Maximum accepted asset size (512 MB)
pub const MAX_ASSET_BYTES: u64 = 512 * 1024 * 1024;

/// Fetches the bytes behind an asset reference
#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, asset: &AssetRef) -> CoreResult<Vec<u8>>;
}

/// Default fetcher for url, file and inline references
pub struct HttpAssetFetcher {
    #[cfg(feature = "http-assets")]
    client: reqwest::Client,
    max_bytes: u64,
}

impl HttpAssetFetcher {
    /// Creates a fetcher whose downloads give up after `timeout_secs`
    pub fn new(timeout_secs: u64) -> CoreResult<Self> {
        #[cfg(feature = "http-assets")]
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| CoreError::Internal(format!("Failed to create HTTP client: {}", e)))?;
        #[cfg(not(feature = "http-assets"))]
        let _ = timeout_secs;

        Ok(Self {
            #[cfg(feature = "http-assets")]
            client,
            max_bytes: MAX_ASSET_BYTES,
        })
    }

    pub fn with_max_bytes(mut self, max_bytes: u64) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    async fn fetch_file(&self, asset: &AssetRef, path: &Path) -> CoreResult<Vec<u8>> {
        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| CoreError::asset_unavailable(asset, e))?;
        if metadata.len() > self.max_bytes {
            return Err(CoreError::asset_unavailable(
                asset,
                format!("file exceeds {} bytes", self.max_bytes),
            ));
        }
        tokio::fs::read(path)
            .await
            .map_err(|e| CoreError::asset_unavailable(asset, e))
    }

    #[cfg(feature = "http-assets")]
    async fn fetch_url(&self, asset: &AssetRef, url: &str) -> CoreResult<Vec<u8>> {
        let validated = validate_asset_url(url)?;

        let mut resp = self
            .client
            .get(validated)
            .send()
            .await
            .map_err(|e| CoreError::asset_unavailable(asset, format!("download failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(CoreError::asset_unavailable(
                asset,
                format!("download failed with status: {}", resp.status()),
            ));
        }

        if let Some(content_len) = resp.content_length() {
            if content_len > self.max_bytes {
                return Err(CoreError::asset_unavailable(
                    asset,
                    format!("{} bytes > {} bytes limit", content_len, self.max_bytes),
                ));
            }
        }

        let mut data = Vec::new();
        while let Some(chunk) = resp
            .chunk()
            .await
            .map_err(|e| CoreError::asset_unavailable(asset, format!("failed to read chunk: {}", e)))?
        {
            if (data.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(CoreError::asset_unavailable(
                    asset,
                    format!("exceeded max size limit ({} bytes)", self.max_bytes),
                ));
            }
            data.extend_from_slice(&chunk);
        }

        debug!("Downloaded {} ({} bytes)", url, data.len());
        Ok(data)
    }

    #[cfg(not(feature = "http-assets"))]
    async fn fetch_url(&self, asset: &AssetRef, _url: &str) -> CoreResult<Vec<u8>> {
        Err(CoreError::asset_unavailable(
            asset,
            "built without the http-assets feature",
        ))
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, asset: &AssetRef) -> CoreResult<Vec<u8>> {
        match asset {
            AssetRef::Url { url } => self.fetch_url(asset, url).await,
            AssetRef::File { path } => self.fetch_file(asset, path).await,
            AssetRef::Inline { data, .. } => {
                debug!("Using inline asset ({} bytes)", data.len());
                Ok(data.clone())
            }
        }
    }
}

/// Validate that an asset URL is a safe HTTP(S) URL.
#[cfg(feature = "http-assets")]
pub fn validate_asset_url(url: &str) -> CoreResult<reqwest::Url> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| CoreError::asset_unavailable(url, format!("invalid URL: {}", e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(CoreError::asset_unavailable(
            url,
            format!(
                "unsupported URL scheme '{}'. Only http/https are allowed.",
                scheme
            ),
        )),
    }
}
