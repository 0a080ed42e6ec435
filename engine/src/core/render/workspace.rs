//! Render Workspace
//!
//! Per-job scratch directory. Fetched assets, scene clips and intermediate
//! outputs all live here; dropping the workspace deletes everything, on
//! success and on every error path.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tracing::debug;

use crate::core::{AssetRef, CoreResult};

/// Temporary directory owned by one render job
pub struct RenderWorkspace {
    dir: TempDir,
}

impl RenderWorkspace {
    pub fn new() -> CoreResult<Self> {
        let dir = tempfile::Builder::new().prefix("reelsync-render-").tempdir()?;
        debug!("Render workspace at {}", dir.path().display());
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Path for a fetched scene asset, keeping the reference's extension
    pub fn asset_path(&self, index: usize, role: &str, asset: &AssetRef) -> PathBuf {
        let ext = asset.extension_hint().unwrap_or_else(|| "bin".to_string());
        self.path()
            .join(format!("scene_{:03}_{}.{}", index, role, ext))
    }

    pub fn music_path(&self, asset: &AssetRef) -> PathBuf {
        let ext = asset.extension_hint().unwrap_or_else(|| "bin".to_string());
        self.path().join(format!("music.{}", ext))
    }

    pub fn clip_path(&self, index: usize) -> PathBuf {
        self.path().join(format!("clip_{:03}.mp4", index))
    }

    pub fn concat_list_path(&self) -> PathBuf {
        self.path().join("concat.txt")
    }

    pub fn concat_output_path(&self) -> PathBuf {
        self.path().join("concat.mp4")
    }

    pub fn mixed_output_path(&self) -> PathBuf {
        self.path().join("final.mp4")
    }

    /// Writes fetched bytes to `path`
    pub async fn store(&self, path: &Path, bytes: &[u8]) -> CoreResult<()> {
        tokio::fs::write(path, bytes).await?;
        Ok(())
    }
}
