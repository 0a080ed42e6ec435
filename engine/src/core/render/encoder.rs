//! Composition Encoder
//!
//! The encoding capability behind the batch renderer. [`FFmpegEncoder`] is
//! the production implementation; tests substitute a recording fake.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use super::plan::{concat_args, concat_list, music_mix_args, ClipPlan};
use crate::core::{
    ffmpeg::{detect_ffmpeg, FFmpegError, FFmpegRunner},
    settings::{EncoderSettings, ExportSettings},
    CoreError, CoreResult, TimeSec,
};

/// Operations the batch renderer needs from an encoder
#[async_trait]
pub trait CompositionEncoder: Send + Sync {
    /// Fails with [`CoreError::RendererUnavailable`] when encoding cannot run
    async fn check_available(&self) -> CoreResult<()>;

    /// Encodes one scene clip to `plan.output`
    async fn encode_clip(&self, plan: &ClipPlan, settings: &ExportSettings) -> CoreResult<()>;

    /// Joins `clips` in order into `output`; `list_path` is scratch space
    async fn concat(&self, clips: &[PathBuf], list_path: &Path, output: &Path) -> CoreResult<()>;

    /// Mixes looped `music` under the audio of `video`
    async fn mix_music(
        &self,
        video: &Path,
        music: &Path,
        volume: f64,
        output: &Path,
        settings: &ExportSettings,
    ) -> CoreResult<()>;

    /// Duration of an encoded file in seconds
    async fn probe_duration(&self, path: &Path) -> CoreResult<TimeSec>;
}

/// FFmpeg-backed encoder
pub struct FFmpegEncoder {
    runner: Result<FFmpegRunner, String>,
}

impl FFmpegEncoder {
    /// Detects FFmpeg now; a missing installation surfaces later from
    /// [`CompositionEncoder::check_available`].
    pub fn detect(overrides: &EncoderSettings) -> Self {
        let runner = detect_ffmpeg(overrides)
            .map(FFmpegRunner::new)
            .map_err(|e| {
                warn!("FFmpeg unavailable: {}", e);
                e.to_string()
            });
        Self { runner }
    }

    pub fn with_runner(runner: FFmpegRunner) -> Self {
        Self { runner: Ok(runner) }
    }

    fn runner(&self) -> CoreResult<&FFmpegRunner> {
        self.runner
            .as_ref()
            .map_err(|reason| CoreError::RendererUnavailable(reason.clone()))
    }
}

fn encoder_error(e: FFmpegError) -> CoreError {
    match e {
        FFmpegError::NotFound => CoreError::RendererUnavailable(e.to_string()),
        other => CoreError::Internal(other.to_string()),
    }
}

#[async_trait]
impl CompositionEncoder for FFmpegEncoder {
    async fn check_available(&self) -> CoreResult<()> {
        let runner = self.runner()?;
        if !runner.info().ffmpeg_path.is_file() {
            return Err(CoreError::RendererUnavailable(format!(
                "ffmpeg binary missing: {}",
                runner.info().ffmpeg_path.display()
            )));
        }
        debug!("Encoder available: FFmpeg {}", runner.info().version);
        Ok(())
    }

    async fn encode_clip(&self, plan: &ClipPlan, settings: &ExportSettings) -> CoreResult<()> {
        self.runner()?
            .run(&plan.to_ffmpeg_args(settings))
            .await
            .map_err(encoder_error)
    }

    async fn concat(&self, clips: &[PathBuf], list_path: &Path, output: &Path) -> CoreResult<()> {
        tokio::fs::write(list_path, concat_list(clips)).await?;
        self.runner()?
            .run(&concat_args(list_path, output))
            .await
            .map_err(encoder_error)
    }

    async fn mix_music(
        &self,
        video: &Path,
        music: &Path,
        volume: f64,
        output: &Path,
        settings: &ExportSettings,
    ) -> CoreResult<()> {
        self.runner()?
            .run(&music_mix_args(video, music, volume, output, settings))
            .await
            .map_err(encoder_error)
    }

    async fn probe_duration(&self, path: &Path) -> CoreResult<TimeSec> {
        let info = self.runner()?.probe(path).await.map_err(encoder_error)?;
        debug!(
            "Probed {}: {} ({:.3}s)",
            path.display(),
            info.format,
            info.duration_sec
        );
        Ok(info.duration_sec)
    }
}
