//! Batch Compositor
//!
//! One-shot export of a whole timeline. Scenes are processed strictly in
//! order inside a private workspace:
//!
//! ```text
//!  check encoder ─► validate ─► per scene: fetch image ─► fetch narration ─► encode clip
//!                                                   │ fail          │ fail
//!                                                   ▼               ▼
//!                                              placeholder        silence
//!
//!  clips ─► concat ─► (music mix) ─► read output ─► RenderOutput
//! ```
//!
//! Per-scene asset failures are substituted and recorded. Encoding, concat
//! and mixing failures abort the job with the stage that failed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::{
    encoder::CompositionEncoder,
    plan::{AudioSource, ClipPlan, VisualSource},
    validation::narration_exempt,
    workspace::RenderWorkspace,
};
use crate::core::{
    assets::AssetFetcher,
    settings::ExportSettings,
    timeline::{Scene, Timeline},
    AssetRef, Color, CoreError, CoreResult, RenderStage, SceneId, TimeSec,
};

/// Content type of every render output
pub const OUTPUT_CONTENT_TYPE: &str = "video/mp4";

// =============================================================================
// Output Types
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubstitutionKind {
    /// Scene image replaced by a solid placeholder frame
    PlaceholderImage,
    /// Scene narration replaced by silence
    SilentNarration,
    /// Background music left out of the mix
    MusicOmitted,
}

/// A fallback the renderer applied instead of failing the job
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    /// Scene index, `None` for timeline-wide assets
    pub scene_index: Option<usize>,
    pub scene_id: Option<SceneId>,
    pub kind: SubstitutionKind,
    pub reason: String,
}

/// Finished export
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub duration_sec: TimeSec,
    pub scene_count: usize,
    pub substitutions: Vec<Substitution>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderPhase {
    Scene,
    Concat,
    MusicMix,
    Finalize,
    Complete,
}

/// Progress update sent while a render runs
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderProgress {
    pub phase: RenderPhase,
    pub scene_index: Option<usize>,
    pub scene_count: usize,
    /// Progress percentage (0.0 - 100.0)
    pub percent: f32,
    pub message: String,
}

struct ProgressReporter {
    tx: Option<mpsc::Sender<RenderProgress>>,
    scene_count: usize,
    total_steps: usize,
    done: usize,
}

impl ProgressReporter {
    fn new(tx: Option<mpsc::Sender<RenderProgress>>, scene_count: usize, has_music: bool) -> Self {
        Self {
            tx,
            scene_count,
            // scenes + concat + finalize (+ music mix)
            total_steps: scene_count + 2 + usize::from(has_music),
            done: 0,
        }
    }

    async fn step(&mut self, phase: RenderPhase, scene_index: Option<usize>, message: String) {
        let percent = (self.done as f32 / self.total_steps as f32 * 100.0).min(100.0);
        self.done += 1;
        self.send(phase, scene_index, percent, message).await;
    }

    async fn complete(&self) {
        self.send(RenderPhase::Complete, None, 100.0, "Render complete".to_string())
            .await;
    }

    async fn send(
        &self,
        phase: RenderPhase,
        scene_index: Option<usize>,
        percent: f32,
        message: String,
    ) {
        if let Some(tx) = &self.tx {
            // A dropped receiver only means nobody is listening.
            let _ = tx
                .send(RenderProgress {
                    phase,
                    scene_index,
                    scene_count: self.scene_count,
                    percent,
                    message,
                })
                .await;
        }
    }
}

fn stage_failed(stage: RenderStage, e: CoreError) -> CoreError {
    match e {
        CoreError::RendererUnavailable(_) | CoreError::StageFailed { .. } => e,
        other => CoreError::StageFailed {
            stage,
            message: other.to_string(),
        },
    }
}

// =============================================================================
// Batch Renderer
// =============================================================================

/// Renders whole timelines to a single video.
///
/// Holds no per-job state; concurrent renders each get their own workspace.
pub struct BatchRenderer {
    encoder: Arc<dyn CompositionEncoder>,
    fetcher: Arc<dyn AssetFetcher>,
    settings: ExportSettings,
}

impl BatchRenderer {
    pub fn new(
        encoder: Arc<dyn CompositionEncoder>,
        fetcher: Arc<dyn AssetFetcher>,
        settings: ExportSettings,
    ) -> Self {
        Self {
            encoder,
            fetcher,
            settings,
        }
    }

    pub fn settings(&self) -> &ExportSettings {
        &self.settings
    }

    /// Renders `timeline` and returns the encoded video
    pub async fn render(
        &self,
        timeline: &Timeline,
        progress: Option<mpsc::Sender<RenderProgress>>,
    ) -> CoreResult<RenderOutput> {
        self.encoder.check_available().await?;

        timeline.validate()?;
        if let Some(scene) = timeline.scenes.iter().find(|s| !s.status.is_ready()) {
            return Err(CoreError::SceneNotReady {
                scene_id: scene.id.clone(),
                status: scene.status.as_str().to_string(),
            });
        }

        let music = timeline
            .background_music
            .as_ref()
            .filter(|m| m.volume > 0.0);
        let scene_count = timeline.scenes.len();
        let mut reporter = ProgressReporter::new(progress, scene_count, music.is_some());

        info!(
            "Rendering timeline '{}' ({} scenes, {:.2}s)",
            timeline.name,
            scene_count,
            timeline.total_duration()
        );

        // Dropped on every return below, which removes all intermediates.
        let workspace = RenderWorkspace::new()?;
        let mut substitutions = Vec::new();
        let mut clips = Vec::with_capacity(scene_count);

        for (index, scene) in timeline.scenes.iter().enumerate() {
            reporter
                .step(
                    RenderPhase::Scene,
                    Some(index),
                    format!("Rendering scene {}/{}", index + 1, scene_count),
                )
                .await;

            let visual = match self.resolve_image(&workspace, index, scene).await {
                Ok(path) => VisualSource::Image(path),
                Err(reason) => {
                    warn!("Scene {} image substituted: {}", index, reason);
                    substitutions.push(Substitution {
                        scene_index: Some(index),
                        scene_id: Some(scene.id.clone()),
                        kind: SubstitutionKind::PlaceholderImage,
                        reason,
                    });
                    VisualSource::Placeholder(Color::from_hex(&self.settings.placeholder_color))
                }
            };

            let audio = if narration_exempt(timeline, scene) {
                AudioSource::Silence
            } else {
                match self.resolve_narration(&workspace, index, scene).await {
                    Ok(path) => AudioSource::Narration(path),
                    Err(reason) => {
                        warn!("Scene {} narration substituted: {}", index, reason);
                        substitutions.push(Substitution {
                            scene_index: Some(index),
                            scene_id: Some(scene.id.clone()),
                            kind: SubstitutionKind::SilentNarration,
                            reason,
                        });
                        AudioSource::Silence
                    }
                }
            };

            let plan = ClipPlan::for_scene(
                index,
                scene,
                timeline,
                &self.settings,
                workspace.clip_path(index),
            )
            .with_visual(visual)
            .with_audio(audio);

            self.encoder
                .encode_clip(&plan, &self.settings)
                .await
                .map_err(|e| stage_failed(RenderStage::SceneClip(index), e))?;
            clips.push(plan.output);
        }

        reporter
            .step(RenderPhase::Concat, None, "Joining scenes".to_string())
            .await;
        let concatenated = workspace.concat_output_path();
        self.encoder
            .concat(&clips, &workspace.concat_list_path(), &concatenated)
            .await
            .map_err(|e| stage_failed(RenderStage::Concat, e))?;

        let mut final_path = concatenated.clone();
        if let Some(music) = music {
            reporter
                .step(RenderPhase::MusicMix, None, "Mixing background music".to_string())
                .await;
            match self.fetch_to(&workspace, &music.asset, workspace.music_path(&music.asset)).await {
                Ok(music_path) => {
                    let mixed = workspace.mixed_output_path();
                    self.encoder
                        .mix_music(&concatenated, &music_path, music.volume, &mixed, &self.settings)
                        .await
                        .map_err(|e| stage_failed(RenderStage::MusicMix, e))?;
                    final_path = mixed;
                }
                Err(reason) => {
                    warn!("Background music omitted: {}", reason);
                    substitutions.push(Substitution {
                        scene_index: None,
                        scene_id: None,
                        kind: SubstitutionKind::MusicOmitted,
                        reason,
                    });
                }
            }
        }

        reporter
            .step(RenderPhase::Finalize, None, "Reading output".to_string())
            .await;
        let bytes = tokio::fs::read(&final_path)
            .await
            .map_err(|e| stage_failed(RenderStage::Finalize, e.into()))?;
        if bytes.is_empty() {
            return Err(stage_failed(
                RenderStage::Finalize,
                CoreError::Internal("encoder produced an empty file".to_string()),
            ));
        }

        let duration_sec = match self.encoder.probe_duration(&final_path).await {
            Ok(duration) => duration,
            Err(e) => {
                warn!("Could not probe output duration: {}", e);
                timeline.total_duration()
            }
        };

        reporter.complete().await;
        info!(
            "Render finished: {} bytes, {:.2}s, {} substitution(s)",
            bytes.len(),
            duration_sec,
            substitutions.len()
        );

        Ok(RenderOutput {
            bytes,
            content_type: OUTPUT_CONTENT_TYPE.to_string(),
            duration_sec,
            scene_count,
            substitutions,
        })
    }

    /// [`render`](Self::render) bounded by a caller-supplied timeout
    pub async fn render_with_timeout(
        &self,
        timeline: &Timeline,
        timeout: Duration,
        progress: Option<mpsc::Sender<RenderProgress>>,
    ) -> CoreResult<RenderOutput> {
        tokio::time::timeout(timeout, self.render(timeline, progress))
            .await
            .map_err(|_| {
                CoreError::Timeout(format!("Render exceeded {:.1}s", timeout.as_secs_f64()))
            })?
    }

    async fn resolve_image(
        &self,
        workspace: &RenderWorkspace,
        index: usize,
        scene: &Scene,
    ) -> Result<PathBuf, String> {
        let asset = scene.image.as_ref().ok_or("scene has no image")?;
        self.fetch_to(workspace, asset, workspace.asset_path(index, "image", asset))
            .await
    }

    async fn resolve_narration(
        &self,
        workspace: &RenderWorkspace,
        index: usize,
        scene: &Scene,
    ) -> Result<PathBuf, String> {
        let narration = scene.narration.as_ref().ok_or("scene has no narration")?;
        let asset = &narration.asset;
        self.fetch_to(workspace, asset, workspace.asset_path(index, "narration", asset))
            .await
    }

    async fn fetch_to(
        &self,
        workspace: &RenderWorkspace,
        asset: &AssetRef,
        path: PathBuf,
    ) -> Result<PathBuf, String> {
        let bytes = self.fetcher.fetch(asset).await.map_err(|e| e.to_string())?;
        workspace
            .store(&path, &bytes)
            .await
            .map_err(|e| e.to_string())?;
        Ok(path)
    }
}
