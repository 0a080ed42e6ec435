//! ReelSync Error Definitions
//!
//! Defines error types used throughout the engine.

use std::fmt;

use thiserror::Error;

use super::{SceneId, TimeSec};

/// Stage of a batch render, carried by fatal render errors
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RenderStage {
    /// Encoding the clip of the scene at this index
    SceneClip(usize),
    /// Joining all scene clips into one stream
    Concat,
    /// Mixing background music under the narration
    MusicMix,
    /// Reading back the finished output
    Finalize,
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderStage::SceneClip(index) => write!(f, "scene_clip[{}]", index),
            RenderStage::Concat => write!(f, "concat"),
            RenderStage::MusicMix => write!(f, "music_mix"),
            RenderStage::Finalize => write!(f, "finalize"),
        }
    }
}

/// Core engine error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Timeline Errors
    // =========================================================================
    #[error("Scene not found: {0}")]
    SceneNotFound(SceneId),

    #[error("Timeline has no scenes")]
    EmptyTimeline,

    #[error("Scene {scene_id} has invalid duration {duration_sec} (must be finite and > 0)")]
    InvalidSceneDuration {
        scene_id: SceneId,
        duration_sec: TimeSec,
    },

    #[error("Invalid duration: {0} seconds")]
    InvalidDuration(TimeSec),

    #[error("Scene {scene_id} is not ready for export (status: {status})")]
    SceneNotReady { scene_id: SceneId, status: String },

    // =========================================================================
    // Asset Errors
    // =========================================================================
    #[error("Asset unavailable ({reference}): {reason}")]
    AssetUnavailable { reference: String, reason: String },

    #[error("Narration for scene {0} is stale and must be regenerated")]
    NarrationStale(SceneId),

    // =========================================================================
    // Render Errors
    // =========================================================================
    #[error("Renderer unavailable: {0}")]
    RendererUnavailable(String),

    #[error("Render stage '{stage}' failed: {message}")]
    StageFailed { stage: RenderStage, message: String },

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core engine result type
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Shorthand for an asset-unavailable error
    pub fn asset_unavailable(reference: impl fmt::Display, reason: impl fmt::Display) -> Self {
        Self::AssetUnavailable {
            reference: reference.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the failure can be masked by a substitution (placeholder frame,
    /// silent track) instead of failing the job.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            CoreError::AssetUnavailable { .. } | CoreError::NarrationStale(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_failed_names_stage() {
        let err = CoreError::StageFailed {
            stage: RenderStage::SceneClip(2),
            message: "exit code 1".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("scene_clip[2]"));
        assert!(msg.contains("exit code 1"));
    }

    #[test]
    fn test_recoverable_classification() {
        assert!(CoreError::asset_unavailable("https://x/a.png", "404").is_recoverable());
        assert!(!CoreError::RendererUnavailable("ffmpeg missing".into()).is_recoverable());
        assert!(!CoreError::StageFailed {
            stage: RenderStage::Concat,
            message: String::new()
        }
        .is_recoverable());
    }
}
