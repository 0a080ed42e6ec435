//! Timeline Model Definitions
//!
//! Defines Timeline, Scene and related types for a sequential narrated video.
//! Scenes never overlap: each one starts exactly where the previous one ends,
//! and a single background-music track spans the whole timeline.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::core::{AssetRef, Color, CoreError, CoreResult, SceneId, TimeSec, TimelineId};

/// Upper bound of the narration gain multiplier (boost allowance)
pub const MAX_NARRATION_GAIN: f64 = 3.0;

// =============================================================================
// Scene Status
// =============================================================================

/// Lifecycle of a scene's generated assets.
///
/// Owned by the asset-generation pipeline; the compositor only reads it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SceneStatus {
    #[default]
    Pending,
    GeneratingAudio,
    GeneratingImage,
    Ready,
    Error,
}

impl SceneStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, SceneStatus::Ready)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SceneStatus::Pending => "pending",
            SceneStatus::GeneratingAudio => "generating_audio",
            SceneStatus::GeneratingImage => "generating_image",
            SceneStatus::Ready => "ready",
            SceneStatus::Error => "error",
        }
    }
}

// =============================================================================
// Motion
// =============================================================================

/// Linear motion applied to the scene image over the scene duration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionType {
    #[default]
    None,
    ZoomIn,
    PanLeft,
    PanRight,
    PanUp,
    PanDown,
}

// =============================================================================
// Caption Style
// =============================================================================

/// Named caption look. Only affects rendering, never timing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaptionStyle {
    #[default]
    Classic,
    Bold,
    Outline,
    Minimal,
}

impl CaptionStyle {
    /// Whether caption text is rendered in upper case
    pub fn uppercase(&self) -> bool {
        matches!(self, CaptionStyle::Bold | CaptionStyle::Outline)
    }

    /// Font size for a frame of the given height
    pub fn font_size(&self, frame_height: u32) -> u32 {
        let ratio = match self {
            CaptionStyle::Classic => 0.035,
            CaptionStyle::Bold => 0.045,
            CaptionStyle::Outline => 0.042,
            CaptionStyle::Minimal => 0.03,
        };
        ((frame_height as f64 * ratio).round() as u32).max(12)
    }

    pub fn font_color(&self) -> Color {
        match self {
            CaptionStyle::Bold => Color::from_hex("#FFE14D"),
            _ => Color::white(),
        }
    }

    /// Background box behind the text, if the style uses one
    pub fn box_color(&self) -> Option<Color> {
        match self {
            CaptionStyle::Classic => Some(Color::rgba(0.0, 0.0, 0.0, 0.5)),
            CaptionStyle::Bold => Some(Color::rgba(0.0, 0.0, 0.0, 0.65)),
            CaptionStyle::Outline | CaptionStyle::Minimal => None,
        }
    }

    /// Text outline width in pixels
    pub fn border_width(&self) -> u32 {
        match self {
            CaptionStyle::Outline => 4,
            CaptionStyle::Bold => 2,
            _ => 0,
        }
    }
}

// =============================================================================
// Audio Assets
// =============================================================================

/// Synthesized narration for one scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NarrationAsset {
    pub asset: AssetRef,
    /// Length reported by the synthesizer, if known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_sec: Option<TimeSec>,
}

impl NarrationAsset {
    pub fn new(asset: AssetRef, duration_sec: Option<TimeSec>) -> Self {
        Self {
            asset,
            duration_sec,
        }
    }
}

/// Global background music, looped under the whole timeline
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundMusic {
    pub asset: AssetRef,
    /// Volume (0.0 ~ 1.0)
    #[serde(default = "default_music_volume")]
    pub volume: f64,
}

impl BackgroundMusic {
    pub fn new(asset: AssetRef, volume: f64) -> Self {
        Self {
            asset,
            volume: clamp_unit(volume, default_music_volume()),
        }
    }
}

fn default_music_volume() -> f64 {
    0.3
}

fn default_narration_gain() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

fn clamp_unit(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        fallback
    }
}

// =============================================================================
// Scene
// =============================================================================

/// One narrated unit of video
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    /// Narration / caption source text (may be empty)
    #[serde(default)]
    pub text: String,
    /// Nominal display length, authoritative even if audio is shorter
    pub duration_sec: TimeSec,
    #[serde(default)]
    pub narration: Option<NarrationAsset>,
    #[serde(default)]
    pub image: Option<AssetRef>,
    #[serde(default)]
    pub motion: MotionType,
    #[serde(default = "default_true")]
    pub captions_enabled: bool,
    /// Title-overlay compositing instead of captions
    #[serde(default)]
    pub is_thumbnail: bool,
    #[serde(default)]
    pub status: SceneStatus,
}

impl Scene {
    /// Creates a new pending scene with a fresh id
    pub fn new(text: &str, duration_sec: TimeSec) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            text: text.to_string(),
            duration_sec,
            narration: None,
            image: None,
            motion: MotionType::None,
            captions_enabled: true,
            is_thumbnail: false,
            status: SceneStatus::Pending,
        }
    }

    pub fn with_narration(mut self, asset: AssetRef, duration_sec: Option<TimeSec>) -> Self {
        self.narration = Some(NarrationAsset::new(asset, duration_sec));
        self
    }

    pub fn with_image(mut self, asset: AssetRef) -> Self {
        self.image = Some(asset);
        self
    }

    pub fn with_motion(mut self, motion: MotionType) -> Self {
        self.motion = motion;
        self
    }

    pub fn with_status(mut self, status: SceneStatus) -> Self {
        self.status = status;
        self
    }

    pub fn as_thumbnail(mut self) -> Self {
        self.is_thumbnail = true;
        self
    }

    pub fn without_captions(mut self) -> Self {
        self.captions_enabled = false;
        self
    }

    pub fn has_narration(&self) -> bool {
        self.narration.is_some()
    }

    /// Whether a caption overlay is produced for this scene
    pub fn shows_captions(&self) -> bool {
        self.captions_enabled && !self.is_thumbnail
    }

    pub fn validate_duration(&self) -> CoreResult<()> {
        if self.duration_sec.is_finite() && self.duration_sec > 0.0 {
            Ok(())
        } else {
            Err(CoreError::InvalidSceneDuration {
                scene_id: self.id.clone(),
                duration_sec: self.duration_sec,
            })
        }
    }
}

// =============================================================================
// Timeline
// =============================================================================

/// Position inside the timeline resolved to a scene
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneLocation {
    /// Scene index
    pub index: usize,
    /// Offset from the scene start in seconds
    pub offset: TimeSec,
}

/// Ordered scenes plus global audio/caption settings for one project
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Timeline {
    pub id: TimelineId,
    #[serde(default)]
    pub name: String,
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub caption_style: CaptionStyle,
    #[serde(default)]
    pub background_music: Option<BackgroundMusic>,
    /// Narration multiplier (0.0 ~ 3.0)
    #[serde(default = "default_narration_gain")]
    pub narration_gain: f64,
    /// Photo-reel mode: scenes do not require narration
    #[serde(default)]
    pub photo_reel: bool,
}

impl Timeline {
    pub fn new(name: &str) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            name: name.to_string(),
            scenes: vec![],
            caption_style: CaptionStyle::default(),
            background_music: None,
            narration_gain: default_narration_gain(),
            photo_reel: false,
        }
    }

    pub fn with_scenes(name: &str, scenes: Vec<Scene>) -> Self {
        Self {
            scenes,
            ..Self::new(name)
        }
    }

    pub fn add_scene(&mut self, scene: Scene) {
        self.scenes.push(scene);
    }

    pub fn remove_scene(&mut self, scene_id: &str) -> Option<Scene> {
        let pos = self.scene_index(scene_id)?;
        Some(self.scenes.remove(pos))
    }

    pub fn get_scene(&self, scene_id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == scene_id)
    }

    pub fn scene_index(&self, scene_id: &str) -> Option<usize> {
        self.scenes.iter().position(|s| s.id == scene_id)
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    /// Sum of all scene durations
    pub fn total_duration(&self) -> TimeSec {
        self.scenes.iter().map(|s| s.duration_sec).sum()
    }

    /// Global start time of the scene at `index`.
    ///
    /// An index past the end yields the total duration.
    pub fn scene_start_time(&self, index: usize) -> TimeSec {
        self.scenes
            .iter()
            .take(index)
            .map(|s| s.duration_sec)
            .sum()
    }

    /// Global end time of the scene at `index`
    pub fn scene_end_time(&self, index: usize) -> TimeSec {
        self.scene_start_time(index + 1)
    }

    /// Maps a global time onto a scene and an offset inside it.
    ///
    /// Intervals are half-open, so a time on a boundary belongs to the later
    /// scene. Times at or past the end clamp to the final instant of the last
    /// scene; negative times clamp to the start.
    pub fn locate(&self, global_time: TimeSec) -> Option<SceneLocation> {
        let last = self.scenes.len().checked_sub(1)?;
        let time = if global_time.is_finite() {
            global_time.max(0.0)
        } else if global_time == f64::INFINITY {
            self.total_duration()
        } else {
            0.0
        };

        let mut start = 0.0;
        for (index, scene) in self.scenes.iter().enumerate() {
            let end = start + scene.duration_sec;
            if time < end {
                return Some(SceneLocation {
                    index,
                    offset: (time - start).max(0.0),
                });
            }
            start = end;
        }

        Some(SceneLocation {
            index: last,
            offset: self.scenes[last].duration_sec,
        })
    }

    /// Sets the narration multiplier, clamped to `[0, MAX_NARRATION_GAIN]`
    pub fn set_narration_gain(&mut self, gain: f64) {
        self.narration_gain = if gain.is_finite() {
            gain.clamp(0.0, MAX_NARRATION_GAIN)
        } else {
            default_narration_gain()
        };
    }

    /// Sets the background-music volume, clamped to `[0, 1]`
    pub fn set_music_volume(&mut self, volume: f64) {
        if let Some(music) = self.background_music.as_mut() {
            music.volume = clamp_unit(volume, default_music_volume());
        }
    }

    /// Checks the timing invariants every renderer relies on.
    pub fn validate(&self) -> CoreResult<()> {
        if self.scenes.is_empty() {
            return Err(CoreError::EmptyTimeline);
        }

        let mut seen = HashSet::new();
        for scene in &self.scenes {
            scene.validate_duration()?;
            if !seen.insert(scene.id.as_str()) {
                return Err(CoreError::ValidationError(format!(
                    "Duplicate scene id: {}",
                    scene.id
                )));
            }
        }

        if !self.narration_gain.is_finite()
            || !(0.0..=MAX_NARRATION_GAIN).contains(&self.narration_gain)
        {
            return Err(CoreError::ValidationError(format!(
                "Narration gain {} outside [0, {}]",
                self.narration_gain, MAX_NARRATION_GAIN
            )));
        }

        if let Some(music) = &self.background_music {
            if !music.volume.is_finite() || !(0.0..=1.0).contains(&music.volume) {
                return Err(CoreError::ValidationError(format!(
                    "Music volume {} outside [0, 1]",
                    music.volume
                )));
            }
        }

        Ok(())
    }
}
