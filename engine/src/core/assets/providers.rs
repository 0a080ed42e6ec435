//! Synthesis Providers
//!
//! Abstractions over narration (text-to-speech) and image generation
//! services. The compositor never calls a vendor directly; hosts plug in an
//! implementation and the helpers below write results back onto scenes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::{
    timeline::{NarrationAsset, Scene, SceneStatus},
    AssetRef, CoreError, CoreResult, TimeSec,
};

/// Audio returned by a narration synthesizer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizedNarration {
    /// Encoded audio
    #[serde(skip_serializing)]
    pub audio: Vec<u8>,
    /// MIME type of `audio`
    pub mime_type: String,
    /// Audio duration in seconds
    pub duration_sec: TimeSec,
}

/// Text-to-speech service
#[async_trait]
pub trait NarrationSynthesizer: Send + Sync {
    /// Returns the provider name
    fn name(&self) -> &str;

    async fn synthesize(&self, text: &str, voice_id: Option<&str>)
        -> CoreResult<SynthesizedNarration>;
}

/// Parameters for image generation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRequest {
    pub prompt: String,
    pub width: u32,
    pub height: u32,
    /// Provider-specific style preset
    #[serde(default)]
    pub style: Option<String>,
}

impl ImageRequest {
    /// Vertical 9:16 request for `prompt`
    pub fn portrait(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: 1080,
            height: 1920,
            style: None,
        }
    }
}

/// Image returned by an image synthesizer
#[derive(Clone, Debug, PartialEq)]
pub enum GeneratedImage {
    Bytes { data: Vec<u8>, mime_type: String },
    Url(String),
}

impl GeneratedImage {
    pub fn into_asset_ref(self) -> AssetRef {
        match self {
            GeneratedImage::Bytes { data, mime_type } => AssetRef::inline(data, Some(&mime_type)),
            GeneratedImage::Url(url) => AssetRef::url(url),
        }
    }
}

/// Image generation service
#[async_trait]
pub trait ImageSynthesizer: Send + Sync {
    /// Returns the provider name
    fn name(&self) -> &str;

    async fn generate(&self, request: &ImageRequest) -> CoreResult<GeneratedImage>;
}

/// Re-synthesizes a scene's narration, typically after live playback flagged
/// it as stale.
///
/// On failure the scene is marked [`SceneStatus::Error`] and its previous
/// narration is left untouched.
pub async fn regenerate_narration(
    scene: &mut Scene,
    synthesizer: &dyn NarrationSynthesizer,
    voice_id: Option<&str>,
) -> CoreResult<()> {
    let text = scene.text.trim();
    if text.is_empty() {
        return Err(CoreError::ValidationError(format!(
            "Scene {} has no text to narrate",
            scene.id
        )));
    }

    let previous = scene.status;
    scene.status = SceneStatus::GeneratingAudio;

    match synthesizer.synthesize(text, voice_id).await {
        Ok(result) if result.duration_sec.is_finite() && result.duration_sec > 0.0 => {
            info!(
                "Regenerated narration for scene {} via {} ({:.2}s)",
                scene.id,
                synthesizer.name(),
                result.duration_sec
            );
            scene.narration = Some(NarrationAsset::new(
                AssetRef::inline(result.audio, Some(&result.mime_type)),
                Some(result.duration_sec),
            ));
            scene.status = settled_status(previous);
            Ok(())
        }
        Ok(result) => {
            scene.status = SceneStatus::Error;
            Err(CoreError::InvalidDuration(result.duration_sec))
        }
        Err(e) => {
            warn!("Narration synthesis failed for scene {}: {}", scene.id, e);
            scene.status = SceneStatus::Error;
            Err(e)
        }
    }
}

/// Generates a new image for a scene from `request`
pub async fn regenerate_image(
    scene: &mut Scene,
    synthesizer: &dyn ImageSynthesizer,
    request: &ImageRequest,
) -> CoreResult<()> {
    let previous = scene.status;
    scene.status = SceneStatus::GeneratingImage;

    match synthesizer.generate(request).await {
        Ok(image) => {
            info!(
                "Regenerated image for scene {} via {}",
                scene.id,
                synthesizer.name()
            );
            scene.image = Some(image.into_asset_ref());
            scene.status = settled_status(previous);
            Ok(())
        }
        Err(e) => {
            warn!("Image synthesis failed for scene {}: {}", scene.id, e);
            scene.status = SceneStatus::Error;
            Err(e)
        }
    }
}

fn settled_status(previous: SceneStatus) -> SceneStatus {
    match previous {
        SceneStatus::Pending => SceneStatus::Pending,
        _ => SceneStatus::Ready,
    }
}
