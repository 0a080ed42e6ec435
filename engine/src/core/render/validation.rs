//! Export Validation
//!
//! Pre-flight report for a batch render. Errors block the export; warnings
//! describe substitutions the renderer will make.

use serde::Serialize;

use crate::core::timeline::{Scene, Timeline};

/// Validation result for an export
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportValidation {
    /// Whether the export can proceed
    pub is_valid: bool,
    /// List of validation errors
    pub errors: Vec<String>,
    /// List of warnings (non-blocking)
    pub warnings: Vec<String>,
}

impl ExportValidation {
    /// Create a valid result
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Create an invalid result with errors
    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors,
            warnings: Vec::new(),
        }
    }

    /// Add an error
    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    /// Add a warning
    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }
}

/// Whether a scene skips narration in batch export: photo-reel mode,
/// narration muted globally, or nothing to narrate.
pub fn narration_exempt(timeline: &Timeline, scene: &Scene) -> bool {
    timeline.photo_reel || timeline.narration_gain <= 0.0 || scene.text.trim().is_empty()
}

/// Checks a timeline before starting an export
pub fn validate_for_export(timeline: &Timeline) -> ExportValidation {
    if let Err(e) = timeline.validate() {
        return ExportValidation::invalid(vec![e.to_string()]);
    }

    let mut validation = ExportValidation::valid();

    for (index, scene) in timeline.scenes.iter().enumerate() {
        if !scene.status.is_ready() {
            validation.add_error(format!(
                "Scene {} ({}) is not ready: {}",
                index + 1,
                scene.id,
                scene.status.as_str()
            ));
        }

        if scene.image.is_none() {
            validation.add_warning(format!(
                "Scene {} has no image. A placeholder frame will be used.",
                index + 1
            ));
        }

        if narration_exempt(timeline, scene) {
            continue;
        }

        match &scene.narration {
            None => validation.add_warning(format!(
                "Scene {} has no narration. Silence will be used.",
                index + 1
            )),
            Some(narration) => {
                if let Some(audio) = narration.duration_sec {
                    if audio > scene.duration_sec {
                        validation.add_warning(format!(
                            "Scene {} narration ({:.2}s) is longer than the scene ({:.2}s) and will be cut.",
                            index + 1,
                            audio,
                            scene.duration_sec
                        ));
                    }
                }
            }
        }
    }

    if let Some(music) = &timeline.background_music {
        if music.volume <= 0.0 {
            validation.add_warning("Background music volume is 0. Music will be skipped.");
        }
    }

    validation
}
