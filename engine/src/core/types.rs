//! ReelSync Core Type Definitions
//!
//! Defines fundamental types shared by the timeline, playback and render modules.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

// =============================================================================
// ID Types
// =============================================================================

/// Scene unique identifier (ULID)
pub type SceneId = String;

/// Timeline unique identifier (ULID)
pub type TimelineId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Time in seconds (floating point)
pub type TimeSec = f64;

/// Tolerance used when comparing accumulated time values
pub const TIME_EPSILON: TimeSec = 1e-9;

// =============================================================================
// Asset References
// =============================================================================

/// Reference to an immutable asset produced outside the core
/// (synthesized narration, generated image, uploaded music).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum AssetRef {
    /// Remote asset fetched over http/https
    Url { url: String },
    /// Local file on disk
    File { path: PathBuf },
    /// In-memory byte buffer
    Inline {
        data: Vec<u8>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mime: Option<String>,
    },
}

impl AssetRef {
    pub fn url(url: impl Into<String>) -> Self {
        Self::Url { url: url.into() }
    }

    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self::File { path: path.into() }
    }

    pub fn inline(data: Vec<u8>, mime: Option<&str>) -> Self {
        Self::Inline {
            data,
            mime: mime.map(str::to_string),
        }
    }

    /// Best-effort file extension, used to name fetched files so ffmpeg can
    /// pick the right demuxer.
    pub fn extension_hint(&self) -> Option<String> {
        match self {
            AssetRef::Url { url } => {
                let path = url.split(['?', '#']).next().unwrap_or(url);
                extension_of(Path::new(path))
            }
            AssetRef::File { path } => extension_of(path),
            AssetRef::Inline { mime, .. } => mime.as_deref().and_then(extension_for_mime),
        }
    }
}

impl fmt::Display for AssetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetRef::Url { url } => write!(f, "{}", url),
            AssetRef::File { path } => write!(f, "{}", path.display()),
            AssetRef::Inline { data, .. } => write!(f, "<inline {} bytes>", data.len()),
        }
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.len() <= 5)
        .map(|e| e.to_ascii_lowercase())
}

fn extension_for_mime(mime: &str) -> Option<String> {
    let ext = match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "audio/mpeg" => "mp3",
        "audio/wav" | "audio/x-wav" => "wav",
        "audio/ogg" => "ogg",
        "audio/aac" => "aac",
        _ => return None,
    };
    Some(ext.to_string())
}

// =============================================================================
// Color
// =============================================================================

/// Color (RGBA)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Color {
    /// Red (0.0 ~ 1.0)
    pub r: f32,
    /// Green (0.0 ~ 1.0)
    pub g: f32,
    /// Blue (0.0 ~ 1.0)
    pub b: f32,
    /// Alpha (0.0 ~ 1.0, optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub a: Option<f32>,
}

impl Color {
    pub fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: r.clamp(0.0, 1.0),
            g: g.clamp(0.0, 1.0),
            b: b.clamp(0.0, 1.0),
            a: None,
        }
    }

    pub fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self {
            a: Some(a.clamp(0.0, 1.0)),
            ..Self::rgb(r, g, b)
        }
    }

    pub fn white() -> Self {
        Self::rgb(1.0, 1.0, 1.0)
    }

    pub fn black() -> Self {
        Self::rgb(0.0, 0.0, 0.0)
    }

    /// Parses a hex color string (`#RRGGBB` or `#RRGGBBAA`).
    pub fn try_from_hex(hex: &str) -> Result<Self, String> {
        let hex = hex.trim().trim_start_matches('#');
        if hex.len() != 6 && hex.len() != 8 {
            return Err(format!("Invalid hex color length: {}", hex.len()));
        }

        let channel = |s: &str| -> Result<f32, String> {
            u8::from_str_radix(s, 16)
                .map(|v| v as f32 / 255.0)
                .map_err(|e| e.to_string())
        };

        let r = channel(&hex[0..2])?;
        let g = channel(&hex[2..4])?;
        let b = channel(&hex[4..6])?;
        if hex.len() == 8 {
            Ok(Self::rgba(r, g, b, channel(&hex[6..8])?))
        } else {
            Ok(Self::rgb(r, g, b))
        }
    }

    /// Parses a hex color string, falling back to black on invalid input.
    pub fn from_hex(hex: &str) -> Self {
        match Self::try_from_hex(hex) {
            Ok(c) => c,
            Err(e) => {
                warn!(
                    "Failed to parse hex color '{}': {}, defaulting to black",
                    hex, e
                );
                Self::black()
            }
        }
    }

    /// Formats the color the way ffmpeg color options expect (`0xRRGGBB[@alpha]`).
    pub fn to_ffmpeg(&self) -> String {
        let to_u8 = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        let base = format!("0x{:02X}{:02X}{:02X}", to_u8(self.r), to_u8(self.g), to_u8(self.b));
        match self.a {
            Some(a) if a < 1.0 => format!("{}@{:.2}", base, a),
            _ => base,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::white()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_hint_from_url_strips_query() {
        let asset = AssetRef::url("https://cdn.example.com/scene/01.PNG?sig=abc");
        assert_eq!(asset.extension_hint().as_deref(), Some("png"));
    }

    #[test]
    fn test_extension_hint_from_inline_mime() {
        let asset = AssetRef::inline(vec![1, 2, 3], Some("audio/mpeg"));
        assert_eq!(asset.extension_hint().as_deref(), Some("mp3"));
        assert_eq!(asset.to_string(), "<inline 3 bytes>");
    }

    #[test]
    fn test_asset_ref_serialization_is_tagged() {
        let asset = AssetRef::file("/tmp/a.wav");
        let json = serde_json::to_string(&asset).unwrap();
        assert!(json.contains("\"kind\":\"file\""));
        let parsed: AssetRef = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, asset);
    }

    #[test]
    fn test_color_to_ffmpeg() {
        assert_eq!(Color::from_hex("#1A1A2E").to_ffmpeg(), "0x1A1A2E");
        assert_eq!(Color::rgba(0.0, 0.0, 0.0, 0.5).to_ffmpeg(), "0x000000@0.50");
    }

    #[test]
    fn test_color_invalid_hex_falls_back_to_black() {
        assert_eq!(Color::from_hex("nope"), Color::black());
    }
}
