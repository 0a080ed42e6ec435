//! Settings Persistence System
//!
//! Provides persistent engine settings with:
//! - Atomic file writes (temp file + rename)
//! - Schema validation with defaults
//! - A schema version stamped on every load and save
//!
//! Storage location: {config_dir}/reelsync/settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

/// Current settings schema version
pub const SETTINGS_VERSION: u32 = 1;

/// Settings file name
pub const SETTINGS_FILE: &str = "settings.json";

/// Lock file name (advisory lock to prevent concurrent writers)
pub const SETTINGS_LOCK_FILE: &str = "settings.json.lock";

/// Application directory name under the platform config dir
pub const APP_DIR_NAME: &str = "reelsync";

/// Engine settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EngineSettings {
    /// Schema version the file was written with
    #[serde(default = "default_version")]
    pub version: u32,

    /// Live playback settings
    #[serde(default)]
    pub playback: PlaybackSettings,

    /// Batch export settings
    #[serde(default)]
    pub export: ExportSettings,

    /// Encoder binary overrides
    #[serde(default)]
    pub encoder: EncoderSettings,
}

fn default_version() -> u32 {
    SETTINGS_VERSION
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            version: SETTINGS_VERSION,
            playback: PlaybackSettings::default(),
            export: ExportSettings::default(),
            encoder: EncoderSettings::default(),
        }
    }
}

impl EngineSettings {
    /// Normalizes and clamps settings so persisted state is always valid.
    ///
    /// Bad values are corrected instead of rejected so an old or hand-edited
    /// file never prevents start-up.
    pub fn normalize(&mut self) {
        self.version = SETTINGS_VERSION;

        self.playback.seek_load_timeout_ms = self.playback.seek_load_timeout_ms.clamp(100, 60_000);
        self.playback.frame_rate = self.playback.frame_rate.clamp(1, 120);

        self.export.width = even(self.export.width.clamp(144, 4096));
        self.export.height = even(self.export.height.clamp(144, 4096));
        self.export.fps = self.export.fps.clamp(1, 60);
        self.export.video_codec = normalize_enum(
            &self.export.video_codec,
            &["h264", "h265"],
            default_video_codec(),
        );
        self.export.crf = self.export.crf.min(51);
        self.export.audio_bitrate_kbps = self.export.audio_bitrate_kbps.clamp(64, 320);
        self.export.caption_chars_per_line = self.export.caption_chars_per_line.clamp(10, 80);
        if !is_hex_color(&self.export.placeholder_color) {
            self.export.placeholder_color = default_placeholder_color();
        }
        self.export.fetch_timeout_secs = self.export.fetch_timeout_secs.clamp(1, 600);
        self.export.render_timeout_secs = self.export.render_timeout_secs.clamp(10, 7_200);
    }
}

fn even(value: u32) -> u32 {
    value - value % 2
}

fn normalize_enum(value: &str, allowed: &[&str], fallback: String) -> String {
    if allowed.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        value.to_ascii_lowercase()
    } else {
        fallback
    }
}

fn is_hex_color(value: &str) -> bool {
    let bytes = value.as_bytes();
    if bytes.len() != 7 || bytes[0] != b'#' {
        return false;
    }
    bytes[1..].iter().all(|b| b.is_ascii_hexdigit())
}

/// Live playback settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackSettings {
    /// How long a deferred seek waits for narration before starting at 0
    #[serde(default = "default_seek_load_timeout_ms")]
    pub seek_load_timeout_ms: u64,

    /// Tick rate of headless simulation
    #[serde(default = "default_frame_rate")]
    pub frame_rate: u32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            seek_load_timeout_ms: default_seek_load_timeout_ms(),
            frame_rate: default_frame_rate(),
        }
    }
}

fn default_seek_load_timeout_ms() -> u64 {
    3_000
}

fn default_frame_rate() -> u32 {
    30
}

/// How captions are burned into exported clips
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BurnInMode {
    /// One overlay per caption segment, shown only during its window
    #[default]
    Segmented,
    /// Full scene text for the whole clip
    Static,
}

/// Batch export settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExportSettings {
    /// Output width in pixels (vertical 9:16 by default)
    #[serde(default = "default_width")]
    pub width: u32,

    /// Output height in pixels
    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Video codec: "h264", "h265"
    #[serde(default = "default_video_codec")]
    pub video_codec: String,

    /// Constant rate factor (0 - 51)
    #[serde(default = "default_crf")]
    pub crf: u8,

    #[serde(default = "default_audio_bitrate_kbps")]
    pub audio_bitrate_kbps: u32,

    #[serde(default)]
    pub caption_mode: BurnInMode,

    /// Word-wrap width of burned-in captions
    #[serde(default = "default_caption_chars_per_line")]
    pub caption_chars_per_line: usize,

    /// Fill colour used when a scene image cannot be fetched
    #[serde(default = "default_placeholder_color")]
    pub placeholder_color: String,

    /// Per-asset download timeout
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Whole-job timeout used by callers of `render_with_timeout`
    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            fps: default_fps(),
            video_codec: default_video_codec(),
            crf: default_crf(),
            audio_bitrate_kbps: default_audio_bitrate_kbps(),
            caption_mode: BurnInMode::default(),
            caption_chars_per_line: default_caption_chars_per_line(),
            placeholder_color: default_placeholder_color(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            render_timeout_secs: default_render_timeout_secs(),
        }
    }
}

impl ExportSettings {
    /// FFmpeg encoder name for the configured codec
    pub fn video_encoder(&self) -> &'static str {
        match self.video_codec.as_str() {
            "h265" => "libx265",
            _ => "libx264",
        }
    }
}

fn default_width() -> u32 {
    1080
}

fn default_height() -> u32 {
    1920
}

fn default_fps() -> u32 {
    30
}

fn default_video_codec() -> String {
    "h264".to_string()
}

fn default_crf() -> u8 {
    23
}

fn default_audio_bitrate_kbps() -> u32 {
    192
}

fn default_caption_chars_per_line() -> usize {
    28
}

fn default_placeholder_color() -> String {
    "#1A1A1A".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_render_timeout_secs() -> u64 {
    900
}

/// Explicit encoder binaries; unset means search PATH
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct EncoderSettings {
    #[serde(default)]
    pub ffmpeg_path: Option<PathBuf>,

    #[serde(default)]
    pub ffprobe_path: Option<PathBuf>,
}

/// Default settings directory for the current user
pub fn default_settings_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR_NAME))
}

/// Settings manager for loading, saving, and resetting settings
pub struct SettingsManager {
    settings_path: PathBuf,
}

impl SettingsManager {
    /// Create a new settings manager rooted at `settings_dir`
    pub fn new(settings_dir: PathBuf) -> Self {
        Self {
            settings_path: settings_dir.join(SETTINGS_FILE),
        }
    }

    fn lock_path(&self) -> PathBuf {
        self.settings_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(SETTINGS_LOCK_FILE)
    }

    fn with_lock<T>(
        &self,
        exclusive: bool,
        op: impl FnOnce() -> Result<T, String>,
    ) -> Result<T, String> {
        if let Some(parent) = self.settings_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create settings directory: {}", e))?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(self.lock_path())
            .map_err(|e| format!("Failed to open settings lock file: {}", e))?;

        if exclusive {
            fs2::FileExt::lock_exclusive(&lock_file)
                .map_err(|e| format!("Failed to lock settings file (exclusive): {}", e))?;
        } else {
            fs2::FileExt::lock_shared(&lock_file)
                .map_err(|e| format!("Failed to lock settings file (shared): {}", e))?;
        }

        let result = op();

        if let Err(e) = fs2::FileExt::unlock(&lock_file) {
            warn!("Failed to unlock settings lock file: {}", e);
        }

        result
    }

    /// Get the settings file path
    pub fn settings_path(&self) -> &PathBuf {
        &self.settings_path
    }

    /// Load settings from disk, returning defaults if the file is missing or
    /// unreadable
    pub fn load(&self) -> EngineSettings {
        let result = self.with_lock(false, || {
            if !self.settings_path.exists() {
                info!("Settings file not found, using defaults");
                return Ok(EngineSettings::default());
            }

            let content = fs::read_to_string(&self.settings_path)
                .map_err(|e| format!("Failed to read settings file: {}", e))?;

            let mut settings = serde_json::from_str::<EngineSettings>(&content)
                .map_err(|e| format!("Failed to parse settings file: {}", e))?;

            settings.normalize();
            Ok(settings)
        });

        match result {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Failed to load settings, using defaults: {}", e);
                EngineSettings::default()
            }
        }
    }

    /// Save settings to disk using atomic write (temp file + rename)
    pub fn save(&self, settings: &EngineSettings) -> Result<EngineSettings, String> {
        self.with_lock(true, || {
            let mut normalized = settings.clone();
            normalized.normalize();

            let content = serde_json::to_string_pretty(&normalized)
                .map_err(|e| format!("Failed to serialize settings: {}", e))?;

            let temp_path = self.settings_path.with_extension("json.tmp");
            if temp_path.exists() {
                let _ = fs::remove_file(&temp_path);
            }

            let mut file = fs::File::create(&temp_path)
                .map_err(|e| format!("Failed to create temp settings file: {}", e))?;
            file.write_all(content.as_bytes())
                .map_err(|e| format!("Failed to write settings: {}", e))?;
            file.sync_all()
                .map_err(|e| format!("Failed to sync settings file: {}", e))?;

            if cfg!(windows) && self.settings_path.exists() {
                // rename does not overwrite on Windows
                fs::remove_file(&self.settings_path)
                    .map_err(|e| format!("Failed to replace settings file: {}", e))?;
            }
            fs::rename(&temp_path, &self.settings_path)
                .map_err(|e| format!("Failed to finalize settings file: {}", e))?;

            info!("Settings saved to {:?}", self.settings_path);
            Ok(normalized)
        })
    }

    /// Reset settings to defaults and delete the settings file
    pub fn reset(&self) -> Result<EngineSettings, String> {
        self.with_lock(true, || {
            if self.settings_path.exists() {
                fs::remove_file(&self.settings_path)
                    .map_err(|e| format!("Failed to delete settings file: {}", e))?;
                info!("Settings file deleted");
            }
            Ok(EngineSettings::default())
        })
    }
}
