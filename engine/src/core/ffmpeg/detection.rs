//! FFmpeg Detection Module
//!
//! Finds usable FFmpeg/FFprobe binaries, either from explicit settings or by
//! searching well-known install locations and `PATH`.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::{FFmpegError, FFmpegResult};
use crate::core::settings::EncoderSettings;

#[cfg(target_os = "windows")]
const FFMPEG_BINARY: &str = "ffmpeg.exe";
#[cfg(not(target_os = "windows"))]
const FFMPEG_BINARY: &str = "ffmpeg";

#[cfg(target_os = "windows")]
const FFPROBE_BINARY: &str = "ffprobe.exe";
#[cfg(not(target_os = "windows"))]
const FFPROBE_BINARY: &str = "ffprobe";

/// Information about a detected FFmpeg installation
#[derive(Debug, Clone)]
pub struct FFmpegInfo {
    /// Path to ffmpeg binary
    pub ffmpeg_path: PathBuf,
    /// Path to ffprobe binary
    pub ffprobe_path: PathBuf,
    /// FFmpeg version string
    pub version: String,
}

/// Detects FFmpeg, preferring paths configured in settings
pub fn detect_ffmpeg(overrides: &EncoderSettings) -> FFmpegResult<FFmpegInfo> {
    let ffmpeg_path = match &overrides.ffmpeg_path {
        Some(path) if path.is_file() => path.clone(),
        Some(path) => {
            return Err(FFmpegError::InvalidInput(format!(
                "Configured ffmpeg path does not exist: {}",
                path.display()
            )))
        }
        None => find_binary(FFMPEG_BINARY)?,
    };

    let ffprobe_path = match &overrides.ffprobe_path {
        Some(path) if path.is_file() => path.clone(),
        Some(path) => {
            return Err(FFmpegError::InvalidInput(format!(
                "Configured ffprobe path does not exist: {}",
                path.display()
            )))
        }
        // Prefer the ffprobe that sits next to the chosen ffmpeg.
        None => sibling_binary(&ffmpeg_path, FFPROBE_BINARY)
            .map(Ok)
            .unwrap_or_else(|| find_binary(FFPROBE_BINARY))?,
    };

    let version = get_ffmpeg_version(&ffmpeg_path)?;
    info!("Using FFmpeg {} at {}", version, ffmpeg_path.display());

    Ok(FFmpegInfo {
        ffmpeg_path,
        ffprobe_path,
        version,
    })
}

/// Detects FFmpeg from common install locations and `PATH`
pub fn detect_system_ffmpeg() -> FFmpegResult<FFmpegInfo> {
    detect_ffmpeg(&EncoderSettings::default())
}

fn sibling_binary(binary: &Path, name: &str) -> Option<PathBuf> {
    let candidate = binary.parent()?.join(name);
    candidate.is_file().then_some(candidate)
}

fn find_binary(name: &str) -> FFmpegResult<PathBuf> {
    let path_dirs = std::env::var_os("PATH")
        .map(|paths| std::env::split_paths(&paths).collect::<Vec<_>>())
        .unwrap_or_default();

    get_common_ffmpeg_paths()
        .into_iter()
        .chain(path_dirs)
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_file())
        .inspect(|found| debug!("Found {} at {}", name, found.display()))
        .ok_or(FFmpegError::NotFound)
}

/// Get common FFmpeg installation paths for the current platform
fn get_common_ffmpeg_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    #[cfg(target_os = "windows")]
    {
        paths.push(PathBuf::from(r"C:\ffmpeg\bin"));
        paths.push(PathBuf::from(r"C:\Program Files\ffmpeg\bin"));

        if let Ok(programdata) = std::env::var("ProgramData") {
            paths.push(PathBuf::from(programdata).join("chocolatey").join("bin"));
        }
        if let Ok(userprofile) = std::env::var("USERPROFILE") {
            paths.push(PathBuf::from(userprofile).join("scoop").join("shims"));
        }
    }

    #[cfg(target_os = "macos")]
    {
        paths.push(PathBuf::from("/opt/homebrew/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/opt/local/bin"));
    }

    #[cfg(target_os = "linux")]
    {
        paths.push(PathBuf::from("/usr/bin"));
        paths.push(PathBuf::from("/usr/local/bin"));
        paths.push(PathBuf::from("/snap/bin"));
    }

    paths
}

/// Runs `ffmpeg -version` and extracts the version token
fn get_ffmpeg_version(ffmpeg_path: &Path) -> FFmpegResult<String> {
    let output = std::process::Command::new(ffmpeg_path)
        .arg("-version")
        .output()
        .map_err(FFmpegError::ProcessError)?;

    if !output.status.success() {
        return Err(FFmpegError::ExecutionFailed(
            "Failed to get FFmpeg version".to_string(),
        ));
    }

    parse_version_output(&String::from_utf8_lossy(&output.stdout))
}

/// Parses the first line of `ffmpeg -version`: "ffmpeg version X.X.X ..."
fn parse_version_output(output: &str) -> FFmpegResult<String> {
    let first_line = output
        .lines()
        .next()
        .filter(|line| !line.trim().is_empty())
        .ok_or_else(|| FFmpegError::ParseError("Could not parse FFmpeg version".to_string()))?;

    Ok(first_line
        .strip_prefix("ffmpeg version ")
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or(first_line)
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_paths_not_empty() {
        #[cfg(any(target_os = "windows", target_os = "macos", target_os = "linux"))]
        assert!(!get_common_ffmpeg_paths().is_empty());
    }

    #[test]
    fn test_parse_version_output() {
        let output = "ffmpeg version 6.1.1-3ubuntu5 Copyright (c) 2000-2023\nbuilt with gcc";
        assert_eq!(parse_version_output(output).unwrap(), "6.1.1-3ubuntu5");
        assert_eq!(parse_version_output("custom build").unwrap(), "custom build");
        assert!(parse_version_output("").is_err());
    }

    #[test]
    fn test_missing_override_is_reported() {
        let overrides = EncoderSettings {
            ffmpeg_path: Some(PathBuf::from("/no/such/ffmpeg")),
            ffprobe_path: None,
        };
        assert!(matches!(
            detect_ffmpeg(&overrides),
            Err(FFmpegError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_detect_system_ffmpeg() {
        // Passes whether or not FFmpeg is installed on the machine.
        match detect_system_ffmpeg() {
            Ok(info) => assert!(!info.version.is_empty()),
            Err(FFmpegError::NotFound) => {}
            Err(e) => println!("FFmpeg present but unusable: {}", e),
        }
    }
}
