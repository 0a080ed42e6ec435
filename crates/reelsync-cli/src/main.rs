//! ReelSync CLI
//!
//! Headless front end for the compositor: batch renders, caption exports,
//! timeline inspection and a simulated live-playback run driven by a manual
//! clock.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::info;

use reelsync_lib::core::{
    assets::HttpAssetFetcher,
    captions::{export_srt, export_vtt, timeline_captions},
    playback::{ManualClock, PlaybackEngine, SimulatedSink},
    render::{
        validate_for_export, BatchRenderer, ExportValidation, FFmpegEncoder, RenderProgress,
    },
    settings::{default_settings_dir, BurnInMode, EngineSettings, SettingsManager},
    timeline::Timeline,
};

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to parse timeline {path}: {source}")]
    InvalidTimeline {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Scene not found: {0}")]
    UnknownScene(String),

    #[error("Timeline has validation errors:\n  {}", .0.join("\n  "))]
    NotExportable(Vec<String>),
}

#[derive(Debug, Parser)]
#[command(name = "reelsync")]
#[command(about = "Narrated short-form video compositor")]
struct Cli {
    /// Settings directory (defaults to the user config dir)
    #[arg(long = "settings-dir", global = true)]
    settings_dir: Option<PathBuf>,

    /// Also write daily-rotated logs into this directory
    #[arg(long = "log-dir", global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render a timeline JSON file to a video
    Render {
        timeline: PathBuf,
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
        /// Burn in full scene text instead of per-segment captions
        #[arg(long = "static-captions", default_value_t = false)]
        static_captions: bool,
        /// Whole-job timeout; defaults to the export setting
        #[arg(long = "timeout-seconds")]
        timeout_seconds: Option<u64>,
    },
    /// Print caption segments for every scene
    Captions {
        timeline: PathBuf,
        #[arg(short = 'f', long = "format", value_enum, default_value_t = CaptionFormat::Json)]
        format: CaptionFormat,
    },
    /// Summarize scene timing and export readiness
    Inspect { timeline: PathBuf },
    /// Run the live playback engine against simulated audio
    Simulate {
        timeline: PathBuf,
        /// Seek to this global time before playing
        #[arg(long = "seek")]
        seek: Option<f64>,
        /// Start from this scene id instead
        #[arg(long = "scene")]
        scene: Option<String>,
        /// Simulated narration load latency in seconds
        #[arg(long = "load-latency", default_value_t = 0.0)]
        load_latency: f64,
        /// Emit one frame line every N frames
        #[arg(long = "every", default_value_t = 15)]
        every: u64,
    },
    /// Show or reset engine settings
    Settings {
        #[arg(long = "reset", default_value_t = false)]
        reset: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CaptionFormat {
    Json,
    Srt,
    Vtt,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SceneSummary {
    index: usize,
    id: String,
    start_sec: f64,
    end_sec: f64,
    status: String,
    has_image: bool,
    has_narration: bool,
    captions: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimelineSummary {
    name: String,
    total_duration_sec: f64,
    photo_reel: bool,
    narration_gain: f64,
    scenes: Vec<SceneSummary>,
    export: ExportValidation,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_cli_logging(cli.log_dir.as_deref());

    let settings_dir = match cli.settings_dir.clone().or_else(default_settings_dir) {
        Some(dir) => dir,
        None => anyhow::bail!("No settings directory available; pass --settings-dir"),
    };
    let manager = SettingsManager::new(settings_dir);

    match cli.command {
        Command::Render {
            timeline,
            output,
            static_captions,
            timeout_seconds,
        } => {
            let settings = manager.load();
            render(&timeline, &output, settings, static_captions, timeout_seconds).await
        }
        Command::Captions { timeline, format } => {
            let timeline = load_timeline(&timeline)?;
            match format {
                CaptionFormat::Json => print_json(&timeline_captions(&timeline))?,
                CaptionFormat::Srt => print!("{}", export_srt(&timeline)),
                CaptionFormat::Vtt => print!("{}", export_vtt(&timeline)),
            }
            Ok(())
        }
        Command::Inspect { timeline } => print_json(&summarize(&load_timeline(&timeline)?)),
        Command::Simulate {
            timeline,
            seek,
            scene,
            load_latency,
            every,
        } => {
            let settings = manager.load();
            simulate(
                load_timeline(&timeline)?,
                &settings,
                seek,
                scene,
                load_latency,
                every,
            )
        }
        Command::Settings { reset } => {
            let settings = if reset {
                manager.reset().map_err(anyhow::Error::msg)?
            } else {
                manager.load()
            };
            info!("Settings file: {}", manager.settings_path().display());
            print_json(&settings)
        }
    }
}

/// File logging through the library when a directory is given, plain
/// stderr logging otherwise.
fn init_cli_logging(log_dir: Option<&Path>) -> Option<reelsync_lib::LogGuard> {
    if log_dir.is_some() {
        return reelsync_lib::init_logging(log_dir);
    }
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    None
}

fn load_timeline(path: &Path) -> Result<Timeline> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let timeline: Timeline =
        serde_json::from_str(&content).map_err(|source| CliError::InvalidTimeline {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(timeline)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn summarize(timeline: &Timeline) -> TimelineSummary {
    let captions = timeline_captions(timeline);
    let scenes = timeline
        .scenes
        .iter()
        .enumerate()
        .map(|(index, scene)| SceneSummary {
            index,
            id: scene.id.clone(),
            start_sec: timeline.scene_start_time(index),
            end_sec: timeline.scene_end_time(index),
            status: scene.status.as_str().to_string(),
            has_image: scene.image.is_some(),
            has_narration: scene.has_narration(),
            captions: captions.iter().filter(|c| c.scene_index == index).count(),
        })
        .collect();

    TimelineSummary {
        name: timeline.name.clone(),
        total_duration_sec: timeline.total_duration(),
        photo_reel: timeline.photo_reel,
        narration_gain: timeline.narration_gain,
        scenes,
        export: validate_for_export(timeline),
    }
}

async fn render(
    timeline_path: &Path,
    output: &Path,
    settings: EngineSettings,
    static_captions: bool,
    timeout_seconds: Option<u64>,
) -> Result<()> {
    let timeline = load_timeline(timeline_path)?;

    let validation = validate_for_export(&timeline);
    for warning in &validation.warnings {
        tracing::warn!("{}", warning);
    }
    if !validation.is_valid {
        return Err(CliError::NotExportable(validation.errors).into());
    }

    let mut export = settings.export.clone();
    if static_captions {
        export.caption_mode = BurnInMode::Static;
    }
    let timeout =
        Duration::from_secs(timeout_seconds.unwrap_or(export.render_timeout_secs).max(1));

    let encoder = Arc::new(FFmpegEncoder::detect(&settings.encoder));
    let fetcher = Arc::new(HttpAssetFetcher::new(export.fetch_timeout_secs)?);
    let renderer = BatchRenderer::new(encoder, fetcher, export);

    let (tx, mut rx) = mpsc::channel::<RenderProgress>(16);
    let reporter = tokio::spawn(async move {
        while let Some(progress) = rx.recv().await {
            eprintln!("[{:>5.1}%] {}", progress.percent, progress.message);
        }
    });

    let result = renderer
        .render_with_timeout(&timeline, timeout, Some(tx))
        .await;
    let _ = reporter.await;
    let rendered = result.context("Render failed")?;

    tokio::fs::write(output, &rendered.bytes)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {} ({} bytes)", output.display(), rendered.bytes.len());

    print_json(&rendered)
}

fn simulate(
    timeline: Timeline,
    settings: &EngineSettings,
    seek: Option<f64>,
    scene: Option<String>,
    load_latency: f64,
    every: u64,
) -> Result<()> {
    let clock = ManualClock::new();
    let narration = SimulatedSink::new(Arc::new(clock.clone())).with_load_latency(load_latency);
    // Music carries no duration hint; loop a nominal length.
    let music = SimulatedSink::new(Arc::new(clock.clone())).with_fallback_duration(30.0);

    let mut engine = PlaybackEngine::new(
        timeline,
        narration,
        music,
        Arc::new(clock.clone()),
        &settings.playback,
    )?;

    if let Some(scene_id) = scene {
        engine
            .select_scene(&scene_id)
            .map_err(|_| CliError::UnknownScene(scene_id))?;
    }
    if let Some(time) = seek {
        engine.seek(time);
    }
    engine.ensure_playable().context("Timeline cannot play")?;
    engine.play();

    let frame_step = 1.0 / settings.playback.frame_rate.max(1) as f64;
    // Runaway guard: twice the timeline length plus the load timeout.
    let max_frames = ((engine.timeline().total_duration() * 2.0
        + settings.playback.seek_load_timeout_ms as f64 / 1000.0)
        / frame_step)
        .ceil() as u64
        + 1;
    let every = every.max(1);

    for frame_index in 0..max_frames {
        let Some(frame) = engine.tick() else {
            break;
        };
        for event in engine.drain_events() {
            println!("{}", serde_json::to_string(&event)?);
        }
        if frame_index % every == 0 || !engine.is_playing() {
            println!("{}", serde_json::to_string(&frame)?);
        }
        if !engine.is_playing() {
            break;
        }
        clock.advance(frame_step);
    }

    Ok(())
}
