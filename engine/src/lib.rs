//! ReelSync Core Library
//!
//! Timeline compositor for narrated short-form video. One immutable timeline
//! model feeds two independent renderers:
//!
//! - `core::playback`: frame-driven live preview that keeps captions and
//!   motion synchronized with narration audio
//! - `core::render`: one-shot batch export to a single video file
//!
//! Hosts embed the library directly; `reelsync-cli` drives it headless.

pub mod core;

use std::path::Path;

/// Flushes file logs when dropped
pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;

/// Log file name prefix inside the log directory
pub const LOG_FILE_NAME: &str = "reelsync.log";

/// Installs the global tracing subscriber.
///
/// Logs go to stderr and, when `log_dir` is given, to a daily rolling file.
/// `RUST_LOG` replaces the INFO default when set. Keep the returned guard
/// alive for as long as file logs should be flushed.
pub fn init_logging(log_dir: Option<&Path>) -> Option<LogGuard> {
    use tracing_subscriber::prelude::*;

    let env_filter = env_filter(
        std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV)
            .ok()
            .as_deref(),
    );

    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_ansi(cfg!(debug_assertions));

    let (file_layer, guard) = match log_dir {
        Some(dir) if std::fs::create_dir_all(dir).is_ok() => {
            let file_appender = tracing_appender::rolling::daily(dir, LOG_FILE_NAME);
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        _ => (None, None),
    };

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer);

    // Avoid panics if already initialized (tests, embedding hosts).
    let _ = tracing::subscriber::set_global_default(subscriber);

    guard
}

/// Filter from `RUST_LOG`-style directives, INFO when unset or unparsable
fn env_filter(directives: Option<&str>) -> tracing_subscriber::EnvFilter {
    directives
        .filter(|d| !d.trim().is_empty())
        .and_then(|d| tracing_subscriber::EnvFilter::try_new(d).ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new("info"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        let dir = tempfile::TempDir::new().unwrap();
        let _first = init_logging(Some(dir.path()));
        let _second = init_logging(None);
        assert!(dir.path().exists());
    }

    #[test]
    fn test_env_filter_replaces_info_default() {
        use tracing::level_filters::LevelFilter;

        assert_eq!(env_filter(None).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(env_filter(Some("  ")).max_level_hint(), Some(LevelFilter::INFO));
        assert_eq!(
            env_filter(Some("warn")).max_level_hint(),
            Some(LevelFilter::WARN)
        );
        assert_eq!(
            env_filter(Some("debug")).max_level_hint(),
            Some(LevelFilter::DEBUG)
        );
    }
}
