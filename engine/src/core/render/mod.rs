//! Render Pipeline Module
//!
//! Batch composition of a timeline into a single video file.
//!
//! ```text
//! ┌──────────────┐   ┌────────────┐   ┌──────────────────────┐
//! │ BatchRenderer│──►│  ClipPlan  │──►│ CompositionEncoder   │──► ffmpeg
//! │ (compositor) │   │  (plan)    │   │ (FFmpegEncoder/fake) │
//! └──────┬───────┘   └────────────┘   └──────────────────────┘
//!        │ fetch                 scratch files
//!        ▼                            ▼
//!  AssetFetcher               RenderWorkspace (temp dir)
//! ```
//!
//! # Modules
//!
//! - `compositor`: the sequential render job and its fallbacks
//! - `encoder`: encoder trait and the FFmpeg implementation
//! - `plan`: FFmpeg argument and filter-graph construction
//! - `validation`: pre-flight export report
//! - `workspace`: per-job temporary directory

mod compositor;
mod encoder;
mod plan;
mod validation;
mod workspace;

pub use compositor::*;
pub use encoder::*;
pub use plan::*;
pub use validation::*;
pub use workspace::*;
