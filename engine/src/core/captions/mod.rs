//! Caption System Module
//!
//! Progressive caption timing shared by live preview and batch export:
//! - Clause segmentation with length-proportional timing
//! - Active-segment selection for a scene-local time
//! - SRT and VTT export of a whole timeline
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Caption System                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  segmenter.rs  - (text, duration) -> timed segments             │
//! │  formats.rs    - Global caption list, SRT/VTT export            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use crate::core::captions::{segment, active_segment, export_srt};
//!
//! let segments = segment("Wait, what? Yes!", 4.0);
//! let shown = active_segment(&segments, 1.2);
//!
//! let srt = export_srt(&timeline);
//! ```

mod formats;
mod segmenter;

pub use formats::*;
pub use segmenter::*;
