//! ReelSync Core Engine
//!
//! Timeline model, caption segmentation, live playback synchronization and
//! batch rendering.

pub mod assets;
pub mod captions;
pub mod ffmpeg;
pub mod playback;
pub mod render;
pub mod settings;
pub mod timeline;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
