//! Timeline Module
//!
//! Canonical in-memory representation of a narrated short-form project:
//! ordered scenes, caption style, background music and narration gain.

mod models;
mod motion;

pub use models::*;
pub use motion::*;
