//! Asset Module
//!
//! Collaborator seams for everything the compositor does not produce itself:
//! fetching referenced media and synthesizing narration or images.

mod fetcher;
mod providers;

pub use fetcher::*;
pub use providers::*;
