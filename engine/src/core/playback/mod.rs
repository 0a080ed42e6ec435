//! Live Playback Module
//!
//! Keeps narration, background music, motion and captions synchronized while
//! a timeline is previewed interactively.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Live Playback                               │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  engine.rs  - Frame-driven state machine (seek, tick, advance)  │
//! │  sink.rs    - AudioSink trait + clock-driven SimulatedSink      │
//! │  clock.rs   - Monotonic time sources                            │
//! │  gain.rs    - Volume / amplification split for boosted gain     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod clock;
mod engine;
mod gain;
mod sink;

pub use clock::*;
pub use engine::*;
pub use gain::*;
pub use sink::*;
