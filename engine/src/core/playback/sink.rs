//! Audio Sinks
//!
//! The live engine drives two independent channels (narration and music)
//! through [`AudioSink`]. A host application plugs in its real audio output;
//! [`SimulatedSink`] reproduces media timing from duration metadata for
//! headless playback and tests.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::clock::Clock;
use crate::core::{AssetRef, TimeSec};

/// Load state of the media inside a sink
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum MediaState {
    Empty,
    Loading,
    Ready { duration: TimeSec },
    Failed { reason: String },
}

impl MediaState {
    pub fn duration(&self) -> Option<TimeSec> {
        match self {
            MediaState::Ready { duration } => Some(*duration),
            _ => None,
        }
    }
}

/// One controllable audio channel.
///
/// Loading is asynchronous from the caller's point of view: after
/// [`AudioSink::load`] the engine polls [`AudioSink::media_state`] every frame.
pub trait AudioSink: Send {
    /// Starts loading `asset`, replacing whatever was loaded
    fn load(&mut self, asset: &AssetRef, duration_hint: Option<TimeSec>);
    fn unload(&mut self);
    fn media_state(&self) -> MediaState;

    fn play(&mut self);
    fn pause(&mut self);
    fn is_playing(&self) -> bool;

    /// Moves the read position, clamped to the media length once known
    fn seek(&mut self, position: TimeSec);
    fn position(&self) -> TimeSec;
    fn has_ended(&self) -> bool;

    /// Output volume (0.0 ~ 1.0)
    fn set_volume(&mut self, volume: f64);
    /// Post-volume amplifier gain (>= 1.0)
    fn set_amplification(&mut self, gain: f64);
    fn set_looping(&mut self, looping: bool);
}

// =============================================================================
// Simulated Sink
// =============================================================================

#[derive(Clone, Debug)]
enum SimulatedMedia {
    Empty,
    Pending { ready_at: TimeSec, duration: TimeSec },
    Failed(String),
}

/// Clock-driven sink that plays nothing but keeps accurate positions
pub struct SimulatedSink {
    clock: Arc<dyn Clock>,
    load_latency: TimeSec,
    fallback_duration: Option<TimeSec>,
    failing_assets: HashSet<String>,
    media: SimulatedMedia,
    base_position: TimeSec,
    playing_since: Option<TimeSec>,
    looping: bool,
    volume: f64,
    amplification: f64,
    load_count: usize,
    seek_count: usize,
}

impl SimulatedSink {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            load_latency: 0.0,
            fallback_duration: None,
            failing_assets: HashSet::new(),
            media: SimulatedMedia::Empty,
            base_position: 0.0,
            playing_since: None,
            looping: false,
            volume: 1.0,
            amplification: 1.0,
            load_count: 0,
            seek_count: 0,
        }
    }

    /// Time between `load` and the media becoming ready
    pub fn with_load_latency(mut self, seconds: TimeSec) -> Self {
        self.load_latency = seconds.max(0.0);
        self
    }

    /// Length assumed for media loaded without a duration hint
    pub fn with_fallback_duration(mut self, seconds: TimeSec) -> Self {
        self.fallback_duration = Some(seconds);
        self
    }

    /// Makes every load of `asset` fail
    pub fn fail_asset(&mut self, asset: &AssetRef) {
        self.failing_assets.insert(asset.to_string());
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn amplification(&self) -> f64 {
        self.amplification
    }

    pub fn is_looping(&self) -> bool {
        self.looping
    }

    pub fn load_count(&self) -> usize {
        self.load_count
    }

    pub fn seek_count(&self) -> usize {
        self.seek_count
    }

    fn ready(&self) -> Option<(TimeSec, TimeSec)> {
        match self.media {
            SimulatedMedia::Pending { ready_at, duration } if self.clock.now() >= ready_at => {
                Some((ready_at, duration))
            }
            _ => None,
        }
    }
}

impl AudioSink for SimulatedSink {
    fn load(&mut self, asset: &AssetRef, duration_hint: Option<TimeSec>) {
        self.load_count += 1;
        self.base_position = 0.0;
        self.playing_since = None;

        let key = asset.to_string();
        self.media = if self.failing_assets.contains(&key) {
            SimulatedMedia::Failed(format!("cannot decode {}", key))
        } else {
            match duration_hint.or(self.fallback_duration) {
                Some(duration) if duration.is_finite() && duration > 0.0 => SimulatedMedia::Pending {
                    ready_at: self.clock.now() + self.load_latency,
                    duration,
                },
                _ => SimulatedMedia::Failed(format!("no duration metadata for {}", key)),
            }
        };
    }

    fn unload(&mut self) {
        self.media = SimulatedMedia::Empty;
        self.base_position = 0.0;
        self.playing_since = None;
    }

    fn media_state(&self) -> MediaState {
        match &self.media {
            SimulatedMedia::Empty => MediaState::Empty,
            SimulatedMedia::Failed(reason) => MediaState::Failed {
                reason: reason.clone(),
            },
            SimulatedMedia::Pending { duration, .. } => match self.ready() {
                Some(_) => MediaState::Ready {
                    duration: *duration,
                },
                None => MediaState::Loading,
            },
        }
    }

    fn play(&mut self) {
        if matches!(self.media, SimulatedMedia::Failed(_) | SimulatedMedia::Empty) {
            return;
        }
        if self.playing_since.is_none() {
            self.playing_since = Some(self.clock.now());
        }
    }

    fn pause(&mut self) {
        self.base_position = self.position();
        self.playing_since = None;
    }

    fn is_playing(&self) -> bool {
        self.playing_since.is_some() && !self.has_ended()
    }

    fn seek(&mut self, position: TimeSec) {
        self.seek_count += 1;
        let upper = self.ready().map(|(_, d)| d).unwrap_or(f64::INFINITY);
        self.base_position = if position.is_finite() {
            position.clamp(0.0, upper)
        } else {
            0.0
        };
        if self.playing_since.is_some() {
            self.playing_since = Some(self.clock.now());
        }
    }

    fn position(&self) -> TimeSec {
        let Some((ready_at, duration)) = self.ready() else {
            return self.base_position;
        };
        let Some(since) = self.playing_since else {
            return self.base_position.min(duration);
        };

        let elapsed = (self.clock.now() - since.max(ready_at)).max(0.0);
        let position = self.base_position + elapsed;
        if self.looping {
            position % duration
        } else {
            position.min(duration)
        }
    }

    fn has_ended(&self) -> bool {
        match self.ready() {
            Some((_, duration)) => !self.looping && self.position() >= duration,
            None => false,
        }
    }

    fn set_volume(&mut self, volume: f64) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    fn set_amplification(&mut self, gain: f64) {
        self.amplification = gain.max(1.0);
    }

    fn set_looping(&mut self, looping: bool) {
        self.looping = looping;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::playback::ManualClock;

    fn sink_with_clock() -> (SimulatedSink, ManualClock) {
        let clock = ManualClock::new();
        (SimulatedSink::new(Arc::new(clock.clone())), clock)
    }

    #[test]
    fn test_becomes_ready_after_latency() {
        let (sink, clock) = sink_with_clock();
        let mut sink = sink.with_load_latency(0.5);

        sink.load(&AssetRef::url("https://cdn/a.mp3"), Some(3.0));
        assert_eq!(sink.media_state(), MediaState::Loading);

        clock.advance(0.5);
        assert_eq!(sink.media_state(), MediaState::Ready { duration: 3.0 });
    }

    #[test]
    fn test_position_advances_only_while_playing() {
        let (mut sink, clock) = sink_with_clock();
        sink.load(&AssetRef::url("https://cdn/a.mp3"), Some(3.0));

        sink.play();
        clock.advance(1.0);
        assert!((sink.position() - 1.0).abs() < 1e-9);

        sink.pause();
        clock.advance(1.0);
        assert!((sink.position() - 1.0).abs() < 1e-9);

        sink.play();
        clock.advance(5.0);
        assert_eq!(sink.position(), 3.0);
        assert!(sink.has_ended());
        assert!(!sink.is_playing());
    }

    #[test]
    fn test_looping_wraps_position() {
        let (mut sink, clock) = sink_with_clock();
        sink.load(&AssetRef::url("https://cdn/m.mp3"), Some(2.0));
        sink.set_looping(true);

        sink.play();
        clock.advance(5.0);
        assert!((sink.position() - 1.0).abs() < 1e-9);
        assert!(!sink.has_ended());
    }

    #[test]
    fn test_missing_duration_or_forced_failure() {
        let (mut sink, _clock) = sink_with_clock();
        let asset = AssetRef::url("https://cdn/broken.mp3");

        sink.load(&asset, None);
        assert!(matches!(sink.media_state(), MediaState::Failed { .. }));

        sink.fail_asset(&asset);
        sink.load(&asset, Some(2.0));
        assert!(matches!(sink.media_state(), MediaState::Failed { .. }));
        assert_eq!(sink.load_count(), 2);
    }

    #[test]
    fn test_seek_is_clamped_to_length() {
        let (mut sink, _clock) = sink_with_clock();
        sink.load(&AssetRef::url("https://cdn/a.mp3"), Some(2.0));

        sink.seek(7.0);
        assert_eq!(sink.position(), 2.0);
        sink.seek(-1.0);
        assert_eq!(sink.position(), 0.0);
        assert_eq!(sink.seek_count(), 2);
    }
}
