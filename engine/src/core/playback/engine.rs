//! Live Synchronization Engine
//!
//! Frame-driven state machine that keeps narration, background music, motion
//! and captions in sync while a timeline plays inside an editor.
//!
//! Scene-local time comes from one of two sources:
//! - the narration sink position while narration is live
//! - `base + elapsed` on the engine clock once narration is absent, finished
//!   or the requested offset lies past its end (silence extrapolation)
//!
//! The music channel is only ever started and paused by the play flag. Scene
//! changes and seeks never reposition it.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::gain::GainStage;
use super::sink::{AudioSink, MediaState};
use crate::core::{
    captions::{active_segment, segments_for_scene, CaptionSegment},
    settings::PlaybackSettings,
    timeline::{motion_progress, MotionTransform, Scene, Timeline},
    AssetRef, CoreError, CoreResult, SceneId, TimeSec,
};

// =============================================================================
// Public State
// =============================================================================

/// Coarse engine state reported with every frame
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlaybackState {
    Idle,
    Playing,
    /// Waiting for narration after a seek or scene selection
    Seeking,
    /// Waiting for narration after an automatic advance
    SceneTransition,
}

/// Narration condition of the current scene
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum NarrationStatus {
    /// The scene has no narration asset
    Missing,
    Loading,
    Live,
    /// Narration finished or the playhead is past its end
    Silent,
    /// The asset exists but failed to load and needs regeneration
    Stale { reason: String },
}

/// Everything the UI needs to draw one frame
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameState {
    pub state: PlaybackState,
    pub scene_index: usize,
    pub scene_id: SceneId,
    pub local_time: TimeSec,
    pub global_time: TimeSec,
    pub caption: Option<String>,
    pub motion_progress: f64,
    pub motion: MotionTransform,
    pub narration: NarrationStatus,
    pub is_playing: bool,
}

/// Notifications queued for the host, see [`PlaybackEngine::drain_events`]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PlaybackEvent {
    #[serde(rename_all = "camelCase")]
    SceneChanged { index: usize, scene_id: SceneId },
    PlaybackStarted,
    PlaybackPaused,
    PlaybackEnded,
    #[serde(rename_all = "camelCase")]
    NarrationStale { scene_id: SceneId, reason: String },
    #[serde(rename_all = "camelCase")]
    SeekTimedOut { scene_id: SceneId },
}

// =============================================================================
// Internal Phases
// =============================================================================

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LoadCause {
    Seek,
    Advance,
}

#[derive(Clone, Debug, PartialEq)]
enum NarrationPhase {
    /// Narration requested; `target_offset` is applied once it is ready
    Loading {
        requested_at: TimeSec,
        target_offset: TimeSec,
        cause: LoadCause,
    },
    /// Local time follows the narration sink
    Live,
    /// Local time is `base + (now - since)`; `since` is `None` while paused
    Silence {
        base: TimeSec,
        since: Option<TimeSec>,
        /// Narration still loading after the seek timeout
        awaiting_narration: bool,
    },
    Stale { reason: String, offset: TimeSec },
}

// =============================================================================
// Engine
// =============================================================================

/// Live playback of one timeline over a narration sink and a music sink
pub struct PlaybackEngine<S: AudioSink> {
    timeline: Timeline,
    clock: Arc<dyn Clock>,
    narration: S,
    music: S,
    load_timeout: TimeSec,

    scene_index: usize,
    segments: Vec<CaptionSegment>,
    phase: NarrationPhase,
    local_time: TimeSec,
    play_intent: bool,
    /// Clock time and narration position of the last live frame
    live_anchor: Option<(TimeSec, TimeSec)>,
    music_available: bool,
    stale_assets: HashMap<SceneId, AssetRef>,
    events: VecDeque<PlaybackEvent>,
}

impl<S: AudioSink> PlaybackEngine<S> {
    /// Creates an idle engine positioned at the start of the first scene.
    ///
    /// An empty timeline is accepted and turns every command into a no-op.
    pub fn new(
        timeline: Timeline,
        narration: S,
        music: S,
        clock: Arc<dyn Clock>,
        settings: &PlaybackSettings,
    ) -> CoreResult<Self> {
        check_timeline(&timeline)?;

        let mut engine = Self {
            timeline,
            clock,
            narration,
            music,
            load_timeout: settings.seek_load_timeout_ms as f64 / 1000.0,
            scene_index: 0,
            segments: Vec::new(),
            phase: NarrationPhase::Silence {
                base: 0.0,
                since: None,
                awaiting_narration: false,
            },
            local_time: 0.0,
            play_intent: false,
            live_anchor: None,
            music_available: false,
            stale_assets: HashMap::new(),
            events: VecDeque::new(),
        };
        engine.load_music();
        engine.apply_narration_gain();
        if !engine.timeline.is_empty() {
            engine.enter_scene(0, 0.0, LoadCause::Seek);
        }
        Ok(engine)
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn narration_sink(&self) -> &S {
        &self.narration
    }

    pub fn music_sink(&self) -> &S {
        &self.music
    }

    pub fn current_scene_index(&self) -> usize {
        self.scene_index
    }

    pub fn is_playing(&self) -> bool {
        self.play_intent
    }

    pub fn state(&self) -> PlaybackState {
        match &self.phase {
            NarrationPhase::Loading {
                cause: LoadCause::Advance,
                ..
            } => PlaybackState::SceneTransition,
            NarrationPhase::Loading { .. } => PlaybackState::Seeking,
            _ if self.play_intent => PlaybackState::Playing,
            _ => PlaybackState::Idle,
        }
    }

    /// Current playhead in timeline seconds
    pub fn global_time(&self) -> TimeSec {
        self.timeline.scene_start_time(self.scene_index) + self.local_time
    }

    fn current_scene(&self) -> Option<&Scene> {
        self.timeline.scenes.get(self.scene_index)
    }

    // =========================================================================
    // Commands
    // =========================================================================

    /// Jumps to the start of a scene and stops playback
    pub fn select_scene(&mut self, scene_id: &str) -> CoreResult<()> {
        let index = self
            .timeline
            .scene_index(scene_id)
            .ok_or_else(|| CoreError::SceneNotFound(scene_id.to_string()))?;

        if self.play_intent {
            self.play_intent = false;
            self.events.push_back(PlaybackEvent::PlaybackPaused);
        }
        self.music.pause();
        self.enter_scene(index, 0.0, LoadCause::Seek);
        Ok(())
    }

    /// Whether [`play`](Self::play) would start playback for the current scene
    pub fn can_play(&self) -> bool {
        let Some(scene) = self.current_scene() else {
            return false;
        };
        if matches!(self.phase, NarrationPhase::Stale { .. }) {
            return false;
        }
        scene.has_narration() || self.timeline.photo_reel
    }

    /// Like [`can_play`](Self::can_play), but names the reason
    pub fn ensure_playable(&self) -> CoreResult<()> {
        let scene = self.current_scene().ok_or(CoreError::EmptyTimeline)?;
        if matches!(self.phase, NarrationPhase::Stale { .. }) {
            return Err(CoreError::NarrationStale(scene.id.clone()));
        }
        if !scene.has_narration() && !self.timeline.photo_reel {
            return Err(CoreError::ValidationError(format!(
                "scene {} has no narration",
                scene.id
            )));
        }
        Ok(())
    }

    /// Starts playback. Returns `false` when the current scene cannot play.
    pub fn play(&mut self) -> bool {
        if !self.can_play() {
            debug!("Play ignored for scene {}", self.scene_index);
            return false;
        }
        if self.play_intent {
            return true;
        }

        if self.at_timeline_end() {
            self.enter_scene(0, 0.0, LoadCause::Seek);
        }

        self.play_intent = true;
        let now = self.clock.now();
        match &mut self.phase {
            NarrationPhase::Live => self.narration.play(),
            NarrationPhase::Silence { since, .. } => *since = Some(now),
            NarrationPhase::Loading { .. } | NarrationPhase::Stale { .. } => {}
        }
        if self.music_available {
            self.music.play();
        }

        info!("Playback started at {:.3}s", self.global_time());
        self.events.push_back(PlaybackEvent::PlaybackStarted);
        true
    }

    /// Pauses both channels and freezes silence extrapolation
    pub fn pause(&mut self) {
        if !self.play_intent {
            return;
        }
        self.play_intent = false;
        self.live_anchor = None;

        let now = self.clock.now();
        match &mut self.phase {
            NarrationPhase::Live => self.narration.pause(),
            NarrationPhase::Silence { base, since, .. } => {
                if let Some(started) = since.take() {
                    *base += now - started;
                }
            }
            NarrationPhase::Loading { .. } | NarrationPhase::Stale { .. } => {}
        }
        self.music.pause();

        info!("Playback paused at {:.3}s", self.global_time());
        self.events.push_back(PlaybackEvent::PlaybackPaused);
    }

    /// Moves the playhead to a global time.
    ///
    /// Seeking into another scene is deferred until its narration loads; a
    /// newer seek replaces a pending one.
    pub fn seek(&mut self, global_time: TimeSec) {
        let Some(location) = self.timeline.locate(global_time) else {
            return;
        };

        if location.index != self.scene_index {
            debug!(
                "Deferred seek to scene {} offset {:.3}s",
                location.index, location.offset
            );
            self.enter_scene(location.index, location.offset, LoadCause::Seek);
            return;
        }

        let offset = location.offset;
        self.local_time = offset;
        if matches!(
            self.phase,
            NarrationPhase::Live
                | NarrationPhase::Silence {
                    awaiting_narration: false,
                    ..
                }
        ) {
            self.position_narration(offset);
            return;
        }

        let now = self.clock.now();
        match &mut self.phase {
            NarrationPhase::Loading { target_offset, .. } => *target_offset = offset,
            NarrationPhase::Stale { offset: parked, .. } => *parked = offset,
            NarrationPhase::Silence {
                awaiting_narration: true,
                base,
                since,
            } => {
                *base = offset;
                if since.is_some() {
                    *since = Some(now);
                }
            }
            NarrationPhase::Live | NarrationPhase::Silence { .. } => {}
        }
    }

    /// Sets the narration multiplier; values above 1.0 boost
    pub fn set_narration_gain(&mut self, gain: f64) {
        self.timeline.set_narration_gain(gain);
        self.apply_narration_gain();
    }

    pub fn set_music_volume(&mut self, volume: f64) {
        self.timeline.set_music_volume(volume);
        if let Some(music) = &self.timeline.background_music {
            self.music.set_volume(music.volume);
        }
    }

    /// Swaps in a new timeline, discarding all ephemeral playback state
    pub fn replace_timeline(&mut self, timeline: Timeline) -> CoreResult<()> {
        check_timeline(&timeline)?;

        self.narration.pause();
        self.narration.unload();
        self.music.pause();
        self.music.unload();

        self.timeline = timeline;
        self.scene_index = 0;
        self.segments.clear();
        self.local_time = 0.0;
        self.play_intent = false;
        self.live_anchor = None;
        self.stale_assets.clear();
        self.events.clear();
        self.phase = NarrationPhase::Silence {
            base: 0.0,
            since: None,
            awaiting_narration: false,
        };

        self.load_music();
        self.apply_narration_gain();
        if !self.timeline.is_empty() {
            self.enter_scene(0, 0.0, LoadCause::Seek);
        }
        Ok(())
    }

    /// Takes all queued events
    pub fn drain_events(&mut self) -> Vec<PlaybackEvent> {
        self.events.drain(..).collect()
    }

    // =========================================================================
    // Frame Tick
    // =========================================================================

    /// Advances the engine by one display frame.
    ///
    /// Returns `None` for an empty timeline.
    pub fn tick(&mut self) -> Option<FrameState> {
        let duration = self.current_scene()?.duration_sec;

        self.poll_narration();
        let local = self.sample_local_time();
        let reached_end = local >= duration;
        self.local_time = local.min(duration);

        let frame = self.frame_state();

        if reached_end && self.play_intent {
            // Time already spent past the end belongs to the next scene.
            self.finish_scene(local - duration);
        }

        Some(frame)
    }

    fn frame_state(&self) -> FrameState {
        let scene = &self.timeline.scenes[self.scene_index];
        let progress = motion_progress(self.local_time, scene.duration_sec);

        FrameState {
            state: self.state(),
            scene_index: self.scene_index,
            scene_id: scene.id.clone(),
            local_time: self.local_time,
            global_time: self.global_time(),
            caption: self.caption_for(scene),
            motion_progress: progress,
            motion: scene.motion.transform_at(progress),
            narration: self.narration_status(scene),
            is_playing: self.play_intent,
        }
    }

    fn caption_for(&self, scene: &Scene) -> Option<String> {
        if !scene.shows_captions() {
            return None;
        }
        let text = match active_segment(&self.segments, self.local_time) {
            Some(segment) => segment.text.clone(),
            None => {
                let full = scene.text.trim();
                if full.is_empty() {
                    return None;
                }
                full.to_string()
            }
        };
        if self.timeline.caption_style.uppercase() {
            Some(text.to_uppercase())
        } else {
            Some(text)
        }
    }

    fn narration_status(&self, scene: &Scene) -> NarrationStatus {
        match &self.phase {
            NarrationPhase::Stale { reason, .. } => NarrationStatus::Stale {
                reason: reason.clone(),
            },
            _ if !scene.has_narration() => NarrationStatus::Missing,
            NarrationPhase::Loading { .. }
            | NarrationPhase::Silence {
                awaiting_narration: true,
                ..
            } => NarrationStatus::Loading,
            NarrationPhase::Live => NarrationStatus::Live,
            NarrationPhase::Silence { .. } => NarrationStatus::Silent,
        }
    }

    fn sample_local_time(&mut self) -> TimeSec {
        let now = self.clock.now();

        if self.phase == NarrationPhase::Live {
            let position = self.narration.position();
            if !self.narration.has_ended() {
                if self.play_intent {
                    self.live_anchor = Some((now, position));
                }
                // Never step backwards past the last reported frame.
                return position.max(self.local_time);
            }

            debug!(
                "Narration ended at {:.3}s, extrapolating scene {}",
                position, self.scene_index
            );
            let since = self
                .play_intent
                .then(|| self.narration_ended_at(now, position));
            self.live_anchor = None;
            self.phase = NarrationPhase::Silence {
                base: position,
                since,
                awaiting_narration: false,
            };
        }

        match &self.phase {
            NarrationPhase::Loading { target_offset, .. } => *target_offset,
            NarrationPhase::Stale { offset, .. } => *offset,
            NarrationPhase::Silence {
                base,
                since: Some(started),
                ..
            } => base + (now - started).max(0.0),
            NarrationPhase::Silence { base, .. } => *base,
            NarrationPhase::Live => self.local_time,
        }
    }

    /// Clock time at which narration most likely reached `end_position`,
    /// estimated from the last live frame
    fn narration_ended_at(&self, now: TimeSec, end_position: TimeSec) -> TimeSec {
        match self.live_anchor {
            Some((at, position)) => (at + (end_position - position).max(0.0)).min(now),
            None => now,
        }
    }

    /// Resolves a pending narration load
    fn poll_narration(&mut self) {
        let now = self.clock.now();
        let target = match self.phase.clone() {
            NarrationPhase::Loading {
                requested_at,
                target_offset,
                cause,
            } => {
                if self.narration.media_state() == MediaState::Loading
                    && now - requested_at >= self.load_timeout
                {
                    self.on_load_timeout(cause, target_offset, requested_at);
                    return;
                }
                match cause {
                    // Playback kept running while the next scene loaded.
                    LoadCause::Advance if self.play_intent => {
                        target_offset + (now - requested_at).max(0.0)
                    }
                    _ => target_offset,
                }
            }
            NarrationPhase::Silence {
                awaiting_narration: true,
                ..
            } => self.sample_local_time(),
            _ => return,
        };

        match self.narration.media_state() {
            MediaState::Ready { .. } | MediaState::Empty => self.position_narration(target),
            MediaState::Failed { reason } => self.on_load_failed(reason, target),
            MediaState::Loading => {}
        }
    }

    fn on_load_timeout(
        &mut self,
        cause: LoadCause,
        target_offset: TimeSec,
        requested_at: TimeSec,
    ) {
        let Some(scene_id) = self.current_scene().map(|s| s.id.clone()) else {
            return;
        };

        // An automatic advance keeps its running time; a seek restarts at 0.
        let (base, since) = match cause {
            LoadCause::Advance if self.play_intent => (target_offset, Some(requested_at)),
            _ => (0.0, self.play_intent.then(|| self.clock.now())),
        };
        warn!(
            "Narration for scene {} not ready after {:.1}s, continuing from offset {:.3}s",
            scene_id, self.load_timeout, base
        );
        self.local_time = base;
        self.phase = NarrationPhase::Silence {
            base,
            since,
            awaiting_narration: true,
        };
        self.events
            .push_back(PlaybackEvent::SeekTimedOut { scene_id });
    }

    fn on_load_failed(&mut self, reason: String, offset: TimeSec) {
        let Some((scene_id, asset)) = self
            .current_scene()
            .map(|s| (s.id.clone(), s.narration.as_ref().map(|n| n.asset.clone())))
        else {
            return;
        };
        if let Some(asset) = asset {
            self.stale_assets.insert(scene_id.clone(), asset);
        }

        warn!("Narration for scene {} is stale: {}", scene_id, reason);
        self.narration.unload();
        self.phase = NarrationPhase::Stale {
            reason: reason.clone(),
            offset,
        };
        self.local_time = offset;
        self.events
            .push_back(PlaybackEvent::NarrationStale { scene_id, reason });

        if self.play_intent {
            self.play_intent = false;
            self.music.pause();
            self.events.push_back(PlaybackEvent::PlaybackPaused);
        }
    }

    /// Called on the frame that reported the scene's final instant.
    ///
    /// `overshoot` is how far the sampled time ran past the scene end.
    fn finish_scene(&mut self, overshoot: TimeSec) {
        let next = self.scene_index + 1;
        if let Some(scene) = self.timeline.scenes.get(next) {
            let offset = overshoot.clamp(0.0, scene.duration_sec);
            debug!("Auto-advancing to scene {} at {:.3}s", next, offset);
            self.enter_scene(next, offset, LoadCause::Advance);
            return;
        }

        self.play_intent = false;
        self.narration.pause();
        self.music.pause();
        if let NarrationPhase::Silence { base, since, .. } = &mut self.phase {
            *base = self.local_time;
            *since = None;
        }
        info!("Playback reached end of timeline");
        self.events.push_back(PlaybackEvent::PlaybackEnded);
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    /// Switches the current scene and starts loading its narration
    fn enter_scene(&mut self, index: usize, offset: TimeSec, cause: LoadCause) {
        self.narration.pause();
        self.narration.unload();
        self.live_anchor = None;

        let Some(scene) = self.timeline.scenes.get(index) else {
            return;
        };
        let scene_id = scene.id.clone();
        let narration = scene.narration.clone();
        let changed = index != self.scene_index;

        self.scene_index = index;
        self.segments = segments_for_scene(scene);
        self.local_time = offset;

        let now = self.clock.now();
        self.phase = match narration {
            None => NarrationPhase::Silence {
                base: offset,
                since: self.play_intent.then_some(now),
                awaiting_narration: false,
            },
            Some(narration) if self.stale_assets.get(&scene_id) == Some(&narration.asset) => {
                NarrationPhase::Stale {
                    reason: "narration previously failed to load".to_string(),
                    offset,
                }
            }
            Some(narration) => {
                self.narration.set_looping(false);
                self.narration.load(&narration.asset, narration.duration_sec);
                NarrationPhase::Loading {
                    requested_at: now,
                    target_offset: offset,
                    cause,
                }
            }
        };

        if matches!(self.phase, NarrationPhase::Stale { .. }) && self.play_intent {
            self.play_intent = false;
            self.music.pause();
            self.events.push_back(PlaybackEvent::PlaybackPaused);
        }

        if changed || cause == LoadCause::Seek {
            self.events
                .push_back(PlaybackEvent::SceneChanged { index, scene_id });
        }
    }

    /// Places the narration at `offset`, falling back to silence past its end
    fn position_narration(&mut self, offset: TimeSec) {
        let now = self.clock.now();
        self.local_time = offset;
        self.live_anchor = None;

        match self.narration.media_state().duration() {
            Some(length) if offset < length => {
                self.narration.seek(offset);
                if self.play_intent {
                    self.narration.play();
                }
                self.phase = NarrationPhase::Live;
            }
            Some(length) => {
                // Park at the end so the sink stays silent.
                self.narration.seek(length);
                self.narration.pause();
                self.phase = NarrationPhase::Silence {
                    base: offset,
                    since: self.play_intent.then_some(now),
                    awaiting_narration: false,
                };
            }
            None => {
                self.phase = NarrationPhase::Silence {
                    base: offset,
                    since: self.play_intent.then_some(now),
                    awaiting_narration: false,
                };
            }
        }
    }

    fn at_timeline_end(&self) -> bool {
        match self.current_scene() {
            Some(scene) => {
                self.scene_index + 1 == self.timeline.scenes.len()
                    && self.local_time >= scene.duration_sec
            }
            None => false,
        }
    }

    fn apply_narration_gain(&mut self) {
        let stage = GainStage::split(self.timeline.narration_gain);
        self.narration.set_volume(stage.volume);
        self.narration.set_amplification(stage.amplification);
    }

    fn load_music(&mut self) {
        let Some(music) = self.timeline.background_music.clone() else {
            self.music_available = false;
            return;
        };

        self.music.set_looping(true);
        self.music.set_volume(music.volume);
        self.music.load(&music.asset, None);
        self.music_available = !matches!(self.music.media_state(), MediaState::Failed { .. });
        if !self.music_available {
            warn!("Background music {} unavailable, playing without it", music.asset);
        }
    }
}

fn check_timeline(timeline: &Timeline) -> CoreResult<()> {
    if timeline.is_empty() {
        return Ok(());
    }
    timeline.validate()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::playback::{ManualClock, SimulatedSink};
    use crate::core::timeline::{BackgroundMusic, CaptionStyle, MotionType};

    const FRAME: f64 = 0.1;
    const EPS: f64 = 1e-6;

    struct Harness {
        clock: ManualClock,
        engine: PlaybackEngine<SimulatedSink>,
    }

    impl Harness {
        fn new(timeline: Timeline) -> Self {
            Self::with_sinks(timeline, |s| s, |s| s)
        }

        fn with_sinks(
            timeline: Timeline,
            narration: impl FnOnce(SimulatedSink) -> SimulatedSink,
            music: impl FnOnce(SimulatedSink) -> SimulatedSink,
        ) -> Self {
            let clock = ManualClock::new();
            let shared: Arc<dyn Clock> = Arc::new(clock.clone());
            let engine = PlaybackEngine::new(
                timeline,
                narration(SimulatedSink::new(shared.clone())),
                music(SimulatedSink::new(shared.clone()).with_fallback_duration(4.0)),
                shared,
                &PlaybackSettings::default(),
            )
            .unwrap();
            Self { clock, engine }
        }

        fn step(&mut self) -> FrameState {
            self.clock.advance(FRAME);
            self.engine.tick().unwrap()
        }
    }

    fn narrated(text: &str, duration: f64, narration_len: f64) -> Scene {
        let asset = AssetRef::url(format!("https://cdn/{}.mp3", text.len()));
        Scene::new(text, duration).with_narration(asset, Some(narration_len))
    }

    fn two_scenes() -> Timeline {
        Timeline::with_scenes(
            "Demo",
            vec![
                narrated("A quick test.", 5.0, 4.0),
                narrated("Bye now.", 3.0, 2.5),
            ],
        )
    }

    #[test]
    fn test_initial_frame_is_idle_at_zero() {
        let mut h = Harness::new(two_scenes());
        let frame = h.engine.tick().unwrap();

        assert_eq!(frame.state, PlaybackState::Idle);
        assert_eq!(frame.scene_index, 0);
        assert_eq!(frame.local_time, 0.0);
        assert_eq!(frame.caption.as_deref(), Some("A quick test."));
        assert_eq!(frame.narration, NarrationStatus::Live);
    }

    #[test]
    fn test_empty_timeline_is_noop() {
        let mut h = Harness::new(Timeline::new("Empty"));
        assert!(h.engine.tick().is_none());
        assert!(!h.engine.play());
        h.engine.seek(3.0);
        assert!(h.engine.tick().is_none());
    }

    #[test]
    fn test_rejects_invalid_durations() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new());
        let mut timeline = two_scenes();
        timeline.scenes[0].duration_sec = -1.0;

        let result = PlaybackEngine::new(
            timeline,
            SimulatedSink::new(clock.clone()),
            SimulatedSink::new(clock.clone()),
            clock,
            &PlaybackSettings::default(),
        );
        assert!(matches!(result, Err(CoreError::InvalidSceneDuration { .. })));
    }

    #[test]
    fn test_silence_extrapolation_is_monotonic_then_advances() {
        let mut h = Harness::new(two_scenes());
        h.engine.tick();
        assert!(h.engine.play());

        let mut last = 0.0;
        let mut saw_scene_end = false;
        for _ in 0..80 {
            let frame = h.step();
            if frame.scene_index != 0 {
                break;
            }
            assert!(frame.local_time >= last - EPS, "time went backwards");
            assert!(frame.local_time <= 5.0);
            if frame.local_time == 5.0 {
                saw_scene_end = true;
            }
            last = frame.local_time;
        }

        assert!(saw_scene_end, "scene end frame must report exactly the duration");
        assert_eq!(h.engine.current_scene_index(), 1);
        assert!(h.engine.is_playing());
    }

    #[test]
    fn test_narration_end_switches_to_silent_status() {
        let mut h = Harness::new(two_scenes());
        h.engine.tick();
        h.engine.play();

        let mut statuses = Vec::new();
        for _ in 0..45 {
            statuses.push(h.step().narration);
        }
        assert_eq!(statuses.first(), Some(&NarrationStatus::Live));
        assert_eq!(statuses.last(), Some(&NarrationStatus::Silent));
    }

    #[test]
    fn test_playback_stops_at_last_scene() {
        let mut h = Harness::new(two_scenes());
        h.engine.tick();
        h.engine.play();

        let mut frames = Vec::new();
        for _ in 0..120 {
            frames.push(h.step());
        }

        let last = frames.last().unwrap();
        assert_eq!(last.scene_index, 1);
        assert_eq!(last.local_time, 3.0);
        assert!(!last.is_playing);
        assert!(h
            .engine
            .drain_events()
            .contains(&PlaybackEvent::PlaybackEnded));
    }

    #[test]
    fn test_seek_to_total_duration_lands_on_final_instant() {
        let mut h = Harness::new(two_scenes());
        h.engine.seek(8.0);
        let frame = h.step();

        assert_eq!(frame.scene_index, 1);
        assert_eq!(frame.local_time, 3.0);
        assert_eq!(frame.global_time, 8.0);

        h.engine.seek(1_000.0);
        let frame = h.step();
        assert_eq!(frame.scene_index, 1);
        assert_eq!(frame.local_time, 3.0);
    }

    #[test]
    fn test_seek_past_narration_enters_silence_at_offset() {
        let mut h = Harness::new(two_scenes());
        h.engine.tick();

        h.engine.seek(4.5);
        let frame = h.engine.tick().unwrap();
        assert_eq!(frame.narration, NarrationStatus::Silent);
        assert!((frame.local_time - 4.5).abs() < EPS);
        assert_eq!(h.engine.narration_sink().position(), 4.0);

        h.engine.play();
        let frame = h.step();
        assert!((frame.local_time - 4.6).abs() < EPS);
    }

    #[test]
    fn test_seek_into_silence_runs_to_scene_end_then_advances() {
        let mut h = Harness::new(two_scenes());
        h.engine.tick();
        assert!(h.engine.play());

        h.engine.seek(4.5);
        let mut scene_frames = vec![h.engine.tick().unwrap()];
        let next = loop {
            let frame = h.step();
            if frame.scene_index != 0 {
                break frame;
            }
            assert!(scene_frames.len() < 20, "scene never finished");
            scene_frames.push(frame);
        };

        assert!((scene_frames[0].local_time - 4.5).abs() < EPS);
        for pair in scene_frames.windows(2) {
            assert!(pair[1].local_time > pair[0].local_time);
        }
        assert!(scene_frames
            .iter()
            .all(|f| f.narration == NarrationStatus::Silent && f.is_playing));
        assert_eq!(scene_frames.last().unwrap().local_time, 5.0);

        assert_eq!(next.scene_index, 1);
        assert!(next.is_playing);
        // Seeked to 4.5 at clock 0, so the playhead keeps pace with the clock.
        assert!((next.global_time - (4.5 + h.clock.now())).abs() < 1e-6);
    }

    #[test]
    fn test_playhead_tracks_wall_clock_across_scene_boundaries() {
        let timeline = Timeline::with_scenes(
            "Drift",
            vec![
                narrated("A quick test.", 5.0, 4.05),
                narrated("Bye now.", 3.0, 2.5),
            ],
        );
        let mut h = Harness::new(timeline);
        h.engine.tick();
        assert!(h.engine.play());

        let mut wall = 0.0;
        let mut saw_second_scene = false;
        let ended_at = loop {
            let frame = h.step();
            wall += FRAME;
            assert!(wall < 10.0, "playback never ended");

            saw_second_scene |= frame.scene_index == 1;
            if h.engine.drain_events().contains(&PlaybackEvent::PlaybackEnded) {
                break wall;
            }
            // Scene end frames are pinned to the exact duration.
            let duration = h.engine.timeline().scenes[frame.scene_index].duration_sec;
            if frame.local_time < duration {
                assert!(
                    (frame.global_time - wall).abs() < 1e-6,
                    "playhead {:.3} drifted from clock {:.3}",
                    frame.global_time,
                    wall
                );
            }
        };

        assert!(saw_second_scene);
        assert!(ended_at <= 8.0 + FRAME + EPS, "ended late at {:.3}", ended_at);
    }

    #[test]
    fn test_advance_timeout_keeps_running_time() {
        let mut timeline = Timeline::with_scenes(
            "Slow",
            vec![Scene::new("Opening.", 1.0), narrated("Two more words.", 6.0, 5.0)],
        );
        timeline.photo_reel = true;
        let mut h = Harness::with_sinks(timeline, |s| s.with_load_latency(10.0), |s| s);
        h.engine.tick();
        assert!(h.engine.play());

        let mut wall = 0.0;
        let frame = loop {
            let frame = h.step();
            wall += FRAME;
            assert!(wall < 6.0, "load never timed out");
            let timed_out = h
                .engine
                .drain_events()
                .iter()
                .any(|e| matches!(e, PlaybackEvent::SeekTimedOut { .. }));
            if timed_out {
                break frame;
            }
        };

        assert_eq!(frame.scene_index, 1);
        assert_eq!(frame.state, PlaybackState::Playing);
        assert_eq!(frame.narration, NarrationStatus::Loading);
        assert!((frame.global_time - wall).abs() < 1e-6);
    }

    #[test]
    fn test_deferred_seek_applies_offset_when_loaded() {
        let mut h = Harness::with_sinks(two_scenes(), |s| s.with_load_latency(0.3), |s| s);
        h.clock.advance(0.3);
        h.engine.tick();

        h.engine.seek(6.0);
        let loading = h.step();
        assert_eq!(loading.state, PlaybackState::Seeking);
        assert_eq!(loading.scene_index, 1);
        assert_eq!(loading.narration, NarrationStatus::Loading);

        // A newer seek into the same pending scene wins.
        h.engine.seek(7.2);
        h.clock.advance(0.3);
        let frame = h.engine.tick().unwrap();
        assert_eq!(frame.narration, NarrationStatus::Live);
        assert!((frame.local_time - 2.2).abs() < EPS);
        assert!((h.engine.narration_sink().position() - 2.2).abs() < EPS);
    }

    #[test]
    fn test_seek_load_timeout_proceeds_from_zero() {
        let mut h = Harness::with_sinks(two_scenes(), |s| s.with_load_latency(10.0), |s| s);
        h.engine.seek(6.0);

        h.clock.advance(3.0);
        let frame = h.engine.tick().unwrap();
        assert_eq!(frame.local_time, 0.0);
        assert_eq!(frame.state, PlaybackState::Idle);

        let events = h.engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::SeekTimedOut { .. })));
    }

    #[test]
    fn test_failed_narration_is_stale_not_missing() {
        let timeline = two_scenes();
        let broken = timeline.scenes[1].narration.clone().unwrap().asset;
        let mut h = Harness::with_sinks(
            timeline,
            |mut s| {
                s.fail_asset(&broken);
                s
            },
            |s| s,
        );
        h.engine.tick();
        h.engine.play();

        let mut last = None;
        for _ in 0..60 {
            last = Some(h.step());
        }
        let frame = last.unwrap();

        assert_eq!(frame.scene_index, 1);
        assert!(matches!(frame.narration, NarrationStatus::Stale { .. }));
        assert!(!frame.is_playing);
        assert!(!h.engine.can_play());
        assert!(!h.engine.play());
        assert!(matches!(
            h.engine.ensure_playable(),
            Err(CoreError::NarrationStale(ref id)) if *id == h.engine.timeline().scenes[1].id
        ));

        let events = h.engine.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, PlaybackEvent::NarrationStale { .. })));
    }

    #[test]
    fn test_scene_without_narration_reports_missing_and_runs_silently() {
        let mut timeline = Timeline::with_scenes(
            "Photos",
            vec![Scene::new("Sunset.", 2.0), Scene::new("Beach.", 2.0)],
        );
        timeline.photo_reel = true;
        let mut h = Harness::new(timeline);

        let frame = h.engine.tick().unwrap();
        assert_eq!(frame.narration, NarrationStatus::Missing);
        assert!(h.engine.play());

        for _ in 0..25 {
            h.step();
        }
        let frame = h.step();
        assert_eq!(frame.scene_index, 1);
        assert!(frame.local_time > 0.0);
    }

    #[test]
    fn test_cannot_play_unnarrated_scene_outside_photo_reel() {
        let mut h = Harness::new(Timeline::with_scenes("Plain", vec![Scene::new("Hi.", 2.0)]));
        assert!(!h.engine.can_play());
        assert!(!h.engine.play());
    }

    #[test]
    fn test_music_is_never_repositioned() {
        let mut timeline = two_scenes();
        timeline.background_music = Some(BackgroundMusic::new(
            AssetRef::url("https://cdn/music.mp3"),
            0.4,
        ));
        let mut h = Harness::new(timeline);
        h.engine.tick();
        h.engine.play();

        for _ in 0..10 {
            h.step();
        }
        let first_id = h.engine.timeline().scenes[0].id.clone();
        h.engine.seek(6.0);
        h.step();
        h.engine.seek(1.0);
        h.step();
        h.engine.select_scene(&first_id).unwrap();
        h.step();

        let music = h.engine.music_sink();
        assert_eq!(music.seek_count(), 0);
        assert_eq!(music.load_count(), 1);
        assert!(music.is_looping());
        assert_eq!(music.volume(), 0.4);
    }

    #[test]
    fn test_select_scene_clears_play_intent() {
        let mut h = Harness::new(two_scenes());
        h.engine.tick();
        h.engine.play();
        h.step();

        let second = h.engine.timeline().scenes[1].id.clone();
        h.engine.select_scene(&second).unwrap();
        let frame = h.step();

        assert!(!frame.is_playing);
        assert_eq!(frame.scene_index, 1);
        assert_eq!(frame.local_time, 0.0);
        assert!(matches!(
            h.engine.select_scene("missing"),
            Err(CoreError::SceneNotFound(_))
        ));
    }

    #[test]
    fn test_pause_freezes_silence_clock() {
        let mut timeline = Timeline::with_scenes("Photos", vec![Scene::new("Quiet.", 5.0)]);
        timeline.photo_reel = true;
        let mut h = Harness::new(timeline);
        h.engine.play();
        for _ in 0..10 {
            h.step();
        }
        h.engine.pause();
        let paused = h.engine.tick().unwrap().local_time;

        h.clock.advance(2.0);
        let later = h.engine.tick().unwrap().local_time;
        assert!((paused - 1.0).abs() < EPS);
        assert_eq!(paused, later);
    }

    #[test]
    fn test_gain_above_one_uses_amplifier() {
        let mut h = Harness::new(two_scenes());

        h.engine.set_narration_gain(2.0);
        assert_eq!(h.engine.narration_sink().volume(), 1.0);
        assert_eq!(h.engine.narration_sink().amplification(), 2.0);

        h.engine.set_narration_gain(0.5);
        assert_eq!(h.engine.narration_sink().volume(), 0.5);
        assert_eq!(h.engine.narration_sink().amplification(), 1.0);
    }

    #[test]
    fn test_captions_follow_segments_and_style() {
        let mut timeline = Timeline::with_scenes(
            "Captions",
            vec![
                narrated("First part. Second part.", 4.0, 4.0).with_motion(MotionType::ZoomIn),
                narrated("Hidden.", 1.0, 1.0).without_captions(),
            ],
        );
        timeline.caption_style = CaptionStyle::Bold;
        let mut h = Harness::new(timeline);

        h.engine.seek(3.5);
        let frame = h.engine.tick().unwrap();
        assert_eq!(frame.caption.as_deref(), Some("SECOND PART."));
        assert!(frame.motion.scale > 1.0);

        h.engine.seek(4.2);
        h.step();
        let frame = h.engine.tick().unwrap();
        assert_eq!(frame.scene_index, 1);
        assert_eq!(frame.caption, None);
    }

    #[test]
    fn test_replace_timeline_resets_state() {
        let mut h = Harness::new(two_scenes());
        h.engine.tick();
        h.engine.play();
        for _ in 0..5 {
            h.step();
        }

        let replacement = Timeline::with_scenes("New", vec![narrated("Fresh start.", 2.0, 2.0)]);
        h.engine.replace_timeline(replacement).unwrap();
        let frame = h.engine.tick().unwrap();

        assert!(!frame.is_playing);
        assert_eq!(frame.local_time, 0.0);
        assert_eq!(frame.caption.as_deref(), Some("Fresh start."));
        assert_eq!(h.engine.timeline().name, "New");
    }
}
