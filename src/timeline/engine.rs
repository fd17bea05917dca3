// SPDX-License-Identifier: MPL-2.0
//! The playback loop.
//!
//! Each [`tick`](PlaybackEngine::tick) reads the virtual clock, finds the clip
//! under the cursor and does one of three things:
//!
//! - **no clip**: pause the sink and report a gap
//! - **a different clip**: ask the switcher for it (once per clip entry)
//! - **the same clip**: let the drift corrector decide whether to re-seek
//!
//! The tick never waits on the sink. Switch attempts are spawned on the tokio
//! runtime, so the engine must be driven from inside one.
//!
//! # Error containment
//!
//! A clip whose switch failed is treated as a gap until the cursor leaves it.
//! It is not retried within the same span; re-entering it later or seeking
//! retries it.

use super::clip_index::ClipIndex;
use super::clock::PlaybackClock;
use super::drift::{DriftAction, DriftCorrector};
use super::resolver::{ResolverSettings, SourceResolver};
use super::switcher::{MediaSwitcher, SwitchSettings, SwitchTask, SwitcherState};
use crate::application::port::{AssetLocator, CursorSink, PlaybackSink};
use crate::config::EngineConfig;
use crate::domain::{Clip, ClipId, TrackIndex};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Coarse engine state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EngineState {
    /// Not running; the clock is parked.
    #[default]
    Stopped,
    /// Running with a clip under the cursor.
    Playing,
    /// Running over empty timeline or an unplayable clip.
    Gap,
    /// Not running; resumable from the parked position.
    Paused,
}

impl EngineState {
    /// Returns true if the clock is advancing.
    #[must_use]
    pub fn is_running(self) -> bool {
        matches!(self, EngineState::Playing | EngineState::Gap)
    }
}

/// Snapshot reported to hosts.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EngineStatus {
    pub gapped: bool,
    pub current_clip_id: Option<ClipId>,
    pub error: Option<String>,
}

/// What a single tick did.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// The engine is stopped or paused.
    Idle,
    /// The cursor reached the end; playback stopped.
    Ended,
    /// No playable clip under the cursor.
    Gap,
    /// A switch to this clip was requested.
    Switching(ClipId),
    /// A switch to this clip is still in flight.
    Waiting(ClipId),
    /// The playing clip drifted and was re-seeked.
    Corrected(ClipId),
    /// The playing clip is in sync.
    Steady(ClipId),
}

/// Drives a playback sink from a clip timeline.
pub struct PlaybackEngine<S, L, C> {
    clips: Arc<[Clip]>,
    index: ClipIndex,
    track: Option<TrackIndex>,
    clock: PlaybackClock,
    switcher: MediaSwitcher<S, L>,
    resolver: SourceResolver<L>,
    drift: DriftCorrector,
    cursor: C,
    state: EngineState,
    /// Clip the current switch request targets; `None` forces a new request.
    target: Option<Clip>,
    error: Option<String>,
    prefetched: Option<ClipId>,
    tick_period: Duration,
    prefetch_lookahead_secs: f64,
}

impl<S, L, C> PlaybackEngine<S, L, C>
where
    S: PlaybackSink,
    L: AssetLocator,
    C: CursorSink,
{
    pub fn new(sink: Arc<S>, locator: Arc<L>, cursor: C, config: &EngineConfig) -> Self {
        let resolver = SourceResolver::new(locator, ResolverSettings::from_config(config));
        let switcher = MediaSwitcher::new(
            sink,
            resolver.clone(),
            SwitchSettings::from_config(config),
        );
        Self {
            clips: Arc::from(Vec::<Clip>::new()),
            index: ClipIndex::default(),
            track: config.track_filter(),
            clock: PlaybackClock::new(),
            switcher,
            resolver,
            drift: DriftCorrector::from_config(config),
            cursor,
            state: EngineState::Stopped,
            target: None,
            error: None,
            prefetched: None,
            tick_period: config.tick_rate().period(),
            prefetch_lookahead_secs: config.prefetch_lookahead_secs(),
        }
    }

    /// Replaces the clip list. The index is only rebuilt when `clips` is a
    /// different allocation from the current list.
    ///
    /// Text clips carry no media and are left out of the index.
    pub fn set_clips(&mut self, clips: Arc<[Clip]>) {
        if Arc::ptr_eq(&self.clips, &clips) {
            return;
        }
        self.index = ClipIndex::build(clips.iter().filter(|clip| clip.kind.has_media()));
        self.clips = clips;
        self.resolver.prune(&self.index);

        if let Some(target) = self.target.take() {
            match self.index.get(&target.id) {
                Some(clip) if clip.same_media(&target) => self.target = Some(clip.clone()),
                Some(clip) => {
                    debug!(
                        clip = %target.id,
                        from = %target.source_ref,
                        to = %clip.source_ref,
                        "target clip media changed"
                    );
                    self.resolver.invalidate(&target.id);
                }
                None => debug!(clip = %target.id, "target clip left the timeline"),
            }
        }
        self.prefetched = None;
        info!(
            clips = self.index.len(),
            duration = self.duration(),
            "timeline updated"
        );
    }

    /// Starts playback from the parked position.
    ///
    /// At or past the end of the timeline, playback restarts from zero.
    ///
    /// State transitions:
    /// - `Stopped`/`Paused` → `Playing`
    pub fn start(&mut self) {
        if self.state.is_running() {
            return;
        }
        let mut from = self.clock.now();
        if from >= self.duration() {
            from = 0.0;
        }
        self.clock.start(from);
        self.state = EngineState::Playing;
        self.target = None;
        self.error = None;
        self.drift.reset();
        info!(from, "playback started");
    }

    /// Freezes the cursor and pauses the sink.
    ///
    /// State transitions:
    /// - `Playing`/`Gap` → `Paused`
    pub fn pause(&mut self) {
        if !self.state.is_running() {
            return;
        }
        self.clock.stop();
        self.switcher.pause();
        self.state = EngineState::Paused;
        self.target = None;
        info!(position = self.clock.now(), "playback paused");
    }

    /// Continues from the paused position.
    ///
    /// State transitions:
    /// - `Paused` → `Playing`
    pub fn resume(&mut self) {
        if self.state != EngineState::Paused {
            return;
        }
        let t = self.clock.now();
        self.clock.resume(t);
        self.state = EngineState::Playing;
        self.drift.reset();

        if let Some(clip) = self.index.find_at(self.track, t).cloned() {
            if let Some(task) = self.switcher.resume_from(&clip, t - clip.start_secs) {
                self.target = Some(clip);
                spawn_switch(task);
            }
        }
        info!(position = t, "playback resumed");
    }

    /// Stops playback and rewinds to zero. Any pending switch is cancelled and
    /// the sink is paused before this returns.
    ///
    /// State transitions:
    /// - any → `Stopped`
    pub fn stop(&mut self) {
        self.switcher.stop();
        self.clock.park(0.0);
        self.state = EngineState::Stopped;
        self.target = None;
        self.error = None;
        self.prefetched = None;
        self.drift.reset();
        info!("playback stopped");
    }

    /// Moves the cursor to `to_secs`, clamped to the timeline.
    ///
    /// While running, playback continues from the new position and the clip
    /// there is requested on the next tick. Otherwise only the resting
    /// position changes.
    pub fn seek(&mut self, to_secs: f64) {
        let to = if to_secs.is_nan() {
            0.0
        } else {
            to_secs.clamp(0.0, self.duration())
        };
        self.target = None;
        self.error = None;
        self.drift.reset();
        self.prefetched = None;

        if self.state.is_running() {
            self.clock.start(to);
            self.state = EngineState::Playing;
        } else {
            if self.state == EngineState::Paused {
                self.switcher.stop();
            }
            self.clock.park(to);
        }
        debug!(to, "seek");
    }

    /// Advances playback by one step. Never fails; per-clip problems are
    /// reported through [`status`](Self::status).
    pub fn tick(&mut self) -> TickOutcome {
        if !self.state.is_running() {
            return TickOutcome::Idle;
        }

        let t = self.clock.now();
        let end = self.duration();
        if t >= end {
            self.finish(end);
            return TickOutcome::Ended;
        }

        let outcome = match self.index.find_at(self.track, t).cloned() {
            None => self.enter_gap(),
            Some(clip) if self.target_id() != Some(&clip.id) => self.request(&clip, t),
            Some(clip) => self.follow(&clip, t),
        };
        self.prefetch_next(t);
        self.cursor.publish(t);
        outcome
    }

    /// Ticks at the configured rate until playback stops or reaches the end.
    pub async fn run_until_stopped(&mut self) {
        let mut ticker = tokio::time::interval(self.tick_period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        while self.state.is_running() {
            ticker.tick().await;
            if self.tick() == TickOutcome::Ended {
                break;
            }
        }
    }

    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.state.is_running()
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.state
    }

    #[must_use]
    pub fn status(&self) -> EngineStatus {
        let gapped = self.state == EngineState::Gap;
        EngineStatus {
            gapped,
            current_clip_id: if gapped {
                None
            } else {
                self.target_id().cloned()
            },
            error: self.error.clone(),
        }
    }

    /// Current cursor position.
    #[must_use]
    pub fn position(&self) -> f64 {
        self.clock.now()
    }

    /// End of the last playable clip.
    #[must_use]
    pub fn duration(&self) -> f64 {
        self.index.duration(self.track)
    }

    #[must_use]
    pub fn index(&self) -> &ClipIndex {
        &self.index
    }

    #[must_use]
    pub fn switcher(&self) -> &MediaSwitcher<S, L> {
        &self.switcher
    }

    #[must_use]
    pub fn resolver(&self) -> &SourceResolver<L> {
        &self.resolver
    }

    #[must_use]
    pub fn drift_corrections(&self) -> u64 {
        self.drift.corrections()
    }

    fn target_id(&self) -> Option<&ClipId> {
        self.target.as_ref().map(|clip| &clip.id)
    }

    fn finish(&mut self, end: f64) {
        info!(position = end, "reached end of timeline");
        self.switcher.stop();
        self.clock.park(end);
        self.state = EngineState::Stopped;
        self.target = None;
        self.prefetched = None;
        self.cursor.reached_end(end);
    }

    fn enter_gap(&mut self) -> TickOutcome {
        if self.target.take().is_some() || !self.switcher.sink().is_paused() {
            debug!("entering gap");
            self.switcher.pause();
        }
        self.drift.reset();
        self.state = EngineState::Gap;
        TickOutcome::Gap
    }

    fn request(&mut self, clip: &Clip, t: f64) -> TickOutcome {
        let offset = t - clip.start_secs;
        self.target = Some(clip.clone());
        self.error = None;
        self.drift.reset();
        self.state = EngineState::Playing;
        if let Some(task) = self.switcher.switch_to(clip, offset) {
            spawn_switch(task);
        }
        TickOutcome::Switching(clip.id.clone())
    }

    fn follow(&mut self, clip: &Clip, t: f64) -> TickOutcome {
        match self.switcher.current_state() {
            SwitcherState::Playing(id) if id == clip.id => {
                self.state = EngineState::Playing;
                self.error = None;
                let expected = clip.media_offset(t);
                let actual = self.switcher.sink().position_secs();
                match self.drift.check(actual, expected) {
                    DriftAction::Reseek(position) => {
                        info!(clip = %clip.id, actual, expected, "correcting drift");
                        if let Some(task) = self.switcher.correct(position) {
                            spawn_switch(task);
                        }
                        TickOutcome::Corrected(id)
                    }
                    DriftAction::None => TickOutcome::Steady(id),
                }
            }
            SwitcherState::Error { clip: id, reason } if id == clip.id => {
                if self.state != EngineState::Gap {
                    warn!(clip = %id, %reason, "clip unplayable, treating as gap");
                }
                self.state = EngineState::Gap;
                self.error = Some(reason);
                TickOutcome::Gap
            }
            SwitcherState::Idle => self.request(clip, t),
            _ => TickOutcome::Waiting(clip.id.clone()),
        }
    }

    fn prefetch_next(&mut self, t: f64) {
        if self.prefetch_lookahead_secs <= 0.0 {
            return;
        }
        let Some(next) = self.index.find_next_start(self.track, t) else {
            return;
        };
        if next.start_secs - t > self.prefetch_lookahead_secs
            || self.prefetched.as_ref() == Some(&next.id)
        {
            return;
        }
        self.prefetched = Some(next.id.clone());
        self.resolver.prefetch(next);
    }
}

fn spawn_switch(task: SwitchTask) {
    tokio::spawn(async move {
        if let Err(err) = task.await {
            if !err.is_superseded() {
                debug!(%err, "switch task ended with error");
            }
        }
    });
}
