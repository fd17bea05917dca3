// SPDX-License-Identifier: MPL-2.0
//! Media switcher: the single writer of the sink's source and play state.
//!
//! Every request to show a clip goes through [`MediaSwitcher::switch_to`]. The
//! bookkeeping happens immediately; the slow part (resolve, load, seek, play)
//! is returned as a [`SwitchTask`] for the caller to spawn.
//!
//! # Re-entrancy
//!
//! - A request for the clip already being loaded is a no-op (`None`).
//! - A request for another clip cancels the in-flight attempt and starts a
//!   new one. Each attempt owns a cancellation token and checks it before
//!   every sink mutation, so only the most recent request can reach the sink.
//!
//! # States
//!
//! ```text
//! Idle ──switch_to──▶ Loading(c) ──loaded──▶ Ready(c) ──seek+play──▶ Playing(c)
//! Playing(a) ──switch_to(b)──▶ Switching(a, b) ──seek+play──▶ Playing(b)
//! any in-flight state ──failure/timeout──▶ Error(c, reason)
//! any state ──pause/stop──▶ Idle
//! ```

use super::lock;
use super::resolver::SourceResolver;
use crate::application::port::{AssetLocator, PlaybackSink, SinkError};
use crate::config::EngineConfig;
use crate::domain::{Clip, ClipId};
use crate::error::{PlaybackError, TimeoutStage};
use futures_util::future::{BoxFuture, FutureExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Cancellation token for one switch attempt.
pub type CancellationToken = Arc<AtomicBool>;

/// Checks if the cancellation token has been triggered.
#[must_use]
pub fn is_cancelled(token: &CancellationToken) -> bool {
    token.load(Ordering::SeqCst)
}

/// Future driving one switch attempt to completion.
///
/// Resolves to `Err(PlaybackError::Superseded)` when a newer request, a pause
/// or a stop took over; other errors have already been recorded in the
/// switcher state.
pub type SwitchTask = BoxFuture<'static, Result<(), PlaybackError>>;

/// Switcher state, one per sink.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum SwitcherState {
    /// Nothing is playing and nothing is being loaded.
    #[default]
    Idle,
    /// Resolving or loading the clip's source.
    Loading(ClipId),
    /// Source loaded; seeking and starting playback.
    Ready(ClipId),
    /// The clip is playing.
    Playing(ClipId),
    /// Moving from one playing clip to another.
    Switching { from: ClipId, to: ClipId },
    /// The last attempt for the clip failed.
    Error { clip: ClipId, reason: String },
}

impl SwitcherState {
    /// The clip this state is about: the target for in-flight states.
    #[must_use]
    pub fn clip(&self) -> Option<&ClipId> {
        match self {
            SwitcherState::Idle => None,
            SwitcherState::Loading(clip)
            | SwitcherState::Ready(clip)
            | SwitcherState::Playing(clip)
            | SwitcherState::Switching { to: clip, .. }
            | SwitcherState::Error { clip, .. } => Some(clip),
        }
    }

    /// Returns true while an attempt has not settled yet.
    #[must_use]
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            SwitcherState::Loading(_) | SwitcherState::Ready(_) | SwitcherState::Switching { .. }
        )
    }

    #[must_use]
    pub fn is_playing(&self, clip: &ClipId) -> bool {
        matches!(self, SwitcherState::Playing(playing) if playing == clip)
    }

    #[must_use]
    pub fn is_error(&self) -> bool {
        matches!(self, SwitcherState::Error { .. })
    }
}

/// Switcher tuning.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwitchSettings {
    /// Bound on how long the sink may take to become seekable.
    pub load_timeout: Duration,
    /// Distance from the requested offset at which a landed seek is reported.
    pub frame_tolerance_secs: f64,
}

impl SwitchSettings {
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            load_timeout: config.load_timeout().duration(),
            frame_tolerance_secs: config.frame_rate().frame_secs(),
        }
    }
}

impl Default for SwitchSettings {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}

struct InFlight {
    clip: Clip,
    offset_secs: f64,
    token: CancellationToken,
}

#[derive(Default)]
struct SwitcherShared {
    state: SwitcherState,
    in_flight: Option<InFlight>,
    /// Clip most recently committed to the sink.
    committed: Option<Clip>,
    /// Where `resume` picks up after a pause.
    resume_point: Option<(Clip, f64)>,
    attempts: u64,
}

/// Drives the playback sink from clip requests.
pub struct MediaSwitcher<S, L> {
    sink: Arc<S>,
    resolver: SourceResolver<L>,
    settings: SwitchSettings,
    shared: Arc<Mutex<SwitcherShared>>,
}

impl<S, L> Clone for MediaSwitcher<S, L> {
    fn clone(&self) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            resolver: self.resolver.clone(),
            settings: self.settings,
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<S: PlaybackSink, L: AssetLocator> MediaSwitcher<S, L> {
    #[must_use]
    pub fn new(sink: Arc<S>, resolver: SourceResolver<L>, settings: SwitchSettings) -> Self {
        Self {
            sink,
            resolver,
            settings,
            shared: Arc::new(Mutex::new(SwitcherShared::default())),
        }
    }

    /// Requests that `clip` play from `offset_secs` into the clip.
    ///
    /// Returns `None` when the same clip (with the same media) is already
    /// being brought up.
    /// Otherwise the previous attempt (if any) is cancelled, the state moves
    /// to `Loading`, `Switching` or (same clip while playing) `Ready`, and the
    /// returned task performs the actual sink work.
    ///
    /// State transitions:
    /// - `Idle`/`Error` → `Loading(clip)`
    /// - `Loading(other)` → `Loading(clip)`
    /// - `Playing(other)` / `Switching(from, other)` → `Switching(from, clip)`
    /// - `Playing(clip)` → `Ready(clip)` (seek only)
    #[must_use = "the returned task must be spawned or awaited"]
    pub fn switch_to(&self, clip: &Clip, offset_secs: f64) -> Option<SwitchTask> {
        let mut guard = lock(&self.shared);
        let shared = &mut *guard;

        let pending_same = shared
            .in_flight
            .as_ref()
            .is_some_and(|pending| pending.clip.same_media(clip));
        if shared.state.is_in_flight() && shared.state.clip() == Some(&clip.id) && pending_same {
            debug!(clip = %clip.id, "switch already in flight");
            return None;
        }

        if let Some(previous) = shared.in_flight.take() {
            previous.token.store(true, Ordering::SeqCst);
            debug!(superseded = %previous.clip.id, by = %clip.id, "cancelling switch attempt");
        }

        shared.state = match &shared.state {
            SwitcherState::Playing(from) if *from == clip.id => SwitcherState::Ready(clip.id.clone()),
            SwitcherState::Playing(from) | SwitcherState::Switching { from, .. } => {
                SwitcherState::Switching {
                    from: from.clone(),
                    to: clip.id.clone(),
                }
            }
            _ => SwitcherState::Loading(clip.id.clone()),
        };

        let token = CancellationToken::default();
        shared.in_flight = Some(InFlight {
            clip: clip.clone(),
            offset_secs,
            token: Arc::clone(&token),
        });
        shared.attempts += 1;
        drop(guard);

        info!(clip = %clip.id, offset = offset_secs, "switching clip");
        let attempt = Attempt {
            sink: Arc::clone(&self.sink),
            resolver: self.resolver.clone(),
            shared: Arc::clone(&self.shared),
            settings: self.settings,
            clip: clip.clone(),
            offset_secs,
            token,
        };
        Some(attempt.run().boxed())
    }

    /// Cancels any pending attempt, pauses the sink and remembers where to resume.
    ///
    /// State transitions:
    /// - any → `Idle`
    pub fn pause(&self) {
        let mut guard = lock(&self.shared);
        let shared = &mut *guard;
        if let Some(pending) = shared.in_flight.take() {
            pending.token.store(true, Ordering::SeqCst);
            shared.resume_point = Some((pending.clip, pending.offset_secs));
        } else if let (SwitcherState::Playing(_), Some(clip)) = (&shared.state, &shared.committed) {
            let offset = (self.sink.position_secs() - clip.in_point_secs).max(0.0);
            shared.resume_point = Some((clip.clone(), offset));
        }
        shared.state = SwitcherState::Idle;
        self.sink.pause();
        debug!("switcher paused");
    }

    /// Replays the clip that was showing when `pause` was called.
    ///
    /// Returns `None` if there is nothing to resume.
    #[must_use = "the returned task must be spawned or awaited"]
    pub fn resume(&self) -> Option<SwitchTask> {
        let (clip, offset_secs) = lock(&self.shared).resume_point.take()?;
        self.switch_to(&clip, offset_secs)
    }

    /// Brings back the paused clip at `offset_secs` into `clip`, which is the
    /// clip's current version.
    ///
    /// Returns `None` (and keeps the resume point) if `clip` is not the clip
    /// that was paused.
    #[must_use = "the returned task must be spawned or awaited"]
    pub fn resume_from(&self, clip: &Clip, offset_secs: f64) -> Option<SwitchTask> {
        {
            let mut shared = lock(&self.shared);
            let paused_here = shared
                .resume_point
                .as_ref()
                .is_some_and(|(paused, _)| paused.id == clip.id);
            if !paused_here {
                return None;
            }
            shared.resume_point = None;
        }
        self.switch_to(clip, offset_secs)
    }

    /// Like [`pause`](Self::pause), but also forgets the resume point.
    pub fn stop(&self) {
        let mut guard = lock(&self.shared);
        if let Some(pending) = guard.in_flight.take() {
            pending.token.store(true, Ordering::SeqCst);
        }
        guard.state = SwitcherState::Idle;
        guard.resume_point = None;
        self.sink.pause();
        info!("switcher stopped");
    }

    /// Re-seeks the playing clip to `position_secs` of source media.
    ///
    /// Returns `None` unless a clip is playing. The task does nothing (and
    /// yields [`PlaybackError::Superseded`]) if another switch started before
    /// it ran.
    #[must_use = "the returned task must be spawned or awaited"]
    pub fn correct(&self, position_secs: f64) -> Option<SwitchTask> {
        let clip = {
            let shared = lock(&self.shared);
            match &shared.state {
                SwitcherState::Playing(clip) => clip.clone(),
                _ => return None,
            }
        };
        let sink = Arc::clone(&self.sink);
        let shared = Arc::clone(&self.shared);
        Some(
            async move {
                let still_playing = {
                    let guard = lock(&shared);
                    guard.in_flight.is_none() && guard.state.is_playing(&clip)
                };
                if !still_playing {
                    debug!(clip = %clip, "drift correction superseded");
                    return Err(PlaybackError::Superseded(clip));
                }
                sink.seek(position_secs)
                    .await
                    .map_err(|err| PlaybackError::Load {
                        clip,
                        reason: err.to_string(),
                    })
            }
            .boxed(),
        )
    }

    #[must_use]
    pub fn current_state(&self) -> SwitcherState {
        lock(&self.shared).state.clone()
    }

    /// Clip that `resume` would bring back.
    #[must_use]
    pub fn resume_clip(&self) -> Option<ClipId> {
        lock(&self.shared)
            .resume_point
            .as_ref()
            .map(|(clip, _)| clip.id.clone())
    }

    /// Number of switch attempts started.
    #[must_use]
    pub fn attempts(&self) -> u64 {
        lock(&self.shared).attempts
    }

    #[must_use]
    pub fn sink(&self) -> &Arc<S> {
        &self.sink
    }

    #[must_use]
    pub fn resolver(&self) -> &SourceResolver<L> {
        &self.resolver
    }
}

/// One switch attempt, owned by its spawned task.
struct Attempt<S, L> {
    sink: Arc<S>,
    resolver: SourceResolver<L>,
    shared: Arc<Mutex<SwitcherShared>>,
    settings: SwitchSettings,
    clip: Clip,
    offset_secs: f64,
    token: CancellationToken,
}

impl<S: PlaybackSink, L: AssetLocator> Attempt<S, L> {
    async fn run(self) -> Result<(), PlaybackError> {
        let outcome = self.drive().await;
        self.settle(outcome)
    }

    async fn drive(&self) -> Result<(), PlaybackError> {
        let source = self.resolver.resolve(&self.clip).await?;
        self.ensure_current()?;

        let loaded = self.sink.is_ready()
            && self.sink.current_source().as_deref() == Some(source.locator.as_str());
        if loaded {
            debug!(clip = %self.clip.id, "source already loaded");
        } else {
            self.while_current(|sink| sink.set_source(&source.locator))?;
            self.load().await?;
        }
        self.mark_ready()?;

        let position = self.clip.in_point_secs + self.offset_secs;
        self.sink
            .seek(position)
            .await
            .map_err(|err| self.sink_error(err))?;
        self.ensure_current()?;
        self.sink.play().await.map_err(|err| self.sink_error(err))
    }

    async fn load(&self) -> Result<(), PlaybackError> {
        match tokio::time::timeout(self.settings.load_timeout, self.sink.load()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(SinkError::Aborted)) => Err(PlaybackError::Superseded(self.clip.id.clone())),
            Ok(Err(err)) => Err(self.sink_error(err)),
            Err(_) => Err(PlaybackError::Timeout {
                stage: TimeoutStage::Load,
                target: self.clip.id.to_string(),
                after: self.settings.load_timeout,
            }),
        }
    }

    fn ensure_current(&self) -> Result<(), PlaybackError> {
        if is_cancelled(&self.token) {
            Err(PlaybackError::Superseded(self.clip.id.clone()))
        } else {
            Ok(())
        }
    }

    /// Applies `mutate` to the sink unless the attempt was cancelled.
    ///
    /// Runs under the switcher lock so a concurrent pause or stop either sees
    /// the mutation or prevents it.
    fn while_current(&self, mutate: impl FnOnce(&S)) -> Result<(), PlaybackError> {
        let _guard = lock(&self.shared);
        self.ensure_current()?;
        mutate(&self.sink);
        Ok(())
    }

    fn mark_ready(&self) -> Result<(), PlaybackError> {
        let mut shared = lock(&self.shared);
        self.ensure_current()?;
        if matches!(shared.state, SwitcherState::Loading(_)) {
            shared.state = SwitcherState::Ready(self.clip.id.clone());
        }
        Ok(())
    }

    fn sink_error(&self, err: SinkError) -> PlaybackError {
        PlaybackError::Load {
            clip: self.clip.id.clone(),
            reason: err.to_string(),
        }
    }

    /// Commits the outcome unless a newer request took over.
    fn settle(&self, outcome: Result<(), PlaybackError>) -> Result<(), PlaybackError> {
        let mut guard = lock(&self.shared);
        let shared = &mut *guard;

        if is_cancelled(&self.token) {
            // A pause or stop may have landed after our play; nobody else owns the sink.
            if shared.in_flight.is_none()
                && matches!(shared.state, SwitcherState::Idle | SwitcherState::Error { .. })
            {
                self.sink.pause();
            }
            debug!(clip = %self.clip.id, "switch attempt superseded");
            return Err(PlaybackError::Superseded(self.clip.id.clone()));
        }

        shared.in_flight = None;
        match outcome {
            Ok(()) => {
                let wanted = self.clip.in_point_secs + self.offset_secs;
                let landed = self.sink.position_secs();
                if (landed - wanted).abs() > self.settings.frame_tolerance_secs {
                    debug!(clip = %self.clip.id, wanted, landed, "sink landed off target");
                }
                shared.state = SwitcherState::Playing(self.clip.id.clone());
                shared.committed = Some(self.clip.clone());
                info!(clip = %self.clip.id, "clip playing");
                Ok(())
            }
            Err(err) => {
                shared.state = SwitcherState::Error {
                    clip: self.clip.id.clone(),
                    reason: err.to_string(),
                };
                shared.committed = None;
                self.sink.pause();
                warn!(clip = %self.clip.id, kind = err.kind(), %err, "switch failed");
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::simulated::{SimulatedSink, SinkCall, StaticLocator};
    use crate::test_utils::{assert_abs_diff_eq, settle};
    use crate::timeline::resolver::ResolverSettings;

    type TestSwitcher = MediaSwitcher<SimulatedSink, StaticLocator>;

    fn switcher_with(sink: SimulatedSink, locator: StaticLocator) -> (TestSwitcher, Arc<SimulatedSink>, Arc<StaticLocator>) {
        let sink = Arc::new(sink);
        let locator = Arc::new(locator);
        let resolver = SourceResolver::new(Arc::clone(&locator), ResolverSettings::default());
        let switcher = MediaSwitcher::new(Arc::clone(&sink), resolver, SwitchSettings::default());
        (switcher, sink, locator)
    }

    fn switcher() -> (TestSwitcher, Arc<SimulatedSink>, Arc<StaticLocator>) {
        switcher_with(SimulatedSink::new(), StaticLocator::new("https://cdn.test"))
    }

    fn clip(id: &str, source: &str) -> Clip {
        Clip::new(id, 0, 0.0, 10.0, source)
    }

    #[tokio::test(start_paused = true)]
    async fn switch_from_idle_loads_seeks_then_plays() {
        let (switcher, sink, _) = switcher();
        let c1 = clip("c1", "a.mp4");

        let task = switcher.switch_to(&c1, 2.0).expect("task");
        assert_eq!(switcher.current_state(), SwitcherState::Loading(c1.id.clone()));
        task.await.unwrap();

        assert_eq!(switcher.current_state(), SwitcherState::Playing(c1.id.clone()));
        let journal = sink.journal();
        assert!(matches!(journal[0], SinkCall::SetSource(_)));
        assert!(matches!(journal[1], SinkCall::Load(_)));
        assert_eq!(journal[2], SinkCall::Seek(2.0));
        assert_eq!(journal[3], SinkCall::Play);
        assert_abs_diff_eq!(sink.position_secs(), 2.0, epsilon = 1.0 / 30.0);
    }

    #[tokio::test(start_paused = true)]
    async fn in_point_is_added_to_seek_offset() {
        let (switcher, sink, _) = switcher();
        let trimmed = clip("c1", "a.mp4").with_in_point(30.0);

        switcher.switch_to(&trimmed, 1.5).unwrap().await.unwrap();
        assert!(sink.journal().contains(&SinkCall::Seek(31.5)));
    }

    #[tokio::test(start_paused = true)]
    async fn same_target_while_loading_is_a_no_op() {
        let (switcher, sink, _) =
            switcher_with(SimulatedSink::with_load_latency(Duration::from_millis(500)), StaticLocator::new("https://cdn.test"));
        let c1 = clip("c1", "a.mp4");

        let task = switcher.switch_to(&c1, 0.0).expect("first request");
        assert!(switcher.switch_to(&c1, 0.1).is_none());
        assert!(switcher.switch_to(&c1, 0.2).is_none());
        task.await.unwrap();

        assert_eq!(switcher.attempts(), 1);
        assert_eq!(sink.loads().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_target_supersedes_pending_one() {
        let (switcher, sink, _) =
            switcher_with(SimulatedSink::with_load_latency(Duration::from_millis(500)), StaticLocator::new("https://cdn.test"));
        let c1 = clip("c1", "a.mp4");
        let c2 = clip("c2", "b.mp4");

        let first = tokio::spawn(switcher.switch_to(&c1, 0.0).unwrap());
        settle().await;
        let second = switcher.switch_to(&c2, 1.0).unwrap();
        assert_eq!(switcher.current_state(), SwitcherState::Loading(c2.id.clone()));

        let (first, second) = tokio::join!(first, second);
        assert!(first.unwrap().unwrap_err().is_superseded());
        second.unwrap();

        assert_eq!(switcher.current_state(), SwitcherState::Playing(c2.id.clone()));
        assert_eq!(sink.plays(), 1);
        assert!(sink.current_source().unwrap().contains("b.mp4"));
    }

    #[tokio::test(start_paused = true)]
    async fn switching_between_playing_clips_reports_both() {
        let (switcher, _, _) = switcher();
        let c1 = clip("c1", "a.mp4");
        let c2 = clip("c2", "b.mp4");
        switcher.switch_to(&c1, 0.0).unwrap().await.unwrap();

        let task = switcher.switch_to(&c2, 0.0).unwrap();
        assert_eq!(
            switcher.current_state(),
            SwitcherState::Switching {
                from: c1.id.clone(),
                to: c2.id.clone()
            }
        );
        task.await.unwrap();
        assert_eq!(switcher.current_state(), SwitcherState::Playing(c2.id.clone()));
    }

    #[tokio::test(start_paused = true)]
    async fn same_clip_while_playing_only_seeks() {
        let (switcher, sink, _) = switcher();
        let c1 = clip("c1", "a.mp4");
        switcher.switch_to(&c1, 0.0).unwrap().await.unwrap();

        let task = switcher.switch_to(&c1, 6.0).unwrap();
        assert_eq!(switcher.current_state(), SwitcherState::Ready(c1.id.clone()));
        task.await.unwrap();

        assert_eq!(sink.loads().len(), 1);
        assert_eq!(sink.journal().last(), Some(&SinkCall::Play));
        assert!(sink.journal().contains(&SinkCall::Seek(6.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn clips_sharing_media_reuse_the_loaded_source() {
        let (switcher, sink, locator) = switcher();
        let first = clip("c1", "shared.mp4");
        let second = clip("c2", "shared.mp4").with_in_point(40.0);

        switcher.switch_to(&first, 0.0).unwrap().await.unwrap();
        switcher.switch_to(&second, 0.0).unwrap().await.unwrap();

        assert_eq!(sink.loads().len(), 1);
        assert_eq!(locator.requests(), 1);
        assert!(sink.journal().contains(&SinkCall::Seek(40.0)));
    }

    #[tokio::test(start_paused = true)]
    async fn resolution_failure_enters_error_state() {
        let (switcher, sink, locator) = switcher();
        locator.reject("missing.mp4");
        let broken = clip("c1", "missing.mp4");

        let err = switcher.switch_to(&broken, 0.0).unwrap().await.unwrap_err();
        assert_eq!(err.kind(), "resolution");
        match switcher.current_state() {
            SwitcherState::Error { clip, reason } => {
                assert_eq!(clip, broken.id);
                assert!(reason.contains("missing.mp4"));
            }
            other => panic!("expected error state, got {other:?}"),
        }
        assert!(sink.is_paused());
        assert!(sink.loads().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_load_times_out() {
        let (switcher, sink, _) = switcher_with(
            SimulatedSink::with_load_latency(Duration::from_secs(20)),
            StaticLocator::new("https://cdn.test"),
        );
        let c1 = clip("c1", "a.mp4");

        let err = switcher.switch_to(&c1, 0.0).unwrap().await.unwrap_err();
        assert!(matches!(
            err,
            PlaybackError::Timeout {
                stage: TimeoutStage::Load,
                ..
            }
        ));
        assert!(switcher.current_state().is_error());
        assert_eq!(sink.plays(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn decode_failure_is_a_load_error() {
        let (switcher, sink, _) = switcher();
        sink.reject_locator("https://cdn.test/bad.mp4");

        let err = switcher
            .switch_to(&clip("c1", "bad.mp4"), 0.0)
            .unwrap()
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "load");
        assert!(switcher.current_state().is_error());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_during_pending_switch_leaves_sink_paused() {
        let (switcher, sink, _) =
            switcher_with(SimulatedSink::with_load_latency(Duration::from_millis(500)), StaticLocator::new("https://cdn.test"));
        let c1 = clip("c1", "a.mp4");

        let task = tokio::spawn(switcher.switch_to(&c1, 0.0).unwrap());
        settle().await;
        switcher.stop();

        assert!(task.await.unwrap().unwrap_err().is_superseded());
        assert_eq!(switcher.current_state(), SwitcherState::Idle);
        assert!(sink.is_paused());
        assert_eq!(sink.plays(), 0);
        assert!(switcher.resume().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_then_resume_continues_without_reloading() {
        let (switcher, sink, _) = switcher();
        let c1 = clip("c1", "a.mp4");
        switcher.switch_to(&c1, 1.0).unwrap().await.unwrap();

        tokio::time::advance(Duration::from_secs(2)).await;
        switcher.pause();
        assert_eq!(switcher.current_state(), SwitcherState::Idle);
        assert_eq!(switcher.resume_clip(), Some(c1.id.clone()));
        assert!(sink.is_paused());

        switcher.resume().expect("resume task").await.unwrap();
        assert_eq!(switcher.current_state(), SwitcherState::Playing(c1.id.clone()));
        assert_eq!(sink.loads().len(), 1);
        assert_abs_diff_eq!(sink.position_secs(), 3.0, epsilon = 1e-6);
    }

    #[tokio::test(start_paused = true)]
    async fn correct_reseeks_only_while_playing() {
        let (switcher, sink, _) = switcher();
        let c1 = clip("c1", "a.mp4");
        assert!(switcher.correct(1.0).is_none());

        switcher.switch_to(&c1, 0.0).unwrap().await.unwrap();
        sink.nudge(2.0);
        switcher.correct(0.0).expect("correction").await.unwrap();
        assert_abs_diff_eq!(sink.position_secs(), 0.0, epsilon = 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn same_clip_with_new_media_while_loading_starts_new_attempt() {
        let (switcher, sink, _) = switcher_with(
            SimulatedSink::with_load_latency(Duration::from_millis(500)),
            StaticLocator::new("https://cdn.test"),
        );
        let old = clip("c1", "old.mp4");
        let edited = clip("c1", "new.mp4");

        let first = tokio::spawn(switcher.switch_to(&old, 0.0).unwrap());
        settle().await;
        let second = switcher
            .switch_to(&edited, 0.0)
            .expect("edited media must not be a no-op");

        second.await.unwrap();
        assert!(first.await.unwrap().unwrap_err().is_superseded());
        assert_eq!(switcher.attempts(), 2);
        let source = sink.current_source().unwrap_or_default();
        assert!(source.contains("new.mp4"), "source was {source}");
    }

    #[tokio::test(start_paused = true)]
    async fn resume_from_uses_the_given_offset() {
        let (switcher, sink, _) = switcher_with(
            SimulatedSink::with_load_latency(Duration::from_secs(4)),
            StaticLocator::new("https://cdn.test"),
        );
        let c1 = clip("c1", "a.mp4");

        let first = tokio::spawn(switcher.switch_to(&c1, 0.0).unwrap());
        settle().await;
        tokio::time::advance(Duration::from_secs(3)).await;
        switcher.pause();

        assert!(switcher.resume_from(&clip("c2", "b.mp4"), 1.0).is_none());
        assert_eq!(switcher.resume_clip(), Some(c1.id.clone()));

        let resumed = tokio::spawn(switcher.resume_from(&c1, 3.0).expect("resume task"));
        tokio::time::advance(Duration::from_secs(5)).await;
        settle().await;

        assert!(first.await.unwrap().unwrap_err().is_superseded());
        resumed.await.unwrap().unwrap();
        let seeks: Vec<SinkCall> = sink
            .journal()
            .into_iter()
            .filter(|call| matches!(call, SinkCall::Seek(_)))
            .collect();
        assert_eq!(seeks, vec![SinkCall::Seek(3.0)]);
        assert_eq!(switcher.resume_clip(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn correction_is_dropped_when_a_switch_starts_first() {
        let (switcher, sink, _) = switcher();
        let c1 = clip("c1", "a.mp4");
        let c2 = clip("c2", "b.mp4");
        switcher.switch_to(&c1, 0.0).unwrap().await.unwrap();

        let correction = switcher.correct(2.0).expect("correction");
        let switch = switcher.switch_to(&c2, 0.0).unwrap();

        assert!(correction.await.unwrap_err().is_superseded());
        switch.await.unwrap();
        assert!(!sink.journal().contains(&SinkCall::Seek(2.0)));
        assert_eq!(switcher.current_state(), SwitcherState::Playing(c2.id.clone()));
    }
}
