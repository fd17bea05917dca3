// SPDX-License-Identifier: MPL-2.0
//! In-process adapters for the playback ports.
//!
//! These model a media element, a signed-URL asset service and a cursor
//! display closely enough to run the engine without a real media stack. The
//! CLI uses them to simulate playback and the test suites use them to observe
//! what the engine asked the sink to do.
//!
//! All timing uses [`tokio::time`], so behaviour is deterministic on a paused
//! runtime.

use crate::application::port::{AssetLocator, CursorSink, LocatorGrant, PlaybackSink, SinkError};
use crate::error::PlaybackError;
use crate::timeline::lock;
use chrono::{TimeDelta, Utc};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

// =============================================================================
// SimulatedSink
// =============================================================================

/// One call received by a [`SimulatedSink`].
#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    SetSource(String),
    Load(String),
    Seek(f64),
    Play,
    Pause,
}

#[derive(Debug, Default)]
struct SinkState {
    source: Option<String>,
    /// Bumped on every `set_source`; a load only completes for its own generation.
    generation: u64,
    ready: bool,
    position_secs: f64,
    playing_since: Option<Instant>,
    skew_secs: f64,
    undecodable: HashSet<String>,
    journal: Vec<SinkCall>,
}

impl SinkState {
    fn position_at(&self, now: Instant) -> f64 {
        let running = self
            .playing_since
            .map_or(0.0, |since| now.saturating_duration_since(since).as_secs_f64());
        self.position_secs + running + self.skew_secs
    }
}

/// A media element model.
///
/// Loading takes a configurable latency. The playhead advances with tokio time
/// while playing. Every call is recorded in a journal.
#[derive(Debug, Default)]
pub struct SimulatedSink {
    state: Mutex<SinkState>,
    load_latency: Duration,
}

impl SimulatedSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_load_latency(load_latency: Duration) -> Self {
        Self {
            state: Mutex::default(),
            load_latency,
        }
    }

    /// Makes every later load of `locator_prefix...` fail to decode.
    pub fn reject_locator(&self, locator_prefix: &str) {
        lock(&self.state)
            .undecodable
            .insert(locator_prefix.to_string());
    }

    /// Shifts the reported playhead by `delta_secs` without seeking, as a
    /// stalling or racing decoder would.
    pub fn nudge(&self, delta_secs: f64) {
        lock(&self.state).skew_secs += delta_secs;
    }

    /// Returns every call received so far.
    #[must_use]
    pub fn journal(&self) -> Vec<SinkCall> {
        lock(&self.state).journal.clone()
    }

    /// Returns the locators passed to `load`, in order.
    #[must_use]
    pub fn loads(&self) -> Vec<String> {
        lock(&self.state)
            .journal
            .iter()
            .filter_map(|call| match call {
                SinkCall::Load(locator) => Some(locator.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the number of `play` calls received.
    #[must_use]
    pub fn plays(&self) -> usize {
        lock(&self.state)
            .journal
            .iter()
            .filter(|call| matches!(call, SinkCall::Play))
            .count()
    }
}

impl PlaybackSink for SimulatedSink {
    fn set_source(&self, locator: &str) {
        let mut state = lock(&self.state);
        state.source = Some(locator.to_string());
        state.generation += 1;
        state.ready = false;
        state.position_secs = 0.0;
        state.playing_since = None;
        state.skew_secs = 0.0;
        state.journal.push(SinkCall::SetSource(locator.to_string()));
    }

    fn current_source(&self) -> Option<String> {
        lock(&self.state).source.clone()
    }

    async fn load(&self) -> Result<(), SinkError> {
        let (generation, source) = {
            let mut state = lock(&self.state);
            let Some(source) = state.source.clone() else {
                return Err(SinkError::NotReady);
            };
            state.journal.push(SinkCall::Load(source.clone()));
            (state.generation, source)
        };

        if !self.load_latency.is_zero() {
            tokio::time::sleep(self.load_latency).await;
        }

        let mut state = lock(&self.state);
        if state.generation != generation {
            return Err(SinkError::Aborted);
        }
        if state
            .undecodable
            .iter()
            .any(|prefix| source.starts_with(prefix.as_str()))
        {
            return Err(SinkError::Decode(format!("cannot decode {source}")));
        }
        state.ready = true;
        Ok(())
    }

    async fn seek(&self, position_secs: f64) -> Result<(), SinkError> {
        let mut state = lock(&self.state);
        if !state.ready {
            return Err(SinkError::NotReady);
        }
        state.position_secs = position_secs;
        state.skew_secs = 0.0;
        if state.playing_since.is_some() {
            state.playing_since = Some(Instant::now());
        }
        state.journal.push(SinkCall::Seek(position_secs));
        Ok(())
    }

    async fn play(&self) -> Result<(), SinkError> {
        let mut state = lock(&self.state);
        if !state.ready {
            return Err(SinkError::NotReady);
        }
        if state.playing_since.is_none() {
            state.playing_since = Some(Instant::now());
        }
        state.journal.push(SinkCall::Play);
        Ok(())
    }

    fn pause(&self) {
        let mut state = lock(&self.state);
        let now = Instant::now();
        if let Some(since) = state.playing_since.take() {
            state.position_secs += now.saturating_duration_since(since).as_secs_f64();
        }
        state.journal.push(SinkCall::Pause);
    }

    fn position_secs(&self) -> f64 {
        lock(&self.state).position_at(Instant::now())
    }

    fn is_ready(&self) -> bool {
        lock(&self.state).ready
    }

    fn is_paused(&self) -> bool {
        lock(&self.state).playing_since.is_none()
    }
}

// =============================================================================
// StaticLocator
// =============================================================================

/// Asset service handing out `base_url/<ref>?expires=<unix>` locators.
#[derive(Debug)]
pub struct StaticLocator {
    base_url: String,
    latency: Duration,
    rejected: Mutex<HashSet<String>>,
    requests: AtomicUsize,
}

impl StaticLocator {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            latency: Duration::ZERO,
            rejected: Mutex::default(),
            requests: AtomicUsize::new(0),
        }
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Refuses every later request for `source_ref`.
    pub fn reject(&self, source_ref: &str) {
        lock(&self.rejected).insert(source_ref.to_string());
    }

    /// Accepts `source_ref` again.
    pub fn allow(&self, source_ref: &str) {
        lock(&self.rejected).remove(source_ref);
    }

    /// Number of `locate` calls received.
    #[must_use]
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl AssetLocator for StaticLocator {
    async fn locate(
        &self,
        source_ref: &str,
        valid_for: Duration,
    ) -> Result<LocatorGrant, PlaybackError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let rejected = lock(&self.rejected).contains(source_ref);
        if rejected {
            return Err(PlaybackError::Resolution {
                reference: source_ref.to_string(),
                reason: "asset unavailable".to_string(),
            });
        }

        let expires = Utc::now() + TimeDelta::from_std(valid_for).unwrap_or(TimeDelta::hours(1));
        let locator = format!(
            "{}/{}?expires={}",
            self.base_url.trim_end_matches('/'),
            source_ref.trim_start_matches('/'),
            expires.timestamp()
        );
        debug!(reference = source_ref, %locator, "issued locator");
        Ok(LocatorGrant { locator, valid_for })
    }
}

// =============================================================================
// Cursor sinks
// =============================================================================

/// Logs the cursor once per whole second of timeline time.
#[derive(Debug, Default)]
pub struct LogCursor {
    last_second: Option<u64>,
}

impl CursorSink for LogCursor {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn publish(&mut self, position_secs: f64) {
        let second = position_secs.max(0.0).floor() as u64;
        if self.last_second != Some(second) {
            self.last_second = Some(second);
            info!(position = %format!("{position_secs:.2}"), "cursor");
        }
    }

    fn reached_end(&mut self, position_secs: f64) {
        info!(position = %format!("{position_secs:.2}"), "end of timeline");
    }
}

/// One event received by a [`RecordingCursor`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CursorEvent {
    Position(f64),
    End(f64),
}

/// Records every published position. Clones share the same record.
#[derive(Debug, Clone, Default)]
pub struct RecordingCursor {
    events: Arc<Mutex<Vec<CursorEvent>>>,
}

impl RecordingCursor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn events(&self) -> Vec<CursorEvent> {
        lock(&self.events).clone()
    }

    /// Returns the last published position, if any.
    #[must_use]
    pub fn last_position(&self) -> Option<f64> {
        lock(&self.events).iter().rev().find_map(|event| match event {
            CursorEvent::Position(t) => Some(*t),
            CursorEvent::End(_) => None,
        })
    }

    #[must_use]
    pub fn ended(&self) -> bool {
        lock(&self.events)
            .iter()
            .any(|event| matches!(event, CursorEvent::End(_)))
    }
}

impl CursorSink for RecordingCursor {
    fn publish(&mut self, position_secs: f64) {
        lock(&self.events).push(CursorEvent::Position(position_secs));
    }

    fn reached_end(&mut self, position_secs: f64) {
        lock(&self.events).push(CursorEvent::End(position_secs));
    }
}
