// SPDX-License-Identifier: MPL-2.0
//! Virtual timeline clock.
//!
//! The timeline position is derived from wall time, never from the sink:
//!
//! ```text
//! now = anchor.virtual_start_secs + (wall_now - anchor.wall_clock_start)
//! ```
//!
//! The anchor is replaced on every start, resume and seek, and dropped on
//! stop. While no anchor exists the clock reports its parked position.
//!
//! Wall time is read from [`tokio::time::Instant`], so tests running on a
//! paused runtime control it with `tokio::time::advance`.

use tokio::time::Instant;

/// Wall-clock instant paired with the timeline position it corresponds to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackAnchor {
    pub wall_clock_start: Instant,
    pub virtual_start_secs: f64,
}

impl PlaybackAnchor {
    /// Anchors `virtual_start_secs` at the current instant.
    #[must_use]
    pub fn now(virtual_start_secs: f64) -> Self {
        Self {
            wall_clock_start: Instant::now(),
            virtual_start_secs,
        }
    }

    /// Timeline position at wall-clock instant `at`.
    ///
    /// Instants before the anchor map to the anchor position.
    #[must_use]
    pub fn position_at(&self, at: Instant) -> f64 {
        self.virtual_start_secs
            + at.saturating_duration_since(self.wall_clock_start)
                .as_secs_f64()
    }
}

/// Timeline clock driven by wall time.
#[derive(Debug, Default)]
pub struct PlaybackClock {
    anchor: Option<PlaybackAnchor>,
    parked_secs: f64,
}

impl PlaybackClock {
    /// Creates a stopped clock parked at zero.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts advancing from `virtual_start_secs`.
    ///
    /// Negative and NaN positions start from zero.
    pub fn start(&mut self, virtual_start_secs: f64) {
        self.anchor = Some(PlaybackAnchor::now(sanitize(virtual_start_secs)));
    }

    /// Continues advancing from `virtual_start_secs` with a fresh anchor.
    pub fn resume(&mut self, virtual_start_secs: f64) {
        self.start(virtual_start_secs);
    }

    /// Freezes the clock at its current position and drops the anchor.
    pub fn stop(&mut self) {
        self.parked_secs = self.now();
        self.anchor = None;
    }

    /// Drops the anchor and rests the clock at `position_secs`.
    pub fn park(&mut self, position_secs: f64) {
        self.anchor = None;
        self.parked_secs = sanitize(position_secs);
    }

    /// Current timeline position.
    #[must_use]
    pub fn now(&self) -> f64 {
        self.now_at(Instant::now())
    }

    /// Timeline position at wall-clock instant `at`.
    #[must_use]
    pub fn now_at(&self, at: Instant) -> f64 {
        match self.anchor {
            Some(anchor) => anchor.position_at(at),
            None => self.parked_secs,
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.anchor.is_some()
    }

    #[must_use]
    pub fn anchor(&self) -> Option<PlaybackAnchor> {
        self.anchor
    }
}

fn sanitize(secs: f64) -> f64 {
    if secs.is_nan() {
        0.0
    } else {
        secs.max(0.0)
    }
}
