// SPDX-License-Identifier: MPL-2.0
//! Drift detection between the virtual clock and the sink's own playhead.
//!
//! Sinks run on their own clock and start late after every load, so their
//! position slowly wanders away from the timeline cursor. Small differences
//! are tolerated; past the threshold the sink is re-seeked, but never more
//! than once per correction interval so a slow decoder is not seeked in a loop.

use crate::config::EngineConfig;
use crate::domain::newtypes::{CorrectionInterval, DriftThreshold};
use tokio::time::Instant;

/// What the engine should do about the measured drift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DriftAction {
    /// Sink is close enough, or was corrected too recently.
    None,
    /// Seek the sink to the given source position.
    Reseek(f64),
}

/// Signed drift in seconds. Positive means the sink is ahead of the cursor.
#[must_use]
pub fn drift_secs(sink_position_secs: f64, expected_secs: f64) -> f64 {
    sink_position_secs - expected_secs
}

/// Rate-limited drift corrector for the clip currently playing.
#[derive(Debug, Clone)]
pub struct DriftCorrector {
    threshold: DriftThreshold,
    min_interval: CorrectionInterval,
    last_correction: Option<Instant>,
    corrections: u64,
}

impl DriftCorrector {
    #[must_use]
    pub fn new(threshold: DriftThreshold, min_interval: CorrectionInterval) -> Self {
        Self {
            threshold,
            min_interval,
            last_correction: None,
            corrections: 0,
        }
    }

    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.drift_threshold(), config.correction_interval())
    }

    /// Compares the sink position with the expected one, now.
    pub fn check(&mut self, sink_position_secs: f64, expected_secs: f64) -> DriftAction {
        self.check_at(Instant::now(), sink_position_secs, expected_secs)
    }

    /// Compares the sink position with the expected one at instant `now`.
    ///
    /// A reseek is only returned when the drift exceeds the threshold and the
    /// previous correction is at least one interval old. Returning a reseek
    /// counts as a correction.
    pub fn check_at(
        &mut self,
        now: Instant,
        sink_position_secs: f64,
        expected_secs: f64,
    ) -> DriftAction {
        let drift = drift_secs(sink_position_secs, expected_secs);
        if !self.threshold.is_exceeded_by(drift) {
            return DriftAction::None;
        }
        if let Some(last) = self.last_correction {
            if now.saturating_duration_since(last) < self.min_interval.duration() {
                return DriftAction::None;
            }
        }
        self.last_correction = Some(now);
        self.corrections += 1;
        DriftAction::Reseek(expected_secs)
    }

    /// Forgets the last correction. Called whenever a different clip starts.
    pub fn reset(&mut self) {
        self.last_correction = None;
    }

    /// Number of reseeks issued since creation.
    #[must_use]
    pub fn corrections(&self) -> u64 {
        self.corrections
    }

    #[must_use]
    pub fn threshold(&self) -> DriftThreshold {
        self.threshold
    }
}

impl Default for DriftCorrector {
    fn default() -> Self {
        Self::new(DriftThreshold::default(), CorrectionInterval::default())
    }
}
