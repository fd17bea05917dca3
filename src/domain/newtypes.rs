// SPDX-License-Identifier: MPL-2.0
//! Playback tuning newtypes.
//!
//! This module provides type-safe wrappers for the engine's tunable values,
//! ensuring they are always within valid ranges.

use crate::config::defaults::{
    DEFAULT_DRIFT_THRESHOLD_SECS, DEFAULT_FRAME_RATE, DEFAULT_LOAD_TIMEOUT_MS,
    DEFAULT_MIN_CORRECTION_INTERVAL_MS, DEFAULT_TICK_RATE_HZ, MAX_CORRECTION_INTERVAL_MS,
    MAX_DRIFT_THRESHOLD_SECS, MAX_FRAME_RATE, MAX_OPERATION_TIMEOUT_MS, MAX_TICK_RATE_HZ,
    MIN_CORRECTION_INTERVAL_MS, MIN_DRIFT_THRESHOLD_SECS, MIN_FRAME_RATE,
    MIN_OPERATION_TIMEOUT_MS, MIN_TICK_RATE_HZ,
};
use std::time::Duration;

// =============================================================================
// DriftThreshold
// =============================================================================

/// Drift magnitude (in seconds) above which the sink is re-seeked.
///
/// Guaranteed to be within `MIN_DRIFT_THRESHOLD_SECS..=MAX_DRIFT_THRESHOLD_SECS`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DriftThreshold(f64);

impl DriftThreshold {
    /// Creates a new threshold, clamping to valid range.
    ///
    /// NaN falls back to the default.
    #[must_use]
    pub fn new(secs: f64) -> Self {
        if secs.is_nan() {
            return Self::default();
        }
        Self(secs.clamp(MIN_DRIFT_THRESHOLD_SECS, MAX_DRIFT_THRESHOLD_SECS))
    }

    #[must_use]
    pub fn secs(self) -> f64 {
        self.0
    }

    /// Returns true if `drift_secs` (in either direction) exceeds this threshold.
    #[must_use]
    pub fn is_exceeded_by(self, drift_secs: f64) -> bool {
        drift_secs.abs() > self.0
    }
}

impl Default for DriftThreshold {
    fn default() -> Self {
        Self(DEFAULT_DRIFT_THRESHOLD_SECS)
    }
}

// =============================================================================
// CorrectionInterval
// =============================================================================

/// Minimum time between two drift corrections of the same clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrectionInterval(Duration);

impl CorrectionInterval {
    /// Creates a new interval from milliseconds, clamping to valid range.
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(
            ms.clamp(MIN_CORRECTION_INTERVAL_MS, MAX_CORRECTION_INTERVAL_MS),
        ))
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        self.0
    }
}

impl Default for CorrectionInterval {
    fn default() -> Self {
        Self::from_millis(DEFAULT_MIN_CORRECTION_INTERVAL_MS)
    }
}

// =============================================================================
// OperationTimeout
// =============================================================================

/// Upper bound on a single resolve or load step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationTimeout(Duration);

impl OperationTimeout {
    /// Creates a new timeout from milliseconds, clamping to valid range.
    #[must_use]
    pub fn from_millis(ms: u64) -> Self {
        Self(Duration::from_millis(
            ms.clamp(MIN_OPERATION_TIMEOUT_MS, MAX_OPERATION_TIMEOUT_MS),
        ))
    }

    #[must_use]
    pub fn duration(self) -> Duration {
        self.0
    }
}

impl Default for OperationTimeout {
    fn default() -> Self {
        Self::from_millis(DEFAULT_LOAD_TIMEOUT_MS)
    }
}

// =============================================================================
// TickRate
// =============================================================================

/// Number of playback ticks per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickRate(u32);

impl TickRate {
    /// Creates a new tick rate, clamping to valid range.
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz.clamp(MIN_TICK_RATE_HZ, MAX_TICK_RATE_HZ))
    }

    #[must_use]
    pub fn hz(self) -> u32 {
        self.0
    }

    /// Returns the time between two ticks.
    #[must_use]
    pub fn period(self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.0))
    }
}

impl Default for TickRate {
    fn default() -> Self {
        Self(DEFAULT_TICK_RATE_HZ)
    }
}

// =============================================================================
// FrameRate
// =============================================================================

/// Timeline frame rate. One frame is the tolerance for seek accuracy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameRate(f64);

impl FrameRate {
    /// Creates a new frame rate, clamping to valid range.
    ///
    /// NaN falls back to the default.
    #[must_use]
    pub fn new(fps: f64) -> Self {
        if fps.is_nan() {
            return Self::default();
        }
        Self(fps.clamp(MIN_FRAME_RATE, MAX_FRAME_RATE))
    }

    #[must_use]
    pub fn fps(self) -> f64 {
        self.0
    }

    /// Returns the duration of one frame in seconds.
    #[must_use]
    pub fn frame_secs(self) -> f64 {
        1.0 / self.0
    }
}

impl Default for FrameRate {
    fn default() -> Self {
        Self(DEFAULT_FRAME_RATE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::assert_abs_diff_eq;

    #[test]
    fn drift_threshold_clamps_to_valid_range() {
        assert_eq!(DriftThreshold::new(0.01).secs(), MIN_DRIFT_THRESHOLD_SECS);
        assert_eq!(DriftThreshold::new(10.0).secs(), MAX_DRIFT_THRESHOLD_SECS);
        assert_eq!(DriftThreshold::new(0.75).secs(), 0.75);
    }

    #[test]
    fn drift_threshold_nan_uses_default() {
        assert_eq!(DriftThreshold::new(f64::NAN), DriftThreshold::default());
    }

    #[test]
    fn drift_threshold_compares_magnitude() {
        let threshold = DriftThreshold::new(0.5);
        assert!(threshold.is_exceeded_by(0.6));
        assert!(threshold.is_exceeded_by(-0.6));
        assert!(!threshold.is_exceeded_by(0.5));
        assert!(!threshold.is_exceeded_by(-0.2));
    }

    #[test]
    fn correction_interval_clamps_to_valid_range() {
        assert_eq!(
            CorrectionInterval::from_millis(0).duration(),
            Duration::from_millis(MIN_CORRECTION_INTERVAL_MS)
        );
        assert_eq!(
            CorrectionInterval::from_millis(u64::MAX).duration(),
            Duration::from_millis(MAX_CORRECTION_INTERVAL_MS)
        );
    }

    #[test]
    fn operation_timeout_defaults_to_load_timeout() {
        assert_eq!(
            OperationTimeout::default().duration(),
            Duration::from_millis(DEFAULT_LOAD_TIMEOUT_MS)
        );
        assert_eq!(
            OperationTimeout::from_millis(1).duration(),
            Duration::from_millis(MIN_OPERATION_TIMEOUT_MS)
        );
    }

    #[test]
    fn tick_rate_period_matches_frequency() {
        let rate = TickRate::new(20);
        assert_eq!(rate.period(), Duration::from_millis(50));
        assert_eq!(TickRate::new(0).hz(), MIN_TICK_RATE_HZ);
        assert_eq!(TickRate::new(10_000).hz(), MAX_TICK_RATE_HZ);
    }

    #[test]
    fn frame_rate_gives_frame_duration() {
        assert_abs_diff_eq!(FrameRate::new(25.0).frame_secs(), 0.04, epsilon = 1e-12);
        assert_eq!(FrameRate::new(0.0).fps(), MIN_FRAME_RATE);
        assert_eq!(FrameRate::new(f64::NAN), FrameRate::default());
    }
}
