// SPDX-License-Identifier: MPL-2.0
//! Test utilities for float comparisons, paused-clock scheduling and clip fixtures.
//!
//! This module re-exports the `approx` crate's assertion macros for float comparison,
//! which properly handle floating-point precision issues that `assert_eq!` cannot.

// Re-export approx macros for convenient use in tests
pub use approx::assert_abs_diff_eq;

use crate::domain::Clip;

/// Default epsilon for f64 comparisons.
/// Suitable for values that should be "exactly equal" but may have minor floating-point errors.
pub const F64_EPSILON: f64 = 1e-9;

/// Lets spawned tasks run until they park on a timer or finish.
///
/// With a paused clock, timers only fire on `tokio::time::advance`, so this
/// never moves time forward.
pub async fn settle() {
    for _ in 0..64 {
        tokio::task::yield_now().await;
    }
}

/// Three clips on track 0 with a gap between 8 s and 10 s.
pub fn three_clip_timeline() -> Vec<Clip> {
    vec![
        Clip::new("c1", 0, 0.0, 5.0, "media/a.mp4"),
        Clip::new("c2", 0, 5.0, 8.0, "media/b.mp4"),
        Clip::new("c3", 0, 10.0, 15.0, "media/c.mp4"),
    ]
}
