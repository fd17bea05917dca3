// SPDX-License-Identifier: MPL-2.0
//! Timeline playback engine.
//!
//! This module keeps one playback sink in step with a clip timeline.
//!
//! # Architecture
//!
//! ```text
//! tick ─▶ PlaybackClock ─▶ ClipIndex ─┬─ same clip ──▶ DriftCorrector ─┐
//!                                     ├─ other clip ─▶ MediaSwitcher ──┼─▶ sink
//!                                     └─ no clip ────▶ pause ──────────┘
//!                                                     │
//!                                              SourceResolver ─▶ AssetLocator
//! ```
//!
//! - [`clip_index`]: Interval lookup of the clip under the cursor
//! - [`resolver`]: Cached, coalesced content reference resolution
//! - [`switcher`]: The only writer of sink source and playback state
//! - [`clock`]: Wall-clock driven virtual cursor
//! - [`drift`]: Rate-limited re-seeking when the sink wanders off
//! - [`engine`]: The tick loop tying them together

pub mod clip_index;
pub mod clock;
pub mod drift;
pub mod engine;
pub mod resolver;
pub mod switcher;

pub use clip_index::ClipIndex;
pub use clock::{PlaybackAnchor, PlaybackClock};
pub use drift::{DriftAction, DriftCorrector};
pub use engine::{EngineState, EngineStatus, PlaybackEngine, TickOutcome};
pub use resolver::{ResolvedSource, ResolverSettings, ResolverStats, SourceResolver};
pub use switcher::{MediaSwitcher, SwitchSettings, SwitchTask, SwitcherState};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks `mutex`, recovering the data if a previous holder panicked.
///
/// Every critical section in this crate is a handful of field updates with no
/// await inside, so the protected state is consistent even after a panic.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
