// SPDX-License-Identifier: MPL-2.0
//! Domain layer - Timeline data and tuning values.
//!
//! This module contains the plain data the engine reads: clips as placed by
//! the editing layer, and range-checked value objects for the engine's knobs.
//!
//! # Modules
//!
//! - [`clip`]: Timeline clips ([`Clip`], [`ClipId`], [`ClipKind`], [`ClipList`])
//! - [`newtypes`]: Tuning value objects ([`DriftThreshold`](newtypes::DriftThreshold),
//!   [`CorrectionInterval`](newtypes::CorrectionInterval),
//!   [`OperationTimeout`](newtypes::OperationTimeout), [`TickRate`](newtypes::TickRate),
//!   [`FrameRate`](newtypes::FrameRate))

pub mod clip;
pub mod newtypes;

pub use clip::{Clip, ClipId, ClipKind, ClipList, TrackIndex};
