// SPDX-License-Identifier: MPL-2.0
//! Port definitions (traits) for dependency inversion.
//!
//! This module defines abstract interfaces that infrastructure adapters implement.
//! These traits use only domain types, ensuring the timeline engine remains
//! independent of concrete media stacks and asset services.
//!
//! # Available Ports
//!
//! - [`sink`]: The single media element that renders the timeline
//! - [`locator`]: Turns stable content references into playable locators
//! - [`cursor`]: Receives the virtual cursor position every tick
//!
//! # Design Notes
//!
//! - Async operations return `impl Future + Send` so switch attempts can be spawned
//! - Sink methods take `&self`; adapters own their interior mutability
//! - Port errors are mapped to [`PlaybackError`](crate::error::PlaybackError) by the switcher

pub mod cursor;
pub mod locator;
pub mod sink;

// Re-export main types for convenience
pub use cursor::CursorSink;
pub use locator::{AssetLocator, LocatorGrant};
pub use sink::{PlaybackSink, SinkError};
