// SPDX-License-Identifier: MPL-2.0
//! Infrastructure layer adapters.
//!
//! This module contains concrete implementations of the port traits defined in
//! `application::port`.
//!
//! # Available Adapters
//!
//! - [`simulated`]: In-process sink, asset locator and cursor sinks used by the
//!   CLI and the test suites
//!
//! # Design Notes
//!
//! - Adapters implement traits from `application::port`
//! - The timeline engine never names a concrete adapter

pub mod simulated;

// Re-export main types for convenience
pub use simulated::{LogCursor, RecordingCursor, SimulatedSink, SinkCall, StaticLocator};
