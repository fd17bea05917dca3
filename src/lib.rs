// SPDX-License-Identifier: MPL-2.0
//! `timeline_playback` keeps a single media sink in step with a clip timeline.
//!
//! A wall-clock driven virtual cursor walks the timeline; each tick looks up the
//! clip under the cursor, switches the sink to it when needed, pauses across
//! gaps, and re-seeks the sink when its reported position drifts away from the
//! cursor. Collaborators (the sink, the asset locator, the cursor consumer) are
//! reached through the traits in [`application::port`].

#![doc(html_root_url = "https://docs.rs/timeline_playback/0.3.0")]

pub mod application;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod timeline;

#[cfg(test)]
pub(crate) mod test_utils;
