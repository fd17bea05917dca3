// SPDX-License-Identifier: MPL-2.0
//! Timeline clip records.
//!
//! Clips are owned by the editing layer. The playback engine treats them as
//! read-only input and rebuilds its lookup structures whenever the list changes.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Track number a clip is placed on. Higher tracks are layered on top.
pub type TrackIndex = u32;

/// Stable identifier of a clip on the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(String);

impl ClipId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClipId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ClipId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// What a clip carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClipKind {
    #[default]
    Video,
    Audio,
    Image,
    /// Rendered overlay text; has no media for the sink.
    Text,
}

impl ClipKind {
    /// Returns true if the clip references media the sink can play.
    #[must_use]
    pub fn has_media(self) -> bool {
        !matches!(self, ClipKind::Text)
    }
}

/// A time-bounded reference to playable media placed on a track at `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    pub id: ClipId,

    #[serde(default)]
    pub track: TrackIndex,

    /// Timeline position where the clip begins, in seconds.
    pub start_secs: f64,

    /// Timeline position where the clip ends (exclusive), in seconds.
    pub end_secs: f64,

    /// Stable content reference handed to the asset locator.
    pub source_ref: String,

    #[serde(default)]
    pub kind: ClipKind,

    /// Offset into the source media at which the clip begins.
    #[serde(default)]
    pub in_point_secs: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl Clip {
    /// Creates a video clip with no trim.
    pub fn new(
        id: impl Into<ClipId>,
        track: TrackIndex,
        start_secs: f64,
        end_secs: f64,
        source_ref: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            track,
            start_secs,
            end_secs,
            source_ref: source_ref.into(),
            kind: ClipKind::Video,
            in_point_secs: 0.0,
            name: None,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ClipKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn with_in_point(mut self, in_point_secs: f64) -> Self {
        self.in_point_secs = in_point_secs;
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn duration_secs(&self) -> f64 {
        self.end_secs - self.start_secs
    }

    /// Returns true if the clip has finite bounds with `end > start` and a
    /// non-negative in-point.
    pub fn is_well_formed(&self) -> bool {
        self.start_secs.is_finite()
            && self.end_secs.is_finite()
            && self.end_secs > self.start_secs
            && self.in_point_secs.is_finite()
            && self.in_point_secs >= 0.0
    }

    /// Returns true if `t` falls inside `[start, end)`.
    pub fn contains(&self, t: f64) -> bool {
        self.start_secs <= t && t < self.end_secs
    }

    /// Position inside the source media that timeline time `t` maps to.
    pub fn media_offset(&self, t: f64) -> f64 {
        (t - self.start_secs).max(0.0) + self.in_point_secs
    }

    /// Returns true if both clips show the same media from the same in-point.
    pub fn same_media(&self, other: &Clip) -> bool {
        self.source_ref == other.source_ref && self.in_point_secs == other.in_point_secs
    }
}

/// On-disk clip list (`[[clips]]` tables in TOML).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClipList {
    #[serde(default)]
    pub clips: Vec<Clip>,
}

impl ClipList {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|err| Error::Clips(err.to_string()))
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Converts the list into the shared form the engine consumes.
    pub fn into_shared(self) -> Arc<[Clip]> {
        Arc::from(self.clips)
    }
}
