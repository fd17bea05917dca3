// SPDX-License-Identifier: MPL-2.0
//! Per-track interval index over the clip list.
//!
//! Each track keeps its clips sorted by start time together with a running
//! maximum of their end times ("reach"). Because the reach is monotonic, the
//! first clip whose reach passes `t` can be found with a binary search, and it
//! is also the earliest-starting clip that could still cover `t`.
//!
//! Clips on one track are expected not to overlap. When they do, lookups
//! return the clip with the smaller start (ties: earlier in the input list) and
//! the overlap is reported through [`ClipIndex::overlaps`].

use crate::domain::{Clip, ClipId, TrackIndex};
use crate::error::PlaybackError;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default)]
struct TrackLane {
    clips: Vec<Clip>,
    reach: Vec<f64>,
}

impl TrackLane {
    fn from_clips(mut clips: Vec<Clip>) -> Self {
        // Stable sort keeps input order for equal starts.
        clips.sort_by(|a, b| a.start_secs.total_cmp(&b.start_secs));
        let mut reach = Vec::with_capacity(clips.len());
        let mut furthest = f64::NEG_INFINITY;
        for clip in &clips {
            furthest = furthest.max(clip.end_secs);
            reach.push(furthest);
        }
        Self { clips, reach }
    }

    fn find_at(&self, t: f64) -> Option<&Clip> {
        let candidate = self.reach.partition_point(|&end| end <= t);
        self.clips
            .get(candidate)
            .filter(|clip| clip.start_secs <= t)
    }

    fn find_next_start(&self, after: f64) -> Option<&Clip> {
        let next = self.clips.partition_point(|clip| clip.start_secs <= after);
        self.clips.get(next)
    }

    fn end(&self) -> f64 {
        self.reach.last().copied().unwrap_or(0.0)
    }

    fn overlaps(&self, track: TrackIndex) -> Vec<PlaybackError> {
        let mut found = Vec::new();
        let Some(first) = self.clips.first() else {
            return found;
        };
        let mut furthest = first;
        for clip in &self.clips[1..] {
            if clip.start_secs < furthest.end_secs {
                found.push(PlaybackError::Index {
                    track,
                    first: furthest.id.clone(),
                    second: clip.id.clone(),
                });
            }
            if clip.end_secs > furthest.end_secs {
                furthest = clip;
            }
        }
        found
    }
}

/// Immutable lookup structure rebuilt whenever the clip list changes.
#[derive(Debug, Clone, Default)]
pub struct ClipIndex {
    lanes: BTreeMap<TrackIndex, TrackLane>,
    positions: HashMap<ClipId, (TrackIndex, usize)>,
}

impl ClipIndex {
    /// Builds the index. Ill-formed clips are dropped with a warning.
    pub fn build<'a>(clips: impl IntoIterator<Item = &'a Clip>) -> Self {
        let mut by_track: BTreeMap<TrackIndex, Vec<Clip>> = BTreeMap::new();
        for clip in clips {
            if !clip.is_well_formed() {
                warn!(
                    clip = %clip.id,
                    start = clip.start_secs,
                    end = clip.end_secs,
                    "dropping ill-formed clip"
                );
                continue;
            }
            by_track.entry(clip.track).or_default().push(clip.clone());
        }

        let lanes: BTreeMap<_, _> = by_track
            .into_iter()
            .map(|(track, clips)| (track, TrackLane::from_clips(clips)))
            .collect();

        let mut positions = HashMap::new();
        for (&track, lane) in &lanes {
            for (slot, clip) in lane.clips.iter().enumerate() {
                positions.entry(clip.id.clone()).or_insert((track, slot));
            }
        }

        let index = Self { lanes, positions };
        for overlap in index.overlaps() {
            warn!(%overlap, "overlapping clips; earlier start wins");
        }
        debug!(clips = index.len(), tracks = index.lanes.len(), "clip index built");
        index
    }

    /// Returns the clip covering `t`.
    ///
    /// With a track filter only that track is searched. Without one the
    /// highest-numbered track covering `t` wins.
    pub fn find_at(&self, track: Option<TrackIndex>, t: f64) -> Option<&Clip> {
        match track {
            Some(track) => self.lanes.get(&track)?.find_at(t),
            None => self.lanes.values().rev().find_map(|lane| lane.find_at(t)),
        }
    }

    /// Returns the clip with the smallest start strictly after `after`.
    ///
    /// Without a track filter, equal starts resolve to the lower track.
    pub fn find_next_start(&self, track: Option<TrackIndex>, after: f64) -> Option<&Clip> {
        match track {
            Some(track) => self.lanes.get(&track)?.find_next_start(after),
            None => self
                .lanes
                .values()
                .filter_map(|lane| lane.find_next_start(after))
                .min_by(|a, b| a.start_secs.total_cmp(&b.start_secs)),
        }
    }

    /// End of the last clip (on the filtered track, or on any track).
    pub fn duration(&self, track: Option<TrackIndex>) -> f64 {
        match track {
            Some(track) => self.lanes.get(&track).map_or(0.0, TrackLane::end),
            None => self.lanes.values().map(TrackLane::end).fold(0.0, f64::max),
        }
    }

    /// Overlapping clip pairs, one entry per later-starting clip.
    pub fn overlaps(&self) -> Vec<PlaybackError> {
        self.lanes
            .iter()
            .flat_map(|(&track, lane)| lane.overlaps(track))
            .collect()
    }

    pub fn get(&self, id: &ClipId) -> Option<&Clip> {
        let (track, slot) = self.positions.get(id)?;
        self.lanes.get(track)?.clips.get(*slot)
    }

    pub fn contains(&self, id: &ClipId) -> bool {
        self.positions.contains_key(id)
    }

    /// Iterates all indexed clips, track by track in start order.
    pub fn clips(&self) -> impl Iterator<Item = &Clip> {
        self.lanes.values().flat_map(|lane| lane.clips.iter())
    }

    pub fn len(&self) -> usize {
        self.lanes.values().map(|lane| lane.clips.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.values().all(|lane| lane.clips.is_empty())
    }
}
