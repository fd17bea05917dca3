// SPDX-License-Identifier: MPL-2.0
use crate::domain::clip::{ClipId, TrackIndex};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum Error {
    #[error("I/O Error: {0}")]
    Io(String),

    #[error("Config Error: {0}")]
    Config(String),

    #[error("Clip List Error: {0}")]
    Clips(String),

    #[error("Playback Error: {0}")]
    Playback(#[from] PlaybackError),
}

/// Stage of a switch that is bounded by a timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutStage {
    /// Asking the asset locator for a playable locator.
    Resolve,
    /// Waiting for the sink to become seekable after a source change.
    Load,
}

impl fmt::Display for TimeoutStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutStage::Resolve => write!(f, "resolve"),
            TimeoutStage::Load => write!(f, "load"),
        }
    }
}

/// Errors raised while getting a clip onto the playback sink.
///
/// All of these are contained at the media switcher boundary: they turn the
/// affected clip's span into a gap and show up in the engine status, but they
/// never escape a playback tick.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaybackError {
    /// The asset locator could not produce a playable locator.
    #[error("could not resolve '{reference}': {reason}")]
    Resolution { reference: String, reason: String },

    /// The sink failed to load or decode the clip's media.
    #[error("sink failed to load clip {clip}: {reason}")]
    Load { clip: ClipId, reason: String },

    /// A bounded step took too long.
    #[error("{stage} of '{target}' timed out after {}ms", .after.as_millis())]
    Timeout {
        stage: TimeoutStage,
        target: String,
        after: Duration,
    },

    /// Two clips on one track overlap. Reported for diagnostics only; lookups
    /// fall back to the earlier-starting clip.
    #[error("clips {first} and {second} overlap on track {track}")]
    Index {
        track: TrackIndex,
        first: ClipId,
        second: ClipId,
    },

    /// A newer request replaced this one before it was committed.
    #[error("switch to clip {0} was superseded")]
    Superseded(ClipId),
}

impl PlaybackError {
    /// Returns a stable, machine-readable name for the error category.
    pub fn kind(&self) -> &'static str {
        match self {
            PlaybackError::Resolution { .. } => "resolution",
            PlaybackError::Load { .. } => "load",
            PlaybackError::Timeout { .. } => "timeout",
            PlaybackError::Index { .. } => "index",
            PlaybackError::Superseded(_) => "superseded",
        }
    }

    /// Returns true if the error only means a newer request won.
    pub fn is_superseded(&self) -> bool {
        matches!(self, PlaybackError::Superseded(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_formats_io_error() {
        let err = Error::Io("disk failure".to_string());
        assert_eq!(format!("{}", err), "I/O Error: disk failure");
    }

    #[test]
    fn from_io_error_produces_io_variant() {
        let io_error = std::io::Error::other("boom");
        let err: Error = io_error.into();
        match err {
            Error::Io(message) => assert!(message.contains("boom")),
            _ => panic!("expected Io variant"),
        }
    }

    #[test]
    fn config_error_formats_properly() {
        let err = Error::Config("bad field".into());
        assert_eq!(format!("{}", err), "Config Error: bad field");
    }

    #[test]
    fn playback_error_wraps_into_crate_error() {
        let err: Error = PlaybackError::Superseded(ClipId::new("c1")).into();
        assert!(matches!(err, Error::Playback(PlaybackError::Superseded(_))));
        assert_eq!(
            format!("{}", err),
            "Playback Error: switch to clip c1 was superseded"
        );
    }

    #[test]
    fn timeout_message_names_stage_and_target() {
        let err = PlaybackError::Timeout {
            stage: TimeoutStage::Load,
            target: "c7".to_string(),
            after: Duration::from_secs(8),
        };
        assert_eq!(format!("{}", err), "load of 'c7' timed out after 8000ms");
    }

    #[test]
    fn kinds_are_stable() {
        let resolution = PlaybackError::Resolution {
            reference: "a.mp4".into(),
            reason: "gone".into(),
        };
        let load = PlaybackError::Load {
            clip: ClipId::new("c1"),
            reason: "decode".into(),
        };
        let index = PlaybackError::Index {
            track: 0,
            first: ClipId::new("a"),
            second: ClipId::new("b"),
        };
        assert_eq!(resolution.kind(), "resolution");
        assert_eq!(load.kind(), "load");
        assert_eq!(index.kind(), "index");
        assert!(!load.is_superseded());
        assert!(PlaybackError::Superseded(ClipId::new("x")).is_superseded());
    }
}
