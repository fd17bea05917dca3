// SPDX-License-Identifier: MPL-2.0
//! Playback sink port definition.
//!
//! This module defines the [`PlaybackSink`] trait for the one media element
//! that renders the timeline. Infrastructure adapters (a browser media element,
//! a native player, the simulated sink) implement this trait.
//!
//! # Design Notes
//!
//! - The sink holds **one** source at a time; `set_source` replaces it
//! - `load`, `seek` and `play` are asynchronous and resolve once the media
//!   element acknowledged the request
//! - `pause` and the getters are synchronous so `stop` can silence the sink
//!   without awaiting anything

use std::future::Future;
use thiserror::Error;

/// Errors reported by a playback sink.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SinkError {
    /// The operation needs a loaded source.
    #[error("no source is loaded")]
    NotReady,

    /// The pending load was abandoned because a newer source was set.
    #[error("load was aborted by a newer source")]
    Aborted,

    /// The media could not be fetched or decoded.
    #[error("media could not be decoded: {0}")]
    Decode(String),
}

// =============================================================================
// PlaybackSink Trait
// =============================================================================

/// Port for the media element driven by the timeline engine.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: switch attempts run as spawned tasks
/// and share the sink with the engine through an `Arc`. Methods take `&self`,
/// so adapters keep their mutable state behind their own locks.
///
/// # Lifecycle
///
/// 1. Call `set_source()` with a resolved locator
/// 2. Await `load()` until the sink is seekable
/// 3. Await `seek()` to the in-clip offset
/// 4. Await `play()`
/// 5. Call `pause()` on gaps, pause or stop
pub trait PlaybackSink: Send + Sync + 'static {
    /// Replaces the current source. Any pending `load` for the previous source
    /// resolves with [`SinkError::Aborted`].
    fn set_source(&self, locator: &str);

    /// Returns the locator most recently passed to `set_source`.
    fn current_source(&self) -> Option<String>;

    /// Resolves once the current source is seekable.
    ///
    /// # Errors
    ///
    /// Returns a [`SinkError`] if no source is set, the load was superseded or
    /// the media cannot be decoded.
    fn load(&self) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Moves the playhead to `position_secs` within the current source.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::NotReady`] if the source has not finished loading.
    fn seek(&self, position_secs: f64) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Starts or continues playback.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::NotReady`] if the source has not finished loading.
    fn play(&self) -> impl Future<Output = Result<(), SinkError>> + Send;

    /// Pauses playback. Never fails; pausing a paused sink is a no-op.
    fn pause(&self);

    /// Returns the sink's own playhead position in seconds of source media.
    fn position_secs(&self) -> f64;

    /// Returns true once the current source finished loading.
    fn is_ready(&self) -> bool;

    /// Returns true unless the sink is actively playing.
    fn is_paused(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mock implementation for testing
    #[derive(Default)]
    struct MockSink {
        state: Mutex<(Option<String>, bool, f64, bool)>,
    }

    impl PlaybackSink for MockSink {
        fn set_source(&self, locator: &str) {
            let mut state = self.state.lock().unwrap();
            *state = (Some(locator.to_string()), false, 0.0, false);
        }

        fn current_source(&self) -> Option<String> {
            self.state.lock().unwrap().0.clone()
        }

        async fn load(&self) -> Result<(), SinkError> {
            let mut state = self.state.lock().unwrap();
            if state.0.is_none() {
                return Err(SinkError::NotReady);
            }
            state.1 = true;
            Ok(())
        }

        async fn seek(&self, position_secs: f64) -> Result<(), SinkError> {
            let mut state = self.state.lock().unwrap();
            if !state.1 {
                return Err(SinkError::NotReady);
            }
            state.2 = position_secs;
            Ok(())
        }

        async fn play(&self) -> Result<(), SinkError> {
            let mut state = self.state.lock().unwrap();
            if !state.1 {
                return Err(SinkError::NotReady);
            }
            state.3 = true;
            Ok(())
        }

        fn pause(&self) {
            self.state.lock().unwrap().3 = false;
        }

        fn position_secs(&self) -> f64 {
            self.state.lock().unwrap().2
        }

        fn is_ready(&self) -> bool {
            self.state.lock().unwrap().1
        }

        fn is_paused(&self) -> bool {
            !self.state.lock().unwrap().3
        }
    }

    #[tokio::test]
    async fn mock_sink_follows_lifecycle() {
        let sink = MockSink::default();
        assert_eq!(sink.load().await, Err(SinkError::NotReady));

        sink.set_source("memory://clip");
        assert!(!sink.is_ready());
        assert_eq!(sink.seek(1.0).await, Err(SinkError::NotReady));

        sink.load().await.unwrap();
        sink.seek(2.5).await.unwrap();
        sink.play().await.unwrap();
        assert!(!sink.is_paused());
        assert_eq!(sink.position_secs(), 2.5);

        sink.pause();
        assert!(sink.is_paused());
        assert_eq!(sink.current_source().as_deref(), Some("memory://clip"));
    }

    #[test]
    fn sink_error_messages() {
        assert_eq!(SinkError::NotReady.to_string(), "no source is loaded");
        assert_eq!(
            SinkError::Decode("bad header".into()).to_string(),
            "media could not be decoded: bad header"
        );
    }
}
