// SPDX-License-Identifier: MPL-2.0
//! Cursor output port definition.

/// Receives the virtual cursor position once per playback tick.
///
/// Any `FnMut(f64)` closure is a cursor sink, which is convenient for hosts
/// that only forward the position to a UI channel.
pub trait CursorSink: Send {
    /// Publishes the cursor position in timeline seconds.
    fn publish(&mut self, position_secs: f64);

    /// Called once when playback stops at the end of the timeline.
    fn reached_end(&mut self, position_secs: f64) {
        self.publish(position_secs);
    }
}

impl<F> CursorSink for F
where
    F: FnMut(f64) + Send,
{
    fn publish(&mut self, position_secs: f64) {
        self(position_secs);
    }
}
