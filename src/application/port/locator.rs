// SPDX-License-Identifier: MPL-2.0
//! Asset locator port definition.
//!
//! Media is addressed on the timeline by a stable content reference. Before the
//! sink can load it, the reference has to be exchanged for a playable locator
//! (typically a signed URL) that is only valid for a limited time.

use crate::error::PlaybackError;
use std::future::Future;
use std::time::Duration;

/// A playable locator and how long it stays valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatorGrant {
    pub locator: String,
    pub valid_for: Duration,
}

/// Port for exchanging content references for playable locators.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`: the source resolver calls the
/// locator from spawned prefetch and switch tasks.
pub trait AssetLocator: Send + Sync + 'static {
    /// Requests a locator for `source_ref` valid for about `valid_for`.
    ///
    /// The grant may carry a shorter validity than requested; the resolver
    /// honours whichever the service returns.
    ///
    /// # Errors
    ///
    /// Returns [`PlaybackError::Resolution`] if the reference is unknown or the
    /// service refuses the request.
    fn locate(
        &self,
        source_ref: &str,
        valid_for: Duration,
    ) -> impl Future<Output = Result<LocatorGrant, PlaybackError>> + Send;
}
