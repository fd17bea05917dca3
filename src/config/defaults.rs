// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the engine. Constants are organized by category.
//!
//! # Categories
//!
//! - **Playback**: Tick rate, frame rate and prefetch lookahead
//! - **Drift**: Re-seek threshold and minimum interval between corrections
//! - **Loading**: Load and resolve timeouts
//! - **Resolver**: Locator validity window, refresh margin and cache capacity

// ==========================================================================
// Playback Defaults
// ==========================================================================

/// Default number of playback ticks per second.
pub const DEFAULT_TICK_RATE_HZ: u32 = 30;

/// Minimum tick rate.
pub const MIN_TICK_RATE_HZ: u32 = 5;

/// Maximum tick rate.
pub const MAX_TICK_RATE_HZ: u32 = 120;

/// Default timeline frame rate, used to derive the seek frame tolerance.
pub const DEFAULT_FRAME_RATE: f64 = 30.0;

/// Minimum timeline frame rate.
pub const MIN_FRAME_RATE: f64 = 1.0;

/// Maximum timeline frame rate.
pub const MAX_FRAME_RATE: f64 = 240.0;

/// Default distance ahead of the next clip start at which its source is resolved.
pub const DEFAULT_PREFETCH_LOOKAHEAD_SECS: f64 = 1.0;

/// Minimum prefetch lookahead (0 disables prefetching).
pub const MIN_PREFETCH_LOOKAHEAD_SECS: f64 = 0.0;

/// Maximum prefetch lookahead.
pub const MAX_PREFETCH_LOOKAHEAD_SECS: f64 = 10.0;

// ==========================================================================
// Drift Defaults
// ==========================================================================

/// Default drift (in seconds) above which the sink is re-seeked.
pub const DEFAULT_DRIFT_THRESHOLD_SECS: f64 = 0.5;

/// Minimum drift threshold. Smaller values re-seek on normal decoder jitter.
pub const MIN_DRIFT_THRESHOLD_SECS: f64 = 0.2;

/// Maximum drift threshold.
pub const MAX_DRIFT_THRESHOLD_SECS: f64 = 2.0;

/// Default minimum time between two corrections of the same clip (in milliseconds).
pub const DEFAULT_MIN_CORRECTION_INTERVAL_MS: u64 = 1_000;

/// Minimum correction interval.
pub const MIN_CORRECTION_INTERVAL_MS: u64 = 100;

/// Maximum correction interval.
pub const MAX_CORRECTION_INTERVAL_MS: u64 = 10_000;

// ==========================================================================
// Loading Defaults
// ==========================================================================

/// Default bound on how long the sink may take to become seekable (in milliseconds).
pub const DEFAULT_LOAD_TIMEOUT_MS: u64 = 8_000;

/// Default bound on a single asset locator request (in milliseconds).
pub const DEFAULT_RESOLVE_TIMEOUT_MS: u64 = 10_000;

/// Minimum load or resolve timeout.
pub const MIN_OPERATION_TIMEOUT_MS: u64 = 500;

/// Maximum load or resolve timeout.
pub const MAX_OPERATION_TIMEOUT_MS: u64 = 60_000;

// ==========================================================================
// Resolver Defaults
// ==========================================================================

/// Default validity window requested for signed locators (in seconds).
pub const DEFAULT_LOCATOR_VALIDITY_SECS: u64 = 3_600;

/// Minimum locator validity window.
pub const MIN_LOCATOR_VALIDITY_SECS: u64 = 60;

/// Maximum locator validity window.
pub const MAX_LOCATOR_VALIDITY_SECS: u64 = 86_400;

/// Default time before expiry at which a cached locator is considered stale.
pub const DEFAULT_REFRESH_MARGIN_SECS: u64 = 60;

/// Default number of resolved sources kept in the cache.
pub const DEFAULT_RESOLVER_CAPACITY: usize = 1_000;

/// Minimum resolver cache capacity.
pub const MIN_RESOLVER_CAPACITY: usize = 16;

/// Maximum resolver cache capacity.
pub const MAX_RESOLVER_CAPACITY: usize = 10_000;

// ==========================================================================
// Compile-time Validation
// ==========================================================================

const _: () = {
    // Playback validation
    assert!(MIN_TICK_RATE_HZ > 0);
    assert!(DEFAULT_TICK_RATE_HZ >= MIN_TICK_RATE_HZ);
    assert!(DEFAULT_TICK_RATE_HZ <= MAX_TICK_RATE_HZ);
    assert!(MIN_FRAME_RATE > 0.0);
    assert!(DEFAULT_FRAME_RATE >= MIN_FRAME_RATE);
    assert!(DEFAULT_FRAME_RATE <= MAX_FRAME_RATE);
    assert!(MIN_PREFETCH_LOOKAHEAD_SECS >= 0.0);
    assert!(DEFAULT_PREFETCH_LOOKAHEAD_SECS <= MAX_PREFETCH_LOOKAHEAD_SECS);

    // Drift validation
    assert!(MIN_DRIFT_THRESHOLD_SECS > 0.0);
    assert!(DEFAULT_DRIFT_THRESHOLD_SECS >= MIN_DRIFT_THRESHOLD_SECS);
    assert!(DEFAULT_DRIFT_THRESHOLD_SECS <= MAX_DRIFT_THRESHOLD_SECS);
    assert!(MIN_CORRECTION_INTERVAL_MS > 0);
    assert!(DEFAULT_MIN_CORRECTION_INTERVAL_MS >= MIN_CORRECTION_INTERVAL_MS);
    assert!(DEFAULT_MIN_CORRECTION_INTERVAL_MS <= MAX_CORRECTION_INTERVAL_MS);

    // Loading validation
    assert!(MIN_OPERATION_TIMEOUT_MS > 0);
    assert!(DEFAULT_LOAD_TIMEOUT_MS >= MIN_OPERATION_TIMEOUT_MS);
    assert!(DEFAULT_LOAD_TIMEOUT_MS <= MAX_OPERATION_TIMEOUT_MS);
    assert!(DEFAULT_RESOLVE_TIMEOUT_MS >= MIN_OPERATION_TIMEOUT_MS);
    assert!(DEFAULT_RESOLVE_TIMEOUT_MS <= MAX_OPERATION_TIMEOUT_MS);

    // Resolver validation
    assert!(DEFAULT_LOCATOR_VALIDITY_SECS >= MIN_LOCATOR_VALIDITY_SECS);
    assert!(DEFAULT_LOCATOR_VALIDITY_SECS <= MAX_LOCATOR_VALIDITY_SECS);
    assert!(DEFAULT_REFRESH_MARGIN_SECS * 2 <= DEFAULT_LOCATOR_VALIDITY_SECS);
    assert!(MIN_RESOLVER_CAPACITY > 0);
    assert!(DEFAULT_RESOLVER_CAPACITY >= MIN_RESOLVER_CAPACITY);
    assert!(DEFAULT_RESOLVER_CAPACITY <= MAX_RESOLVER_CAPACITY);
};
