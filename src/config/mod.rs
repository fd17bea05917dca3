// SPDX-License-Identifier: MPL-2.0
//! This module handles the engine's configuration, including loading and saving
//! tuning values to an `engine.toml` file.
//!
//! The file lives in `$TIMELINE_PLAYBACK_CONFIG_DIR` when that variable is set,
//! otherwise in the platform configuration directory. Every field is optional;
//! missing or out-of-range values fall back to the constants in [`defaults`].
//!
//! # Examples
//!
//! ```no_run
//! use timeline_playback::config::{self, EngineConfig};
//! use std::path::PathBuf;
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Tighten drift correction
//! config.drift.threshold_secs = Some(0.3);
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//!
//! // To load/save from a specific path (e.g., for testing)
//! let temp_file = PathBuf::from("./temp_config_dir/engine.toml");
//! config::save_to_path(&config, &temp_file).expect("Failed to save to path");
//! let loaded = config::load_from_path(&temp_file).expect("Failed to load from path");
//! assert_eq!(loaded.drift.threshold_secs, Some(0.3));
//! ```

pub mod defaults;

use crate::domain::newtypes::{
    CorrectionInterval, DriftThreshold, FrameRate, OperationTimeout, TickRate,
};
use crate::domain::TrackIndex;
use crate::error::Result;
use defaults::{
    DEFAULT_DRIFT_THRESHOLD_SECS, DEFAULT_FRAME_RATE, DEFAULT_LOAD_TIMEOUT_MS,
    DEFAULT_LOCATOR_VALIDITY_SECS, DEFAULT_MIN_CORRECTION_INTERVAL_MS,
    DEFAULT_PREFETCH_LOOKAHEAD_SECS, DEFAULT_REFRESH_MARGIN_SECS, DEFAULT_RESOLVER_CAPACITY,
    DEFAULT_RESOLVE_TIMEOUT_MS, DEFAULT_TICK_RATE_HZ, MAX_LOCATOR_VALIDITY_SECS,
    MAX_PREFETCH_LOOKAHEAD_SECS, MAX_RESOLVER_CAPACITY, MIN_LOCATOR_VALIDITY_SECS,
    MIN_PREFETCH_LOOKAHEAD_SECS, MIN_RESOLVER_CAPACITY,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "engine.toml";
const APP_NAME: &str = "TimelinePlayback";

/// Environment variable overriding the configuration directory.
pub const CONFIG_DIR_ENV: &str = "TIMELINE_PLAYBACK_CONFIG_DIR";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub drift: DriftConfig,
    #[serde(default)]
    pub loading: LoadingConfig,
    #[serde(default)]
    pub resolver: ResolverConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default)]
    pub tick_rate_hz: Option<u32>,
    /// Restricts lookups to one track. Unset means the top covering track wins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track: Option<TrackIndex>,
    #[serde(default)]
    pub frame_rate: Option<f64>,
    #[serde(default)]
    pub prefetch_lookahead_secs: Option<f64>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: Some(DEFAULT_TICK_RATE_HZ),
            track: None,
            frame_rate: Some(DEFAULT_FRAME_RATE),
            prefetch_lookahead_secs: Some(DEFAULT_PREFETCH_LOOKAHEAD_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftConfig {
    #[serde(default)]
    pub threshold_secs: Option<f64>,
    #[serde(default)]
    pub min_correction_interval_ms: Option<u64>,
}

impl Default for DriftConfig {
    fn default() -> Self {
        Self {
            threshold_secs: Some(DEFAULT_DRIFT_THRESHOLD_SECS),
            min_correction_interval_ms: Some(DEFAULT_MIN_CORRECTION_INTERVAL_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingConfig {
    #[serde(default)]
    pub load_timeout_ms: Option<u64>,
}

impl Default for LoadingConfig {
    fn default() -> Self {
        Self {
            load_timeout_ms: Some(DEFAULT_LOAD_TIMEOUT_MS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    #[serde(default)]
    pub validity_secs: Option<u64>,
    #[serde(default)]
    pub refresh_margin_secs: Option<u64>,
    #[serde(default)]
    pub resolve_timeout_ms: Option<u64>,
    #[serde(default)]
    pub capacity: Option<usize>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            validity_secs: Some(DEFAULT_LOCATOR_VALIDITY_SECS),
            refresh_margin_secs: Some(DEFAULT_REFRESH_MARGIN_SECS),
            resolve_timeout_ms: Some(DEFAULT_RESOLVE_TIMEOUT_MS),
            capacity: Some(DEFAULT_RESOLVER_CAPACITY),
        }
    }
}

impl EngineConfig {
    pub fn tick_rate(&self) -> TickRate {
        TickRate::new(self.playback.tick_rate_hz.unwrap_or(DEFAULT_TICK_RATE_HZ))
    }

    pub fn frame_rate(&self) -> FrameRate {
        FrameRate::new(self.playback.frame_rate.unwrap_or(DEFAULT_FRAME_RATE))
    }

    pub fn track_filter(&self) -> Option<TrackIndex> {
        self.playback.track
    }

    pub fn prefetch_lookahead_secs(&self) -> f64 {
        let secs = self
            .playback
            .prefetch_lookahead_secs
            .filter(|secs| !secs.is_nan())
            .unwrap_or(DEFAULT_PREFETCH_LOOKAHEAD_SECS);
        secs.clamp(MIN_PREFETCH_LOOKAHEAD_SECS, MAX_PREFETCH_LOOKAHEAD_SECS)
    }

    pub fn drift_threshold(&self) -> DriftThreshold {
        DriftThreshold::new(
            self.drift
                .threshold_secs
                .unwrap_or(DEFAULT_DRIFT_THRESHOLD_SECS),
        )
    }

    pub fn correction_interval(&self) -> CorrectionInterval {
        CorrectionInterval::from_millis(
            self.drift
                .min_correction_interval_ms
                .unwrap_or(DEFAULT_MIN_CORRECTION_INTERVAL_MS),
        )
    }

    pub fn load_timeout(&self) -> OperationTimeout {
        OperationTimeout::from_millis(
            self.loading
                .load_timeout_ms
                .unwrap_or(DEFAULT_LOAD_TIMEOUT_MS),
        )
    }

    pub fn resolve_timeout(&self) -> OperationTimeout {
        OperationTimeout::from_millis(
            self.resolver
                .resolve_timeout_ms
                .unwrap_or(DEFAULT_RESOLVE_TIMEOUT_MS),
        )
    }

    /// Validity window requested from the asset locator.
    pub fn locator_validity(&self) -> Duration {
        let secs = self
            .resolver
            .validity_secs
            .unwrap_or(DEFAULT_LOCATOR_VALIDITY_SECS)
            .clamp(MIN_LOCATOR_VALIDITY_SECS, MAX_LOCATOR_VALIDITY_SECS);
        Duration::from_secs(secs)
    }

    /// Time before expiry at which a cached locator is refreshed.
    ///
    /// Never more than half the validity window.
    pub fn refresh_margin(&self) -> Duration {
        let validity = self.locator_validity();
        let margin = Duration::from_secs(
            self.resolver
                .refresh_margin_secs
                .unwrap_or(DEFAULT_REFRESH_MARGIN_SECS),
        );
        margin.min(validity / 2)
    }

    pub fn resolver_capacity(&self) -> NonZeroUsize {
        let capacity = self
            .resolver
            .capacity
            .unwrap_or(DEFAULT_RESOLVER_CAPACITY)
            .clamp(MIN_RESOLVER_CAPACITY, MAX_RESOLVER_CAPACITY);
        NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV) {
        return Some(PathBuf::from(dir).join(CONFIG_FILE));
    }
    dirs::config_dir().map(|mut path| {
        path.push(APP_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

pub fn load() -> Result<EngineConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(EngineConfig::default())
}

pub fn save(config: &EngineConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Reads a configuration file. Unparseable content yields the defaults.
pub fn load_from_path(path: &Path) -> Result<EngineConfig> {
    let content = fs::read_to_string(path)?;
    match toml::from_str(&content) {
        Ok(config) => Ok(config),
        Err(err) => {
            tracing::warn!(path = %path.display(), %err, "ignoring invalid engine config");
            Ok(EngineConfig::default())
        }
    }
}

pub fn save_to_path(config: &EngineConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}
