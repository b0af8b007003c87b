// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Tunables for every component of the governor.
//!
//! Every section has sensible defaults, so a JSON file only needs to name the
//! values it overrides:
//!
//! ```json
//! { "monitor": { "target_fps": 30 }, "cache": { "ttl_secs": 120 } }
//! ```

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const MIB: usize = 1024 * 1024;

/// Top-level configuration of the performance governor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Frame timing monitor settings.
    pub monitor: MonitorConfig,
    /// Adaptive quality controller settings.
    pub quality: QualityConfig,
    /// Frame scheduler and recurring task settings.
    pub scheduler: SchedulerConfig,
    /// Resource cache settings.
    pub cache: CacheConfig,
    /// Preloader settings.
    pub preload: PreloadConfig,
    /// Number of metrics windows kept for trend smoothing.
    pub history_len: usize,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            monitor: MonitorConfig::default(),
            quality: QualityConfig::default(),
            scheduler: SchedulerConfig::default(),
            cache: CacheConfig::default(),
            preload: PreloadConfig::default(),
            history_len: 20,
        }
    }
}

/// Frame timing monitor settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Frame rate the scene aims for.
    pub target_fps: u32,
    /// Below this FPS the device is struggling; the emergency path engages.
    pub low_fps_threshold: u32,
    /// Below this FPS the scene is barely usable.
    pub critical_fps_threshold: u32,
    /// Length of one aggregation window, in milliseconds.
    pub window_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            low_fps_threshold: 30,
            critical_fps_threshold: 20,
            window_ms: 1000,
        }
    }
}

impl MonitorConfig {
    /// Aggregation window as a [`Duration`].
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Adaptive quality controller settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    /// Minimum time between two transitions, in milliseconds.
    pub transition_cooldown_ms: u64,
    /// Number of stability samples averaged before deciding.
    pub stability_window: usize,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            transition_cooldown_ms: 2000,
            stability_window: 10,
        }
    }
}

impl QualityConfig {
    /// Transition cooldown as a [`Duration`].
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.transition_cooldown_ms)
    }
}

/// Frame scheduler and recurring task settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Fraction of the frame budget tasks may consume before deferring the rest.
    pub budget_utilization: f32,
    /// Interval of the cache cleanup task, in milliseconds.
    pub memory_cleanup_interval_ms: u64,
    /// Interval of the render pipeline flush hint, in milliseconds.
    pub flush_interval_ms: u64,
    /// Interval of the emergency check, in milliseconds.
    pub emergency_check_interval_ms: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            budget_utilization: 0.8,
            memory_cleanup_interval_ms: 10_000,
            flush_interval_ms: 5_000,
            emergency_check_interval_ms: 1_000,
        }
    }
}

/// Bounds of one cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheLimits {
    /// Maximum number of entries.
    pub max_entries: usize,
    /// Maximum estimated bytes.
    pub max_bytes: usize,
}

impl CacheLimits {
    /// Creates limits from an entry count and a byte budget.
    pub const fn new(max_entries: usize, max_bytes: usize) -> Self {
        Self {
            max_entries,
            max_bytes,
        }
    }
}

/// Resource cache settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Time after which an entry expires, in seconds.
    pub ttl_secs: u64,
    /// Limits of the texture cache.
    pub textures: CacheLimits,
    /// Limits of the geometry cache.
    pub geometries: CacheLimits,
    /// Limits of the material cache.
    pub materials: CacheLimits,
    /// Limits of the shader cache.
    pub shaders: CacheLimits,
    /// Cache memory above which the emergency path engages, in bytes.
    pub memory_ceiling_bytes: usize,
    /// Fraction of the limits kept by an aggressive cleanup.
    pub aggressive_retain_fraction: f32,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            textures: CacheLimits::new(100, 256 * MIB),
            geometries: CacheLimits::new(200, 128 * MIB),
            materials: CacheLimits::new(200, 16 * MIB),
            shaders: CacheLimits::new(50, 16 * MIB),
            memory_ceiling_bytes: 512 * MIB,
            aggressive_retain_fraction: 0.5,
        }
    }
}

impl CacheConfig {
    /// Entry time-to-live as a [`Duration`].
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Most bytes the caches can still hold right after an aggressive cleanup.
    pub fn retained_bytes_after_cleanup(&self) -> usize {
        let fraction = f64::from(self.aggressive_retain_fraction.clamp(0.0, 1.0));
        [self.textures, self.geometries, self.materials, self.shaders]
            .iter()
            .map(|limits| (limits.max_bytes as f64 * fraction).floor() as usize)
            .sum()
    }
}

/// Preloader settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreloadConfig {
    /// Concurrent loads per batch for high-priority tasks.
    pub high_batch_size: usize,
    /// Concurrent loads per batch for medium-priority tasks.
    pub medium_batch_size: usize,
    /// Concurrent loads per batch for low-priority tasks.
    pub low_batch_size: usize,
    /// Pause between batches, in milliseconds.
    pub batch_yield_ms: u64,
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            high_batch_size: 3,
            medium_batch_size: 5,
            low_batch_size: 8,
            batch_yield_ms: 16,
        }
    }
}

impl PreloadConfig {
    /// Inter-batch pause as a [`Duration`].
    pub fn batch_yield(&self) -> Duration {
        Duration::from_millis(self.batch_yield_ms)
    }
}

impl GovernorConfig {
    /// Parses a configuration from JSON and validates it.
    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a JSON configuration file.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json_str(&json)?;
        log::info!("Loaded governor config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Checks that every value is usable.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.monitor.target_fps == 0 {
            return Err(invalid("monitor.target_fps", "must be greater than zero"));
        }
        if self.monitor.window_ms == 0 {
            return Err(invalid("monitor.window_ms", "must be greater than zero"));
        }
        if self.monitor.critical_fps_threshold > self.monitor.low_fps_threshold {
            return Err(invalid(
                "monitor.critical_fps_threshold",
                format!(
                    "{} is above the low threshold {}",
                    self.monitor.critical_fps_threshold, self.monitor.low_fps_threshold
                ),
            ));
        }
        if self.quality.stability_window == 0 {
            return Err(invalid("quality.stability_window", "must be at least 1"));
        }
        let utilization = self.scheduler.budget_utilization;
        if !(utilization > 0.0 && utilization <= 1.0) {
            return Err(invalid(
                "scheduler.budget_utilization",
                format!("{utilization} is outside (0, 1]"),
            ));
        }
        let retain = self.cache.aggressive_retain_fraction;
        if !(0.0..=1.0).contains(&retain) {
            return Err(invalid(
                "cache.aggressive_retain_fraction",
                format!("{retain} is outside [0, 1]"),
            ));
        }
        for (field, limits) in [
            ("cache.textures", self.cache.textures),
            ("cache.geometries", self.cache.geometries),
            ("cache.materials", self.cache.materials),
            ("cache.shaders", self.cache.shaders),
        ] {
            if limits.max_entries == 0 || limits.max_bytes == 0 {
                return Err(invalid(field, "limits must be greater than zero"));
            }
        }
        // An aggressive cleanup must be able to bring the caches under the ceiling.
        let retained = self.cache.retained_bytes_after_cleanup();
        if self.cache.memory_ceiling_bytes < retained {
            return Err(invalid(
                "cache.memory_ceiling_bytes",
                format!(
                    "{} is below the {} bytes an aggressive cleanup retains",
                    self.cache.memory_ceiling_bytes, retained
                ),
            ));
        }
        for (field, size) in [
            ("preload.high_batch_size", self.preload.high_batch_size),
            ("preload.medium_batch_size", self.preload.medium_batch_size),
            ("preload.low_batch_size", self.preload.low_batch_size),
        ] {
            if size == 0 {
                return Err(invalid(field, "must be at least 1"));
            }
        }
        if self.history_len == 0 {
            return Err(invalid("history_len", "must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(GovernorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = GovernorConfig::from_json_str(
            r#"{ "monitor": { "target_fps": 30 }, "cache": { "ttl_secs": 120 } }"#,
        )
        .unwrap();
        assert_eq!(config.monitor.target_fps, 30);
        assert_eq!(config.monitor.low_fps_threshold, 30);
        assert_eq!(config.cache.ttl(), Duration::from_secs(120));
        assert_eq!(config.cache.textures, CacheConfig::default().textures);
        assert_eq!(config.preload.high_batch_size, 3);
    }

    #[test]
    fn test_zero_target_fps_is_rejected() {
        let err = GovernorConfig::from_json_str(r#"{ "monitor": { "target_fps": 0 } }"#)
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "monitor.target_fps",
                ..
            }
        ));
    }

    #[test]
    fn test_inverted_thresholds_are_rejected() {
        let mut config = GovernorConfig::default();
        config.monitor.critical_fps_threshold = 45;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_budget_utilization_bounds() {
        let mut config = GovernorConfig::default();
        config.scheduler.budget_utilization = 1.5;
        assert!(config.validate().is_err());
        config.scheduler.budget_utilization = 1.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_ceiling_below_cleanup_floor_is_rejected() {
        let mut config = GovernorConfig::default();
        // Defaults retain half of 416 MiB.
        assert_eq!(config.cache.retained_bytes_after_cleanup(), 208 * MIB);

        config.cache.memory_ceiling_bytes = 208 * MIB;
        assert!(config.validate().is_ok());

        config.cache.memory_ceiling_bytes = 100 * MIB;
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "cache.memory_ceiling_bytes",
                ..
            }
        ));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        let err = GovernorConfig::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_an_io_error() {
        let err = GovernorConfig::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
