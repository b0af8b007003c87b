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

//! Adaptive quality control.
//!
//! The controller is a pure state machine: it is fed one
//! [`PerformanceMetrics`] per window and answers with an optional
//! [`QualityTransition`]. Two mechanisms keep it from oscillating:
//!
//! 1. **Cooldown**: no transition within `transition_cooldown_ms` of the last
//!    one (or of construction).
//! 2. **Step limiting**: the level moves at most one tier per transition, even
//!    when the heuristic target is further away.
//!
//! [`force_level`](AdaptiveQualityController::force_level) bypasses both; it
//! is reserved for the emergency path.

use aurora_core::config::QualityConfig;
use aurora_core::{PerformanceMetrics, QualityLevel, QualitySettings};
use aurora_telemetry::RingBuffer;
use std::time::Instant;

/// Minimum FPS for the `High` tier.
const HIGH_MIN_FPS: u32 = 50;
/// Minimum FPS for the `Medium` tier.
const MEDIUM_MIN_FPS: u32 = 40;
/// Minimum FPS for the `Low` tier.
const LOW_MIN_FPS: u32 = 30;

/// Smoothed stability required for `Ultra`.
const ULTRA_MIN_STABILITY: f32 = 0.8;
/// Smoothed stability required for `High`.
const HIGH_MIN_STABILITY: f32 = 0.7;
/// Smoothed stability required for `Medium`.
const MEDIUM_MIN_STABILITY: f32 = 0.6;

/// A change of quality level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QualityTransition {
    /// Level before the change.
    pub from: QualityLevel,
    /// Level after the change.
    pub to: QualityLevel,
    /// When the change happened.
    pub at: Instant,
}

impl QualityTransition {
    /// Whether the change made rendering more expensive.
    pub fn is_upgrade(&self) -> bool {
        self.to > self.from
    }
}

/// Maps frame metrics to a quality tier with hysteresis.
#[derive(Debug)]
pub struct AdaptiveQualityController {
    level: QualityLevel,
    ceiling: QualityLevel,
    target_fps: u32,
    config: QualityConfig,
    stability: RingBuffer<f32>,
    last_transition: Instant,
    transitions: u32,
}

impl AdaptiveQualityController {
    /// Creates a controller at `initial`; the cooldown starts at `now`.
    pub fn new(initial: QualityLevel, config: QualityConfig, target_fps: u32, now: Instant) -> Self {
        Self {
            level: initial,
            ceiling: QualityLevel::Ultra,
            target_fps: target_fps.max(1),
            stability: RingBuffer::new(config.stability_window),
            config,
            last_transition: now,
            transitions: 0,
        }
    }

    /// Caps the reachable level. The current level is lowered if it is above.
    pub fn with_ceiling(mut self, ceiling: QualityLevel) -> Self {
        self.ceiling = ceiling;
        self.level = self.level.min(ceiling);
        self
    }

    /// Current level.
    pub fn current_level(&self) -> QualityLevel {
        self.level
    }

    /// Preset of the current level.
    pub fn settings(&self) -> &'static QualitySettings {
        self.level.settings()
    }

    /// Highest reachable level.
    pub fn ceiling(&self) -> QualityLevel {
        self.ceiling
    }

    /// FPS the `Ultra` tier requires.
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Changes the FPS the `Ultra` tier requires.
    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.target_fps = target_fps.max(1);
    }

    /// Mean of the recent stability samples (1.0 before the first sample).
    pub fn smoothed_stability(&self) -> f32 {
        if self.stability.is_empty() {
            1.0
        } else {
            self.stability.average()
        }
    }

    /// Number of transitions since construction, forced ones included.
    pub fn transition_count(&self) -> u32 {
        self.transitions
    }

    /// Feeds one window of metrics.
    ///
    /// Returns the transition if the level changed.
    pub fn evaluate(&mut self, metrics: &PerformanceMetrics, now: Instant) -> Option<QualityTransition> {
        self.stability.push(metrics.stability);

        if now.saturating_duration_since(self.last_transition) < self.config.cooldown() {
            return None;
        }

        let target = self.target_level(metrics.fps).min(self.ceiling);
        let next = self.level.step_towards(target);
        if next == self.level {
            return None;
        }

        log::debug!(
            "AdaptiveQualityController: {} -> {} (fps {}, stability {:.2}, target {})",
            self.level,
            next,
            metrics.fps,
            self.smoothed_stability(),
            target
        );
        Some(self.apply(next, now))
    }

    /// Sets the level directly, bypassing cooldown and step limiting.
    ///
    /// Moves above the ceiling are clamped to it. The cooldown restarts even
    /// when the level does not change.
    pub fn force_level(&mut self, level: QualityLevel, now: Instant) -> Option<QualityTransition> {
        let level = level.min(self.ceiling);
        if level == self.level {
            self.last_transition = now;
            return None;
        }
        log::warn!(
            "AdaptiveQualityController: forced {} -> {}",
            self.level,
            level
        );
        Some(self.apply(level, now))
    }

    fn target_level(&self, fps: u32) -> QualityLevel {
        let stability = self.smoothed_stability();
        if fps >= self.target_fps && stability > ULTRA_MIN_STABILITY {
            QualityLevel::Ultra
        } else if fps >= HIGH_MIN_FPS && stability > HIGH_MIN_STABILITY {
            QualityLevel::High
        } else if fps >= MEDIUM_MIN_FPS && stability > MEDIUM_MIN_STABILITY {
            QualityLevel::Medium
        } else if fps >= LOW_MIN_FPS {
            QualityLevel::Low
        } else {
            QualityLevel::Minimal
        }
    }

    fn apply(&mut self, level: QualityLevel, now: Instant) -> QualityTransition {
        let transition = QualityTransition {
            from: self.level,
            to: level,
            at: now,
        };
        self.level = level;
        self.last_transition = now;
        self.transitions += 1;
        transition
    }
}
