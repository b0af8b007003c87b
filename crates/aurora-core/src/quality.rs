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

//! Discrete rendering quality tiers and the presets attached to them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered rendering quality tier.
///
/// Ordering follows rendering cost: `Minimal < Low < Medium < High < Ultra`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    /// Bare minimum: few particles, no effects, reduced update rate.
    Minimal,
    /// Cheap rendering for weak devices.
    Low,
    /// Balanced default.
    #[default]
    Medium,
    /// Shadows and post-processing enabled.
    High,
    /// Everything enabled, no LOD.
    Ultra,
}

impl QualityLevel {
    /// All levels, from cheapest to most expensive.
    pub const ALL: [QualityLevel; 5] = [
        QualityLevel::Minimal,
        QualityLevel::Low,
        QualityLevel::Medium,
        QualityLevel::High,
        QualityLevel::Ultra,
    ];

    /// Position of the level in [`QualityLevel::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Returns the level at `index`, saturating at `Ultra`.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index.min(Self::ALL.len() - 1)]
    }

    /// The next more expensive level, or `self` if already at the top.
    pub fn step_up(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    /// The next cheaper level, or `self` if already at the bottom.
    pub fn step_down(self) -> Self {
        Self::from_index(self.index().saturating_sub(1))
    }

    /// Number of tiers between two levels.
    pub fn distance(self, other: Self) -> usize {
        self.index().abs_diff(other.index())
    }

    /// Moves one tier from `self` towards `target`.
    ///
    /// Returns `target` itself when it is at most one tier away.
    pub fn step_towards(self, target: Self) -> Self {
        match target.cmp(&self) {
            std::cmp::Ordering::Greater => self.step_up(),
            std::cmp::Ordering::Less => self.step_down(),
            std::cmp::Ordering::Equal => self,
        }
    }

    /// Returns the preset attached to this level.
    pub fn settings(self) -> &'static QualitySettings {
        QualitySettings::for_level(self)
    }
}

impl fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QualityLevel::Minimal => "minimal",
            QualityLevel::Low => "low",
            QualityLevel::Medium => "medium",
            QualityLevel::High => "high",
            QualityLevel::Ultra => "ultra",
        };
        f.write_str(name)
    }
}

/// Rendering cost parameters for one quality tier.
///
/// Read-only at use sites; replaced wholesale when the level changes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QualitySettings {
    /// Upper bound on particles/objects the scene may spawn.
    pub max_particles: u32,
    /// Relative particle size multiplier.
    pub particle_size: f32,
    /// Whether shadow passes are enabled.
    pub shadows: bool,
    /// Whether post-processing passes are enabled.
    pub post_processing: bool,
    /// Whether expensive shader effects are enabled.
    pub complex_effects: bool,
    /// Whether anti-aliasing is enabled.
    pub antialias: bool,
    /// Upper bound applied to the device pixel ratio.
    pub max_pixel_ratio: f32,
    /// Animation fidelity multiplier in `[0, 1]`.
    pub animation_quality: f32,
    /// Animation update divisor; `1` advances every frame, `3` every third frame.
    pub update_frequency: u32,
    /// Whether level-of-detail meshes are used.
    pub lod_enabled: bool,
    /// Ceiling on draw calls per frame.
    pub max_draw_calls: u32,
    /// Texture resolution multiplier.
    pub texture_quality: f32,
}

const MINIMAL: QualitySettings = QualitySettings {
    max_particles: 500,
    particle_size: 0.6,
    shadows: false,
    post_processing: false,
    complex_effects: false,
    antialias: false,
    max_pixel_ratio: 1.0,
    animation_quality: 0.5,
    update_frequency: 3,
    lod_enabled: true,
    max_draw_calls: 50,
    texture_quality: 0.25,
};

const LOW: QualitySettings = QualitySettings {
    max_particles: 1_500,
    particle_size: 0.8,
    shadows: false,
    post_processing: false,
    complex_effects: false,
    antialias: false,
    max_pixel_ratio: 1.0,
    animation_quality: 0.7,
    update_frequency: 2,
    lod_enabled: true,
    max_draw_calls: 100,
    texture_quality: 0.5,
};

const MEDIUM: QualitySettings = QualitySettings {
    max_particles: 3_000,
    particle_size: 1.0,
    shadows: false,
    post_processing: false,
    complex_effects: false,
    antialias: true,
    max_pixel_ratio: 1.5,
    animation_quality: 0.85,
    update_frequency: 1,
    lod_enabled: true,
    max_draw_calls: 200,
    texture_quality: 0.75,
};

const HIGH: QualitySettings = QualitySettings {
    max_particles: 6_000,
    particle_size: 1.0,
    shadows: true,
    post_processing: true,
    complex_effects: false,
    antialias: true,
    max_pixel_ratio: 2.0,
    animation_quality: 1.0,
    update_frequency: 1,
    lod_enabled: true,
    max_draw_calls: 400,
    texture_quality: 1.0,
};

const ULTRA: QualitySettings = QualitySettings {
    max_particles: 10_000,
    particle_size: 1.2,
    shadows: true,
    post_processing: true,
    complex_effects: true,
    antialias: true,
    max_pixel_ratio: 2.0,
    animation_quality: 1.0,
    update_frequency: 1,
    lod_enabled: false,
    max_draw_calls: 800,
    texture_quality: 1.0,
};

impl QualitySettings {
    /// Returns the preset for `level`.
    pub fn for_level(level: QualityLevel) -> &'static QualitySettings {
        match level {
            QualityLevel::Minimal => &MINIMAL,
            QualityLevel::Low => &LOW,
            QualityLevel::Medium => &MEDIUM,
            QualityLevel::High => &HIGH,
            QualityLevel::Ultra => &ULTRA,
        }
    }

    /// Whether the animation should advance on `frame_index` under
    /// [`update_frequency`](Self::update_frequency).
    pub fn should_update(&self, frame_index: u64) -> bool {
        frame_index % u64::from(self.update_frequency.max(1)) == 0
    }

    /// Clamps a device pixel ratio to this tier's cap.
    pub fn effective_pixel_ratio(&self, device_pixel_ratio: f32) -> f32 {
        device_pixel_ratio.min(self.max_pixel_ratio).max(0.5)
    }
}

impl Default for QualitySettings {
    fn default() -> Self {
        *Self::for_level(QualityLevel::default())
    }
}
