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

//! Summary statistics of one frame timing window.

use serde::{Deserialize, Serialize};

/// A statistical summary of frame timing over one sampling window (~1s).
///
/// Values are immutable once emitted. Subscribers receive them by reference and
/// must copy what they want to keep.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    /// Frames per second over the window, rounded to the nearest integer.
    pub fps: u32,
    /// Mean frame time over the sample buffer, in milliseconds.
    pub average_frame_time_ms: f32,
    /// Longest frame time in the sample buffer, in milliseconds.
    pub max_frame_time_ms: f32,
    /// Shortest frame time in the sample buffer, in milliseconds.
    pub min_frame_time_ms: f32,
    /// Population variance of the frame times (ms²).
    pub frame_time_variance: f32,
    /// Inverse coefficient of variation of the frame times, in `[0, 1]`.
    ///
    /// `1.0` means perfectly even pacing; values near `0.0` mean heavy jitter.
    pub stability: f32,
    /// Number of sampled frames that took longer than twice the target frame time.
    pub frame_drops: u32,
    /// `true` when the FPS is within 5% of the target.
    pub is_at_target: bool,
    /// `true` when the FPS is below the critical threshold.
    pub is_below_critical: bool,
    /// `true` when the FPS is below the low threshold.
    pub is_below_low: bool,
    /// Actual length of the aggregation window, in milliseconds.
    pub window_ms: f32,
    /// Number of frames observed during the window.
    pub frame_count: u32,
}

impl PerformanceMetrics {
    /// Returns the frame time budget implied by a target frame rate, in milliseconds.
    pub fn target_frame_time_ms(target_fps: u32) -> f32 {
        1000.0 / target_fps.max(1) as f32
    }

    /// Returns the standard deviation of the frame times, in milliseconds.
    pub fn frame_time_stddev_ms(&self) -> f32 {
        self.frame_time_variance.max(0.0).sqrt()
    }
}

/// Derives a stability score from a mean and a standard deviation.
///
/// The score is `max(0, 1 - stddev / mean)`, clamped to `[0, 1]`. A zero (or
/// non-finite) mean carries no jitter information and scores `1.0`.
pub fn stability_score(mean: f32, stddev: f32) -> f32 {
    if !mean.is_finite() || mean <= f32::EPSILON || !stddev.is_finite() {
        return 1.0;
    }
    (1.0 - stddev / mean).clamp(0.0, 1.0)
}
