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

//! Render tick gating.

use aurora_core::PerformanceMetrics;
use aurora_telemetry::RingBuffer;
use std::time::Instant;

/// Number of observed render intervals the adaptive threshold averages.
const INTERVAL_HISTORY: usize = 10;

/// Fraction of the observed average interval used as the adaptive threshold.
const ADAPTIVE_FACTOR: f32 = 0.9;

/// Decides whether a tick should render.
///
/// The threshold is the target frame interval, stretched to 90 % of the
/// recently observed interval when the device cannot keep up. A slow device
/// then skips ticks it would only render late instead of queueing them.
#[derive(Debug, Clone)]
pub struct RenderRateLimiter {
    target_fps: u32,
    last_render: Option<Instant>,
    intervals: RingBuffer<f32>,
}

impl RenderRateLimiter {
    /// Creates a limiter that renders its first tick unconditionally.
    pub fn new(target_fps: u32) -> Self {
        Self {
            target_fps: target_fps.max(1),
            last_render: None,
            intervals: RingBuffer::new(INTERVAL_HISTORY),
        }
    }

    /// Whether the tick at `now` should render.
    pub fn should_render(&mut self, now: Instant) -> bool {
        let Some(last) = self.last_render else {
            self.last_render = Some(now);
            return true;
        };

        let elapsed_ms = now.saturating_duration_since(last).as_secs_f32() * 1000.0;
        if elapsed_ms < self.threshold_ms() {
            return false;
        }
        self.intervals.push(elapsed_ms);
        self.last_render = Some(now);
        true
    }

    /// Current threshold between two rendered ticks, in milliseconds.
    pub fn threshold_ms(&self) -> f32 {
        let target = PerformanceMetrics::target_frame_time_ms(self.target_fps);
        target.max(self.intervals.average() * ADAPTIVE_FACTOR)
    }

    /// FPS the limiter aims for.
    pub fn target_fps(&self) -> u32 {
        self.target_fps
    }

    /// Changes the target; the next call already uses it.
    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.target_fps = target_fps.max(1);
    }

    /// Forgets the history; the next tick renders unconditionally.
    pub fn reset(&mut self) {
        self.last_render = None;
        self.intervals.clear();
    }
}
