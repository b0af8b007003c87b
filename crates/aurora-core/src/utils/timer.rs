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

//! Wall-clock stopwatch used to measure how much of a frame budget work consumes.

use std::time::{Duration, Instant};

/// Measures elapsed wall-clock time from the moment it is created or restarted.
#[derive(Debug, Clone, Copy)]
pub struct Stopwatch {
    started_at: Instant,
}

impl Stopwatch {
    /// Creates a stopwatch that starts immediately.
    #[inline]
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
        }
    }

    /// Restarts the measurement from now.
    #[inline]
    pub fn restart(&mut self) {
        self.started_at = Instant::now();
    }

    /// Returns the time elapsed since the stopwatch was started.
    #[inline]
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Returns the elapsed time in fractional milliseconds.
    #[inline]
    pub fn elapsed_ms_f32(&self) -> f32 {
        self.elapsed().as_secs_f32() * 1000.0
    }

    /// Returns `true` once `fraction` of `budget` has been spent.
    ///
    /// A zero budget is always considered exhausted.
    #[inline]
    pub fn has_consumed(&self, budget: Duration, fraction: f32) -> bool {
        if budget.is_zero() {
            return true;
        }
        self.elapsed().as_secs_f32() >= budget.as_secs_f32() * fraction
    }
}

impl Default for Stopwatch {
    fn default() -> Self {
        Self::new()
    }
}
