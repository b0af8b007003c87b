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

//! The state the recurring tasks mutate, and the tasks themselves.

use aurora_control::{AdaptiveQualityController, FrameScheduler};
use aurora_core::config::GovernorConfig;
use aurora_core::platform::{MemoryReclaim, RenderTarget};
use aurora_core::{PerformanceMetrics, QualityLevel};
use aurora_data::ResourceCacheManager;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

const CLEANUP_PRIORITY: i32 = 10;
const EMERGENCY_PRIORITY: i32 = 100;
const FLUSH_PRIORITY: i32 = 0;

/// Everything the governor's scheduled tasks can touch.
pub(crate) struct GovernorState {
    pub(crate) config: GovernorConfig,
    pub(crate) caches: Arc<Mutex<ResourceCacheManager>>,
    pub(crate) quality: AdaptiveQualityController,
    pub(crate) render_target: Option<Box<dyn RenderTarget>>,
    pub(crate) reclaim: Box<dyn MemoryReclaim>,
    pub(crate) last_metrics: Option<PerformanceMetrics>,
    pub(crate) emergency_count: u32,
    /// Instant of the tick being processed.
    pub(crate) now: Instant,
}

impl GovernorState {
    pub(crate) fn lock_caches(&self) -> MutexGuard<'_, ResourceCacheManager> {
        lock(&self.caches)
    }

    /// Engages the emergency path when the device is struggling.
    ///
    /// Returns `true` if it engaged.
    pub(crate) fn check_emergency(&mut self) -> bool {
        let low_fps = self.last_metrics.is_some_and(|m| m.is_below_low);
        let memory = self.lock_caches().memory_usage();
        let over_ceiling = memory > self.config.cache.memory_ceiling_bytes;
        if !low_fps && !over_ceiling {
            return false;
        }

        log::warn!(
            "PerformanceGovernor: emergency ({} FPS, {} bytes cached) -> forcing minimal quality",
            self.last_metrics.map(|m| m.fps).unwrap_or_default(),
            memory
        );
        self.quality.force_level(QualityLevel::Minimal, self.now);
        self.lock_caches().aggressive_cleanup();
        self.reclaim.request_memory_reclaim();
        self.emergency_count += 1;
        true
    }

    pub(crate) fn flush_render_target(&mut self) {
        if let Some(target) = self.render_target.as_mut() {
            log::trace!("PerformanceGovernor: flushing {}", target.label());
            target.flush();
        }
    }
}

/// Registers the three recurring maintenance tasks.
pub(crate) fn register_tasks(scheduler: &mut FrameScheduler<GovernorState>, config: &GovernorConfig) {
    let scheduling = &config.scheduler;

    scheduler.add_task(
        "emergency-check",
        EMERGENCY_PRIORITY,
        Duration::from_millis(scheduling.emergency_check_interval_ms),
        |state: &mut GovernorState| {
            state.check_emergency();
            Ok(())
        },
    );
    scheduler.add_task(
        "memory-cleanup",
        CLEANUP_PRIORITY,
        Duration::from_millis(scheduling.memory_cleanup_interval_ms),
        |state: &mut GovernorState| {
            let now = state.now;
            state.lock_caches().cleanup(now);
            Ok(())
        },
    );
    scheduler.add_task(
        "render-flush",
        FLUSH_PRIORITY,
        Duration::from_millis(scheduling.flush_interval_ms),
        |state: &mut GovernorState| {
            state.flush_render_target();
            Ok(())
        },
    );
}

pub(crate) fn lock(caches: &Mutex<ResourceCacheManager>) -> MutexGuard<'_, ResourceCacheManager> {
    caches.lock().unwrap_or_else(PoisonError::into_inner)
}
