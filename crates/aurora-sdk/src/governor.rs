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

//! The performance governor.
//!
//! The governor closes the loop between measurement and rendering cost. On
//! every frame it:
//!
//! 1. samples the frame time ([`FrameTimingMonitor`]),
//! 2. runs the due maintenance tasks (cache cleanup, render flush hint,
//!    emergency check) under the frame budget ([`FrameScheduler`]),
//! 3. once per window, records the metrics, lets the
//!    [`AdaptiveQualityController`] pick a tier and notifies observers.

use crate::maintenance::{self, GovernorState};
use crate::observers::{ObserverId, ObserverRegistry};
use aurora_control::{AdaptiveQualityController, FrameScheduler, RenderRateLimiter};
use aurora_core::config::GovernorConfig;
use aurora_core::platform::{DeviceCapabilities, MemoryReclaim, NoopReclaim, RenderTarget};
use aurora_core::{PerformanceMetrics, QualityLevel, QualitySettings};
use aurora_data::ResourceCacheManager;
use aurora_io::{PreloadProgress, PreloadSummary, PreloadTask, Preloader};
use aurora_telemetry::{FrameTimingMonitor, RingBuffer};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Adaptive rendering performance governor.
///
/// Constructed explicitly by the host and driven from its animation callback.
/// Nothing runs until [`initialize`](Self::initialize) is called.
pub struct PerformanceGovernor {
    capabilities: DeviceCapabilities,
    monitor: FrameTimingMonitor,
    scheduler: FrameScheduler<GovernorState>,
    state: GovernorState,
    preloader: Arc<Preloader>,
    observers: ObserverRegistry,
    history: RingBuffer<PerformanceMetrics>,
    rate_limiter: RenderRateLimiter,
    initialized: bool,
    tasks_registered: bool,
}

impl PerformanceGovernor {
    /// Builds a governor for a device.
    ///
    /// The starting quality tier and its ceiling come from `capabilities`.
    pub fn new(config: GovernorConfig, capabilities: DeviceCapabilities) -> Self {
        let target_fps = config.monitor.target_fps;
        let caches = Arc::new(Mutex::new(ResourceCacheManager::new(&config.cache)));
        let preloader = Arc::new(Preloader::new(config.preload.clone()).with_cache(caches.clone()));
        let quality = AdaptiveQualityController::new(
            capabilities.initial_quality(),
            config.quality.clone(),
            target_fps,
            Instant::now(),
        )
        .with_ceiling(capabilities.quality_ceiling());

        log::info!(
            "PerformanceGovernor: created for {:?} device, starting at {} (ceiling {})",
            capabilities.class(),
            quality.current_level(),
            quality.ceiling()
        );

        Self {
            capabilities,
            monitor: FrameTimingMonitor::new(config.monitor.clone()),
            scheduler: FrameScheduler::with_budget_utilization(config.scheduler.budget_utilization),
            history: RingBuffer::new(config.history_len),
            rate_limiter: RenderRateLimiter::new(target_fps),
            preloader,
            observers: ObserverRegistry::default(),
            state: GovernorState {
                config,
                caches,
                quality,
                render_target: None,
                reclaim: Box::new(NoopReclaim),
                last_metrics: None,
                emergency_count: 0,
                now: Instant::now(),
            },
            initialized: false,
            tasks_registered: false,
        }
    }

    /// Attaches the renderer that receives the periodic flush hint.
    pub fn with_render_target(mut self, target: Box<dyn RenderTarget>) -> Self {
        self.state.render_target = Some(target);
        self
    }

    /// Replaces the no-op memory reclaim hook.
    pub fn with_memory_reclaim(mut self, reclaim: Box<dyn MemoryReclaim>) -> Self {
        self.state.reclaim = reclaim;
        self
    }

    /// Starts monitoring and the recurring tasks. Calling it again does nothing.
    pub fn initialize(&mut self, now: Instant) {
        if self.initialized {
            return;
        }
        if !self.tasks_registered {
            maintenance::register_tasks(&mut self.scheduler, &self.state.config);
            self.tasks_registered = true;
        }
        self.state.now = now;
        // Windows measured before a dispose must not feed the emergency check.
        self.state.last_metrics = None;
        self.monitor.start(now);
        self.scheduler.start();
        self.initialized = true;
        log::info!(
            "PerformanceGovernor: initialized (target {} FPS, quality {})",
            self.monitor.target_fps(),
            self.current_quality()
        );
    }

    /// Stops monitoring and the recurring tasks and drops every observer.
    ///
    /// Caches and queued preload tasks are kept; [`initialize`](Self::initialize)
    /// restarts the governor.
    pub fn dispose(&mut self) {
        if !self.initialized {
            return;
        }
        self.monitor.stop();
        self.scheduler.stop();
        self.observers.clear();
        self.rate_limiter.reset();
        self.initialized = false;
        log::info!("PerformanceGovernor: disposed");
    }

    /// Whether [`initialize`](Self::initialize) has run and `dispose` has not.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The per-frame entry point.
    ///
    /// Returns the window summary when this frame closed a window.
    pub fn on_frame(&mut self, now: Instant) -> Option<PerformanceMetrics> {
        if !self.initialized {
            return None;
        }

        let window = self.monitor.record_frame(now);

        self.state.now = now;
        let budget = Duration::from_secs_f32(
            PerformanceMetrics::target_frame_time_ms(self.monitor.target_fps()) / 1000.0,
        );
        let report = self.scheduler.run_frame(&mut self.state, now, budget);
        if report.failed > 0 {
            log::debug!("PerformanceGovernor: {} maintenance tasks failed", report.failed);
        }

        let metrics = window?;
        self.history.push(metrics);
        self.state.last_metrics = Some(metrics);
        if let Some(transition) = self.state.quality.evaluate(&metrics, now) {
            log::info!(
                "PerformanceGovernor: quality {} -> {} at {} FPS",
                transition.from,
                transition.to,
                metrics.fps
            );
        }
        self.observers.notify(&metrics);
        Some(metrics)
    }

    /// Whether the tick at `now` should render.
    pub fn should_render(&mut self, now: Instant) -> bool {
        self.rate_limiter.should_render(now)
    }

    /// Current quality tier.
    pub fn current_quality(&self) -> QualityLevel {
        self.state.quality.current_level()
    }

    /// Preset of the current quality tier.
    pub fn quality_settings(&self) -> &'static QualitySettings {
        self.state.quality.settings()
    }

    /// Subscribes to the metrics of every window.
    ///
    /// Observers run inline on the frame path. A panicking observer is logged
    /// and the others still run.
    pub fn on_performance_update<F>(&mut self, observer: F) -> ObserverId
    where
        F: FnMut(&PerformanceMetrics) + 'static,
    {
        self.observers.subscribe(Box::new(observer))
    }

    /// Unsubscribes an observer. Returns `false` if it was unknown.
    pub fn off_performance_update(&mut self, id: ObserverId) -> bool {
        self.observers.unsubscribe(id)
    }

    /// Number of subscribed observers.
    pub fn observer_count(&self) -> usize {
        self.observers.len()
    }

    /// Sheds load on demand: evicts expired entries, steps quality down one
    /// tier (ignoring the cooldown) and asks the platform to reclaim memory.
    pub fn trigger_optimization(&mut self, now: Instant) {
        let evicted = self.state.lock_caches().cleanup(now);
        let target = self.current_quality().step_down();
        self.state.quality.force_level(target, now);
        self.state.reclaim.request_memory_reclaim();
        log::info!(
            "PerformanceGovernor: manual optimization ({} entries evicted, quality {})",
            evicted,
            self.current_quality()
        );
    }

    /// Estimated bytes held by the caches.
    pub fn memory_usage(&self) -> usize {
        self.state.lock_caches().memory_usage()
    }

    /// Queues an asset for the next preload run.
    pub fn add_preload_task(&self, task: PreloadTask) {
        self.preloader.add_task(task);
    }

    /// Drains the preload queues.
    ///
    /// The returned future owns a handle to the preloader, so it can be
    /// spawned or awaited while the governor keeps serving frames.
    pub fn preload_critical_resources<F>(
        &self,
        on_progress: F,
    ) -> impl Future<Output = PreloadSummary> + 'static
    where
        F: FnMut(&PreloadProgress) + 'static,
    {
        let preloader = Arc::clone(&self.preloader);
        async move { preloader.preload_all(on_progress).await }
    }

    /// The shared resource caches.
    pub fn caches(&self) -> &Arc<Mutex<ResourceCacheManager>> {
        &self.state.caches
    }

    /// The shared preloader.
    pub fn preloader(&self) -> &Arc<Preloader> {
        &self.preloader
    }

    /// FPS of the last window.
    pub fn fps(&self) -> u32 {
        self.monitor.fps()
    }

    /// Metrics of the last window.
    pub fn latest_metrics(&self) -> Option<PerformanceMetrics> {
        self.history.latest().copied()
    }

    /// Recent windows, oldest first.
    pub fn metrics_history(&self) -> Vec<PerformanceMetrics> {
        self.history.iter().copied().collect()
    }

    /// Changes the target frame rate of the monitor, controller and limiter.
    pub fn set_target_fps(&mut self, target_fps: u32) {
        let target_fps = target_fps.max(1);
        self.monitor.set_target_fps(target_fps);
        self.state.quality.set_target_fps(target_fps);
        self.rate_limiter.set_target_fps(target_fps);
        log::info!("PerformanceGovernor: target set to {} FPS", target_fps);
    }

    /// How many times the emergency path engaged.
    pub fn emergency_count(&self) -> u32 {
        self.state.emergency_count
    }

    /// The capabilities the governor was built for.
    pub fn capabilities(&self) -> &DeviceCapabilities {
        &self.capabilities
    }

    /// The active configuration.
    pub fn config(&self) -> &GovernorConfig {
        &self.state.config
    }
}

impl Drop for PerformanceGovernor {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl fmt::Debug for PerformanceGovernor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PerformanceGovernor")
            .field("initialized", &self.initialized)
            .field("quality", &self.current_quality())
            .field("fps", &self.fps())
            .field("emergencies", &self.state.emergency_count)
            .field("observers", &self.observers.len())
            .field("scheduler", &self.scheduler)
            .finish()
    }
}
