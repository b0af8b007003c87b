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

use aurora_sdk::prelude::*;
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

const GIB: u64 = 1024 * 1024 * 1024;

fn high_end() -> DeviceCapabilities {
    DeviceCapabilities {
        total_memory_bytes: Some(16 * GIB),
        logical_cores: 8,
        prefers_reduced_motion: false,
    }
}

struct CountingTarget(Arc<AtomicUsize>);

impl RenderTarget for CountingTarget {
    fn flush(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct CountingReclaim(Arc<AtomicUsize>);

impl MemoryReclaim for CountingReclaim {
    fn request_memory_reclaim(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct Image(u32);

impl Disposable for Image {
    fn dispose(&mut self) {}
}

impl TextureResource for Image {
    fn dimensions(&self) -> (u32, u32) {
        (self.0, self.0)
    }
}

/// Feeds `frames` frames spaced by `frame_ms` after `start` and returns the
/// instant of the last one.
fn drive(gov: &mut PerformanceGovernor, start: Instant, frame_ms: u64, frames: u64) -> Instant {
    let mut now = start;
    for _ in 0..frames {
        now += Duration::from_millis(frame_ms);
        gov.on_frame(now);
    }
    now
}

#[test]
fn test_sustained_low_fps_engages_emergency_path() {
    let reclaims = Arc::new(AtomicUsize::new(0));
    let mut gov = PerformanceGovernor::new(GovernorConfig::default(), DeviceCapabilities::default())
        .with_memory_reclaim(Box::new(CountingReclaim(reclaims.clone())));
    assert_eq!(gov.current_quality(), QualityLevel::Medium);

    let t0 = Instant::now();
    gov.initialize(t0);
    // 20 FPS for 2.5 seconds
    drive(&mut gov, t0, 50, 50);

    assert_eq!(gov.current_quality(), QualityLevel::Minimal);
    assert!(gov.emergency_count() >= 1);
    assert!(reclaims.load(Ordering::SeqCst) >= 1);
    assert_eq!(gov.fps(), 20);
}

#[test]
fn test_smooth_frames_climb_to_ultra_on_capable_device() {
    let mut gov = PerformanceGovernor::new(GovernorConfig::default(), high_end());
    assert_eq!(gov.current_quality(), QualityLevel::High);

    let t0 = Instant::now();
    gov.initialize(t0);
    drive(&mut gov, t0, 16, 250);

    assert_eq!(gov.current_quality(), QualityLevel::Ultra);
    assert_eq!(gov.emergency_count(), 0);
    assert!(gov.quality_settings().complex_effects);
}

#[test]
fn test_reduced_motion_caps_quality() {
    let caps = DeviceCapabilities {
        prefers_reduced_motion: true,
        ..high_end()
    };
    let mut gov = PerformanceGovernor::new(GovernorConfig::default(), caps);
    assert_eq!(gov.current_quality(), QualityLevel::Low);

    let t0 = Instant::now();
    gov.initialize(t0);
    drive(&mut gov, t0, 16, 600);
    assert_eq!(gov.current_quality(), QualityLevel::Medium);
}

#[test]
fn test_observers_are_isolated_and_removable() {
    let mut gov = PerformanceGovernor::new(GovernorConfig::default(), high_end());
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();

    gov.on_performance_update(|_| panic!("observer bug"));
    let id = gov.on_performance_update(move |m| sink.borrow_mut().push(m.fps));
    assert_eq!(gov.observer_count(), 2);

    let t0 = Instant::now();
    gov.initialize(t0);
    let t1 = drive(&mut gov, t0, 20, 100);
    assert_eq!(*seen.borrow(), vec![50, 50]);

    assert!(gov.off_performance_update(id));
    drive(&mut gov, t1, 20, 100);
    assert_eq!(seen.borrow().len(), 2);
}

#[test]
fn test_initialize_is_idempotent() {
    let flushes = Arc::new(AtomicUsize::new(0));
    let mut gov = PerformanceGovernor::new(GovernorConfig::default(), high_end())
        .with_render_target(Box::new(CountingTarget(flushes.clone())));

    let t0 = Instant::now();
    gov.initialize(t0);
    gov.initialize(t0);
    assert!(gov.is_initialized());

    // The flush hint runs on the first frame, then every 5 seconds.
    let t1 = drive(&mut gov, t0, 100, 50);
    assert_eq!(flushes.load(Ordering::SeqCst), 1);
    drive(&mut gov, t1, 100, 1);
    assert_eq!(flushes.load(Ordering::SeqCst), 2);
}

#[test]
fn test_dispose_stops_everything_until_reinitialized() {
    let mut gov = PerformanceGovernor::new(GovernorConfig::default(), high_end());
    gov.on_performance_update(|_| {});

    let t0 = Instant::now();
    gov.initialize(t0);
    let t1 = drive(&mut gov, t0, 20, 60);
    gov.dispose();

    assert!(!gov.is_initialized());
    assert_eq!(gov.observer_count(), 0);
    assert!(gov.on_frame(t1 + Duration::from_secs(5)).is_none());

    let t2 = t1 + Duration::from_secs(10);
    gov.initialize(t2);
    let mut windows = 0;
    let mut now = t2;
    for _ in 0..50 {
        now += Duration::from_millis(20);
        if gov.on_frame(now).is_some() {
            windows += 1;
        }
    }
    assert_eq!(windows, 1);
}

#[test]
fn test_reinit_does_not_reuse_stale_metrics() {
    let reclaims = Arc::new(AtomicUsize::new(0));
    let mut gov = PerformanceGovernor::new(GovernorConfig::default(), high_end())
        .with_memory_reclaim(Box::new(CountingReclaim(reclaims.clone())));

    let t0 = Instant::now();
    gov.initialize(t0);
    // 20 FPS for 1.5 seconds: one window, one emergency check that sees it.
    let t1 = drive(&mut gov, t0, 50, 30);
    assert_eq!(gov.emergency_count(), 1);
    assert_eq!(reclaims.load(Ordering::SeqCst), 1);
    gov.dispose();

    let t2 = t1 + Duration::from_secs(60);
    gov.initialize(t2);
    drive(&mut gov, t2, 16, 1);
    assert_eq!(gov.emergency_count(), 1);
    assert_eq!(reclaims.load(Ordering::SeqCst), 1);
}

#[test]
fn test_trigger_optimization_steps_down_once() {
    let reclaims = Arc::new(AtomicUsize::new(0));
    let mut gov = PerformanceGovernor::new(GovernorConfig::default(), high_end())
        .with_memory_reclaim(Box::new(CountingReclaim(reclaims.clone())));

    let t0 = Instant::now();
    gov.initialize(t0);
    gov.trigger_optimization(t0);
    assert_eq!(gov.current_quality(), QualityLevel::Medium);
    assert_eq!(reclaims.load(Ordering::SeqCst), 1);

    gov.trigger_optimization(t0);
    assert_eq!(gov.current_quality(), QualityLevel::Low);
}

#[test]
fn test_memory_over_ceiling_engages_emergency_path() {
    let mut config = GovernorConfig::default();
    config.cache.memory_ceiling_bytes = 1024;
    let mut gov = PerformanceGovernor::new(config, high_end());
    gov.caches()
        .lock()
        .unwrap()
        .set_texture("backdrop", Box::new(Image(64)));
    assert_eq!(gov.memory_usage(), 64 * 64 * 4);

    let t0 = Instant::now();
    gov.initialize(t0);
    gov.on_frame(t0 + Duration::from_millis(16));

    assert_eq!(gov.emergency_count(), 1);
    assert_eq!(gov.current_quality(), QualityLevel::Minimal);
}

#[test]
fn test_history_keeps_the_latest_windows() {
    let config = GovernorConfig {
        history_len: 3,
        ..Default::default()
    };
    let mut gov = PerformanceGovernor::new(config, high_end());
    let t0 = Instant::now();
    gov.initialize(t0);
    drive(&mut gov, t0, 20, 250);

    let history = gov.metrics_history();
    assert_eq!(history.len(), 3);
    assert_eq!(gov.latest_metrics(), history.last().copied());
}

#[test]
fn test_rate_limiter_and_target_fps() {
    let mut gov = PerformanceGovernor::new(GovernorConfig::default(), high_end());
    let t0 = Instant::now();
    assert!(gov.should_render(t0));
    assert!(!gov.should_render(t0 + Duration::from_millis(5)));

    gov.set_target_fps(30);
    assert!(!gov.should_render(t0 + Duration::from_millis(20)));
    assert!(gov.should_render(t0 + Duration::from_millis(34)));
}

#[tokio::test]
async fn test_preloaded_assets_are_cached() {
    let gov = PerformanceGovernor::new(GovernorConfig::default(), high_end());
    gov.add_preload_task(PreloadTask::new("hero", PreloadPriority::Critical, || async {
        anyhow::Ok(PreloadedAsset::Texture(Box::new(Image(32))))
    }));
    assert_eq!(gov.preloader().pending_count(), 1);

    let mut reports = Vec::new();
    let summary = gov
        .preload_critical_resources(move |p| reports.push(p.fraction()))
        .await;

    assert_eq!(summary.succeeded, 1);
    assert_eq!(gov.preloader().progress(), 1.0);
    assert_eq!(gov.memory_usage(), 32 * 32 * 4);
}

#[tokio::test]
async fn test_frames_keep_running_while_preloading() {
    let mut gov = PerformanceGovernor::new(GovernorConfig::default(), high_end());
    for name in ["hero", "terrain"] {
        gov.add_preload_task(PreloadTask::new(name, PreloadPriority::High, || async {
            tokio::time::sleep(Duration::from_millis(30)).await;
            anyhow::Ok(PreloadedAsset::Texture(Box::new(Image(32))))
        }));
    }

    let local = tokio::task::LocalSet::new();
    local
        .run_until(async {
            let preload = tokio::task::spawn_local(gov.preload_critical_resources(|_| {}));
            let t0 = Instant::now();
            gov.initialize(t0);

            let mut now = t0;
            let mut frames_while_loading = 0;
            while !preload.is_finished() {
                tokio::time::sleep(Duration::from_millis(5)).await;
                now += Duration::from_millis(16);
                gov.on_frame(now);
                frames_while_loading += 1;
            }

            let summary = preload.await.unwrap();
            assert_eq!(summary.succeeded, 2);
            assert!(frames_while_loading > 1, "{frames_while_loading}");
            assert_eq!(gov.memory_usage(), 2 * 32 * 32 * 4);
        })
        .await;
}
