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

//! Per-frame wall-clock sampling.
//!
//! The host calls [`FrameTimingMonitor::record_frame`] from its animation
//! callback. The monitor keeps the last [`FRAME_SAMPLE_CAPACITY`] frame times
//! and, once a window (1s by default) has elapsed, condenses them into a
//! [`PerformanceMetrics`] value.

use crate::metrics::ring_buffer::RingBuffer;
use aurora_core::config::MonitorConfig;
use aurora_core::telemetry::{stability_score, PerformanceMetrics};
use std::fmt;
use std::time::Instant;

/// Number of frame times kept for the statistics.
pub const FRAME_SAMPLE_CAPACITY: usize = 60;

/// Frames longer than this multiple of the target frame time count as drops.
const FRAME_DROP_FACTOR: f32 = 2.0;

/// FPS at or above this fraction of the target counts as "at target".
const AT_TARGET_FRACTION: f32 = 0.95;

/// Callback invoked with every emitted window.
pub type MetricsCallback = Box<dyn FnMut(&PerformanceMetrics)>;

/// Samples frame timing and emits one [`PerformanceMetrics`] per window.
pub struct FrameTimingMonitor {
    config: MonitorConfig,
    frame_times: RingBuffer<f32>,
    running: bool,
    last_tick: Option<Instant>,
    window_start: Option<Instant>,
    frames_in_window: u32,
    fps: u32,
    callback: Option<MetricsCallback>,
}

impl FrameTimingMonitor {
    /// Creates a stopped monitor.
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            frame_times: RingBuffer::new(FRAME_SAMPLE_CAPACITY),
            running: false,
            last_tick: None,
            window_start: None,
            frames_in_window: 0,
            fps: 0,
            callback: None,
        }
    }

    /// Creates a stopped monitor with default thresholds and the given target.
    pub fn with_target_fps(target_fps: u32) -> Self {
        Self::new(MonitorConfig {
            target_fps,
            ..Default::default()
        })
    }

    /// Begins sampling. Calling it on a running monitor does nothing.
    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_tick = Some(now);
        self.window_start = Some(now);
        self.frames_in_window = 0;
        self.frame_times.clear();
        log::debug!(
            "FrameTimingMonitor: started (target {} FPS)",
            self.config.target_fps
        );
    }

    /// Stops sampling. Frames recorded afterwards are ignored.
    pub fn stop(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        self.last_tick = None;
        self.window_start = None;
        log::debug!("FrameTimingMonitor: stopped");
    }

    /// Whether the monitor is currently sampling.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// FPS computed at the end of the last window (0 before the first one).
    pub fn fps(&self) -> u32 {
        self.fps
    }

    /// The frame rate the monitor measures against.
    pub fn target_fps(&self) -> u32 {
        self.config.target_fps
    }

    /// Changes the target used for drop counting and the at-target flag.
    pub fn set_target_fps(&mut self, target_fps: u32) {
        self.config.target_fps = target_fps.max(1);
    }

    /// Registers the callback invoked with every emitted window, replacing any previous one.
    ///
    /// The callback runs inline on the frame path; it must guard its own failures.
    pub fn set_callback(&mut self, callback: impl FnMut(&PerformanceMetrics) + 'static) {
        self.callback = Some(Box::new(callback));
    }

    /// Removes the registered callback.
    pub fn clear_callback(&mut self) {
        self.callback = None;
    }

    /// Records one animation tick.
    ///
    /// Returns the window summary when this tick closes a window.
    pub fn record_frame(&mut self, now: Instant) -> Option<PerformanceMetrics> {
        if !self.running {
            return None;
        }
        let last_tick = self.last_tick.replace(now).unwrap_or(now);
        let frame_time_ms = now.saturating_duration_since(last_tick).as_secs_f32() * 1000.0;
        self.frame_times.push(frame_time_ms);
        self.frames_in_window += 1;

        let window_start = *self.window_start.get_or_insert(now);
        let elapsed = now.saturating_duration_since(window_start);
        if elapsed < self.config.window() {
            return None;
        }

        let metrics = self.summarize(elapsed.as_secs_f32() * 1000.0);
        self.fps = metrics.fps;
        self.frames_in_window = 0;
        self.window_start = Some(now);

        log::trace!(
            "FrameTimingMonitor: {} FPS, avg {:.2}ms, stability {:.2}, drops {}",
            metrics.fps,
            metrics.average_frame_time_ms,
            metrics.stability,
            metrics.frame_drops
        );

        if let Some(callback) = self.callback.as_mut() {
            callback(&metrics);
        }
        Some(metrics)
    }

    fn summarize(&self, window_ms: f32) -> PerformanceMetrics {
        let fps = if window_ms > 0.0 {
            (self.frames_in_window as f32 * 1000.0 / window_ms).round() as u32
        } else {
            0
        };
        let average = self.frame_times.average();
        let variance = self.frame_times.variance();
        let target_frame_time = PerformanceMetrics::target_frame_time_ms(self.config.target_fps);
        let frame_drops = self
            .frame_times
            .count_above(target_frame_time * FRAME_DROP_FACTOR) as u32;

        PerformanceMetrics {
            fps,
            average_frame_time_ms: average,
            max_frame_time_ms: self.frame_times.max(),
            min_frame_time_ms: self.frame_times.min(),
            frame_time_variance: variance,
            stability: stability_score(average, variance.sqrt()),
            frame_drops,
            is_at_target: fps as f32 >= self.config.target_fps as f32 * AT_TARGET_FRACTION,
            is_below_critical: fps < self.config.critical_fps_threshold,
            is_below_low: fps < self.config.low_fps_threshold,
            window_ms,
            frame_count: self.frames_in_window,
        }
    }
}

impl fmt::Debug for FrameTimingMonitor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameTimingMonitor")
            .field("config", &self.config)
            .field("running", &self.running)
            .field("fps", &self.fps)
            .field("samples", &self.frame_times.count())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::time::Duration;

    /// Feeds one frame per entry of `frame_ms` and returns every emitted window.
    fn drive(
        monitor: &mut FrameTimingMonitor,
        start: Instant,
        frame_ms: &[u64],
    ) -> Vec<PerformanceMetrics> {
        let mut now = start;
        let mut emitted = Vec::new();
        for ms in frame_ms {
            now += Duration::from_millis(*ms);
            if let Some(m) = monitor.record_frame(now) {
                emitted.push(m);
            }
        }
        emitted
    }

    #[test]
    fn test_stopped_monitor_ignores_frames() {
        let mut monitor = FrameTimingMonitor::with_target_fps(60);
        let t0 = Instant::now();
        assert!(monitor.record_frame(t0 + Duration::from_secs(2)).is_none());
        assert_eq!(monitor.fps(), 0);
    }

    #[test]
    fn test_steady_sixty_fps_window() {
        let mut monitor = FrameTimingMonitor::with_target_fps(60);
        let t0 = Instant::now();
        monitor.start(t0);

        // 50 frames of 20ms = exactly one 1000ms window
        let emitted = drive(&mut monitor, t0, &[20; 50]);
        assert_eq!(emitted.len(), 1);
        let m = emitted[0];
        assert_eq!(m.fps, 50);
        assert_eq!(m.frame_count, 50);
        assert_relative_eq!(m.average_frame_time_ms, 20.0, epsilon = 1e-3);
        assert_relative_eq!(m.stability, 1.0, epsilon = 1e-3);
        assert_eq!(m.frame_drops, 0);
        assert!(!m.is_at_target);
        assert!(!m.is_below_low);
        assert_eq!(monitor.fps(), 50);
    }

    #[test]
    fn test_frame_drops_and_flags() {
        let mut monitor = FrameTimingMonitor::with_target_fps(60);
        let t0 = Instant::now();
        monitor.start(t0);

        // 20 frames of 50ms: every one exceeds 2 x 16.67ms
        let emitted = drive(&mut monitor, t0, &[50; 20]);
        let m = emitted[0];
        assert_eq!(m.fps, 20);
        assert_eq!(m.frame_drops, 20);
        assert!(m.is_below_low);
        assert!(!m.is_below_critical);
    }

    #[test]
    fn test_jitter_lowers_stability() {
        let mut monitor = FrameTimingMonitor::with_target_fps(60);
        let t0 = Instant::now();
        monitor.start(t0);

        let pattern: Vec<u64> = (0..60).map(|i| if i % 2 == 0 { 5 } else { 30 }).collect();
        let emitted = drive(&mut monitor, t0, &pattern);
        assert!(!emitted.is_empty());
        let m = emitted[0];
        assert!(m.stability < 0.5, "stability was {}", m.stability);
        assert!((0.0..=1.0).contains(&m.stability));
        assert_eq!(m.min_frame_time_ms.round(), 5.0);
        assert_eq!(m.max_frame_time_ms.round(), 30.0);
    }

    #[test]
    fn test_stability_stays_in_unit_interval() {
        let mut monitor = FrameTimingMonitor::with_target_fps(60);
        let t0 = Instant::now();
        monitor.start(t0);

        // Extreme spikes: mostly 1ms frames with occasional 900ms stalls.
        let pattern: Vec<u64> = (0..400)
            .map(|i| match i % 37 {
                0 => 900,
                7 => 0,
                _ => 1,
            })
            .collect();
        for m in drive(&mut monitor, t0, &pattern) {
            assert!((0.0..=1.0).contains(&m.stability), "{}", m.stability);
        }
    }

    #[test]
    fn test_callback_receives_every_window() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut monitor = FrameTimingMonitor::with_target_fps(60);
        monitor.set_callback(move |m| sink.borrow_mut().push(m.fps));

        let t0 = Instant::now();
        monitor.start(t0);
        drive(&mut monitor, t0, &[25; 120]); // 3 seconds at 40 FPS

        assert_eq!(*seen.borrow(), vec![40, 40, 40]);

        monitor.clear_callback();
        drive(&mut monitor, t0 + Duration::from_secs(3), &[25; 40]);
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_restart_resets_window() {
        let mut monitor = FrameTimingMonitor::with_target_fps(60);
        let t0 = Instant::now();
        monitor.start(t0);
        drive(&mut monitor, t0, &[16; 30]);
        monitor.stop();
        assert!(!monitor.is_running());

        let t1 = t0 + Duration::from_secs(10);
        monitor.start(t1);
        // The 10s pause must not show up as a frame time.
        let emitted = drive(&mut monitor, t1, &[20; 50]);
        assert_eq!(emitted.len(), 1);
        assert!(emitted[0].max_frame_time_ms < 21.0);
    }
}
