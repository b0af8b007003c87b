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

//! Drives the governor through a simulated workload.
//!
//! Usage: `sandbox [config.json]`

use anyhow::{Context, Result};
use aurora_sdk::prelude::*;
use std::time::{Duration, Instant};

/// A fake texture standing in for a decoded GPU image.
struct FakeTexture {
    size: u32,
}

impl Disposable for FakeTexture {
    fn dispose(&mut self) {
        log::trace!("Sandbox: released {}x{} texture", self.size, self.size);
    }
}

impl TextureResource for FakeTexture {
    fn dimensions(&self) -> (u32, u32) {
        (self.size, self.size)
    }
}

/// Renderer stub that only logs the flush hint.
struct LoggingRenderer;

impl RenderTarget for LoggingRenderer {
    fn label(&self) -> &str {
        "sandbox-renderer"
    }

    fn flush(&mut self) {
        log::debug!("Sandbox: renderer flushed");
    }
}

/// One phase of the simulated workload.
struct Phase {
    name: &'static str,
    frame_ms: u64,
    duration: Duration,
}

const PHASES: [Phase; 3] = [
    Phase {
        name: "idle scene",
        frame_ms: 16,
        duration: Duration::from_secs(5),
    },
    Phase {
        name: "heavy scene",
        frame_ms: 45,
        duration: Duration::from_secs(4),
    },
    Phase {
        name: "recovery",
        frame_ms: 16,
        duration: Duration::from_secs(10),
    },
];

fn load_config() -> Result<GovernorConfig> {
    match std::env::args().nth(1) {
        Some(path) => GovernorConfig::from_json_file(&path)
            .with_context(|| format!("could not load config '{path}'")),
        None => Ok(GovernorConfig::default()),
    }
}

fn queue_preloads(governor: &PerformanceGovernor) {
    let assets = [
        ("ui-atlas", PreloadPriority::Critical, 512),
        ("hero", PreloadPriority::High, 1024),
        ("terrain", PreloadPriority::High, 1024),
        ("props", PreloadPriority::Medium, 256),
        ("skybox", PreloadPriority::Low, 2048),
    ];
    for (name, priority, size) in assets {
        governor.add_preload_task(PreloadTask::new(name, priority, move || async move {
            tokio::time::sleep(Duration::from_millis(120)).await;
            anyhow::Ok(PreloadedAsset::Texture(Box::new(FakeTexture { size })))
        }));
    }
}

/// Runs the frame loop in real time while the preload runs on the same thread.
async fn run_frames(governor: &mut PerformanceGovernor) -> Result<u64> {
    let mut preload = Some(tokio::task::spawn_local(
        governor.preload_critical_resources(|progress| {
            log::info!(
                "Sandbox: preloaded '{}' ({}/{})",
                progress.task,
                progress.completed,
                progress.total
            );
        }),
    ));

    governor.initialize(Instant::now());
    let mut rendered = 0u64;
    for phase in PHASES.iter() {
        log::info!("Sandbox: entering {}", phase.name);
        let end = Instant::now() + phase.duration;
        while Instant::now() < end {
            // Stands in for the frame's render work; loads progress meanwhile.
            tokio::time::sleep(Duration::from_millis(phase.frame_ms)).await;
            let now = Instant::now();
            governor.on_frame(now);
            if governor.should_render(now) {
                rendered += 1;
            }

            if let Some(handle) = preload.take_if(|handle| handle.is_finished()) {
                let summary = handle.await.context("preload task failed")?;
                log::info!(
                    "Sandbox: preload done after {} frames, {}/{} succeeded, {} bytes cached",
                    rendered,
                    summary.succeeded,
                    summary.total,
                    governor.memory_usage()
                );
            }
        }
        log::info!(
            "Sandbox: {} finished at {} quality",
            phase.name,
            governor.current_quality()
        );
    }
    Ok(rendered)
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let capabilities = detect_capabilities(false);
    let mut governor = PerformanceGovernor::new(config, capabilities)
        .with_render_target(Box::new(LoggingRenderer));

    queue_preloads(&governor);
    governor.on_performance_update(|metrics| {
        log::info!(
            "Sandbox: {} FPS (avg {:.1}ms, stability {:.2})",
            metrics.fps,
            metrics.average_frame_time_ms,
            metrics.stability
        );
    });

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to build the runtime")?;
    let local = tokio::task::LocalSet::new();
    let rendered = local.block_on(&runtime, run_frames(&mut governor))?;

    log::info!(
        "Sandbox: rendered {} frames, {} emergencies, {} windows recorded",
        rendered,
        governor.emergency_count(),
        governor.metrics_history().len()
    );
    governor.dispose();
    Ok(())
}
