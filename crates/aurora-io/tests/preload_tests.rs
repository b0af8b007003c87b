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

use anyhow::anyhow;
use aurora_core::resource::{Disposable, PreloadedAsset, TextureResource};
use aurora_data::ResourceCacheManager;
use aurora_io::{PreloadPriority, PreloadSummary, PreloadTask, Preloader};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Image(u32);

impl Disposable for Image {
    fn dispose(&mut self) {}
}

impl TextureResource for Image {
    fn dimensions(&self) -> (u32, u32) {
        (self.0, self.0)
    }
}

/// A loader that logs when it starts and finishes, sleeping in between.
fn traced_task(
    name: &str,
    priority: PreloadPriority,
    trace: &Arc<Mutex<Vec<String>>>,
    delay_ms: u64,
) -> PreloadTask {
    let trace = trace.clone();
    let label = name.to_string();
    PreloadTask::new(name, priority, move || async move {
        trace.lock().unwrap().push(format!("start {label}"));
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        trace.lock().unwrap().push(format!("end {label}"));
        anyhow::Ok(PreloadedAsset::Untracked)
    })
}

fn medium_task(name: String) -> PreloadTask {
    PreloadTask::new(name, PreloadPriority::Medium, || async {
        tokio::time::sleep(Duration::from_millis(10)).await;
        anyhow::Ok(PreloadedAsset::Untracked)
    })
}

#[tokio::test]
async fn test_critical_tasks_load_one_at_a_time() {
    let preloader = Arc::new(Preloader::default());
    let trace = Arc::new(Mutex::new(Vec::new()));
    for i in 0..3 {
        preloader.add_task(traced_task(&format!("c{i}"), PreloadPriority::Critical, &trace, 5));
    }
    for i in 0..5 {
        preloader.add_task(traced_task(&format!("h{i}"), PreloadPriority::High, &trace, 1));
    }

    let observer = preloader.clone();
    let mut after_critical = None;
    let summary = preloader
        .preload_all(|p| {
            if p.task == "c2" {
                after_critical = Some((p.completed, p.total, observer.progress()));
            }
        })
        .await;

    let trace = trace.lock().unwrap();
    assert_eq!(
        &trace[..6],
        &["start c0", "end c0", "start c1", "end c1", "start c2", "end c2"]
    );
    assert_eq!(after_critical, Some((3, 8, 3.0 / 8.0)));
    assert_eq!(summary.succeeded, 8);
    assert_eq!(preloader.progress(), 1.0);
}

#[tokio::test]
async fn test_second_call_while_active_is_a_noop() {
    let preloader = Preloader::default();
    for i in 0..4 {
        preloader.add_task(medium_task(format!("m{i}")));
    }

    let first = preloader.preload_all(|_| {});
    let second = async {
        while !preloader.is_active() {
            tokio::task::yield_now().await;
        }
        preloader.add_task(medium_task("late".to_string()));
        let progress_before = preloader.progress();
        let summary = preloader.preload_all(|_| {}).await;
        assert_eq!(preloader.pending_count(), 1);
        assert_eq!(preloader.progress(), progress_before);
        summary
    };

    let (ran, ignored) = tokio::join!(first, second);
    assert_eq!(ran.total, 4);
    assert_eq!(ran.succeeded, 4);
    assert_eq!(ignored, PreloadSummary::default());
    assert!(!preloader.is_active());
    // The task queued mid-run waits for the next run.
    assert_eq!(preloader.pending_count(), 1);
    assert_eq!(preloader.progress(), 1.0);
}

#[tokio::test]
async fn test_failing_tasks_still_complete_the_run() {
    let preloader = Preloader::default();
    for i in 0..6 {
        let fail = i % 3 == 0;
        preloader.add_task(PreloadTask::new(format!("l{i}"), PreloadPriority::Low, move || async move {
            if fail {
                return Err(anyhow!("missing file"));
            }
            anyhow::Ok(PreloadedAsset::Untracked)
        }));
    }

    let mut last_fraction = 0.0;
    let summary = preloader.preload_all(|p| last_fraction = p.fraction()).await;

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.succeeded, 4);
    assert_eq!(last_fraction, 1.0);
    assert_eq!(preloader.progress(), 1.0);
}

#[tokio::test]
async fn test_abort_stops_at_the_next_boundary() {
    let preloader = Arc::new(Preloader::default());
    for i in 0..4 {
        preloader.add_task(PreloadTask::new(format!("c{i}"), PreloadPriority::Critical, || async {
            anyhow::Ok(PreloadedAsset::Untracked)
        }));
    }

    let handle = preloader.clone();
    let summary = preloader
        .preload_all(|p| {
            if p.completed == 1 {
                handle.abort();
            }
        })
        .await;

    assert!(summary.aborted);
    assert_eq!(summary.succeeded, 1);
    assert!(!preloader.is_active());

    // A fresh run only sees what was queued afterwards.
    preloader.add_task(PreloadTask::new("late", PreloadPriority::High, || async {
        anyhow::Ok(PreloadedAsset::Untracked)
    }));
    let summary = preloader.preload_all(|_| {}).await;
    assert_eq!(summary.total, 1);
    assert!(!summary.aborted);
}

#[tokio::test]
async fn test_typed_assets_land_in_the_cache() {
    let caches = Arc::new(Mutex::new(ResourceCacheManager::default()));
    let preloader = Preloader::default().with_cache(caches.clone());
    preloader.add_task(PreloadTask::new("hero", PreloadPriority::High, || async {
        anyhow::Ok(PreloadedAsset::Texture(Box::new(Image(64))))
    }));
    preloader.add_task(PreloadTask::new("warmup", PreloadPriority::High, || async {
        anyhow::Ok(PreloadedAsset::Untracked)
    }));

    preloader.preload_all(|_| {}).await;

    let mut caches = caches.lock().unwrap();
    assert_eq!(caches.texture("hero").map(|t| t.dimensions()), Some((64, 64)));
    assert_eq!(caches.memory_usage(), 64 * 64 * 4);
}
