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

//! The preloader: four priority queues drained in batches.
//!
//! A drain takes every queued task at once. Critical tasks are awaited one by
//! one; the other tiers run as concurrent batches spawned on the current Tokio
//! runtime, with a short sleep between batches so the frame loop keeps
//! running. Every load settles exactly once (success, error or panic) and each
//! settlement is reported through the progress callback.

use super::task::{PreloadPriority, PreloadTask};
use aurora_core::config::PreloadConfig;
use aurora_core::resource::PreloadedAsset;
use aurora_data::ResourceCacheManager;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::{JoinError, JoinSet};

/// One settlement, as reported to the progress callback.
#[derive(Debug, Clone, PartialEq)]
pub struct PreloadProgress {
    /// Tasks settled so far in this run.
    pub completed: usize,
    /// Tasks drained at the start of this run.
    pub total: usize,
    /// Tasks settled so far in the current batch.
    pub batch_completed: usize,
    /// Tasks in the current batch.
    pub batch_size: usize,
    /// Name of the task that just settled.
    pub task: String,
    /// Whether it produced an asset.
    pub succeeded: bool,
}

impl PreloadProgress {
    /// Completed fraction of the run, in [0, 1].
    pub fn fraction(&self) -> f32 {
        if self.total == 0 {
            0.0
        } else {
            self.completed as f32 / self.total as f32
        }
    }
}

/// Outcome of one [`Preloader::preload_all`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PreloadSummary {
    /// Tasks drained at the start of the run.
    pub total: usize,
    /// Tasks that produced an asset.
    pub succeeded: usize,
    /// Tasks whose loader failed or panicked.
    pub failed: usize,
    /// Whether the run was cut short by [`Preloader::abort`].
    pub aborted: bool,
}

#[derive(Default)]
struct Queues([VecDeque<PreloadTask>; 4]);

impl Queues {
    fn len(&self) -> usize {
        self.0.iter().map(VecDeque::len).sum()
    }
}

/// Bookkeeping of one drain.
struct Run {
    generation: u64,
    total: usize,
    summary: PreloadSummary,
}

/// Queues asset loads by priority and drains them in batches.
pub struct Preloader {
    config: PreloadConfig,
    queues: Mutex<Queues>,
    cache: Option<Arc<Mutex<ResourceCacheManager>>>,
    active: AtomicBool,
    /// Bumped by `abort`; a run stops once it no longer matches.
    generation: AtomicU64,
    completed: AtomicUsize,
    total: AtomicUsize,
}

impl Preloader {
    /// Creates an idle preloader that does not cache what it loads.
    pub fn new(config: PreloadConfig) -> Self {
        Self {
            config,
            queues: Mutex::new(Queues::default()),
            cache: None,
            active: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            completed: AtomicUsize::new(0),
            total: AtomicUsize::new(0),
        }
    }

    /// Inserts every typed asset into `cache` under its task name.
    pub fn with_cache(mut self, cache: Arc<Mutex<ResourceCacheManager>>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Queues a task. It runs in the next [`preload_all`](Self::preload_all).
    pub fn add_task(&self, task: PreloadTask) {
        log::trace!("Preloader: queued '{}' ({})", task.name, task.priority);
        let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
        queues.0[task.priority.index()].push_back(task);
    }

    /// Tasks waiting for the next drain.
    pub fn pending_count(&self) -> usize {
        self.queues
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether a drain is in flight.
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Settled fraction of the current or last run, `0.0` if it had no tasks.
    pub fn progress(&self) -> f32 {
        let total = self.total.load(Ordering::SeqCst);
        if total == 0 {
            return 0.0;
        }
        self.completed.load(Ordering::SeqCst) as f32 / total as f32
    }

    /// Stops the current run at the next batch boundary.
    ///
    /// Loads already started are left to settle; their assets are still
    /// cached. A later `preload_all` starts a fresh run with whatever was
    /// queued since.
    pub fn abort(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if self.active.swap(false, Ordering::SeqCst) {
            log::info!("Preloader: aborted");
        }
    }

    /// Drains every queue, critical tier first.
    ///
    /// Returns an empty summary without doing anything if a run is already in
    /// flight. Must be awaited inside a Tokio runtime.
    pub async fn preload_all<F>(&self, mut on_progress: F) -> PreloadSummary
    where
        F: FnMut(&PreloadProgress),
    {
        if self.active.swap(true, Ordering::SeqCst) {
            log::debug!("Preloader: a run is already in flight, ignoring request");
            return PreloadSummary::default();
        }

        let generation = self.generation.load(Ordering::SeqCst);
        let tiers = {
            let mut queues = self.queues.lock().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut queues.0)
        };
        let total: usize = tiers.iter().map(VecDeque::len).sum();
        self.total.store(total, Ordering::SeqCst);
        self.completed.store(0, Ordering::SeqCst);

        let mut run = Run {
            generation,
            total,
            summary: PreloadSummary {
                total,
                ..Default::default()
            },
        };
        log::info!("Preloader: loading {} assets", total);

        let mut remaining = total;
        'tiers: for (priority, mut queue) in PreloadPriority::ALL.into_iter().zip(tiers) {
            let batch_size = priority.batch_size(&self.config);
            while !queue.is_empty() {
                if self.is_stale(generation) {
                    run.summary.aborted = true;
                    break 'tiers;
                }
                let take = batch_size.min(queue.len());
                let batch: Vec<PreloadTask> = queue.drain(..take).collect();
                remaining -= batch.len();

                if priority == PreloadPriority::Critical {
                    for task in batch {
                        self.run_critical(task, &mut run, &mut on_progress).await;
                    }
                } else {
                    self.run_batch(batch, &mut run, &mut on_progress).await;
                    if remaining > 0 {
                        tokio::time::sleep(self.config.batch_yield()).await;
                    }
                }
            }
        }

        if self.is_stale(generation) {
            run.summary.aborted = true;
        } else {
            self.active.store(false, Ordering::SeqCst);
        }

        log::info!(
            "Preloader: {} of {} assets loaded, {} failed{}",
            run.summary.succeeded,
            run.summary.total,
            run.summary.failed,
            if run.summary.aborted { " (aborted)" } else { "" }
        );
        run.summary
    }

    async fn run_critical<F>(&self, task: PreloadTask, run: &mut Run, on_progress: &mut F)
    where
        F: FnMut(&PreloadProgress),
    {
        let (name, loader) = task.into_parts();
        let outcome = tokio::spawn(async move { loader().await }).await;
        self.settle(name, outcome, 1, 1, run, on_progress);
    }

    async fn run_batch<F>(&self, batch: Vec<PreloadTask>, run: &mut Run, on_progress: &mut F)
    where
        F: FnMut(&PreloadProgress),
    {
        let batch_size = batch.len();
        let mut set = JoinSet::new();
        for task in batch {
            let (name, loader) = task.into_parts();
            // The inner spawn keeps the name when the loader panics.
            set.spawn(async move {
                let outcome = tokio::spawn(async move { loader().await }).await;
                (name, outcome)
            });
        }

        let mut batch_completed = 0;
        while let Some(joined) = set.join_next().await {
            batch_completed += 1;
            let (name, outcome) = match joined {
                Ok(pair) => pair,
                Err(e) => ("<unknown>".to_string(), Err(e)),
            };
            self.settle(name, outcome, batch_completed, batch_size, run, on_progress);
        }
    }

    fn settle<F>(
        &self,
        name: String,
        outcome: Result<anyhow::Result<PreloadedAsset>, JoinError>,
        batch_completed: usize,
        batch_size: usize,
        run: &mut Run,
        on_progress: &mut F,
    ) where
        F: FnMut(&PreloadProgress),
    {
        let succeeded = match outcome {
            Ok(Ok(asset)) => {
                self.store(&name, asset);
                run.summary.succeeded += 1;
                true
            }
            Ok(Err(e)) => {
                log::warn!("Preloader: failed to load '{}': {:#}", name, e);
                run.summary.failed += 1;
                false
            }
            Err(e) => {
                let reason = if e.is_panic() { "loader panicked" } else { "task cancelled" };
                log::warn!("Preloader: failed to load '{}': {}", name, reason);
                run.summary.failed += 1;
                false
            }
        };

        let completed = run.summary.succeeded + run.summary.failed;
        if !self.is_stale(run.generation) {
            self.completed.store(completed, Ordering::SeqCst);
        }

        on_progress(&PreloadProgress {
            completed,
            total: run.total,
            batch_completed,
            batch_size,
            task: name,
            succeeded,
        });
    }

    fn store(&self, name: &str, asset: PreloadedAsset) {
        let Some(cache) = &self.cache else {
            return;
        };
        let kind = asset.kind();
        let mut caches = cache.lock().unwrap_or_else(PoisonError::into_inner);
        if caches.insert_asset(name, asset) {
            log::debug!("Preloader: cached {} '{}'", kind, name);
        }
    }

    fn is_stale(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) != generation
    }
}

impl Default for Preloader {
    fn default() -> Self {
        Self::new(PreloadConfig::default())
    }
}

impl fmt::Debug for Preloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preloader")
            .field("config", &self.config)
            .field("pending", &self.pending_count())
            .field("active", &self.is_active())
            .field("progress", &self.progress())
            .field("caching", &self.cache.is_some())
            .finish()
    }
}
