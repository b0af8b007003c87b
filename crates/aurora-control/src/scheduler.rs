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

//! Cooperative frame scheduler for recurring maintenance work.
//!
//! Tasks are plain closures over a context `C` chosen by the owner. Each
//! tick, the due tasks run in priority order until the configured share of
//! the frame budget has been spent; the remaining due tasks are deferred to a
//! later tick. A failing or panicking task is logged and does not prevent the
//! others from running.

use aurora_core::Stopwatch;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{Duration, Instant};

/// Default share of the frame budget tasks may consume.
pub const DEFAULT_BUDGET_UTILIZATION: f32 = 0.8;

/// Identifier of a registered task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

/// What happened during one [`FrameScheduler::run_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameReport {
    /// Tasks that ran and returned `Ok`.
    pub executed: usize,
    /// Due tasks left for a later tick because the budget was spent.
    pub deferred: usize,
    /// Tasks that ran and returned an error or panicked.
    pub failed: usize,
}

type TaskFn<C> = Box<dyn FnMut(&mut C) -> anyhow::Result<()>>;

struct ScheduledTask<C> {
    id: TaskId,
    name: String,
    priority: i32,
    interval: Duration,
    last_run: Option<Instant>,
    run: TaskFn<C>,
}

impl<C> ScheduledTask<C> {
    fn is_due(&self, now: Instant) -> bool {
        match self.last_run {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.interval,
        }
    }
}

/// Runs recurring tasks under a per-frame time budget.
pub struct FrameScheduler<C> {
    /// Sorted by descending priority; registration order among equals.
    tasks: Vec<ScheduledTask<C>>,
    next_id: u64,
    running: bool,
    budget_utilization: f32,
}

impl<C> FrameScheduler<C> {
    /// Creates a stopped scheduler using the default budget share.
    pub fn new() -> Self {
        Self::with_budget_utilization(DEFAULT_BUDGET_UTILIZATION)
    }

    /// Creates a stopped scheduler that stops starting tasks once
    /// `utilization` of the frame budget is spent.
    pub fn with_budget_utilization(utilization: f32) -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
            running: false,
            budget_utilization: utilization.clamp(0.0, 1.0),
        }
    }

    /// Registers a task. Higher priorities run first.
    ///
    /// A new task is due on the next tick; afterwards it runs at most once per
    /// `interval`.
    pub fn add_task<F>(
        &mut self,
        name: impl Into<String>,
        priority: i32,
        interval: Duration,
        task: F,
    ) -> TaskId
    where
        F: FnMut(&mut C) -> anyhow::Result<()> + 'static,
    {
        self.next_id += 1;
        let id = TaskId(self.next_id);
        let name = name.into();
        log::debug!(
            "FrameScheduler: registered '{}' (priority={}, every {:?})",
            name,
            priority,
            interval
        );
        self.tasks.push(ScheduledTask {
            id,
            name,
            priority,
            interval,
            last_run: None,
            run: Box::new(task),
        });
        // Stable: equal priorities keep registration order.
        self.tasks.sort_by(|a, b| b.priority.cmp(&a.priority));
        id
    }

    /// Unregisters a task. Returns `false` if it was unknown.
    pub fn remove_task(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Number of registered tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Returns true if no task is registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Names of the registered tasks in execution order.
    pub fn task_names(&self) -> impl Iterator<Item = &str> {
        self.tasks.iter().map(|t| t.name.as_str())
    }

    /// Lets [`run_frame`](Self::run_frame) execute tasks.
    pub fn start(&mut self) {
        self.running = true;
    }

    /// Makes [`run_frame`](Self::run_frame) a no-op. Tasks stay registered.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Whether the scheduler executes tasks.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Runs the due tasks for the tick at `now`.
    pub fn run_frame(&mut self, ctx: &mut C, now: Instant, frame_budget: Duration) -> FrameReport {
        let mut report = FrameReport::default();
        if !self.running {
            return report;
        }

        let watch = Stopwatch::new();
        for task in self.tasks.iter_mut() {
            if !task.is_due(now) {
                continue;
            }
            if watch.has_consumed(frame_budget, self.budget_utilization) {
                report.deferred += 1;
                continue;
            }

            task.last_run = Some(now);
            let run = &mut task.run;
            match catch_unwind(AssertUnwindSafe(|| run(ctx))) {
                Ok(Ok(())) => report.executed += 1,
                Ok(Err(e)) => {
                    log::warn!("FrameScheduler: task '{}' failed: {:#}", task.name, e);
                    report.failed += 1;
                }
                Err(payload) => {
                    log::warn!(
                        "FrameScheduler: task '{}' panicked: {}",
                        task.name,
                        panic_message(payload.as_ref())
                    );
                    report.failed += 1;
                }
            }
        }

        if report.deferred > 0 {
            log::trace!(
                "FrameScheduler: budget spent after {:.2}ms, deferred {} tasks",
                watch.elapsed_ms_f32(),
                report.deferred
            );
        }
        report
    }
}

impl<C> Default for FrameScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for FrameScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FrameScheduler")
            .field("tasks", &self.task_names().collect::<Vec<_>>())
            .field("running", &self.running)
            .field("budget_utilization", &self.budget_utilization)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}
