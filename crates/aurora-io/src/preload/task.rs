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

//! A single asset load and its priority tier.

use aurora_core::config::PreloadConfig;
use aurora_core::resource::PreloadedAsset;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

/// The future a loader resolves to.
pub type LoadFuture = Pin<Box<dyn Future<Output = anyhow::Result<PreloadedAsset>> + Send + 'static>>;

type Loader = Box<dyn FnOnce() -> LoadFuture + Send + 'static>;

/// Priority tier of a preload task. Lower tiers only start once every higher
/// tier has settled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PreloadPriority {
    /// Needed for the first frame; loaded one at a time.
    Critical,
    /// Needed shortly after the first frame.
    High,
    /// Needed once the scene settles.
    Medium,
    /// Nice to have.
    Low,
}

impl PreloadPriority {
    /// Every tier, in drain order.
    pub const ALL: [PreloadPriority; 4] = [
        PreloadPriority::Critical,
        PreloadPriority::High,
        PreloadPriority::Medium,
        PreloadPriority::Low,
    ];

    /// Position in [`ALL`](Self::ALL).
    pub fn index(self) -> usize {
        self as usize
    }

    /// How many loads of this tier run concurrently.
    pub fn batch_size(self, config: &PreloadConfig) -> usize {
        match self {
            PreloadPriority::Critical => 1,
            PreloadPriority::High => config.high_batch_size,
            PreloadPriority::Medium => config.medium_batch_size,
            PreloadPriority::Low => config.low_batch_size,
        }
        .max(1)
    }
}

impl fmt::Display for PreloadPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PreloadPriority::Critical => "critical",
            PreloadPriority::High => "high",
            PreloadPriority::Medium => "medium",
            PreloadPriority::Low => "low",
        };
        f.write_str(name)
    }
}

/// A named, prioritized asset load.
///
/// The loader is invoked once, when the task's batch starts. A task is never
/// retried.
pub struct PreloadTask {
    /// Name of the task, also the cache key of the loaded asset.
    pub name: String,
    /// Tier the task is queued in.
    pub priority: PreloadPriority,
    loader: Loader,
}

impl PreloadTask {
    /// Creates a task from an async loader.
    pub fn new<F, Fut>(name: impl Into<String>, priority: PreloadPriority, loader: F) -> Self
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<PreloadedAsset>> + Send + 'static,
    {
        Self {
            name: name.into(),
            priority,
            loader: Box::new(move || Box::pin(loader()) as LoadFuture),
        }
    }

    pub(crate) fn into_parts(self) -> (String, Loader) {
        (self.name, self.loader)
    }
}

impl fmt::Debug for PreloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreloadTask")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priorities_are_ordered() {
        assert!(PreloadPriority::Critical < PreloadPriority::High);
        assert!(PreloadPriority::Medium < PreloadPriority::Low);
        assert_eq!(PreloadPriority::Low.index(), 3);
    }

    #[test]
    fn test_batch_sizes_follow_config() {
        let config = PreloadConfig::default();
        assert_eq!(PreloadPriority::Critical.batch_size(&config), 1);
        assert_eq!(PreloadPriority::High.batch_size(&config), 3);
        assert_eq!(PreloadPriority::Medium.batch_size(&config), 5);
        assert_eq!(PreloadPriority::Low.batch_size(&config), 8);
    }

    #[test]
    fn test_debug_hides_loader() {
        let task = PreloadTask::new("sky", PreloadPriority::High, || async {
            anyhow::Ok(PreloadedAsset::Untracked)
        });
        let text = format!("{task:?}");
        assert!(text.contains("sky"));
        assert!(text.contains("High"));
    }
}
