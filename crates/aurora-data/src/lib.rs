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

//! Resource caches of the governor.
//!
//! [`LruCache`] is a bounded, cost-aware cache that owns and disposes its
//! values. [`ResourceCacheManager`] groups one cache per resource kind with a
//! registry for disposables that live outside the caches.

#![warn(missing_docs)]

pub mod cache;

pub use cache::lru::{CacheEntry, CacheStats, LruCache};
pub use cache::manager::{CacheManagerStats, DisposerId, ResourceCacheManager};
