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

//! A bounded least-recently-used cache with a byte budget and a TTL.
//!
//! The cache owns its values: it is the only place that disposes them, either
//! when they are evicted, replaced, deleted or when the cache is dropped.
//! Inserts are never refused; the limits are restored by a cleanup pass that
//! runs after every insert:
//!
//! 1. entries older than the TTL are evicted,
//! 2. least-recently-used entries are evicted while over the entry ceiling,
//! 3. the least-accessed entry is evicted while over the byte budget.

use aurora_core::config::CacheLimits;
use aurora_core::resource::Disposable;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Default time-to-live of a cache entry.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// A cached value and its bookkeeping.
#[derive(Debug)]
pub struct CacheEntry<T> {
    value: T,
    created_at: Instant,
    last_access: Instant,
    access_count: u64,
    size_bytes: usize,
    /// Monotonic stamp of the last touch; orders entries by recency without
    /// relying on `Instant` resolution.
    recency: u64,
}

impl<T> CacheEntry<T> {
    /// When the entry was inserted.
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// When the entry was last read or written.
    pub fn last_access(&self) -> Instant {
        self.last_access
    }

    /// How many times the entry was touched (the insert counts as one).
    pub fn access_count(&self) -> u64 {
        self.access_count
    }

    /// Estimated size in bytes.
    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.created_at) >= ttl
    }
}

/// A snapshot of a cache's occupancy and effectiveness.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CacheStats {
    /// Entries currently held.
    pub entries: usize,
    /// Entry ceiling.
    pub max_entries: usize,
    /// Estimated bytes currently held.
    pub memory_usage: usize,
    /// Byte budget.
    pub max_bytes: usize,
    /// Mean access count across entries, a cheap hit-rate proxy.
    pub average_access_count: f32,
    /// Successful lookups since creation.
    pub hits: u64,
    /// Failed lookups (absent or expired) since creation.
    pub misses: u64,
    /// Entries evicted by the cleanup passes since creation.
    pub evictions: u64,
}

/// A bounded, cost-aware LRU cache keyed by string.
pub struct LruCache<T: Disposable> {
    label: &'static str,
    entries: HashMap<String, CacheEntry<T>>,
    limits: CacheLimits,
    ttl: Duration,
    memory_usage: usize,
    clock: u64,
    hits: u64,
    misses: u64,
    evictions: u64,
}

impl<T: Disposable> LruCache<T> {
    /// Creates an empty cache with the default TTL.
    pub fn new(label: &'static str, limits: CacheLimits) -> Self {
        Self::with_ttl(label, limits, DEFAULT_TTL)
    }

    /// Creates an empty cache with a custom TTL.
    pub fn with_ttl(label: &'static str, limits: CacheLimits, ttl: Duration) -> Self {
        Self {
            label,
            entries: HashMap::new(),
            limits,
            ttl,
            memory_usage: 0,
            clock: 0,
            hits: 0,
            misses: 0,
            evictions: 0,
        }
    }

    /// Name used in logs.
    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Inserts a value, then restores the limits.
    pub fn set(&mut self, key: impl Into<String>, value: T, estimated_bytes: usize) {
        self.set_at(key, value, estimated_bytes, Instant::now());
    }

    /// Inserts a value at `now`, then restores the limits.
    ///
    /// A value already stored under `key` is disposed and replaced.
    pub fn set_at(
        &mut self,
        key: impl Into<String>,
        value: T,
        estimated_bytes: usize,
        now: Instant,
    ) {
        let key = key.into();
        if let Some(mut previous) = self.entries.remove(&key) {
            self.memory_usage = self.memory_usage.saturating_sub(previous.size_bytes);
            previous.value.dispose();
        }

        let recency = self.next_stamp();
        self.entries.insert(
            key,
            CacheEntry {
                value,
                created_at: now,
                last_access: now,
                access_count: 1,
                size_bytes: estimated_bytes,
                recency,
            },
        );
        self.memory_usage = self.memory_usage.saturating_add(estimated_bytes);

        self.enforce_limits(now);
    }

    /// Looks a value up, refreshing its recency and access count.
    pub fn get(&mut self, key: &str) -> Option<&T> {
        self.get_at(key, Instant::now())
    }

    /// Looks a value up at `now`.
    ///
    /// Expired entries are evicted on the spot and reported as absent.
    pub fn get_at(&mut self, key: &str, now: Instant) -> Option<&T> {
        let expired = match self.entries.get(key) {
            None => {
                self.misses += 1;
                return None;
            }
            Some(entry) => entry.is_expired(now, self.ttl),
        };

        if expired {
            self.remove_and_dispose(key);
            self.evictions += 1;
            self.misses += 1;
            log::trace!("{} cache: '{}' expired on lookup", self.label, key);
            return None;
        }

        let stamp = self.next_stamp();
        self.hits += 1;
        let entry = self.entries.get_mut(key)?;
        entry.last_access = now;
        entry.access_count += 1;
        entry.recency = stamp;
        Some(&entry.value)
    }

    /// Returns the bookkeeping of an entry without touching it.
    pub fn entry(&self, key: &str) -> Option<&CacheEntry<T>> {
        self.entries.get(key)
    }

    /// Whether `key` is present (expired or not) without touching it.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Removes and disposes an entry. Returns `false` if it was absent.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_and_dispose(key)
    }

    /// Removes and disposes every entry.
    pub fn clear(&mut self) {
        let count = self.entries.len();
        for (_, mut entry) in self.entries.drain() {
            entry.value.dispose();
        }
        self.memory_usage = 0;
        if count > 0 {
            log::debug!("{} cache: cleared {} entries", self.label, count);
        }
    }

    /// Evicts every entry older than the TTL. Returns how many were evicted.
    pub fn evict_expired(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let expired: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now, ttl))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &expired {
            self.remove_and_dispose(key);
        }
        self.evictions += expired.len() as u64;
        expired.len()
    }

    /// Evicts least-recently-used entries until both the entry count and the
    /// byte total are at or below `fraction` of the limits.
    ///
    /// Returns how many entries were evicted.
    pub fn shrink_to(&mut self, fraction: f32) -> usize {
        let fraction = fraction.clamp(0.0, 1.0);
        let target_entries = (self.limits.max_entries as f32 * fraction).floor() as usize;
        let target_bytes = (self.limits.max_bytes as f64 * f64::from(fraction)).floor() as usize;

        let mut evicted = 0;
        while self.entries.len() > target_entries || self.memory_usage > target_bytes {
            match self.least_recently_used() {
                Some(key) => {
                    self.remove_and_dispose(&key);
                    evicted += 1;
                }
                None => break,
            }
        }
        self.evictions += evicted as u64;
        evicted
    }

    /// Entries currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds nothing.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Estimated bytes currently held.
    pub fn memory_usage(&self) -> usize {
        self.memory_usage
    }

    /// Configured bounds.
    pub fn limits(&self) -> CacheLimits {
        self.limits
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Occupancy and effectiveness snapshot.
    pub fn stats(&self) -> CacheStats {
        let average_access_count = if self.entries.is_empty() {
            0.0
        } else {
            self.entries.values().map(|e| e.access_count).sum::<u64>() as f32
                / self.entries.len() as f32
        };
        CacheStats {
            entries: self.entries.len(),
            max_entries: self.limits.max_entries,
            memory_usage: self.memory_usage,
            max_bytes: self.limits.max_bytes,
            average_access_count,
            hits: self.hits,
            misses: self.misses,
            evictions: self.evictions,
        }
    }

    fn enforce_limits(&mut self, now: Instant) {
        let expired = self.evict_expired(now);

        let mut over_count = 0;
        while self.entries.len() > self.limits.max_entries {
            let Some(key) = self.least_recently_used() else {
                break;
            };
            self.remove_and_dispose(&key);
            over_count += 1;
        }

        let mut over_budget = 0;
        while self.memory_usage > self.limits.max_bytes {
            let Some(key) = self.least_accessed() else {
                break;
            };
            self.remove_and_dispose(&key);
            over_budget += 1;
        }

        self.evictions += (over_count + over_budget) as u64;
        if expired + over_count + over_budget > 0 {
            log::debug!(
                "{} cache: evicted {} expired, {} over count, {} over budget ({} entries, {} bytes)",
                self.label,
                expired,
                over_count,
                over_budget,
                self.entries.len(),
                self.memory_usage
            );
        }
    }

    fn least_recently_used(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, e)| e.recency)
            .map(|(k, _)| k.clone())
    }

    /// Lowest access count; ties go to the least recently used entry.
    fn least_accessed(&self) -> Option<String> {
        self.entries
            .iter()
            .min_by_key(|(_, e)| (e.access_count, e.recency))
            .map(|(k, _)| k.clone())
    }

    fn remove_and_dispose(&mut self, key: &str) -> bool {
        match self.entries.remove(key) {
            Some(mut entry) => {
                self.memory_usage = self.memory_usage.saturating_sub(entry.size_bytes);
                entry.value.dispose();
                true
            }
            None => false,
        }
    }

    fn next_stamp(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

impl<T: Disposable> Drop for LruCache<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: Disposable> fmt::Debug for LruCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LruCache")
            .field("label", &self.label)
            .field("entries", &self.entries.len())
            .field("memory_usage", &self.memory_usage)
            .field("limits", &self.limits)
            .field("ttl", &self.ttl)
            .finish()
    }
}
