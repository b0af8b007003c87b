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

//! A bounded circular buffer with summary statistics over `f32` samples.

use std::collections::VecDeque;

/// A circular buffer holding the most recent `capacity` values.
///
/// Pushing into a full buffer overwrites the oldest value.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    /// Creates an empty buffer. A zero capacity is bumped to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes a value, evicting the oldest one if the buffer is full.
    pub fn push(&mut self, value: T) {
        if self.data.len() == self.capacity {
            self.data.pop_front();
        }
        self.data.push_back(value);
    }

    /// Number of values currently held.
    pub fn count(&self) -> usize {
        self.data.len()
    }

    /// Maximum number of values held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns `true` if no value has been pushed since creation or the last clear.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns `true` once `capacity` values are held.
    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    /// The most recently pushed value.
    pub fn latest(&self) -> Option<&T> {
        self.data.back()
    }

    /// Iterates from oldest to newest.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &T> + ExactSizeIterator {
        self.data.iter()
    }

    /// Drops every value.
    pub fn clear(&mut self) {
        self.data.clear();
    }
}

impl RingBuffer<f32> {
    /// Arithmetic mean, or `0.0` when empty.
    pub fn average(&self) -> f32 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().sum::<f32>() / self.data.len() as f32
    }

    /// Population variance. Needs two samples; returns `0.0` otherwise.
    pub fn variance(&self) -> f32 {
        if self.data.len() < 2 {
            return 0.0;
        }
        let avg = self.average();
        let sum_sq: f32 = self.data.iter().map(|v| (v - avg) * (v - avg)).sum();
        sum_sq / self.data.len() as f32
    }

    /// Standard deviation (square root of [`variance`](Self::variance)).
    pub fn std_dev(&self) -> f32 {
        self.variance().sqrt()
    }

    /// Smallest value, or `0.0` when empty.
    pub fn min(&self) -> f32 {
        self.data.iter().copied().reduce(f32::min).unwrap_or(0.0)
    }

    /// Largest value, or `0.0` when empty.
    pub fn max(&self) -> f32 {
        self.data.iter().copied().reduce(f32::max).unwrap_or(0.0)
    }

    /// Number of values strictly greater than `threshold`.
    pub fn count_above(&self, threshold: f32) -> usize {
        self.data.iter().filter(|v| **v > threshold).count()
    }
}
