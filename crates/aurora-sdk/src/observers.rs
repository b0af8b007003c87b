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

//! Subscribers to the per-window performance metrics.

use aurora_core::PerformanceMetrics;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Handle returned when subscribing; pass it back to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(u64);

type Observer = Box<dyn FnMut(&PerformanceMetrics)>;

/// Observers in subscription order.
#[derive(Default)]
pub(crate) struct ObserverRegistry {
    observers: Vec<(ObserverId, Observer)>,
    next_id: u64,
}

impl ObserverRegistry {
    pub(crate) fn subscribe(&mut self, observer: Observer) -> ObserverId {
        self.next_id += 1;
        let id = ObserverId(self.next_id);
        self.observers.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: ObserverId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(oid, _)| *oid != id);
        self.observers.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn clear(&mut self) {
        self.observers.clear();
    }

    /// Calls every observer. A panicking observer is logged and skipped.
    pub(crate) fn notify(&mut self, metrics: &PerformanceMetrics) {
        for (id, observer) in self.observers.iter_mut() {
            if catch_unwind(AssertUnwindSafe(|| observer(metrics))).is_err() {
                log::warn!("PerformanceGovernor: observer {:?} panicked, skipping it", id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    #[test]
    fn test_panicking_observer_does_not_block_others() {
        let mut registry = ObserverRegistry::default();
        let calls = Rc::new(Cell::new(0));
        registry.subscribe(Box::new(|_: &PerformanceMetrics| panic!("bad observer")));
        let sink = calls.clone();
        registry.subscribe(Box::new(move |_: &PerformanceMetrics| sink.set(sink.get() + 1)));

        registry.notify(&PerformanceMetrics::default());
        registry.notify(&PerformanceMetrics::default());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let mut registry = ObserverRegistry::default();
        let id = registry.subscribe(Box::new(|_: &PerformanceMetrics| {}));
        assert_eq!(registry.len(), 1);
        assert!(registry.unsubscribe(id));
        assert!(!registry.unsubscribe(id));
        assert_eq!(registry.len(), 0);
    }
}
