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

//! Frame timing telemetry for the governor.
//!
//! The [`FrameTimingMonitor`] samples every animation tick and condenses the
//! samples into one [`PerformanceMetrics`](aurora_core::PerformanceMetrics)
//! per window. [`detect_capabilities`] takes the one-off snapshot of the host
//! that decides the starting quality tier.

#![warn(missing_docs)]

pub mod metrics;
pub mod monitoring;

pub use metrics::ring_buffer::RingBuffer;
pub use monitoring::capabilities::detect_capabilities;
pub use monitoring::frame_monitor::{FrameTimingMonitor, MetricsCallback};
