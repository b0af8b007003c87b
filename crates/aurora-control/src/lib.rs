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

//! Decision making for the governor.
//!
//! - [`AdaptiveQualityController`] turns a history of frame metrics into a
//!   quality tier, one step at a time.
//! - [`FrameScheduler`] runs recurring maintenance work under a frame budget.
//! - [`RenderRateLimiter`] decides whether a tick should render at all.

#![warn(missing_docs)]

pub mod quality;
pub mod rate_limiter;
pub mod scheduler;

pub use quality::{AdaptiveQualityController, QualityTransition};
pub use rate_limiter::RenderRateLimiter;
pub use scheduler::{FrameReport, FrameScheduler, TaskId};
