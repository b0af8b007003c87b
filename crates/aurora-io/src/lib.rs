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

//! Asset preloading for the governor.
//!
//! The [`Preloader`] queues [`PreloadTask`]s by priority and drains them when
//! the host asks, critical assets first and one at a time, everything else in
//! small concurrent batches that yield to the frame loop in between.

#![warn(missing_docs)]

pub mod preload;

pub use preload::preloader::{PreloadProgress, PreloadSummary, Preloader};
pub use preload::task::{LoadFuture, PreloadPriority, PreloadTask};
