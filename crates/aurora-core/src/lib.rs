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

//! # Aurora Core
//!
//! Foundational crate containing the shared vocabulary of the performance
//! governor: frame metrics, quality tiers, resource capabilities, platform
//! hooks and configuration.
//!
//! This crate defines the abstract "what". `aurora-telemetry` measures,
//! `aurora-data` caches, `aurora-io` preloads, `aurora-control` decides, and
//! `aurora-sdk` wires everything into the governor.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod platform;
pub mod quality;
pub mod resource;
pub mod telemetry;
pub mod utils;

pub use config::GovernorConfig;
pub use error::{ConfigError, ConfigResult};
pub use quality::{QualityLevel, QualitySettings};
pub use telemetry::PerformanceMetrics;
pub use utils::timer::Stopwatch;
