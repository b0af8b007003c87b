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

//! The public-facing entry point of Aurora.
//!
//! A host builds one [`PerformanceGovernor`], calls
//! [`initialize`](PerformanceGovernor::initialize) once the scene exists and
//! then [`on_frame`](PerformanceGovernor::on_frame) from its animation
//! callback. Everything else (quality, caches, preloading) hangs off the
//! governor.

#![warn(missing_docs)]

pub mod governor;
mod maintenance;
pub mod observers;

pub use governor::PerformanceGovernor;
pub use observers::ObserverId;

/// The types a host needs to drive the governor.
pub mod prelude {
    pub use crate::governor::PerformanceGovernor;
    pub use crate::observers::ObserverId;
    pub use aurora_core::config::GovernorConfig;
    pub use aurora_core::platform::{DeviceCapabilities, MemoryReclaim, NoopReclaim, RenderTarget};
    pub use aurora_core::resource::{
        Disposable, GeometryResource, MaterialResource, PreloadedAsset, ShaderResource,
        TextureResource,
    };
    pub use aurora_core::{PerformanceMetrics, QualityLevel, QualitySettings};
    pub use aurora_data::ResourceCacheManager;
    pub use aurora_io::{PreloadPriority, PreloadProgress, PreloadSummary, PreloadTask, Preloader};
    pub use aurora_telemetry::detect_capabilities;
}
