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

//! Abstractions over the host platform.
//!
//! Capabilities are detected once at startup and injected as a plain struct;
//! the renderer handle and the memory reclaim hook are traits so the governor
//! can run against any backend (or none, in tests).

use crate::quality::QualityLevel;
use serde::{Deserialize, Serialize};

const GIB: u64 = 1024 * 1024 * 1024;

/// A static snapshot of what the host device can do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeviceCapabilities {
    /// Total physical memory in bytes, if known.
    pub total_memory_bytes: Option<u64>,
    /// Number of logical CPU cores.
    pub logical_cores: usize,
    /// The user asked the platform to reduce motion.
    pub prefers_reduced_motion: bool,
}

impl Default for DeviceCapabilities {
    fn default() -> Self {
        Self {
            total_memory_bytes: None,
            logical_cores: 4,
            prefers_reduced_motion: false,
        }
    }
}

/// Coarse device classification derived from [`DeviceCapabilities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    /// ≤ 2 GiB of memory or ≤ 2 cores.
    LowEnd,
    /// ≤ 4 GiB of memory or ≤ 4 cores.
    MidRange,
    /// Anything above.
    HighEnd,
}

impl DeviceCapabilities {
    /// Classifies the device. Unknown memory is judged on core count alone.
    pub fn class(&self) -> DeviceClass {
        let memory = self.total_memory_bytes.unwrap_or(u64::MAX);
        if memory <= 2 * GIB || self.logical_cores <= 2 {
            DeviceClass::LowEnd
        } else if memory <= 4 * GIB || self.logical_cores <= 4 {
            DeviceClass::MidRange
        } else {
            DeviceClass::HighEnd
        }
    }

    /// The tier the governor starts at.
    pub fn initial_quality(&self) -> QualityLevel {
        if self.prefers_reduced_motion {
            return QualityLevel::Low;
        }
        match self.class() {
            DeviceClass::LowEnd => QualityLevel::Low,
            DeviceClass::MidRange => QualityLevel::Medium,
            DeviceClass::HighEnd => QualityLevel::High,
        }
    }

    /// The highest tier the adaptive controller may reach on this device.
    pub fn quality_ceiling(&self) -> QualityLevel {
        if self.prefers_reduced_motion {
            return QualityLevel::Medium;
        }
        match self.class() {
            DeviceClass::LowEnd => QualityLevel::Medium,
            DeviceClass::MidRange => QualityLevel::High,
            DeviceClass::HighEnd => QualityLevel::Ultra,
        }
    }
}

/// A renderer handle the governor can ask to flush queued GPU work.
pub trait RenderTarget {
    /// Human-readable name, for logs.
    fn label(&self) -> &str {
        "renderer"
    }

    /// Submits and waits for any pending rendering work.
    fn flush(&mut self);
}

/// Best-effort hook asking the platform to give memory back.
///
/// Platforms without such a facility use [`NoopReclaim`].
pub trait MemoryReclaim {
    /// Requests a reclaim pass. Must be cheap to call and never block.
    fn request_memory_reclaim(&mut self);
}

/// A [`MemoryReclaim`] that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopReclaim;

impl MemoryReclaim for NoopReclaim {
    fn request_memory_reclaim(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(memory_gib: Option<u64>, cores: usize) -> DeviceCapabilities {
        DeviceCapabilities {
            total_memory_bytes: memory_gib.map(|g| g * GIB),
            logical_cores: cores,
            prefers_reduced_motion: false,
        }
    }

    #[test]
    fn test_low_end_device() {
        let c = caps(Some(2), 8);
        assert_eq!(c.class(), DeviceClass::LowEnd);
        assert_eq!(c.initial_quality(), QualityLevel::Low);
        assert_eq!(c.quality_ceiling(), QualityLevel::Medium);
    }

    #[test]
    fn test_mid_range_device() {
        let c = caps(Some(16), 4);
        assert_eq!(c.class(), DeviceClass::MidRange);
        assert_eq!(c.initial_quality(), QualityLevel::Medium);
        assert_eq!(c.quality_ceiling(), QualityLevel::High);
    }

    #[test]
    fn test_high_end_device() {
        let c = caps(Some(32), 16);
        assert_eq!(c.class(), DeviceClass::HighEnd);
        assert_eq!(c.initial_quality(), QualityLevel::High);
        assert_eq!(c.quality_ceiling(), QualityLevel::Ultra);
    }

    #[test]
    fn test_unknown_memory_uses_cores() {
        assert_eq!(caps(None, 12).class(), DeviceClass::HighEnd);
        assert_eq!(caps(None, 2).class(), DeviceClass::LowEnd);
    }

    #[test]
    fn test_reduced_motion_caps_quality() {
        let mut c = caps(Some(32), 16);
        c.prefers_reduced_motion = true;
        assert_eq!(c.initial_quality(), QualityLevel::Low);
        assert_eq!(c.quality_ceiling(), QualityLevel::Medium);
    }
}
