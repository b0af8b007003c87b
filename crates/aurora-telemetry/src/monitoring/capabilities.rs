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

//! sysinfo-based detection of the host's capabilities.

use aurora_core::platform::DeviceCapabilities;
use std::thread;
use sysinfo::System;

/// Takes a one-off snapshot of the host.
///
/// The reduced-motion preference is a user setting the OS exposes to the
/// windowing layer, not to sysinfo, so the host passes it in.
pub fn detect_capabilities(prefers_reduced_motion: bool) -> DeviceCapabilities {
    let mut system = System::new_all();
    system.refresh_all();

    let total_memory = system.total_memory();
    let logical_cores = match system.cpus().len() {
        0 => thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1),
        n => n,
    };

    let capabilities = DeviceCapabilities {
        total_memory_bytes: (total_memory > 0).then_some(total_memory),
        logical_cores,
        prefers_reduced_motion,
    };

    log::info!(
        "Detected host: {} logical cores, {} memory, reduced motion {} -> {:?}",
        capabilities.logical_cores,
        capabilities
            .total_memory_bytes
            .map(|b| format!("{:.1} GiB", b as f64 / (1024.0 * 1024.0 * 1024.0)))
            .unwrap_or_else(|| "unknown".to_string()),
        capabilities.prefers_reduced_motion,
        capabilities.class()
    );

    capabilities
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_reports_at_least_one_core() {
        let caps = detect_capabilities(false);
        assert!(caps.logical_cores >= 1);
        assert!(!caps.prefers_reduced_motion);
    }

    #[test]
    fn test_reduced_motion_is_passed_through() {
        let caps = detect_capabilities(true);
        assert!(caps.prefers_reduced_motion);
        assert_eq!(
            caps.initial_quality(),
            aurora_core::QualityLevel::Low
        );
    }
}
