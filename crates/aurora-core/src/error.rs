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

//! Error types surfaced to callers.
//!
//! At run time the governor heals itself and never returns errors; the only
//! failures a caller can observe come from loading a configuration.

use thiserror::Error;

/// An error raised while loading or validating a [`GovernorConfig`](crate::GovernorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read governor config: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON or does not match the schema.
    #[error("failed to parse governor config: {0}")]
    Parse(#[from] serde_json::Error),
    /// A field holds a value the governor cannot work with.
    #[error("invalid governor config field `{field}`: {reason}")]
    Invalid {
        /// Dotted path of the offending field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
