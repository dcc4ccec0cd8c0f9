// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Environment variable configuration for rmw-event.
//!
//! - `RMW_EVENT_LOG_LEVEL`: logging level (default: "info")
//! - `RMW_EVENT_WAIT_SET_CAPACITY`: slots per default local wait-set
//!   (default: 64)
//!
//! # Example
//!
//! ```bash
//! export RMW_EVENT_LOG_LEVEL=debug
//! export RMW_EVENT_WAIT_SET_CAPACITY=256
//! ```

use crate::local::DEFAULT_WAIT_SET_CAPACITY;
use std::env;

pub const ENV_LOG_LEVEL: &str = "RMW_EVENT_LOG_LEVEL";
pub const ENV_WAIT_SET_CAPACITY: &str = "RMW_EVENT_WAIT_SET_CAPACITY";

const DEFAULT_LOG_LEVEL: &str = "info";

/// Runtime configuration from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvConfig {
    /// Logging level (trace, debug, info, warn, error, off)
    pub log_level: String,

    /// Slots per wait-set created by `LocalContext::create_default_wait_set`
    pub wait_set_capacity: usize,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            wait_set_capacity: DEFAULT_WAIT_SET_CAPACITY,
        }
    }
}

impl EnvConfig {
    /// Load configuration from environment variables.
    ///
    /// Empty values are treated as unset; a capacity that does not parse or
    /// is zero falls back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        let log_level = env::var(ENV_LOG_LEVEL)
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let wait_set_capacity = match env::var(ENV_WAIT_SET_CAPACITY) {
            Ok(raw) => match raw.trim().parse::<usize>() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => {
                    log::warn!(
                        "[event] ignoring invalid {}={:?}, using {}",
                        ENV_WAIT_SET_CAPACITY,
                        raw,
                        DEFAULT_WAIT_SET_CAPACITY
                    );
                    DEFAULT_WAIT_SET_CAPACITY
                }
            },
            Err(_) => DEFAULT_WAIT_SET_CAPACITY,
        };

        Self {
            log_level,
            wait_set_capacity,
        }
    }

    /// Check if any custom configuration was provided
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.log_level != DEFAULT_LOG_LEVEL || self.wait_set_capacity != DEFAULT_WAIT_SET_CAPACITY
    }

    /// Configured level as a `log` filter. Unknown names map to `Info`.
    #[must_use]
    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}
