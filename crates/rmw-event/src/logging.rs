// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Console logging setup.
//!
//! The crate only emits through the `log` facade; embedders that have no
//! logger of their own can install `env_logger` with these helpers.

use crate::env_config::EnvConfig;
use log::LevelFilter;

/// Install a console logger at `level`.
///
/// Returns `false` if a logger was already installed.
pub fn init(level: LevelFilter) -> bool {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}

/// Install a console logger using the configured level as default.
///
/// `RUST_LOG` overrides the configured level when set.
pub fn init_from_env(config: &EnvConfig) -> bool {
    let default_filter = config.level_filter().to_string();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp_millis()
        .try_init()
        .is_ok()
}
