/*
 * Copyright (c) Meta Platforms, Inc. and affiliates.
 * All rights reserved.
 *
 * This source code is licensed under the BSD-style license found in the
 * LICENSE file in the root directory of this source tree.
 */

//! Configuration for the session engine.
//!
//! Values come from [`EngineConfig::default`], may be overridden from
//! environment variables with [`EngineConfig::from_env`], or loaded from a
//! YAML file with [`EngineConfig::from_yaml`].

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;

/// Inactivity window after which a session terminates itself.
pub const DEFAULT_INACTIVITY_TIMEOUT: Duration = Duration::from_secs(24 * 60 * 60);

/// Environment variable overriding [`EngineConfig::inactivity_timeout`], in seconds.
pub const INACTIVITY_TIMEOUT_SECS_ENV: &str = "ISLANDS_INACTIVITY_TIMEOUT_SECS";
/// Environment variable overriding [`EngineConfig::call_timeout`], in milliseconds.
pub const CALL_TIMEOUT_MS_ENV: &str = "ISLANDS_CALL_TIMEOUT_MS";
/// Environment variable overriding [`EngineConfig::mailbox_capacity`].
pub const MAILBOX_CAPACITY_ENV: &str = "ISLANDS_MAILBOX_CAPACITY";
/// Environment variable overriding [`EngineConfig::max_restarts`].
pub const MAX_RESTARTS_ENV: &str = "ISLANDS_MAX_RESTARTS";
/// Environment variable overriding [`EngineConfig::restart_window`], in seconds.
pub const RESTART_WINDOW_SECS_ENV: &str = "ISLANDS_RESTART_WINDOW_SECS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long a session may go without a successful action.
    pub inactivity_timeout: Duration,
    /// How long a caller waits for a session to reply.
    pub call_timeout: Duration,
    /// Capacity of each session's mailbox.
    pub mailbox_capacity: usize,
    /// Restarts allowed per session within `restart_window` before the
    /// supervisor gives up on it.
    pub max_restarts: u32,
    pub restart_window: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout: DEFAULT_INACTIVITY_TIMEOUT,
            call_timeout: Duration::from_secs(5),
            mailbox_capacity: 64,
            max_restarts: 3,
            restart_window: Duration::from_secs(5),
        }
    }
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, overridden by any of the `ISLANDS_*` environment variables
    /// that are set and parse.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let parse_u64 = |key: &str| lookup(key).and_then(|val| val.parse::<u64>().ok());

        if let Some(secs) = parse_u64(INACTIVITY_TIMEOUT_SECS_ENV) {
            config.inactivity_timeout = Duration::from_secs(secs);
        }
        if let Some(millis) = parse_u64(CALL_TIMEOUT_MS_ENV) {
            config.call_timeout = Duration::from_millis(millis);
        }
        if let Some(capacity) = parse_u64(MAILBOX_CAPACITY_ENV) {
            // A zero-capacity mpsc channel panics on construction.
            config.mailbox_capacity = capacity.max(1) as usize;
        }
        if let Some(restarts) = lookup(MAX_RESTARTS_ENV).and_then(|val| val.parse::<u32>().ok()) {
            config.max_restarts = restarts;
        }
        if let Some(secs) = parse_u64(RESTART_WINDOW_SECS_ENV) {
            config.restart_window = Duration::from_secs(secs);
        }

        config
    }

    /// Load configuration from a YAML file. Missing fields take their
    /// default values.
    pub fn from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Self = serde_yaml::from_str(&contents)?;
        config.mailbox_capacity = config.mailbox_capacity.max(1);
        Ok(config)
    }

    /// Save configuration to a YAML file.
    pub fn to_yaml<P: AsRef<Path>>(&self, path: P) -> Result<(), anyhow::Error> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_restart_intensity(mut self, max_restarts: u32, window: Duration) -> Self {
        self.max_restarts = max_restarts;
        self.restart_window = window;
        self
    }
}
