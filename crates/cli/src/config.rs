// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is read from `$NETSYNC_CONFIG` or
//! `<config dir>/netsync/config.toml`. Every field has a default, so a missing
//! file is equivalent to an empty one:
//!
//! ```toml
//! base_url = "https://sync.example.com/api"
//! request_timeout_ms = 5000
//!
//! [supervisor]
//! base_interval_secs = 30
//!
//! [realtime]
//! keepalive_interval_ms = 25000
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::env;
use crate::error::{Error, Result};

const APP_DIR_NAME: &str = "netsync";
const CONFIG_FILE_NAME: &str = "config.toml";
const REALTIME_PATH: &str = "/ws";

/// Client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base address of the request/reply API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Realtime endpoint. Derived from `base_url` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtime_url: Option<String>,
    /// Ceiling for a single request/reply call.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub realtime: RealtimeConfig,
}

/// Probe scheduling for the connectivity supervisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupervisorConfig {
    /// Probe interval while online, and the base of post-contact backoff.
    #[serde(default = "default_base_interval_secs")]
    pub base_interval_secs: u64,
    /// Ceiling of the post-contact exponential backoff.
    #[serde(default = "default_max_interval_secs")]
    pub max_interval_secs: u64,
    /// First retry interval before the backend has ever answered.
    #[serde(default = "default_initial_interval_secs")]
    pub initial_interval_secs: u64,
    /// Linear increment per failure before first contact.
    #[serde(default = "default_step_secs")]
    pub step_secs: u64,
    /// Ceiling of the first-contact linear ramp.
    #[serde(default = "default_initial_cap_secs")]
    pub initial_cap_secs: u64,
}

/// Realtime channel timing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RealtimeConfig {
    #[serde(default = "default_initial_reconnect_delay_ms")]
    pub initial_reconnect_delay_ms: u64,
    #[serde(default = "default_max_reconnect_delay_ms")]
    pub max_reconnect_delay_ms: u64,
    /// Idle time after which a keepalive ping is sent.
    #[serde(default = "default_keepalive_interval_ms")]
    pub keepalive_interval_ms: u64,
}

fn default_base_url() -> String {
    "http://localhost:8080".to_string()
}

fn default_request_timeout_ms() -> u64 {
    5_000
}

fn default_base_interval_secs() -> u64 {
    30
}

fn default_max_interval_secs() -> u64 {
    300
}

fn default_initial_interval_secs() -> u64 {
    3
}

fn default_step_secs() -> u64 {
    2
}

fn default_initial_cap_secs() -> u64 {
    15
}

fn default_initial_reconnect_delay_ms() -> u64 {
    2_000
}

fn default_max_reconnect_delay_ms() -> u64 {
    30_000
}

fn default_keepalive_interval_ms() -> u64 {
    25_000
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: default_base_url(),
            realtime_url: None,
            request_timeout_ms: default_request_timeout_ms(),
            supervisor: SupervisorConfig::default(),
            realtime: RealtimeConfig::default(),
        }
    }
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        SupervisorConfig {
            base_interval_secs: default_base_interval_secs(),
            max_interval_secs: default_max_interval_secs(),
            initial_interval_secs: default_initial_interval_secs(),
            step_secs: default_step_secs(),
            initial_cap_secs: default_initial_cap_secs(),
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        RealtimeConfig {
            initial_reconnect_delay_ms: default_initial_reconnect_delay_ms(),
            max_reconnect_delay_ms: default_max_reconnect_delay_ms(),
            keepalive_interval_ms: default_keepalive_interval_ms(),
        }
    }
}

impl ClientConfig {
    /// Loads the config from the default location, then applies
    /// environment overrides.
    pub fn load_default() -> Result<Self> {
        let path = env::config_path().or_else(default_config_path);
        let mut config = match path {
            Some(ref p) if p.exists() => Self::load(p)?,
            _ => Self::default(),
        };
        if let Some(url) = env::base_url() {
            config.base_url = url;
        }
        config.validate()?;
        Ok(config)
    }

    /// Loads the config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses a config from TOML text.
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("failed to parse config: {}", e)))
    }

    /// Writes the config as TOML.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content)?;
        Ok(())
    }

    /// Checks that the base url is an http(s) address and that every
    /// interval is non-zero with ceilings no lower than their starting points.
    pub fn validate(&self) -> Result<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(Error::InvalidUrl(self.base_url.clone()));
        }
        let s = &self.supervisor;
        let r = &self.realtime;
        for (name, value) in [
            ("request_timeout_ms", self.request_timeout_ms),
            ("supervisor.base_interval_secs", s.base_interval_secs),
            ("supervisor.max_interval_secs", s.max_interval_secs),
            ("supervisor.initial_interval_secs", s.initial_interval_secs),
            ("supervisor.initial_cap_secs", s.initial_cap_secs),
            ("realtime.initial_reconnect_delay_ms", r.initial_reconnect_delay_ms),
            ("realtime.max_reconnect_delay_ms", r.max_reconnect_delay_ms),
            ("realtime.keepalive_interval_ms", r.keepalive_interval_ms),
        ] {
            if value == 0 {
                return Err(Error::Config(format!("{} must be greater than zero", name)));
            }
        }
        for (max, initial) in [
            (
                ("supervisor.max_interval_secs", s.max_interval_secs),
                ("supervisor.base_interval_secs", s.base_interval_secs),
            ),
            (
                ("supervisor.initial_cap_secs", s.initial_cap_secs),
                ("supervisor.initial_interval_secs", s.initial_interval_secs),
            ),
            (
                ("realtime.max_reconnect_delay_ms", r.max_reconnect_delay_ms),
                ("realtime.initial_reconnect_delay_ms", r.initial_reconnect_delay_ms),
            ),
        ] {
            if max.1 < initial.1 {
                return Err(Error::Config(format!("{} is below {}", max.0, initial.0)));
            }
        }
        Ok(())
    }

    /// Base url without a trailing slash.
    pub fn base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Realtime endpoint: the explicit `realtime_url`, or `base_url` with a
    /// websocket scheme and `/ws` appended.
    pub fn realtime_url(&self) -> String {
        if let Some(ref url) = self.realtime_url {
            return url.clone();
        }
        let base = self.base_url();
        let rest = if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        };
        format!("{}{}", rest, REALTIME_PATH)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl SupervisorConfig {
    pub fn base_interval(&self) -> Duration {
        Duration::from_secs(self.base_interval_secs)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(self.max_interval_secs)
    }

    pub fn initial_interval(&self) -> Duration {
        Duration::from_secs(self.initial_interval_secs)
    }

    pub fn step(&self) -> Duration {
        Duration::from_secs(self.step_secs)
    }

    pub fn initial_cap(&self) -> Duration {
        Duration::from_secs(self.initial_cap_secs)
    }
}

impl RealtimeConfig {
    pub fn initial_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.initial_reconnect_delay_ms)
    }

    pub fn max_reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.max_reconnect_delay_ms)
    }

    pub fn keepalive_interval(&self) -> Duration {
        Duration::from_millis(self.keepalive_interval_ms)
    }
}

/// `<config dir>/netsync/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR_NAME).join(CONFIG_FILE_NAME))
}

/// Directory holding the credential cache.
///
/// Resolution order:
/// 1. `NETSYNC_STATE_DIR`
/// 2. `<data dir>/netsync`
/// 3. `./.netsync`
pub fn state_dir() -> PathBuf {
    env::state_dir()
        .or_else(|| dirs::data_dir().map(|d| d.join(APP_DIR_NAME)))
        .unwrap_or_else(|| PathBuf::from(".netsync"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
