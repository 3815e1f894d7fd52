//! Configuration management
//!
//! Config file is `hinks-upload.toml`, looked up next to the executable
//! and then in the current directory unless a path is given explicitly.

use crate::constants::{
    DEFAULT_ACK_TIMEOUT, DEFAULT_CONNECT_TIMEOUT, DEFAULT_CONTROLLER_PORT,
    DEFAULT_REQUEST_TIMEOUT, INFO_PROBE_ATTEMPTS,
};
use crate::error::{Result, UploadError};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Config file name
pub const CONFIG_FILE: &str = "hinks-upload.toml";

// =============================================================================
// Application Configuration
// =============================================================================

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub controller: ControllerConfig,
    pub timeouts: TimeoutConfig,
    pub upload: UploadConfig,
}

/// Where the controller lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Controller IP or host name
    pub host: String,
    /// Web server port (control plane)
    pub http_port: u16,
    /// Raw TCP port for the binary packet protocol
    pub binary_port: u16,
    /// FPP proxy host; requests then go to `http://<proxy>/proxy/<host>`
    pub proxy: Option<String>,
    /// Prefix prepended to every endpoint path
    pub base_path: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            http_port: DEFAULT_CONTROLLER_PORT,
            binary_port: DEFAULT_CONTROLLER_PORT,
            proxy: None,
            base_path: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Control-plane request timeout
    pub request_secs: u64,
    /// Wait for one binary acknowledgement
    pub ack_secs: u64,
    pub connect_secs: u64,
    /// Wait after a fire-and-forget reboot request
    pub reboot_ms: u64,
    /// Gap between the two reboot requests
    pub reboot_gap_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            ack_secs: DEFAULT_ACK_TIMEOUT.as_secs(),
            connect_secs: DEFAULT_CONNECT_TIMEOUT.as_secs(),
            reboot_ms: 1,
            reboot_gap_ms: 100,
        }
    }
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn ack(&self) -> Duration {
        Duration::from_secs(self.ack_secs)
    }

    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn reboot(&self) -> Duration {
        Duration::from_millis(self.reboot_ms)
    }

    pub fn reboot_gap(&self) -> Duration {
        Duration::from_millis(self.reboot_gap_ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Board-info probe attempts before giving up
    pub info_attempts: u32,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            info_attempts: INFO_PROBE_ATTEMPTS,
        }
    }
}

/// Reject values the transports cannot work with
pub fn validate(config: &Config) -> Result<()> {
    if config.controller.host.trim().is_empty() {
        return Err(UploadError::ConfigValidation {
            field: "controller.host",
            reason: "must not be empty".into(),
        });
    }
    let timeouts = [
        ("timeouts.request_secs", config.timeouts.request_secs),
        ("timeouts.ack_secs", config.timeouts.ack_secs),
        ("timeouts.connect_secs", config.timeouts.connect_secs),
    ];
    for (field, value) in timeouts {
        if value == 0 {
            return Err(UploadError::ConfigValidation {
                field,
                reason: "must be greater than zero".into(),
            });
        }
    }
    if config.upload.info_attempts == 0 {
        return Err(UploadError::ConfigValidation {
            field: "upload.info_attempts",
            reason: "must be at least 1".into(),
        });
    }
    Ok(())
}

/// Get the config file path
///
/// Next to the executable if present there, otherwise the current
/// directory.
pub fn config_path() -> PathBuf {
    let beside_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_FILE)));
    match beside_exe {
        Some(path) if path.exists() => path,
        _ => PathBuf::from(CONFIG_FILE),
    }
}

/// Read and parse one config file
pub fn load_from(path: &Path) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|e| UploadError::ConfigRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| UploadError::ConfigValidation {
        field: "config",
        reason: format!("{}: {}", path.display(), e),
    })
}

/// Load config
///
/// A file named on the command line must load. The auto-discovered file
/// falls back to defaults on any problem.
pub fn load(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_from(path),
        None => Ok(load_or_default(&config_path())),
    }
}

fn load_or_default(path: &Path) -> Config {
    if !path.exists() {
        debug!("No config file at {:?}, using defaults", path);
        return Config::default();
    }
    match load_from(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("{}, using defaults", e);
            Config::default()
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
