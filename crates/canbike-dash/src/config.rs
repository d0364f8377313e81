//! Dashboard configuration.
//!
//! Resolution order: built-in defaults, then a JSON config file, then
//! command-line flags and their environment variables.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use canbike_link::{PortSettings, ReaderConfig};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// All tunables of a dashboard session. Durations are in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashConfig {
    /// Engine controller port; commands are written here
    pub ecu_port: String,
    /// Actuator controller port; telemetry is read from here
    pub actuator_port: String,
    pub baud: u32,
    pub read_timeout_ms: u64,
    pub idle_backoff_ms: u64,
    pub fault_backoff_ms: u64,
    pub frame_rate_hz: u32,
    pub blink_interval_ms: u64,
    /// Synthesized key-release delay for terminals without release events
    pub hold_release_timeout_ms: u64,
    /// Directory for raw line logs and the diagnostic log
    pub log_dir: PathBuf,
}

impl Default for DashConfig {
    fn default() -> Self {
        let (ecu_port, actuator_port) = if cfg!(windows) {
            ("COM20", "COM21")
        } else {
            ("/dev/ttyUSB0", "/dev/ttyUSB1")
        };
        Self {
            ecu_port: ecu_port.to_owned(),
            actuator_port: actuator_port.to_owned(),
            baud: canbike_link::DEFAULT_BAUD,
            read_timeout_ms: 100,
            idle_backoff_ms: 5,
            fault_backoff_ms: 10,
            frame_rate_hz: canbike_scheduler::DEFAULT_FRAME_RATE_HZ,
            blink_interval_ms: 500,
            hold_release_timeout_ms: crate::input::DEFAULT_HOLD_RELEASE_MS,
            log_dir: PathBuf::from("."),
        }
    }
}

/// Flag-level overrides; `None` keeps the file or default value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    pub ecu_port: Option<String>,
    pub actuator_port: Option<String>,
    pub baud: Option<u32>,
    pub frame_rate_hz: Option<u32>,
    pub blink_interval_ms: Option<u64>,
    pub hold_release_timeout_ms: Option<u64>,
    pub log_dir: Option<PathBuf>,
}

impl DashConfig {
    /// `~/.config/canbike/config.json` or the platform equivalent.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("canbike").join("config.json"))
    }

    /// Load from `explicit` if given (it must exist), else from
    /// [`Self::default_path`] if that file exists, else defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`] for a bad file.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Parse one JSON file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Read`] or [`ConfigError::Parse`].
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(path = %path.display(), "loaded config");
        Ok(config)
    }

    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(port) = &overrides.ecu_port {
            self.ecu_port.clone_from(port);
        }
        if let Some(port) = &overrides.actuator_port {
            self.actuator_port.clone_from(port);
        }
        if let Some(baud) = overrides.baud {
            self.baud = baud;
        }
        if let Some(rate) = overrides.frame_rate_hz {
            self.frame_rate_hz = rate;
        }
        if let Some(interval) = overrides.blink_interval_ms {
            self.blink_interval_ms = interval;
        }
        if let Some(timeout) = overrides.hold_release_timeout_ms {
            self.hold_release_timeout_ms = timeout;
        }
        if let Some(dir) = &overrides.log_dir {
            self.log_dir.clone_from(dir);
        }
    }

    /// Reject settings the dashboard cannot run with.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] naming the first offending setting.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_rate_hz == 0 {
            return Err(ConfigError::Invalid("frame_rate_hz must be at least 1".into()));
        }
        if self.blink_interval_ms == 0 {
            return Err(ConfigError::Invalid("blink_interval_ms must be non-zero".into()));
        }
        if self.hold_release_timeout_ms == 0 {
            return Err(ConfigError::Invalid("hold_release_timeout_ms must be non-zero".into()));
        }
        if self.baud == 0 {
            return Err(ConfigError::Invalid("baud must be non-zero".into()));
        }
        if self.ecu_port == self.actuator_port {
            return Err(ConfigError::Invalid(format!(
                "ecu_port and actuator_port are both {}",
                self.ecu_port
            )));
        }
        Ok(())
    }

    pub fn ecu_settings(&self) -> PortSettings {
        PortSettings::new(self.ecu_port.as_str())
            .baud(self.baud)
            .timeout(Duration::from_millis(self.read_timeout_ms))
    }

    pub fn actuator_settings(&self) -> PortSettings {
        PortSettings::new(self.actuator_port.as_str())
            .baud(self.baud)
            .timeout(Duration::from_millis(self.read_timeout_ms))
    }

    pub fn reader_config(&self) -> ReaderConfig {
        ReaderConfig {
            idle_backoff: Duration::from_millis(self.idle_backoff_ms),
            fault_backoff: Duration::from_millis(self.fault_backoff_ms),
            ..ReaderConfig::default()
        }
    }

    pub fn blink_interval(&self) -> Duration {
        Duration::from_millis(self.blink_interval_ms)
    }

    pub fn hold_release_timeout(&self) -> Duration {
        Duration::from_millis(self.hold_release_timeout_ms)
    }
}
