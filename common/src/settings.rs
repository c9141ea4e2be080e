//! Persisted per-device settings: the last address, the device kind and the
//! auto-connect flag.
//!
//! Stored as a small TOML document:
//!
//! ```toml
//! address = "192.168.4.1"
//! device_kind = "XIAO"
//! auto_connect = true
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Which board firmware the device runs. Decides the light endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DeviceKind {
    /// Camera board with a flash LED (`/flash/on|off`).
    #[default]
    Cam,
    /// Board with a plain user LED (`/led/on|off`).
    Xiao,
}

impl DeviceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceKind::Cam => "CAM",
            DeviceKind::Xiao => "XIAO",
        }
    }

    /// Name of the light the device exposes, used in result messages.
    pub fn light_name(&self) -> &'static str {
        match self {
            DeviceKind::Cam => "Flash",
            DeviceKind::Xiao => "LED",
        }
    }

    /// Path of the light switch endpoint, without the `on`/`off` suffix.
    pub fn light_path(&self) -> &'static str {
        match self {
            DeviceKind::Cam => "/flash/",
            DeviceKind::Xiao => "/led/",
        }
    }
}

// Unknown stored values fall back to the camera board.
impl From<String> for DeviceKind {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "XIAO" => DeviceKind::Xiao,
            _ => DeviceKind::Cam,
        }
    }
}

impl From<DeviceKind> for String {
    fn from(kind: DeviceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for DeviceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// `host[:port]` of the device, without scheme.
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub device_kind: DeviceKind,
    #[serde(default)]
    pub auto_connect: bool,
}

/// Key-value store the session reads once at start and writes on every change.
pub trait SettingsStore: Send + Sync {
    fn load(&self) -> Result<DeviceConfig, SettingsError>;

    fn save(&self, config: &DeviceConfig) -> Result<(), SettingsError>;
}

/// Settings kept in a TOML file. A missing file reads as defaults.
pub struct TomlSettingsStore {
    path: PathBuf,
}

impl TomlSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for TomlSettingsStore {
    fn load(&self) -> Result<DeviceConfig, SettingsError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no saved settings, using defaults");
                return Ok(DeviceConfig::default());
            }
            Err(e) => return Err(SettingsError::Read(self.path.display().to_string(), e)),
        };
        toml::from_str(&content).map_err(|e| SettingsError::Parse(e.to_string()))
    }

    fn save(&self, config: &DeviceConfig) -> Result<(), SettingsError> {
        let content =
            toml::to_string_pretty(config).map_err(|e| SettingsError::Serialize(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| SettingsError::Write(parent.display().to_string(), e))?;
        }
        std::fs::write(&self.path, content)
            .map_err(|e| SettingsError::Write(self.path.display().to_string(), e))?;
        debug!(path = %self.path.display(), "settings saved");
        Ok(())
    }
}

/// Settings held in memory only, for hosts without persistence.
#[derive(Default)]
pub struct MemorySettingsStore {
    inner: Mutex<DeviceConfig>,
}

impl MemorySettingsStore {
    pub fn new(config: DeviceConfig) -> Self {
        Self {
            inner: Mutex::new(config),
        }
    }

    pub fn current(&self) -> DeviceConfig {
        self.inner.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<DeviceConfig, SettingsError> {
        self.inner
            .lock()
            .map(|c| c.clone())
            .map_err(|_| SettingsError::Poisoned)
    }

    fn save(&self, config: &DeviceConfig) -> Result<(), SettingsError> {
        let mut guard = self.inner.lock().map_err(|_| SettingsError::Poisoned)?;
        *guard = config.clone();
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read settings file {0}: {1}")]
    Read(String, std::io::Error),
    #[error("failed to write settings file {0}: {1}")]
    Write(String, std::io::Error),
    #[error("failed to parse settings: {0}")]
    Parse(String),
    #[error("failed to serialize settings: {0}")]
    Serialize(String),
    #[error("settings lock poisoned")]
    Poisoned,
}
