use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub stream: StreamConfig,
    #[serde(default)]
    pub control: ControlConfig,
    #[serde(default)]
    pub settings: SettingsConfig,
    #[serde(default)]
    pub viewer: ViewerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Long-lived MJPEG stream connection.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamConfig {
    #[serde(default = "default_stream_connect_timeout")]
    pub connect_timeout_ms: u64,
    /// Longest gap between two chunks before the stream counts as dead.
    #[serde(default = "default_stream_read_timeout")]
    pub read_timeout_ms: u64,
    /// Upper bound on bytes buffered for one frame. 0 disables the bound.
    #[serde(default = "default_max_frame_bytes")]
    pub max_frame_bytes: usize,
}

/// Short-lived control requests (light, restart).
#[derive(Debug, Clone, Deserialize)]
pub struct ControlConfig {
    #[serde(default = "default_control_connect_timeout")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_control_read_timeout")]
    pub read_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettingsConfig {
    #[serde(default = "default_settings_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ViewerConfig {
    #[serde(default)]
    pub snapshot_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_stream_connect_timeout(),
            read_timeout_ms: default_stream_read_timeout(),
            max_frame_bytes: default_max_frame_bytes(),
        }
    }
}

impl StreamConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn frame_limit(&self) -> Option<usize> {
        (self.max_frame_bytes > 0).then_some(self.max_frame_bytes)
    }
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_control_connect_timeout(),
            read_timeout_ms: default_control_read_timeout(),
        }
    }
}

impl ControlConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Longest wait for the device to answer once connected.
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            path: default_settings_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFile(path.display().to_string(), e))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    ReadFile(String, std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(String),
}

// Default value functions
fn default_stream_connect_timeout() -> u64 {
    5000
}
fn default_stream_read_timeout() -> u64 {
    5000
}
fn default_max_frame_bytes() -> usize {
    2 * 1024 * 1024
}
fn default_control_connect_timeout() -> u64 {
    2000
}
fn default_control_read_timeout() -> u64 {
    2000
}
fn default_settings_path() -> PathBuf {
    PathBuf::from("cam-viewer-settings.toml")
}
fn default_log_level() -> String {
    "info".into()
}
