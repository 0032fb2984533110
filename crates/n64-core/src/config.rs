//! Configuration system for n64-emu

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub video: VideoConfig,
    pub logging: LoggingConfig,
    pub paths: PathConfig,
}

/// General front-end settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Period of the controller's event polling tick
    pub poll_interval_ms: u64,
    pub confirm_exit: bool,
}

/// Video output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VideoConfig {
    pub backend: VideoBackendKind,
    pub title: String,
    pub vsync: bool,
    /// Frames per second the headless backend paces to, 0 to run unpaced
    pub frame_limit: u32,
}

/// Video backend selection
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum VideoBackendKind {
    /// No window, frames are counted and discarded
    Headless,
    /// SDL3 window and accelerated renderer
    Sdl,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevelFilter,
    pub log_to_file: bool,
    pub log_path: PathBuf,
}

/// Console logging verbosity
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
pub enum LogLevelFilter {
    Off,
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevelFilter {
    /// Directive understood by `tracing_subscriber::EnvFilter`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevelFilter::Off => "off",
            LogLevelFilter::Error => "error",
            LogLevelFilter::Warn => "warn",
            LogLevelFilter::Info => "info",
            LogLevelFilter::Debug => "debug",
            LogLevelFilter::Trace => "trace",
        }
    }
}

/// Path configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Directory the ROM file dialog opens in
    pub rom_dir: PathBuf,
    /// Most recently loaded ROM
    pub last_rom: Option<PathBuf>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            confirm_exit: false,
        }
    }
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            backend: VideoBackendKind::default(),
            title: "N64 Emulator".to_string(),
            vsync: true,
            frame_limit: 60,
        }
    }
}

impl Default for VideoBackendKind {
    #[cfg(feature = "sdl")]
    fn default() -> Self {
        VideoBackendKind::Sdl
    }

    #[cfg(not(feature = "sdl"))]
    fn default() -> Self {
        VideoBackendKind::Headless
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevelFilter::default(),
            log_to_file: true,
            log_path: PathBuf::from("n64_emulator.log"),
        }
    }
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            rom_dir: dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")),
            last_rom: None,
        }
    }
}

impl Config {
    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path();

        if path.exists() {
            Self::load_from(&path)
        } else {
            let config = Self::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path())
    }

    /// Save configuration to an explicit path
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("n64-emu")
            .join("config.toml")
    }

    /// Poll interval as a duration
    pub fn poll_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.general.poll_interval_ms.max(1))
    }
}
