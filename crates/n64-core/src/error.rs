//! Error types for the n64-emu core

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the emulator core
#[derive(Error, Debug)]
pub enum EmulatorError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Video(#[from] VideoError),

    #[error("Emulation loop fault: {0}")]
    Loop(#[from] LoopFault),

    #[error("Control error: {0}")]
    Control(#[from] ControlError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Logging error: {0}")]
    Logging(#[from] LoggingError),
}

/// Failure reading a ROM image. The previously loaded ROM is left untouched.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("ROM loading failed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("ROM loading failed: {} is empty", path.display())]
    Empty { path: PathBuf },
}

/// Video subsystem and resource creation errors.
///
/// Every variant carries the backend's own diagnostic string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VideoError {
    #[error("Video initialization failed: {0}")]
    Init(String),

    #[error("Window creation failed: {0}")]
    Window(String),

    #[error("Present failed: {0}")]
    Present(String),
}

/// Failure raised inside the run loop body. Fatal to the current run.
#[derive(Error, Debug)]
pub enum LoopFault {
    #[error("input polling failed: {0}")]
    Input(String),

    #[error("frame execution failed: {0}")]
    Execution(String),

    #[error("frame rendering failed: {0}")]
    Render(#[from] VideoError),

    #[error("emulation thread panicked: {0}")]
    Panicked(String),
}

/// Refusals and failures of lifecycle controller operations
#[derive(Error, Debug)]
pub enum ControlError {
    #[error("No ROM loaded")]
    NoRom,

    #[error("Emulation is already running")]
    AlreadyRunning,

    #[error("Emulation is not running")]
    NotRunning,

    #[error("Stop emulation before loading another ROM")]
    Busy,

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("Failed to spawn emulation thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Emulation thread terminated abnormally")]
    WorkerPanicked,
}

/// Configuration file errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Logging setup errors
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Cannot open log file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("A global logger is already installed")]
    AlreadyInitialized,
}

/// Result type alias for emulator operations
pub type Result<T> = std::result::Result<T, EmulatorError>;
