//! Core of the n64-emu shell
//!
//! This crate provides the emulation lifecycle (ROM loading, video bring-up,
//! run loop, shutdown), the event channel the emulation thread reports
//! through, the lifecycle controller that drives it from the UI thread, and
//! the configuration and logging infrastructure.

pub mod config;
pub mod controller;
pub mod emulator;
pub mod error;
pub mod event;
pub mod executor;
pub mod logging;
pub mod rom;
pub mod video;

pub use config::Config;
pub use controller::{Affordances, LifecycleController, LifecycleState};
pub use emulator::{CorePhase, EmulationCore, RunFlag};
pub use error::{
    ConfigError, ControlError, EmulatorError, LoadError, LoggingError, LoopFault, Result,
    VideoError,
};
pub use event::{create_event_channel, Event, EventReceiver, EventSender};
pub use executor::{FrameExecutor, NullExecutor};
pub use logging::{LogLevel, LogSink};
pub use rom::{RomFormat, RomImage, ROM_EXTENSIONS};
pub use video::{HeadlessBackend, PlatformEvent, VideoBackend, VideoHandle, VideoSurface};
