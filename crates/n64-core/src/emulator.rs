//! Emulation core
//!
//! Owns the ROM image, the video backend and the frame executor, and runs
//! the emulation loop on a dedicated thread:
//!
//! ```text
//! NotStarted -> Initializing -> InitFailed  -> Shutdown
//!                            -> LoopRunning -> Shutdown
//! ```
//!
//! Status is reported only through the event channel; the core never touches
//! UI state.

use crate::config::{Config, VideoConfig};
use crate::error::{ControlError, LoadError, LoopFault, VideoError};
use crate::event::EventSender;
use crate::executor::{FrameExecutor, NullExecutor};
use crate::rom::RomImage;
use crate::video::{self, PlatformEvent, VideoBackend, VideoHandle};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Name of the emulation thread
pub const EMULATION_THREAD_NAME: &str = "emu-core";

/// Cooperative cancellation flag shared by the controller and the run loop.
///
/// The loop re-reads it at the top of every iteration; a stop request takes
/// effect at the next frame boundary.
#[derive(Debug, Clone, Default)]
pub struct RunFlag(Arc<AtomicBool>);

impl RunFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow the loop to run
    pub fn arm(&self) {
        self.0.store(true, Ordering::Release);
    }

    /// Ask the loop to exit at its next check
    pub fn request_stop(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Phase of the core's most recent run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorePhase {
    NotStarted,
    Initializing,
    InitFailed,
    LoopRunning,
    Shutdown,
}

/// The emulation core
pub struct EmulationCore {
    rom: Option<RomImage>,
    events: EventSender,
    running: RunFlag,
    backend: Box<dyn VideoBackend>,
    executor: Box<dyn FrameExecutor>,
    video_config: VideoConfig,
    phase: CorePhase,
    /// Frames completed in the current or last run
    frames: u64,
}

impl EmulationCore {
    /// Create a core with the given backend and executor
    pub fn new(
        events: EventSender,
        backend: Box<dyn VideoBackend>,
        executor: Box<dyn FrameExecutor>,
    ) -> Self {
        Self {
            rom: None,
            events,
            running: RunFlag::new(),
            backend,
            executor,
            video_config: VideoConfig::default(),
            phase: CorePhase::NotStarted,
            frames: 0,
        }
    }

    /// Create a core from configuration, with the no-op executor
    pub fn from_config(config: &Config, events: EventSender) -> Self {
        let backend = video::create_backend(&config.video);
        Self::new(events, backend, Box::new(NullExecutor::new()))
            .with_video_config(config.video.clone())
    }

    pub fn with_video_config(mut self, video_config: VideoConfig) -> Self {
        self.video_config = video_config;
        self
    }

    /// Handle to the run flag, for stop requests from another thread
    pub fn run_flag(&self) -> RunFlag {
        self.running.clone()
    }

    pub fn rom(&self) -> Option<&RomImage> {
        self.rom.as_ref()
    }

    pub fn has_rom(&self) -> bool {
        self.rom.is_some()
    }

    pub fn phase(&self) -> CorePhase {
        self.phase
    }

    pub fn frame_count(&self) -> u64 {
        self.frames
    }

    /// Read a ROM file, replacing the current image only on success.
    ///
    /// Emits `Log("Loaded ROM: <name>")` or a single `Error` event.
    pub fn load_rom(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        match RomImage::load(path.as_ref()) {
            Ok(rom) => {
                tracing::debug!(
                    "ROM {}: {} bytes, format {}",
                    rom.file_name(),
                    rom.len(),
                    rom.format().name()
                );
                self.events.log(format!("Loaded ROM: {}", rom.file_name()));
                self.rom = Some(rom);
                Ok(())
            }
            Err(e) => {
                tracing::warn!("{}", e);
                self.events.error(e.to_string());
                Err(e)
            }
        }
    }

    /// Bring up the video subsystem and create the window/renderer pair.
    ///
    /// Called exactly once per run, on the emulation thread.
    pub fn init_video(&mut self, video: &mut VideoHandle) -> Result<(), VideoError> {
        debug_assert!(!video.is_open(), "init_video called twice without shutdown");

        tracing::info!("Initializing {} video backend", self.backend.name());
        let surface = self.backend.open(&self.video_config)?;
        video.attach(surface);
        Ok(())
    }

    /// Arm the run flag and run to completion on the calling thread
    pub fn run(&mut self) {
        self.running.arm();
        self.run_armed();
    }

    /// Arm the run flag here, then run on a new thread.
    ///
    /// Arming before the spawn means a stop request issued right after this
    /// returns cannot be overwritten by the thread starting late. The join
    /// handle hands the core back once the run is over.
    pub fn spawn(mut self) -> Result<JoinHandle<Self>, ControlError> {
        self.running.arm();
        let flag = self.running.clone();

        thread::Builder::new()
            .name(EMULATION_THREAD_NAME.to_string())
            .spawn(move || {
                self.run_armed();
                self
            })
            .map_err(|e| {
                flag.request_stop();
                ControlError::Spawn(e)
            })
    }

    fn run_armed(&mut self) {
        tracing::info!("Emulation thread started");
        self.phase = CorePhase::Initializing;
        self.frames = 0;

        // The window/renderer pair is bound to this thread, so it lives on
        // this stack frame rather than in the (Send) core.
        let mut video = VideoHandle::default();

        // A panic anywhere in the run, bring-up included, must still hand
        // the core back to the joining thread.
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.run_body(&mut video)));
        if let Err(payload) = outcome {
            if self.phase == CorePhase::Initializing {
                self.phase = CorePhase::InitFailed;
            }
            self.report_panic(payload.as_ref());
        }

        let released = panic::catch_unwind(AssertUnwindSafe(|| self.shutdown(&mut video)));
        if let Err(payload) = released {
            self.running.request_stop();
            self.phase = CorePhase::Shutdown;
            self.report_panic(payload.as_ref());
        }
        tracing::info!("Emulation thread exiting after {} frames", self.frames);
    }

    fn run_body(&mut self, video: &mut VideoHandle) {
        match self.bring_up(video) {
            Err(message) => {
                self.phase = CorePhase::InitFailed;
                tracing::error!("{}", message);
                self.events.error(message);
            }
            Ok(()) => {
                self.phase = CorePhase::LoopRunning;
                if let Err(fault) = self.run_loop(video) {
                    tracing::error!("Emulation loop fault: {}", fault);
                    self.events.error(fault.to_string());
                }
            }
        }
    }

    fn report_panic(&self, payload: &(dyn Any + Send)) {
        let fault = LoopFault::Panicked(panic_message(payload));
        tracing::error!("{}", fault);
        self.events.error(fault.to_string());
    }

    fn bring_up(&mut self, video: &mut VideoHandle) -> Result<(), String> {
        if self.rom.is_none() {
            return Err("No ROM loaded".to_string());
        }
        self.init_video(video).map_err(|e| e.to_string())
    }

    fn run_loop(&mut self, video: &mut VideoHandle) -> Result<(), LoopFault> {
        if let Some(rom) = self.rom.as_ref() {
            self.executor.reset(rom)?;
        }

        while self.running.is_set() {
            self.poll_input(video)?;
            self.execute_frame()?;
            self.render_frame(video)?;
            self.frames += 1;
        }
        Ok(())
    }

    /// Drain pending platform events; a quit event clears the run flag
    pub fn poll_input(&mut self, video: &mut VideoHandle) -> Result<(), LoopFault> {
        let surface = video
            .surface_mut()
            .ok_or_else(|| LoopFault::Input("video surface is not open".to_string()))?;

        for event in surface.poll_events() {
            if event == PlatformEvent::Quit {
                tracing::info!("Quit requested from emulation window");
                self.running.request_stop();
            }
        }
        Ok(())
    }

    /// Run one frame of the executor
    pub fn execute_frame(&mut self) -> Result<(), LoopFault> {
        let rom = self
            .rom
            .as_ref()
            .ok_or_else(|| LoopFault::Execution("no ROM loaded".to_string()))?;
        self.executor.execute_frame(rom)
    }

    /// Clear and present the frame buffer
    pub fn render_frame(&mut self, video: &mut VideoHandle) -> Result<(), LoopFault> {
        let surface = video
            .surface_mut()
            .ok_or_else(|| VideoError::Present("video surface is not open".to_string()))?;
        surface.clear();
        surface.present()?;
        Ok(())
    }

    /// Release the renderer, window and subsystem if present and mark the
    /// run as over. Safe after a failed or partial init and safe to repeat.
    pub fn shutdown(&mut self, video: &mut VideoHandle) {
        if video.release() {
            tracing::info!("Video resources released");
        }
        self.running.request_stop();
        self.phase = CorePhase::Shutdown;
    }
}

impl std::fmt::Debug for EmulationCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmulationCore")
            .field("rom", &self.rom)
            .field("backend", &self.backend.name())
            .field("phase", &self.phase)
            .field("frames", &self.frames)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
