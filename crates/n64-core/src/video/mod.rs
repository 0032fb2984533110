//! Video backends
//!
//! A [`VideoBackend`] lives inside the emulation core and travels with it to
//! the emulation thread. Each run opens one [`VideoSurface`] (the window and
//! renderer pair) on that thread, holds it in a [`VideoHandle`] and releases
//! it exactly once when the run ends.

pub mod headless;
#[cfg(feature = "sdl")]
pub mod sdl;

use crate::config::{VideoBackendKind, VideoConfig};
use crate::error::VideoError;

pub use headless::HeadlessBackend;
#[cfg(feature = "sdl")]
pub use sdl::SdlBackend;

/// Width of the presentation surface
pub const SURFACE_WIDTH: u32 = 640;
/// Height of the presentation surface
pub const SURFACE_HEIGHT: u32 = 480;

/// Platform event observed while polling input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformEvent {
    /// The user asked to close the emulation window
    Quit,
    /// Anything the core does not act on yet
    Other,
}

/// Factory for video surfaces
pub trait VideoBackend: Send {
    /// Backend name for diagnostics
    fn name(&self) -> &'static str;

    /// Initialize the subsystem and create the window/renderer pair.
    ///
    /// On failure, anything partially created has already been released.
    fn open(&mut self, config: &VideoConfig) -> Result<Box<dyn VideoSurface>, VideoError>;
}

/// An open window/renderer pair, bound to the thread that opened it
pub trait VideoSurface {
    /// Drain pending platform events without blocking
    fn poll_events(&mut self) -> Vec<PlatformEvent>;

    /// Clear the frame buffer
    fn clear(&mut self);

    /// Present the frame buffer
    fn present(&mut self) -> Result<(), VideoError>;

    /// Release renderer, window and subsystem. Must be idempotent.
    fn shutdown(&mut self);
}

/// Owner of the current surface. Either holds a complete window/renderer
/// pair or nothing.
#[derive(Default)]
pub struct VideoHandle {
    surface: Option<Box<dyn VideoSurface>>,
}

impl VideoHandle {
    /// Whether a surface is currently held
    pub fn is_open(&self) -> bool {
        self.surface.is_some()
    }

    /// Take ownership of a freshly opened surface
    pub fn attach(&mut self, surface: Box<dyn VideoSurface>) {
        self.release();
        self.surface = Some(surface);
    }

    pub fn surface_mut(&mut self) -> Option<&mut (dyn VideoSurface + 'static)> {
        self.surface.as_deref_mut()
    }

    /// Shut down and drop the surface if one is held.
    ///
    /// Returns whether anything was released; a second call is a no-op.
    pub fn release(&mut self) -> bool {
        match self.surface.take() {
            Some(mut surface) => {
                surface.shutdown();
                true
            }
            None => false,
        }
    }
}

impl Drop for VideoHandle {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for VideoHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VideoHandle")
            .field("open", &self.is_open())
            .finish()
    }
}

/// Build the backend selected in the configuration.
///
/// Falls back to the headless backend when SDL support is not compiled in.
pub fn create_backend(config: &VideoConfig) -> Box<dyn VideoBackend> {
    match config.backend {
        #[cfg(feature = "sdl")]
        VideoBackendKind::Sdl => {
            tracing::info!("Using SDL3 video backend");
            Box::new(SdlBackend::new())
        }
        #[cfg(not(feature = "sdl"))]
        VideoBackendKind::Sdl => {
            tracing::warn!("SDL3 support not compiled in, using headless video backend");
            Box::new(HeadlessBackend::new(config.frame_limit))
        }
        VideoBackendKind::Headless => {
            tracing::info!("Using headless video backend");
            Box::new(HeadlessBackend::new(config.frame_limit))
        }
    }
}
