//! SDL3 windowed video backend

use super::{PlatformEvent, VideoBackend, VideoSurface, SURFACE_HEIGHT, SURFACE_WIDTH};
use crate::config::VideoConfig;
use crate::error::VideoError;
use sdl3::event::Event;
use sdl3::pixels::Color;
use sdl3::render::Canvas;
use sdl3::video::Window;
use sdl3::{EventPump, Sdl, VideoSubsystem};

/// Opens a centered window with an accelerated renderer on the calling thread
#[derive(Debug, Default)]
pub struct SdlBackend;

impl SdlBackend {
    pub fn new() -> Self {
        Self
    }
}

impl VideoBackend for SdlBackend {
    fn name(&self) -> &'static str {
        "sdl3"
    }

    fn open(&mut self, config: &VideoConfig) -> Result<Box<dyn VideoSurface>, VideoError> {
        let mut surface = SdlSurface::default();
        if let Err(e) = surface.init(config) {
            surface.shutdown();
            return Err(e);
        }
        Ok(Box::new(surface))
    }
}

/// Every handle is optional so a half-built surface can be torn down
#[derive(Default)]
struct SdlSurface {
    sdl: Option<Sdl>,
    video: Option<VideoSubsystem>,
    event_pump: Option<EventPump>,
    canvas: Option<Canvas<Window>>,
}

impl SdlSurface {
    fn init(&mut self, config: &VideoConfig) -> Result<(), VideoError> {
        let sdl = sdl3::init().map_err(|e| VideoError::Init(e.to_string()))?;
        let video = sdl.video().map_err(|e| VideoError::Init(e.to_string()))?;
        let event_pump = sdl.event_pump().map_err(|e| VideoError::Init(e.to_string()))?;
        self.sdl = Some(sdl);
        self.event_pump = Some(event_pump);

        if config.vsync && !sdl3::hint::set("SDL_RENDER_VSYNC", "1") {
            tracing::warn!("SDL: vsync hint rejected, presenting unpaced");
        }

        let window = video
            .window(&config.title, SURFACE_WIDTH, SURFACE_HEIGHT)
            .position_centered()
            .build()
            .map_err(|e| VideoError::Window(e.to_string()))?;
        self.video = Some(video);

        let mut canvas = window.into_canvas();
        canvas.set_draw_color(Color::RGB(0, 0, 0));
        self.canvas = Some(canvas);

        tracing::info!("SDL: opened {}x{} window", SURFACE_WIDTH, SURFACE_HEIGHT);
        Ok(())
    }
}

impl VideoSurface for SdlSurface {
    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        let Some(pump) = self.event_pump.as_mut() else {
            return Vec::new();
        };
        pump.poll_iter()
            .map(|event| match event {
                Event::Quit { .. } => PlatformEvent::Quit,
                _ => PlatformEvent::Other,
            })
            .collect()
    }

    fn clear(&mut self) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.clear();
        }
    }

    fn present(&mut self) -> Result<(), VideoError> {
        match self.canvas.as_mut() {
            Some(canvas) => {
                canvas.present();
                Ok(())
            }
            None => Err(VideoError::Present("renderer not available".to_string())),
        }
    }

    fn shutdown(&mut self) {
        // Renderer and window go together with the canvas
        if self.canvas.take().is_some() {
            tracing::debug!("SDL: destroyed renderer and window");
        }
        self.event_pump = None;
        if self.video.take().is_some() {
            tracing::debug!("SDL: video subsystem released");
        }
        if self.sdl.take().is_some() {
            tracing::info!("SDL: shut down");
        }
    }
}
