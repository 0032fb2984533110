//! Headless video backend for testing and window-less runs

use super::{PlatformEvent, VideoBackend, VideoSurface, SURFACE_HEIGHT, SURFACE_WIDTH};
use crate::config::VideoConfig;
use crate::error::VideoError;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Video backend that opens no window.
///
/// Presented frames are counted, and presentation is paced to the configured
/// frame limit so an idle run loop does not spin a core.
pub struct HeadlessBackend {
    frame_limit: u32,
    /// Frames presented across all surfaces opened by this backend
    frames: Arc<AtomicU64>,
    /// Emit a quit event after this many input polls (scripted runs)
    quit_after: Option<u64>,
}

impl HeadlessBackend {
    pub fn new(frame_limit: u32) -> Self {
        Self {
            frame_limit,
            frames: Arc::new(AtomicU64::new(0)),
            quit_after: None,
        }
    }

    /// Report a quit event once `polls` input polls have happened
    pub fn with_quit_after(mut self, polls: u64) -> Self {
        self.quit_after = Some(polls);
        self
    }

    /// Shared counter of presented frames
    pub fn frame_counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.frames)
    }
}

impl Default for HeadlessBackend {
    fn default() -> Self {
        Self::new(60)
    }
}

impl VideoBackend for HeadlessBackend {
    fn name(&self) -> &'static str {
        "headless"
    }

    fn open(&mut self, config: &VideoConfig) -> Result<Box<dyn VideoSurface>, VideoError> {
        tracing::debug!(
            "Headless surface \"{}\" {}x{} ({} fps limit)",
            config.title,
            SURFACE_WIDTH,
            SURFACE_HEIGHT,
            self.frame_limit
        );

        let frame_time = (self.frame_limit > 0)
            .then(|| Duration::from_secs_f64(1.0 / f64::from(self.frame_limit)));

        Ok(Box::new(HeadlessSurface {
            frame_time,
            next_deadline: Instant::now(),
            frames: Arc::clone(&self.frames),
            polls: 0,
            quit_after: self.quit_after,
            open: true,
        }))
    }
}

struct HeadlessSurface {
    frame_time: Option<Duration>,
    next_deadline: Instant,
    frames: Arc<AtomicU64>,
    polls: u64,
    quit_after: Option<u64>,
    open: bool,
}

impl VideoSurface for HeadlessSurface {
    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        self.polls += 1;
        match self.quit_after {
            Some(limit) if self.polls >= limit => vec![PlatformEvent::Quit],
            _ => Vec::new(),
        }
    }

    fn clear(&mut self) {}

    fn present(&mut self) -> Result<(), VideoError> {
        if !self.open {
            return Err(VideoError::Present("surface already shut down".to_string()));
        }

        self.frames.fetch_add(1, Ordering::Relaxed);

        if let Some(frame_time) = self.frame_time {
            let now = Instant::now();
            if self.next_deadline > now {
                std::thread::sleep(self.next_deadline - now);
                self.next_deadline += frame_time;
            } else {
                // Behind schedule: restart pacing from now instead of bursting
                self.next_deadline = now + frame_time;
            }
        }
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.open {
            tracing::debug!("Headless surface closed after {} polls", self.polls);
            self.open = false;
        }
    }
}
