//! Test doubles shared by the integration tests

#![allow(dead_code)]

use n64_core::config::VideoConfig;
use n64_core::{
    FrameExecutor, LifecycleController, LoopFault, PlatformEvent, RomImage, VideoBackend,
    VideoError, VideoSurface,
};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Counters observed by the tests while the core lives on another thread
#[derive(Debug, Clone, Default)]
pub struct Counters {
    pub opens: Arc<AtomicUsize>,
    pub releases: Arc<AtomicUsize>,
    pub frames: Arc<AtomicU64>,
}

impl Counters {
    pub fn opens(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }
}

/// Backend that records opens and releases, optionally failing to open
pub struct RecordingBackend {
    counters: Counters,
    fail_with: Option<VideoError>,
    panic_on_open: bool,
    quit_after: Option<u64>,
}

impl RecordingBackend {
    pub fn new(counters: &Counters) -> Self {
        Self {
            counters: counters.clone(),
            fail_with: None,
            panic_on_open: false,
            quit_after: None,
        }
    }

    /// Backend whose driver panics while opening the window
    pub fn panicking(counters: &Counters) -> Self {
        Self {
            panic_on_open: true,
            ..Self::new(counters)
        }
    }

    pub fn failing(counters: &Counters, error: VideoError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new(counters)
        }
    }

    pub fn quitting_after(counters: &Counters, polls: u64) -> Self {
        Self {
            quit_after: Some(polls),
            ..Self::new(counters)
        }
    }
}

impl VideoBackend for RecordingBackend {
    fn name(&self) -> &'static str {
        "counters"
    }

    fn open(&mut self, _config: &VideoConfig) -> Result<Box<dyn VideoSurface>, VideoError> {
        if self.panic_on_open {
            panic!("video driver exploded");
        }
        if let Some(error) = self.fail_with.clone() {
            return Err(error);
        }
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(RecordingSurface {
            releases: Arc::clone(&self.counters.releases),
            polls: 0,
            quit_after: self.quit_after,
            open: true,
        }))
    }
}

struct RecordingSurface {
    releases: Arc<AtomicUsize>,
    polls: u64,
    quit_after: Option<u64>,
    open: bool,
}

impl VideoSurface for RecordingSurface {
    fn poll_events(&mut self) -> Vec<PlatformEvent> {
        self.polls += 1;
        match self.quit_after {
            Some(limit) if self.polls >= limit => vec![PlatformEvent::Quit],
            _ => vec![PlatformEvent::Other],
        }
    }

    fn clear(&mut self) {}

    fn present(&mut self) -> Result<(), VideoError> {
        assert!(self.open, "present after shutdown");
        std::thread::sleep(Duration::from_millis(1));
        Ok(())
    }

    fn shutdown(&mut self) {
        if self.open {
            self.open = false;
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// How a counting executor misbehaves, if at all
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Failure {
    None,
    ErrorAt(u64),
    PanicAt(u64),
}

/// Executor that counts frames
pub struct CountingExecutor {
    frames: Arc<AtomicU64>,
    failure: Failure,
}

impl CountingExecutor {
    pub fn new(counters: &Counters) -> Self {
        Self::with_failure(counters, Failure::None)
    }

    pub fn with_failure(counters: &Counters, failure: Failure) -> Self {
        Self {
            frames: Arc::clone(&counters.frames),
            failure,
        }
    }
}

impl FrameExecutor for CountingExecutor {
    fn execute_frame(&mut self, _rom: &RomImage) -> Result<(), LoopFault> {
        let frame = self.frames.fetch_add(1, Ordering::SeqCst) + 1;
        match self.failure {
            Failure::ErrorAt(n) if frame == n => {
                Err(LoopFault::Execution(format!("illegal opcode in frame {frame}")))
            }
            Failure::PanicAt(n) if frame == n => panic!("executor exploded in frame {frame}"),
            _ => Ok(()),
        }
    }
}

/// Deterministic pseudo-random bytes (xorshift32)
pub fn random_bytes(len: usize, seed: u32) -> Vec<u8> {
    let mut state = seed.max(1);
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            state as u8
        })
        .collect()
}

/// Write `bytes` to `name` inside `dir`
pub fn write_rom(dir: &tempfile::TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Call `poll_tick` until `done` holds or the timeout expires
pub fn tick_until(
    controller: &mut LifecycleController,
    timeout: Duration,
    mut done: impl FnMut(&LifecycleController) -> bool,
) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        controller.poll_tick();
        if done(controller) {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    false
}
