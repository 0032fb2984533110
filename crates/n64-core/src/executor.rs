//! Frame executor - the plug-in point for CPU and graphics emulation

use crate::error::LoopFault;
use crate::rom::RomImage;

/// Advances emulated hardware by one video frame.
///
/// Implementations must return within the wall-clock frame budget and must
/// not block on the event channel. Cancellation is checked by the run loop
/// between frames, so a frame is never interrupted half way.
pub trait FrameExecutor: Send {
    /// Called once per run, before the first frame
    fn reset(&mut self, _rom: &RomImage) -> Result<(), LoopFault> {
        Ok(())
    }

    /// Emulate one frame
    fn execute_frame(&mut self, rom: &RomImage) -> Result<(), LoopFault>;
}

/// Executor that emulates nothing
#[derive(Debug, Default)]
pub struct NullExecutor {
    frames: u64,
}

impl NullExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Frames executed since the last reset
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl FrameExecutor for NullExecutor {
    fn reset(&mut self, rom: &RomImage) -> Result<(), LoopFault> {
        tracing::debug!("NullExecutor: reset for {} ({} bytes)", rom.file_name(), rom.len());
        self.frames = 0;
        Ok(())
    }

    fn execute_frame(&mut self, _rom: &RomImage) -> Result<(), LoopFault> {
        self.frames += 1;
        Ok(())
    }
}
