//! Lifecycle controller
//!
//! Runs on the UI thread. Owns the emulation core while it is idle, hands it
//! to a background thread on start and takes it back when that thread is
//! joined. Everything the core reports reaches the log sink through
//! [`LifecycleController::poll_tick`].

use crate::config::Config;
use crate::emulator::{EmulationCore, RunFlag};
use crate::error::ControlError;
use crate::event::{create_event_channel, Event, EventReceiver};
use crate::logging::LogSink;
use std::path::Path;
use std::thread::JoinHandle;

/// Lifecycle of the loaded game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No ROM
    Idle,
    /// ROM present, never started
    Loaded,
    /// Background loop active
    Running,
    /// Loop exited (stop request, quit or failure); ROM still present
    Stopped,
}

/// Which user actions are currently allowed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Affordances {
    pub load: bool,
    pub start: bool,
    pub stop: bool,
}

impl LifecycleState {
    pub fn affordances(&self) -> Affordances {
        match self {
            LifecycleState::Idle => Affordances {
                load: true,
                start: false,
                stop: false,
            },
            LifecycleState::Loaded | LifecycleState::Stopped => Affordances {
                load: true,
                start: true,
                stop: false,
            },
            LifecycleState::Running => Affordances {
                load: false,
                start: false,
                stop: true,
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LifecycleState::Idle => "Idle",
            LifecycleState::Loaded => "Loaded",
            LifecycleState::Running => "Running",
            LifecycleState::Stopped => "Stopped",
        }
    }
}

/// Mediates between the emulation core and the user-facing controls
pub struct LifecycleController {
    /// Present whenever no background thread owns the core
    core: Option<EmulationCore>,
    /// Background run, until joined
    worker: Option<JoinHandle<EmulationCore>>,
    run_flag: RunFlag,
    events: EventReceiver,
    sink: LogSink,
    state: LifecycleState,
}

impl LifecycleController {
    /// Create a controller around a core whose events feed `events`
    pub fn new(core: EmulationCore, events: EventReceiver, sink: LogSink) -> Self {
        let run_flag = core.run_flag();
        let state = if core.has_rom() {
            LifecycleState::Loaded
        } else {
            LifecycleState::Idle
        };
        Self {
            core: Some(core),
            worker: None,
            run_flag,
            events,
            sink,
            state,
        }
    }

    /// Create a controller with the configured video backend and the no-op
    /// frame executor
    pub fn from_config(config: &Config, sink: LogSink) -> Self {
        let (sender, receiver) = create_event_channel();
        let core = EmulationCore::from_config(config, sender);
        Self::new(core, receiver, sink)
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Allowed user actions. Nothing is allowed once the core has been lost
    /// with a thread that could not be joined.
    pub fn affordances(&self) -> Affordances {
        if self.core.is_none() && self.worker.is_none() {
            return Affordances {
                load: false,
                start: false,
                stop: false,
            };
        }
        self.state.affordances()
    }

    pub fn sink(&self) -> &LogSink {
        &self.sink
    }

    /// Whether a background loop is live and has not been asked to stop
    pub fn is_loop_active(&self) -> bool {
        self.state == LifecycleState::Running
    }

    /// File name of the loaded ROM, while the core is in hand
    pub fn rom_name(&self) -> Option<String> {
        self.core.as_ref().and_then(|c| c.rom()).map(|r| r.file_name())
    }

    /// Core held by the controller (none while a thread owns it)
    pub fn core(&self) -> Option<&EmulationCore> {
        self.core.as_ref()
    }

    /// Load a ROM into the core.
    ///
    /// Refused while a loop is active. On failure the previous ROM and the
    /// affordances are kept; the error has already been queued as an `Error`
    /// event when it is returned.
    pub fn load_rom(&mut self, path: impl AsRef<Path>) -> Result<(), ControlError> {
        self.reap_finished();
        if self.is_loop_active() {
            return Err(ControlError::Busy);
        }
        self.join_worker()?;

        let core = self.core.as_mut().ok_or(ControlError::WorkerPanicked)?;
        core.load_rom(path)?;
        self.state = LifecycleState::Loaded;
        Ok(())
    }

    /// Start the emulation loop on a background thread.
    ///
    /// Refused without a ROM or while a loop is already active. A previous
    /// run that was asked to stop is joined first; this join is the only
    /// point where the UI thread may wait on the emulation thread.
    pub fn start(&mut self) -> Result<(), ControlError> {
        self.reap_finished();
        if self.is_loop_active() {
            return Err(ControlError::AlreadyRunning);
        }
        self.join_worker()?;

        let has_rom = self.core.as_ref().is_some_and(EmulationCore::has_rom);
        if !has_rom {
            return Err(ControlError::NoRom);
        }

        let Some(core) = self.core.take() else {
            return Err(ControlError::NoRom);
        };
        match core.spawn() {
            Ok(handle) => {
                self.worker = Some(handle);
                self.state = LifecycleState::Running;
                self.drain_into_sink();
                self.sink.info("Emulation started");
                Ok(())
            }
            Err(e) => {
                // The core went down with the failed thread
                self.state = LifecycleState::Idle;
                self.drain_into_sink();
                self.sink.error(&e.to_string());
                Err(e)
            }
        }
    }

    /// Ask the loop to stop. Does not wait for the thread to exit.
    pub fn stop(&mut self) -> Result<(), ControlError> {
        if !self.is_loop_active() {
            return Err(ControlError::NotRunning);
        }
        self.run_flag.request_stop();
        self.state = LifecycleState::Stopped;
        self.drain_into_sink();
        self.sink.info("Emulation stopped");
        Ok(())
    }

    /// Timer tick: reap a background run that ended on its own (quit or
    /// failure), then drain every pending event into the log sink.
    ///
    /// Reaping first means everything a finished run reported is drained in
    /// the same tick that resets the affordances. Returns the drained events.
    /// Must only be called from the UI thread.
    pub fn poll_tick(&mut self) -> Vec<Event> {
        self.reap_finished();
        self.drain_into_sink()
    }

    /// Request stop and wait for the background thread. Used on exit.
    pub fn shutdown(&mut self) {
        self.run_flag.request_stop();
        if self.state == LifecycleState::Running {
            self.state = LifecycleState::Stopped;
        }
        if let Err(e) = self.join_worker() {
            tracing::error!("Emulation thread did not exit cleanly: {}", e);
        }
        self.drain_into_sink();
    }

    /// Record every pending event in arrival order, ahead of any line the
    /// controller is about to write itself
    fn drain_into_sink(&mut self) -> Vec<Event> {
        let events = self.events.drain_all();
        for event in &events {
            self.sink.record_event(event);
        }
        events
    }

    /// Join the worker if its thread has already exited
    fn reap_finished(&mut self) {
        let finished = self.worker.as_ref().is_some_and(JoinHandle::is_finished);
        if !finished {
            return;
        }
        let was_running = self.state == LifecycleState::Running;
        match self.join_worker() {
            Ok(()) => {
                if was_running {
                    self.state = LifecycleState::Stopped;
                    tracing::info!("Emulation loop exited");
                }
            }
            Err(e) => {
                self.drain_into_sink();
                self.sink.error(&e.to_string());
            }
        }
    }

    /// Join the worker, blocking until it exits, and take the core back
    fn join_worker(&mut self) -> Result<(), ControlError> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        match handle.join() {
            Ok(core) => {
                tracing::debug!("Joined emulation thread ({} frames)", core.frame_count());
                self.core = Some(core);
                Ok(())
            }
            Err(_) => {
                self.state = LifecycleState::Idle;
                Err(ControlError::WorkerPanicked)
            }
        }
    }
}

impl Drop for LifecycleController {
    fn drop(&mut self) {
        if self.worker.is_some() {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for LifecycleController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleController")
            .field("state", &self.state)
            .field("worker", &self.worker.is_some())
            .field("core", &self.core)
            .finish()
    }
}
