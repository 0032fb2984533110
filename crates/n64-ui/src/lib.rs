//! User interface for n64-emu

pub mod app;
pub mod log_viewer;

pub use app::EmulatorApp;
pub use log_viewer::LogViewer;
