//! n64-emu - N64 emulator shell
//!
//! Main entry point for the emulator application.

use n64_core::{logging, Config, LogSink};
use n64_ui::app;

fn load_config() -> n64_core::Result<Config> {
    Ok(Config::load()?)
}

fn init_logging(config: &Config) -> n64_core::Result<LogSink> {
    Ok(logging::init(&config.logging)?)
}

fn main() -> eframe::Result<()> {
    let (config, config_error) = match load_config() {
        Ok(config) => (config, None),
        Err(e) => (Config::default(), Some(e)),
    };

    // Initialize logging
    let sink = init_logging(&config).unwrap_or_else(|e| {
        eprintln!("n64-emu: {e}");
        LogSink::detached()
    });

    if let Some(e) = config_error {
        tracing::warn!("{}, using default configuration", e);
    }

    tracing::info!("Starting n64-emu");

    // Run the application
    app::run(config, sink)
}
