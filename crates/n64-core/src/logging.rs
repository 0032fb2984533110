//! Logging context and the controller's log sink
//!
//! [`init`] installs the process-wide `tracing` subscriber once at startup and
//! returns the [`LogSink`] handle that is passed to the lifecycle controller.
//! Records written through the sink land in the in-UI log buffer and, when
//! file logging is enabled, in the log file as
//! `<timestamp> - <LEVEL> - <message>`.

use crate::config::LoggingConfig;
use crate::error::LoggingError;
use crate::event::Event;
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::sync::Arc;
use std::time::Instant;
use tracing::{Level, Subscriber};
use tracing_subscriber::filter::{EnvFilter, Targets};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{self, FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{Layer, Registry};

/// Target of the records persisted to the log file
pub const EVENT_TARGET: &str = "n64::events";

/// Maximum number of entries kept in the in-UI log buffer
const MAX_LOG_ENTRIES: usize = 10000;

/// Level of a controller log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Info,
    Error,
}

impl LogLevel {
    pub fn label(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
        }
    }
}

/// A single log entry
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    pub timestamp: Instant,
}

impl LogEntry {
    /// Line as shown in the log view, e.g. `[INFO] Loaded ROM: test.z64`
    pub fn line(&self) -> String {
        format!("[{}] {}", self.level.label(), self.message)
    }
}

/// Shared log buffer read by the UI
pub type SharedLogBuffer = Arc<RwLock<VecDeque<LogEntry>>>;

/// Create a new shared log buffer
pub fn create_log_buffer() -> SharedLogBuffer {
    Arc::new(RwLock::new(VecDeque::with_capacity(256)))
}

/// Add a log entry to the buffer, dropping the oldest past the limit
pub fn add_log_entry(buffer: &SharedLogBuffer, level: LogLevel, message: &str) {
    let mut logs = buffer.write();
    if logs.len() >= MAX_LOG_ENTRIES {
        logs.pop_front();
    }
    logs.push_back(LogEntry {
        level,
        message: message.to_string(),
        timestamp: Instant::now(),
    });
}

/// Handle through which the controller records user-visible log lines
#[derive(Debug, Clone)]
pub struct LogSink {
    buffer: SharedLogBuffer,
}

impl LogSink {
    /// Sink that does not depend on [`init`] having run
    pub fn detached() -> Self {
        Self {
            buffer: create_log_buffer(),
        }
    }

    /// Buffer mirrored by the log view
    pub fn buffer(&self) -> SharedLogBuffer {
        Arc::clone(&self.buffer)
    }

    /// Append to the log view and emit the persisted record
    pub fn record(&self, level: LogLevel, message: &str) {
        add_log_entry(&self.buffer, level, message);
        match level {
            LogLevel::Info => tracing::info!(target: EVENT_TARGET, "{}", message),
            LogLevel::Error => tracing::error!(target: EVENT_TARGET, "{}", message),
        }
    }

    pub fn info(&self, message: &str) {
        self.record(LogLevel::Info, message);
    }

    pub fn error(&self, message: &str) {
        self.record(LogLevel::Error, message);
    }

    /// Record an event drained from the emulation core
    pub fn record_event(&self, event: &Event) {
        match event {
            Event::Log(text) => self.info(text),
            Event::Error(text) => self.error(text),
        }
    }

    /// Copy of the current view lines, oldest first
    pub fn lines(&self) -> Vec<String> {
        self.buffer.read().iter().map(LogEntry::line).collect()
    }
}

/// `<timestamp> - <LEVEL> - <message>` line format of the log file
#[derive(Debug, Clone, Copy, Default)]
pub struct SinkFormat;

impl<S, N> FormatEvent<S, N> for SinkFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        SystemTime.format_time(&mut writer)?;
        write!(writer, " - {} - ", event.metadata().level())?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Layer persisting sink records (and nothing else) to `make_writer`
pub fn event_sink_layer<S, W>(make_writer: W) -> Box<dyn Layer<S> + Send + Sync + 'static>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    fmt::layer()
        .event_format(SinkFormat)
        .with_ansi(false)
        .with_writer(make_writer)
        .with_filter(Targets::new().with_target(EVENT_TARGET, Level::INFO))
        .boxed()
}

/// Install the global subscriber. Call once at process start.
///
/// The console honors `RUST_LOG` and otherwise the configured level.
pub fn init(config: &LoggingConfig) -> Result<LogSink, LoggingError> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_directive()));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> =
        vec![fmt::layer().with_filter(console_filter).boxed()];

    if config.log_to_file {
        if let Some(parent) = config.log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| LoggingError::Io {
                path: config.log_path.clone(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_path)
            .map_err(|source| LoggingError::Io {
                path: config.log_path.clone(),
                source,
            })?;
        layers.push(event_sink_layer(std::sync::Mutex::new(file)));
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    if config.log_to_file {
        tracing::info!("Logging to {}", config.log_path.display());
    }
    Ok(LogSink::detached())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[derive(Clone, Default)]
    struct Capture(Arc<parking_lot::Mutex<Vec<u8>>>);

    impl io::Write for Capture {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Capture {
        fn text(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    #[test]
    fn test_sink_mirrors_to_buffer_in_order() {
        let sink = LogSink::detached();
        sink.info("Loaded ROM: test.z64");
        sink.record_event(&Event::Error("boom".to_string()));

        assert_eq!(
            sink.lines(),
            vec!["[INFO] Loaded ROM: test.z64".to_string(), "[ERROR] boom".to_string()]
        );
    }

    #[test]
    fn test_buffer_is_bounded() {
        let buffer = create_log_buffer();
        for i in 0..MAX_LOG_ENTRIES + 5 {
            add_log_entry(&buffer, LogLevel::Info, &i.to_string());
        }
        let logs = buffer.read();
        assert_eq!(logs.len(), MAX_LOG_ENTRIES);
        assert_eq!(logs.front().unwrap().message, "5");
    }

    #[test]
    fn test_file_line_format() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber =
            tracing_subscriber::registry().with(event_sink_layer(move || writer.clone()));

        let sink = LogSink::detached();
        tracing::subscriber::with_default(subscriber, || {
            sink.info("Loaded ROM: test.z64");
            sink.error("ROM loading failed: denied");
        });

        let text = capture.text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(" - INFO - Loaded ROM: test.z64"), "{}", lines[0]);
        assert!(lines[1].ends_with(" - ERROR - ROM loading failed: denied"), "{}", lines[1]);
        // RFC 3339 timestamp in front
        assert!(lines[0].chars().next().unwrap().is_ascii_digit());
    }

    #[test]
    fn test_file_layer_ignores_other_targets() {
        let capture = Capture::default();
        let writer = capture.clone();
        let subscriber =
            tracing_subscriber::registry().with(event_sink_layer(move || writer.clone()));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("internal diagnostic");
            tracing::warn!(target: "n64_core::emulator", "also internal");
        });

        assert!(capture.text().is_empty());
    }
}
