//! Log viewer panel for the controller's log lines

use eframe::egui;
use n64_core::logging::{LogEntry, LogLevel, SharedLogBuffer};
use std::sync::Arc;

fn level_color(level: LogLevel) -> egui::Color32 {
    match level {
        LogLevel::Info => egui::Color32::WHITE,
        LogLevel::Error => egui::Color32::RED,
    }
}

/// Entries at or above `min_level` whose message contains `filter`
/// (case-insensitive), oldest first
pub fn filter_entries<'a>(
    entries: impl IntoIterator<Item = &'a LogEntry>,
    min_level: LogLevel,
    filter: &str,
) -> Vec<&'a LogEntry> {
    let filter_lower = filter.to_lowercase();
    entries
        .into_iter()
        .filter(|entry| entry.level >= min_level)
        .filter(|entry| {
            filter_lower.is_empty() || entry.message.to_lowercase().contains(&filter_lower)
        })
        .collect()
}

/// Log viewer panel state
pub struct LogViewer {
    /// Buffer filled by the controller's log sink
    log_buffer: SharedLogBuffer,
    min_level: LogLevel,
    filter_text: String,
    auto_scroll: bool,
    show_timestamps: bool,
}

impl LogViewer {
    /// Create a log viewer over the sink's buffer
    pub fn with_buffer(buffer: SharedLogBuffer) -> Self {
        Self {
            log_buffer: buffer,
            min_level: LogLevel::Info,
            filter_text: String::new(),
            auto_scroll: true,
            show_timestamps: false,
        }
    }

    pub fn buffer(&self) -> SharedLogBuffer {
        Arc::clone(&self.log_buffer)
    }

    /// Show the log viewer panel
    pub fn show(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label("Level:");
            egui::ComboBox::from_id_salt("log_level")
                .selected_text(self.min_level.label())
                .show_ui(ui, |ui| {
                    ui.selectable_value(&mut self.min_level, LogLevel::Info, "INFO");
                    ui.selectable_value(&mut self.min_level, LogLevel::Error, "ERROR");
                });

            ui.separator();

            ui.label("Filter:");
            ui.add(
                egui::TextEdit::singleline(&mut self.filter_text)
                    .desired_width(150.0)
                    .hint_text("Search logs..."),
            );

            ui.separator();

            ui.checkbox(&mut self.auto_scroll, "Auto-scroll");
            ui.checkbox(&mut self.show_timestamps, "Timestamps");

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let count = self.log_buffer.read().len();
                ui.label(format!("{} entries", count));
            });
        });

        ui.separator();

        let logs = self.log_buffer.read();
        let filtered_logs = filter_entries(logs.iter(), self.min_level, &self.filter_text);

        let text_style = egui::TextStyle::Monospace;
        let row_height = ui.text_style_height(&text_style);

        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .stick_to_bottom(self.auto_scroll)
            .show_rows(ui, row_height, filtered_logs.len(), |ui, row_range| {
                for row in row_range {
                    let Some(entry) = filtered_logs.get(row) else {
                        continue;
                    };
                    ui.horizontal(|ui| {
                        let level_text =
                            egui::RichText::new(format!("[{}]", entry.level.label()))
                                .color(level_color(entry.level))
                                .monospace();
                        ui.label(level_text);

                        if self.show_timestamps {
                            let age = entry.timestamp.elapsed().as_secs_f64();
                            let age = format!("{:.3}s ago", age);
                            ui.label(egui::RichText::new(age).monospace().weak());
                        }

                        ui.label(egui::RichText::new(&entry.message).monospace());
                    });
                }
            });
    }
}
