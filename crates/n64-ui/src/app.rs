//! Main application window

use eframe::egui;
use n64_core::video::{SURFACE_HEIGHT, SURFACE_WIDTH};
use n64_core::{
    Config, ControlError, LifecycleController, LifecycleState, LogSink, RomImage, ROM_EXTENSIONS,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::log_viewer::LogViewer;

/// Main application state
pub struct EmulatorApp {
    /// Configuration, saved on exit
    config: Config,
    config_path: PathBuf,
    controller: LifecycleController,
    log_viewer: LogViewer,
    /// Period of the controller's polling tick
    poll_interval: Duration,
    last_poll: Instant,
    /// Status bar description of the loaded ROM
    rom_summary: Option<String>,
    show_exit_dialog: bool,
    /// Set once the user confirmed exiting while running
    allow_close: bool,
}

impl EmulatorApp {
    /// Create the application around a fresh controller
    pub fn new(cc: &eframe::CreationContext<'_>, config: Config, sink: LogSink) -> Self {
        cc.egui_ctx.set_visuals(egui::Visuals::dark());
        Self::with_config_path(config, sink, Config::config_path())
    }

    /// Create the application state, saving the configuration to
    /// `config_path` on exit
    pub fn with_config_path(config: Config, sink: LogSink, config_path: PathBuf) -> Self {
        let log_viewer = LogViewer::with_buffer(sink.buffer());
        let controller = LifecycleController::from_config(&config, sink);
        let poll_interval = config.poll_interval();

        Self {
            config,
            config_path,
            controller,
            log_viewer,
            poll_interval,
            last_poll: Instant::now(),
            rom_summary: None,
            show_exit_dialog: false,
            allow_close: false,
        }
    }

    /// Ask for a ROM file and load it
    fn load_rom_dialog(&mut self) {
        let paths = &self.config.paths;
        let Some(path) = Self::open_rom_dialog(&paths.rom_dir, paths.last_rom.as_deref()) else {
            return;
        };
        self.load_rom(path);
    }

    fn load_rom(&mut self, path: PathBuf) {
        match self.controller.load_rom(&path) {
            Ok(()) => {
                self.rom_summary = self
                    .controller
                    .core()
                    .and_then(|core| core.rom())
                    .map(rom_summary);
                if let Some(dir) = path.parent() {
                    self.config.paths.rom_dir = dir.to_path_buf();
                }
                self.config.paths.last_rom = Some(path);
            }
            // Already queued as an Error event for the log view
            Err(ControlError::Load(_)) => {}
            Err(e) => tracing::warn!("Load ROM refused: {}", e),
        }
    }

    /// Stop and join the emulation thread, then persist the configuration
    fn shutdown(&mut self) {
        self.controller.shutdown();
        if let Err(e) = self.config.save_to(&self.config_path) {
            tracing::warn!("Failed to save configuration: {}", e);
        }
    }

    fn start_emulation(&mut self) {
        if let Err(e) = self.controller.start() {
            tracing::warn!("Start refused: {}", e);
        }
    }

    fn stop_emulation(&mut self) {
        if let Err(e) = self.controller.stop() {
            tracing::warn!("Stop refused: {}", e);
        }
    }

    /// Drain the event channel once per poll interval
    fn poll_controller(&mut self) {
        if self.last_poll.elapsed() >= self.poll_interval {
            self.controller.poll_tick();
            self.last_poll = Instant::now();
        }
    }

    fn handle_close_request(&mut self, ctx: &egui::Context) {
        let close_requested = ctx.input(|i| i.viewport().close_requested());
        if close_requested
            && !self.allow_close
            && self.config.general.confirm_exit
            && self.controller.is_loop_active()
        {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            self.show_exit_dialog = true;
        }
    }

    fn show_controls(&mut self, ui: &mut egui::Ui) {
        let affordances = self.controller.affordances();
        ui.horizontal(|ui| {
            if ui
                .add_enabled(affordances.load, egui::Button::new("📂 Load ROM"))
                .clicked()
            {
                self.load_rom_dialog();
            }
            if ui
                .add_enabled(affordances.start, egui::Button::new("▶ Start"))
                .clicked()
            {
                self.start_emulation();
            }
            if ui
                .add_enabled(affordances.stop, egui::Button::new("⏹ Stop"))
                .clicked()
            {
                self.stop_emulation();
            }
        });
    }

    fn show_status_bar(&self, ui: &mut egui::Ui) {
        let state = self.controller.state();
        ui.horizontal(|ui| {
            ui.colored_label(state_color(state), format!("● {}", state.label()));
            ui.separator();
            ui.label(self.rom_summary.as_deref().unwrap_or("No ROM loaded"));

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(format!("Video: {:?}", self.config.video.backend));
            });
        });
    }

    /// Placeholder for the 640x480 presentation surface
    fn show_display(&self, ui: &mut egui::Ui) {
        let state = self.controller.state();
        ui.vertical_centered(|ui| {
            let available = ui.available_size();
            let scale = (available.x / SURFACE_WIDTH as f32)
                .min(available.y / SURFACE_HEIGHT as f32)
                .clamp(0.0, 1.0);
            let size = egui::vec2(SURFACE_WIDTH as f32 * scale, SURFACE_HEIGHT as f32 * scale);

            let (rect, _response) = ui.allocate_exact_size(size, egui::Sense::hover());
            ui.painter().rect_filled(rect, 0.0, egui::Color32::BLACK);
            ui.painter().rect_stroke(
                rect,
                0.0,
                egui::Stroke::new(1.0, egui::Color32::from_gray(60)),
            );

            let text = match state {
                LifecycleState::Idle => "No ROM loaded",
                LifecycleState::Loaded => "ROM loaded\nPress Start",
                LifecycleState::Running => "Running",
                LifecycleState::Stopped => "Stopped\nPress Start to run again",
            };
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                text,
                egui::FontId::proportional(18.0),
                egui::Color32::LIGHT_GRAY,
            );
        });
    }

    fn show_exit_confirmation(&mut self, ctx: &egui::Context) {
        let mut confirmed = false;
        let mut cancelled = false;

        egui::Window::new("Exit")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label("Emulation is running. Stop it and exit?");
                ui.horizontal(|ui| {
                    confirmed = ui.button("Stop and exit").clicked();
                    cancelled = ui.button("Cancel").clicked();
                });
            });

        if confirmed {
            self.show_exit_dialog = false;
            self.allow_close = true;
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        } else if cancelled {
            self.show_exit_dialog = false;
        }
    }

    /// Open a file dialog to select a ROM
    fn open_rom_dialog(dir: &Path, last_rom: Option<&Path>) -> Option<PathBuf> {
        let mut dialog = rfd::FileDialog::new()
            .set_title("Open N64 ROM")
            .add_filter("N64 ROMs", &ROM_EXTENSIONS)
            .add_filter("All Files", &["*"]);
        if dir.is_dir() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(name) = last_rom.and_then(Path::file_name) {
            dialog = dialog.set_file_name(name.to_string_lossy());
        }
        dialog.pick_file()
    }
}

impl eframe::App for EmulatorApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_controller();
        self.handle_close_request(ctx);

        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            self.show_controls(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.show_status_bar(ui);
        });

        egui::TopBottomPanel::bottom("log_panel")
            .resizable(true)
            .default_height(180.0)
            .show(ctx, |ui| {
                self.log_viewer.show(ui);
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.show_display(ui);
        });

        if self.show_exit_dialog {
            self.show_exit_confirmation(ctx);
        }

        // Keeps the polling tick alive while the window is idle
        ctx.request_repaint_after(self.poll_interval);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.shutdown();
    }
}

fn state_color(state: LifecycleState) -> egui::Color32 {
    match state {
        LifecycleState::Idle => egui::Color32::GRAY,
        LifecycleState::Loaded => egui::Color32::LIGHT_BLUE,
        LifecycleState::Running => egui::Color32::GREEN,
        LifecycleState::Stopped => egui::Color32::YELLOW,
    }
}

/// Status bar text for a loaded ROM, e.g. `test.z64 (z64 (big-endian), 1024 bytes)`
pub fn rom_summary(rom: &RomImage) -> String {
    format!("{} ({}, {} bytes)", rom.file_name(), rom.format().name(), rom.len())
}

/// Run the application
pub fn run(config: Config, sink: LogSink) -> eframe::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("N64 Emulator")
            .with_inner_size([960.0, 760.0])
            .with_min_inner_size([640.0, 480.0]),
        ..Default::default()
    };

    eframe::run_native(
        "n64-emu",
        options,
        Box::new(move |cc| Ok(Box::new(EmulatorApp::new(cc, config, sink)))),
    )
}
