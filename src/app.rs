use crate::batch::{BatchJob, BorderColor};
use crate::compositor::{BatchEvent, BorderCompositor, Waker};
use crate::error::CompositorError;
use crate::ui_theme::{Theme, Tone};
use chrono::Local;
use eframe::egui;
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};

const INSTRUCTIONS: &str = "Pads every .png in the chosen directory to a 2.37:1 canvas with a \
colored border, and writes a black/white mask of the same size. Results go into a _BORDERED \
folder inside that directory.";
const OVERWRITE_PROMPT: &str = "There is already a folder here called _BORDERED. Continuing to \
process may cause existing images in this folder to be overwritten. Continue?";
const MAX_LOGS: usize = 1000;

/// Preferences remembered between launches. The directory always starts at the working directory.
#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct AppConfig {
    pub border_color: Option<BorderColor>,
}

struct LogLine {
    text: String,
    tone: Tone,
}

struct OverwritePrompt {
    directory: PathBuf,
    reply: oneshot::Sender<bool>,
}

pub struct BorderCzarApp {
    // Inputs
    directory: String,
    border_color: BorderColor,

    // UI state
    logs: Vec<LogLine>,
    new_logs_count: usize,
    notice: Option<String>,
    overwrite_prompt: Option<OverwritePrompt>,
    batch_total: usize,

    // Core
    compositor: BorderCompositor,
    runtime: tokio::runtime::Runtime,
    event_sender: mpsc::UnboundedSender<BatchEvent>,
    event_receiver: mpsc::UnboundedReceiver<BatchEvent>,

    config_path: PathBuf,
    theme: Theme,
}

impl BorderCzarApp {
    pub fn new() -> Result<Self, std::io::Error> {
        let runtime = tokio::runtime::Runtime::new()?;
        let (event_sender, event_receiver) = mpsc::unbounded_channel();

        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("BorderCzar");
        if !config_dir.exists() {
            if let Err(e) = fs::create_dir_all(&config_dir) {
                warn!("Failed to create config directory: {}", e);
            }
        }
        let config_path = config_dir.join("config.json");
        let config = load_config(&config_path).unwrap_or_default();

        let directory = std::env::current_dir()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        Ok(Self {
            directory,
            border_color: config.border_color.unwrap_or_default(),
            logs: Vec::new(),
            new_logs_count: 0,
            notice: None,
            overwrite_prompt: None,
            batch_total: 0,
            compositor: BorderCompositor::new(),
            runtime,
            event_sender,
            event_receiver,
            config_path,
            theme: Theme::default(),
        })
    }

    fn log(&mut self, tone: Tone, text: impl Into<String>) {
        let text = format!("{}  {}", Local::now().format("%H:%M:%S"), text.into());
        self.logs.push(LogLine { text, tone });
        self.new_logs_count += 1;

        if self.logs.len() > MAX_LOGS {
            let remove_count = self.logs.len() - MAX_LOGS;
            self.logs.drain(0..remove_count);
        }
    }

    fn save_config(&self) {
        let config = AppConfig {
            border_color: Some(self.border_color),
        };
        if let Err(e) = write_config(&self.config_path, &config) {
            error!("Failed to save config to {:?}: {}", self.config_path, e);
        }
    }

    fn select_folder(&mut self) {
        let mut dialog = rfd::FileDialog::new();
        if Path::new(&self.directory).is_dir() {
            dialog = dialog.set_directory(&self.directory);
        }
        if let Some(path) = dialog.pick_folder() {
            self.directory = path.display().to_string();
            self.log(Tone::Normal, format!("Selected folder: {}", path.display()));
        }
    }

    fn start_processing(&mut self, ctx: &egui::Context) {
        self.save_config();

        let ctx = ctx.clone();
        let waker: Waker = Arc::new(move || ctx.request_repaint());

        let job = BatchJob::new(PathBuf::from(self.directory.trim()), self.border_color);
        let job_id = job.id;
        match self
            .compositor
            .start(self.runtime.handle(), job, self.event_sender.clone(), waker)
        {
            Ok(()) => {
                info!("[{}] Batch started for {}", job_id, self.directory);
                self.log(Tone::Normal, format!("Processing {}", self.directory.trim()));
            }
            Err(e) => {
                warn!("Could not start batch: {}", e);
                self.log(Tone::Warning, e.to_string());
            }
        }
    }

    fn handle_events(&mut self) {
        while let Ok(event) = self.event_receiver.try_recv() {
            match event {
                BatchEvent::Started { total, .. } => {
                    self.batch_total = total;
                    self.log(Tone::Normal, format!("Found {} image(s)", total));
                }
                BatchEvent::Progress(percent) => {
                    self.log(Tone::Normal, format!("Progress: {}%", percent));
                }
                BatchEvent::ConfirmOverwrite { directory, reply } => {
                    self.log(
                        Tone::Warning,
                        format!("Output folder already exists: {}", directory.display()),
                    );
                    self.overwrite_prompt = Some(OverwritePrompt { directory, reply });
                }
                BatchEvent::Complete(summary) => {
                    let elapsed = summary.completed_at - summary.started_at;
                    self.log(
                        Tone::Success,
                        format!(
                            "Processed {} of {} image(s) in {} ms",
                            summary.processed,
                            self.batch_total,
                            elapsed.num_milliseconds()
                        ),
                    );
                    if let Some(dir) = summary.outputs.first().and_then(|p| p.bordered_path.parent()) {
                        self.log(Tone::Normal, format!("Output folder: {}", dir.display()));
                    }
                    self.notice = Some("Processing complete.".to_string());
                }
                BatchEvent::Aborted(e) => self.report_abort(e),
            }
        }
    }

    fn report_abort(&mut self, e: CompositorError) {
        match e {
            CompositorError::OverwriteDeclined { .. } => {
                self.log(Tone::Normal, "Processing cancelled, nothing was overwritten");
            }
            CompositorError::InvalidDirectory { ref path, .. } => {
                self.log(Tone::Error, format!("Cannot read directory {}", path.display()));
                self.notice = Some("Please select a valid directory.".to_string());
            }
            other => {
                self.log(Tone::Error, format!("Processing stopped: {}", other));
                self.notice = Some(format!("Processing stopped: {}", other));
            }
        }
    }

    fn show_overwrite_prompt(&mut self, ctx: &egui::Context) {
        let Some(prompt) = self.overwrite_prompt.as_ref() else {
            return;
        };

        let mut answer = None;
        egui::Window::new("Potential Overwrite")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(OVERWRITE_PROMPT);
                ui.label(
                    egui::RichText::new(prompt.directory.display().to_string())
                        .size(12.0)
                        .color(self.theme.text_muted),
                );
                ui.add_space(self.theme.spacing_medium);
                ui.horizontal(|ui| {
                    if ui.add(self.theme.primary_button("Yes")).clicked() {
                        answer = Some(true);
                    }
                    if ui.add(self.theme.secondary_button("No")).clicked() {
                        answer = Some(false);
                    }
                });
            });

        if let Some(answer) = answer {
            if let Some(prompt) = self.overwrite_prompt.take() {
                // The worker may already be gone if the runtime is shutting down.
                let _ = prompt.reply.send(answer);
            }
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let Some(message) = self.notice.clone() else {
            return;
        };

        let mut dismissed = false;
        egui::Window::new("BorderCzar")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(message);
                ui.add_space(self.theme.spacing_medium);
                if ui.add(self.theme.primary_button("OK")).clicked() {
                    dismissed = true;
                }
            });

        if dismissed {
            self.notice = None;
        }
    }

    fn show_inputs(&mut self, ui: &mut egui::Ui) {
        let frame = self.theme.card_frame();
        frame.show(ui, |ui| {
            ui.label(
                egui::RichText::new(INSTRUCTIONS)
                    .size(13.0)
                    .color(self.theme.text_secondary),
            );
            ui.add_space(self.theme.spacing_large);

            let busy = self.compositor.is_running();
            ui.add_enabled_ui(!busy, |ui| {
                ui.horizontal(|ui| {
                    ui.label("Directory:");
                    let width = ui.available_width() - 40.0;
                    ui.add_sized(
                        [width.max(80.0), 24.0],
                        egui::TextEdit::singleline(&mut self.directory),
                    );
                    if ui.button("...").clicked() {
                        self.select_folder();
                    }
                });
                ui.add_space(self.theme.spacing_small);

                ui.horizontal(|ui| {
                    ui.label("Desired Border Color:");
                    let mut rgb = [self.border_color.r, self.border_color.g, self.border_color.b];
                    if ui.color_edit_button_srgb(&mut rgb).changed() {
                        self.border_color = BorderColor::new(rgb[0], rgb[1], rgb[2]);
                    }
                });
            });
        });
        ui.add_space(self.theme.spacing_medium);
    }

    fn show_action_buttons(&mut self, ui: &mut egui::Ui) {
        let busy = self.compositor.is_running();

        ui.horizontal(|ui| {
            ui.label("Progress:");
            let progress = self.compositor.progress() as f32 / 100.0;
            ui.add(
                egui::ProgressBar::new(progress)
                    .desired_width((ui.available_width() - 180.0).max(100.0))
                    .show_percentage(),
            );

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                if ui.add(self.theme.secondary_button("Exit")).clicked() {
                    self.save_config();
                    ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                }
                ui.add_space(self.theme.spacing_small);
                let process = ui.add_enabled(!busy, self.theme.primary_button("Process"));
                if process.clicked() {
                    let ctx = ui.ctx().clone();
                    self.start_processing(&ctx);
                }
            });
        });
        ui.add_space(self.theme.spacing_medium);
    }

    fn show_logs_panel(&mut self, ui: &mut egui::Ui) {
        let frame = self.theme.card_frame();
        frame.show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new("Activity")
                        .size(16.0)
                        .strong()
                        .color(self.theme.text_primary),
                );
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if self.new_logs_count > 0 {
                        ui.label(
                            egui::RichText::new(format!("{} new", self.new_logs_count))
                                .size(12.0)
                                .color(self.theme.accent),
                        );
                    }
                });
            });
            ui.add_space(self.theme.spacing_small);

            egui::ScrollArea::vertical()
                .id_salt("logs_scroll")
                .stick_to_bottom(true)
                .auto_shrink([false; 2])
                .show(ui, |ui| {
                    if self.logs.is_empty() {
                        ui.label(
                            egui::RichText::new("No activity yet")
                                .size(14.0)
                                .color(self.theme.text_muted),
                        );
                    }
                    for line in &self.logs {
                        ui.label(
                            egui::RichText::new(&line.text)
                                .size(12.0)
                                .color(self.theme.tone_color(line.tone)),
                        );
                    }
                });
        });
        self.new_logs_count = 0;
    }
}

impl eframe::App for BorderCzarApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.theme.apply_to_ctx(ctx);

        self.handle_events();

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_space(self.theme.padding_medium);
            self.show_inputs(ui);
            self.show_action_buttons(ui);
            self.show_logs_panel(ui);
        });

        self.show_overwrite_prompt(ctx);
        self.show_notice(ctx);

        // Progress and the prompt arrive through the waker; this is a fallback while a batch runs.
        if self.compositor.is_running() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}

pub fn load_config(path: &Path) -> Option<AppConfig> {
    if !path.exists() {
        info!("Config file does not exist at: {:?}", path);
        return None;
    }
    match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Failed to parse config: {}", e);
                None
            }
        },
        Err(e) => {
            warn!("Failed to read config file: {}", e);
            None
        }
    }
}

pub fn write_config(path: &Path, config: &AppConfig) -> Result<(), std::io::Error> {
    let json = serde_json::to_string_pretty(config)?;
    fs::write(path, json)
}
