//! User interface of the annotator.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main AnnotatorApp
//! - `metrics` - egui-backed font metrics
//! - `file_ops` - `.lct` save/load through native file dialogs
//! - `canvas` - Scene coordinates, separator dragging and the context menu
//! - `rendering` - Drawing the classifier's render list

mod canvas;
mod file_ops;
mod metrics;
mod rendering;
mod state;

pub use metrics::{CanvasMetrics, EguiMetrics};
pub use state::AnnotatorApp;

use self::state::PendingConfirmAction;
use crate::classifier::Classifier;
use crate::config::AnnotatorConfig;
use crate::constants::{MAX_FONT_SIZE, MIN_FONT_SIZE};
use eframe::egui;

/// Key under which preferences are stored.
pub const APP_STATE_KEY: &str = "app_state";

impl eframe::App for AnnotatorApp {
    /// Persist configuration and preferences between restarts.
    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match self.to_json() {
            Ok(json) => {
                storage.set_string(APP_STATE_KEY, json);
            }
            Err(err) => {
                log::error!("Failed to serialize app state: {err}");
            }
        }
    }

    /// Main update function called by egui for each frame.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `frame` - The eframe frame
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let visuals = if self.dark_mode {
            egui::Visuals::dark()
        } else {
            egui::Visuals::light()
        };
        ctx.set_visuals(visuals);

        self.handle_pending_operations(ctx);
        self.handle_file_shortcuts(ctx);
        self.handle_close_request(ctx);

        if !self.applied_viewport_restore {
            if let Some((w, h)) = self.window_inner_size {
                ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(w, h)));
            }
            self.applied_viewport_restore = true;
        }
        let size = ctx.input(|i| i.screen_rect().size());
        self.window_inner_size = Some((size.x, size.y));

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            self.draw_status_bar(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                self.draw_canvas(ui);
            });
        });

        self.draw_text_editor(ctx);
        self.draw_settings(ctx);
        self.draw_descriptor_editor(ctx);
        self.draw_unsaved_dialog(ctx);
    }
}

impl AnnotatorApp {
    /// Creates the app, restoring persisted preferences when available.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        cc.storage
            .and_then(|storage| storage.get_string(APP_STATE_KEY))
            .and_then(|json| match Self::from_json(&json) {
                Ok(app) => Some(app),
                Err(e) => {
                    log::warn!("ignoring stored app state: {e}");
                    None
                }
            })
            .unwrap_or_default()
    }

    /// Runs `action` now, or asks first when there are unsaved changes.
    pub fn request_action(&mut self, ctx: &egui::Context, action: PendingConfirmAction) {
        if self.has_unsaved_changes() {
            self.file.show_unsaved_dialog = true;
            self.file.pending_confirm_action = Some(action);
        } else {
            self.perform_action(ctx, action);
        }
    }

    fn perform_action(&mut self, ctx: &egui::Context, action: PendingConfirmAction) {
        match action {
            PendingConfirmAction::New => self.new_analysis(ctx),
            PendingConfirmAction::Open => self.open_analysis(),
            PendingConfirmAction::Quit => {
                self.file.allow_close_on_next_request = true;
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    /// Handles keyboard shortcuts for file operations.
    fn handle_file_shortcuts(&mut self, ctx: &egui::Context) {
        if ctx.wants_keyboard_input() {
            return;
        }
        let (save_as, save, open, new, quit) = ctx.input(|i| {
            let cmd = i.modifiers.command;
            let shift = i.modifiers.shift;
            let s = i.key_pressed(egui::Key::S) && cmd;
            (
                s && shift,
                s && !shift,
                i.key_pressed(egui::Key::O) && cmd,
                i.key_pressed(egui::Key::N) && cmd,
                i.key_pressed(egui::Key::Q) && cmd,
            )
        });
        if save_as {
            self.save_as_analysis();
        } else if save {
            self.save_analysis();
        }
        if open {
            self.request_action(ctx, PendingConfirmAction::Open);
        }
        if new {
            self.request_action(ctx, PendingConfirmAction::New);
        }
        if quit {
            self.request_action(ctx, PendingConfirmAction::Quit);
        }
    }

    /// Intercepts window close requests while there are unsaved changes.
    fn handle_close_request(&mut self, ctx: &egui::Context) {
        if !ctx.input(|i| i.viewport().close_requested()) {
            return;
        }
        if self.has_unsaved_changes() && !self.file.allow_close_on_next_request {
            ctx.send_viewport_cmd(egui::ViewportCommand::CancelClose);
            if !self.file.show_unsaved_dialog {
                self.file.show_unsaved_dialog = true;
                self.file.pending_confirm_action = Some(PendingConfirmAction::Quit);
            }
        } else {
            self.file.allow_close_on_next_request = false;
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("New").clicked() {
                self.request_action(ui.ctx(), PendingConfirmAction::New);
            }
            if ui.button("Open").clicked() {
                self.request_action(ui.ctx(), PendingConfirmAction::Open);
            }
            if ui.button("Save").clicked() {
                self.save_analysis();
            }
            if ui.button("Save As").clicked() {
                self.save_as_analysis();
            }

            ui.separator();

            if ui.button("Set Text…").clicked() {
                self.text_editor.open = true;
                self.text_editor.draft = self
                    .classifier
                    .as_ref()
                    .map(|c| c.text().to_string())
                    .unwrap_or_default();
            }
            if ui.button("Descriptors…").clicked() {
                self.open_settings();
            }

            ui.separator();

            ui.label("Text size");
            let mut size = self.config.font_size;
            let response = ui.add(
                egui::DragValue::new(&mut size)
                    .range(MIN_FONT_SIZE..=MAX_FONT_SIZE)
                    .speed(0.5),
            );
            if response.changed() {
                self.apply_font_size(ui.ctx(), size);
            }

            ui.separator();
            let theme_label = if self.dark_mode { "Light mode" } else { "Dark mode" };
            if ui.button(theme_label).clicked() {
                self.dark_mode = !self.dark_mode;
            }
        });
    }

    fn draw_status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some(classifier) = &self.classifier {
                let tree = classifier.analyzed_tree();
                ui.label(format!(
                    "{} clauses in {} super-clauses",
                    tree.clause_count(),
                    tree.super_clauses.len()
                ));
                ui.separator();
                if classifier.descriptors().all_complete() {
                    ui.label("All clauses tagged");
                } else {
                    ui.colored_label(egui::Color32::from_rgb(230, 110, 110), "Untagged clauses remain");
                }
                if classifier.is_changed() {
                    ui.separator();
                    ui.label("Modified");
                }
            }
            if let Some(status) = &self.status {
                ui.separator();
                ui.label(status);
            }
        });
    }

    /// Changes the text size and reflows the scene, keeping the grouping.
    pub fn apply_font_size(&mut self, ctx: &egui::Context, size: f32) {
        let size = size.clamp(MIN_FONT_SIZE, MAX_FONT_SIZE);
        self.config.font_size = size;
        let metrics = self.canvas_metrics(ctx);
        if let Some(classifier) = self.classifier.as_mut() {
            classifier.set_text_size(size, &metrics);
        }
    }

    /// Replaces the annotated text; all clause boundaries are dropped.
    pub fn apply_text(&mut self, ctx: &egui::Context, text: &str) {
        let metrics = self.canvas_metrics(ctx);
        if let Some(classifier) = self.classifier.as_mut() {
            classifier.set_text(text, &metrics);
        }
        self.interaction = Default::default();
        self.context_menu = Default::default();
    }

    fn draw_text_editor(&mut self, ctx: &egui::Context) {
        if !self.text_editor.open {
            return;
        }
        let mut open = true;
        let mut apply = false;
        egui::Window::new("Text")
            .open(&mut open)
            .default_width(480.0)
            .show(ctx, |ui| {
                ui.label("Paste the paragraph to analyze. Existing clause boundaries are discarded.");
                ui.add(
                    egui::TextEdit::multiline(&mut self.text_editor.draft)
                        .desired_rows(10)
                        .desired_width(f32::INFINITY),
                );
                if ui.button("Apply").clicked() {
                    apply = true;
                }
            });
        if apply {
            let draft = self.text_editor.draft.clone();
            self.apply_text(ctx, &draft);
            open = false;
        }
        self.text_editor.open = open;
    }

    fn open_settings(&mut self) {
        self.settings.open = true;
        self.settings.template = self.config.template.clone();
        self.settings.values = self.config.allowed_values.join(", ");
        self.settings.labels = self.config.labels.join(", ");
        self.settings.error = None;
    }

    /// Validates the drafted descriptor settings and rebuilds the classifier.
    ///
    /// The text is kept; clause boundaries and descriptors are reset.
    ///
    /// # Returns
    ///
    /// `true` when the settings were accepted
    pub fn apply_settings(&mut self, ctx: &egui::Context) -> bool {
        let split = |list: &str| -> Vec<String> {
            list.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect()
        };
        let mut config = AnnotatorConfig {
            template: self.settings.template.trim().to_string(),
            allowed_values: split(&self.settings.values),
            labels: split(&self.settings.labels),
            ..self.config.clone()
        };
        if config.template != self.config.template || config.allowed_values != self.config.allowed_values {
            if let Err(e) = config.regenerate_palette() {
                self.settings.error = Some(e.to_string());
                return false;
            }
        }

        let metrics = self.canvas_metrics(ctx);
        let width = self
            .classifier
            .as_ref()
            .map_or(self.canvas.width.max(1.0), Classifier::scene_width);
        match Classifier::new(&config, width, &metrics) {
            Ok(mut classifier) => {
                if let Some(old) = &self.classifier {
                    classifier.set_text(old.text(), &metrics);
                }
                log::info!("descriptor settings changed to template {:?}", config.template);
                self.classifier = Some(classifier);
                self.config = config;
                self.config_error = None;
                self.settings.error = None;
                self.interaction = Default::default();
                true
            }
            Err(e) => {
                log::warn!("refused descriptor settings: {e}");
                self.settings.error = Some(e.to_string());
                false
            }
        }
    }

    fn draw_settings(&mut self, ctx: &egui::Context) {
        if !self.settings.open {
            return;
        }
        let mut open = true;
        let mut apply = false;
        egui::Window::new("Descriptors").open(&mut open).show(ctx, |ui| {
            egui::Grid::new("descriptor_settings").num_columns(2).show(ui, |ui| {
                ui.label("Template");
                ui.text_edit_singleline(&mut self.settings.template);
                ui.end_row();
                ui.label("Values");
                ui.text_edit_singleline(&mut self.settings.values);
                ui.end_row();
                ui.label("Labels");
                ui.text_edit_singleline(&mut self.settings.labels);
                ui.end_row();
            });
            ui.label(format!(
                "'{}' marks an editable segment. Changing the template resets the clauses.",
                self.config.placeholder
            ));
            if let Some(error) = &self.settings.error {
                ui.colored_label(egui::Color32::LIGHT_RED, error);
            }
            if ui.button("Apply").clicked() {
                apply = true;
            }
        });
        if apply && self.apply_settings(ctx) {
            open = false;
        }
        self.settings.open = open;
    }

    fn draw_descriptor_editor(&mut self, ctx: &egui::Context) {
        let Some(group) = self.interaction.editing_group else {
            return;
        };
        let Some(classifier) = self.classifier.as_ref() else {
            return;
        };
        let Some(badge) = classifier.descriptors().group_descriptor(group) else {
            self.interaction.editing_group = None;
            return;
        };
        let mut values = badge.editable.clone();
        let labels = classifier.config().labels.clone();
        let choices: Vec<String> = std::iter::once(classifier.config().template.placeholder.to_string())
            .chain(classifier.config().allowed_values.iter().cloned())
            .collect();

        let mut open = true;
        let mut changed = false;
        let mut cycle = None;
        egui::Window::new(format!("Clause {}", group + 1))
            .id(egui::Id::new("descriptor_editor"))
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                for (segment, value) in values.iter_mut().enumerate() {
                    ui.horizontal(|ui| {
                        ui.label(labels.get(segment).map_or("", String::as_str));
                        egui::ComboBox::from_id_salt(("segment", segment))
                            .selected_text(value.as_str())
                            .show_ui(ui, |ui| {
                                for choice in &choices {
                                    changed |= ui.selectable_value(value, choice.clone(), choice).changed();
                                }
                            });
                        if ui.small_button("⟳").on_hover_text("Next value").clicked() {
                            cycle = Some(segment);
                        }
                    });
                }
            });

        if let Some(classifier) = self.classifier.as_mut() {
            if changed {
                classifier.set_descriptor_values(group, values);
            } else if let Some(segment) = cycle {
                classifier.cycle_descriptor_segment(group, segment);
            }
            if !open {
                classifier.set_highlighted_group(None);
            }
        }
        if !open {
            self.interaction.editing_group = None;
        }
    }

    fn draw_unsaved_dialog(&mut self, ctx: &egui::Context) {
        if !self.file.show_unsaved_dialog {
            return;
        }
        let (title, confirm_label) = match self.file.pending_confirm_action {
            Some(PendingConfirmAction::Quit) => ("Unsaved changes: Quit?", "Discard and Quit"),
            Some(PendingConfirmAction::New) => ("Unsaved changes: Start over?", "Discard and Start Over"),
            Some(PendingConfirmAction::Open) => ("Unsaved changes: Open file?", "Discard and Open"),
            None => ("Unsaved changes", "Discard"),
        };
        let mut confirmed = false;
        let mut cancelled = false;
        egui::Window::new(title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                ui.label("The analysis has unsaved changes. Are you sure you want to continue?");
                ui.horizontal(|ui| {
                    confirmed = ui.button(confirm_label).clicked();
                    cancelled = ui.button("Cancel").clicked();
                });
            });
        if confirmed {
            if let Some(action) = self.file.pending_confirm_action {
                self.perform_action(ctx, action);
            }
        }
        if confirmed || cancelled {
            self.file.show_unsaved_dialog = false;
            self.file.pending_confirm_action = None;
        }
    }
}

#[cfg(test)]
mod tests;
