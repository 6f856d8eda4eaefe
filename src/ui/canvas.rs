//! Canvas interaction: scene coordinates, separator dragging, badge picking
//! and the context menu.

use super::metrics::{CanvasMetrics, EguiMetrics};
use super::state::{AnnotatorApp, MenuAction};
use crate::classifier::Classifier;
use eframe::egui;
use std::time::Instant;

impl AnnotatorApp {
    /// Metrics the canvas measures text with.
    pub fn canvas_metrics(&self, ctx: &egui::Context) -> CanvasMetrics {
        match self.headless_metrics {
            Some(metrics) => CanvasMetrics::Monospace(metrics),
            None => CanvasMetrics::Egui(EguiMetrics::new(ctx)),
        }
    }

    /// Converts screen coordinates to scene coordinates.
    pub fn screen_to_scene(&self, screen_pos: egui::Pos2) -> (f32, f32) {
        let local = screen_pos - self.canvas.origin;
        (local.x, local.y)
    }

    /// Converts scene coordinates to screen coordinates.
    pub fn scene_to_screen(&self, x: f32, y: f32) -> egui::Pos2 {
        self.canvas.origin + egui::vec2(x, y)
    }

    /// Builds the classifier from the configuration if there is none yet.
    ///
    /// # Returns
    ///
    /// `true` when a classifier is available afterwards
    pub fn ensure_classifier(&mut self, ctx: &egui::Context, width: f32) -> bool {
        if self.classifier.is_some() {
            return true;
        }
        if self.config_error.is_some() {
            return false;
        }
        let metrics = self.canvas_metrics(ctx);
        match Classifier::new(&self.config, width, &metrics) {
            Ok(classifier) => {
                self.classifier = Some(classifier);
                true
            }
            Err(e) => {
                log::error!("invalid annotator configuration: {e}");
                self.config_error = Some(e.to_string());
                false
            }
        }
    }

    /// Draws the annotation canvas and handles its pointer input.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let width = ui.available_width().max(1.0);
        if !self.ensure_classifier(ui.ctx(), width) {
            let message = self.config_error.clone().unwrap_or_default();
            ui.colored_label(egui::Color32::LIGHT_RED, format!("Configuration error: {message}"));
            return;
        }

        self.track_width(ui.ctx(), width);

        let scene_height = self.classifier.as_ref().map_or(0.0, Classifier::scene_height);
        // Inside a scroll area the available height is unbounded.
        let fill = ui.available_height();
        let height = if fill.is_finite() {
            scene_height.max(fill)
        } else {
            scene_height
        };
        let (response, painter) = ui.allocate_painter(egui::vec2(width, height), egui::Sense::click_and_drag());
        self.canvas.origin = response.rect.min;

        self.handle_separator_dragging(ui, &response);
        self.handle_canvas_clicks(ui, &response);
        self.handle_hover(ui, &response);

        self.render_scene(&painter);

        if self.context_menu.show {
            self.draw_context_menu(ui);
        }
    }

    /// Feeds canvas width changes into the relayout debounce.
    fn track_width(&mut self, ctx: &egui::Context, width: f32) {
        let metrics = self.canvas_metrics(ctx);
        let Some(classifier) = self.classifier.as_mut() else {
            return;
        };
        let now = Instant::now();
        if (width - self.canvas.width).abs() > 0.5 {
            self.canvas.width = width;
            if (width - classifier.scene_width()).abs() > 0.5 {
                classifier.request_width(width, now);
            }
        }
        if classifier.poll_relayout(now, &metrics) {
            log::debug!("canvas reflowed to width {width}");
        }
        if let Some(remaining) = classifier.relayout_remaining(now) {
            ctx.request_repaint_after(remaining);
        }
    }

    /// Press, drag and release of separators with the primary button.
    fn handle_separator_dragging(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let (pressed, down, pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.interact_pos(),
            )
        });

        if !down {
            self.interaction.dragging_separator = None;
            return;
        }
        let Some(pos) = pos else {
            return;
        };
        let (x, y) = self.screen_to_scene(pos);
        let Some(classifier) = self.classifier.as_mut() else {
            return;
        };

        if pressed && response.rect.contains(pos) && !self.context_menu.show {
            if let Some((index, _)) = classifier.separator_at(x, y) {
                classifier.press_separator(index, x, y);
                self.interaction.dragging_separator = Some(index);
            }
        } else if let Some(index) = self.interaction.dragging_separator {
            classifier.drag_separator(index, x, y);
        }
    }

    /// Badge selection and context menu opening.
    fn handle_canvas_clicks(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let metrics = self.canvas_metrics(ui.ctx());
        if response.clicked() && self.interaction.dragging_separator.is_none() {
            if let Some(pos) = response.interact_pointer_pos() {
                let (x, y) = self.screen_to_scene(pos);
                if let Some(classifier) = self.classifier.as_mut() {
                    let group = classifier.descriptor_at(x, y, &metrics);
                    classifier.set_highlighted_group(group);
                    self.interaction.editing_group = group;
                }
            }
        }

        if response.secondary_clicked() {
            if let Some(pos) = response.interact_pointer_pos() {
                self.open_context_menu(pos);
            }
        }
    }

    fn handle_hover(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let hovered = ui
            .input(|i| i.pointer.hover_pos())
            .filter(|pos| response.rect.contains(*pos))
            .and_then(|pos| {
                let (x, y) = self.screen_to_scene(pos);
                self.classifier.as_ref().and_then(|c| c.group_at(x, y))
            });
        self.interaction.hovered_group = hovered;
    }

    /// Shows the context menu for the gap under `screen_pos`.
    pub fn open_context_menu(&mut self, screen_pos: egui::Pos2) {
        self.context_menu.show = true;
        self.context_menu.just_opened = true;
        self.context_menu.screen_pos = (screen_pos.x, screen_pos.y);
        self.context_menu.scene_pos = self.screen_to_scene(screen_pos);
    }

    /// Whether `action` is possible at the context menu position.
    pub fn menu_action_enabled(&self, action: MenuAction) -> bool {
        let (x, y) = self.context_menu.scene_pos;
        let Some(classifier) = self.classifier.as_ref() else {
            return false;
        };
        match action {
            MenuAction::Split => classifier.can_split(x, y),
            MenuAction::Join => classifier.can_join(x, y),
            MenuAction::Promote => classifier.can_promote(x, y),
            MenuAction::Demote => classifier.can_demote(x, y),
        }
    }

    /// Applies `action` at the context menu position and closes the menu.
    pub fn apply_menu_action(&mut self, action: MenuAction) -> bool {
        let (x, y) = self.context_menu.scene_pos;
        self.context_menu.show = false;
        let Some(classifier) = self.classifier.as_mut() else {
            return false;
        };
        let done = match action {
            MenuAction::Split => classifier.split(x, y),
            MenuAction::Join => classifier.join(x, y),
            MenuAction::Promote => classifier.promote_separator(x, y),
            MenuAction::Demote => classifier.demote_separator(x, y),
        };
        if done {
            // Group indices shift after a split or join.
            self.interaction.editing_group = None;
            classifier.set_highlighted_group(None);
        } else {
            log::debug!("{action:?} refused at ({x}, {y})");
        }
        done
    }

    fn draw_context_menu(&mut self, ui: &mut egui::Ui) {
        let screen_pos = egui::pos2(self.context_menu.screen_pos.0, self.context_menu.screen_pos.1);
        let actions = [
            (MenuAction::Split, "Split clause here"),
            (MenuAction::Join, "Join clauses"),
            (MenuAction::Promote, "Make super-clause boundary"),
            (MenuAction::Demote, "Make clause boundary"),
        ];

        let mut chosen = None;
        let area_response = egui::Area::new(egui::Id::new("annotation_context_menu"))
            .fixed_pos(screen_pos)
            .show(ui.ctx(), |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.vertical(|ui| {
                        for (action, label) in actions {
                            let enabled = self.menu_action_enabled(action);
                            if ui.add_enabled(enabled, egui::Button::new(label)).clicked() {
                                chosen = Some(action);
                            }
                        }
                        ui.separator();
                        if ui.button("Cancel").clicked() {
                            self.context_menu.show = false;
                        }
                    });
                })
            });

        if let Some(action) = chosen {
            self.apply_menu_action(action);
        }

        // Handle click-outside-to-close after the first frame
        if !self.context_menu.just_opened && ui.input(|i| i.pointer.primary_clicked()) {
            if let Some(click_pos) = ui.input(|i| i.pointer.interact_pos()) {
                if !area_response.response.rect.contains(click_pos) {
                    self.context_menu.show = false;
                }
            }
        }

        self.context_menu.just_opened = false;
    }
}
