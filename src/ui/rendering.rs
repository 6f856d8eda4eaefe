//! Painting of the classifier's render list.
//!
//! Spans are drawn first, then words, separators and badges on top.

use super::state::AnnotatorApp;
use crate::classifier::RenderItem;
use crate::types::{Color, SceneRect};
use eframe::egui;
use eframe::epaint::StrokeKind;

/// Converts a model color to an egui color.
pub fn to_color32(color: Color) -> egui::Color32 {
    egui::Color32::from_rgba_unmultiplied(color.r, color.g, color.b, color.a)
}

impl AnnotatorApp {
    fn text_color(&self) -> egui::Color32 {
        if self.dark_mode {
            egui::Color32::from_gray(230)
        } else {
            egui::Color32::from_gray(20)
        }
    }

    fn screen_rect(&self, rect: &SceneRect) -> egui::Rect {
        egui::Rect::from_min_size(
            self.scene_to_screen(rect.x, rect.y),
            egui::vec2(rect.width, rect.height),
        )
    }

    /// Renders the whole annotation scene.
    ///
    /// # Arguments
    ///
    /// * `painter` - The egui painter for drawing operations
    pub fn render_scene(&self, painter: &egui::Painter) {
        let Some(classifier) = self.classifier.as_ref() else {
            return;
        };
        let metrics = self.canvas_metrics(painter.ctx());
        let hovered_rows: Vec<SceneRect> = self
            .interaction
            .hovered_group
            .map(|group| classifier.spans().group_spans(group).iter().map(|s| s.rect).collect())
            .unwrap_or_default();

        for item in classifier.render_list(&metrics) {
            self.draw_item(painter, &item, &hovered_rows);
        }
    }

    fn draw_item(&self, painter: &egui::Painter, item: &RenderItem, hovered_rows: &[SceneRect]) {
        match item {
            RenderItem::Span { rect, radius, color } => {
                let screen = self.screen_rect(rect);
                painter.rect_filled(screen, *radius, to_color32(*color));
                if hovered_rows.contains(rect) {
                    painter.rect_stroke(
                        screen,
                        *radius,
                        egui::Stroke::new(1.0, self.text_color().gamma_multiply(0.5)),
                        StrokeKind::Inside,
                    );
                }
            }
            RenderItem::Word { x, y, text, size } => {
                painter.text(
                    self.scene_to_screen(*x, *y),
                    egui::Align2::LEFT_CENTER,
                    text,
                    egui::FontId::proportional(*size),
                    self.text_color(),
                );
            }
            RenderItem::SeparatorLine {
                x,
                top,
                height,
                width,
                is_super,
            } => {
                let color = if *is_super {
                    egui::Color32::from_rgb(220, 90, 60)
                } else {
                    egui::Color32::from_rgb(90, 140, 230)
                };
                let start = self.scene_to_screen(*x, *top);
                let end = self.scene_to_screen(*x, top + height);
                painter.line_segment([start, end], egui::Stroke::new(*width, color));
            }
            RenderItem::Badge {
                rect,
                text,
                size,
                complete,
                highlighted,
            } => {
                let screen = self.screen_rect(rect).expand(2.0);
                if *highlighted {
                    painter.rect_filled(screen, 3.0, egui::Color32::from_rgba_unmultiplied(255, 210, 80, 90));
                }
                let color = if *complete {
                    self.text_color()
                } else {
                    egui::Color32::from_rgb(230, 110, 110)
                };
                painter.text(
                    screen.center(),
                    egui::Align2::CENTER_CENTER,
                    text,
                    egui::FontId::proportional(*size),
                    color,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_conversion_keeps_channels() {
        let color = to_color32(Color::rgba(10, 20, 30, 255));
        assert_eq!(color, egui::Color32::from_rgb(10, 20, 30));
    }
}
