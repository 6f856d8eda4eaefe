//! Font metrics backed by egui's text layout.

use crate::metrics::{FontMetrics, FontSpec, MonospaceMetrics};
use eframe::egui;

/// Measures text with the fonts of an egui context.
///
/// Only valid inside a frame: egui has no fonts before the first `Context::run`.
#[derive(Clone)]
pub struct EguiMetrics {
    ctx: egui::Context,
}

impl EguiMetrics {
    /// Wraps a context handle.
    pub fn new(ctx: &egui::Context) -> Self {
        Self { ctx: ctx.clone() }
    }

    fn font_id(font: &FontSpec) -> egui::FontId {
        egui::FontId::proportional(font.size)
    }
}

impl FontMetrics for EguiMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        let font_id = Self::font_id(font);
        self.ctx.fonts_mut(|f| {
            f.layout_no_wrap(text.to_owned(), font_id, egui::Color32::BLACK)
                .size()
                .x
        })
    }

    fn row_height(&self, font: &FontSpec) -> f32 {
        let font_id = Self::font_id(font);
        self.ctx.fonts_mut(|f| f.row_height(&font_id))
    }

    fn block_height(&self, text: &str, font: &FontSpec) -> f32 {
        let font_id = Self::font_id(font);
        let (height, rows) = self.ctx.fonts_mut(|f| {
            let galley = f.layout_no_wrap(text.to_owned(), font_id, egui::Color32::BLACK);
            (galley.size().y, galley.rows.len().max(1))
        });
        // egui lays rows out tight; the extra leading comes from the line height setting.
        let spacing = self.row_height(font) * (font.line_height_percent - 100.0).max(0.0) / 100.0;
        height + (rows - 1) as f32 * spacing
    }
}

/// Metrics used by the shell: egui fonts normally, fixed advances when headless.
#[derive(Clone)]
pub enum CanvasMetrics {
    /// Real font measurements
    Egui(EguiMetrics),
    /// Deterministic measurements
    Monospace(MonospaceMetrics),
}

impl FontMetrics for CanvasMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        match self {
            CanvasMetrics::Egui(m) => m.text_width(text, font),
            CanvasMetrics::Monospace(m) => m.text_width(text, font),
        }
    }

    fn row_height(&self, font: &FontSpec) -> f32 {
        match self {
            CanvasMetrics::Egui(m) => m.row_height(font),
            CanvasMetrics::Monospace(m) => m.row_height(font),
        }
    }

    fn block_height(&self, text: &str, font: &FontSpec) -> f32 {
        match self {
            CanvasMetrics::Egui(m) => m.block_height(text, font),
            CanvasMetrics::Monospace(m) => m.block_height(text, font),
        }
    }
}
