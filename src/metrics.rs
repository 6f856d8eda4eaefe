//! Font measurement abstraction and vertical calibration.
//!
//! The layout engine never talks to a rendering toolkit directly. Everything it
//! needs to know about glyph sizes goes through [`FontMetrics`], which the UI
//! shell implements on top of egui and tests implement with [`MonospaceMetrics`].

use crate::constants::CALIBRATION_PROBE;
use serde::{Deserialize, Serialize};

/// Font parameters that influence measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    /// Point size of the font
    pub size: f32,
    /// Line height as a percentage of the row height (100 = tight)
    pub line_height_percent: f32,
}

impl FontSpec {
    /// Creates a font spec.
    pub fn new(size: f32, line_height_percent: f32) -> Self {
        Self {
            size,
            line_height_percent,
        }
    }

    /// The same font at another point size.
    pub fn with_size(self, size: f32) -> Self {
        Self { size, ..self }
    }
}

/// Measurement service for text runs and blocks.
///
/// Implementations must be deterministic for a given font, otherwise the gap grid
/// (and every separator snapped to it) shifts between layout passes.
pub trait FontMetrics {
    /// Width of a single-line run of text.
    fn text_width(&self, text: &str, font: &FontSpec) -> f32;

    /// Height of one row of glyphs, without inter-line spacing.
    fn row_height(&self, font: &FontSpec) -> f32;

    /// Rendered height of a block of `\n`-separated lines, including the
    /// renderer's own padding and line spacing.
    fn block_height(&self, text: &str, font: &FontSpec) -> f32;
}

/// Vertical metrics back-solved from block measurements.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Calibration {
    /// Padding above the first line
    pub padding_y: f32,
    /// Height of one line strip
    pub strip_height: f32,
    /// Distance between two consecutive line centers
    pub line_pitch: f32,
}

/// Back-solves padding and line pitch by rendering one line and two lines.
///
/// With `h(n) = 2·pad + n·strip + (n−1)·spacing`, measuring `h(1)` and `h(2)` gives
/// `pitch = h(2) − h(1)` and `pad = (h(1) − strip) / 2`.
pub fn calibrate(metrics: &dyn FontMetrics, font: &FontSpec) -> Calibration {
    let one = metrics.block_height(CALIBRATION_PROBE, font);
    let two = metrics.block_height(&format!("{CALIBRATION_PROBE}\n{CALIBRATION_PROBE}"), font);
    let strip_height = metrics.row_height(font);
    let line_pitch = (two - one).max(strip_height);
    let padding_y = ((one - strip_height) / 2.0).max(0.0);
    log::trace!("calibrated font {font:?}: pad={padding_y} strip={strip_height} pitch={line_pitch}");
    Calibration {
        padding_y,
        strip_height,
        line_pitch,
    }
}

/// Deterministic metrics where every character has the same advance.
///
/// Sizes scale linearly with the font size, which keeps coordinates easy to
/// compute by hand.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonospaceMetrics {
    /// Advance of one character per point of font size
    pub advance_ratio: f32,
    /// Row height per point of font size
    pub row_ratio: f32,
    /// Padding the renderer adds above and below a block
    pub block_margin: f32,
}

impl Default for MonospaceMetrics {
    fn default() -> Self {
        Self {
            advance_ratio: 1.0,
            row_ratio: 2.0,
            block_margin: 4.0,
        }
    }
}

impl FontMetrics for MonospaceMetrics {
    fn text_width(&self, text: &str, font: &FontSpec) -> f32 {
        text.chars().count() as f32 * self.advance_ratio * font.size
    }

    fn row_height(&self, font: &FontSpec) -> f32 {
        self.row_ratio * font.size
    }

    fn block_height(&self, text: &str, font: &FontSpec) -> f32 {
        let lines = text.split('\n').count().max(1) as f32;
        let row = self.row_height(font);
        let spacing = row * (font.line_height_percent - 100.0).max(0.0) / 100.0;
        2.0 * self.block_margin + lines * row + (lines - 1.0) * spacing
    }
}
