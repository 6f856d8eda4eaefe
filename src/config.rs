//! User-facing annotator configuration, persisted by the UI shell.

use crate::constants::{
    DEFAULT_FONT_SIZE, DEFAULT_LINE_HEIGHT_PERCENT, DEFAULT_PLACEHOLDER, DEFAULT_TEMPLATE, TEXT_PADDING_X,
};
use crate::descriptor::{combination_count, DescriptorConfig, DescriptorTemplate};
use crate::error::ConfigError;
use crate::metrics::FontSpec;
use crate::types::Color;
use serde::{Deserialize, Serialize};

/// Hue step between consecutive palette entries, in degrees.
const GOLDEN_ANGLE: f32 = 137.507_77;

/// Everything the user can configure about an annotation session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    /// Descriptor template, e.g. `"SD~;SG~"`
    pub template: String,
    /// Placeholder character inside the template
    pub placeholder: char,
    /// Values an editable segment may take
    pub allowed_values: Vec<String>,
    /// `#RRGGBB[AA]` colors: the default, then one per value combination
    pub colors: Vec<String>,
    /// Dimension labels written to `.lct` files; derived from the template when empty
    pub labels: Vec<String>,
    /// Name of the LCT dimension being analyzed
    pub dimension: String,
    /// Point size of the annotated text
    pub font_size: f32,
    /// Line height in percent of the row height
    pub line_height_percent: f32,
    /// Horizontal padding of the text block
    pub padding_x: f32,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        let allowed_values: Vec<String> = ["++", "+", "-", "--"].iter().map(|s| s.to_string()).collect();
        let segments = DescriptorTemplate::parse(DEFAULT_TEMPLATE, DEFAULT_PLACEHOLDER)
            .map(|t| t.segment_count())
            .unwrap_or(1);
        let colors = default_palette(allowed_values.len(), segments)
            .map(|palette| palette.iter().map(Color::to_hex).collect())
            .unwrap_or_default();
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            placeholder: DEFAULT_PLACEHOLDER,
            allowed_values,
            colors,
            labels: vec!["SD".to_string(), "SG".to_string()],
            dimension: "Semantics".to_string(),
            font_size: DEFAULT_FONT_SIZE,
            line_height_percent: DEFAULT_LINE_HEIGHT_PERCENT,
            padding_x: TEXT_PADDING_X,
        }
    }
}

impl AnnotatorConfig {
    /// Validates the descriptor settings.
    pub fn descriptor_config(&self) -> Result<DescriptorConfig, ConfigError> {
        let palette = self
            .colors
            .iter()
            .map(|hex| Color::from_hex(hex).ok_or_else(|| ConfigError::InvalidColor(hex.clone())))
            .collect::<Result<Vec<_>, _>>()?;
        DescriptorConfig::new(
            &self.template,
            self.placeholder,
            self.allowed_values.clone(),
            &palette,
            self.labels.clone(),
        )
    }

    /// Font used for the annotated text.
    pub fn font(&self) -> FontSpec {
        FontSpec::new(self.font_size, self.line_height_percent)
    }

    /// Regenerates the palette for the current values and template.
    pub fn regenerate_palette(&mut self) -> Result<(), ConfigError> {
        let segments = DescriptorTemplate::parse(&self.template, self.placeholder)?.segment_count();
        self.colors = default_palette(self.allowed_values.len(), segments)?
            .iter()
            .map(Color::to_hex)
            .collect();
        Ok(())
    }
}

/// A palette with the untagged grey followed by one translucent color per
/// value combination, hues spread by the golden angle.
pub fn default_palette(values: usize, segments: usize) -> Result<Vec<Color>, ConfigError> {
    let combinations = combination_count(values, segments)?;
    Ok(std::iter::once(Color::UNTAGGED)
        .chain((0..combinations).map(|i| {
            let hue = (i as f32 * GOLDEN_ANGLE) % 360.0;
            let (r, g, b) = hsv_to_rgb(hue, 0.55, 0.95);
            Color::rgba(r, g, b, 140)
        }))
        .collect())
}

/// Converts HSV (hue in degrees) to 8-bit RGB.
fn hsv_to_rgb(h: f32, s: f32, v: f32) -> (u8, u8, u8) {
    let h = h.rem_euclid(360.0);
    let c = v * s;
    let x = c * (1.0 - ((h / 60.0) % 2.0 - 1.0).abs());
    let m = v - c;
    let (r, g, b) = match (h / 60.0) as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    (
        ((r + m) * 255.0).round() as u8,
        ((g + m) * 255.0).round() as u8,
        ((b + m) * 255.0).round() as u8,
    )
}
