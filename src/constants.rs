//! Shared application-wide constants.
//! Centralizes tweakable values used across layout, overlays and UI interactions.

// Text flow
/// Characters after which a word may be split across lines.
pub const BREAK_CHARS: &[char] = &['-', '\u{2010}', '\u{2013}', '/'];
/// Horizontal padding (in scene units) before the first gap of every line.
pub const TEXT_PADDING_X: f32 = 10.0;
/// Default point size of the annotated text.
pub const DEFAULT_FONT_SIZE: f32 = 18.0;
/// Smallest text size offered by the toolbar.
pub const MIN_FONT_SIZE: f32 = 8.0;
/// Largest text size offered by the toolbar.
pub const MAX_FONT_SIZE: f32 = 48.0;
/// Default line height as a percentage of the font's row height.
pub const DEFAULT_LINE_HEIGHT_PERCENT: f32 = 250.0;
/// Probe text used when calibrating block heights.
pub const CALIBRATION_PROBE: &str = "Test";

// Separators
/// Stroke width of an ordinary separator line.
pub const SEPARATOR_WIDTH: f32 = 2.0;
/// Stroke width of a super-separator line.
pub const SUPER_SEPARATOR_WIDTH: f32 = 4.0;
/// Horizontal hit tolerance around a separator face (in scene units).
pub const SEPARATOR_HIT_TOLERANCE: f32 = 6.0;

// Overlays
/// Corner radius of clause span rectangles.
pub const SPAN_CORNER_RADIUS: f32 = 6.0;
/// Font size of descriptor badges relative to the text font size.
pub const BADGE_FONT_RATIO: f32 = 0.6;
/// Gap between the top of a span row and the badge baseline.
pub const BADGE_OFFSET: f32 = 2.0;

// Descriptors
/// Placeholder character marking an untagged editable segment.
pub const DEFAULT_PLACEHOLDER: char = '~';
/// Default composite descriptor template.
pub const DEFAULT_TEMPLATE: &str = "SD~;SG~";
/// Largest number of value combinations that get their own color.
pub const MAX_DESCRIPTOR_COMBINATIONS: usize = 1 << 16;

// Relayout
/// Quiet period after the last resize before the text is re-flowed.
pub const RELAYOUT_DEBOUNCE_MS: u64 = 500;
