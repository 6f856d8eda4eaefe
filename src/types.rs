//! Core data types shared by the layout engine, the overlays and the UI shell.
//!
//! The gap grid produced by [`crate::text_flow::layout`] is the single source of
//! geometry: separators snap to it, spans and badges are derived from it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use uuid::Uuid;

/// Unique identifier for separators.
pub type SeparatorId = Uuid;

/// A discrete attachment point between two fragments of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gap {
    /// Horizontal position of the gap in scene units
    pub x: f32,
    /// The fragment immediately following this gap (empty at a line end)
    pub following_word: String,
    /// Whether the following fragment is glued to the next one (no space between)
    pub is_continuation: bool,
    /// Horizontal position where the following fragment's glyphs start
    pub word_x: f32,
}

/// One visual line of the layout: its vertical center and ordered gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapLine {
    /// Vertical center of the line strip
    pub y: f32,
    /// Gaps ordered left to right, including the line start and line end
    pub gaps: Vec<Gap>,
    /// Whether the line ends with an explicit line break
    pub hard_break: bool,
}

/// Position of a gap in the grid.
///
/// Ordering is line first, then gap within the line, which matches the
/// top-to-bottom, left-to-right reading order of the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridPos {
    /// Index of the line
    pub line: usize,
    /// Index of the gap within the line
    pub gap: usize,
}

impl GridPos {
    /// Creates a new grid position.
    pub const fn new(line: usize, gap: usize) -> Self {
        Self { line, gap }
    }
}

/// An axis-aligned rectangle in scene coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneRect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width of the rectangle
    pub width: f32,
    /// Height of the rectangle
    pub height: f32,
}

impl SceneRect {
    /// Creates a rectangle from its top-left corner and size.
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Horizontal center of the rectangle.
    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }

    /// Whether the point lies inside the rectangle, edges included.
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// An sRGB color with alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red channel
    pub r: u8,
    /// Green channel
    pub g: u8,
    /// Blue channel
    pub b: u8,
    /// Alpha channel
    pub a: u8,
}

impl Color {
    /// Neutral grey used for untagged clauses.
    pub const UNTAGGED: Color = Color::rgba(200, 200, 200, 110);

    /// Creates a color from its four channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parses `#RRGGBB` or `#RRGGBBAA`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(digits.get(i..i + 2)?, 16).ok();
        match digits.len() {
            6 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Formats the color as `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }
}

/// The full layout: ordered lines of gaps plus the calibrated vertical metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapGrid {
    /// Lines ordered top to bottom
    pub lines: Vec<GapLine>,
    /// Height of one line strip (span rectangles and separator lines)
    pub strip_height: f32,
    /// Distance between the centers of two consecutive lines
    pub line_pitch: f32,
}

impl GapGrid {
    /// Number of lines in the grid.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// First position of the text.
    pub fn first(&self) -> GridPos {
        GridPos::new(0, 0)
    }

    /// Last position of the text.
    pub fn last(&self) -> GridPos {
        let line = self.lines.len().saturating_sub(1);
        GridPos::new(line, self.last_gap_of(line))
    }

    /// Index of the last gap of a line.
    pub fn last_gap_of(&self, line: usize) -> usize {
        self.lines
            .get(line)
            .map(|l| l.gaps.len().saturating_sub(1))
            .unwrap_or(0)
    }

    /// Returns the gap at `pos`.
    ///
    /// # Panics
    ///
    /// Panics if `pos` lies outside the grid.
    pub fn gap(&self, pos: GridPos) -> &Gap {
        &self.lines[pos.line].gaps[pos.gap]
    }

    /// Returns whether `pos` addresses an existing gap.
    pub fn contains(&self, pos: GridPos) -> bool {
        self.lines
            .get(pos.line)
            .is_some_and(|line| pos.gap < line.gaps.len())
    }

    /// Scene coordinates `(x, y)` of the gap at `pos`.
    pub fn point(&self, pos: GridPos) -> (f32, f32) {
        (self.gap(pos).x, self.lines[pos.line].y)
    }

    /// The position following `pos` in reading order.
    pub fn next(&self, pos: GridPos) -> Option<GridPos> {
        if pos.gap < self.last_gap_of(pos.line) {
            Some(GridPos::new(pos.line, pos.gap + 1))
        } else if pos.line + 1 < self.lines.len() {
            Some(GridPos::new(pos.line + 1, 0))
        } else {
            None
        }
    }

    /// The position preceding `pos` in reading order.
    pub fn prev(&self, pos: GridPos) -> Option<GridPos> {
        if pos.gap > 0 {
            Some(GridPos::new(pos.line, pos.gap - 1))
        } else if pos.line > 0 {
            Some(GridPos::new(pos.line - 1, self.last_gap_of(pos.line - 1)))
        } else {
            None
        }
    }

    /// Last gap of a line that is not the last line.
    pub fn is_line_end(&self, pos: GridPos) -> bool {
        pos.line + 1 < self.lines.len() && pos.gap == self.last_gap_of(pos.line)
    }

    /// First gap of a line that is not the first line.
    pub fn is_line_start(&self, pos: GridPos) -> bool {
        pos.line > 0 && pos.gap == 0
    }

    /// Whether `pos` sits on a line-wrap boundary and thus has a twin face.
    pub fn is_border(&self, pos: GridPos) -> bool {
        self.is_line_end(pos) || self.is_line_start(pos)
    }

    /// The other face of a border position.
    pub fn twin(&self, pos: GridPos) -> Option<GridPos> {
        if self.is_line_end(pos) {
            Some(GridPos::new(pos.line + 1, 0))
        } else if self.is_line_start(pos) {
            Some(GridPos::new(pos.line - 1, self.last_gap_of(pos.line - 1)))
        } else {
            None
        }
    }

    /// Canonical key of a position: both faces of a border map to the line end.
    pub fn logical(&self, pos: GridPos) -> GridPos {
        if self.is_line_start(pos) {
            GridPos::new(pos.line - 1, self.last_gap_of(pos.line - 1))
        } else {
            pos
        }
    }

    /// Compares two positions ignoring which face of a border they use.
    pub fn logical_cmp(&self, a: GridPos, b: GridPos) -> Ordering {
        self.logical(a).cmp(&self.logical(b))
    }

    /// Earlier face of a position (the line end for a border).
    pub fn left_face(&self, pos: GridPos) -> GridPos {
        self.logical(pos)
    }

    /// Later face of a position (the next line's start for a border).
    pub fn right_face(&self, pos: GridPos) -> GridPos {
        if self.is_line_end(pos) {
            GridPos::new(pos.line + 1, 0)
        } else {
            pos
        }
    }

    /// Snaps a scene point to the nearest gap: nearest line first, then nearest x.
    pub fn nearest(&self, x: f32, y: f32) -> GridPos {
        let line = nearest_index(self.lines.iter().map(|l| l.y), y).unwrap_or(0);
        let gap = self
            .lines
            .get(line)
            .and_then(|l| nearest_index(l.gaps.iter().map(|g| g.x), x))
            .unwrap_or(0);
        GridPos::new(line, gap)
    }

    /// Snaps a scene point to the nearest gap strictly between `lower` and `upper`.
    ///
    /// Returns `None` when the open range contains no gap.
    pub fn nearest_within(&self, x: f32, y: f32, lower: GridPos, upper: GridPos) -> Option<GridPos> {
        let first_line = lower.line;
        let last_line = upper.line.min(self.lines.len().saturating_sub(1));
        let candidates = |line: usize| {
            self.lines[line]
                .gaps
                .iter()
                .enumerate()
                .filter(move |(gap, _)| {
                    let pos = GridPos::new(line, *gap);
                    pos > lower && pos < upper
                })
        };

        let line = nearest_index(
            (first_line..=last_line).map(|line| {
                if candidates(line).next().is_some() {
                    self.lines[line].y
                } else {
                    f32::INFINITY
                }
            }),
            y,
        )
        .map(|offset| first_line + offset)?;

        let mut best: Option<(usize, f32)> = None;
        for (gap, g) in candidates(line) {
            let distance = (g.x - x).abs();
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((gap, distance));
            }
        }
        best.map(|(gap, _)| GridPos::new(line, gap))
    }

    /// Iterates over every position from `start` (inclusive) to `end` (exclusive).
    pub fn positions_between(&self, start: GridPos, end: GridPos) -> impl Iterator<Item = GridPos> + '_ {
        std::iter::successors(Some(start), move |pos| self.next(*pos)).take_while(move |pos| *pos < end)
    }

    /// Gaps carrying a fragment between `start` (inclusive) and `end` (exclusive).
    pub fn fragments_between(&self, start: GridPos, end: GridPos) -> Vec<&Gap> {
        self.positions_between(start, end)
            .map(|pos| self.gap(pos))
            .filter(|gap| !gap.following_word.is_empty())
            .collect()
    }

    /// Every position whose gap carries a fragment, in reading order, followed by the last position.
    ///
    /// Line ends of wrapped lines are skipped since their twin (the next line start)
    /// carries the fragment.
    pub fn word_positions(&self) -> Vec<GridPos> {
        let mut out: Vec<GridPos> = self
            .positions_between(self.first(), self.last())
            .filter(|pos| !self.gap(*pos).following_word.is_empty())
            .collect();
        out.push(self.last());
        out
    }
}

/// Joins fragments with single spaces, except after continuation fragments.
pub fn join_fragments<'a>(gaps: impl IntoIterator<Item = &'a Gap>) -> String {
    let mut text = String::new();
    let mut glue = true;
    for gap in gaps {
        if !glue {
            text.push(' ');
        }
        text.push_str(&gap.following_word);
        glue = gap.is_continuation;
    }
    text
}

/// Index of the value closest to `target`; the first wins on ties.
fn nearest_index(values: impl Iterator<Item = f32>, target: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for (i, value) in values.enumerate() {
        let distance = (value - target).abs();
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}
