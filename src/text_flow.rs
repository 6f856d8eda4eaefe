//! Justified line wrapping into a grid of discrete gaps.
//!
//! [`layout`] is a pure function of the text, the font metrics and the target
//! width. It breaks the text into fragments (words, further split after break
//! characters so long compounds can wrap), packs them greedily onto lines,
//! justifies every soft-wrapped line and records the x-position of every gap.

use crate::constants::BREAK_CHARS;
use crate::metrics::{calibrate, FontMetrics, FontSpec};
use crate::types::{Gap, GapGrid, GapLine};

/// Horizontal layout parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlowSettings {
    /// Width available to the text itself, excluding padding
    pub max_width: f32,
    /// Left padding before the first gap of each line
    pub padding_x: f32,
}

/// A fragment of a word, the unit of line packing.
#[derive(Debug, Clone, PartialEq)]
pub struct Fragment {
    /// Text of the fragment, including a trailing break character if any
    pub text: String,
    /// Whether the next fragment belongs to the same word
    pub continues: bool,
}

/// One paragraph (text between explicit line breaks) as fragments.
pub type Paragraph = Vec<Fragment>;

/// Splits text into paragraphs of fragments.
///
/// Empty paragraphs (consecutive line breaks, blank lines) are dropped.
pub fn tokenize(text: &str) -> Vec<Paragraph> {
    text.split('\n')
        .map(|paragraph| {
            paragraph
                .split_whitespace()
                .flat_map(split_word)
                .collect::<Paragraph>()
        })
        .filter(|paragraph| !paragraph.is_empty())
        .collect()
}

/// Splits a word after every break character that is not its last character.
fn split_word(word: &str) -> Vec<Fragment> {
    let mut fragments = Vec::new();
    let mut current = String::new();
    let mut chars = word.chars().peekable();
    while let Some(ch) = chars.next() {
        current.push(ch);
        if BREAK_CHARS.contains(&ch) && chars.peek().is_some() {
            fragments.push(Fragment {
                text: std::mem::take(&mut current),
                continues: true,
            });
        }
    }
    if !current.is_empty() {
        fragments.push(Fragment {
            text: current,
            continues: false,
        });
    }
    fragments
}

/// A packed line before gap positions are computed.
struct LineDraft {
    fragments: Vec<(Fragment, f32)>,
    hard_break: bool,
}

/// Lays out `text` into a justified grid of gaps.
///
/// The result always contains at least one line with at least two gaps, so the
/// first and last positions of the text are distinct.
pub fn layout(text: &str, metrics: &dyn FontMetrics, font: &FontSpec, settings: &FlowSettings) -> GapGrid {
    let calibration = calibrate(metrics, font);
    let space = metrics.text_width(" ", font);

    let mut drafts = Vec::new();
    for paragraph in tokenize(text) {
        pack_paragraph(paragraph, metrics, font, space, settings.max_width, &mut drafts);
    }
    if let Some(last) = drafts.last_mut() {
        last.hard_break = false;
    }

    let line_count = drafts.len();
    let mut lines: Vec<GapLine> = drafts
        .into_iter()
        .enumerate()
        .map(|(i, draft)| {
            let justify = !draft.hard_break && i + 1 < line_count;
            let y = calibration.padding_y + i as f32 * calibration.line_pitch + calibration.strip_height / 2.0;
            place_gaps(draft, y, space, justify, settings)
        })
        .collect();

    if lines.is_empty() {
        let empty = Gap {
            x: settings.padding_x,
            following_word: String::new(),
            is_continuation: false,
            word_x: settings.padding_x,
        };
        lines.push(GapLine {
            y: calibration.padding_y + calibration.strip_height / 2.0,
            gaps: vec![empty.clone(), empty],
            hard_break: false,
        });
    }

    log::debug!(
        "text flow: {} fragments on {} lines (max width {})",
        lines.iter().map(|l| l.gaps.len() - 1).sum::<usize>(),
        lines.len(),
        settings.max_width
    );

    GapGrid {
        lines,
        strip_height: calibration.strip_height,
        line_pitch: calibration.line_pitch,
    }
}

/// Greedily packs one paragraph; overflow breaks before the offending fragment.
fn pack_paragraph(
    paragraph: Paragraph,
    metrics: &dyn FontMetrics,
    font: &FontSpec,
    space: f32,
    max_width: f32,
    drafts: &mut Vec<LineDraft>,
) {
    let mut current: Vec<(Fragment, f32)> = Vec::new();
    let mut running = 0.0;
    for fragment in paragraph {
        let width = metrics.text_width(&fragment.text, font);
        let separation = match current.last() {
            None => 0.0,
            Some((prev, _)) if prev.continues => 0.0,
            Some(_) => space,
        };
        if !current.is_empty() && running + separation + width > max_width {
            drafts.push(LineDraft {
                fragments: std::mem::take(&mut current),
                hard_break: false,
            });
            running = width;
        } else {
            running += separation + width;
        }
        current.push((fragment, width));
    }
    if !current.is_empty() {
        drafts.push(LineDraft {
            fragments: current,
            hard_break: true,
        });
    }
}

/// Computes gap positions for one line, spreading slack over true spaces when justifying.
fn place_gaps(draft: LineDraft, y: f32, space: f32, justify: bool, settings: &FlowSettings) -> GapLine {
    let fragments = draft.fragments;
    let spaces = fragments
        .iter()
        .take(fragments.len().saturating_sub(1))
        .filter(|(f, _)| !f.continues)
        .count();
    let natural = fragments.iter().map(|(_, w)| w).sum::<f32>() + spaces as f32 * space;
    let slack = settings.max_width - natural;
    let extra = if justify && spaces > 0 && slack > 0.0 {
        slack / spaces as f32
    } else {
        0.0
    };

    let mut gaps = Vec::with_capacity(fragments.len() + 1);
    let mut cursor = settings.padding_x;
    gaps.push(Gap {
        x: cursor,
        following_word: fragments[0].0.text.clone(),
        is_continuation: fragments[0].0.continues,
        word_x: cursor,
    });
    for (i, (fragment, width)) in fragments.iter().enumerate() {
        cursor += width;
        let Some((next, _)) = fragments.get(i + 1) else {
            break;
        };
        let (x, word_x) = if fragment.continues {
            (cursor, cursor)
        } else {
            let stretched = space + extra;
            let x = cursor + stretched / 2.0;
            cursor += stretched;
            (x, cursor)
        };
        gaps.push(Gap {
            x,
            following_word: next.text.clone(),
            is_continuation: next.continues,
            word_x,
        });
    }
    gaps.push(Gap {
        x: cursor,
        following_word: String::new(),
        is_continuation: false,
        word_x: cursor,
    });

    GapLine {
        y,
        gaps,
        hard_break: draft.hard_break,
    }
}
