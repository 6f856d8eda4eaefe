//! The annotation canvas model.
//!
//! [`Classifier`] owns the gap grid, the separators and both overlays. Every
//! separator mutation is followed by [`Classifier::dispatch`], which replays
//! the queued [`SeparatorEvent`]s on the span overlay first and on the
//! descriptor overlay second. The UI shell only ever talks to this type.

use crate::config::AnnotatorConfig;
use crate::constants::{
    BADGE_FONT_RATIO, SEPARATOR_HIT_TOLERANCE, SEPARATOR_WIDTH, SPAN_CORNER_RADIUS, SUPER_SEPARATOR_WIDTH,
};
use crate::descriptor::DescriptorConfig;
use crate::error::ConfigError;
use crate::metrics::{FontMetrics, FontSpec};
use crate::overlay::descriptors::{Descriptor, DescriptorOverlayEngine, EditableTextChanged};
use crate::overlay::group_faces;
use crate::overlay::spans::SpanOverlayEngine;
use crate::relayout::RelayoutScheduler;
use crate::separator::{Separator, SeparatorEngine, SeparatorEvent};
use crate::text_flow::{layout, tokenize, FlowSettings};
use crate::tree::{Clause, ClauseTree, SuperClause};
use crate::types::{join_fragments, Color, Gap, GapGrid, GridPos, SceneRect};
use std::time::{Duration, Instant};

/// Outcome of loading a clause tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeUpload {
    /// The tree matched the template and was applied
    pub valid: bool,
    /// Every clause carries a full descriptor
    pub complete: bool,
}

/// One drawing primitive, in scene coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderItem {
    /// Clause highlight behind the text
    Span {
        /// Rectangle to fill
        rect: SceneRect,
        /// Corner radius
        radius: f32,
        /// Fill color
        color: Color,
    },
    /// A text fragment, left aligned at `x` and vertically centered on `y`
    Word {
        /// Left edge of the glyphs
        x: f32,
        /// Vertical center of the line
        y: f32,
        /// Fragment text
        text: String,
        /// Font size
        size: f32,
    },
    /// A vertical separator stroke
    SeparatorLine {
        /// Horizontal position
        x: f32,
        /// Top of the stroke
        top: f32,
        /// Length of the stroke
        height: f32,
        /// Stroke width
        width: f32,
        /// Whether the separator bounds a super-clause
        is_super: bool,
    },
    /// Descriptor badge above a clause
    Badge {
        /// Text bounds
        rect: SceneRect,
        /// Badge text
        text: String,
        /// Font size
        size: f32,
        /// No placeholder left
        complete: bool,
        /// Emphasized
        highlighted: bool,
    },
}

/// Words and descriptor values of one group, used to re-plant separators.
#[derive(Debug, Clone, PartialEq)]
struct GroupSnapshot {
    fragments: Vec<String>,
    values: Vec<String>,
}

/// The annotation model behind the canvas.
#[derive(Debug)]
pub struct Classifier {
    config: DescriptorConfig,
    font: FontSpec,
    settings: FlowSettings,
    scene_width: f32,
    text: String,
    grid: GapGrid,
    separators: SeparatorEngine,
    spans: SpanOverlayEngine,
    descriptors: DescriptorOverlayEngine,
    relayout: RelayoutScheduler,
    changed: bool,
}

impl Classifier {
    /// Creates a classifier with empty text.
    ///
    /// # Arguments
    ///
    /// * `config` - Descriptor and font settings
    /// * `scene_width` - Width of the canvas, padding included
    /// * `metrics` - Measurement service for the current font
    ///
    /// # Returns
    ///
    /// The classifier, or the reason the descriptor settings were refused
    pub fn new(config: &AnnotatorConfig, scene_width: f32, metrics: &dyn FontMetrics) -> Result<Self, ConfigError> {
        let descriptors = config.descriptor_config()?;
        let settings = FlowSettings {
            max_width: content_width(scene_width, config.padding_x),
            padding_x: config.padding_x,
        };
        let font = config.font();
        let grid = layout("", metrics, &font, &settings);
        let mut classifier = Self {
            spans: SpanOverlayEngine::new(descriptors.colors.default_color()),
            descriptors: DescriptorOverlayEngine::new(descriptors.template.clone()),
            config: descriptors,
            font,
            settings,
            scene_width,
            text: String::new(),
            grid,
            separators: SeparatorEngine::new(),
            relayout: RelayoutScheduler::default(),
            changed: false,
        };
        classifier.reset_to_bounds();
        Ok(classifier)
    }

    /// Validated descriptor settings.
    pub fn config(&self) -> &DescriptorConfig {
        &self.config
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current gap grid.
    pub fn grid(&self) -> &GapGrid {
        &self.grid
    }

    /// Separators in reading order.
    pub fn separators(&self) -> &[Separator] {
        self.separators.separators()
    }

    /// Span overlay.
    pub fn spans(&self) -> &SpanOverlayEngine {
        &self.spans
    }

    /// Descriptor overlay.
    pub fn descriptors(&self) -> &DescriptorOverlayEngine {
        &self.descriptors
    }

    /// Font of the annotated text.
    pub fn font(&self) -> FontSpec {
        self.font
    }

    /// Number of clause groups.
    pub fn group_count(&self) -> usize {
        self.separators.len().saturating_sub(1)
    }

    /// Width of the scene, padding included.
    pub fn scene_width(&self) -> f32 {
        self.scene_width
    }

    /// Height needed to show every line.
    pub fn scene_height(&self) -> f32 {
        self.grid
            .lines
            .last()
            .map_or(self.grid.line_pitch, |line| line.y + self.grid.line_pitch)
    }

    /// Whether the analysis changed since the last load or save.
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Clears the dirty flag.
    pub fn mark_saved(&mut self) {
        self.changed = false;
    }

    /// Replaces the text and resets to a single untagged clause.
    pub fn set_text(&mut self, text: &str, metrics: &dyn FontMetrics) {
        if let Some(width) = self.relayout.flush() {
            self.apply_width(width);
        }
        self.text = text.to_string();
        self.grid = layout(&self.text, metrics, &self.font, &self.settings);
        self.reset_to_bounds();
        self.changed = true;
        log::info!("text set: {} lines", self.grid.line_count());
    }

    /// Changes the font size and re-flows, keeping the clause grouping.
    pub fn set_text_size(&mut self, size: f32, metrics: &dyn FontMetrics) {
        self.font = self.font.with_size(size);
        self.reflow(metrics);
    }

    /// Changes the scene width and re-flows immediately, keeping the grouping.
    pub fn set_width(&mut self, scene_width: f32, metrics: &dyn FontMetrics) {
        self.relayout.flush();
        self.apply_width(scene_width);
        self.reflow(metrics);
    }

    /// Records a resize; the re-flow happens once resizing settles.
    pub fn request_width(&mut self, scene_width: f32, now: Instant) {
        if (scene_width - self.scene_width).abs() < 0.5 && !self.relayout.is_pending() {
            return;
        }
        self.relayout.request(scene_width, now);
    }

    /// Runs a pending re-flow whose quiet period is over.
    ///
    /// Returns `true` when the layout changed.
    pub fn poll_relayout(&mut self, now: Instant, metrics: &dyn FontMetrics) -> bool {
        match self.relayout.poll(now) {
            Some(width) => {
                self.apply_width(width);
                self.reflow(metrics);
                true
            }
            None => false,
        }
    }

    /// Time until a waiting resize is re-flowed, if one is waiting.
    pub fn relayout_remaining(&self, now: Instant) -> Option<Duration> {
        self.relayout.remaining(now)
    }

    fn apply_width(&mut self, scene_width: f32) {
        self.scene_width = scene_width;
        self.settings.max_width = content_width(scene_width, self.settings.padding_x);
    }

    fn reset_to_bounds(&mut self) {
        self.separators.reset_bounds(&self.grid);
        let separators = self.separators.separators();
        self.spans.reset(&self.grid, separators);
        self.descriptors.reset(&self.grid, separators);
    }

    /// Re-lays out the text and re-plants the separators by content.
    fn reflow(&mut self, metrics: &dyn FontMetrics) {
        let (groups, supers) = self.snapshot();
        self.grid = layout(&self.text, metrics, &self.font, &self.settings);
        self.reset_to_bounds();
        if !self.restore(&groups, &supers) {
            log::warn!("could not restore {} clauses after re-flow", groups.len());
            self.reset_to_bounds();
        }
        log::debug!(
            "re-flowed to width {} ({} lines, {} groups)",
            self.settings.max_width,
            self.grid.line_count(),
            self.group_count()
        );
    }

    fn snapshot(&self) -> (Vec<GroupSnapshot>, Vec<bool>) {
        let separators = self.separators.separators();
        let groups = separators
            .windows(2)
            .enumerate()
            .map(|(group, pair)| {
                let (start, end) = group_faces(&self.grid, &pair[0], &pair[1]);
                GroupSnapshot {
                    fragments: self
                        .grid
                        .fragments_between(start, end)
                        .into_iter()
                        .map(|gap| gap.following_word.clone())
                        .collect(),
                    values: self
                        .descriptors
                        .group_descriptor(group)
                        .map_or_else(|| self.config.template.untagged(), |d| d.editable.clone()),
                }
            })
            .collect();
        let supers = separators
            .iter()
            .skip(1)
            .take(separators.len().saturating_sub(2))
            .map(|sep| sep.is_super)
            .collect();
        (groups, supers)
    }

    /// Plants one separator after each group's fragments, then writes back the
    /// descriptor values. Expects the grid to hold only its bounds.
    fn restore(&mut self, groups: &[GroupSnapshot], supers: &[bool]) -> bool {
        let positions = self.grid.word_positions();
        let words = positions.len() - 1;
        let mut cursor = 0;
        let mut boundaries = Vec::with_capacity(groups.len().saturating_sub(1));
        for (index, group) in groups.iter().enumerate() {
            let end = cursor + group.fragments.len();
            if end > words {
                return false;
            }
            let matches = positions[cursor..end]
                .iter()
                .zip(&group.fragments)
                .all(|(pos, fragment)| self.grid.gap(*pos).following_word == *fragment);
            if !matches {
                return false;
            }
            cursor = end;
            if index + 1 < groups.len() {
                boundaries.push(positions[cursor]);
            }
        }
        if cursor != words {
            return false;
        }

        for (pos, is_super) in boundaries.into_iter().zip(supers.iter().copied()) {
            if !self.separators.insert_at(&self.grid, pos, is_super) {
                return false;
            }
            self.dispatch();
        }
        for (group, snapshot) in groups.iter().enumerate() {
            if let Some(change) = self
                .descriptors
                .set_group_values(group, snapshot.values.clone(), &self.config)
            {
                self.spans.on_editable_text_changed(change.group, &change.values, &self.config);
            }
        }
        true
    }

    /// Replays queued separator events on the spans, then on the descriptors.
    fn dispatch(&mut self) {
        for event in self.separators.drain_events() {
            let separators = self.separators.separators();
            match event {
                SeparatorEvent::Created { id, position, .. } | SeparatorEvent::Moved { id, to: position, .. } => {
                    self.spans.on_separator_position_changed(&self.grid, separators, id, position);
                    self.descriptors.on_separator_position_changed(&self.grid, separators, id, position);
                }
                SeparatorEvent::BorderFlipped { id, to, .. } => {
                    let merged = self.spans.on_separator_clicked_on_border(&self.grid, separators, id, to);
                    self.descriptors.on_separator_clicked_on_border(&self.grid, separators, id, to);
                    if let Some(group) = merged {
                        recolor(&mut self.spans, &self.descriptors, &self.config, group);
                    }
                }
                SeparatorEvent::Removed { id, .. } => {
                    let merged = self.spans.on_separator_removed(&self.grid, separators, id);
                    self.descriptors.on_separator_removed(&self.grid, separators, id);
                    if let Some(group) = merged {
                        recolor(&mut self.spans, &self.descriptors, &self.config, group);
                    }
                }
                SeparatorEvent::SuperChanged { id, is_super } => {
                    log::trace!("separator {id} super flag set to {is_super}");
                }
            }
        }
        debug_assert!(self.is_synced(), "overlays desynchronized from separators");
    }

    /// Whether both overlays mirror the separator list.
    pub fn is_synced(&self) -> bool {
        let separators = self.separators.separators();
        self.separators.check_invariants(&self.grid)
            && self.spans.is_synced(separators)
            && self.descriptors.is_synced(separators)
            && self.spans.group_count() == self.group_count()
            && self.descriptors.descriptors().len() == self.group_count()
    }

    /// Splits the clause at the gap nearest to `(x, y)`.
    pub fn split(&mut self, x: f32, y: f32) -> bool {
        let done = self.separators.add_separator(&self.grid, x, y, false);
        self.after_edit(done)
    }

    /// Joins the two clauses around the separator nearest to `(x, y)`.
    pub fn join(&mut self, x: f32, y: f32) -> bool {
        let done = self.separators.delete_separator(&self.grid, x, y);
        self.after_edit(done)
    }

    /// Makes the separator nearest to `(x, y)` a super-clause boundary.
    pub fn promote_separator(&mut self, x: f32, y: f32) -> bool {
        let done = self.separators.promote_separator(&self.grid, x, y);
        self.after_edit(done)
    }

    /// Turns the super separator nearest to `(x, y)` back into a plain one.
    pub fn demote_separator(&mut self, x: f32, y: f32) -> bool {
        let done = self.separators.demote_separator(&self.grid, x, y);
        self.after_edit(done)
    }

    fn after_edit(&mut self, done: bool) -> bool {
        if done {
            self.dispatch();
            self.changed = true;
        }
        done
    }

    /// Whether [`Self::split`] would succeed at `(x, y)`.
    pub fn can_split(&self, x: f32, y: f32) -> bool {
        self.separators.len() >= 2
            && self
                .separators
                .find_free_point(&self.grid, self.grid.nearest(x, y))
                .is_some()
    }

    /// Whether [`Self::join`] would succeed at `(x, y)`.
    pub fn can_join(&self, x: f32, y: f32) -> bool {
        self.occupied(x, y).is_some_and(|sep| !sep.is_static)
    }

    /// Whether [`Self::promote_separator`] would succeed at `(x, y)`.
    pub fn can_promote(&self, x: f32, y: f32) -> bool {
        self.occupied(x, y).is_some_and(|sep| !sep.is_super)
    }

    /// Whether [`Self::demote_separator`] would succeed at `(x, y)`.
    pub fn can_demote(&self, x: f32, y: f32) -> bool {
        self.occupied(x, y).is_some_and(|sep| sep.is_super && !sep.is_static)
    }

    fn occupied(&self, x: f32, y: f32) -> Option<&Separator> {
        match self.separators.point_is_occupied(&self.grid, x, y) {
            (true, index) => self.separators.separators().get(index),
            (false, _) => None,
        }
    }

    /// Separator face under the pointer, as `(index, face)`.
    pub fn separator_at(&self, x: f32, y: f32) -> Option<(usize, GridPos)> {
        self.separators
            .separator_at(&self.grid, x, y, SEPARATOR_HIT_TOLERANCE)
    }

    /// Handles a press on separator `index`; a press on the duplicate face of
    /// a border separator makes that face canonical.
    pub fn press_separator(&mut self, index: usize, x: f32, y: f32) -> bool {
        let done = self.separators.click_border_face(&self.grid, index, x, y);
        if done {
            self.dispatch();
        }
        done
    }

    /// Drags separator `index` toward `(x, y)` inside its sub-range.
    pub fn drag_separator(&mut self, index: usize, x: f32, y: f32) -> bool {
        let done = self.separators.move_separator(&self.grid, index, x, y).is_some();
        self.after_edit(done)
    }

    /// Group whose text contains the gap nearest to `(x, y)`.
    pub fn group_at(&self, x: f32, y: f32) -> Option<usize> {
        let (_, index) = self.separators.point_is_occupied(&self.grid, x, y);
        (self.group_count() > 0).then(|| index.min(self.group_count() - 1))
    }

    /// Group whose badge is under `(x, y)`.
    pub fn descriptor_at(&self, x: f32, y: f32, metrics: &dyn FontMetrics) -> Option<usize> {
        let item = self
            .descriptors
            .descriptors()
            .iter()
            .position(|badge| self.badge_rect(badge, metrics).contains(x, y))?;
        self.descriptors.group_of_item(item)
    }

    /// Sets the descriptor values of `group` and recolors its spans.
    pub fn set_descriptor_values(&mut self, group: usize, values: Vec<String>) -> bool {
        let change = self.descriptors.set_group_values(group, values, &self.config);
        self.apply_descriptor_change(change)
    }

    /// Steps one segment of the descriptor of `group` to the next value.
    pub fn cycle_descriptor_segment(&mut self, group: usize, segment: usize) -> bool {
        let change = self.descriptors.cycle_segment(group, segment, &self.config);
        self.apply_descriptor_change(change)
    }

    fn apply_descriptor_change(&mut self, change: Option<EditableTextChanged>) -> bool {
        let Some(change) = change else {
            return false;
        };
        self.spans
            .on_editable_text_changed(change.group, &change.values, &self.config);
        self.changed = true;
        true
    }

    /// Highlights the badge of `group`, or none.
    pub fn set_highlighted_group(&mut self, group: Option<usize>) {
        self.descriptors.set_highlighted(group);
    }

    /// Extracts the clause tree from the current separators and descriptors.
    pub fn analyzed_tree(&self) -> ClauseTree {
        let separators = self.separators.separators();
        let mut tree = ClauseTree::default();
        if separators.len() < 2 || !self.has_words() {
            return tree;
        }

        let mut clauses = Vec::new();
        let mut fragments: Vec<&Gap> = Vec::new();
        let mut group = 0;
        let mut next = 1;
        for pos in self.grid.positions_between(self.grid.first(), self.grid.last()) {
            while next + 1 < separators.len() && self.grid.logical_cmp(pos, separators[next].position).is_ge() {
                clauses.push(self.clause(group, std::mem::take(&mut fragments)));
                if separators[next].is_super {
                    tree.super_clauses.push(SuperClause::new(std::mem::take(&mut clauses)));
                }
                group += 1;
                next += 1;
            }
            let gap = self.grid.gap(pos);
            if !gap.following_word.is_empty() {
                fragments.push(gap);
            }
        }
        clauses.push(self.clause(group, fragments));
        tree.super_clauses.push(SuperClause::new(clauses));
        tree
    }

    fn has_words(&self) -> bool {
        !self.grid.fragments_between(self.grid.first(), self.grid.last()).is_empty()
    }

    fn clause(&self, group: usize, fragments: Vec<&Gap>) -> Clause {
        let tag = self.descriptors.group_descriptor(group).map_or_else(
            || self.config.template.render(&self.config.template.untagged()),
            Descriptor::display_text,
        );
        Clause {
            text: join_fragments(fragments),
            tag,
        }
    }

    /// Loads a clause tree: sets the text, plants the clause and super-clause
    /// boundaries and writes every descriptor.
    ///
    /// An empty tree clears the text.
    pub fn set_analyzed_tree(&mut self, tree: &ClauseTree, metrics: &dyn FontMetrics) -> TreeUpload {
        if tree.super_clauses.is_empty() {
            self.set_text("", metrics);
            self.changed = false;
            return TreeUpload {
                valid: true,
                complete: true,
            };
        }
        let invalid = TreeUpload {
            valid: false,
            complete: false,
        };
        let mut groups = Vec::with_capacity(tree.clause_count());
        let mut supers = Vec::new();
        let mut texts = Vec::new();
        for super_clause in &tree.super_clauses {
            if super_clause.clauses.is_empty() {
                return invalid;
            }
            for (index, clause) in super_clause.clauses.iter().enumerate() {
                let Some(values) = self
                    .config
                    .template
                    .parse_tag(&clause.tag, &self.config.allowed_values)
                else {
                    log::warn!("clause tag {:?} does not match the template", clause.tag);
                    return invalid;
                };
                let fragments: Vec<String> = tokenize(&clause.text)
                    .into_iter()
                    .flatten()
                    .map(|fragment| fragment.text)
                    .collect();
                if fragments.is_empty() {
                    log::warn!("empty clause in analysis tree");
                    return invalid;
                }
                if !groups.is_empty() {
                    supers.push(index == 0);
                }
                groups.push(GroupSnapshot { fragments, values });
                texts.push(clause.text.trim());
            }
        }
        if groups.is_empty() {
            return invalid;
        }

        self.set_text(&texts.join(" "), metrics);
        if !self.restore(&groups, &supers) {
            self.reset_to_bounds();
            return invalid;
        }
        self.changed = false;
        TreeUpload {
            valid: true,
            complete: self.descriptors.all_complete(),
        }
    }

    /// Text bounds of a badge.
    pub fn badge_rect(&self, badge: &Descriptor, metrics: &dyn FontMetrics) -> SceneRect {
        let font = self.badge_font();
        let width = metrics.text_width(&badge.display_text(), &font);
        let height = metrics.row_height(&font);
        let (x, y) = badge.anchor;
        SceneRect::new(x - width / 2.0, y - height, width, height)
    }

    fn badge_font(&self) -> FontSpec {
        self.font.with_size(self.font.size * BADGE_FONT_RATIO)
    }

    /// Everything to draw, back to front.
    pub fn render_list(&self, metrics: &dyn FontMetrics) -> Vec<RenderItem> {
        let mut items: Vec<RenderItem> = self
            .spans
            .spans()
            .iter()
            .map(|span| RenderItem::Span {
                rect: span.rect,
                radius: SPAN_CORNER_RADIUS,
                color: span.color,
            })
            .collect();

        for line in &self.grid.lines {
            items.extend(
                line.gaps
                    .iter()
                    .filter(|gap| !gap.following_word.is_empty())
                    .map(|gap| RenderItem::Word {
                        x: gap.word_x,
                        y: line.y,
                        text: gap.following_word.clone(),
                        size: self.font.size,
                    }),
            );
        }

        let half = self.grid.strip_height / 2.0;
        for sep in self.separators.separators() {
            let faces = std::iter::once(sep.position).chain(self.grid.twin(sep.position));
            for face in faces {
                let (x, y) = self.grid.point(face);
                items.push(RenderItem::SeparatorLine {
                    x,
                    top: y - half,
                    height: self.grid.strip_height,
                    width: if sep.is_super {
                        SUPER_SEPARATOR_WIDTH
                    } else {
                        SEPARATOR_WIDTH
                    },
                    is_super: sep.is_super,
                });
            }
        }

        let badge_size = self.badge_font().size;
        for (item, badge) in self.descriptors.descriptors().iter().enumerate() {
            let complete = self
                .descriptors
                .group_of_item(item)
                .is_some_and(|group| self.descriptors.is_complete(group));
            items.push(RenderItem::Badge {
                rect: self.badge_rect(badge, metrics),
                text: badge.display_text(),
                size: badge_size,
                complete,
                highlighted: badge.highlighted,
            });
        }
        items
    }
}

/// Text width available inside the horizontal padding.
fn content_width(scene_width: f32, padding_x: f32) -> f32 {
    (scene_width - 2.0 * padding_x).max(1.0)
}

/// Re-applies the descriptor color of `group` to its spans.
fn recolor(spans: &mut SpanOverlayEngine, descriptors: &DescriptorOverlayEngine, config: &DescriptorConfig, group: usize) {
    if let Some(badge) = descriptors.group_descriptor(group) {
        spans.on_editable_text_changed(group, &badge.editable, config);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::MonospaceMetrics;
    use std::time::Duration;

    const SIX_WORDS: &str = "one two three four five six";

    fn config() -> AnnotatorConfig {
        AnnotatorConfig {
            font_size: 10.0,
            line_height_percent: 150.0,
            padding_x: 10.0,
            ..AnnotatorConfig::default()
        }
    }

    /// A classifier whose text area is `content` wide.
    fn classifier(text: &str, content: f32) -> Classifier {
        let metrics = MonospaceMetrics::default();
        let mut classifier = Classifier::new(&config(), content + 20.0, &metrics).unwrap();
        classifier.set_text(text, &metrics);
        classifier
    }

    fn clause_texts(classifier: &Classifier) -> Vec<String> {
        classifier.analyzed_tree().clauses().map(|c| c.text.clone()).collect()
    }

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_single_line_split_and_join() {
        let mut classifier = classifier("A B C D", 1000.0);
        assert_eq!(classifier.grid().line_count(), 1);

        assert!(classifier.split(45.0, 14.0));
        assert_eq!(classifier.group_count(), 2);
        assert_eq!(clause_texts(&classifier), strings(&["A B", "C D"]));

        assert!(classifier.join(45.0, 14.0));
        assert_eq!(classifier.group_count(), 1);
        assert_eq!(clause_texts(&classifier), strings(&["A B C D"]));
    }

    #[test]
    fn test_bounds_stay_pinned_through_edits() {
        let mut classifier = classifier(SIX_WORDS, 100.0);
        let grid_first = classifier.grid().first();
        let grid_last = classifier.grid().last();

        assert!(classifier.split(60.0, 14.0));
        assert!(classifier.split(10.0, 74.0));
        assert!(classifier.drag_separator(1, 65.0, 44.0));
        assert!(!classifier.join(10.0, 14.0));
        assert!(!classifier.demote_separator(90.0, 74.0));

        let separators = classifier.separators();
        assert_eq!(separators[0].position, grid_first);
        assert_eq!(separators[separators.len() - 1].position, grid_last);
        assert!(separators.first().is_some_and(|s| s.is_static && s.is_super));
        assert!(separators.last().is_some_and(|s| s.is_static && s.is_super));
        assert!(classifier.is_synced());
    }

    #[test]
    fn test_overlays_follow_every_mutation() {
        let mut classifier = classifier(SIX_WORDS, 100.0);
        let check = |c: &Classifier| {
            assert!(c.is_synced());
            assert_eq!(c.spans().group_count(), c.separators().len() - 1);
            assert_eq!(c.descriptors().descriptors().len(), c.separators().len() - 1);
        };

        check(&classifier);
        assert!(classifier.split(60.0, 14.0));
        check(&classifier);
        assert!(classifier.split(65.0, 44.0));
        check(&classifier);
        assert!(classifier.promote_separator(65.0, 44.0));
        check(&classifier);
        assert!(classifier.drag_separator(1, 10.0, 44.0));
        check(&classifier);
        assert!(classifier.demote_separator(65.0, 44.0));
        check(&classifier);
        assert!(classifier.join(65.0, 44.0));
        check(&classifier);
        assert_eq!(classifier.group_count(), 2);
    }

    #[test]
    fn test_reflow_round_trip_keeps_grouping() {
        let metrics = MonospaceMetrics::default();
        let mut classifier = classifier(SIX_WORDS, 100.0);
        assert!(classifier.split(10.0, 44.0));
        assert!(classifier.split(10.0, 74.0));
        assert!(classifier.promote_separator(10.0, 74.0));
        assert!(classifier.set_descriptor_values(1, strings(&["+", "--"])));
        let before = classifier.analyzed_tree();
        assert_eq!(clause_texts(&classifier), strings(&["one two", "three four", "five six"]));

        classifier.set_width(220.0, &metrics);
        assert_eq!(classifier.grid().line_count(), 2);
        assert_eq!(classifier.group_count(), 3);
        classifier.set_width(120.0, &metrics);

        assert_eq!(classifier.grid().line_count(), 3);
        assert_eq!(classifier.analyzed_tree(), before);
        assert!(classifier.is_synced());
    }

    #[test]
    fn test_text_size_change_keeps_grouping() {
        let metrics = MonospaceMetrics::default();
        let mut classifier = classifier(SIX_WORDS, 100.0);
        assert!(classifier.split(60.0, 14.0));
        let before = clause_texts(&classifier);

        classifier.set_text_size(5.0, &metrics);
        assert_eq!(classifier.grid().line_count(), 2);
        assert_eq!(clause_texts(&classifier), before);
    }

    #[test]
    fn test_tree_round_trip() {
        let metrics = MonospaceMetrics::default();
        let mut classifier = classifier("", 100.0);
        let clause = |text: &str, tag: &str| Clause {
            text: text.to_string(),
            tag: tag.to_string(),
        };
        let tree = ClauseTree {
            super_clauses: vec![
                SuperClause::new(vec![clause("one two", "SD+;SG--"), clause("three four", "SD~;SG~")]),
                SuperClause::new(vec![clause("five six", "SD++;SG++")]),
            ],
        };

        let upload = classifier.set_analyzed_tree(&tree, &metrics);
        assert_eq!(
            upload,
            TreeUpload {
                valid: true,
                complete: false
            }
        );
        assert_eq!(classifier.text(), SIX_WORDS);
        assert_eq!(classifier.analyzed_tree(), tree);
        assert!(!classifier.is_changed());
    }

    #[test]
    fn test_tree_with_unknown_tag_is_invalid() {
        let metrics = MonospaceMetrics::default();
        let mut classifier = classifier("", 100.0);
        let tree = ClauseTree {
            super_clauses: vec![SuperClause::new(vec![Clause {
                text: "one".to_string(),
                tag: "XX+".to_string(),
            }])],
        };
        assert!(!classifier.set_analyzed_tree(&tree, &metrics).valid);
        let hollow = ClauseTree {
            super_clauses: vec![SuperClause::new(Vec::new())],
        };
        assert!(!classifier.set_analyzed_tree(&hollow, &metrics).valid);
    }

    #[test]
    fn test_empty_text_round_trips_as_empty_tree() {
        let metrics = MonospaceMetrics::default();
        let mut classifier = classifier(SIX_WORDS, 100.0);
        assert!(classifier.split(60.0, 14.0));

        classifier.set_text("   ", &metrics);
        let tree = classifier.analyzed_tree();
        assert!(tree.is_empty());
        assert_eq!(tree, ClauseTree::default());

        classifier.set_text(SIX_WORDS, &metrics);
        let upload = classifier.set_analyzed_tree(&tree, &metrics);
        assert!(upload.valid);
        assert_eq!(classifier.text(), "");
        assert_eq!(classifier.group_count(), 1);
        assert!(classifier.analyzed_tree().is_empty());
        assert!(!classifier.is_changed());
    }

    #[test]
    fn test_border_separator_answers_on_both_faces() {
        let mut classifier = classifier(SIX_WORDS, 100.0);
        assert!(classifier.split(110.0, 14.0));

        let grid = classifier.grid().clone();
        let sep = classifier.separators()[1].clone();
        assert!(sep.is_on_border(&grid));
        assert_eq!(sep.complete_pos(&grid, true), GridPos::new(0, 2));
        assert_eq!(sep.complete_pos(&grid, false), GridPos::new(1, 0));

        // Dragging onto the next line's first gap keeps the same logical slot.
        assert!(classifier.drag_separator(1, 10.0, 44.0));
        assert!(classifier.can_join(110.0, 14.0));
        assert!(classifier.can_join(10.0, 44.0));
        assert_eq!(classifier.separator_at(108.0, 14.0), Some((1, GridPos::new(0, 2))));
        assert_eq!(clause_texts(&classifier), strings(&["one two", "three four five six"]));
    }

    #[test]
    fn test_pressing_duplicate_face_flips_it() {
        let mut classifier = classifier(SIX_WORDS, 100.0);
        assert!(classifier.split(110.0, 14.0));
        assert!(classifier.press_separator(1, 10.0, 44.0));
        assert_eq!(classifier.separators()[1].position, GridPos::new(1, 0));
        assert!(classifier.is_synced());
    }

    #[test]
    fn test_descriptor_values_pick_the_combination_color() {
        let mut classifier = classifier(SIX_WORDS, 100.0);
        assert!(classifier.set_descriptor_values(0, strings(&["+", "--"])));

        let expected = classifier.config().colors.lookup("0+1--");
        assert_ne!(expected, classifier.config().colors.default_color());
        assert!(classifier.spans().spans().iter().all(|s| s.color == expected));
        assert!(!classifier.set_descriptor_values(0, strings(&["?", "--"])));
    }

    #[test]
    fn test_split_group_starts_untagged_and_join_keeps_left() {
        let mut classifier = classifier(SIX_WORDS, 100.0);
        assert!(classifier.set_descriptor_values(0, strings(&["+", "+"])));
        assert!(classifier.split(65.0, 44.0));

        let tags: Vec<String> = classifier.analyzed_tree().clauses().map(|c| c.tag.clone()).collect();
        assert_eq!(tags, strings(&["SD+;SG+", "SD~;SG~"]));
        let default = classifier.config().colors.default_color();
        assert!(classifier.spans().group_spans(1).iter().all(|s| s.color == default));

        assert!(classifier.join(65.0, 44.0));
        let tags: Vec<String> = classifier.analyzed_tree().clauses().map(|c| c.tag.clone()).collect();
        assert_eq!(tags, strings(&["SD+;SG+"]));
    }

    #[test]
    fn test_capability_queries_mirror_operations() {
        let mut classifier = classifier(SIX_WORDS, 100.0);
        assert!(classifier.can_split(60.0, 14.0));
        assert!(!classifier.can_join(60.0, 14.0));
        assert!(!classifier.can_join(10.0, 14.0));
        assert!(!classifier.can_demote(10.0, 14.0));

        assert!(classifier.split(60.0, 14.0));
        assert!(classifier.can_join(60.0, 14.0));
        assert!(classifier.can_promote(60.0, 14.0));
        assert!(!classifier.can_demote(60.0, 14.0));
        assert!(!classifier.can_split(90.0, 74.0));
    }

    #[test]
    fn test_debounced_width_change() {
        let metrics = MonospaceMetrics::default();
        let mut classifier = classifier(SIX_WORDS, 100.0);
        let start = Instant::now();

        classifier.request_width(240.0, start);
        assert_eq!(
            classifier.relayout_remaining(start + Duration::from_millis(100)),
            Some(Duration::from_millis(400))
        );
        assert!(!classifier.poll_relayout(start + Duration::from_millis(100), &metrics));
        assert_eq!(classifier.grid().line_count(), 3);
        assert!(classifier.poll_relayout(start + Duration::from_millis(600), &metrics));
        assert_eq!(classifier.grid().line_count(), 2);
    }

    #[test]
    fn test_set_text_flushes_pending_width() {
        let metrics = MonospaceMetrics::default();
        let mut classifier = classifier(SIX_WORDS, 100.0);
        classifier.request_width(240.0, Instant::now());
        classifier.set_text(SIX_WORDS, &metrics);

        assert_eq!(classifier.relayout_remaining(Instant::now()), None);
        assert_eq!(classifier.scene_width(), 240.0);
        assert_eq!(classifier.grid().line_count(), 2);
    }

    #[test]
    fn test_render_list_contents() {
        let metrics = MonospaceMetrics::default();
        let mut classifier = classifier(SIX_WORDS, 100.0);
        assert!(classifier.split(110.0, 14.0));
        let items = classifier.render_list(&metrics);

        let words = items.iter().filter(|i| matches!(i, RenderItem::Word { .. })).count();
        let spans = items.iter().filter(|i| matches!(i, RenderItem::Span { .. })).count();
        let lines = items.iter().filter(|i| matches!(i, RenderItem::SeparatorLine { .. })).count();
        let badges = items.iter().filter(|i| matches!(i, RenderItem::Badge { .. })).count();
        assert_eq!(words, 6);
        assert_eq!(spans, 3);
        // Two bounds plus both faces of the border separator.
        assert_eq!(lines, 4);
        assert_eq!(badges, 2);
    }

    #[test]
    fn test_descriptor_hit_test() {
        let metrics = MonospaceMetrics::default();
        let classifier = classifier(SIX_WORDS, 100.0);
        let badge = &classifier.descriptors().descriptors()[0];
        let rect = classifier.badge_rect(badge, &metrics);

        assert_eq!(classifier.descriptor_at(rect.center_x(), rect.y + 1.0, &metrics), Some(0));
        assert_eq!(classifier.descriptor_at(rect.x - 5.0, rect.y, &metrics), None);
    }
}
