//! Editable descriptor badges, one per clause group.
//!
//! A badge interleaves the template's fixed text with the group's editable
//! values. Editing a badge propagates the new values to every badge of the
//! same group and reports an [`EditableTextChanged`] so the span overlay can
//! recolor that group.

use super::{group_rows, GroupLayout, GroupTracker};
use crate::constants::BADGE_OFFSET;
use crate::descriptor::{DescriptorConfig, DescriptorTemplate};
use crate::separator::Separator;
use crate::types::{GapGrid, GridPos, SeparatorId};

/// A descriptor badge.
#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    /// Fixed text around the editable segments
    pub non_editable: Vec<String>,
    /// Current value of each editable segment
    pub editable: Vec<String>,
    /// Segment that keyboard-style stepping acts on
    pub selected: usize,
    /// Whether the badge is drawn emphasized (hovered or being edited)
    pub highlighted: bool,
    /// Horizontal center and baseline of the badge in scene coordinates
    pub anchor: (f32, f32),
}

impl Descriptor {
    /// Full badge text, e.g. `"SD+;SG--"`.
    pub fn display_text(&self) -> String {
        let mut out = String::new();
        for (i, fixed) in self.non_editable.iter().enumerate() {
            out.push_str(fixed);
            if let Some(value) = self.editable.get(i) {
                out.push_str(value);
            }
        }
        out
    }

    /// Whether every segment holds a real value.
    pub fn is_complete(&self, template: &DescriptorTemplate) -> bool {
        self.editable.iter().all(|value| !template.is_placeholder(value))
    }
}

/// Notification that a group's descriptor values changed.
#[derive(Debug, Clone, PartialEq)]
pub struct EditableTextChanged {
    /// Group whose values changed
    pub group: usize,
    /// New values, one per editable segment
    pub values: Vec<String>,
}

/// Builds the single badge of a group above its middle row.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorLayout {
    template: DescriptorTemplate,
}

impl GroupLayout for DescriptorLayout {
    type Item = Descriptor;

    fn build(&self, grid: &GapGrid, start: GridPos, end: GridPos, seed: Option<&Descriptor>) -> Vec<Descriptor> {
        let rows = group_rows(grid, start, end);
        let anchor = rows
            .get(rows.len() / 2)
            .map_or((0.0, 0.0), |row| (row.center_x(), row.y - BADGE_OFFSET));
        let badge = match seed {
            Some(seed) => Descriptor {
                anchor,
                ..seed.clone()
            },
            None => Descriptor {
                non_editable: self.template.non_editable.clone(),
                editable: self.template.untagged(),
                selected: 0,
                highlighted: false,
                anchor,
            },
        };
        vec![badge]
    }
}

/// Descriptor overlay engine.
#[derive(Debug, Clone)]
pub struct DescriptorOverlayEngine {
    tracker: GroupTracker<DescriptorLayout>,
}

impl DescriptorOverlayEngine {
    /// Creates an overlay producing untagged badges for `template`.
    pub fn new(template: DescriptorTemplate) -> Self {
        Self {
            tracker: GroupTracker::new(DescriptorLayout { template }),
        }
    }

    fn template(&self) -> &DescriptorTemplate {
        &self.tracker.layout().template
    }

    /// Every badge in reading order.
    pub fn descriptors(&self) -> &[Descriptor] {
        self.tracker.items()
    }

    /// First badge of `group`.
    pub fn group_descriptor(&self, group: usize) -> Option<&Descriptor> {
        self.tracker.group_items(group).first()
    }

    /// Group owning badge `item`.
    pub fn group_of_item(&self, item: usize) -> Option<usize> {
        self.tracker.group_of_item(item)
    }

    /// Rebuilds one untagged badge per group.
    pub fn reset(&mut self, grid: &GapGrid, separators: &[Separator]) {
        self.tracker.reset(grid, separators);
    }

    /// See [`GroupTracker::on_separator_position_changed`].
    pub fn on_separator_position_changed(
        &mut self,
        grid: &GapGrid,
        separators: &[Separator],
        id: SeparatorId,
        new_pos: GridPos,
    ) {
        self.tracker.on_separator_position_changed(grid, separators, id, new_pos);
    }

    /// See [`GroupTracker::on_separator_clicked_on_border`].
    pub fn on_separator_clicked_on_border(
        &mut self,
        grid: &GapGrid,
        separators: &[Separator],
        id: SeparatorId,
        new_pos: GridPos,
    ) -> Option<usize> {
        self.tracker.on_separator_clicked_on_border(grid, separators, id, new_pos)
    }

    /// See [`GroupTracker::on_separator_removed`].
    pub fn on_separator_removed(&mut self, grid: &GapGrid, separators: &[Separator], id: SeparatorId) -> Option<usize> {
        self.tracker.on_separator_removed(grid, separators, id)
    }

    /// Writes `values` into badge `item` and every other badge of its group.
    ///
    /// Returns `None` when the item does not exist or a value is not allowed.
    pub fn text_changed(
        &mut self,
        item: usize,
        values: Vec<String>,
        config: &DescriptorConfig,
    ) -> Option<EditableTextChanged> {
        if values.len() != self.template().segment_count() || !values.iter().all(|v| config.accepts(v)) {
            log::debug!("rejected descriptor values {values:?}");
            return None;
        }
        let group = self.tracker.group_of_item(item)?;
        let range = self.tracker.group_range(group);
        for badge in &mut self.tracker.items_mut()[range] {
            badge.editable = values.clone();
        }
        Some(EditableTextChanged { group, values })
    }

    /// Sets the values of `group` through its first badge.
    pub fn set_group_values(
        &mut self,
        group: usize,
        values: Vec<String>,
        config: &DescriptorConfig,
    ) -> Option<EditableTextChanged> {
        let item = self.tracker.group_range(group).start;
        if group >= self.tracker.group_count() {
            return None;
        }
        self.text_changed(item, values, config)
    }

    /// Steps one segment of `group` to the next allowed value, wrapping through
    /// the placeholder.
    pub fn cycle_segment(&mut self, group: usize, segment: usize, config: &DescriptorConfig) -> Option<EditableTextChanged> {
        let badge = self.group_descriptor(group)?;
        let current = badge.editable.get(segment)?;
        let position = config.allowed_values.iter().position(|v| v == current);
        let next = match position {
            None => config.allowed_values.first()?.clone(),
            Some(i) if i + 1 < config.allowed_values.len() => config.allowed_values[i + 1].clone(),
            Some(_) => config.template.placeholder.to_string(),
        };
        let mut values = badge.editable.clone();
        values[segment] = next;
        self.select_segment(group, segment);
        self.set_group_values(group, values, config)
    }

    /// Marks `segment` as the selected one in every badge of `group`.
    pub fn select_segment(&mut self, group: usize, segment: usize) {
        let range = self.tracker.group_range(group);
        for badge in &mut self.tracker.items_mut()[range] {
            badge.selected = segment.min(badge.editable.len().saturating_sub(1));
        }
    }

    /// Highlights the badges of `group` and clears every other highlight.
    pub fn set_highlighted(&mut self, group: Option<usize>) {
        let range = group.map(|g| self.tracker.group_range(g));
        for (i, badge) in self.tracker.items_mut().iter_mut().enumerate() {
            badge.highlighted = range.as_ref().is_some_and(|r| r.contains(&i));
        }
    }

    /// Whether the descriptor of `group` has no placeholder left.
    pub fn is_complete(&self, group: usize) -> bool {
        self.group_descriptor(group)
            .is_some_and(|badge| badge.is_complete(self.template()))
    }

    /// Whether every group is fully tagged.
    pub fn all_complete(&self) -> bool {
        (0..self.tracker.group_count()).all(|group| self.is_complete(group))
    }

    /// Whether the overlay mirrors `separators`.
    pub fn is_synced(&self, separators: &[Separator]) -> bool {
        self.tracker.is_synced(separators)
    }
}
