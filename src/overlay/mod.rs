//! Overlays that attach visual items to the groups between separators.
//!
//! A group is the run of text between two consecutive separators. Each overlay
//! keeps a flat list of payload items (span rectangles, descriptor badges) and
//! a [`GroupTracker`] that records, per separator, where its group's items
//! start in that list. Separator events are replayed on the tracker so that
//! items are rebuilt only for the groups an event touches.

pub mod descriptors;
pub mod spans;

use crate::separator::Separator;
use crate::types::{GapGrid, GridPos, SceneRect, SeparatorId};
use std::ops::Range;

/// Builds the payload items of one group.
pub trait GroupLayout {
    /// Item type stored in the flat list
    type Item: Clone;

    /// Builds the items of the group running from `start` to `end`.
    ///
    /// `seed` is the first item the group had before the rebuild, if any; it
    /// carries state such as color or descriptor values across geometry changes.
    /// The returned list must not be empty.
    fn build(&self, grid: &GapGrid, start: GridPos, end: GridPos, seed: Option<&Self::Item>) -> Vec<Self::Item>;
}

/// Per-separator bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    /// Separator that opens the group
    pub separator: SeparatorId,
    /// Index of the group's first item in the flat list
    pub item_index: usize,
    /// Last position observed for the separator
    pub last_pos: GridPos,
}

/// Flat item list indexed by group.
///
/// Entries mirror the separator list one to one: entry `g` opens group `g`
/// and the final entry (the closing bound) owns no items. Its `item_index` is
/// always the length of the item list.
#[derive(Debug, Clone)]
pub struct GroupTracker<L: GroupLayout> {
    layout: L,
    items: Vec<L::Item>,
    groups: Vec<GroupEntry>,
}

impl<L: GroupLayout> GroupTracker<L> {
    /// Creates an empty tracker.
    pub fn new(layout: L) -> Self {
        Self {
            layout,
            items: Vec::new(),
            groups: Vec::new(),
        }
    }

    /// The layout used to build items.
    pub fn layout(&self) -> &L {
        &self.layout
    }

    /// Every item in reading order.
    pub fn items(&self) -> &[L::Item] {
        &self.items
    }

    /// Mutable access to the items; the group structure is left unchanged.
    pub fn items_mut(&mut self) -> &mut [L::Item] {
        &mut self.items
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.groups.len().saturating_sub(1)
    }

    /// Item range of group `group`.
    pub fn group_range(&self, group: usize) -> Range<usize> {
        match (self.groups.get(group), self.groups.get(group + 1)) {
            (Some(open), Some(close)) => open.item_index..close.item_index,
            _ => 0..0,
        }
    }

    /// Items of group `group`.
    pub fn group_items(&self, group: usize) -> &[L::Item] {
        &self.items[self.group_range(group)]
    }

    /// Discards everything and rebuilds one group per pair of separators.
    pub fn reset(&mut self, grid: &GapGrid, separators: &[Separator]) {
        self.items.clear();
        self.groups.clear();
        for (index, sep) in separators.iter().enumerate() {
            self.groups.push(GroupEntry {
                separator: sep.id,
                item_index: self.items.len(),
                last_pos: sep.position,
            });
            if let Some(next) = separators.get(index + 1) {
                let (start, end) = group_faces(grid, sep, next);
                let built = self.layout.build(grid, start, end, None);
                self.items.extend(built);
            }
        }
    }

    /// Replaces the items of every group, keeping each group's seed.
    pub fn rebuild_all(&mut self, grid: &GapGrid, separators: &[Separator]) {
        for group in 0..self.group_count() {
            self.rebuild_group(grid, separators, group);
        }
    }

    /// Reacts to a separator appearing at or moving to `new_pos`.
    ///
    /// An unknown separator splits the group that contains `new_pos`; a known
    /// one rebuilds the two groups on either side of it.
    pub fn on_separator_position_changed(
        &mut self,
        grid: &GapGrid,
        separators: &[Separator],
        id: SeparatorId,
        new_pos: GridPos,
    ) {
        let Some(entry) = self.entry_of(id) else {
            self.add_separator_group(grid, separators, id, new_pos);
            return;
        };
        // A move always grows one flanking group and shrinks the other.
        log::trace!("group boundary {id} moved from {:?} to {new_pos:?}", self.groups[entry].last_pos);
        self.groups[entry].last_pos = new_pos;
        if entry > 0 {
            self.rebuild_group(grid, separators, entry - 1);
        }
        self.rebuild_group(grid, separators, entry);
    }

    /// Splits the group that geometrically contains `new_pos`.
    fn add_separator_group(&mut self, grid: &GapGrid, separators: &[Separator], id: SeparatorId, new_pos: GridPos) {
        let key = grid.logical(new_pos);
        let split = self
            .groups
            .partition_point(|entry| grid.logical(entry.last_pos) < key)
            .saturating_sub(1);
        let Some(index) = separators.iter().position(|s| s.id == id) else {
            log::warn!("separator {id} is not in the separator list");
            return;
        };
        debug_assert_eq!(split + 1, index, "tracker and separator list disagree");
        if index == 0 || index + 1 >= separators.len() {
            return;
        }

        let range = self.group_range(split);
        let seed = self.items.get(range.start).cloned();
        let (left_start, left_end) = group_faces(grid, &separators[index - 1], &separators[index]);
        let (right_start, right_end) = group_faces(grid, &separators[index], &separators[index + 1]);
        let left = self.layout.build(grid, left_start, left_end, seed.as_ref());
        let right = self.layout.build(grid, right_start, right_end, None);

        let split_at = range.start + left.len();
        let added = left.len() + right.len();
        let removed = range.len();
        self.items.splice(range, left.into_iter().chain(right));
        self.groups.insert(
            split + 1,
            GroupEntry {
                separator: id,
                item_index: split_at,
                last_pos: new_pos,
            },
        );
        self.shift_after(split + 1, added as isize - removed as isize);
    }

    /// Reacts to a border separator switching faces.
    ///
    /// Only a switch from the line end to the next line's start is tracked: the
    /// preceding group is rebuilt and returned so its owner can re-emit its text
    /// and color. The opposite switch is ignored and leaves `last_pos` as is.
    pub fn on_separator_clicked_on_border(
        &mut self,
        grid: &GapGrid,
        separators: &[Separator],
        id: SeparatorId,
        new_pos: GridPos,
    ) -> Option<usize> {
        let entry = self.entry_of(id)?;
        let old = self.groups[entry].last_pos;
        if !grid.is_line_end(old) || grid.twin(old) != Some(new_pos) {
            log::trace!("ignoring face switch of {id} from {old:?} to {new_pos:?}");
            return None;
        }
        self.groups[entry].last_pos = new_pos;
        let merged = entry.checked_sub(1)?;
        self.rebuild_group(grid, separators, merged);
        self.rebuild_group(grid, separators, entry);
        Some(merged)
    }

    /// Merges the two groups around a removed separator into the left one.
    ///
    /// Returns the index of the merged group.
    pub fn on_separator_removed(&mut self, grid: &GapGrid, separators: &[Separator], id: SeparatorId) -> Option<usize> {
        let entry = self.entry_of(id)?;
        let merged = entry.checked_sub(1)?;
        let start = self.groups[merged].item_index;
        let end = self.groups.get(entry + 1).map_or(self.items.len(), |e| e.item_index);
        let seed = self.items.get(start).cloned();

        let (open, close) = (separators.get(merged)?, separators.get(merged + 1)?);
        let (group_start, group_end) = group_faces(grid, open, close);
        let rebuilt = self.layout.build(grid, group_start, group_end, seed.as_ref());

        let added = rebuilt.len();
        self.items.splice(start..end, rebuilt);
        self.groups.remove(entry);
        self.shift_after(merged, added as isize - (end - start) as isize);
        Some(merged)
    }

    /// Group containing item `item`, or `None` past the end.
    ///
    /// Exponential search for an upper bound followed by a binary search.
    pub fn group_of_item(&self, item: usize) -> Option<usize> {
        if item >= self.items.len() || self.groups.is_empty() {
            return None;
        }
        let count = self.groups.len();
        let mut bound = 1;
        while bound < count && self.groups[bound].item_index <= item {
            bound *= 2;
        }
        let low = bound / 2;
        let high = bound.min(count);
        let offset = self.groups[low..high].partition_point(|entry| entry.item_index <= item);
        Some(low + offset - 1)
    }

    /// Whether the tracker mirrors `separators` and its ranges are consistent.
    pub fn is_synced(&self, separators: &[Separator]) -> bool {
        if self.groups.len() != separators.len() {
            return false;
        }
        let ids_match = self.groups.iter().zip(separators).all(|(entry, sep)| entry.separator == sep.id);
        let starts_at_zero = self.groups.first().is_some_and(|entry| entry.item_index == 0);
        let ends_at_len = self.groups.last().is_some_and(|entry| entry.item_index == self.items.len());
        let non_empty = self.groups.windows(2).all(|pair| pair[0].item_index < pair[1].item_index);
        ids_match && starts_at_zero && ends_at_len && non_empty
    }

    fn entry_of(&self, id: SeparatorId) -> Option<usize> {
        self.groups.iter().position(|entry| entry.separator == id)
    }

    fn rebuild_group(&mut self, grid: &GapGrid, separators: &[Separator], group: usize) {
        let (Some(open), Some(close)) = (separators.get(group), separators.get(group + 1)) else {
            return;
        };
        let range = self.group_range(group);
        let seed = self.items.get(range.start).cloned();
        let (start, end) = group_faces(grid, open, close);
        let rebuilt = self.layout.build(grid, start, end, seed.as_ref());
        let delta = rebuilt.len() as isize - range.len() as isize;
        self.items.splice(range, rebuilt);
        self.shift_after(group, delta);
    }

    /// Moves the item start of every entry after `entry` by `delta`.
    fn shift_after(&mut self, entry: usize, delta: isize) {
        if delta == 0 {
            return;
        }
        for later in self.groups.iter_mut().skip(entry + 1) {
            later.item_index = (later.item_index as isize + delta) as usize;
        }
    }
}

/// First and last position of the group between two consecutive separators.
pub fn group_faces(grid: &GapGrid, open: &Separator, close: &Separator) -> (GridPos, GridPos) {
    (grid.right_face(open.position), grid.left_face(close.position))
}

/// One rectangle per line covered by the group from `start` to `end`.
pub fn group_rows(grid: &GapGrid, start: GridPos, end: GridPos) -> Vec<SceneRect> {
    let half = grid.strip_height / 2.0;
    (start.line..=end.line.min(grid.line_count().saturating_sub(1)))
        .map(|line| {
            let row = &grid.lines[line];
            let left = if line == start.line {
                grid.gap(start).x
            } else {
                row.gaps.first().map_or(0.0, |g| g.x)
            };
            let right = if line == end.line {
                grid.gap(end).x
            } else {
                row.gaps.last().map_or(left, |g| g.x)
            };
            SceneRect::new(left, row.y - half, (right - left).max(0.0), grid.strip_height)
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::metrics::{FontSpec, MonospaceMetrics};
    use crate::separator::SeparatorEngine;
    use crate::text_flow::{layout, FlowSettings};
    use crate::types::GapGrid;

    /// Three lines: "one two" / "three four" / "five six".
    pub fn grid() -> GapGrid {
        layout(
            "one two three four five six",
            &MonospaceMetrics::default(),
            &FontSpec::new(10.0, 150.0),
            &FlowSettings {
                max_width: 100.0,
                padding_x: 10.0,
            },
        )
    }

    pub fn bounded(grid: &GapGrid) -> SeparatorEngine {
        let mut engine = SeparatorEngine::new();
        let (fx, fy) = grid.point(grid.first());
        let (lx, ly) = grid.point(grid.last());
        engine.add_separator(grid, fx, fy, true);
        engine.add_separator(grid, lx, ly, true);
        engine
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::{bounded, grid};
    use super::*;
    use crate::separator::{SeparatorEngine, SeparatorEvent};

    /// Items are the rows of a group, tagged with a counter taken from the seed.
    #[derive(Debug, Clone, Copy, PartialEq)]
    struct RowLayout;

    impl GroupLayout for RowLayout {
        type Item = (SceneRect, u32);

        fn build(&self, grid: &GapGrid, start: GridPos, end: GridPos, seed: Option<&Self::Item>) -> Vec<Self::Item> {
            let tag = seed.map_or(0, |(_, tag)| *tag);
            group_rows(grid, start, end).into_iter().map(|r| (r, tag)).collect()
        }
    }

    fn replay(tracker: &mut GroupTracker<RowLayout>, grid: &GapGrid, engine: &mut SeparatorEngine) {
        for event in engine.drain_events() {
            match event {
                SeparatorEvent::Created { id, position, .. } => {
                    tracker.on_separator_position_changed(grid, engine.separators(), id, position)
                }
                SeparatorEvent::Moved { id, to, .. } => {
                    tracker.on_separator_position_changed(grid, engine.separators(), id, to)
                }
                SeparatorEvent::BorderFlipped { id, to, .. } => {
                    tracker.on_separator_clicked_on_border(grid, engine.separators(), id, to);
                }
                SeparatorEvent::Removed { id, .. } => {
                    tracker.on_separator_removed(grid, engine.separators(), id);
                }
                SeparatorEvent::SuperChanged { .. } => {}
            }
        }
    }

    #[test]
    fn test_reset_builds_one_row_per_line() {
        let grid = grid();
        let engine = bounded(&grid);
        let mut tracker = GroupTracker::new(RowLayout);
        tracker.reset(&grid, engine.separators());

        assert_eq!(tracker.group_count(), 1);
        assert_eq!(tracker.items().len(), 3);
        assert!(tracker.is_synced(engine.separators()));
    }

    #[test]
    fn test_split_keeps_seed_on_the_left_group() {
        let grid = grid();
        let mut engine = bounded(&grid);
        let mut tracker = GroupTracker::new(RowLayout);
        tracker.reset(&grid, engine.separators());
        for item in tracker.items_mut() {
            item.1 = 7;
        }

        assert!(engine.insert_at(&grid, GridPos::new(1, 1), false));
        replay(&mut tracker, &grid, &mut engine);

        assert!(tracker.is_synced(engine.separators()));
        assert_eq!(tracker.group_count(), 2);
        // Left group: line 0 and the first half of line 1.
        let left = tracker.group_items(0);
        assert_eq!(left.len(), 2);
        assert!(left.iter().all(|(_, tag)| *tag == 7));
        assert_eq!(left[1].0.width, 55.0);
        // Right group: the rest of line 1 and line 2, unseeded.
        let right = tracker.group_items(1);
        assert_eq!(right.len(), 2);
        assert!(right.iter().all(|(_, tag)| *tag == 0));
        assert_eq!(right[0].0.x, 65.0);
    }

    #[test]
    fn test_group_starting_on_a_border_skips_the_empty_row() {
        let grid = grid();
        let mut engine = bounded(&grid);
        let mut tracker = GroupTracker::new(RowLayout);
        tracker.reset(&grid, engine.separators());

        assert!(engine.insert_at(&grid, GridPos::new(0, 2), false));
        replay(&mut tracker, &grid, &mut engine);

        assert_eq!(tracker.group_items(0).len(), 1);
        assert_eq!(tracker.group_items(1).len(), 2);
        assert_eq!(tracker.group_items(1)[0].0.x, 10.0);
    }

    #[test]
    fn test_move_rebuilds_both_neighbors() {
        let grid = grid();
        let mut engine = bounded(&grid);
        let mut tracker = GroupTracker::new(RowLayout);
        tracker.reset(&grid, engine.separators());
        assert!(engine.insert_at(&grid, GridPos::new(0, 1), false));
        replay(&mut tracker, &grid, &mut engine);

        assert!(engine.move_separator(&grid, 1, 65.0, 44.0).is_some());
        replay(&mut tracker, &grid, &mut engine);

        assert!(tracker.is_synced(engine.separators()));
        assert_eq!(tracker.group_items(0).len(), 2);
        assert_eq!(tracker.group_items(1).len(), 2);
    }

    #[test]
    fn test_remove_merges_into_left_group() {
        let grid = grid();
        let mut engine = bounded(&grid);
        let mut tracker = GroupTracker::new(RowLayout);
        tracker.reset(&grid, engine.separators());
        assert!(engine.insert_at(&grid, GridPos::new(1, 1), false));
        replay(&mut tracker, &grid, &mut engine);
        for item in tracker.items_mut()[..2].iter_mut() {
            item.1 = 3;
        }

        assert!(engine.delete_separator(&grid, 65.0, 44.0));
        replay(&mut tracker, &grid, &mut engine);

        assert!(tracker.is_synced(engine.separators()));
        assert_eq!(tracker.group_count(), 1);
        assert_eq!(tracker.items().len(), 3);
        assert!(tracker.items().iter().all(|(_, tag)| *tag == 3));
    }

    #[test]
    fn test_border_flip_is_tracked_in_one_direction_only() {
        let grid = grid();
        let mut engine = bounded(&grid);
        let mut tracker = GroupTracker::new(RowLayout);
        tracker.reset(&grid, engine.separators());
        assert!(engine.insert_at(&grid, GridPos::new(0, 2), false));
        replay(&mut tracker, &grid, &mut engine);
        let id = engine.separators()[1].id;

        let merged = tracker.on_separator_clicked_on_border(&grid, engine.separators(), id, GridPos::new(1, 0));
        assert_eq!(merged, Some(0));
        let back = tracker.on_separator_clicked_on_border(&grid, engine.separators(), id, GridPos::new(0, 2));
        assert_eq!(back, None);
        assert!(tracker.is_synced(engine.separators()));
    }

    #[test]
    fn test_group_of_item_across_many_groups() {
        let grid = grid();
        let mut engine = bounded(&grid);
        let mut tracker = GroupTracker::new(RowLayout);
        tracker.reset(&grid, engine.separators());
        for pos in [GridPos::new(0, 1), GridPos::new(1, 0), GridPos::new(1, 1), GridPos::new(2, 1)] {
            assert!(engine.insert_at(&grid, pos, false));
            replay(&mut tracker, &grid, &mut engine);
        }

        assert!(tracker.is_synced(engine.separators()));
        for group in 0..tracker.group_count() {
            for item in tracker.group_range(group) {
                assert_eq!(tracker.group_of_item(item), Some(group));
            }
        }
        assert_eq!(tracker.group_of_item(tracker.items().len()), None);
    }
}
