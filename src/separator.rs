//! Separator markers constrained to the gap grid.
//!
//! The engine owns the ordered list of separators. The first and last are the
//! paragraph bounds: static, always super, pinned to the first and last gap.
//! Every other separator lives strictly between its two neighbors and can only
//! be dragged inside that sub-range.
//!
//! A separator sitting on a line-wrap boundary (last gap of a line or first gap
//! of the next) exposes two faces. Both faces address the same logical
//! position, so lookups compare positions through [`GapGrid::logical`].
//!
//! Mutations never notify listeners directly; they queue [`SeparatorEvent`]s
//! that the owner drains and dispatches.

use crate::types::{GapGrid, GridPos, SeparatorId};
use uuid::Uuid;

/// A clause boundary marker.
#[derive(Debug, Clone, PartialEq)]
pub struct Separator {
    /// Stable identity across moves
    pub id: SeparatorId,
    /// Canonical position (one of the two faces when on a border)
    pub position: GridPos,
    /// Whether this separator also bounds a super-clause
    pub is_super: bool,
    /// Static separators cannot be dragged, deleted or demoted
    pub is_static: bool,
    /// Exclusive bounds of the positions this separator may move to
    pub subgrid: (GridPos, GridPos),
}

impl Separator {
    fn new(position: GridPos, is_super: bool, is_static: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            is_super,
            is_static,
            subgrid: (position, position),
        }
    }

    /// Whether the separator sits on a line-wrap boundary.
    pub fn is_on_border(&self, grid: &GapGrid) -> bool {
        grid.is_border(self.position)
    }

    /// Position of the requested face: the line end for the left face, the
    /// next line's start for the right face. Off a border both are the position.
    pub fn complete_pos(&self, grid: &GapGrid, left_face: bool) -> GridPos {
        if left_face {
            grid.left_face(self.position)
        } else {
            grid.right_face(self.position)
        }
    }
}

/// Notifications emitted by separator mutations.
#[derive(Debug, Clone, PartialEq)]
pub enum SeparatorEvent {
    /// A separator was inserted at `index`
    Created {
        /// Identity of the new separator
        id: SeparatorId,
        /// Index in the sorted list
        index: usize,
        /// Where it was placed
        position: GridPos,
    },
    /// A separator was dragged to a new gap
    Moved {
        /// Identity of the moved separator
        id: SeparatorId,
        /// Previous position
        from: GridPos,
        /// New position
        to: GridPos,
    },
    /// A border separator switched its canonical face
    BorderFlipped {
        /// Identity of the separator
        id: SeparatorId,
        /// Previous face
        from: GridPos,
        /// New face
        to: GridPos,
    },
    /// A separator was removed from `index`
    Removed {
        /// Identity of the removed separator
        id: SeparatorId,
        /// Index it occupied
        index: usize,
    },
    /// A separator was promoted or demoted
    SuperChanged {
        /// Identity of the separator
        id: SeparatorId,
        /// New super flag
        is_super: bool,
    },
}

/// Owner of the ordered separator list.
#[derive(Debug, Default)]
pub struct SeparatorEngine {
    separators: Vec<Separator>,
    events: Vec<SeparatorEvent>,
}

impl SeparatorEngine {
    /// Creates an engine without any separator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes every separator and pending event.
    pub fn clear(&mut self) {
        self.separators.clear();
        self.events.clear();
    }

    /// Replaces every separator with the two paragraph bounds of `grid`.
    pub fn reset_bounds(&mut self, grid: &GapGrid) {
        self.clear();
        self.insert_bound(grid, grid.first(), true);
        self.insert_bound(grid, grid.last(), true);
    }

    /// Separators in reading order.
    pub fn separators(&self) -> &[Separator] {
        &self.separators
    }

    /// Number of separators, bounds included.
    pub fn len(&self) -> usize {
        self.separators.len()
    }

    /// Whether no separator exists yet.
    pub fn is_empty(&self) -> bool {
        self.separators.is_empty()
    }

    /// Takes the queued events in emission order.
    pub fn drain_events(&mut self) -> Vec<SeparatorEvent> {
        std::mem::take(&mut self.events)
    }

    /// Adds a separator at the gap nearest to `(x, y)`.
    ///
    /// The first two separators establish the paragraph bounds and are inserted
    /// directly (always super). Later ones are placed on the first free gap at
    /// or after the requested point inside the enclosing group.
    pub fn add_separator(&mut self, grid: &GapGrid, x: f32, y: f32, is_static: bool) -> bool {
        let requested = grid.nearest(x, y);
        if self.separators.len() < 2 {
            return self.insert_bound(grid, requested, is_static);
        }
        match self.find_free_point(grid, requested) {
            Some(pos) => {
                let inserted = self.insert_at(grid, pos, false);
                if inserted && is_static {
                    if let Some(sep) = self.separators.iter_mut().find(|s| s.position == pos) {
                        sep.is_static = true;
                    }
                }
                inserted
            }
            None => {
                log::debug!("no free gap in the group around {requested:?}");
                false
            }
        }
    }

    fn insert_bound(&mut self, grid: &GapGrid, pos: GridPos, is_static: bool) -> bool {
        let (occupied, _) = self.locate(grid, pos);
        if occupied && !self.separators.is_empty() {
            return false;
        }
        let index = self
            .separators
            .partition_point(|s| grid.logical_cmp(s.position, pos).is_lt());
        self.separators.insert(index, Separator::new(pos, true, is_static));
        self.refresh_all_subgrids(grid);
        log::trace!("paragraph bound placed at {pos:?}");
        true
    }

    /// Inserts a separator at an exact grid position between the bounds.
    ///
    /// Fails when the position is outside the grid or already logically occupied.
    pub fn insert_at(&mut self, grid: &GapGrid, pos: GridPos, is_super: bool) -> bool {
        if self.separators.len() < 2 || !grid.contains(pos) {
            return false;
        }
        let (occupied, before) = self.locate(grid, pos);
        if occupied || before + 1 >= self.separators.len() {
            return false;
        }
        let index = before + 1;
        let separator = Separator::new(pos, is_super, false);
        let id = separator.id;
        self.separators.insert(index, separator);
        self.refresh_subgrids_around(grid, index);
        log::debug!("separator {id} created at {pos:?} (index {index})");
        self.events.push(SeparatorEvent::Created {
            id,
            index,
            position: pos,
        });
        true
    }

    /// Nearest unoccupied gap at or after `pos`, scanning in reading order but
    /// never past the right separator of the enclosing group.
    pub fn find_free_point(&self, grid: &GapGrid, pos: GridPos) -> Option<GridPos> {
        let (_, left) = self.locate(grid, pos);
        let right = self.separators.get(left + 1)?;
        let left_key = grid.logical(self.separators[left].position);
        let right_key = grid.logical(right.position);

        let mut candidate = pos;
        loop {
            let key = grid.logical(candidate);
            if key >= right_key {
                return None;
            }
            if key != left_key {
                return Some(candidate);
            }
            candidate = grid.next(candidate)?;
        }
    }

    /// Removes the separator at the gap nearest to `(x, y)`. Bounds are never removed.
    pub fn delete_separator(&mut self, grid: &GapGrid, x: f32, y: f32) -> bool {
        let (occupied, index) = self.point_is_occupied(grid, x, y);
        if !occupied || self.separators[index].is_static {
            return false;
        }
        let removed = self.separators.remove(index);
        self.refresh_subgrid(grid, index - 1);
        self.refresh_subgrid(grid, index);
        log::debug!("separator {} removed from index {index}", removed.id);
        self.events.push(SeparatorEvent::Removed {
            id: removed.id,
            index,
        });
        true
    }

    /// Marks the separator at `(x, y)` as a super-clause boundary.
    pub fn promote_separator(&mut self, grid: &GapGrid, x: f32, y: f32) -> bool {
        let (occupied, index) = self.point_is_occupied(grid, x, y);
        if !occupied || self.separators[index].is_super {
            return false;
        }
        self.set_super(index, true);
        true
    }

    /// Clears the super-clause flag of the separator at `(x, y)`.
    pub fn demote_separator(&mut self, grid: &GapGrid, x: f32, y: f32) -> bool {
        let (occupied, index) = self.point_is_occupied(grid, x, y);
        if !occupied || !self.separators[index].is_super || self.separators[index].is_static {
            return false;
        }
        self.set_super(index, false);
        true
    }

    fn set_super(&mut self, index: usize, is_super: bool) {
        let sep = &mut self.separators[index];
        sep.is_super = is_super;
        self.events.push(SeparatorEvent::SuperChanged { id: sep.id, is_super });
    }

    /// Resolves the separator at the gap nearest to `(x, y)`.
    ///
    /// Returns `(true, index)` when a separator occupies that gap through either
    /// face, otherwise `(false, index)` of the last separator strictly before it.
    pub fn point_is_occupied(&self, grid: &GapGrid, x: f32, y: f32) -> (bool, usize) {
        self.locate(grid, grid.nearest(x, y))
    }

    /// Same as [`Self::point_is_occupied`] for a grid position.
    ///
    /// Separators are sorted by logical position, so this is a binary search.
    pub fn locate(&self, grid: &GapGrid, pos: GridPos) -> (bool, usize) {
        let key = grid.logical(pos);
        let index = self
            .separators
            .partition_point(|s| grid.logical(s.position) < key);
        match self.separators.get(index) {
            Some(sep) if grid.logical(sep.position) == key => (true, index),
            _ => (false, index.saturating_sub(1)),
        }
    }

    /// Drags separator `index` toward `(x, y)`, snapping inside its own sub-range.
    ///
    /// Returns the new position when the separator actually moved.
    pub fn move_separator(&mut self, grid: &GapGrid, index: usize, x: f32, y: f32) -> Option<GridPos> {
        let sep = self.separators.get(index)?;
        if sep.is_static {
            return None;
        }
        let (lower, upper) = sep.subgrid;
        let target = grid.nearest_within(x, y, lower, upper)?;
        let from = sep.position;
        if target == from {
            return None;
        }
        let id = sep.id;
        self.separators[index].position = target;
        self.refresh_subgrids_around(grid, index);
        log::trace!("separator {id} moved {from:?} -> {target:?}");
        self.events.push(SeparatorEvent::Moved { id, from, to: target });
        Some(target)
    }

    /// Handles a press on the duplicate face of a border separator by making
    /// that face canonical.
    pub fn click_border_face(&mut self, grid: &GapGrid, index: usize, x: f32, y: f32) -> bool {
        let Some(sep) = self.separators.get(index) else {
            return false;
        };
        let Some(twin) = grid.twin(sep.position) else {
            return false;
        };
        if sep.is_static || grid.nearest(x, y) != twin {
            return false;
        }
        let (id, from) = (sep.id, sep.position);
        self.separators[index].position = twin;
        self.refresh_subgrids_around(grid, index);
        log::trace!("separator {id} flipped face {from:?} -> {twin:?}");
        self.events.push(SeparatorEvent::BorderFlipped { id, from, to: twin });
        true
    }

    /// Finds a separator face within `tolerance` of `(x, y)`.
    ///
    /// Returns the separator index and the face that was hit.
    pub fn separator_at(&self, grid: &GapGrid, x: f32, y: f32, tolerance: f32) -> Option<(usize, GridPos)> {
        let half_strip = grid.strip_height / 2.0;
        let hit = |pos: GridPos| {
            let (gx, gy) = grid.point(pos);
            (gx - x).abs() <= tolerance && (gy - y).abs() <= half_strip
        };
        self.separators.iter().enumerate().find_map(|(index, sep)| {
            std::iter::once(sep.position)
                .chain(grid.twin(sep.position))
                .find(|face| hit(*face))
                .map(|face| (index, face))
        })
    }

    /// Whether the ordering and bound invariants hold for `grid`.
    pub fn check_invariants(&self, grid: &GapGrid) -> bool {
        let (Some(first), Some(last)) = (self.separators.first(), self.separators.last()) else {
            return false;
        };
        let bounds_ok = self.separators.len() >= 2
            && first.position == grid.first()
            && last.position == grid.last()
            && first.is_static
            && last.is_static
            && first.is_super
            && last.is_super;
        let sorted = self
            .separators
            .windows(2)
            .all(|pair| grid.logical_cmp(pair[0].position, pair[1].position).is_lt());
        bounds_ok && sorted
    }

    fn refresh_subgrids_around(&mut self, grid: &GapGrid, index: usize) {
        for i in index.saturating_sub(1)..=index + 1 {
            self.refresh_subgrid(grid, i);
        }
    }

    fn refresh_all_subgrids(&mut self, grid: &GapGrid) {
        for i in 0..self.separators.len() {
            self.refresh_subgrid(grid, i);
        }
    }

    /// Recomputes the open range between the neighbors of separator `index`.
    fn refresh_subgrid(&mut self, grid: &GapGrid, index: usize) {
        let Some(sep) = self.separators.get(index) else {
            return;
        };
        let lower = match index.checked_sub(1).and_then(|i| self.separators.get(i)) {
            Some(left) => grid.right_face(left.position),
            None => sep.position,
        };
        let upper = match self.separators.get(index + 1) {
            Some(right) => grid.left_face(right.position),
            None => sep.position,
        };
        self.separators[index].subgrid = (lower, upper);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{FontSpec, MonospaceMetrics};
    use crate::text_flow::{layout, FlowSettings};

    /// Three lines: "one two" / "three four" / "five six".
    fn grid() -> GapGrid {
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

    fn bounded(grid: &GapGrid) -> SeparatorEngine {
        let mut engine = SeparatorEngine::new();
        let (fx, fy) = grid.point(grid.first());
        let (lx, ly) = grid.point(grid.last());
        assert!(engine.add_separator(grid, fx, fy, true));
        assert!(engine.add_separator(grid, lx, ly, true));
        engine
    }

    #[test]
    fn test_bounds_are_static_super_and_emit_nothing() {
        let grid = grid();
        let mut engine = bounded(&grid);

        assert_eq!(engine.len(), 2);
        assert!(engine.check_invariants(&grid));
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_reset_bounds_handles_empty_text() {
        let empty = layout(
            "",
            &MonospaceMetrics::default(),
            &FontSpec::new(10.0, 150.0),
            &FlowSettings {
                max_width: 100.0,
                padding_x: 10.0,
            },
        );
        let mut engine = SeparatorEngine::new();
        engine.reset_bounds(&empty);

        assert_eq!(engine.len(), 2);
        assert!(engine.check_invariants(&empty));
        assert!(!engine.add_separator(&empty, 10.0, 14.0, false));
    }

    #[test]
    fn test_add_separator_snaps_and_emits_created() {
        let grid = grid();
        let mut engine = bounded(&grid);

        assert!(engine.add_separator(&grid, 58.0, 16.0, false));
        let sep = &engine.separators()[1];
        assert_eq!(sep.position, GridPos::new(0, 1));
        assert!(!sep.is_super);
        assert_eq!(sep.subgrid, (GridPos::new(0, 0), GridPos::new(2, 2)));
        assert!(matches!(
            engine.drain_events().as_slice(),
            [SeparatorEvent::Created { index: 1, .. }]
        ));
        assert!(engine.check_invariants(&grid));
    }

    #[test]
    fn test_add_on_occupied_gap_takes_next_free_one() {
        let grid = grid();
        let mut engine = bounded(&grid);

        assert!(engine.add_separator(&grid, 60.0, 14.0, false));
        assert!(engine.add_separator(&grid, 60.0, 14.0, false));
        assert_eq!(engine.separators()[2].position, GridPos::new(0, 2));
        // The group between (0,1) and the border at (0,2) has no gap left.
        assert!(!engine.add_separator(&grid, 60.0, 14.0, false));
        assert_eq!(engine.len(), 4);
    }

    #[test]
    fn test_adding_on_last_bound_fails() {
        let grid = grid();
        let mut engine = bounded(&grid);
        let (lx, ly) = grid.point(grid.last());
        assert!(!engine.add_separator(&grid, lx, ly, false));
    }

    #[test]
    fn test_both_faces_of_a_border_resolve_to_the_same_separator() {
        let grid = grid();
        let mut engine = bounded(&grid);
        assert!(engine.insert_at(&grid, GridPos::new(0, 2), false));

        let sep = &engine.separators()[1];
        assert!(sep.is_on_border(&grid));
        assert_eq!(sep.complete_pos(&grid, true), GridPos::new(0, 2));
        assert_eq!(sep.complete_pos(&grid, false), GridPos::new(1, 0));

        assert_eq!(engine.point_is_occupied(&grid, 110.0, 14.0), (true, 1));
        assert_eq!(engine.point_is_occupied(&grid, 10.0, 44.0), (true, 1));
        assert!(!engine.insert_at(&grid, GridPos::new(1, 0), false));
    }

    #[test]
    fn test_point_is_occupied_reports_preceding_separator() {
        let grid = grid();
        let mut engine = bounded(&grid);
        assert!(engine.insert_at(&grid, GridPos::new(1, 1), false));

        assert_eq!(engine.point_is_occupied(&grid, 60.0, 14.0), (false, 0));
        assert_eq!(engine.point_is_occupied(&grid, 55.0, 74.0), (false, 1));
    }

    #[test]
    fn test_drag_is_confined_between_neighbors() {
        let grid = grid();
        let mut engine = bounded(&grid);
        assert!(engine.insert_at(&grid, GridPos::new(0, 1), false));
        assert!(engine.insert_at(&grid, GridPos::new(1, 1), false));
        engine.drain_events();

        // Aim at the last line: the right neighbor at (1,1) stops us at (1,0).
        let moved = engine.move_separator(&grid, 1, 55.0, 74.0);
        assert_eq!(moved, Some(GridPos::new(1, 0)));
        assert!(matches!(
            engine.drain_events().as_slice(),
            [SeparatorEvent::Moved { from, to, .. }] if *from == GridPos::new(0, 1) && *to == GridPos::new(1, 0)
        ));
        assert_eq!(engine.separators()[2].subgrid.0, GridPos::new(1, 0));
        assert!(engine.check_invariants(&grid));
    }

    #[test]
    fn test_static_bounds_never_move() {
        let grid = grid();
        let mut engine = bounded(&grid);
        assert_eq!(engine.move_separator(&grid, 0, 60.0, 44.0), None);
    }

    #[test]
    fn test_delete_refuses_bounds_and_empty_gaps() {
        let grid = grid();
        let mut engine = bounded(&grid);
        assert!(engine.insert_at(&grid, GridPos::new(1, 1), false));
        engine.drain_events();

        assert!(!engine.delete_separator(&grid, 10.0, 14.0));
        assert!(!engine.delete_separator(&grid, 60.0, 14.0));
        assert!(engine.delete_separator(&grid, 65.0, 44.0));
        assert_eq!(engine.len(), 2);
        assert!(matches!(
            engine.drain_events().as_slice(),
            [SeparatorEvent::Removed { index: 1, .. }]
        ));
        assert_eq!(engine.separators()[0].subgrid.1, GridPos::new(2, 2));
    }

    #[test]
    fn test_promote_and_demote_toggle_once() {
        let grid = grid();
        let mut engine = bounded(&grid);
        assert!(engine.insert_at(&grid, GridPos::new(1, 1), false));

        assert!(engine.promote_separator(&grid, 65.0, 44.0));
        assert!(!engine.promote_separator(&grid, 65.0, 44.0));
        assert!(engine.demote_separator(&grid, 65.0, 44.0));
        assert!(!engine.demote_separator(&grid, 65.0, 44.0));
        assert!(!engine.demote_separator(&grid, 10.0, 14.0));
        assert!(!engine.promote_separator(&grid, 60.0, 14.0));
    }

    #[test]
    fn test_click_on_duplicate_face_swaps_canonical_position() {
        let grid = grid();
        let mut engine = bounded(&grid);
        assert!(engine.insert_at(&grid, GridPos::new(0, 2), false));
        engine.drain_events();

        assert!(!engine.click_border_face(&grid, 1, 110.0, 14.0));
        assert!(engine.click_border_face(&grid, 1, 10.0, 44.0));
        assert_eq!(engine.separators()[1].position, GridPos::new(1, 0));
        assert!(matches!(
            engine.drain_events().as_slice(),
            [SeparatorEvent::BorderFlipped { .. }]
        ));
        assert_eq!(engine.point_is_occupied(&grid, 110.0, 14.0), (true, 1));
    }

    #[test]
    fn test_separator_at_hits_either_face() {
        let grid = grid();
        let mut engine = bounded(&grid);
        assert!(engine.insert_at(&grid, GridPos::new(0, 2), false));

        assert_eq!(engine.separator_at(&grid, 108.0, 20.0, 4.0), Some((1, GridPos::new(0, 2))));
        assert_eq!(engine.separator_at(&grid, 12.0, 44.0, 4.0), Some((1, GridPos::new(1, 0))));
        assert_eq!(engine.separator_at(&grid, 35.0, 14.0, 4.0), None);
    }
}
