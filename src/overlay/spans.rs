//! Colored rounded rectangles drawn behind each clause.

use super::{group_rows, GroupLayout, GroupTracker};
use crate::descriptor::DescriptorConfig;
use crate::separator::Separator;
use crate::types::{Color, GapGrid, GridPos, SceneRect, SeparatorId};

/// One row of a clause highlight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    /// Rectangle in scene coordinates
    pub rect: SceneRect,
    /// Fill color, resolved from the clause's descriptor
    pub color: Color,
}

/// Builds one span per line covered by a group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpanLayout {
    /// Color of a freshly created group
    pub default_color: Color,
}

impl GroupLayout for SpanLayout {
    type Item = Span;

    fn build(&self, grid: &GapGrid, start: GridPos, end: GridPos, seed: Option<&Span>) -> Vec<Span> {
        let color = seed.map_or(self.default_color, |span| span.color);
        group_rows(grid, start, end)
            .into_iter()
            .map(|rect| Span { rect, color })
            .collect()
    }
}

/// Span overlay: keeps one color per group in sync with the separators.
#[derive(Debug, Clone)]
pub struct SpanOverlayEngine {
    tracker: GroupTracker<SpanLayout>,
}

impl SpanOverlayEngine {
    /// Creates an overlay whose new groups use `default_color`.
    pub fn new(default_color: Color) -> Self {
        Self {
            tracker: GroupTracker::new(SpanLayout { default_color }),
        }
    }

    /// Every span in reading order.
    pub fn spans(&self) -> &[Span] {
        self.tracker.items()
    }

    /// Spans of one group.
    pub fn group_spans(&self, group: usize) -> &[Span] {
        self.tracker.group_items(group)
    }

    /// Number of groups.
    pub fn group_count(&self) -> usize {
        self.tracker.group_count()
    }

    /// Rebuilds every group with the default color.
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

    /// Recolors every span of `group` from its descriptor values.
    pub fn on_editable_text_changed(&mut self, group: usize, values: &[String], config: &DescriptorConfig) {
        let color = config.color_for(values);
        let range = self.tracker.group_range(group);
        for span in &mut self.tracker.items_mut()[range] {
            span.color = color;
        }
    }

    /// Whether the overlay mirrors `separators`.
    pub fn is_synced(&self, separators: &[Separator]) -> bool {
        self.tracker.is_synced(separators)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::test_support::{bounded, grid};
    use crate::separator::SeparatorEvent;

    fn config() -> DescriptorConfig {
        let values = ["++", "+", "-", "--"].iter().map(|s| s.to_string()).collect();
        let palette: Vec<Color> = (0..17).map(|i| Color::rgba(i as u8, 0, 0, 255)).collect();
        DescriptorConfig::new("SD~;SG~", '~', values, &palette, Vec::new()).unwrap()
    }

    #[test]
    fn test_spans_cover_each_line_of_a_group() {
        let grid = grid();
        let engine = bounded(&grid);
        let mut overlay = SpanOverlayEngine::new(Color::UNTAGGED);
        overlay.reset(&grid, engine.separators());

        let rects: Vec<_> = overlay.spans().iter().map(|s| s.rect).collect();
        assert_eq!(rects[0], SceneRect::new(10.0, 4.0, 100.0, 20.0));
        assert_eq!(rects[2], SceneRect::new(10.0, 64.0, 80.0, 20.0));
        assert!(overlay.spans().iter().all(|s| s.color == Color::UNTAGGED));
    }

    #[test]
    fn test_recolor_touches_only_the_group() {
        let grid = grid();
        let mut engine = bounded(&grid);
        let mut overlay = SpanOverlayEngine::new(Color::UNTAGGED);
        overlay.reset(&grid, engine.separators());
        assert!(engine.insert_at(&grid, GridPos::new(1, 1), false));
        for event in engine.drain_events() {
            if let SeparatorEvent::Created { id, position, .. } = event {
                overlay.on_separator_position_changed(&grid, engine.separators(), id, position);
            }
        }

        let values = vec!["+".to_string(), "--".to_string()];
        overlay.on_editable_text_changed(1, &values, &config());

        assert!(overlay.group_spans(0).iter().all(|s| s.color == Color::UNTAGGED));
        assert!(overlay.group_spans(1).iter().all(|s| s.color == Color::rgba(8, 0, 0, 255)));
    }
}
