// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The base time layout: one row per row index, fixed or stretched.

use kurbo::{Point, Rect};
use understory_time_axis::Temporal;

use crate::cull;
use crate::{Bounds, LayoutCore, LayoutError, Reader};

/// Places children on rows chosen by a row-index reader.
///
/// Horizontal placement comes from the [`LayoutCore`]. Vertically, a child
/// on row `r` sits at `top_y + r * (child_fixed_height + v_spacing)` with the
/// fixed height, or, in fill mode, rows share `height - top_y` evenly.
/// Without a fixed height and outside fill mode, children collapse to
/// `y = top_y` with zero height.
///
/// All geometry is computed lazily: reading a child's bounds recomputes only
/// the axes whose counters moved since the last read.
///
/// ## Example
///
/// ```rust
/// use std::rc::Rc;
///
/// use understory_time_axis::{Bound, LinearProjector, TimeWindow};
/// use understory_time_layout::TimeLayout;
///
/// // (start day, end day, row)
/// let mut layout = TimeLayout::new();
/// layout
///     .core_mut()
///     .set_start_time_reader(|c: &(i64, i64, usize)| c.0, Bound::Inclusive)
///     .set_end_time_reader(|c: &(i64, i64, usize)| c.1, Bound::Inclusive)
///     .set_time_window(Some(TimeWindow::new(1, 10)))
///     .set_projector(Rc::new(LinearProjector))
///     .set_width(100.0)
///     .set_child_fixed_height(Some(20.0))
///     .set_children(vec![(3, 5, 0), (6, 6, 1)]);
/// layout.set_row_index_reader(Some(Box::new(|c: &(i64, i64, usize)| c.2)));
///
/// let b = layout.child_bounds(1).unwrap();
/// assert_eq!((b.x, b.y, b.width, b.height), (50.0, 20.0, 10.0, 20.0));
///
/// layout.layout().unwrap();
/// assert_eq!(layout.height(), 40.0);
/// ```
pub struct TimeLayout<C, T> {
    core: LayoutCore<C, T>,
    row_reader: Option<Reader<C, usize>>,
    rows_count: Option<(u64, usize)>,
}

impl<C, T: core::fmt::Debug> core::fmt::Debug for TimeLayout<C, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TimeLayout")
            .field("core", &self.core)
            .field("rows_count", &self.rows_count)
            .finish_non_exhaustive()
    }
}

impl<C, T> Default for TimeLayout<C, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, T> TimeLayout<C, T> {
    /// An empty layout.
    pub fn new() -> Self {
        Self {
            core: LayoutCore::new(),
            row_reader: None,
            rows_count: None,
        }
    }

    /// Shared inputs and counters.
    pub fn core(&self) -> &LayoutCore<C, T> {
        &self.core
    }

    /// Mutable access to the shared inputs.
    pub fn core_mut(&mut self) -> &mut LayoutCore<C, T> {
        &mut self.core
    }

    /// Set how a child's row is read. Without a reader every child is on row 0.
    pub fn set_row_index_reader(&mut self, reader: Option<Reader<C, usize>>) -> &mut Self {
        self.row_reader = reader;
        self.core.invalidate(crate::Invalidate::VERTICAL);
        self
    }

    /// Layout height.
    pub fn height(&self) -> f64 {
        self.core.height()
    }

    /// A child's row, re-read whenever the vertical counter moves.
    pub fn child_row_index(&mut self, index: usize) -> Result<usize, LayoutError> {
        self.core.check_index(index)?;
        let live = self.core.versions().vertical();
        if let Some(Some((stamp, row))) = self.core.slot(index).map(|s| s.row) {
            if stamp == live {
                return Ok(row);
            }
        }
        let row = match &self.row_reader {
            Some(read) => read(&self.core.children()[index]),
            None => 0,
        };
        if let Some(slot) = self.core.slot_mut(index) {
            slot.row = Some((live, row));
        }
        Ok(row)
    }

    /// Number of rows: one past the largest row index, or 0 with no children.
    pub fn rows_count(&mut self) -> Result<usize, LayoutError> {
        let live = self.core.versions().vertical();
        if let Some((stamp, count)) = self.rows_count {
            if stamp == live {
                return Ok(count);
            }
        }
        let mut count = 0;
        for index in 0..self.core.child_count() {
            count = count.max(self.child_row_index(index)? + 1);
        }
        self.rows_count = Some((live, count));
        Ok(count)
    }

    fn sync_child_vertical(&mut self, index: usize) -> Result<(), LayoutError> {
        let live = self.core.versions().vertical();
        if self
            .core
            .slot(index)
            .is_some_and(|s| s.lazy().is_vertical_valid(live))
        {
            return Ok(());
        }
        let row = self.child_row_index(index)?;
        let top_y = self.core.top_y();
        let (y, height) = if self.core.fill_height() {
            let rows = self.rows_count()?;
            if rows > 0 {
                let row_height = (self.core.height() - top_y) / rows as f64;
                (top_y + row as f64 * row_height, row_height)
            } else {
                (top_y, 0.0)
            }
        } else if let Some(fixed) = self.core.child_fixed_height() {
            (top_y + (fixed + self.core.v_spacing()) * row as f64, fixed)
        } else {
            (top_y, 0.0)
        };
        if let Some(slot) = self.core.slot_mut(index) {
            slot.lazy_mut().set_vertical(y, height, live);
        }
        Ok(())
    }
}

impl<C, T: Temporal> TimeLayout<C, T> {
    /// Fully synced bounds of a child.
    pub fn child_bounds(&mut self, index: usize) -> Result<Bounds, LayoutError> {
        self.core.sync_child_horizontal(index)?;
        self.sync_child_vertical(index)?;
        Ok(self.core.slot(index).map(|s| s.lazy().peek()).unwrap_or_default())
    }

    /// Pick the first child whose bounds contain `point`.
    ///
    /// Returns `None` when `only_if_selectable` is set and selection is disabled.
    pub fn pick_child_at(
        &mut self,
        point: Point,
        only_if_selectable: bool,
    ) -> Result<Option<usize>, LayoutError> {
        if only_if_selectable && !self.core.is_selection_enabled() {
            return Ok(None);
        }
        for index in 0..self.core.child_count() {
            if self.child_bounds(index)?.contains(point) {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    /// Run a pass: outside fill mode, the height becomes the lowest child bottom.
    pub fn layout(&mut self) -> Result<(), LayoutError> {
        let Some(pass) = self.core.begin_layout() else {
            return Ok(());
        };
        let outcome = self.content_height();
        self.core.finish_layout(pass, outcome)
    }

    /// Run a pass only if an input changed since the last one.
    pub fn layout_if_dirty(&mut self) -> Result<(), LayoutError> {
        if self.core.is_layout_dirty() {
            self.layout()
        } else {
            Ok(())
        }
    }

    fn content_height(&mut self) -> Result<f64, LayoutError> {
        let mut max_y: f64 = 0.0;
        for index in 0..self.core.child_count() {
            max_y = max_y.max(self.child_bounds(index)?.max_y());
        }
        Ok(max_y)
    }

    /// Call `visit` with each child whose bounds, shifted by `origin`, meet `area`.
    ///
    /// Runs a pending pass first. Does nothing for an invisible layout or an
    /// empty area.
    pub fn visit_visible_children(
        &mut self,
        area: Rect,
        origin: Point,
        mut visit: impl FnMut(usize, Rect),
    ) -> Result<(), LayoutError> {
        if !self.core.is_visible() {
            return Ok(());
        }
        self.layout_if_dirty()?;
        let count = self.core.child_count();
        cull::visit_visible(
            self,
            0..count,
            false,
            area,
            origin,
            |layout, &index| layout.child_bounds(index),
            |_, index, rect| {
                visit(index, rect);
                Ok(())
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use alloc::{boxed::Box, rc::Rc, vec, vec::Vec};

    use understory_time_axis::{Bound, LinearProjector, TimeWindow};

    use super::*;
    use crate::LayoutPhase;

    /// (start, end, row)
    type Item = (i64, i64, usize);

    fn layout_with(children: Vec<Item>) -> TimeLayout<Item, i64> {
        let mut layout = TimeLayout::new();
        layout
            .core_mut()
            .set_start_time_reader(|c: &Item| c.0, Bound::Inclusive)
            .set_end_time_reader(|c: &Item| c.1, Bound::Inclusive)
            .set_time_window(Some(TimeWindow::new(1, 10)))
            .set_projector(Rc::new(LinearProjector))
            .set_width(100.0)
            .set_child_fixed_height(Some(10.0))
            .set_v_spacing(2.0)
            .set_children(children);
        layout.set_row_index_reader(Some(Box::new(|c: &Item| c.2)));
        layout
    }

    #[test]
    fn fixed_rows_stack_with_spacing() {
        let mut layout = layout_with(vec![(1, 1, 0), (1, 1, 3)]);
        assert_eq!(layout.child_bounds(0).unwrap().y, 0.0, "row 0");
        let b = layout.child_bounds(1).unwrap();
        assert_eq!((b.y, b.height), (36.0, 10.0), "row 3 at 3 * (10 + 2)");
        assert_eq!(layout.rows_count(), Ok(4), "max row + 1");
    }

    #[test]
    fn fill_mode_shares_the_height() {
        let mut layout = layout_with(vec![(1, 1, 0), (1, 1, 1), (1, 1, 3)]);
        layout
            .core_mut()
            .set_fill_height(true)
            .set_top_y(20.0)
            .set_height(100.0);
        let b = layout.child_bounds(2).unwrap();
        assert_eq!((b.y, b.height), (80.0, 20.0), "four rows of 20px below top_y");
        layout.core_mut().set_height(60.0);
        let b = layout.child_bounds(2).unwrap();
        assert_eq!((b.y, b.height), (50.0, 10.0), "height change recomputes");
    }

    #[test]
    fn without_fixed_height_children_collapse() {
        let mut layout = layout_with(vec![(1, 1, 2)]);
        layout.core_mut().set_child_fixed_height(None).set_top_y(5.0);
        let b = layout.child_bounds(0).unwrap();
        assert_eq!((b.y, b.height), (5.0, 0.0), "degenerate vertical geometry");
    }

    #[test]
    fn rows_count_follows_vertical_invalidation() {
        let mut layout = layout_with(vec![(1, 1, 0)]);
        assert_eq!(layout.rows_count(), Ok(1), "one row");
        layout.core_mut().push_child((2, 2, 4));
        assert_eq!(layout.rows_count(), Ok(5), "new child extends the rows");
        layout.core_mut().set_children(vec![]);
        assert_eq!(layout.rows_count(), Ok(0), "no children, no rows");
    }

    #[test]
    fn layout_measures_height_and_settles() {
        let mut layout = layout_with(vec![(1, 1, 0), (1, 1, 2)]);
        assert!(layout.core().is_layout_dirty(), "new layouts are dirty");
        layout.layout().unwrap();
        assert_eq!(layout.height(), 34.0, "bottom of row 2");
        assert_eq!(layout.core().phase(), LayoutPhase::Clean, "settled");
        assert_eq!(layout.core().layout_count(), 1, "one pass");
        layout.layout_if_dirty().unwrap();
        assert_eq!(layout.core().layout_count(), 1, "clean layout skips the pass");
        layout.core_mut().set_top_y(10.0);
        layout.layout_if_dirty().unwrap();
        assert_eq!(layout.height(), 44.0, "moved down");
    }

    #[test]
    fn empty_layout_has_zero_height() {
        let mut layout = layout_with(vec![]);
        layout.layout().unwrap();
        assert_eq!(layout.height(), 0.0, "nothing to measure");
    }

    #[test]
    fn invisible_layouts_skip_passes_and_traversal() {
        let mut layout = layout_with(vec![(1, 1, 0)]);
        layout.core_mut().set_visible(false);
        layout.layout().unwrap();
        assert_eq!(layout.core().layout_count(), 0, "no pass");
        let mut seen = 0;
        layout
            .visit_visible_children(Rect::new(0.0, 0.0, 100.0, 100.0), Point::ZERO, |_, _| seen += 1)
            .unwrap();
        assert_eq!(seen, 0, "nothing visited");
    }

    #[test]
    fn pick_scans_for_the_first_hit() {
        let mut layout = layout_with(vec![(3, 5, 0), (6, 6, 1)]);
        assert_eq!(layout.pick_child_at(Point::new(25.0, 5.0), false), Ok(Some(0)), "first");
        assert_eq!(layout.pick_child_at(Point::new(55.0, 15.0), false), Ok(Some(1)), "second");
        assert_eq!(layout.pick_child_at(Point::new(95.0, 5.0), false), Ok(None), "miss");
        assert_eq!(
            layout.pick_child_at(Point::new(25.0, 5.0), true),
            Ok(None),
            "selection disabled"
        );
        layout.core_mut().set_selection_enabled(true);
        assert_eq!(layout.pick_child_at(Point::new(25.0, 5.0), true), Ok(Some(0)), "enabled");
    }

    #[test]
    fn traversal_reports_shifted_rects() {
        let mut layout = layout_with(vec![(1, 2, 0), (9, 10, 0), (1, 1, 5)]);
        let mut seen = Vec::new();
        layout
            .visit_visible_children(
                Rect::new(0.0, 0.0, 50.0, 20.0),
                Point::new(0.0, 0.0),
                |index, rect| seen.push((index, rect)),
            )
            .unwrap();
        assert_eq!(seen, vec![(0, Rect::new(0.0, 0.0, 20.0, 10.0))], "only the top-left child");

        seen.clear();
        layout
            .visit_visible_children(
                Rect::new(0.0, 0.0, 50.0, 20.0),
                Point::new(0.0, 55.0),
                |index, rect| seen.push((index, rect)),
            )
            .unwrap();
        assert_eq!(seen, vec![(2, Rect::new(0.0, 5.0, 10.0, 15.0))], "scrolled down to row 5");
    }
}
