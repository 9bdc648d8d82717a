// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Object-safe view of a layout, independent of its child type.

use alloc::rc::Rc;

use kurbo::{Point, Rect};
use understory_time_axis::{Temporal, TimeProjector, TimeWindow};

use crate::{Bounds, LayoutError, TimeLayout};

/// A layout that can be stacked in a [`MultilayerTimeLayout`](crate::MultilayerTimeLayout).
///
/// Layers share a time axis but may hold different child types, so this trait
/// only speaks in child indices.
pub trait TimeLayer<T> {
    /// Set or clear the time window.
    fn set_time_window(&mut self, window: Option<TimeWindow<T>>);

    /// Set the available width.
    fn set_width(&mut self, width: f64);

    /// Set the projector.
    fn set_projector(&mut self, projector: Rc<dyn TimeProjector<T>>);

    /// Whether the layer takes part in passes and traversal.
    fn is_visible(&self) -> bool;

    /// Y of the layer's first row.
    fn top_y(&self) -> f64;

    /// Height measured by the last pass.
    fn height(&self) -> f64;

    /// Number of children.
    fn child_count(&self) -> usize;

    /// Run a pass.
    fn layout(&mut self) -> Result<(), LayoutError>;

    /// Fully synced bounds of a child.
    fn child_bounds(&mut self, index: usize) -> Result<Bounds, LayoutError>;

    /// Pick the child under `point`.
    fn pick_child_at(
        &mut self,
        point: Point,
        only_if_selectable: bool,
    ) -> Result<Option<usize>, LayoutError>;

    /// Index of the selected child.
    fn selected_child(&self) -> Option<usize>;

    /// Select a child by index, or clear the selection.
    fn select_child(&mut self, index: Option<usize>) -> Result<(), LayoutError>;

    /// Visit the children meeting `area` once shifted by `origin`.
    fn visit_visible_children(
        &mut self,
        area: Rect,
        origin: Point,
        visit: &mut dyn FnMut(usize, Rect),
    ) -> Result<(), LayoutError>;
}

impl<C, T: Temporal> TimeLayer<T> for TimeLayout<C, T> {
    fn set_time_window(&mut self, window: Option<TimeWindow<T>>) {
        self.core_mut().set_time_window(window);
    }

    fn set_width(&mut self, width: f64) {
        self.core_mut().set_width(width);
    }

    fn set_projector(&mut self, projector: Rc<dyn TimeProjector<T>>) {
        self.core_mut().set_projector(projector);
    }

    fn is_visible(&self) -> bool {
        self.core().is_visible()
    }

    fn top_y(&self) -> f64 {
        self.core().top_y()
    }

    fn height(&self) -> f64 {
        Self::height(self)
    }

    fn child_count(&self) -> usize {
        self.core().child_count()
    }

    fn layout(&mut self) -> Result<(), LayoutError> {
        Self::layout(self)
    }

    fn child_bounds(&mut self, index: usize) -> Result<Bounds, LayoutError> {
        Self::child_bounds(self, index)
    }

    fn pick_child_at(
        &mut self,
        point: Point,
        only_if_selectable: bool,
    ) -> Result<Option<usize>, LayoutError> {
        Self::pick_child_at(self, point, only_if_selectable)
    }

    fn selected_child(&self) -> Option<usize> {
        self.core().selected_child()
    }

    fn select_child(&mut self, index: Option<usize>) -> Result<(), LayoutError> {
        self.core_mut().select_child(index)
    }

    fn visit_visible_children(
        &mut self,
        area: Rect,
        origin: Point,
        visit: &mut dyn FnMut(usize, Rect),
    ) -> Result<(), LayoutError> {
        Self::visit_visible_children(self, area, origin, visit)
    }
}
