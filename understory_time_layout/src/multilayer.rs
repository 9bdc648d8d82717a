// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Several layers stacked over one shared time axis.

use alloc::{boxed::Box, rc::Rc, vec::Vec};
use core::fmt;

use kurbo::{Point, Rect};
use understory_time_axis::{Temporal, TimeProjector, TimeWindow};

use crate::layout_core::LayoutCounter;
use crate::{LayoutError, TimeLayer};

/// Layers sharing one time window, width, and projector.
///
/// The multilayer owns the shared inputs and pushes them into each layer when
/// the layer is added and whenever an input changes. Its height is the lowest
/// bottom (`top_y + height`) among the visible layers, and it tracks a single
/// selection across all layers: selecting a child in one layer clears the
/// selection in every other layer.
pub struct MultilayerTimeLayout<T> {
    layers: Vec<Box<dyn TimeLayer<T>>>,
    window: Option<TimeWindow<T>>,
    width: f64,
    projector: Option<Rc<dyn TimeProjector<T>>>,
    height: f64,
    selection_enabled: bool,
    counter: LayoutCounter,
}

impl<T: fmt::Debug> fmt::Debug for MultilayerTimeLayout<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultilayerTimeLayout")
            .field("layers", &self.layers.len())
            .field("window", &self.window)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("selection_enabled", &self.selection_enabled)
            .field("counter", &self.counter)
            .finish_non_exhaustive()
    }
}

impl<T: Temporal> Default for MultilayerTimeLayout<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Temporal> MultilayerTimeLayout<T> {
    /// No layers, no window, selection enabled.
    pub fn new() -> Self {
        Self {
            layers: Vec::new(),
            window: None,
            width: 0.0,
            projector: None,
            height: 0.0,
            selection_enabled: true,
            counter: LayoutCounter::default(),
        }
    }

    /// Append a layer on top and hand it the shared inputs. Returns its index.
    pub fn add_layer(&mut self, mut layer: Box<dyn TimeLayer<T>>) -> usize {
        layer.set_time_window(self.window.clone());
        layer.set_width(self.width);
        if let Some(projector) = &self.projector {
            layer.set_projector(projector.clone());
        }
        self.layers.push(layer);
        self.layers.len() - 1
    }

    /// Remove and return the layer at `index`.
    pub fn remove_layer(&mut self, index: usize) -> Result<Box<dyn TimeLayer<T>>, LayoutError> {
        if index >= self.layers.len() {
            return Err(LayoutError::LayerOutOfRange {
                index,
                len: self.layers.len(),
            });
        }
        Ok(self.layers.remove(index))
    }

    /// Number of layers.
    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    /// A layer by index.
    pub fn layer(&self, index: usize) -> Option<&dyn TimeLayer<T>> {
        self.layers.get(index).map(|l| &**l)
    }

    /// A layer by index, mutably.
    pub fn layer_mut(&mut self, index: usize) -> Option<&mut (dyn TimeLayer<T> + 'static)> {
        self.layers.get_mut(index).map(|l| &mut **l)
    }

    /// Set or clear the shared time window.
    pub fn set_time_window(&mut self, window: Option<TimeWindow<T>>) {
        for layer in &mut self.layers {
            layer.set_time_window(window.clone());
        }
        self.window = window;
    }

    /// The shared time window.
    pub fn time_window(&self) -> Option<&TimeWindow<T>> {
        self.window.as_ref()
    }

    /// Set the shared width.
    pub fn set_width(&mut self, width: f64) {
        self.width = width;
        for layer in &mut self.layers {
            layer.set_width(width);
        }
    }

    /// The shared width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Set the shared projector.
    pub fn set_projector(&mut self, projector: Rc<dyn TimeProjector<T>>) {
        for layer in &mut self.layers {
            layer.set_projector(projector.clone());
        }
        self.projector = Some(projector);
    }

    /// Lowest bottom among visible layers, as of the last pass.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Number of completed passes; negative while a pass is running.
    pub fn layout_count(&self) -> i64 {
        self.counter.count()
    }

    /// Call `observer` whenever the layout count changes.
    pub fn on_layout_count_changed(&mut self, observer: impl FnMut(i64) + 'static) {
        self.counter.observe(Box::new(observer));
    }

    /// Lay out every layer, then measure the combined height.
    pub fn layout(&mut self) -> Result<(), LayoutError> {
        let pass = self.counter.begin();
        for layer in &mut self.layers {
            if let Err(err) = layer.layout() {
                self.counter.abandon(pass);
                return Err(err);
            }
        }
        self.height = self
            .layers
            .iter()
            .filter(|l| l.is_visible())
            .map(|l| l.top_y() + l.height())
            .fold(0.0, f64::max);
        tracing::debug!(height = self.height, layers = self.layers.len(), "multilayer laid out");
        self.counter.settle(pass);
        Ok(())
    }

    /// Whether picking for selection is allowed.
    pub fn is_selection_enabled(&self) -> bool {
        self.selection_enabled
    }

    /// Allow or forbid picking for selection.
    pub fn set_selection_enabled(&mut self, enabled: bool) {
        self.selection_enabled = enabled;
    }

    /// The selected `(layer, child)`, if any.
    pub fn selection(&self) -> Option<(usize, usize)> {
        self.layers
            .iter()
            .enumerate()
            .find_map(|(layer, l)| l.selected_child().map(|child| (layer, child)))
    }

    /// Select a child in one layer, clearing every other layer's selection.
    pub fn select(&mut self, selection: Option<(usize, usize)>) -> Result<(), LayoutError> {
        if let Some((layer, child)) = selection {
            let len = self.layers.len();
            self.layers
                .get_mut(layer)
                .ok_or(LayoutError::LayerOutOfRange { index: layer, len })?
                .select_child(Some(child))?;
        }
        let keep = selection.map(|(layer, _)| layer);
        for (index, layer) in self.layers.iter_mut().enumerate() {
            if Some(index) != keep {
                layer.select_child(None)?;
            }
        }
        tracing::debug!(?selection, "multilayer selection changed");
        Ok(())
    }

    /// Pick the `(layer, child)` under `point`, topmost layer first.
    pub fn pick_at(
        &mut self,
        point: Point,
        only_if_selectable: bool,
    ) -> Result<Option<(usize, usize)>, LayoutError> {
        if only_if_selectable && !self.selection_enabled {
            return Ok(None);
        }
        for (index, layer) in self.layers.iter_mut().enumerate().rev() {
            if !layer.is_visible() {
                continue;
            }
            if let Some(child) = layer.pick_child_at(point, false)? {
                return Ok(Some((index, child)));
            }
        }
        Ok(None)
    }

    /// Visit visible children of every layer, bottom layer first.
    pub fn visit_visible(
        &mut self,
        area: Rect,
        origin: Point,
        mut visit: impl FnMut(usize, usize, Rect),
    ) -> Result<(), LayoutError> {
        for (index, layer) in self.layers.iter_mut().enumerate() {
            layer.visit_visible_children(area, origin, &mut |child, rect| visit(index, child, rect))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::{boxed::Box, rc::Rc, vec, vec::Vec};

    use understory_time_axis::{Bound, LinearProjector};

    use super::*;
    use crate::TimeLayout;

    fn layer(children: Vec<(i64, i64)>, top_y: f64) -> Box<TimeLayout<(i64, i64), i64>> {
        let mut layout = TimeLayout::new();
        layout
            .core_mut()
            .set_start_time_reader(|c: &(i64, i64)| c.0, Bound::Inclusive)
            .set_end_time_reader(|c: &(i64, i64)| c.1, Bound::Inclusive)
            .set_child_fixed_height(Some(10.0))
            .set_top_y(top_y)
            .set_children(children);
        Box::new(layout)
    }

    fn multilayer() -> MultilayerTimeLayout<i64> {
        let mut m = MultilayerTimeLayout::new();
        m.set_time_window(Some(TimeWindow::new(1, 10)));
        m.set_width(100.0);
        m.set_projector(Rc::new(LinearProjector));
        m
    }

    #[test]
    fn layers_receive_shared_inputs() {
        let mut m = multilayer();
        let a = m.add_layer(layer(vec![(3, 5)], 0.0));
        let b = m.layer_mut(a).unwrap().child_bounds(0).unwrap();
        assert_eq!((b.x, b.width), (20.0, 30.0), "projected with shared inputs");
        m.set_width(200.0);
        let b = m.layer_mut(a).unwrap().child_bounds(0).unwrap();
        assert_eq!((b.x, b.width), (40.0, 60.0), "width change propagated");
    }

    #[test]
    fn height_is_the_lowest_visible_bottom() {
        let mut m = multilayer();
        m.add_layer(layer(vec![(1, 1)], 0.0));
        m.add_layer(layer(vec![(1, 1)], 30.0));
        m.layout().unwrap();
        // The second layer's own height already includes its top_y.
        assert_eq!(m.height(), 70.0, "30 + 40");
        assert_eq!(m.layout_count(), 1, "one pass");
    }

    #[test]
    fn selecting_in_one_layer_clears_the_others() {
        let mut m = multilayer();
        m.add_layer(layer(vec![(1, 1), (2, 2)], 0.0));
        m.add_layer(layer(vec![(3, 3)], 0.0));
        m.select(Some((0, 1))).unwrap();
        assert_eq!(m.selection(), Some((0, 1)), "first layer");
        m.select(Some((1, 0))).unwrap();
        assert_eq!(m.selection(), Some((1, 0)), "moved to the second layer");
        assert_eq!(m.layer(0).unwrap().selected_child(), None, "first layer cleared");
        m.select(None).unwrap();
        assert_eq!(m.selection(), None, "cleared everywhere");
        assert_eq!(
            m.select(Some((4, 0))),
            Err(LayoutError::LayerOutOfRange { index: 4, len: 2 }),
            "bad layer"
        );
    }

    #[test]
    fn pick_prefers_the_top_layer() {
        let mut m = multilayer();
        m.add_layer(layer(vec![(1, 5)], 0.0));
        m.add_layer(layer(vec![(3, 3)], 0.0));
        assert_eq!(m.pick_at(Point::new(25.0, 5.0), true), Ok(Some((1, 0))), "overlap");
        assert_eq!(m.pick_at(Point::new(5.0, 5.0), true), Ok(Some((0, 0))), "bottom only");
        m.set_selection_enabled(false);
        assert_eq!(m.pick_at(Point::new(5.0, 5.0), true), Ok(None), "disabled");
    }

    #[test]
    fn traversal_tags_children_with_their_layer() {
        let mut m = multilayer();
        m.add_layer(layer(vec![(1, 1)], 0.0));
        m.add_layer(layer(vec![(2, 2)], 0.0));
        let mut seen = Vec::new();
        m.visit_visible(Rect::new(0.0, 0.0, 100.0, 100.0), Point::ZERO, |l, c, _| {
            seen.push((l, c));
        })
        .unwrap();
        assert_eq!(seen, vec![(0, 0), (1, 0)], "layer order");
    }
}
