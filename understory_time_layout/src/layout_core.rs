// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State shared by every time layout: children, inputs, counters, and the
//! horizontal placement of children.

use alloc::{boxed::Box, rc::Rc, vec::Vec};
use core::fmt;

use understory_time_axis::{Bound, Side, Temporal, TimeProjector, TimeWindow};

use crate::{Bounds, Invalidate, LayoutError, LazyBounds, Versions};

/// Reads a value from a caller-owned child.
pub type Reader<C, V> = Box<dyn Fn(&C) -> V>;

/// Where a layout is in its pull-driven lifecycle.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutPhase {
    /// Nothing changed since the last pass.
    Clean,
    /// Some input changed; the next [`layout_if_dirty`](crate::TimeLayout::layout_if_dirty) runs a pass.
    #[default]
    Dirty,
    /// A pass is running.
    LayingOut,
}

/// Cached per-child layout state, index-aligned with the children.
#[derive(Clone, Debug)]
pub struct ChildBounds<T> {
    lazy: LazyBounds,
    start: Option<T>,
    end: Option<T>,
    times: Option<u64>,
    pub(crate) row: Option<(u64, usize)>,
    column: Option<(u64, usize)>,
}

impl<T> ChildBounds<T> {
    fn new() -> Self {
        Self {
            lazy: LazyBounds::new(),
            start: None,
            end: None,
            times: None,
            row: None,
            column: None,
        }
    }

    fn invalidate(&mut self) {
        self.lazy.invalidate();
        self.times = None;
        self.row = None;
        self.column = None;
    }

    /// The bounds cache.
    pub fn lazy(&self) -> &LazyBounds {
        &self.lazy
    }

    /// The bounds cache, for layouts that place children vertically.
    pub fn lazy_mut(&mut self) -> &mut LazyBounds {
        &mut self.lazy
    }

    /// Start time as last read, if it has been read.
    pub fn start_time(&self) -> Option<&T> {
        self.start.as_ref()
    }

    /// End time as last read, if it has been read.
    pub fn end_time(&self) -> Option<&T> {
        self.end.as_ref()
    }
}

/// Proof that a layout pass has begun; hand it back to
/// [`LayoutCore::finish_layout`].
#[must_use = "a started pass must be finished"]
#[derive(Debug)]
pub struct LayoutPass {
    count: i64,
}

/// The layout count and whoever listens to it.
///
/// The count is negated while a pass runs, so observers can tell a pending
/// pass from a settled one.
#[derive(Default)]
pub(crate) struct LayoutCounter {
    count: i64,
    observers: Vec<Box<dyn FnMut(i64)>>,
}

impl fmt::Debug for LayoutCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutCounter")
            .field("count", &self.count)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl LayoutCounter {
    pub(crate) fn count(&self) -> i64 {
        self.count
    }

    pub(crate) fn observe(&mut self, observer: Box<dyn FnMut(i64)>) {
        self.observers.push(observer);
    }

    pub(crate) fn begin(&mut self) -> LayoutPass {
        let count = self.count.abs() + 1;
        self.set(-count);
        LayoutPass { count }
    }

    pub(crate) fn settle(&mut self, pass: LayoutPass) {
        self.set(pass.count);
    }

    pub(crate) fn abandon(&mut self, pass: LayoutPass) {
        self.set(pass.count - 1);
    }

    fn set(&mut self, count: i64) {
        self.count = count;
        for observer in &mut self.observers {
            observer(count);
        }
    }
}

/// Children, time inputs, and version counters of a time layout.
///
/// `LayoutCore` places children horizontally: each child's start and end
/// times are read through the configured readers, projected with the
/// [`TimeProjector`], and cached until the relevant counter moves. Vertical
/// placement belongs to the layout that owns the core, such as
/// [`TimeLayout`](crate::TimeLayout) or a hierarchical Gantt layout.
///
/// Every setter bumps exactly the counters its value feeds and marks the
/// layout dirty. All reads and writes take `&mut self`, so a pass can never
/// observe an input changing underneath it.
pub struct LayoutCore<C, T> {
    children: Vec<C>,
    slots: Vec<ChildBounds<T>>,
    start_reader: Option<Reader<C, T>>,
    start_bound: Bound,
    end_reader: Option<Reader<C, T>>,
    end_bound: Bound,
    column_reader: Option<Reader<C, usize>>,
    window: Option<TimeWindow<T>>,
    projector: Option<Rc<dyn TimeProjector<T>>>,
    width: f64,
    height: f64,
    h_spacing: f64,
    v_spacing: f64,
    child_fixed_height: Option<f64>,
    fill_height: bool,
    top_y: f64,
    visible: bool,
    versions: Versions,
    children_version: u64,
    phase: LayoutPhase,
    counter: LayoutCounter,
    selection_enabled: bool,
    selected: Option<usize>,
}

impl<C, T: fmt::Debug> fmt::Debug for LayoutCore<C, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutCore")
            .field("children", &self.children.len())
            .field("window", &self.window)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("versions", &self.versions)
            .field("children_version", &self.children_version)
            .field("phase", &self.phase)
            .field("layout_count", &self.counter.count())
            .field("selected", &self.selected)
            .finish_non_exhaustive()
    }
}

impl<C, T> Default for LayoutCore<C, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, T> LayoutCore<C, T> {
    /// An empty, visible core with no readers, window, or projector.
    pub fn new() -> Self {
        Self {
            children: Vec::new(),
            slots: Vec::new(),
            start_reader: None,
            start_bound: Bound::Inclusive,
            end_reader: None,
            end_bound: Bound::Inclusive,
            column_reader: None,
            window: None,
            projector: None,
            width: 0.0,
            height: 0.0,
            h_spacing: 0.0,
            v_spacing: 0.0,
            child_fixed_height: None,
            fill_height: false,
            top_y: 0.0,
            visible: true,
            versions: Versions::new(),
            children_version: 0,
            phase: LayoutPhase::Dirty,
            counter: LayoutCounter::default(),
            selection_enabled: false,
            selected: None,
        }
    }

    // --- children ---

    /// Replace every child. Cached slots are reused but invalidated.
    pub fn set_children(&mut self, children: Vec<C>) -> &mut Self {
        self.children = children;
        self.slots.resize_with(self.children.len(), ChildBounds::new);
        for slot in &mut self.slots {
            slot.invalidate();
        }
        self.selected = None;
        self.children_changed();
        self
    }

    /// Append one child.
    pub fn push_child(&mut self, child: C) -> &mut Self {
        self.children.push(child);
        self.slots.push(ChildBounds::new());
        self.children_changed();
        self
    }

    /// Remove and return the child at `index`.
    pub fn remove_child(&mut self, index: usize) -> Result<C, LayoutError> {
        self.check_index(index)?;
        self.slots.remove(index);
        let child = self.children.remove(index);
        self.selected = match self.selected {
            Some(s) if s == index => None,
            Some(s) if s > index => Some(s - 1),
            other => other,
        };
        self.children_changed();
        Ok(child)
    }

    fn children_changed(&mut self) {
        self.children_version += 1;
        tracing::trace!(
            len = self.children.len(),
            version = self.children_version,
            "children changed"
        );
        self.invalidate(Invalidate::TIME | Invalidate::VERTICAL);
    }

    /// The children, in insertion order.
    pub fn children(&self) -> &[C] {
        &self.children
    }

    /// Number of children.
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// Bumped on every structural change to the children.
    pub fn children_version(&self) -> u64 {
        self.children_version
    }

    /// Cached state of one child.
    pub fn slot(&self, index: usize) -> Option<&ChildBounds<T>> {
        self.slots.get(index)
    }

    /// Mutable cached state of one child.
    pub fn slot_mut(&mut self, index: usize) -> Option<&mut ChildBounds<T>> {
        self.slots.get_mut(index)
    }

    /// Error unless `index` names a child.
    pub fn check_index(&self, index: usize) -> Result<(), LayoutError> {
        if index < self.children.len() {
            Ok(())
        } else {
            Err(LayoutError::IndexOutOfRange {
                index,
                len: self.children.len(),
            })
        }
    }

    // --- inputs ---

    /// Set how a child's start time is read.
    pub fn set_start_time_reader(
        &mut self,
        reader: impl Fn(&C) -> T + 'static,
        bound: Bound,
    ) -> &mut Self {
        self.start_reader = Some(Box::new(reader));
        self.start_bound = bound;
        self.invalidate(Invalidate::TIME);
        self
    }

    /// Set how a child's end time is read.
    pub fn set_end_time_reader(
        &mut self,
        reader: impl Fn(&C) -> T + 'static,
        bound: Bound,
    ) -> &mut Self {
        self.end_reader = Some(Box::new(reader));
        self.end_bound = bound;
        self.invalidate(Invalidate::TIME);
        self
    }

    /// Set how a child's column is read. Without a reader every child is in column 0.
    pub fn set_column_index_reader(
        &mut self,
        reader: Option<Reader<C, usize>>,
    ) -> &mut Self {
        self.column_reader = reader;
        self.invalidate(Invalidate::HORIZONTAL);
        self
    }

    /// Set the projector.
    pub fn set_projector(&mut self, projector: Rc<dyn TimeProjector<T>>) -> &mut Self {
        self.projector = Some(projector);
        self.invalidate(Invalidate::HORIZONTAL);
        self
    }

    /// The projector, if one is set.
    pub fn projector(&self) -> Option<&Rc<dyn TimeProjector<T>>> {
        self.projector.as_ref()
    }

    /// The time window, if one is set.
    pub fn time_window(&self) -> Option<&TimeWindow<T>> {
        self.window.as_ref()
    }

    /// Available width.
    pub fn width(&self) -> f64 {
        self.width
    }

    /// Set the available width.
    pub fn set_width(&mut self, width: f64) -> &mut Self {
        if width != self.width {
            self.width = width;
            self.invalidate(Invalidate::HORIZONTAL);
        }
        self
    }

    /// Layout height: computed by the last pass unless in fill mode.
    pub fn height(&self) -> f64 {
        self.height
    }

    /// Set the height. Only fill mode derives geometry from it.
    pub fn set_height(&mut self, height: f64) -> &mut Self {
        if height != self.height {
            self.height = height;
            if self.fill_height {
                self.invalidate(Invalidate::VERTICAL);
            }
        }
        self
    }

    /// Horizontal gap between adjacent children.
    pub fn h_spacing(&self) -> f64 {
        self.h_spacing
    }

    /// Set the horizontal gap, split evenly on both sides of each child.
    pub fn set_h_spacing(&mut self, h_spacing: f64) -> &mut Self {
        if h_spacing != self.h_spacing {
            self.h_spacing = h_spacing;
            self.invalidate(Invalidate::HORIZONTAL);
        }
        self
    }

    /// Vertical gap between rows.
    pub fn v_spacing(&self) -> f64 {
        self.v_spacing
    }

    /// Set the vertical gap between rows.
    pub fn set_v_spacing(&mut self, v_spacing: f64) -> &mut Self {
        if v_spacing != self.v_spacing {
            self.v_spacing = v_spacing;
            self.invalidate(Invalidate::VERTICAL);
        }
        self
    }

    /// Fixed child height, if configured.
    pub fn child_fixed_height(&self) -> Option<f64> {
        self.child_fixed_height
    }

    /// Give every child the same height, or `None` to let the layout decide.
    pub fn set_child_fixed_height(&mut self, height: Option<f64>) -> &mut Self {
        if height != self.child_fixed_height {
            self.child_fixed_height = height;
            self.invalidate(Invalidate::VERTICAL);
        }
        self
    }

    /// Whether rows stretch to fill the height.
    pub fn fill_height(&self) -> bool {
        self.fill_height
    }

    /// Stretch rows so they share `height - top_y` evenly.
    pub fn set_fill_height(&mut self, fill_height: bool) -> &mut Self {
        if fill_height != self.fill_height {
            self.fill_height = fill_height;
            self.invalidate(Invalidate::VERTICAL);
        }
        self
    }

    /// Y of the first row.
    pub fn top_y(&self) -> f64 {
        self.top_y
    }

    /// Set the y of the first row.
    pub fn set_top_y(&mut self, top_y: f64) -> &mut Self {
        if top_y != self.top_y {
            self.top_y = top_y;
            self.invalidate(Invalidate::VERTICAL);
        }
        self
    }

    /// Whether the layout takes part in passes and traversal.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the layout. Showing it marks it dirty.
    pub fn set_visible(&mut self, visible: bool) -> &mut Self {
        if visible != self.visible {
            self.visible = visible;
            if visible {
                self.mark_dirty();
            }
        }
        self
    }

    // --- selection ---

    /// Whether picking for selection is allowed.
    pub fn is_selection_enabled(&self) -> bool {
        self.selection_enabled
    }

    /// Allow or forbid picking for selection.
    pub fn set_selection_enabled(&mut self, enabled: bool) -> &mut Self {
        self.selection_enabled = enabled;
        self
    }

    /// Index of the selected child.
    pub fn selected_child(&self) -> Option<usize> {
        self.selected
    }

    /// Select a child by index, or clear the selection.
    pub fn select_child(&mut self, index: Option<usize>) -> Result<(), LayoutError> {
        if let Some(index) = index {
            self.check_index(index)?;
        }
        self.selected = index;
        Ok(())
    }

    // --- versions and passes ---

    /// Live counters.
    pub fn versions(&self) -> &Versions {
        &self.versions
    }

    /// Bump the counters named by `what` and mark the layout dirty.
    pub fn invalidate(&mut self, what: Invalidate) {
        self.versions.bump(what);
        self.mark_dirty();
    }

    /// Request a pass without invalidating any geometry.
    pub fn mark_dirty(&mut self) {
        if self.phase != LayoutPhase::LayingOut {
            self.phase = LayoutPhase::Dirty;
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> LayoutPhase {
        self.phase
    }

    /// Returns `true` if an input changed since the last pass.
    pub fn is_layout_dirty(&self) -> bool {
        self.phase == LayoutPhase::Dirty
    }

    /// Number of completed passes; negative while a pass is running.
    pub fn layout_count(&self) -> i64 {
        self.counter.count()
    }

    /// Call `observer` whenever the layout count changes.
    pub fn on_layout_count_changed(&mut self, observer: impl FnMut(i64) + 'static) {
        self.counter.observe(Box::new(observer));
    }

    /// Start a pass. Returns `None` for an invisible layout.
    pub fn begin_layout(&mut self) -> Option<LayoutPass> {
        if !self.visible {
            return None;
        }
        self.phase = LayoutPhase::LayingOut;
        let pass = self.counter.begin();
        tracing::debug!(count = pass.count, "layout pass started");
        Some(pass)
    }

    /// Finish a pass with the content height it measured.
    ///
    /// The height is applied unless the layout is in fill mode. A failed pass
    /// restores the previous count and leaves the layout dirty.
    pub fn finish_layout(
        &mut self,
        pass: LayoutPass,
        outcome: Result<f64, LayoutError>,
    ) -> Result<(), LayoutError> {
        match outcome {
            Ok(height) => {
                if !self.fill_height {
                    self.height = height;
                }
                self.phase = LayoutPhase::Clean;
                tracing::debug!(count = pass.count, height, "layout pass settled");
                self.counter.settle(pass);
                Ok(())
            }
            Err(err) => {
                self.phase = LayoutPhase::Dirty;
                tracing::debug!(count = pass.count, %err, "layout pass failed");
                self.counter.abandon(pass);
                Err(err)
            }
        }
    }
}

impl<C, T: Temporal> LayoutCore<C, T> {
    /// Set or clear the time window.
    pub fn set_time_window(&mut self, window: Option<TimeWindow<T>>) -> &mut Self {
        if window != self.window {
            self.window = window;
            self.invalidate(Invalidate::TIME);
        }
        self
    }

    /// Read a child's start and end times if the time counter moved.
    pub fn sync_child_times(&mut self, index: usize) -> Result<(), LayoutError> {
        let live = self.versions.time();
        let len = self.children.len();
        let (Some(child), Some(slot)) = (self.children.get(index), self.slots.get_mut(index)) else {
            return Err(LayoutError::IndexOutOfRange { index, len });
        };
        if slot.times == Some(live) {
            return Ok(());
        }
        let (Some(read_start), Some(read_end)) = (&self.start_reader, &self.end_reader) else {
            return Err(LayoutError::MissingTimeReader);
        };
        slot.start = Some(read_start(child));
        slot.end = Some(read_end(child));
        slot.times = Some(live);
        Ok(())
    }

    /// A child's start and end times.
    pub fn child_times(&mut self, index: usize) -> Result<(T, T), LayoutError> {
        self.sync_child_times(index)?;
        let slot = &self.slots[index];
        match (&slot.start, &slot.end) {
            (Some(start), Some(end)) => Ok((start.clone(), end.clone())),
            _ => Err(LayoutError::MissingTimeReader),
        }
    }

    /// Bring a child's x and width up to date and return its bounds.
    ///
    /// The vertical half of the returned bounds may be stale.
    pub fn sync_child_horizontal(&mut self, index: usize) -> Result<Bounds, LayoutError> {
        self.sync_child_times(index)?;
        let live = self.versions.horizontal();
        let slot = &mut self.slots[index];
        let ChildBounds {
            lazy, start, end, ..
        } = slot;
        let projector = self.projector.as_deref();
        let window = self.window.as_ref();
        let (width, h_spacing) = (self.width, self.h_spacing);
        let (start_bound, end_bound) = (self.start_bound, self.end_bound);
        lazy.sync_horizontal(live, |b| {
            let projector = projector.ok_or(LayoutError::MissingProjector)?;
            let window = window.ok_or(LayoutError::MissingTimeWindow)?;
            let (Some(start), Some(end)) = (start.as_ref(), end.as_ref()) else {
                return Err(LayoutError::MissingTimeReader);
            };
            let start_x = projector.time_to_x(start, Side::Start, start_bound, window, width);
            let end_x = projector.time_to_x(end, Side::End, end_bound, window, width);
            b.x = start_x + h_spacing / 2.0;
            b.width = end_x - start_x - h_spacing;
            Ok(())
        })?;
        Ok(lazy.peek())
    }

    /// A child's column, re-read whenever the horizontal counter moves.
    pub fn child_column_index(&mut self, index: usize) -> Result<usize, LayoutError> {
        let live = self.versions.horizontal();
        let len = self.children.len();
        let (Some(child), Some(slot)) = (self.children.get(index), self.slots.get_mut(index)) else {
            return Err(LayoutError::IndexOutOfRange { index, len });
        };
        match slot.column {
            Some((stamp, column)) if stamp == live => Ok(column),
            _ => {
                let column = self.column_reader.as_ref().map_or(0, |read| read(child));
                slot.column = Some((live, column));
                Ok(column)
            }
        }
    }
}
