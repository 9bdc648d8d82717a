// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The hierarchical layout: row tree synchronization, recycling, and stacking.

use alloc::{rc::Rc, vec::Vec};
use core::{fmt, hash::Hash, mem};

use hashbrown::HashMap;
use kurbo::{Point, Rect};
use smallvec::SmallVec;
use understory_time_axis::{Temporal, TimeProjector, TimeWindow};
use understory_time_layout::{
    Bounds, Invalidate, LayoutCore, LayoutError, Reader, TimeLayer, cull,
};

use crate::row::Arena;
use crate::{GrandparentRow, HeaderPosition, Interval, ParentRow, RowId};

const DEFAULT_GRANDPARENT_HEADER_WIDTH: f64 = 150.0;
const DEFAULT_GRANDPARENT_HEADER_HEIGHT: f64 = 80.0;

/// A row reported by [`GanttLayout::visit_visible_rows`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum VisibleRow {
    /// A grandparent row; its parent rows follow.
    Grandparent(RowId),
    /// A parent row.
    Parent(RowId),
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum StackEntry {
    Grandparent(RowId),
    Parent(RowId),
}

#[derive(Copy, Clone, Debug, Default)]
struct ChildLink {
    row: Option<RowId>,
    member: usize,
}

/// A grandparent row whose height is known once its last parent is placed.
#[derive(Copy, Clone, Debug)]
struct OpenSection {
    id: RowId,
    y: f64,
    end: usize,
    parents: usize,
    last_bottom: Option<f64>,
}

/// Progress of the top-down placement of the stacked rows.
#[derive(Copy, Clone, Debug, Default)]
struct Sweep {
    version: Option<u64>,
    done: usize,
    cursor: f64,
    rows: usize,
    open: Option<OpenSection>,
}

/// A time layout that groups children into parent rows, and parent rows into
/// grandparent rows.
///
/// Children are attached to rows by key: `P` for parents, `G` for
/// grandparents. Rows are kept across passes, so a key that stays present
/// keeps its [`RowId`] and its cached geometry, and a key that disappears for
/// one pass gets its row back when it returns.
///
/// With tetris packing on, a parent row splits into as many sub-rows as its
/// overlapping children need, and each child keeps its sub-row from pass to
/// pass whenever possible.
///
/// The row tree is synchronized lazily, on the first read after the children
/// or the grouping inputs change.
pub struct GanttLayout<C, T, P, G> {
    core: LayoutCore<C, T>,
    child_parent: Option<Reader<C, Option<P>>>,
    child_grandparent: Option<Reader<C, Option<G>>>,
    parent_grandparent: Option<Reader<P, Option<G>>>,
    tetris_min_width: Option<Reader<C, f64>>,
    natural_height: Option<Reader<C, f64>>,
    tetris_packing: bool,
    parents_provided: bool,
    provided: Vec<P>,
    header_position: HeaderPosition,
    grandparent_header_width: f64,
    grandparent_header_height: f64,
    parent_header_width: f64,
    parents: Arena<ParentRow<C, P>>,
    grandparents: Arena<GrandparentRow<G>>,
    parent_map: HashMap<Option<P>, RowId>,
    grandparent_map: HashMap<G, RowId>,
    retired_parents: HashMap<Option<P>, RowId>,
    retired_grandparents: HashMap<G, RowId>,
    parent_order: Vec<RowId>,
    grandparent_order: Vec<RowId>,
    stack: Vec<StackEntry>,
    links: Vec<ChildLink>,
    tree_epoch: u64,
    built_tree: Option<(u64, u64)>,
    provided_epoch: u64,
    built_provided: Option<u64>,
    header_epoch: u64,
    packed_horizontal: Option<u64>,
    sweep: Sweep,
}

impl<C, T: fmt::Debug, P: fmt::Debug, G> fmt::Debug for GanttLayout<C, T, P, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GanttLayout")
            .field("core", &self.core)
            .field("tetris_packing", &self.tetris_packing)
            .field("parents_provided", &self.parents_provided)
            .field("provided", &self.provided)
            .field("header_position", &self.header_position)
            .field("parent_rows", &self.parent_order.len())
            .field("grandparent_rows", &self.grandparent_order.len())
            .field("parents", &self.parents)
            .field("grandparents", &self.grandparents)
            .finish_non_exhaustive()
    }
}

impl<C, T, P, G> Default for GanttLayout<C, T, P, G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, T, P, G> GanttLayout<C, T, P, G> {
    /// An empty layout: no grouping readers, packing off, headers on the left.
    pub fn new() -> Self {
        Self {
            core: LayoutCore::new(),
            child_parent: None,
            child_grandparent: None,
            parent_grandparent: None,
            tetris_min_width: None,
            natural_height: None,
            tetris_packing: false,
            parents_provided: false,
            provided: Vec::new(),
            header_position: HeaderPosition::Left,
            grandparent_header_width: DEFAULT_GRANDPARENT_HEADER_WIDTH,
            grandparent_header_height: DEFAULT_GRANDPARENT_HEADER_HEIGHT,
            parent_header_width: 0.0,
            parents: Arena::default(),
            grandparents: Arena::default(),
            parent_map: HashMap::new(),
            grandparent_map: HashMap::new(),
            retired_parents: HashMap::new(),
            retired_grandparents: HashMap::new(),
            parent_order: Vec::new(),
            grandparent_order: Vec::new(),
            stack: Vec::new(),
            links: Vec::new(),
            tree_epoch: 0,
            built_tree: None,
            provided_epoch: 0,
            built_provided: None,
            header_epoch: 0,
            packed_horizontal: None,
            sweep: Sweep::default(),
        }
    }

    /// Shared children, readers, window, and settings.
    pub fn core(&self) -> &LayoutCore<C, T> {
        &self.core
    }

    /// Mutable access to the shared state.
    pub fn core_mut(&mut self) -> &mut LayoutCore<C, T> {
        &mut self.core
    }

    /// Height measured by the last pass.
    pub fn height(&self) -> f64 {
        self.core.height()
    }

    fn tree_changed(&mut self) {
        self.tree_epoch += 1;
        self.core.mark_dirty();
    }

    // --- grouping ---

    /// Set how a child names its parent. Without a reader every child lands
    /// in one ungrouped row.
    pub fn set_child_parent_reader(&mut self, reader: Option<Reader<C, Option<P>>>) -> &mut Self {
        self.child_parent = reader;
        self.tree_changed();
        self
    }

    /// Set how a child names its grandparent. Takes precedence over the
    /// parent grandparent reader.
    pub fn set_child_grandparent_reader(
        &mut self,
        reader: Option<Reader<C, Option<G>>>,
    ) -> &mut Self {
        self.child_grandparent = reader;
        self.tree_changed();
        self
    }

    /// Set how a parent names its grandparent.
    pub fn set_parent_grandparent_reader(
        &mut self,
        reader: Option<Reader<P, Option<G>>>,
    ) -> &mut Self {
        self.parent_grandparent = reader;
        self.provided_epoch += 1;
        self.tree_changed();
        self
    }

    /// Widen packed intervals to at least this many pixels.
    pub fn set_child_tetris_min_width_reader(
        &mut self,
        reader: Option<Reader<C, f64>>,
    ) -> &mut Self {
        self.tetris_min_width = reader;
        self.packed_horizontal = None;
        self.core.invalidate(Invalidate::VERTICAL);
        self
    }

    /// Height of a child when no fixed child height is set.
    pub fn set_child_natural_height_reader(
        &mut self,
        reader: Option<Reader<C, f64>>,
    ) -> &mut Self {
        self.natural_height = reader;
        self.core.invalidate(Invalidate::VERTICAL);
        self
    }

    /// Whether overlapping children of a parent row are spread over sub-rows.
    pub fn is_tetris_packing(&self) -> bool {
        self.tetris_packing
    }

    /// Turn sub-row packing on or off.
    pub fn set_tetris_packing(&mut self, packing: bool) -> &mut Self {
        if packing != self.tetris_packing {
            self.tetris_packing = packing;
            self.packed_horizontal = None;
            self.tree_changed();
        }
        self
    }

    /// The caller-provided parent list.
    pub fn parents(&self) -> &[P] {
        &self.provided
    }

    /// Replace the caller-provided parent list. Only used in provided mode.
    pub fn set_parents(&mut self, parents: Vec<P>) -> &mut Self {
        self.provided = parents;
        self.provided_epoch += 1;
        self.core.mark_dirty();
        self
    }

    /// Whether parent rows come from [`set_parents`](Self::set_parents)
    /// rather than from the children.
    pub fn is_parents_provided(&self) -> bool {
        self.parents_provided
    }

    /// Switch between provided parent rows and rows derived from children.
    ///
    /// In provided mode the parent list fixes the rows and their order, even
    /// for parents without children. Children naming a parent that is not in
    /// the list belong to no row and are never visible.
    pub fn set_parents_provided(&mut self, provided: bool) -> &mut Self {
        if provided != self.parents_provided {
            self.parents_provided = provided;
            if provided {
                self.provided_epoch += 1;
            } else {
                self.tree_epoch += 1;
            }
            self.core.mark_dirty();
        }
        self
    }

    // --- headers ---

    /// Where grandparent headers sit.
    pub fn header_position(&self) -> HeaderPosition {
        self.header_position
    }

    /// Move the grandparent headers.
    pub fn set_header_position(&mut self, position: HeaderPosition) -> &mut Self {
        if position != self.header_position {
            self.header_position = position;
            self.header_epoch += 1;
            self.core.invalidate(Invalidate::VERTICAL);
        }
        self
    }

    /// Width of left or right grandparent headers.
    pub fn grandparent_header_width(&self) -> f64 {
        self.grandparent_header_width
    }

    /// Set the width of left or right grandparent headers.
    pub fn set_grandparent_header_width(&mut self, width: f64) -> &mut Self {
        if width != self.grandparent_header_width {
            self.grandparent_header_width = width;
            self.header_epoch += 1;
            self.core.mark_dirty();
        }
        self
    }

    /// Height of top or bottom grandparent headers.
    pub fn grandparent_header_height(&self) -> f64 {
        self.grandparent_header_height
    }

    /// Set the height of top or bottom grandparent headers.
    pub fn set_grandparent_header_height(&mut self, height: f64) -> &mut Self {
        if height != self.grandparent_header_height {
            self.grandparent_header_height = height;
            self.core.invalidate(Invalidate::VERTICAL);
        }
        self
    }

    /// Width of parent row headers.
    pub fn parent_header_width(&self) -> f64 {
        self.parent_header_width
    }

    /// Set the width of parent row headers.
    pub fn set_parent_header_width(&mut self, width: f64) -> &mut Self {
        if width != self.parent_header_width {
            self.parent_header_width = width;
            self.header_epoch += 1;
            self.core.mark_dirty();
        }
        self
    }

    // --- rows ---

    /// A parent row, if `id` is still allocated.
    pub fn parent_row(&self, id: RowId) -> Option<&ParentRow<C, P>> {
        self.parents.get(id)
    }

    /// A grandparent row, if `id` is still allocated.
    pub fn grandparent_row(&self, id: RowId) -> Option<&GrandparentRow<G>> {
        self.grandparents.get(id)
    }

    fn live_parent_pos(&self, id: RowId) -> Option<usize> {
        let row = self.parents.get(id)?;
        (self.stack.get(row.stack_pos) == Some(&StackEntry::Parent(id))).then_some(row.stack_pos)
    }

    fn live_grandparent_end(&self, id: RowId) -> Option<usize> {
        let row = self.grandparents.get(id)?;
        (self.stack.get(row.stack_pos) == Some(&StackEntry::Grandparent(id)))
            .then_some(row.section_end)
    }

    fn ungrouped_parents(&self) -> Vec<RowId> {
        self.parent_order
            .iter()
            .copied()
            .filter(|&id| self.parents.get(id).is_some_and(|r| r.grandparent.is_none()))
            .collect()
    }

    /// Flatten the rows into stacking order and link each row to the one above.
    ///
    /// Grandparent rows come first, each followed by its parent rows. Parent
    /// rows without a grandparent stack below all of them.
    fn build_stack(&mut self) {
        self.stack.clear();
        let mut above_grandparent = None;
        for &g in &self.grandparent_order {
            let Some(grandparent) = self.grandparents.get_mut(g) else {
                continue;
            };
            grandparent.above = above_grandparent;
            grandparent.stack_pos = self.stack.len();
            self.stack.push(StackEntry::Grandparent(g));
            let mut above = None;
            for &p in &grandparent.parents {
                if let Some(parent) = self.parents.get_mut(p) {
                    parent.above = above;
                    parent.stack_pos = self.stack.len();
                    self.stack.push(StackEntry::Parent(p));
                    above = Some(p);
                }
            }
            grandparent.section_end = self.stack.len();
            above_grandparent = Some(g);
        }
        let mut above = None;
        for &p in &self.parent_order {
            let Some(parent) = self.parents.get_mut(p) else {
                continue;
            };
            if parent.grandparent.is_some() {
                continue;
            }
            parent.above = above;
            parent.stack_pos = self.stack.len();
            self.stack.push(StackEntry::Parent(p));
            above = Some(p);
        }
    }
}

impl<C, T, P, G> GanttLayout<C, T, P, G>
where
    C: Clone + PartialEq,
    P: Clone + Eq + Hash,
    G: Clone + Eq + Hash,
{
    // --- tree synchronization ---

    /// Bring the row tree up to date with the children and grouping inputs.
    ///
    /// Every read does this on its own; calling it directly is only useful
    /// before inspecting rows through [`parent_row`](Self::parent_row).
    pub fn sync_tree(&mut self) {
        if self.parents_provided && self.built_provided != Some(self.provided_epoch) {
            self.sync_from_provided();
            self.built_provided = Some(self.provided_epoch);
        }
        let stamp = (self.core.children_version(), self.tree_epoch);
        if self.built_tree != Some(stamp) {
            self.sync_from_children();
            self.built_tree = Some(stamp);
            self.core.invalidate(Invalidate::VERTICAL);
        }
    }

    /// Parent rows in creation order.
    pub fn parent_rows(&mut self) -> &[RowId] {
        self.sync_tree();
        &self.parent_order
    }

    /// Grandparent rows in creation order.
    pub fn grandparent_rows(&mut self) -> &[RowId] {
        self.sync_tree();
        &self.grandparent_order
    }

    fn read_parent(&self, index: usize) -> Option<P> {
        let child = self.core.children().get(index)?;
        self.child_parent.as_ref().and_then(|read| read(child))
    }

    fn read_grandparent(&self, index: usize, parent: Option<&P>) -> Option<G> {
        if let Some(read) = &self.child_grandparent {
            return self.core.children().get(index).and_then(|c| read(c));
        }
        match (parent, &self.parent_grandparent) {
            (Some(parent), Some(read)) => read(parent),
            _ => None,
        }
    }

    fn begin_recycling(&mut self) -> (HashMap<Option<P>, RowId>, HashMap<G, RowId>) {
        self.parent_order.clear();
        self.grandparent_order.clear();
        (
            mem::take(&mut self.parent_map),
            mem::take(&mut self.grandparent_map),
        )
    }

    /// Find the row for a grandparent key: this pass, last pass, the pass
    /// before that, or a new one.
    fn resolve_grandparent(&mut self, key: G, old: &mut HashMap<G, RowId>) -> RowId {
        if let Some(&id) = self.grandparent_map.get(&key) {
            return id;
        }
        let revived = old
            .remove(&key)
            .or_else(|| self.retired_grandparents.remove(&key))
            .filter(|&id| self.grandparents.is_alive(id));
        let id = if let Some(id) = revived {
            if let Some(row) = self.grandparents.get_mut(id) {
                row.recycle();
            }
            tracing::trace!(?id, "grandparent row recycled");
            id
        } else {
            let id = self.grandparents.insert(GrandparentRow::new(key.clone()));
            tracing::trace!(?id, "grandparent row created");
            id
        };
        self.grandparent_map.insert(key, id);
        self.grandparent_order.push(id);
        id
    }

    fn resolve_parent(
        &mut self,
        key: Option<P>,
        grandparent: Option<RowId>,
        old: &mut HashMap<Option<P>, RowId>,
    ) -> RowId {
        if let Some(&id) = self.parent_map.get(&key) {
            return id;
        }
        let revived = old
            .remove(&key)
            .or_else(|| self.retired_parents.remove(&key))
            .filter(|&id| self.parents.is_alive(id));
        let id = if let Some(id) = revived {
            if let Some(row) = self.parents.get_mut(id) {
                row.recycle(grandparent);
            }
            tracing::trace!(?id, "parent row recycled");
            id
        } else {
            let id = self.parents.insert(ParentRow::new(key.clone(), grandparent));
            tracing::trace!(?id, "parent row created");
            id
        };
        self.parent_map.insert(key, id);
        self.parent_order.push(id);
        if let Some(row) = grandparent.and_then(|g| self.grandparents.get_mut(g)) {
            row.parents.push(id);
        }
        id
    }

    /// Drop rows that sat out the previous pass and retire the ones that sat
    /// out this one.
    fn end_recycling(
        &mut self,
        old_parents: HashMap<Option<P>, RowId>,
        old_grandparents: HashMap<G, RowId>,
    ) {
        let mut freed = 0_usize;
        for (_, id) in self.retired_parents.drain() {
            freed += usize::from(self.parents.remove(id).is_some());
        }
        for (_, id) in self.retired_grandparents.drain() {
            freed += usize::from(self.grandparents.remove(id).is_some());
        }
        for &id in old_parents.values() {
            if let Some(row) = self.parents.get_mut(id) {
                row.recycle(None);
            }
        }
        for &id in old_grandparents.values() {
            if let Some(row) = self.grandparents.get_mut(id) {
                row.recycle();
            }
        }
        let retired = old_parents.len() + old_grandparents.len();
        self.retired_parents = old_parents;
        self.retired_grandparents = old_grandparents;
        self.build_stack();
        tracing::trace!(retired, freed, "row recycling finished");
    }

    fn sync_from_provided(&mut self) {
        let (mut old_parents, mut old_grandparents) = self.begin_recycling();
        let provided = mem::take(&mut self.provided);
        for parent in &provided {
            let grandparent = self
                .parent_grandparent
                .as_ref()
                .and_then(|read| read(parent))
                .map(|g| self.resolve_grandparent(g, &mut old_grandparents));
            self.resolve_parent(Some(parent.clone()), grandparent, &mut old_parents);
        }
        self.provided = provided;
        self.end_recycling(old_parents, old_grandparents);
        self.tree_epoch += 1;
        tracing::debug!(
            parents = self.parent_order.len(),
            grandparents = self.grandparent_order.len(),
            "row tree synced from provided parents"
        );
    }

    fn sync_from_children(&mut self) {
        let count = self.core.child_count();
        self.links.clear();
        self.links.resize(count, ChildLink::default());
        if self.parents_provided {
            for &id in &self.parent_order {
                if let Some(row) = self.parents.get_mut(id) {
                    row.members.clear();
                    row.packer.reset_members();
                }
            }
            for index in 0..count {
                let row = self
                    .read_parent(index)
                    .and_then(|key| self.parent_map.get(&Some(key)).copied());
                if let Some(row) = row {
                    self.attach(index, row);
                }
            }
        } else {
            let (mut old_parents, mut old_grandparents) = self.begin_recycling();
            for index in 0..count {
                let key = self.read_parent(index);
                let grandparent = self
                    .read_grandparent(index, key.as_ref())
                    .map(|g| self.resolve_grandparent(g, &mut old_grandparents));
                let row = self.resolve_parent(key, grandparent, &mut old_parents);
                self.attach(index, row);
            }
            self.end_recycling(old_parents, old_grandparents);
        }
        tracing::debug!(
            children = count,
            parents = self.parent_order.len(),
            grandparents = self.grandparent_order.len(),
            provided = self.parents_provided,
            "row tree synced from children"
        );
    }

    fn attach(&mut self, index: usize, id: RowId) {
        let (Some(child), Some(row)) = (self.core.children().get(index), self.parents.get_mut(id))
        else {
            return;
        };
        row.members.push(index);
        let member = row.packer.push(child.clone());
        self.links[index] = ChildLink {
            row: Some(id),
            member,
        };
    }
}

impl<C, T, P, G> GanttLayout<C, T, P, G>
where
    C: Clone + PartialEq,
    T: Temporal,
    P: Clone + Eq + Hash,
    G: Clone + Eq + Hash,
{
    /// Sync the tree, and repack when the horizontal geometry moved.
    fn prepare(&mut self) {
        self.sync_tree();
        if !self.tetris_packing {
            return;
        }
        let live = self.core.versions().horizontal();
        if self.packed_horizontal != Some(live) {
            for &id in &self.parent_order {
                if let Some(row) = self.parents.get_mut(id) {
                    row.packer.restart();
                }
            }
            self.packed_horizontal = Some(live);
            self.core.invalidate(Invalidate::VERTICAL);
        }
    }

    // --- child queries ---

    /// The parent row a child belongs to, if any.
    pub fn child_parent_row(&mut self, index: usize) -> Result<Option<RowId>, LayoutError> {
        self.prepare();
        self.core.check_index(index)?;
        Ok(self.links.get(index).and_then(|link| link.row))
    }

    /// Sub-row of a child within its parent row; always 0 without packing.
    pub fn child_sub_row(&mut self, index: usize) -> Result<Option<usize>, LayoutError> {
        self.prepare();
        self.core.check_index(index)?;
        let Some(link) = self.links.get(index).copied() else {
            return Ok(None);
        };
        let Some(id) = link.row else {
            return Ok(None);
        };
        if !self.tetris_packing {
            return Ok(Some(0));
        }
        let Some(ParentRow {
            members, packer, ..
        }) = self.parents.get_mut(id)
        else {
            return Ok(None);
        };
        let core = &mut self.core;
        let min_width = self.tetris_min_width.as_ref();
        packer
            .resolve(link.member, |m| child_interval(core, min_width, members[m]))
            .map(Some)
    }

    /// Row of a child counted from the top, over every grandparent row and
    /// every sub-row above it.
    pub fn child_row_index(&mut self, index: usize) -> Result<Option<usize>, LayoutError> {
        let Some(id) = self.child_parent_row(index)? else {
            return Ok(None);
        };
        let Some(pos) = self.live_parent_pos(id) else {
            return Ok(None);
        };
        self.sweep_to(pos + 1)?;
        let sub_row = self.child_sub_row(index)?.unwrap_or(0);
        Ok(self.parents.get(id).map(|row| row.first_row_index + sub_row))
    }

    /// Fully synced bounds of a child.
    ///
    /// A child that belongs to no row sits at the top with zero height.
    pub fn child_bounds(&mut self, index: usize) -> Result<Bounds, LayoutError> {
        self.core.sync_child_horizontal(index)?;
        self.sync_child_vertical(index)?;
        Ok(self
            .core
            .slot(index)
            .map(|s| s.lazy().peek())
            .unwrap_or_default())
    }

    fn sync_child_vertical(&mut self, index: usize) -> Result<(), LayoutError> {
        self.prepare();
        self.core.check_index(index)?;
        let live = self.core.versions().vertical();
        if self
            .core
            .slot(index)
            .is_some_and(|s| s.lazy().is_vertical_valid(live))
        {
            return Ok(());
        }
        let row = self.links.get(index).and_then(|link| link.row);
        let (y, height) = match row.and_then(|id| self.live_parent_pos(id).map(|pos| (id, pos))) {
            Some((id, pos)) => {
                self.sweep_to(pos + 1)?;
                let sub_row = self.child_sub_row(index)?.unwrap_or(0);
                let v_spacing = self.core.v_spacing();
                let offset = self
                    .parents
                    .get(id)
                    .map(|r| {
                        r.bounds.peek().y + r.sub_row_offsets.get(sub_row).copied().unwrap_or(v_spacing)
                    })
                    .unwrap_or_default();
                (offset, self.child_height(index))
            }
            None => (self.core.top_y(), 0.0),
        };
        if let Some(slot) = self.core.slot_mut(index) {
            slot.lazy_mut().set_vertical(y, height, live);
        }
        Ok(())
    }

    fn child_height(&self, index: usize) -> f64 {
        if let Some(fixed) = self.core.child_fixed_height() {
            return fixed;
        }
        match (&self.natural_height, self.core.children().get(index)) {
            (Some(read), Some(child)) => read(child),
            _ => 0.0,
        }
    }

    // --- row queries ---

    /// Number of sub-rows in a parent row; 1 without packing.
    pub fn parent_row_sub_rows(&mut self, id: RowId) -> Result<Option<usize>, LayoutError> {
        self.prepare();
        if self.live_parent_pos(id).is_none() {
            return Ok(None);
        }
        if !self.tetris_packing {
            return Ok(Some(1));
        }
        let Some(ParentRow {
            members, packer, ..
        }) = self.parents.get_mut(id)
        else {
            return Ok(None);
        };
        let core = &mut self.core;
        let min_width = self.tetris_min_width.as_ref();
        packer
            .resolve_all(|m| child_interval(core, min_width, members[m]))
            .map(Some)
    }

    /// Grandparent rows plus every parent row or sub-row.
    pub fn rows_count(&mut self) -> Result<usize, LayoutError> {
        self.prepare();
        self.sweep_to(self.stack.len())?;
        Ok(self.sweep.rows)
    }

    /// Bounds of a parent row, or `None` if the row is not in the tree.
    pub fn parent_row_bounds(&mut self, id: RowId) -> Result<Option<Bounds>, LayoutError> {
        self.prepare();
        let Some(pos) = self.live_parent_pos(id) else {
            return Ok(None);
        };
        self.sweep_to(pos + 1)?;
        self.sync_parent_horizontal(id);
        Ok(self.parents.get(id).map(|row| row.bounds.peek()))
    }

    /// Bounds of a parent row's header.
    pub fn parent_header_bounds(&mut self, id: RowId) -> Result<Option<Bounds>, LayoutError> {
        if self.parent_row_bounds(id)?.is_none() {
            return Ok(None);
        }
        Ok(self.parents.get(id).map(|row| row.header.peek()))
    }

    /// Bounds of a grandparent row, spanning all of its parent rows.
    pub fn grandparent_row_bounds(&mut self, id: RowId) -> Result<Option<Bounds>, LayoutError> {
        self.prepare();
        let Some(end) = self.live_grandparent_end(id) else {
            return Ok(None);
        };
        self.sweep_to(end)?;
        self.sync_grandparent_horizontal(id);
        Ok(self.grandparents.get(id).map(|row| row.bounds.peek()))
    }

    /// Bounds of a grandparent row's header.
    pub fn grandparent_header_bounds(
        &mut self,
        id: RowId,
    ) -> Result<Option<Bounds>, LayoutError> {
        if self.grandparent_row_bounds(id)?.is_none() {
            return Ok(None);
        }
        Ok(self.grandparents.get(id).map(|row| row.header.peek()))
    }

    /// Left edge of the parent header column.
    ///
    /// Every parent row's header starts here, grouped or not, so headers line
    /// up in one column next to the grandparent headers.
    pub fn parent_header_min_x(&self) -> f64 {
        match self.header_position {
            HeaderPosition::Left => self.grandparent_header_width,
            HeaderPosition::Right | HeaderPosition::Top | HeaderPosition::Bottom => 0.0,
        }
    }

    /// Right edge of the parent header column.
    pub fn parent_header_max_x(&self) -> f64 {
        self.parent_header_min_x() + self.parent_header_width
    }

    fn row_horizontal_version(&self) -> u64 {
        self.core.versions().horizontal() + self.header_epoch
    }

    fn sync_parent_horizontal(&mut self, id: RowId) {
        let live = self.row_horizontal_version();
        let width = self.core.width();
        let header_width = self.grandparent_header_width;
        let position = self.header_position;
        let parent_header_width = self.parent_header_width;
        let header_x = self.parent_header_min_x();
        let Some(row) = self.parents.get_mut(id) else {
            return;
        };
        if row.bounds.is_horizontal_valid(live) {
            return;
        }
        let (x, row_width) = match (row.grandparent.is_some(), position) {
            (true, HeaderPosition::Left) => (header_width, width - header_width),
            (true, HeaderPosition::Right) => (0.0, width - header_width),
            _ => (0.0, width),
        };
        row.bounds.set_horizontal(x, row_width, live);
        row.header.set_horizontal(header_x, parent_header_width, live);
    }

    fn sync_grandparent_horizontal(&mut self, id: RowId) {
        let live = self.row_horizontal_version();
        let width = self.core.width();
        let header_width = self.grandparent_header_width;
        let position = self.header_position;
        let Some(row) = self.grandparents.get_mut(id) else {
            return;
        };
        if row.bounds.is_horizontal_valid(live) {
            return;
        }
        let (header_x, header_w) = match position {
            HeaderPosition::Left => (0.0, header_width),
            HeaderPosition::Right => (width - header_width, header_width),
            HeaderPosition::Top | HeaderPosition::Bottom => (0.0, width),
        };
        row.bounds.set_horizontal(0.0, width, live);
        row.header.set_horizontal(header_x, header_w, live);
    }

    // --- vertical sweep ---

    /// Place rows top to bottom until the first `end` stack entries are done.
    ///
    /// Progress is kept until the vertical counter moves, so reading rows in
    /// order costs one placement per row.
    fn sweep_to(&mut self, end: usize) -> Result<(), LayoutError> {
        let live = self.core.versions().vertical();
        if self.sweep.version != Some(live) {
            self.sweep = Sweep {
                version: Some(live),
                cursor: self.core.top_y(),
                ..Sweep::default()
            };
        }
        let end = end.min(self.stack.len());
        while self.sweep.done < end {
            match self.stack[self.sweep.done] {
                StackEntry::Grandparent(id) => self.open_section(id),
                StackEntry::Parent(id) => self.place_parent(id, live)?,
            }
            self.sweep.done += 1;
            if self
                .sweep
                .open
                .is_some_and(|open| open.end == self.sweep.done)
            {
                self.close_section(live);
            }
        }
        Ok(())
    }

    fn open_section(&mut self, id: RowId) {
        let Some(row) = self.grandparents.get(id) else {
            return;
        };
        let y = self.sweep.cursor;
        self.sweep.open = Some(OpenSection {
            id,
            y,
            end: row.section_end,
            parents: 0,
            last_bottom: None,
        });
        self.sweep.rows += 1;
        if self.header_position == HeaderPosition::Top {
            self.sweep.cursor += self.grandparent_header_height;
        }
    }

    fn close_section(&mut self, live: u64) {
        let Some(open) = self.sweep.open.take() else {
            return;
        };
        let position = self.header_position;
        let header_height = self.grandparent_header_height;
        let height = match self.parent_fixed_height() {
            Some(fixed) => {
                let band = if position.is_horizontal_band() {
                    header_height
                } else {
                    0.0
                };
                open.parents as f64 * fixed + band
            }
            None => {
                let top_band = if position == HeaderPosition::Top {
                    header_height
                } else {
                    0.0
                };
                let bottom_band = if position == HeaderPosition::Bottom {
                    header_height
                } else {
                    0.0
                };
                open.last_bottom.unwrap_or(open.y + top_band) - open.y + bottom_band
            }
        };
        let (header_y, header_h) = match position {
            HeaderPosition::Top => (open.y, header_height),
            HeaderPosition::Bottom => (open.y + height - header_height, header_height),
            HeaderPosition::Left | HeaderPosition::Right => (open.y, height),
        };
        if let Some(row) = self.grandparents.get_mut(open.id) {
            row.bounds.set_vertical(open.y, height, live);
            row.header.set_vertical(header_y, header_h, live);
        }
        self.sweep.cursor = open.y + height;
    }

    /// Height every parent row shares when children have a fixed height and
    /// each row holds a single sub-row.
    fn parent_fixed_height(&self) -> Option<f64> {
        let v_spacing = self.core.v_spacing();
        self.core
            .child_fixed_height()
            .filter(|_| !self.tetris_packing)
            .map(|fixed| fixed + 2.0 * v_spacing)
    }

    fn place_parent(&mut self, id: RowId, live: u64) -> Result<(), LayoutError> {
        let (height, sub_rows) = self.measure_parent(id)?;
        let y = self.sweep.cursor;
        if let Some(row) = self.parents.get_mut(id) {
            row.bounds.set_vertical(y, height, live);
            row.header.set_vertical(y, height, live);
            row.first_row_index = self.sweep.rows;
        }
        self.sweep.rows += if self.tetris_packing { sub_rows } else { 1 };
        let bottom = y + height;
        self.sweep.cursor = bottom;
        if let Some(open) = &mut self.sweep.open {
            open.parents += 1;
            open.last_bottom = Some(bottom);
        }
        Ok(())
    }

    /// Pack a parent row and size its sub-rows. Returns the row height and
    /// the sub-row count.
    fn measure_parent(&mut self, id: RowId) -> Result<(f64, usize), LayoutError> {
        let fixed = self.core.child_fixed_height();
        let v_spacing = self.core.v_spacing();
        let packing = self.tetris_packing;
        let Some(ParentRow {
            members,
            packer,
            sub_row_offsets,
            ..
        }) = self.parents.get_mut(id)
        else {
            return Ok((0.0, 1));
        };
        let sub_rows = if packing {
            let core = &mut self.core;
            let min_width = self.tetris_min_width.as_ref();
            packer.resolve_all(|m| child_interval(core, min_width, members[m]))?
        } else {
            1
        };

        let mut heights: SmallVec<[f64; 4]> = SmallVec::from_elem(0.0, sub_rows);
        match (fixed, &self.natural_height) {
            (Some(fixed), _) => heights.fill(fixed),
            (None, Some(read)) => {
                let children = self.core.children();
                if packing {
                    for (sub_row, row_members) in packer.sub_rows().enumerate() {
                        for m in row_members {
                            heights[sub_row] = heights[sub_row].max(read(&children[members[m]]));
                        }
                    }
                } else {
                    for &index in members.iter() {
                        heights[0] = heights[0].max(read(&children[index]));
                    }
                }
            }
            (None, None) => {}
        }

        sub_row_offsets.clear();
        let mut y = v_spacing;
        for &h in &heights {
            sub_row_offsets.push(y);
            y += h + v_spacing;
        }
        Ok((y, sub_rows))
    }

    // --- passes ---

    /// Run a pass: the height becomes the bottom of the last stacked row.
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
        self.prepare();
        self.sweep_to(self.stack.len())?;
        if self.stack.is_empty() {
            Ok(0.0)
        } else {
            Ok(self.sweep.cursor)
        }
    }

    /// Pick the first attached child whose bounds contain `point`.
    pub fn pick_child_at(
        &mut self,
        point: Point,
        only_if_selectable: bool,
    ) -> Result<Option<usize>, LayoutError> {
        if only_if_selectable && !self.core.is_selection_enabled() {
            return Ok(None);
        }
        for index in 0..self.core.child_count() {
            if self.child_parent_row(index)?.is_none() {
                continue;
            }
            if self.child_bounds(index)?.contains(point) {
                return Ok(Some(index));
            }
        }
        Ok(None)
    }

    // --- traversal ---

    /// Call `visit` with each attached child whose bounds, shifted by
    /// `origin`, meet `area`.
    ///
    /// Rows are culled top-down first, so only the children of visible rows
    /// are measured.
    pub fn visit_visible_children(
        &mut self,
        area: Rect,
        origin: Point,
        mut visit: impl FnMut(usize, Rect),
    ) -> Result<(), LayoutError> {
        self.visit_children_dyn(area, origin, &mut visit)
    }

    fn visit_children_dyn(
        &mut self,
        area: Rect,
        origin: Point,
        visit: &mut dyn FnMut(usize, Rect),
    ) -> Result<(), LayoutError> {
        if !self.core.is_visible() {
            return Ok(());
        }
        self.layout_if_dirty()?;
        self.prepare();
        let grandparents = self.grandparent_order.clone();
        cull::visit_visible(
            self,
            grandparents,
            true,
            area,
            origin,
            |gantt, &id| Ok(gantt.grandparent_row_bounds(id)?.unwrap_or(Bounds::ZERO)),
            |gantt, id, _| {
                let parents = gantt
                    .grandparents
                    .get(id)
                    .map(|row| row.parents.clone())
                    .unwrap_or_default();
                gantt.visit_children_of(parents, area, origin, visit)
            },
        )?;
        let ungrouped = self.ungrouped_parents();
        self.visit_children_of(ungrouped, area, origin, visit)
    }

    fn visit_children_of(
        &mut self,
        rows: Vec<RowId>,
        area: Rect,
        origin: Point,
        visit: &mut dyn FnMut(usize, Rect),
    ) -> Result<(), LayoutError> {
        cull::visit_visible(
            self,
            rows,
            true,
            area,
            origin,
            |gantt, &id| Ok(gantt.parent_row_bounds(id)?.unwrap_or(Bounds::ZERO)),
            |gantt, id, _| {
                let members = gantt
                    .parents
                    .get(id)
                    .map(|row| row.members.clone())
                    .unwrap_or_default();
                cull::visit_visible(
                    gantt,
                    members,
                    false,
                    area,
                    origin,
                    |gantt, &index| gantt.child_bounds(index),
                    |_, index, rect| {
                        visit(index, rect);
                        Ok(())
                    },
                )
            },
        )
    }

    /// Call `visit` with each row whose bounds, shifted by `origin`, meet
    /// `area`. A grandparent row is reported before its parent rows.
    pub fn visit_visible_rows(
        &mut self,
        area: Rect,
        origin: Point,
        mut visit: impl FnMut(VisibleRow, Rect),
    ) -> Result<(), LayoutError> {
        if !self.core.is_visible() {
            return Ok(());
        }
        self.layout_if_dirty()?;
        self.prepare();
        let grandparents = self.grandparent_order.clone();
        cull::visit_visible(
            self,
            grandparents,
            true,
            area,
            origin,
            |gantt, &id| Ok(gantt.grandparent_row_bounds(id)?.unwrap_or(Bounds::ZERO)),
            |gantt, id, rect| {
                visit(VisibleRow::Grandparent(id), rect);
                let parents = gantt
                    .grandparents
                    .get(id)
                    .map(|row| row.parents.clone())
                    .unwrap_or_default();
                gantt.visit_parent_rows(parents, area, origin, &mut visit)
            },
        )?;
        let ungrouped = self.ungrouped_parents();
        self.visit_parent_rows(ungrouped, area, origin, &mut visit)
    }

    fn visit_parent_rows(
        &mut self,
        rows: Vec<RowId>,
        area: Rect,
        origin: Point,
        visit: &mut dyn FnMut(VisibleRow, Rect),
    ) -> Result<(), LayoutError> {
        cull::visit_visible(
            self,
            rows,
            true,
            area,
            origin,
            |gantt, &id| Ok(gantt.parent_row_bounds(id)?.unwrap_or(Bounds::ZERO)),
            |_, id, rect| {
                visit(VisibleRow::Parent(id), rect);
                Ok(())
            },
        )
    }
}

fn child_interval<C, T: Temporal>(
    core: &mut LayoutCore<C, T>,
    min_width: Option<&Reader<C, f64>>,
    index: usize,
) -> Result<Interval, LayoutError> {
    let bounds = core.sync_child_horizontal(index)?;
    let widened = match (min_width, core.children().get(index)) {
        (Some(read), Some(child)) => bounds.x + read(child),
        _ => bounds.max_x(),
    };
    Ok(Interval::new(bounds.x, bounds.max_x().max(widened)))
}

impl<C, T, P, G> TimeLayer<T> for GanttLayout<C, T, P, G>
where
    C: Clone + PartialEq,
    T: Temporal,
    P: Clone + Eq + Hash,
    G: Clone + Eq + Hash,
{
    fn set_time_window(&mut self, window: Option<TimeWindow<T>>) {
        self.core.set_time_window(window);
    }

    fn set_width(&mut self, width: f64) {
        self.core.set_width(width);
    }

    fn set_projector(&mut self, projector: Rc<dyn TimeProjector<T>>) {
        self.core.set_projector(projector);
    }

    fn is_visible(&self) -> bool {
        self.core.is_visible()
    }

    fn top_y(&self) -> f64 {
        self.core.top_y()
    }

    fn height(&self) -> f64 {
        self.core.height()
    }

    fn child_count(&self) -> usize {
        self.core.child_count()
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
        self.core.selected_child()
    }

    fn select_child(&mut self, index: Option<usize>) -> Result<(), LayoutError> {
        self.core.select_child(index)
    }

    fn visit_visible_children(
        &mut self,
        area: Rect,
        origin: Point,
        visit: &mut dyn FnMut(usize, Rect),
    ) -> Result<(), LayoutError> {
        self.visit_children_dyn(area, origin, visit)
    }
}
