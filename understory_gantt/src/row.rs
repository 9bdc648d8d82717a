// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row identifiers, row records, and the arena that recycles them.

use alloc::vec::Vec;
use core::fmt;

use smallvec::SmallVec;
use understory_time_layout::LazyBounds;

use crate::TetrisPacker;

/// Identifier for a parent or grandparent row (generational).
///
/// A row keeps its id for as long as its key keeps showing up, so comparing
/// ids across passes tells whether a row was reused.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct RowId(pub(crate) u32, pub(crate) u32);

impl RowId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// Where grandparent headers sit relative to their rows.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum HeaderPosition {
    /// A column on the left; parent rows start after it.
    #[default]
    Left,
    /// A column on the right; parent rows end before it.
    Right,
    /// A band above the parent rows.
    Top,
    /// A band below the parent rows.
    Bottom,
}

impl HeaderPosition {
    /// Returns `true` for the bands that add to the row height.
    pub const fn is_horizontal_band(self) -> bool {
        matches!(self, Self::Top | Self::Bottom)
    }
}

/// A row grouping the children that share a parent key.
///
/// Children with no parent key share one row keyed `None`.
pub struct ParentRow<C, P> {
    pub(crate) key: Option<P>,
    pub(crate) grandparent: Option<RowId>,
    pub(crate) above: Option<RowId>,
    pub(crate) members: Vec<usize>,
    pub(crate) packer: TetrisPacker<C>,
    pub(crate) bounds: LazyBounds,
    pub(crate) header: LazyBounds,
    pub(crate) sub_row_offsets: SmallVec<[f64; 4]>,
    pub(crate) first_row_index: usize,
    pub(crate) stack_pos: usize,
}

impl<C, P: fmt::Debug> fmt::Debug for ParentRow<C, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParentRow")
            .field("key", &self.key)
            .field("grandparent", &self.grandparent)
            .field("above", &self.above)
            .field("members", &self.members.len())
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl<C, P> ParentRow<C, P> {
    pub(crate) fn new(key: Option<P>, grandparent: Option<RowId>) -> Self {
        Self {
            key,
            grandparent,
            above: None,
            members: Vec::new(),
            packer: TetrisPacker::new(),
            bounds: LazyBounds::new(),
            header: LazyBounds::new(),
            sub_row_offsets: SmallVec::new(),
            first_row_index: 0,
            stack_pos: 0,
        }
    }

    /// The parent key, or `None` for the ungrouped row.
    pub fn key(&self) -> Option<&P> {
        self.key.as_ref()
    }

    /// The grandparent row this row is stacked under.
    pub fn grandparent(&self) -> Option<RowId> {
        self.grandparent
    }

    /// The previous parent row in the same group.
    pub fn above(&self) -> Option<RowId> {
        self.above
    }

    /// Child indices attached to this row, in child order.
    pub fn members(&self) -> &[usize] {
        &self.members
    }
}

impl<C: PartialEq, P> ParentRow<C, P> {
    /// Detach everything and move under `grandparent` for the next pass.
    ///
    /// The packing history survives so that a revived row packs the way it
    /// did before.
    pub(crate) fn recycle(&mut self, grandparent: Option<RowId>) {
        self.grandparent = grandparent;
        self.above = None;
        self.members.clear();
        self.packer.reset_members();
        self.bounds.invalidate();
        self.header.invalidate();
        self.sub_row_offsets.clear();
    }
}

/// A row grouping parent rows that share a grandparent key.
pub struct GrandparentRow<G> {
    pub(crate) key: G,
    pub(crate) above: Option<RowId>,
    pub(crate) parents: Vec<RowId>,
    pub(crate) bounds: LazyBounds,
    pub(crate) header: LazyBounds,
    pub(crate) stack_pos: usize,
    pub(crate) section_end: usize,
}

impl<G: fmt::Debug> fmt::Debug for GrandparentRow<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrandparentRow")
            .field("key", &self.key)
            .field("above", &self.above)
            .field("parents", &self.parents)
            .field("bounds", &self.bounds)
            .finish_non_exhaustive()
    }
}

impl<G> GrandparentRow<G> {
    pub(crate) fn new(key: G) -> Self {
        Self {
            key,
            above: None,
            parents: Vec::new(),
            bounds: LazyBounds::new(),
            header: LazyBounds::new(),
            stack_pos: 0,
            section_end: 0,
        }
    }

    pub(crate) fn recycle(&mut self) {
        self.above = None;
        self.parents.clear();
        self.bounds.invalidate();
        self.header.invalidate();
    }

    /// The grandparent key.
    pub fn key(&self) -> &G {
        &self.key
    }

    /// The previous grandparent row.
    pub fn above(&self) -> Option<RowId> {
        self.above
    }

    /// Parent rows stacked in this row, top to bottom.
    pub fn parents(&self) -> &[RowId] {
        &self.parents
    }
}

/// Slot storage with generation checks and a free list.
pub(crate) struct Arena<R> {
    slots: Vec<Option<R>>,
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl<R> fmt::Debug for Arena<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let live = self.slots.iter().filter(|s| s.is_some()).count();
        f.debug_struct("Arena")
            .field("live", &live)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl<R> Default for Arena<R> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }
}

impl<R> Arena<R> {
    pub(crate) fn insert(&mut self, row: R) -> RowId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.slots[idx] = Some(row);
            (idx, generation)
        } else {
            self.slots.push(Some(row));
            self.generations.push(1);
            (self.slots.len() - 1, 1)
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "RowId uses 32-bit indices."
        )]
        let idx = idx as u32;
        RowId::new(idx, generation)
    }

    pub(crate) fn remove(&mut self, id: RowId) -> Option<R> {
        if !self.is_alive(id) {
            return None;
        }
        self.free_list.push(id.idx());
        self.slots[id.idx()].take()
    }

    pub(crate) fn is_alive(&self, id: RowId) -> bool {
        self.slots.get(id.idx()).is_some_and(Option::is_some)
            && self.generations.get(id.idx()) == Some(&id.1)
    }

    pub(crate) fn get(&self, id: RowId) -> Option<&R> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.idx()].as_ref()
    }

    pub(crate) fn get_mut(&mut self, id: RowId) -> Option<&mut R> {
        if !self.is_alive(id) {
            return None;
        }
        self.slots[id.idx()].as_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_ids_are_rejected_after_reuse() {
        let mut arena = Arena::default();
        let a = arena.insert("a");
        assert_eq!(arena.remove(a), Some("a"), "removed");
        let b = arena.insert("b");
        assert_eq!(a.idx(), b.idx(), "slot reused");
        assert_ne!(a, b, "generation differs");
        assert_eq!(arena.get(a), None, "stale id");
        assert_eq!(arena.get(b), Some(&"b"), "live id");
        assert_eq!(arena.remove(a), None, "stale remove is a no-op");
    }

    #[test]
    fn header_bands() {
        assert!(HeaderPosition::Top.is_horizontal_band(), "top");
        assert!(HeaderPosition::Bottom.is_horizontal_band(), "bottom");
        assert!(!HeaderPosition::default().is_horizontal_band(), "left");
    }
}
