// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Greedy interval packing into sub-rows, biased towards the previous result.

use alloc::vec::Vec;
use core::mem;

/// A horizontal pixel span `[min, max]`.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Interval {
    /// Left edge.
    pub min: f64,
    /// Right edge.
    pub max: f64,
}

impl Interval {
    /// Create an interval from its edges.
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns `true` if the two spans cannot share a sub-row.
    ///
    /// Spans that start together or end together always overlap, even when
    /// empty. Otherwise the earlier-starting span must reach strictly past the
    /// start of the other one; spans that merely touch do not overlap.
    pub fn overlaps(&self, other: &Self) -> bool {
        if self.min == other.min || self.max == other.max {
            return true;
        }
        if self.min < other.min {
            self.max > other.min
        } else {
            other.max > self.min
        }
    }
}

/// Assigns members to the fewest overlap-free sub-rows it can find.
///
/// Members are identified by key (`K`) across passes. Placement is greedy
/// first-fit in request order, so the result is not always minimal, but it is
/// stable: after [`TetrisPacker::restart`], the first resolution replays the
/// previous partition top to bottom, re-placing every member that is still
/// present before anything new. Members keep their old sub-row unless
/// something they now overlap took it first, which keeps rows from jumping
/// when unrelated members come and go.
///
/// Intervals are supplied on demand and cached until the next restart.
///
/// ```rust
/// use understory_gantt::{Interval, TetrisPacker};
///
/// let spans = [Interval::new(0.0, 10.0), Interval::new(5.0, 15.0), Interval::new(10.0, 20.0)];
/// let mut packer = TetrisPacker::new();
/// for key in ["a", "b", "c"] {
///     packer.push(key);
/// }
/// let count = packer.resolve_all(|m| Ok::<_, ()>(spans[m])).unwrap();
/// assert_eq!(count, 2);
/// assert_eq!(packer.sub_row_of(2), Some(0)); // touches "a" without overlapping it
/// ```
#[derive(Clone, Debug)]
pub struct TetrisPacker<K> {
    keys: Vec<K>,
    assigned: Vec<Option<usize>>,
    rows: Vec<Vec<(usize, Interval)>>,
    /// The last partition, as indices into `history_keys` (or into `keys`
    /// while `history_in_keys` is set).
    previous: Vec<Vec<usize>>,
    history_keys: Vec<K>,
    history_in_keys: bool,
}

impl<K> Default for TetrisPacker<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K> TetrisPacker<K> {
    /// An empty packer with no history.
    pub const fn new() -> Self {
        Self {
            keys: Vec::new(),
            assigned: Vec::new(),
            rows: Vec::new(),
            previous: Vec::new(),
            history_keys: Vec::new(),
            history_in_keys: false,
        }
    }

    /// Add a member and return its index.
    pub fn push(&mut self, key: K) -> usize {
        self.keys.push(key);
        self.assigned.push(None);
        self.keys.len() - 1
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Returns `true` if there are no members.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Sub-row of a member, if it has been resolved.
    pub fn sub_row_of(&self, member: usize) -> Option<usize> {
        self.assigned.get(member).copied().flatten()
    }

    /// Number of sub-rows opened so far, never less than one.
    pub fn sub_row_count(&self) -> usize {
        self.rows.len().max(1)
    }

    /// Members of each sub-row, top to bottom, in placement order.
    pub fn sub_rows(&self) -> impl Iterator<Item = impl Iterator<Item = usize> + '_> + '_ {
        self.rows.iter().map(|row| row.iter().map(|&(member, _)| member))
    }
}

impl<K: PartialEq> TetrisPacker<K> {
    /// Forget the current placement but remember it for replay.
    ///
    /// Members are kept. If nothing was placed since the last restart, the
    /// older history is kept instead.
    pub fn restart(&mut self) {
        if !self.rows.is_empty() {
            self.previous.clear();
            self.previous.extend(
                self.rows
                    .drain(..)
                    .map(|row| row.into_iter().map(|(m, _)| m).collect()),
            );
            self.history_keys.clear();
            self.history_in_keys = true;
        }
        self.rows.clear();
        self.assigned.fill(None);
    }

    /// [`restart`](Self::restart) and drop every member.
    ///
    /// The dropped keys move into the history, so the next members are
    /// matched against them by equality.
    pub fn reset_members(&mut self) {
        self.restart();
        if self.history_in_keys {
            self.history_keys = mem::take(&mut self.keys);
            self.history_in_keys = false;
        } else {
            self.keys.clear();
        }
        self.assigned.clear();
    }

    /// Sub-row of `member`, placing it (and replaying history) if needed.
    pub fn resolve<E>(
        &mut self,
        member: usize,
        mut interval_of: impl FnMut(usize) -> Result<Interval, E>,
    ) -> Result<usize, E> {
        if let Some(row) = self.sub_row_of(member) {
            return Ok(row);
        }
        if !self.previous.is_empty() {
            self.replay(&mut interval_of)?;
            if let Some(row) = self.sub_row_of(member) {
                return Ok(row);
            }
        }
        self.place(member, &mut interval_of)
    }

    /// Resolve every member and return the sub-row count.
    pub fn resolve_all<E>(
        &mut self,
        mut interval_of: impl FnMut(usize) -> Result<Interval, E>,
    ) -> Result<usize, E> {
        for member in 0..self.keys.len() {
            self.resolve(member, &mut interval_of)?;
        }
        Ok(self.sub_row_count())
    }

    fn replay<E>(
        &mut self,
        interval_of: &mut impl FnMut(usize) -> Result<Interval, E>,
    ) -> Result<(), E> {
        let previous = mem::take(&mut self.previous);
        for &old in previous.iter().flatten() {
            let member = if self.history_in_keys {
                Some(old)
            } else {
                let old_key = &self.history_keys[old];
                self.keys.iter().position(|k| k == old_key)
            };
            let Some(member) = member else {
                continue;
            };
            if self.assigned[member].is_some() {
                continue;
            }
            if let Err(err) = self.place(member, interval_of) {
                self.previous = previous;
                return Err(err);
            }
        }
        Ok(())
    }

    fn place<E>(
        &mut self,
        member: usize,
        interval_of: &mut impl FnMut(usize) -> Result<Interval, E>,
    ) -> Result<usize, E> {
        let span = interval_of(member)?;
        let fit = self
            .rows
            .iter()
            .position(|row| row.iter().all(|(_, other)| !span.overlaps(other)));
        let row = match fit {
            Some(row) => row,
            None => {
                self.rows.push(Vec::new());
                self.rows.len() - 1
            }
        };
        self.rows[row].push((member, span));
        self.assigned[member] = Some(row);
        tracing::trace!(member, row, min = span.min, max = span.max, "tetris placement");
        Ok(row)
    }
}
