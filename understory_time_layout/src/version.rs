// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-layout version counters.

bitflags::bitflags! {
    /// Which derived values an input change affects.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Invalidate: u8 {
        /// Child start/end times must be re-read. Implies [`Invalidate::HORIZONTAL`].
        const TIME       = 0b0000_0001;
        /// X positions and widths.
        const HORIZONTAL = 0b0000_0010;
        /// Y positions, heights, and row indices.
        const VERTICAL   = 0b0000_0100;
    }
}

/// Monotonic counters that stamp cached geometry.
///
/// A cached value is valid while its stamp equals the live counter of its
/// axis. Counters only move forward; bumping [`Invalidate::TIME`] also bumps
/// the horizontal counter because x is a projection of time.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Versions {
    time: u64,
    horizontal: u64,
    vertical: u64,
}

impl Versions {
    /// Fresh counters, all at zero.
    pub const fn new() -> Self {
        Self {
            time: 0,
            horizontal: 0,
            vertical: 0,
        }
    }

    /// Advance every counter named by `what`.
    pub fn bump(&mut self, what: Invalidate) {
        if what.contains(Invalidate::TIME) {
            self.time += 1;
        }
        if what.intersects(Invalidate::TIME | Invalidate::HORIZONTAL) {
            self.horizontal += 1;
        }
        if what.contains(Invalidate::VERTICAL) {
            self.vertical += 1;
        }
    }

    /// Live time counter.
    pub const fn time(&self) -> u64 {
        self.time
    }

    /// Live horizontal counter.
    pub const fn horizontal(&self) -> u64 {
        self.horizontal
    }

    /// Live vertical counter.
    pub const fn vertical(&self) -> u64 {
        self.vertical
    }
}
