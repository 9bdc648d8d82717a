// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The visible span of the time axis.

use crate::Temporal;

/// An inclusive `[start, end]` span of time mapped onto the layout width.
///
/// Navigation helpers return `None` when the shifted endpoints would overflow
/// the underlying [`Temporal`] type.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TimeWindow<T> {
    /// First visible unit.
    pub start: T,
    /// Last visible unit (inclusive).
    pub end: T,
}

impl<T> TimeWindow<T> {
    /// Create a window from its two inclusive endpoints.
    pub const fn new(start: T, end: T) -> Self {
        Self { start, end }
    }
}

impl<T: Temporal> TimeWindow<T> {
    /// Number of units covered, counting both endpoints.
    pub fn duration_units(&self) -> i64 {
        self.start.units_until(&self.end).saturating_add(1)
    }

    /// Returns `true` if `time` lies within `[start, end]`.
    pub fn contains(&self, time: &T) -> bool {
        self.start <= *time && *time <= self.end
    }

    /// The unit in the middle of the window, rounding towards `start`.
    pub fn center(&self) -> Option<T> {
        self.start.plus_units((self.duration_units() - 1) / 2)
    }

    /// Same duration, starting at `start`.
    pub fn with_start(&self, start: T) -> Option<Self> {
        let end = start.plus_units(self.duration_units() - 1)?;
        Some(Self { start, end })
    }

    /// Same duration, moved by `units`.
    pub fn shifted(&self, units: i64) -> Option<Self> {
        self.with_start(self.start.plus_units(units)?)
    }

    /// A window of `duration` units whose middle is `center`.
    pub fn centered_on(center: &T, duration: i64) -> Option<Self> {
        let duration = duration.max(1);
        let start = center.plus_units(-(duration / 2))?;
        let end = start.plus_units(duration - 1)?;
        Some(Self { start, end })
    }

    /// Same duration, recentered on `center`.
    pub fn recentered(&self, center: &T) -> Option<Self> {
        Self::centered_on(center, self.duration_units())
    }

    /// Returns a window that shows at least part of `[range_start, range_end]`.
    ///
    /// If the range already intersects the window, the window is returned
    /// unchanged. Otherwise the window keeps its duration and either starts at
    /// `range_start` (when the range is longer than the window) or is centered
    /// on the middle of the range.
    pub fn ensure_visible(&self, range_start: &T, range_end: &T) -> Option<Self> {
        let before = range_end.units_until(&self.start) > 0;
        let after = self.end.units_until(range_start) > 0;
        if !before && !after {
            return Some(self.clone());
        }
        let range_units = range_start.units_until(range_end);
        if range_units > self.duration_units() {
            self.with_start(range_start.clone())
        } else {
            self.recentered(&range_start.plus_units(range_units / 2)?)
        }
    }
}
