// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time ↔ x projection.

#[cfg(not(feature = "std"))]
use kurbo::common::FloatFuncs as _;

use crate::{DayOfWeek, Temporal, TimeWindow};

/// Which edge of an item is being projected.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Side {
    /// The leading edge (start time).
    Start,
    /// The trailing edge (end time).
    End,
}

/// Whether an item's time includes the unit it names.
///
/// An inclusive end on day 5 covers all of day 5, so its edge lands at the
/// start of day 6. An exclusive start on day 3 begins after day 3.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Bound {
    /// The named unit belongs to the item.
    #[default]
    Inclusive,
    /// The named unit is outside the item.
    Exclusive,
}

impl Side {
    /// Returns `true` when this edge lands on the far side of its unit.
    pub const fn advances(self, bound: Bound) -> bool {
        matches!(
            (self, bound),
            (Self::Start, Bound::Exclusive) | (Self::End, Bound::Inclusive)
        )
    }
}

/// Bidirectional mapping between time values and x offsets.
///
/// Projectors are stateless with respect to the layout: the window and width
/// are passed on every call, so one projector can be shared by several layers
/// (see `MultilayerTimeLayout` in `understory_time_layout`).
pub trait TimeProjector<T> {
    /// X offset of `time` when used as the `side` edge of an item.
    fn time_to_x(
        &self,
        time: &T,
        side: Side,
        bound: Bound,
        window: &TimeWindow<T>,
        width: f64,
    ) -> f64;

    /// Time unit under `x`, if the projection can be inverted.
    fn x_to_time(&self, x: f64, window: &TimeWindow<T>, width: f64) -> Option<T>;
}

/// Evenly spreads the window's units over the width, rounding to whole pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearProjector;

impl<T: Temporal> TimeProjector<T> for LinearProjector {
    fn time_to_x(
        &self,
        time: &T,
        side: Side,
        bound: Bound,
        window: &TimeWindow<T>,
        width: f64,
    ) -> f64 {
        let total = window.duration_units().max(1);
        let mut units = window.start.units_until(time);
        if side.advances(bound) {
            units = units.saturating_add(1);
        }
        (width * units as f64 / total as f64).round()
    }

    fn x_to_time(&self, x: f64, window: &TimeWindow<T>, width: f64) -> Option<T> {
        if !width.is_finite() || width <= 0.0 {
            return None;
        }
        let total = window.duration_units().max(1);
        let units = (x * total as f64 / width).floor();
        if !units.is_finite() {
            return None;
        }
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Float to int casts saturate; out-of-range offsets are rejected by plus_units."
        )]
        let units = units as i64;
        window.start.plus_units(units)
    }
}

/// Seven equal columns, Monday first.
///
/// Used by week and calendar views where only the weekday of a time matters.
/// The inverse projection is not defined: a column stands for every date that
/// falls on that weekday.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct DayOfWeekProjector;

impl DayOfWeekProjector {
    /// Number of columns.
    pub const COLUMNS: u32 = 7;
}

impl<T: DayOfWeek> TimeProjector<T> for DayOfWeekProjector {
    fn time_to_x(
        &self,
        time: &T,
        side: Side,
        bound: Bound,
        _window: &TimeWindow<T>,
        width: f64,
    ) -> f64 {
        let mut column = time.day_of_week();
        if side.advances(bound) {
            column += 1;
        }
        f64::from(column) * width / f64::from(Self::COLUMNS)
    }

    fn x_to_time(&self, _x: f64, _window: &TimeWindow<T>, _width: f64) -> Option<T> {
        None
    }
}

/// Wraps another projector and moves its output by a constant offset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TranslatedProjector<P> {
    /// The wrapped projector.
    pub inner: P,
    /// Pixel offset added to every projected x.
    pub translate_x: f64,
}

impl<P> TranslatedProjector<P> {
    /// Shift `inner` by `translate_x` pixels.
    pub const fn new(inner: P, translate_x: f64) -> Self {
        Self { inner, translate_x }
    }
}

impl<T, P: TimeProjector<T>> TimeProjector<T> for TranslatedProjector<P> {
    fn time_to_x(
        &self,
        time: &T,
        side: Side,
        bound: Bound,
        window: &TimeWindow<T>,
        width: f64,
    ) -> f64 {
        self.inner.time_to_x(time, side, bound, window, width) + self.translate_x
    }

    fn x_to_time(&self, x: f64, window: &TimeWindow<T>, width: f64) -> Option<T> {
        self.inner.x_to_time(x - self.translate_x, window, width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn days_1_to_10() -> TimeWindow<i64> {
        TimeWindow::new(1, 10)
    }

    #[test]
    fn advance_rule() {
        assert!(!Side::Start.advances(Bound::Inclusive), "inclusive start");
        assert!(Side::Start.advances(Bound::Exclusive), "exclusive start");
        assert!(Side::End.advances(Bound::Inclusive), "inclusive end");
        assert!(!Side::End.advances(Bound::Exclusive), "exclusive end");
    }

    #[test]
    fn linear_projects_ten_pixels_per_day() {
        let w = days_1_to_10();
        let p = LinearProjector;
        assert_eq!(p.time_to_x(&1, Side::Start, Bound::Inclusive, &w, 100.0), 0.0, "window start");
        assert_eq!(p.time_to_x(&3, Side::Start, Bound::Inclusive, &w, 100.0), 20.0, "day 3 start");
        assert_eq!(p.time_to_x(&5, Side::End, Bound::Inclusive, &w, 100.0), 50.0, "day 5 end");
        assert_eq!(p.time_to_x(&5, Side::End, Bound::Exclusive, &w, 100.0), 40.0, "exclusive end");
        assert_eq!(p.time_to_x(&10, Side::End, Bound::Inclusive, &w, 100.0), 100.0, "window end");
    }

    #[test]
    fn linear_rounds_to_whole_pixels() {
        let w = TimeWindow::new(0_i64, 2);
        let x = LinearProjector.time_to_x(&1, Side::Start, Bound::Inclusive, &w, 100.0);
        assert_eq!(x, 33.0, "100/3 rounds down");
        let x = LinearProjector.time_to_x(&2, Side::Start, Bound::Inclusive, &w, 100.0);
        assert_eq!(x, 67.0, "200/3 rounds up");
    }

    #[test]
    fn linear_inverse_floors_into_the_unit() {
        let w = days_1_to_10();
        let p = LinearProjector;
        assert_eq!(p.x_to_time(0.0, &w, 100.0), Some(1), "left edge");
        assert_eq!(p.x_to_time(19.9, &w, 100.0), Some(2), "inside day 2");
        assert_eq!(p.x_to_time(20.0, &w, 100.0), Some(3), "start of day 3");
        assert_eq!(p.x_to_time(-5.0, &w, 100.0), Some(0), "left of the window");
        assert_eq!(p.x_to_time(10.0, &w, 0.0), None::<i64>, "zero width");
    }

    #[test]
    fn weekday_columns() {
        let w = days_1_to_10();
        let p = DayOfWeekProjector;
        // Tick 2 is a Wednesday.
        assert_eq!(p.time_to_x(&2, Side::Start, Bound::Inclusive, &w, 700.0), 200.0, "start");
        assert_eq!(p.time_to_x(&2, Side::End, Bound::Inclusive, &w, 700.0), 300.0, "end");
        assert_eq!(p.x_to_time(250.0, &w, 700.0), None, "no inverse");
    }

    #[test]
    fn translation_is_applied_both_ways() {
        let w = days_1_to_10();
        let p = TranslatedProjector::new(LinearProjector, 15.0);
        assert_eq!(p.time_to_x(&3, Side::Start, Bound::Inclusive, &w, 100.0), 35.0, "shifted");
        assert_eq!(p.x_to_time(35.0, &w, 100.0), Some(3), "inverse undoes the shift");
    }

    #[test]
    fn projectors_are_object_safe() {
        let w = days_1_to_10();
        let translated = TranslatedProjector::new(LinearProjector, 1.0);
        let projectors: [&dyn TimeProjector<i64>; 2] = [&LinearProjector, &translated];
        let xs = projectors.map(|p| p.time_to_x(&2, Side::Start, Bound::Inclusive, &w, 100.0));
        assert_eq!(xs, [10.0, 11.0], "dynamic dispatch");
    }
}
