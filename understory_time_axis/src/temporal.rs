// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Time values measured in whole units.

use core::fmt::Debug;

/// A point on a discrete time axis.
///
/// A unit is whatever the implementation counts in: ticks for `i64`, days for
/// `chrono::NaiveDate`. Projectors only ever reason in whole units, which is
/// what makes day-granular Gantt charts line up on pixel boundaries.
pub trait Temporal: Clone + PartialOrd + Debug {
    /// Number of whole units from `self` to `end` (negative if `end` is earlier).
    fn units_until(&self, end: &Self) -> i64;

    /// Returns `self` shifted by `units`, or `None` on overflow.
    fn plus_units(&self, units: i64) -> Option<Self>;
}

/// Access to a Monday-based weekday column (Monday = 0, Sunday = 6).
pub trait DayOfWeek {
    /// Weekday index in `0..7`.
    fn day_of_week(&self) -> u32;
}

/// A day that sits in a month, for month grids.
///
/// Weeks start on Monday. The week holding the 1st is week 0, so a month
/// spans four to six weeks.
pub trait CalendarDate: DayOfWeek {
    /// Day of the month, starting at 1.
    fn day_of_month(&self) -> u32;

    /// Row of this day in a Monday-first grid of its month.
    fn week_of_month(&self) -> u32 {
        let day0 = self.day_of_month().saturating_sub(1);
        let first_column = (self.day_of_week() + 7 - day0 % 7) % 7;
        (day0 + first_column) / 7
    }
}

impl Temporal for i64 {
    fn units_until(&self, end: &Self) -> i64 {
        end.saturating_sub(*self)
    }

    fn plus_units(&self, units: i64) -> Option<Self> {
        self.checked_add(units)
    }
}

/// Tick `0` is a Monday.
impl DayOfWeek for i64 {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "rem_euclid(7) is always in 0..7."
    )]
    fn day_of_week(&self) -> u32 {
        self.rem_euclid(7) as u32
    }
}

#[cfg(feature = "chrono")]
mod chrono_impls {
    use chrono::{Datelike, Days, NaiveDate};

    use super::{CalendarDate, DayOfWeek, Temporal};

    impl Temporal for NaiveDate {
        fn units_until(&self, end: &Self) -> i64 {
            end.signed_duration_since(*self).num_days()
        }

        fn plus_units(&self, units: i64) -> Option<Self> {
            if units >= 0 {
                self.checked_add_days(Days::new(units.unsigned_abs()))
            } else {
                self.checked_sub_days(Days::new(units.unsigned_abs()))
            }
        }
    }

    impl DayOfWeek for NaiveDate {
        fn day_of_week(&self) -> u32 {
            self.weekday().num_days_from_monday()
        }
    }

    impl CalendarDate for NaiveDate {
        fn day_of_month(&self) -> u32 {
            self.day()
        }
    }
}
