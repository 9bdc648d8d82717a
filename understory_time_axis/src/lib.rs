// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_time_axis --heading-base-level=0

//! Understory Time Axis: time windows and time-to-pixel projection.
//!
//! This crate holds the horizontal half of a timeline layout. It knows nothing
//! about rows, children, or rendering; it only answers "where on a strip of
//! `width` pixels does this instant land, given the visible window".
//!
//! The core concepts are:
//!
//! - [`Temporal`]: a time value that can count whole units to another value and
//!   be shifted by a number of units. Implemented for `i64` (abstract ticks) and,
//!   with the `chrono` feature, for `chrono::NaiveDate` (days).
//! - [`DayOfWeek`] and [`CalendarDate`]: weekday columns and week-of-month rows
//!   for week and month views.
//! - [`TimeWindow`]: the inclusive `[start, end]` span currently mapped to the
//!   available width, plus helpers to shift, recenter, or reveal a range.
//! - [`TimeProjector`]: an object-safe, bidirectional time ↔ x mapping. Each
//!   projection says which [`Side`] of an item it is placing and whether that
//!   side is [`Bound::Inclusive`] or [`Bound::Exclusive`].
//! - [`LinearProjector`], [`DayOfWeekProjector`] and [`TranslatedProjector`]:
//!   the stock projectors.
//!
//! ## Minimal example
//!
//! ```rust
//! use understory_time_axis::{Bound, LinearProjector, Side, TimeProjector, TimeWindow};
//!
//! // Ten days mapped onto 100 pixels: 10px per day.
//! let window = TimeWindow::new(1_i64, 10);
//! let projector = LinearProjector;
//!
//! let start = projector.time_to_x(&3, Side::Start, Bound::Inclusive, &window, 100.0);
//! let end = projector.time_to_x(&5, Side::End, Bound::Inclusive, &window, 100.0);
//! assert_eq!(start, 20.0);
//! assert_eq!(end, 50.0);
//!
//! assert_eq!(projector.x_to_time(25.0, &window, 100.0), Some(3));
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for dependencies such as `kurbo`.
//! - `libm`: `no_std` builds that rely on `libm` for rounding.
//! - `chrono`: implements [`Temporal`], [`DayOfWeek`] and [`CalendarDate`] for
//!   `chrono::NaiveDate`.
//!
//! This crate is `no_std`.

#![no_std]

#[cfg(feature = "std")]
extern crate std;

mod projector;
mod temporal;
mod window;

pub use projector::{
    Bound, DayOfWeekProjector, LinearProjector, Side, TimeProjector, TranslatedProjector,
};
pub use temporal::{CalendarDate, DayOfWeek, Temporal};
pub use window::TimeWindow;
