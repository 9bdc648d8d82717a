// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_time_layout --heading-base-level=0

//! Understory Time Layout: lazily cached geometry for time-based layouts.
//!
//! A time layout turns caller-owned children with start and end times into
//! on-screen bounds. It never renders and never decides which time window is
//! shown; it only computes, caches, and hands out geometry.
//!
//! The core concepts are:
//!
//! - [`Versions`] and [`Invalidate`]: per-layout monotonic counters for time,
//!   horizontal, and vertical changes. Bumping time also bumps horizontal.
//! - [`LazyBounds`]: bounds whose axes are recomputed only when the stamp they
//!   were validated with differs from the live counter.
//! - [`LayoutCore`]: children, time readers, window, projector, spacing, and
//!   the horizontal placement every layout shares.
//! - [`TimeLayout`]: the base layout that stacks children on rows, with a
//!   fixed row height or rows stretched to fill the height.
//! - [`CalendarLayout`]: a month grid over the weekday projector, one row per
//!   week of the month and one column per weekday.
//! - [`TimeLayer`] and [`MultilayerTimeLayout`]: several layouts over one
//!   shared time axis with a single cross-layer selection.
//! - [`cull::visit_visible`]: visible-range traversal that skips everything
//!   outside a rectangle, stopping early on y-ordered input.
//!
//! Nothing is computed until it is read. Mutating an input bumps counters and
//! marks the layout dirty; the next read of a child's bounds recomputes just
//! the stale axes, and [`TimeLayout::layout`] measures the content height.
//!
//! ## Minimal example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use kurbo::{Point, Rect};
//! use understory_time_axis::{Bound, LinearProjector, TimeWindow};
//! use understory_time_layout::TimeLayout;
//!
//! struct Booking {
//!     first_day: i64,
//!     last_day: i64,
//! }
//!
//! let mut layout = TimeLayout::new();
//! layout
//!     .core_mut()
//!     .set_start_time_reader(|b: &Booking| b.first_day, Bound::Inclusive)
//!     .set_end_time_reader(|b: &Booking| b.last_day, Bound::Inclusive)
//!     .set_time_window(Some(TimeWindow::new(1, 10)))
//!     .set_projector(Rc::new(LinearProjector))
//!     .set_width(100.0)
//!     .set_child_fixed_height(Some(24.0))
//!     .set_children(vec![Booking { first_day: 3, last_day: 5 }]);
//!
//! let bounds = layout.child_bounds(0).unwrap();
//! assert_eq!((bounds.x, bounds.width), (20.0, 30.0));
//!
//! let mut visible = Vec::new();
//! layout
//!     .visit_visible_children(Rect::new(0.0, 0.0, 100.0, 50.0), Point::ZERO, |i, _| {
//!         visible.push(i)
//!     })
//!     .unwrap();
//! assert_eq!(visible, [0]);
//! ```
//!
//! ## Features
//!
//! - `std` (default): enables `std` support for dependencies such as `kurbo`.
//! - `libm`: `no_std` builds that rely on `libm` for floating-point math.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod bounds;
mod calendar;
pub mod cull;
mod error;
mod layer;
mod layout;
mod layout_core;
mod multilayer;
mod version;

pub use bounds::{Bounds, LazyBounds};
pub use calendar::CalendarLayout;
pub use error::LayoutError;
pub use layer::TimeLayer;
pub use layout::TimeLayout;
pub use layout_core::{ChildBounds, LayoutCore, LayoutPass, LayoutPhase, Reader};
pub use multilayer::MultilayerTimeLayout;
pub use version::{Invalidate, Versions};
