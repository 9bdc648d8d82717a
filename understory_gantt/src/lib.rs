// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=understory_gantt --heading-base-level=0

//! Understory Gantt: hierarchical time layout with recycled rows and tetris packing.
//!
//! [`GanttLayout`] builds on the time layout core. Each child names a parent
//! key, and optionally a grandparent key; children sharing a parent are laid
//! out on one parent row, and parent rows sharing a grandparent are stacked
//! inside one grandparent row with a header.
//!
//! - Rows are identified by [`RowId`]. When the children change, rows are
//!   matched to their keys again and reused; a row whose key is missing for a
//!   single pass is kept aside and revived if the key returns.
//! - With tetris packing on, a [`TetrisPacker`] spreads overlapping children
//!   of a row over sub-rows. Placement is greedy, and replays the previous
//!   result first so that children do not jump between sub-rows.
//! - Grandparent headers sit on any side, see [`HeaderPosition`].
//!
//! Everything is computed on first read and cached against the layout's
//! version counters, just like the base layout.
//!
//! ## Example
//!
//! ```rust
//! use std::rc::Rc;
//!
//! use understory_gantt::GanttLayout;
//! use understory_time_axis::{Bound, LinearProjector, TimeWindow};
//!
//! #[derive(Clone, PartialEq)]
//! struct Shift {
//!     first_day: i64,
//!     last_day: i64,
//!     person: &'static str,
//! }
//!
//! let mut gantt: GanttLayout<Shift, i64, &str, &str> = GanttLayout::new();
//! gantt
//!     .core_mut()
//!     .set_start_time_reader(|s: &Shift| s.first_day, Bound::Inclusive)
//!     .set_end_time_reader(|s: &Shift| s.last_day, Bound::Inclusive)
//!     .set_time_window(Some(TimeWindow::new(0, 9)))
//!     .set_projector(Rc::new(LinearProjector))
//!     .set_width(100.0)
//!     .set_child_fixed_height(Some(20.0))
//!     .set_children(vec![
//!         Shift { first_day: 0, last_day: 4, person: "ada" },
//!         Shift { first_day: 3, last_day: 6, person: "ada" },
//!         Shift { first_day: 2, last_day: 2, person: "bo" },
//!     ]);
//! gantt
//!     .set_child_parent_reader(Some(Box::new(|s: &Shift| Some(s.person))))
//!     .set_tetris_packing(true);
//!
//! // Ada's shifts overlap, so her row has two sub-rows and Bo's row comes after.
//! assert_eq!(gantt.child_bounds(1).unwrap().y, 20.0);
//! assert_eq!(gantt.child_bounds(2).unwrap().y, 40.0);
//! assert_eq!(gantt.rows_count(), Ok(3));
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

mod gantt;
mod row;
mod tetris;

pub use gantt::{GanttLayout, VisibleRow};
pub use row::{GrandparentRow, HeaderPosition, ParentRow, RowId};
pub use tetris::{Interval, TetrisPacker};
