// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Crew schedule: shifts grouped by person, people grouped by team.
//!
//! Shows calendar dates as the time unit, tetris packing of overlapping
//! shifts, top headers, row recycling when the data changes, and visible
//! range traversal.
//!
//! Run:
//! - `cargo run -p understory_demos --example gantt_schedule`
//! - `RUST_LOG=understory_gantt=trace cargo run -p understory_demos --example gantt_schedule`

use std::rc::Rc;

use chrono::NaiveDate;
use kurbo::{Point, Rect};
use tracing_subscriber::EnvFilter;
use understory_gantt::{GanttLayout, HeaderPosition, VisibleRow};
use understory_time_axis::{Bound, LinearProjector, TimeWindow};

#[derive(Clone, Debug, PartialEq)]
struct Shift {
    person: &'static str,
    team: &'static str,
    from: NaiveDate,
    to: NaiveDate,
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).expect("valid March date")
}

fn shift(person: &'static str, team: &'static str, from: u32, to: u32) -> Shift {
    Shift {
        person,
        team,
        from: day(from),
        to: day(to),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let mut gantt: GanttLayout<Shift, NaiveDate, &str, &str> = GanttLayout::new();
    gantt
        .core_mut()
        .set_start_time_reader(|s: &Shift| s.from, Bound::Inclusive)
        .set_end_time_reader(|s: &Shift| s.to, Bound::Inclusive)
        .set_time_window(Some(TimeWindow::new(day(1), day(14))))
        .set_projector(Rc::new(LinearProjector))
        .set_width(700.0)
        .set_child_fixed_height(Some(18.0))
        .set_v_spacing(2.0)
        .set_children(vec![
            shift("ada", "ops", 1, 4),
            shift("ada", "ops", 3, 6),
            shift("bo", "ops", 2, 9),
            shift("cy", "field", 5, 5),
            shift("cy", "field", 6, 12),
            shift("ada", "ops", 10, 13),
        ]);
    gantt
        .set_child_parent_reader(Some(Box::new(|s: &Shift| Some(s.person))))
        .set_child_grandparent_reader(Some(Box::new(|s: &Shift| Some(s.team))))
        .set_tetris_packing(true)
        .set_header_position(HeaderPosition::Top)
        .set_grandparent_header_height(24.0);

    gantt.layout().expect("layout succeeds");
    println!("content height {} over {} rows", gantt.height(), gantt.rows_count().expect("rows"));

    let viewport = Rect::new(0.0, 0.0, 700.0, 120.0);
    gantt
        .visit_visible_rows(viewport, Point::ZERO, |row, rect| match row {
            VisibleRow::Grandparent(id) => println!("team row {id:?} at {rect:?}"),
            VisibleRow::Parent(id) => println!("  person row {id:?} at {rect:?}"),
        })
        .expect("row traversal");
    let mut shown = Vec::new();
    gantt
        .visit_visible_children(viewport, Point::ZERO, |index, rect| shown.push((index, rect)))
        .expect("child traversal");
    for (index, rect) in &shown {
        let s = &gantt.core().children()[*index];
        println!("{} {}..{} -> {rect:?}", s.person, s.from, s.to);
    }

    // Bo leaves for one refresh and comes back: the row is the same object.
    let bo = gantt.child_parent_row(2).expect("index").expect("bo has a row");
    let mut without_bo = gantt.core().children().to_vec();
    without_bo.retain(|s| s.person != "bo");
    gantt.core_mut().set_children(without_bo);
    gantt.layout().expect("layout succeeds");
    gantt.core_mut().push_child(shift("bo", "ops", 7, 8));
    let last = gantt.core().child_count() - 1;
    let again = gantt.child_parent_row(last).expect("index").expect("bo has a row");
    tracing::info!(same_row = bo == again, "bo's row after a missing refresh");
}
