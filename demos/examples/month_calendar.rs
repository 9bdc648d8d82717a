// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Month calendar: events placed on a Monday-first grid of March 2025.
//!
//! March 2025 starts on a Saturday, so the month needs six week rows.
//!
//! Run:
//! - `cargo run -p understory_demos --example month_calendar`

use chrono::NaiveDate;
use kurbo::{Point, Rect};
use tracing_subscriber::EnvFilter;
use understory_time_axis::TimeWindow;
use understory_time_layout::{CalendarLayout, TimeLayer};

#[derive(Clone, Debug)]
struct Event {
    title: &'static str,
    first: NaiveDate,
    last: NaiveDate,
}

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, d).expect("valid March date")
}

fn event(title: &'static str, first: u32, last: u32) -> Event {
    Event {
        title,
        first: day(first),
        last: day(last),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let mut calendar: CalendarLayout<Event, NaiveDate> = CalendarLayout::new();
    calendar.set_day_readers(|e: &Event| e.first, |e: &Event| e.last);
    calendar
        .time_layout_mut()
        .core_mut()
        .set_time_window(Some(TimeWindow::new(day(1), day(31))))
        .set_width(700.0)
        .set_child_fixed_height(Some(60.0))
        .set_v_spacing(4.0)
        .set_selection_enabled(true)
        .set_children(vec![
            event("open house", 1, 1),
            event("sprint", 3, 7),
            event("offsite", 12, 14),
            event("review", 24, 24),
            event("close books", 31, 31),
        ]);

    calendar.layout().expect("calendar pass");
    tracing::info!(height = calendar.height(), "month laid out");

    let count = calendar.time_layout().core().child_count();
    for index in 0..count {
        let week = calendar.child_week(index).expect("week row");
        let weekday = calendar.child_weekday(index).expect("weekday column");
        let bounds = calendar.child_bounds(index).expect("event bounds");
        let title = calendar.time_layout().core().children()[index].title;
        tracing::info!(title, week, weekday, x = bounds.x, y = bounds.y, width = bounds.width, "event");
    }

    let picked = calendar
        .pick_child_at(Point::new(450.0, 150.0), true)
        .expect("pick");
    tracing::info!(?picked, "picked in week 2, Friday");

    let layer: &mut dyn TimeLayer<NaiveDate> = &mut calendar;
    let mut last_week = Vec::new();
    layer
        .visit_visible_children(Rect::new(0.0, 320.0, 700.0, 384.0), Point::ZERO, &mut |i, _| {
            last_week.push(i);
        })
        .expect("visible traversal");
    tracing::info!(?last_week, "events in the sixth row");
}
