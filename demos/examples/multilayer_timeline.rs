// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Two layers over one time axis: plain rows of milestones on top of a Gantt.
//!
//! Run:
//! - `cargo run -p understory_demos --example multilayer_timeline`

use std::rc::Rc;

use kurbo::{Point, Rect};
use tracing_subscriber::EnvFilter;
use understory_gantt::GanttLayout;
use understory_time_axis::{Bound, LinearProjector, TimeWindow};
use understory_time_layout::{MultilayerTimeLayout, TimeLayout};

/// (name, day, row)
type Milestone = (&'static str, i64, usize);

/// (task, project, first day, last day)
type Task = (&'static str, &'static str, i64, i64);

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .init();

    let mut milestones: TimeLayout<Milestone, i64> = TimeLayout::new();
    milestones
        .core_mut()
        .set_start_time_reader(|m: &Milestone| m.1, Bound::Inclusive)
        .set_end_time_reader(|m: &Milestone| m.1, Bound::Inclusive)
        .set_child_fixed_height(Some(12.0))
        .set_selection_enabled(true)
        .set_children(vec![("kickoff", 0, 0), ("review", 14, 0), ("launch", 27, 1)]);
    milestones.set_row_index_reader(Some(Box::new(|m: &Milestone| m.2)));

    let mut tasks: GanttLayout<Task, i64, &str, &str> = GanttLayout::new();
    tasks
        .core_mut()
        .set_start_time_reader(|t: &Task| t.2, Bound::Inclusive)
        .set_end_time_reader(|t: &Task| t.3, Bound::Inclusive)
        .set_child_fixed_height(Some(16.0))
        .set_top_y(40.0)
        .set_selection_enabled(true)
        .set_children(vec![
            ("design", "app", 0, 9),
            ("build", "app", 7, 20),
            ("docs", "site", 15, 25),
        ]);
    tasks
        .set_child_parent_reader(Some(Box::new(|t: &Task| Some(t.1))))
        .set_tetris_packing(true);

    let mut timeline: MultilayerTimeLayout<i64> = MultilayerTimeLayout::new();
    timeline.add_layer(Box::new(milestones));
    timeline.add_layer(Box::new(tasks));
    timeline.set_time_window(Some(TimeWindow::new(0, 27)));
    timeline.set_projector(Rc::new(LinearProjector));
    timeline.set_width(560.0);
    timeline.on_layout_count_changed(|count| println!("layout count {count}"));
    timeline.layout().expect("layout succeeds");
    println!("timeline height {}", timeline.height());

    timeline
        .visit_visible(Rect::new(0.0, 0.0, 560.0, 200.0), Point::ZERO, |layer, child, rect| {
            println!("layer {layer} child {child}: {rect:?}");
        })
        .expect("traversal");

    let picked = timeline.pick_at(Point::new(200.0, 50.0), true).expect("pick");
    timeline.select(picked).expect("select");
    println!("selected {:?}", timeline.selection());
}
