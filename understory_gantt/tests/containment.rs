// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Children stay inside their parent rows whatever the row sizing inputs.

use std::rc::Rc;

use proptest::prelude::*;
use understory_gantt::GanttLayout;
use understory_time_axis::{Bound, LinearProjector, TimeWindow};

/// (parent key, first day, natural height)
type Item = (u8, i64, u8);

fn gantt(
    children: Vec<Item>,
    packing: bool,
    fixed: Option<f64>,
    v_spacing: f64,
) -> GanttLayout<Item, i64, u8, u8> {
    let mut gantt = GanttLayout::new();
    gantt
        .core_mut()
        .set_start_time_reader(|c: &Item| c.1, Bound::Inclusive)
        .set_end_time_reader(|c: &Item| c.1 + 3, Bound::Inclusive)
        .set_time_window(Some(TimeWindow::new(0, 19)))
        .set_projector(Rc::new(LinearProjector))
        .set_width(200.0)
        .set_child_fixed_height(fixed)
        .set_v_spacing(v_spacing)
        .set_children(children);
    gantt
        .set_child_parent_reader(Some(Box::new(|c: &Item| Some(c.0))))
        .set_parent_grandparent_reader(Some(Box::new(|p: &u8| (p % 3 != 0).then_some(p % 2))))
        .set_child_natural_height_reader(Some(Box::new(|c: &Item| f64::from(c.2))))
        .set_tetris_packing(packing);
    gantt
}

proptest! {
    #[test]
    fn children_lie_inside_their_rows(
        children in prop::collection::vec((0_u8..5, 0_i64..16, 1_u8..20), 1..12),
        packing in any::<bool>(),
        fixed in prop::option::of(1.0_f64..20.0),
        v_spacing in 0.0_f64..6.0,
    ) {
        let mut g = gantt(children.clone(), packing, fixed, v_spacing);
        g.layout().unwrap();
        let mut lowest: f64 = 0.0;
        for index in 0..children.len() {
            let row = g.child_parent_row(index).unwrap().expect("every child has a parent");
            let row = g.parent_row_bounds(row).unwrap().expect("live row");
            let child = g.child_bounds(index).unwrap();
            prop_assert!(child.y >= row.y + v_spacing - 1e-9, "child {index} above its row's spacing");
            prop_assert!(child.max_y() <= row.max_y() - v_spacing + 1e-9, "child {index} below its row's spacing");
            lowest = lowest.max(child.max_y());
        }
        prop_assert!(g.height() >= lowest, "height {} under the lowest child {lowest}", g.height());
    }
}
