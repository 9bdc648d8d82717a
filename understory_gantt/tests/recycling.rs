// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Row identity across passes of random children.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use proptest::prelude::*;
use understory_gantt::{GanttLayout, RowId};
use understory_time_axis::{Bound, LinearProjector, TimeWindow};

/// (parent key, day)
type Item = (u8, i64);

fn gantt() -> GanttLayout<Item, i64, u8, u8> {
    let mut gantt = GanttLayout::new();
    gantt
        .core_mut()
        .set_start_time_reader(|c: &Item| c.1, Bound::Inclusive)
        .set_end_time_reader(|c: &Item| c.1 + 2, Bound::Inclusive)
        .set_time_window(Some(TimeWindow::new(0, 19)))
        .set_projector(Rc::new(LinearProjector))
        .set_width(200.0)
        .set_child_fixed_height(Some(8.0));
    gantt
        .set_child_parent_reader(Some(Box::new(|c: &Item| Some(c.0))))
        .set_parent_grandparent_reader(Some(Box::new(|p: &u8| Some(p % 2))))
        .set_tetris_packing(true);
    gantt
}

proptest! {
    #[test]
    fn row_ids_follow_their_keys(passes in prop::collection::vec(prop::collection::vec((0_u8..6, 0_i64..16), 0..10), 1..8)) {
        let mut g = gantt();
        let mut history: Vec<HashMap<u8, RowId>> = Vec::new();
        for children in passes {
            g.core_mut().set_children(children.clone());
            let mut rows = HashMap::new();
            for (index, &(key, _)) in children.iter().enumerate() {
                let row = g.child_parent_row(index).unwrap().expect("every child has a parent");
                let previous = rows.insert(key, row);
                prop_assert!(previous.is_none_or(|p| p == row), "one row per key");
            }
            let distinct: HashSet<RowId> = rows.values().copied().collect();
            prop_assert_eq!(distinct.len(), rows.len(), "distinct keys, distinct rows");

            for (key, row) in &rows {
                let last = history.last().and_then(|h| h.get(key));
                let before_last = history.iter().rev().nth(1).and_then(|h| h.get(key));
                match (last, before_last) {
                    (Some(last), _) => prop_assert_eq!(last, row, "kept from the last pass"),
                    (None, Some(older)) => prop_assert_eq!(older, row, "revived after one pass"),
                    (None, None) => {}
                }
            }
            history.push(rows);

            // Grandparent rows stack all of their parents without gaps.
            g.layout().unwrap();
            let mut bottom = 0.0;
            for gp in g.grandparent_rows().to_vec() {
                let bounds = g.grandparent_row_bounds(gp).unwrap().unwrap();
                prop_assert_eq!(bounds.y, bottom, "grandparents are contiguous");
                bottom = bounds.max_y();
            }
            prop_assert_eq!(g.height(), bottom, "height is the last bottom");
        }
    }
}
