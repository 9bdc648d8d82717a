// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for the linear projector.

use proptest::prelude::*;
use understory_time_axis::{Bound, LinearProjector, Side, TimeProjector, TimeWindow};

fn window_and_width() -> impl Strategy<Value = (TimeWindow<i64>, f64)> {
    (-10_000_i64..10_000, 1_i64..400, 1.0_f64..4.0).prop_map(|(start, units, px_per_unit)| {
        let window = TimeWindow::new(start, start + units - 1);
        (window, (units as f64 * px_per_unit).ceil())
    })
}

proptest! {
    #[test]
    fn end_edge_never_precedes_start_edge(
        (window, width) in window_and_width(),
        a in 0_i64..400,
        b in 0_i64..400,
        start_bound in prop_oneof![Just(Bound::Inclusive), Just(Bound::Exclusive)],
    ) {
        let (lo, hi) = (a.min(b), a.max(b));
        let start = window.start + lo;
        let end = window.start + hi;
        let p = LinearProjector;
        let sx = p.time_to_x(&start, Side::Start, start_bound, &window, width);
        let ex = p.time_to_x(&end, Side::End, Bound::Inclusive, &window, width);
        prop_assert!(ex >= sx, "end {ex} before start {sx}");
    }

    #[test]
    fn inverse_lands_within_one_unit(
        (window, width) in window_and_width(),
        offset in 0_i64..400,
    ) {
        let time = window.start + offset % window.duration_units();
        let p = LinearProjector;
        let x = p.time_to_x(&time, Side::Start, Bound::Inclusive, &window, width);
        let back = p.x_to_time(x, &window, width).expect("positive width is invertible");
        prop_assert!((back - time).abs() <= 1, "{time} -> {x} -> {back}");
    }

    #[test]
    fn projection_is_monotonic(
        (window, width) in window_and_width(),
        a in -50_i64..450,
        b in -50_i64..450,
    ) {
        let (lo, hi) = (a.min(b), a.max(b));
        let p = LinearProjector;
        let x_lo = p.time_to_x(&(window.start + lo), Side::Start, Bound::Inclusive, &window, width);
        let x_hi = p.time_to_x(&(window.start + hi), Side::Start, Bound::Inclusive, &window, width);
        prop_assert!(x_lo <= x_hi, "{lo} -> {x_lo}, {hi} -> {x_hi}");
    }
}
