// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Property tests for tetris packing.

use proptest::prelude::*;
use understory_gantt::{Interval, TetrisPacker};

fn spans() -> impl Strategy<Value = Vec<Interval>> {
    prop::collection::vec((0_u8..60, 1_u8..20), 1..8).prop_map(|raw| {
        raw.into_iter()
            .map(|(x, w)| Interval::new(f64::from(x), f64::from(x) + f64::from(w)))
            .collect()
    })
}

fn pack(keys: &[usize], spans: &[Interval], packer: &mut TetrisPacker<usize>) -> usize {
    packer.reset_members();
    for &k in keys {
        packer.push(k);
    }
    packer
        .resolve_all(|m| Ok::<_, ()>(spans[keys[m]]))
        .expect("interval reads are infallible")
}

/// Smallest number of rows any valid assignment needs, by exhaustive search.
fn minimal_rows(spans: &[Interval]) -> usize {
    fn fits(spans: &[Interval], rows: &mut Vec<usize>, limit: usize) -> bool {
        let next = rows.len();
        if next == spans.len() {
            return true;
        }
        for row in 0..limit {
            let clash = (0..next).any(|o| rows[o] == row && spans[o].overlaps(&spans[next]));
            if !clash {
                rows.push(row);
                if fits(spans, rows, limit) {
                    return true;
                }
                rows.pop();
            }
        }
        false
    }
    (1..=spans.len())
        .find(|&limit| fits(spans, &mut Vec::new(), limit))
        .unwrap_or(spans.len())
}

proptest! {
    #[test]
    fn no_two_members_of_a_sub_row_overlap(spans in spans()) {
        let keys: Vec<usize> = (0..spans.len()).collect();
        let mut packer = TetrisPacker::new();
        pack(&keys, &spans, &mut packer);
        for row in packer.sub_rows() {
            let members: Vec<usize> = row.collect();
            for (i, &a) in members.iter().enumerate() {
                for &b in &members[i + 1..] {
                    prop_assert!(!spans[a].overlaps(&spans[b]), "{a} and {b} share a sub-row");
                }
            }
        }
    }

    #[test]
    fn packing_by_start_is_minimal(mut spans in spans()) {
        spans.sort_by(|a, b| a.min.total_cmp(&b.min));
        let keys: Vec<usize> = (0..spans.len()).collect();
        let rows = pack(&keys, &spans, &mut TetrisPacker::new());
        prop_assert_eq!(rows, minimal_rows(&spans), "first fit by start is optimal");
    }

    #[test]
    fn appending_a_disjoint_member_moves_nothing(spans in spans()) {
        let keys: Vec<usize> = (0..spans.len()).collect();
        let mut packer = TetrisPacker::new();
        pack(&keys, &spans, &mut packer);
        let before: Vec<Option<usize>> = (0..keys.len()).map(|m| packer.sub_row_of(m)).collect();

        let mut grown = spans.clone();
        grown.push(Interval::new(500.0, 510.0));
        let grown_keys: Vec<usize> = (0..grown.len()).collect();
        packer.restart();
        pack(&grown_keys, &grown, &mut packer);
        let after: Vec<Option<usize>> = (0..keys.len()).map(|m| packer.sub_row_of(m)).collect();
        prop_assert_eq!(before, after, "existing members keep their sub-rows");
    }

    #[test]
    fn repacking_the_same_members_is_stable(spans in spans(), rotation in 0_usize..8) {
        let keys: Vec<usize> = (0..spans.len()).collect();
        let mut packer = TetrisPacker::new();
        pack(&keys, &spans, &mut packer);
        let before: Vec<Option<usize>> = (0..keys.len()).map(|m| packer.sub_row_of(m)).collect();

        // Same members in a new order: the replay restores every sub-row.
        let mut shuffled = keys.clone();
        let len = shuffled.len();
        shuffled.rotate_left(rotation % len);
        pack(&shuffled, &spans, &mut packer);
        for (m, &k) in shuffled.iter().enumerate() {
            prop_assert_eq!(packer.sub_row_of(m), before[k], "member {} moved", k);
        }
    }
}
