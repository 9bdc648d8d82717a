// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visible-range traversal.

use kurbo::{Point, Rect};

use crate::Bounds;

/// Visit the items whose bounds, shifted by `origin`, meet `area`.
///
/// `bounds_of` reads an item's bounds in layout coordinates and may compute
/// them lazily through `state`; `visit` receives the item with its rectangle in
/// area coordinates (layout coordinates minus `origin`) and the same `state`,
/// so it can recurse into nested items.
///
/// When `ascending_y` is set, items must be ordered by non-decreasing top
/// edge. Iteration then stops at the first item starting below the area and
/// skips items ending above it without testing them further.
///
/// Intersection is edge-inclusive. An area with zero width or height visits
/// nothing.
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use understory_time_layout::{Bounds, cull};
///
/// let rows = [
///     Bounds::new(0.0, 0.0, 100.0, 10.0),
///     Bounds::new(0.0, 10.0, 100.0, 10.0),
///     Bounds::new(0.0, 20.0, 100.0, 10.0),
/// ];
/// let mut seen = Vec::new();
/// cull::visit_visible(
///     &mut seen,
///     0..rows.len(),
///     true,
///     Rect::new(0.0, 0.0, 100.0, 5.0),
///     Point::new(0.0, 12.0),
///     |_, &i| Ok::<_, ()>(rows[i]),
///     |seen, i, _| {
///         seen.push(i);
///         Ok(())
///     },
/// )
/// .unwrap();
/// assert_eq!(seen, [1]);
/// ```
pub fn visit_visible<S, I, E>(
    state: &mut S,
    items: impl IntoIterator<Item = I>,
    ascending_y: bool,
    area: Rect,
    origin: Point,
    mut bounds_of: impl FnMut(&mut S, &I) -> Result<Bounds, E>,
    mut visit: impl FnMut(&mut S, I, Rect) -> Result<(), E>,
) -> Result<(), E> {
    if area.width() == 0.0 || area.height() == 0.0 {
        return Ok(());
    }
    for item in items {
        let shifted = bounds_of(state, &item)?.relative_to(origin);
        if ascending_y {
            if shifted.y > area.y1 {
                break;
            }
            if shifted.max_y() < area.y0 {
                continue;
            }
        }
        if shifted.intersects(&area) {
            visit(state, item, shifted.to_rect())?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use alloc::{vec, vec::Vec};

    use super::*;

    fn stack(n: usize) -> Vec<Bounds> {
        (0..n)
            .map(|i| Bounds::new(0.0, i as f64 * 10.0, 50.0, 10.0))
            .collect()
    }

    #[test]
    fn ascending_traversal_stops_below_the_area() {
        let rows = stack(100);
        let mut reads = 0;
        let mut seen = Vec::new();
        visit_visible(
            &mut seen,
            0..rows.len(),
            true,
            Rect::new(0.0, 25.0, 50.0, 45.0),
            Point::ZERO,
            |_, &i| {
                reads += 1;
                Ok::<_, ()>(rows[i])
            },
            |seen, i, _| {
                seen.push(i);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(seen, vec![2, 3, 4], "rows touching 25..45");
        assert_eq!(reads, 6, "stops at the first row starting past 45");
    }

    #[test]
    fn unordered_traversal_tests_every_item() {
        let mut rows = stack(5);
        rows.reverse();
        let mut seen = Vec::new();
        visit_visible(
            &mut seen,
            0..rows.len(),
            false,
            Rect::new(0.0, 0.0, 50.0, 15.0),
            Point::ZERO,
            |_, &i| Ok::<_, ()>(rows[i]),
            |seen, i, _| {
                seen.push(i);
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(seen, vec![3, 4], "bottom of the reversed list");
    }

    #[test]
    fn origin_shifts_the_reported_rect() {
        let rows = stack(3);
        let mut seen = Vec::new();
        visit_visible(
            &mut seen,
            0..rows.len(),
            true,
            Rect::new(0.0, 0.0, 10.0, 10.0),
            Point::new(-5.0, 20.0),
            |_, &i| Ok::<_, ()>(rows[i]),
            |seen, i, rect| {
                seen.push((i, rect));
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(
            seen,
            vec![(1, Rect::new(5.0, -10.0, 55.0, 0.0)), (2, Rect::new(5.0, 0.0, 55.0, 10.0))],
            "edge-touching row 1 is included"
        );
    }

    #[test]
    fn empty_area_visits_nothing() {
        let rows = stack(3);
        let mut seen = 0;
        visit_visible(
            &mut seen,
            0..rows.len(),
            false,
            Rect::new(0.0, 0.0, 0.0, 100.0),
            Point::ZERO,
            |_, &i| Ok::<_, ()>(rows[i]),
            |seen, _, _| {
                *seen += 1;
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(seen, 0, "zero-width area");
    }

    #[test]
    fn errors_stop_the_traversal() {
        let rows = stack(3);
        let result = visit_visible(
            &mut (),
            0..rows.len(),
            true,
            Rect::new(0.0, 0.0, 50.0, 50.0),
            Point::ZERO,
            |_, &i| if i == 1 { Err("unreadable") } else { Ok(rows[i]) },
            |_, _, _| Ok(()),
        );
        assert_eq!(result, Err("unreadable"), "first error wins");
    }
}
