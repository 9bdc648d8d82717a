// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Geometry and the lazily validated bounds cache.

use kurbo::{Point, Rect};

/// Axis-aligned bounds in layout coordinates.
///
/// Stored as origin plus size because layouts compute the two axes
/// independently and a negative width must survive until it is read.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bounds {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Bounds {
    /// Empty bounds at the origin.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    /// Create bounds from an origin and size.
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge.
    pub fn max_x(&self) -> f64 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn max_y(&self) -> f64 {
        self.y + self.height
    }

    /// Convert to a `kurbo` rectangle.
    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.max_x(), self.max_y())
    }

    /// Shift into the coordinate space whose origin sits at `origin`.
    pub fn relative_to(&self, origin: Point) -> Self {
        Self::new(self.x - origin.x, self.y - origin.y, self.width, self.height)
    }

    /// Containment test with inclusive edges.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x && point.x <= self.max_x() && point.y >= self.y && point.y <= self.max_y()
    }

    /// Intersection test with inclusive edges; touching bounds intersect.
    pub fn intersects(&self, area: &Rect) -> bool {
        self.x <= area.x1 && self.max_x() >= area.x0 && self.y <= area.y1 && self.max_y() >= area.y0
    }
}

impl From<Bounds> for Rect {
    fn from(bounds: Bounds) -> Self {
        bounds.to_rect()
    }
}

/// Bounds whose two axes are recomputed on demand.
///
/// Each axis carries the version it was last validated against. A read
/// through [`LazyBounds::sync_horizontal`] or [`LazyBounds::sync_vertical`]
/// runs the supplied layout callback only when that stamp differs from the
/// live counter, and writes the stamp only once the callback has returned
/// successfully. A callback that fails or panics therefore leaves the axis
/// invalid, and the next read retries.
///
/// The callback receives the raw bounds mutably, so it cannot observe its own
/// not-yet-committed values through this cache.
///
/// ```rust
/// use understory_time_layout::LazyBounds;
///
/// let mut lazy = LazyBounds::new();
/// let mut runs = 0;
/// for _ in 0..3 {
///     lazy.sync_horizontal(7, |b| {
///         runs += 1;
///         b.x = 10.0;
///         b.width = 5.0;
///         Ok::<_, ()>(())
///     })
///     .unwrap();
/// }
/// assert_eq!(runs, 1);
/// assert_eq!(lazy.peek().max_x(), 15.0);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LazyBounds {
    bounds: Bounds,
    horizontal: Option<u64>,
    vertical: Option<u64>,
}

impl LazyBounds {
    /// Zero bounds with both axes invalid.
    pub const fn new() -> Self {
        Self {
            bounds: Bounds::ZERO,
            horizontal: None,
            vertical: None,
        }
    }

    /// The stored bounds, without any validity check.
    pub fn peek(&self) -> Bounds {
        self.bounds
    }

    /// Returns `true` if x and width were validated against `live`.
    pub fn is_horizontal_valid(&self, live: u64) -> bool {
        self.horizontal == Some(live)
    }

    /// Returns `true` if y and height were validated against `live`.
    pub fn is_vertical_valid(&self, live: u64) -> bool {
        self.vertical == Some(live)
    }

    /// Force both axes to recompute on the next read.
    pub fn invalidate(&mut self) {
        self.horizontal = None;
        self.vertical = None;
    }

    /// Force x and width to recompute on the next read.
    pub fn invalidate_horizontal(&mut self) {
        self.horizontal = None;
    }

    /// Force y and height to recompute on the next read.
    pub fn invalidate_vertical(&mut self) {
        self.vertical = None;
    }

    /// Run `layout` if the horizontal stamp differs from `live`.
    ///
    /// Returns whether the callback ran.
    pub fn sync_horizontal<E>(
        &mut self,
        live: u64,
        layout: impl FnOnce(&mut Bounds) -> Result<(), E>,
    ) -> Result<bool, E> {
        if self.is_horizontal_valid(live) {
            return Ok(false);
        }
        layout(&mut self.bounds)?;
        self.horizontal = Some(live);
        Ok(true)
    }

    /// Run `layout` if the vertical stamp differs from `live`.
    ///
    /// Returns whether the callback ran.
    pub fn sync_vertical<E>(
        &mut self,
        live: u64,
        layout: impl FnOnce(&mut Bounds) -> Result<(), E>,
    ) -> Result<bool, E> {
        if self.is_vertical_valid(live) {
            return Ok(false);
        }
        layout(&mut self.bounds)?;
        self.vertical = Some(live);
        Ok(true)
    }

    /// Store precomputed x and width and stamp them with `live`.
    pub fn set_horizontal(&mut self, x: f64, width: f64, live: u64) {
        self.bounds.x = x;
        self.bounds.width = width;
        self.horizontal = Some(live);
    }

    /// Store precomputed y and height and stamp them with `live`.
    pub fn set_vertical(&mut self, y: f64, height: f64, live: u64) {
        self.bounds.y = y;
        self.bounds.height = height;
        self.vertical = Some(live);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_is_edge_inclusive() {
        let b = Bounds::new(10.0, 20.0, 30.0, 5.0);
        assert!(b.contains(Point::new(10.0, 20.0)), "top-left corner");
        assert!(b.contains(Point::new(40.0, 25.0)), "bottom-right corner");
        assert!(!b.contains(Point::new(40.1, 25.0)), "just outside");
    }

    #[test]
    fn touching_bounds_intersect() {
        let b = Bounds::new(0.0, 0.0, 10.0, 10.0);
        assert!(b.intersects(&Rect::new(10.0, 10.0, 20.0, 20.0)), "corner touch");
        assert!(!b.intersects(&Rect::new(10.5, 0.0, 20.0, 20.0)), "gap");
    }

    #[test]
    fn relative_to_shifts_origin() {
        let b = Bounds::new(10.0, 20.0, 3.0, 4.0).relative_to(Point::new(5.0, 5.0));
        assert_eq!(b, Bounds::new(5.0, 15.0, 3.0, 4.0), "size kept");
    }

    #[test]
    fn recompute_only_on_version_change() {
        let mut lazy = LazyBounds::new();
        let mut runs = 0;
        let mut read = |lazy: &mut LazyBounds, live: u64| {
            lazy.sync_vertical(live, |b| {
                runs += 1;
                b.y = live as f64;
                b.height = 1.0;
                Ok::<_, ()>(())
            })
            .unwrap()
        };
        assert!(read(&mut lazy, 1), "first read computes");
        assert!(!read(&mut lazy, 1), "second read is cached");
        assert!(read(&mut lazy, 2), "version bump recomputes");
        assert_eq!(runs, 2, "exactly two computations");
        assert_eq!(lazy.peek().y, 2.0, "latest input reflected");
    }

    #[test]
    fn axes_are_independent() {
        let mut lazy = LazyBounds::new();
        lazy.set_horizontal(1.0, 2.0, 4);
        assert!(lazy.is_horizontal_valid(4), "stamped");
        assert!(!lazy.is_vertical_valid(4), "other axis untouched");
        lazy.invalidate_horizontal();
        assert!(!lazy.is_horizontal_valid(4), "invalidated");
    }

    #[test]
    fn failed_layout_leaves_axis_invalid() {
        let mut lazy = LazyBounds::new();
        let err = lazy.sync_horizontal(3, |b| {
            b.x = 99.0;
            Err("reader failed")
        });
        assert_eq!(err, Err("reader failed"), "error propagates");
        assert!(!lazy.is_horizontal_valid(3), "no stamp after failure");
        let ran = lazy
            .sync_horizontal(3, |b| {
                b.x = 1.0;
                Ok::<_, &str>(())
            })
            .unwrap();
        assert!(ran, "next read retries");
    }
}
