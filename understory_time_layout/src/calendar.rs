// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Month grids: one row per week, one column per weekday.

use alloc::boxed::Box;
use alloc::rc::Rc;

use kurbo::{Point, Rect};
use understory_time_axis::{
    Bound, CalendarDate, DayOfWeekProjector, Temporal, TimeProjector, TimeWindow,
};

use crate::{Bounds, LayoutError, TimeLayer, TimeLayout};

/// A [`TimeLayout`] that lays days out as a month calendar.
///
/// A child's start day picks its cell: the column is its weekday
/// (Monday first) and the row is its week of the month. X comes from a
/// [`DayOfWeekProjector`], so the width is split into seven equal columns and
/// an inclusive end day closes its column. Children are expected to stay
/// within one week; a span that wraps past Sunday projects a negative width.
///
/// The time window is still required by the horizontal pass but does not
/// move anything; set it to the month on display.
///
/// ## Example
///
/// ```rust
/// use understory_time_axis::{CalendarDate, DayOfWeek, TimeWindow, Temporal};
/// use understory_time_layout::CalendarLayout;
///
/// /// Day `n` of a month whose 1st is a Wednesday.
/// #[derive(Clone, Debug, PartialEq, PartialOrd)]
/// struct Day(u32);
///
/// impl Temporal for Day {
///     fn units_until(&self, end: &Self) -> i64 {
///         i64::from(end.0) - i64::from(self.0)
///     }
///     fn plus_units(&self, units: i64) -> Option<Self> {
///         u32::try_from(i64::from(self.0) + units).ok().map(Day)
///     }
/// }
/// impl DayOfWeek for Day {
///     fn day_of_week(&self) -> u32 {
///         (self.0 + 1) % 7
///     }
/// }
/// impl CalendarDate for Day {
///     fn day_of_month(&self) -> u32 {
///         self.0
///     }
/// }
///
/// let mut calendar = CalendarLayout::new();
/// calendar.set_day_readers(|d: &u32| Day(*d), |d: &u32| Day(*d));
/// calendar
///     .time_layout_mut()
///     .core_mut()
///     .set_time_window(Some(TimeWindow::new(Day(1), Day(31))))
///     .set_width(700.0)
///     .set_child_fixed_height(Some(50.0))
///     .set_children(vec![1, 6]);
///
/// // The 1st is a Wednesday in week 0; the 6th is the next Monday.
/// let first = calendar.child_bounds(0).unwrap();
/// assert_eq!((first.x, first.y, first.width), (200.0, 0.0, 100.0));
/// let sixth = calendar.child_bounds(1).unwrap();
/// assert_eq!((sixth.x, sixth.y), (0.0, 50.0));
/// ```
pub struct CalendarLayout<C, T> {
    layout: TimeLayout<C, T>,
}

impl<C, T: core::fmt::Debug> core::fmt::Debug for CalendarLayout<C, T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CalendarLayout")
            .field("layout", &self.layout)
            .finish()
    }
}

impl<C, T: CalendarDate + 'static> Default for CalendarLayout<C, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, T: CalendarDate + 'static> CalendarLayout<C, T> {
    /// An empty calendar with the weekday projector installed.
    pub fn new() -> Self {
        let mut layout = TimeLayout::new();
        layout
            .core_mut()
            .set_projector(Rc::new(DayOfWeekProjector));
        Self { layout }
    }

    /// Set how a child's first and last days are read. Both are inclusive.
    ///
    /// The first day also drives the row and column readers.
    pub fn set_day_readers(
        &mut self,
        start: impl Fn(&C) -> T + 'static,
        end: impl Fn(&C) -> T + 'static,
    ) -> &mut Self {
        let start = Rc::new(start);
        let column_start = Rc::clone(&start);
        let row_start = Rc::clone(&start);
        self.layout
            .core_mut()
            .set_start_time_reader(move |c: &C| (*start)(c), Bound::Inclusive)
            .set_end_time_reader(end, Bound::Inclusive)
            .set_column_index_reader(Some(Box::new(move |c: &C| {
                (*column_start)(c).day_of_week() as usize
            })));
        self.layout
            .set_row_index_reader(Some(Box::new(move |c: &C| {
                (*row_start)(c).week_of_month() as usize
            })));
        self
    }
}

impl<C, T> CalendarLayout<C, T> {
    /// The underlying layout.
    pub fn time_layout(&self) -> &TimeLayout<C, T> {
        &self.layout
    }

    /// Mutable access to the underlying layout and its inputs.
    ///
    /// Replacing the projector or the row reader here turns the grid back
    /// into a plain [`TimeLayout`].
    pub fn time_layout_mut(&mut self) -> &mut TimeLayout<C, T> {
        &mut self.layout
    }

    /// Week row of a child.
    pub fn child_week(&mut self, index: usize) -> Result<usize, LayoutError> {
        self.layout.child_row_index(index)
    }
}

impl<C, T: Temporal> CalendarLayout<C, T> {
    /// Weekday column of a child.
    pub fn child_weekday(&mut self, index: usize) -> Result<usize, LayoutError> {
        self.layout.core_mut().child_column_index(index)
    }

    /// Fully synced bounds of a child.
    pub fn child_bounds(&mut self, index: usize) -> Result<Bounds, LayoutError> {
        self.layout.child_bounds(index)
    }

    /// Run a pass: the height becomes the bottom of the last week in use.
    pub fn layout(&mut self) -> Result<(), LayoutError> {
        self.layout.layout()
    }

    /// Layout height.
    pub fn height(&self) -> f64 {
        self.layout.height()
    }
}

impl<C, T: Temporal> TimeLayer<T> for CalendarLayout<C, T> {
    fn set_time_window(&mut self, window: Option<TimeWindow<T>>) {
        self.layout.core_mut().set_time_window(window);
    }

    fn set_width(&mut self, width: f64) {
        self.layout.core_mut().set_width(width);
    }

    fn set_projector(&mut self, projector: Rc<dyn TimeProjector<T>>) {
        self.layout.core_mut().set_projector(projector);
    }

    fn is_visible(&self) -> bool {
        self.layout.core().is_visible()
    }

    fn top_y(&self) -> f64 {
        self.layout.core().top_y()
    }

    fn height(&self) -> f64 {
        Self::height(self)
    }

    fn child_count(&self) -> usize {
        self.layout.core().child_count()
    }

    fn layout(&mut self) -> Result<(), LayoutError> {
        Self::layout(self)
    }

    fn child_bounds(&mut self, index: usize) -> Result<Bounds, LayoutError> {
        Self::child_bounds(self, index)
    }

    fn pick_child_at(
        &mut self,
        point: Point,
        only_if_selectable: bool,
    ) -> Result<Option<usize>, LayoutError> {
        self.layout.pick_child_at(point, only_if_selectable)
    }

    fn selected_child(&self) -> Option<usize> {
        self.layout.core().selected_child()
    }

    fn select_child(&mut self, index: Option<usize>) -> Result<(), LayoutError> {
        self.layout.core_mut().select_child(index)
    }

    fn visit_visible_children(
        &mut self,
        area: Rect,
        origin: Point,
        visit: &mut dyn FnMut(usize, Rect),
    ) -> Result<(), LayoutError> {
        self.layout.visit_visible_children(area, origin, visit)
    }
}
