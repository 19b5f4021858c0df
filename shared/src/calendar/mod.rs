//! Booking calendar: month grids, day event lists and view state.

pub mod events;
pub mod grid;
pub mod month;
pub mod view;

pub use events::{day_events, events_between, DayEvent, EventKind};
pub use grid::{
    clip_to_month, clip_to_window, occupied_span, CalendarDay, DayIndicator, MonthGrid,
    ReservationBar, Segment, SegmentKind,
};
pub use month::Month;
pub use view::{CalendarView, CalendarViewState, FetchTicket};
