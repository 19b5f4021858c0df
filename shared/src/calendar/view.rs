//! Calendar view state across month navigation.
//!
//! Every navigation issues a new [`FetchTicket`]. Only a response carrying
//! the latest ticket may replace the displayed view, so a slow response for
//! a month the user already left is discarded instead of overwriting newer
//! data.

use serde::Serialize;
use tracing::debug;

use super::{day_events, DayEvent, Month, MonthGrid};
use crate::fetch::MonthData;
use crate::models::Room;

/// Handle for one in-flight month fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    month: Month,
}

impl FetchTicket {
    pub fn month(&self) -> Month {
        self.month
    }
}

/// Immutable snapshot of one displayed month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarView {
    pub month: Month,
    pub grid: MonthGrid,
    #[serde(skip)]
    pub data: MonthData,
}

impl CalendarView {
    pub fn build(month: Month, data: MonthData) -> Self {
        let grid = MonthGrid::build(month, &data.reservations, &data.tasks);
        Self { month, grid, data }
    }

    /// Summary list for one day of the view.
    pub fn events_on(&self, date: chrono::NaiveDate, rooms: &[Room]) -> Vec<DayEvent> {
        day_events(date, rooms, &self.data.reservations, &self.data.tasks)
    }
}

#[derive(Debug, Clone)]
pub struct CalendarViewState {
    requested: Month,
    generation: u64,
    current: Option<CalendarView>,
}

impl CalendarViewState {
    pub fn new(month: Month) -> Self {
        Self {
            requested: month,
            generation: 0,
            current: None,
        }
    }

    /// The month the user is looking at, whether or not its data arrived.
    pub fn requested_month(&self) -> Month {
        self.requested
    }

    pub fn view(&self) -> Option<&CalendarView> {
        self.current.as_ref()
    }

    /// Switch to `month` and get the ticket its fetch must present.
    pub fn navigate(&mut self, month: Month) -> FetchTicket {
        self.generation += 1;
        self.requested = month;
        FetchTicket {
            generation: self.generation,
            month,
        }
    }

    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        ticket.generation == self.generation
    }

    /// Install fetched data if `ticket` is still the latest. Returns whether
    /// the view changed.
    pub fn apply(&mut self, ticket: FetchTicket, data: MonthData) -> bool {
        if !self.is_current(&ticket) {
            debug!(
                stale = %ticket.month,
                current = %self.requested,
                "Discarding out-of-date month response"
            );
            return false;
        }
        self.current = Some(CalendarView::build(ticket.month, data));
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Reservation, ReservationStatus};

    fn month(s: &str) -> Month {
        s.parse().unwrap()
    }

    fn data_with(id: &str, check_in: &str, check_out: &str) -> MonthData {
        MonthData {
            reservations: vec![Reservation {
                id: id.to_string(),
                guest_name: "Guest".to_string(),
                room: "101".to_string(),
                check_in: check_in.parse().unwrap(),
                check_out: check_out.parse().unwrap(),
                status: ReservationStatus::Confirmed,
                amount: 0.0,
                channel_code: None,
            }],
            tasks: Vec::new(),
        }
    }

    #[test]
    fn test_stale_response_is_discarded() {
        let mut state = CalendarViewState::new(month("2025-04"));
        let april = state.navigate(month("2025-04"));
        let may = state.navigate(month("2025-05"));

        assert!(state.apply(may, data_with("may", "2025-05-02", "2025-05-04")));
        // April answers late.
        assert!(!state.apply(april, data_with("april", "2025-04-02", "2025-04-04")));

        let view = state.view().unwrap();
        assert_eq!(view.month, month("2025-05"));
        assert_eq!(view.grid.bars[0].reservation_id, "may");
    }

    #[test]
    fn test_navigation_back_and_forth_uses_new_ticket() {
        let mut state = CalendarViewState::new(month("2025-04"));
        let first = state.navigate(month("2025-04"));
        state.navigate(month("2025-05"));
        let again = state.navigate(month("2025-04"));

        assert_eq!(first.month(), again.month());
        assert!(!state.is_current(&first));
        assert!(state.is_current(&again));
        assert_eq!(state.requested_month(), month("2025-04"));
        assert!(state.view().is_none());
    }
}
