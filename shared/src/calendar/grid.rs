//! Month grid reconciliation.
//!
//! A stay `[check_in, check_out)` occupies the nights `check_in ..=
//! check_out - 1`. The grid shows the part of that span falling in the
//! visible month, one segment per occupied day, plus an arrival/departure
//! indicator on the real check-in and check-out days.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Days, NaiveDate, Weekday};
use serde::Serialize;
use tracing::warn;

use super::Month;
use crate::channel::Channel;
use crate::models::{HousekeepingTask, Reservation};

/// Where a day sits within a stay's occupied nights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Arrival,
    Middle,
    Departure,
    Single,
}

/// Part of one reservation, localised to one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub reservation_id: String,
    pub room: String,
    pub kind: SegmentKind,
    pub channel: Channel,
}

/// Movement marker on a room for one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayIndicator {
    Arrival,
    Departure,
    /// One stay leaves and another arrives on the same day.
    Changeover,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomIndicator {
    pub room: String,
    pub indicator: DayIndicator,
}

/// A day of the month grid.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub segments: Vec<Segment>,
    pub tasks: Vec<HousekeepingTask>,
    pub indicators: Vec<RoomIndicator>,
}

impl CalendarDay {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            segments: Vec::new(),
            tasks: Vec::new(),
            indicators: Vec::new(),
        }
    }

    pub fn segments_for<'a>(&'a self, room: &'a str) -> impl Iterator<Item = &'a Segment> + 'a {
        self.segments.iter().filter(move |s| s.room == room)
    }

    pub fn tasks_for<'a>(&'a self, room: &'a str) -> impl Iterator<Item = &'a HousekeepingTask> + 'a {
        self.tasks.iter().filter(move |t| t.room == room)
    }

    pub fn indicator_for(&self, room: &str) -> Option<DayIndicator> {
        self.indicators
            .iter()
            .find(|i| i.room == room)
            .map(|i| i.indicator)
    }
}

/// The visible part of one reservation, as a continuous bar.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationBar {
    pub reservation_id: String,
    pub room: String,
    pub guest_name: String,
    pub channel: Channel,
    pub nights: i64,
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Index into `MonthGrid::days`
    pub start_index: usize,
    pub end_index: usize,
    pub continues_before: bool,
    pub continues_after: bool,
}

impl ReservationBar {
    pub fn visible_nights(&self) -> usize {
        self.end_index - self.start_index + 1
    }
}

/// Display model of one month.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGrid {
    pub month: Month,
    /// Blank cells before day 1 in a Monday-first week layout
    pub leading_blanks: u32,
    pub days: Vec<CalendarDay>,
    pub bars: Vec<ReservationBar>,
}

/// The occupied nights of a reservation as an inclusive range, or `None`
/// for zero-or-negative-night records.
pub fn occupied_span(reservation: &Reservation) -> Option<(NaiveDate, NaiveDate)> {
    let nights = reservation.nights();
    if nights <= 0 {
        return None;
    }
    let start = reservation.check_in;
    let end = if nights == 1 {
        start
    } else {
        reservation.check_out.checked_sub_days(Days::new(1))?
    };
    Some((start, end))
}

/// Clip an inclusive span to the inclusive window `first ..= last`. `None`
/// when nothing is visible.
pub fn clip_to_window(
    (start, end): (NaiveDate, NaiveDate),
    first: NaiveDate,
    last: NaiveDate,
) -> Option<(NaiveDate, NaiveDate)> {
    let start = start.max(first);
    let end = end.min(last);
    (start <= end).then_some((start, end))
}

/// Clip an inclusive span to the month.
pub fn clip_to_month(
    span: (NaiveDate, NaiveDate),
    month: &Month,
) -> Option<(NaiveDate, NaiveDate)> {
    clip_to_window(span, month.first_day(), month.last_day())
}

/// Classify one occupied night of `span`.
fn segment_kind(date: NaiveDate, (start, end): (NaiveDate, NaiveDate)) -> SegmentKind {
    if start == end {
        SegmentKind::Single
    } else if date == start {
        SegmentKind::Arrival
    } else if date == end {
        SegmentKind::Departure
    } else {
        SegmentKind::Middle
    }
}

impl MonthGrid {
    /// Build the grid for `month` from whatever reservations and tasks are
    /// at hand. Records outside the month are ignored; cancelled and
    /// degenerate stays are dropped.
    pub fn build(month: Month, reservations: &[Reservation], tasks: &[HousekeepingTask]) -> Self {
        let dates = month.days();
        let mut days: Vec<CalendarDay> = dates.iter().copied().map(CalendarDay::new).collect();
        let mut bars = Vec::new();

        let active: Vec<&Reservation> = reservations
            .iter()
            .filter(|r| r.status.occupies())
            .collect();

        for reservation in &active {
            let Some(span) = occupied_span(reservation) else {
                continue;
            };
            let Some((start, end)) = clip_to_month(span, &month) else {
                continue;
            };

            let start_index = dates.iter().position(|d| *d == start);
            let end_index = dates.iter().position(|d| *d == end);
            let (Some(start_index), Some(end_index)) = (start_index, end_index) else {
                warn!(
                    reservation = %reservation.id,
                    %start,
                    %end,
                    "Clipped stay not found among visible days"
                );
                continue;
            };

            let channel = reservation.channel();
            for day in &mut days[start_index..=end_index] {
                day.segments.push(Segment {
                    reservation_id: reservation.id.clone(),
                    room: reservation.room.clone(),
                    kind: segment_kind(day.date, span),
                    channel,
                });
            }

            bars.push(ReservationBar {
                reservation_id: reservation.id.clone(),
                room: reservation.room.clone(),
                guest_name: reservation.guest_name.clone(),
                channel,
                nights: reservation.nights(),
                start,
                end,
                start_index,
                end_index,
                continues_before: span.0 < start,
                continues_after: span.1 > end,
            });
        }

        for (date, room, indicator) in movement_indicators(&active, &month) {
            if let Some(day) = days.iter_mut().find(|d| d.date == date) {
                day.indicators.push(RoomIndicator { room, indicator });
            }
        }

        for task in tasks {
            if let Some(day) = days.iter_mut().find(|d| d.date == task.date) {
                day.tasks.push(task.clone());
            }
        }

        Self {
            month,
            leading_blanks: month.leading_blanks(Weekday::Mon),
            days,
            bars,
        }
    }

    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.days.iter().find(|d| d.date == date)
    }

    /// Nights of `reservation_id` drawn in this month.
    pub fn visible_nights(&self, reservation_id: &str) -> usize {
        self.bars
            .iter()
            .filter(|b| b.reservation_id == reservation_id)
            .map(ReservationBar::visible_nights)
            .sum()
    }
}

/// Arrival/departure/changeover markers per (day, room), in date order.
fn movement_indicators(
    reservations: &[&Reservation],
    month: &Month,
) -> Vec<(NaiveDate, String, DayIndicator)> {
    #[derive(Default)]
    struct Movements<'a> {
        arriving: BTreeSet<&'a str>,
        departing: BTreeSet<&'a str>,
    }

    let mut by_day_room: BTreeMap<(NaiveDate, &str), Movements> = BTreeMap::new();
    for reservation in reservations.iter().filter(|r| r.is_valid()) {
        if month.contains(reservation.check_in) {
            by_day_room
                .entry((reservation.check_in, reservation.room.as_str()))
                .or_default()
                .arriving
                .insert(reservation.id.as_str());
        }
        if month.contains(reservation.check_out) {
            by_day_room
                .entry((reservation.check_out, reservation.room.as_str()))
                .or_default()
                .departing
                .insert(reservation.id.as_str());
        }
    }

    by_day_room
        .into_iter()
        .map(|((date, room), movements)| {
            let turnover = movements
                .arriving
                .iter()
                .any(|a| movements.departing.iter().any(|d| d != a));
            let indicator = if turnover {
                DayIndicator::Changeover
            } else if !movements.arriving.is_empty() {
                DayIndicator::Arrival
            } else {
                DayIndicator::Departure
            };
            (date, room.to_string(), indicator)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ReservationStatus, TaskStatus, TaskType};

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn april() -> Month {
        Month::new(2025, 4).unwrap()
    }

    fn stay(id: &str, room: &str, check_in: &str, check_out: &str) -> Reservation {
        Reservation {
            id: id.to_string(),
            guest_name: format!("Guest {}", id),
            room: room.to_string(),
            check_in: date(check_in),
            check_out: date(check_out),
            status: ReservationStatus::Confirmed,
            amount: 100.0,
            channel_code: None,
        }
    }

    #[test]
    fn test_degenerate_stays_emit_nothing() {
        let reservations = vec![
            stay("zero", "101", "2025-04-07", "2025-04-07"),
            stay("negative", "101", "2025-04-09", "2025-04-07"),
        ];
        let grid = MonthGrid::build(april(), &reservations, &[]);

        assert!(grid.bars.is_empty());
        assert!(grid.days.iter().all(|d| d.segments.is_empty()));
        assert!(grid.days.iter().all(|d| d.indicators.is_empty()));
    }

    #[test]
    fn test_occupied_span_and_clipping() {
        let r = stay("a", "101", "2025-04-07", "2025-04-10");
        let span = occupied_span(&r).unwrap();
        assert_eq!(span, (date("2025-04-07"), date("2025-04-09")));

        assert_eq!(
            clip_to_window(span, date("2025-04-08"), date("2025-04-30")),
            Some((date("2025-04-08"), date("2025-04-09")))
        );
        assert_eq!(clip_to_month(span, &april()), Some(span));
    }

    #[test]
    fn test_clip_outside_window_is_none() {
        let span = (date("2025-03-20"), date("2025-03-25"));
        assert_eq!(clip_to_month(span, &april()), None);
        assert_eq!(
            clip_to_window(
                (date("2025-04-07"), date("2025-04-09")),
                date("2025-04-10"),
                date("2025-04-30"),
            ),
            None
        );

        let may_span = (date("2025-04-28"), date("2025-05-03"));
        assert_eq!(
            clip_to_month(may_span, &Month::new(2025, 5).unwrap()),
            Some((date("2025-05-01"), date("2025-05-03")))
        );
    }

    #[test]
    fn test_single_night() {
        let grid = MonthGrid::build(april(), &[stay("s", "101", "2025-04-07", "2025-04-08")], &[]);

        let segments: Vec<_> = grid.days.iter().flat_map(|d| &d.segments).collect();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].kind, SegmentKind::Single);
        assert_eq!(grid.day(date("2025-04-07")).unwrap().segments.len(), 1);
    }

    #[test]
    fn test_segment_classification() {
        let grid = MonthGrid::build(april(), &[stay("a", "101", "2025-04-07", "2025-04-10")], &[]);
        let kinds: Vec<_> = ["2025-04-07", "2025-04-08", "2025-04-09"]
            .iter()
            .map(|d| grid.day(date(d)).unwrap().segments[0].kind)
            .collect();
        assert_eq!(
            kinds,
            vec![SegmentKind::Arrival, SegmentKind::Middle, SegmentKind::Departure]
        );
        assert!(grid.day(date("2025-04-10")).unwrap().segments.is_empty());
        assert_eq!(
            grid.day(date("2025-04-10")).unwrap().indicator_for("101"),
            Some(DayIndicator::Departure)
        );
    }

    #[test]
    fn test_cross_month_stay_is_clipped() {
        let grid = MonthGrid::build(april(), &[stay("x", "101", "2025-03-28", "2025-04-03")], &[]);

        assert_eq!(grid.bars.len(), 1);
        let bar = &grid.bars[0];
        assert_eq!((bar.start, bar.end), (date("2025-04-01"), date("2025-04-02")));
        assert!(bar.continues_before);
        assert!(!bar.continues_after);
        assert_eq!(bar.nights, 6);
        assert_eq!(grid.visible_nights("x"), 2);
        // The 1st is in the middle of the stay, the 2nd is its last night.
        assert_eq!(grid.days[0].segments[0].kind, SegmentKind::Middle);
        assert_eq!(grid.days[1].segments[0].kind, SegmentKind::Departure);
    }

    #[test]
    fn test_stay_ending_on_first_of_month_only_marks_departure() {
        let grid = MonthGrid::build(april(), &[stay("m", "101", "2025-03-29", "2025-04-01")], &[]);
        assert!(grid.bars.is_empty());
        assert_eq!(grid.days[0].indicator_for("101"), Some(DayIndicator::Departure));
    }

    #[test]
    fn test_changeover_replaces_arrival_and_departure() {
        let reservations = vec![
            stay("a", "101", "2025-04-07", "2025-04-10"),
            stay("b", "101", "2025-04-10", "2025-04-12"),
        ];
        let grid = MonthGrid::build(april(), &reservations, &[]);

        let day = grid.day(date("2025-04-10")).unwrap();
        assert_eq!(day.indicators.len(), 1);
        assert_eq!(day.indicators[0].indicator, DayIndicator::Changeover);
    }

    #[test]
    fn test_same_day_on_different_rooms_is_not_changeover() {
        let reservations = vec![
            stay("a", "101", "2025-04-07", "2025-04-10"),
            stay("b", "102", "2025-04-10", "2025-04-12"),
        ];
        let grid = MonthGrid::build(april(), &reservations, &[]);

        let day = grid.day(date("2025-04-10")).unwrap();
        assert_eq!(day.indicator_for("101"), Some(DayIndicator::Departure));
        assert_eq!(day.indicator_for("102"), Some(DayIndicator::Arrival));
    }

    #[test]
    fn test_cancelled_stays_are_hidden() {
        let mut cancelled = stay("c", "101", "2025-04-07", "2025-04-10");
        cancelled.status = ReservationStatus::Cancelled;
        let grid = MonthGrid::build(april(), &[cancelled], &[]);
        assert!(grid.bars.is_empty());
    }

    #[test]
    fn test_tasks_attached_by_date_and_room() {
        let task = HousekeepingTask {
            id: "t1".to_string(),
            room: "101".to_string(),
            date: date("2025-04-10"),
            task_type: TaskType::Cleaning,
            status: TaskStatus::Pending,
            notes: None,
        };
        let outside = HousekeepingTask {
            date: date("2025-05-02"),
            ..task.clone()
        };
        let grid = MonthGrid::build(april(), &[], &[task, outside]);

        let day = grid.day(date("2025-04-10")).unwrap();
        assert_eq!(day.tasks_for("101").count(), 1);
        assert_eq!(day.tasks_for("102").count(), 0);
        assert_eq!(grid.days.iter().map(|d| d.tasks.len()).sum::<usize>(), 1);
    }

    #[test]
    fn test_leading_blanks_monday_first() {
        let grid = MonthGrid::build(april(), &[], &[]);
        assert_eq!(grid.leading_blanks, 1);
        assert_eq!(grid.days.len(), 30);
    }
}
