//! Day event lists for the multi-room summary.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{HousekeepingTask, Reservation, Room};

/// Event kinds in list order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Arrival,
    Changeover,
    Departure,
    Housekeeping,
    Stay,
}

/// Something happening on a room on a given day.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DayEvent {
    Arrival {
        room: String,
        reservation: Reservation,
    },
    /// One guest leaves and the next arrives the same day.
    Changeover {
        room: String,
        arriving: Reservation,
        departing: Reservation,
    },
    Departure {
        room: String,
        reservation: Reservation,
    },
    Housekeeping {
        room: String,
        task: HousekeepingTask,
    },
    Stay {
        room: String,
        reservation: Reservation,
    },
}

impl DayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            DayEvent::Arrival { .. } => EventKind::Arrival,
            DayEvent::Changeover { .. } => EventKind::Changeover,
            DayEvent::Departure { .. } => EventKind::Departure,
            DayEvent::Housekeeping { .. } => EventKind::Housekeeping,
            DayEvent::Stay { .. } => EventKind::Stay,
        }
    }

    /// Display name of the room.
    pub fn room(&self) -> &str {
        match self {
            DayEvent::Arrival { room, .. }
            | DayEvent::Changeover { room, .. }
            | DayEvent::Departure { room, .. }
            | DayEvent::Housekeeping { room, .. }
            | DayEvent::Stay { room, .. } => room,
        }
    }

    /// Id of the record this event was derived from. Changeovers are keyed
    /// by the arriving stay.
    pub fn source_id(&self) -> &str {
        match self {
            DayEvent::Arrival { reservation, .. }
            | DayEvent::Departure { reservation, .. }
            | DayEvent::Stay { reservation, .. } => &reservation.id,
            DayEvent::Changeover { arriving, .. } => &arriving.id,
            DayEvent::Housekeeping { task, .. } => &task.id,
        }
    }
}

/// Events of `date` across `rooms`, deduplicated and in list order.
///
/// Reservations are matched to rooms through [`Room::matches`], so a host
/// with two rooms sharing a name would see each stay twice without the
/// (kind, source, room) dedup.
pub fn day_events(
    date: NaiveDate,
    rooms: &[Room],
    reservations: &[Reservation],
    tasks: &[HousekeepingTask],
) -> Vec<DayEvent> {
    let mut events = Vec::new();

    for room in rooms {
        let on_room: Vec<&Reservation> = reservations
            .iter()
            .filter(|r| r.status.occupies() && r.is_valid() && room.matches(&r.room))
            .collect();

        let mut arriving: Vec<&Reservation> =
            on_room.iter().copied().filter(|r| r.check_in == date).collect();
        let mut departing: Vec<&Reservation> =
            on_room.iter().copied().filter(|r| r.check_out == date).collect();

        while let (Some(&a), Some(&d)) = (arriving.first(), departing.first()) {
            if a.id == d.id {
                break;
            }
            events.push(DayEvent::Changeover {
                room: room.name.clone(),
                arriving: a.clone(),
                departing: d.clone(),
            });
            arriving.remove(0);
            departing.remove(0);
        }

        events.extend(arriving.into_iter().map(|r| DayEvent::Arrival {
            room: room.name.clone(),
            reservation: r.clone(),
        }));
        events.extend(departing.into_iter().map(|r| DayEvent::Departure {
            room: room.name.clone(),
            reservation: r.clone(),
        }));
        events.extend(
            tasks
                .iter()
                .filter(|t| t.date == date && room.matches(&t.room))
                .map(|t| DayEvent::Housekeeping {
                    room: room.name.clone(),
                    task: t.clone(),
                }),
        );
        events.extend(
            on_room
                .iter()
                .filter(|r| r.check_in < date && date < r.check_out)
                .map(|r| DayEvent::Stay {
                    room: room.name.clone(),
                    reservation: (*r).clone(),
                }),
        );
    }

    let mut seen = HashSet::new();
    events.retain(|e| seen.insert((e.kind(), e.source_id().to_string(), e.room().to_string())));
    events.sort_by(|a, b| a.kind().cmp(&b.kind()).then_with(|| a.room().cmp(b.room())));
    events
}

/// Day-by-day events from `from` to `to`, inclusive, skipping empty days.
pub fn events_between(
    from: NaiveDate,
    to: NaiveDate,
    rooms: &[Room],
    reservations: &[Reservation],
    tasks: &[HousekeepingTask],
) -> Vec<(NaiveDate, Vec<DayEvent>)> {
    from.iter_days()
        .take_while(|d| *d <= to)
        .map(|d| (d, day_events(d, rooms, reservations, tasks)))
        .filter(|(_, events)| !events.is_empty())
        .collect()
}
