//! Reservation and housekeeping fetch through the proxy.
//!
//! The upstream room filter is not reliable: bookings for rooms nobody
//! asked for do come back, so every result is re-filtered here.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::auth::Session;
use crate::calendar::Month;
use crate::models::{
    HousekeepingTask, Reservation, ReservationStatus, Room, TaskStatus, TaskType,
};
use crate::proxy::{actions, ProxyClient};
use crate::Result;

/// Booking record as returned by the channel manager.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalBooking {
    pub id: Value,
    pub room_id: Value,
    pub arrival: String,
    pub departure: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub guest_name: Option<String>,
    #[serde(default)]
    pub status: Option<Value>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub referer: Option<String>,
}

/// Housekeeping record as returned by the proxy.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalTask {
    pub id: Value,
    pub room_id: Value,
    pub date: String,
    #[serde(default, rename = "type")]
    pub task_type: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Everything one month view needs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MonthData {
    pub reservations: Vec<Reservation>,
    pub tasks: Vec<HousekeepingTask>,
}

impl TryFrom<ExternalBooking> for Reservation {
    type Error = String;

    fn try_from(booking: ExternalBooking) -> std::result::Result<Self, String> {
        let id = value_to_id(&booking.id);
        let check_in = parse_date(&booking.arrival)
            .ok_or_else(|| format!("booking {}: unparseable arrival {:?}", id, booking.arrival))?;
        let check_out = parse_date(&booking.departure).ok_or_else(|| {
            format!("booking {}: unparseable departure {:?}", id, booking.departure)
        })?;

        let guest_name = booking.guest_name.unwrap_or_else(|| {
            [booking.first_name, booking.last_name]
                .into_iter()
                .flatten()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        });

        let status = match booking.status {
            Some(Value::String(s)) => ReservationStatus::parse(&s),
            Some(Value::Number(n)) => ReservationStatus::parse(&n.to_string()),
            _ => ReservationStatus::Confirmed,
        };

        Ok(Reservation {
            id,
            guest_name,
            room: value_to_id(&booking.room_id),
            check_in,
            check_out,
            status,
            amount: booking.price.unwrap_or(0.0),
            channel_code: booking.channel.or(booking.referer),
        })
    }
}

impl TryFrom<ExternalTask> for HousekeepingTask {
    type Error = String;

    fn try_from(task: ExternalTask) -> std::result::Result<Self, String> {
        let id = value_to_id(&task.id);
        let date = parse_date(&task.date)
            .ok_or_else(|| format!("task {}: unparseable date {:?}", id, task.date))?;

        Ok(HousekeepingTask {
            id,
            room: value_to_id(&task.room_id),
            date,
            task_type: task.task_type.as_deref().map_or(TaskType::Other, TaskType::parse),
            status: task.status.as_deref().map_or(TaskStatus::Pending, TaskStatus::parse),
            notes: task.notes.filter(|n| !n.trim().is_empty()),
        })
    }
}

/// Fetches bookings and tasks for a set of rooms.
#[derive(Debug, Clone)]
pub struct ReservationFetcher {
    proxy: ProxyClient,
}

impl ReservationFetcher {
    pub fn new(proxy: ProxyClient) -> Self {
        Self { proxy }
    }

    pub fn proxy(&self) -> &ProxyClient {
        &self.proxy
    }

    /// Reservations on any of `rooms`. The upstream is asked by external
    /// code; records naming a room by its display name are kept too.
    pub async fn reservations(
        &self,
        session: Option<&Session>,
        rooms: &[Room],
    ) -> Result<Vec<Reservation>> {
        let data = self
            .proxy
            .call(
                session,
                actions::GET_RESERVATIONS,
                json!({ "roomIds": room_codes(rooms) }),
            )
            .await?;

        let reservations = map_records::<ExternalBooking, Reservation>(data, "reservations");
        Ok(retain_rooms(reservations, rooms, |r| r.room.as_str()))
    }

    /// Housekeeping tasks on any of `rooms` between `from` and `to`, inclusive.
    pub async fn tasks(
        &self,
        session: Option<&Session>,
        rooms: &[Room],
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<HousekeepingTask>> {
        let data = self
            .proxy
            .call(
                session,
                actions::GET_TASKS,
                json!({
                    "roomIds": room_codes(rooms),
                    "from": from.to_string(),
                    "to": to.to_string(),
                }),
            )
            .await?;

        let tasks = map_records::<ExternalTask, HousekeepingTask>(data, "tasks");
        let tasks = retain_rooms(tasks, rooms, |t| t.room.as_str());
        Ok(tasks
            .into_iter()
            .filter(|t| from <= t.date && t.date <= to)
            .collect())
    }

    /// Reservations and tasks for one month, fetched concurrently.
    pub async fn month(
        &self,
        session: Option<&Session>,
        rooms: &[Room],
        month: Month,
    ) -> Result<MonthData> {
        let (reservations, tasks) = tokio::try_join!(
            self.reservations(session, rooms),
            self.tasks(session, rooms, month.first_day(), month.last_day()),
        )?;

        info!(
            %month,
            rooms = rooms.len(),
            reservations = reservations.len(),
            tasks = tasks.len(),
            "Fetched month data"
        );

        Ok(MonthData {
            reservations,
            tasks,
        })
    }
}

/// Map a proxy `data` array record by record. Anything that does not fit is
/// logged and dropped.
fn map_records<E, T>(data: Option<Value>, what: &str) -> Vec<T>
where
    E: for<'de> Deserialize<'de>,
    T: TryFrom<E, Error = String>,
{
    let records = match data {
        Some(Value::Array(records)) => records,
        Some(other) => {
            warn!(what, kind = json_kind(&other), "Expected an array from the proxy");
            return Vec::new();
        }
        None => {
            warn!(what, "Proxy response carried no data");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .filter_map(|record| {
            let external: E = match serde_json::from_value(record) {
                Ok(external) => external,
                Err(e) => {
                    warn!(what, error = %e, "Skipping malformed record");
                    return None;
                }
            };
            match T::try_from(external) {
                Ok(mapped) => Some(mapped),
                Err(reason) => {
                    warn!(what, %reason, "Skipping record");
                    None
                }
            }
        })
        .collect()
}

fn room_codes(rooms: &[Room]) -> Vec<&str> {
    rooms.iter().map(|r| r.external_code.as_str()).collect()
}

fn retain_rooms<T>(items: Vec<T>, rooms: &[Room], room_of: impl Fn(&T) -> &str) -> Vec<T> {
    let before = items.len();
    let kept: Vec<T> = items
        .into_iter()
        .filter(|item| rooms.iter().any(|room| room.matches(room_of(item))))
        .collect();

    if kept.len() != before {
        warn!(
            dropped = before - kept.len(),
            "Upstream returned records for rooms that were not requested"
        );
    }
    kept
}

/// Accepts `YYYY-MM-DD`, optionally followed by a time part.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

fn value_to_id(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn booking(value: Value) -> ExternalBooking {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_booking_mapping() {
        let reservation = Reservation::try_from(booking(json!({
            "id": 98123,
            "roomId": 4411,
            "arrival": "2025-04-07",
            "departure": "2025-04-10",
            "firstName": "Camille",
            "lastName": "Durand",
            "status": "confirmed",
            "price": 412.5,
            "referer": "Booking.com"
        })))
        .unwrap();

        assert_eq!(reservation.id, "98123");
        assert_eq!(reservation.room, "4411");
        assert_eq!(reservation.guest_name, "Camille Durand");
        assert_eq!(reservation.nights(), 3);
        assert_eq!(reservation.amount, 412.5);
        assert_eq!(reservation.channel(), crate::Channel::Booking);
    }

    #[test]
    fn test_booking_with_bad_date_is_rejected() {
        let result = Reservation::try_from(booking(json!({
            "id": "b1",
            "roomId": "r1",
            "arrival": "07/04/2025",
            "departure": "2025-04-10"
        })));
        assert!(result.is_err());
    }

    #[test]
    fn test_datetime_strings_accepted() {
        assert_eq!(
            parse_date("2025-04-07T15:00:00Z"),
            NaiveDate::from_ymd_opt(2025, 4, 7)
        );
        assert_eq!(parse_date("not a date"), None);
    }

    #[test]
    fn test_map_records_skips_bad_entries() {
        let data = json!([
            { "id": 1, "roomId": 7, "arrival": "2025-04-01", "departure": "2025-04-03" },
            { "id": 2, "roomId": 7, "arrival": "nope", "departure": "2025-04-03" },
            { "unexpected": true }
        ]);
        let mapped = map_records::<ExternalBooking, Reservation>(Some(data), "reservations");
        assert_eq!(mapped.len(), 1);
        assert_eq!(mapped[0].id, "1");
    }

    #[test]
    fn test_map_records_non_array_is_empty() {
        let mapped =
            map_records::<ExternalBooking, Reservation>(Some(json!({ "oops": 1 })), "reservations");
        assert!(mapped.is_empty());
        assert!(map_records::<ExternalTask, HousekeepingTask>(None, "tasks").is_empty());
    }

    #[test]
    fn test_retain_rooms_accepts_code_or_name() {
        let loft = Room {
            id: uuid::Uuid::new_v4(),
            user_id: uuid::Uuid::new_v4(),
            external_code: "A1".to_string(),
            name: "Loft".to_string(),
            created_at: chrono::Utc::now(),
        };
        let refs = vec!["A1".to_string(), "Loft".to_string(), "B2".to_string()];

        let kept = retain_rooms(refs, std::slice::from_ref(&loft), |r| r.as_str());
        assert_eq!(kept, vec!["A1", "Loft"]);
        assert_eq!(room_codes(&[loft]), vec!["A1"]);
    }

    #[test]
    fn test_task_mapping_defaults() {
        let task = HousekeepingTask::try_from(
            serde_json::from_value::<ExternalTask>(json!({
                "id": "t1",
                "roomId": 7,
                "date": "2025-04-10",
                "notes": "  "
            }))
            .unwrap(),
        )
        .unwrap();
        assert_eq!(task.task_type, TaskType::Other);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.notes, None);
        assert_eq!(task.room, "7");
    }
}
