//! Shared data models.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::channel::Channel;

/// Booking state as reported by the channel manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    Confirmed,
    New,
    Request,
    Cancelled,
    /// Owner block: the room is unavailable but nobody pays for it.
    Black,
    Unknown,
}

impl ReservationStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "confirmed" | "1" => Self::Confirmed,
            "new" | "2" => Self::New,
            "request" | "3" => Self::Request,
            "cancelled" | "canceled" | "0" => Self::Cancelled,
            "black" | "blocked" | "4" => Self::Black,
            _ => Self::Unknown,
        }
    }

    /// Whether the stay occupies its nights.
    pub fn occupies(self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

/// A booking mirrored from the channel manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: String,
    pub guest_name: String,
    /// External room code
    pub room: String,
    pub check_in: NaiveDate,
    /// First night not occupied
    pub check_out: NaiveDate,
    pub status: ReservationStatus,
    pub amount: f64,
    pub channel_code: Option<String>,
}

impl Reservation {
    /// Whole nights between check-in and check-out. Zero or negative for
    /// degenerate records.
    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn is_valid(&self) -> bool {
        self.nights() > 0
    }

    pub fn channel(&self) -> Channel {
        Channel::from_code(self.channel_code.as_deref())
    }

    /// Whether the night of `date` belongs to this stay.
    pub fn occupies_night(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date < self.check_out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Cleaning,
    Checkin,
    Checkout,
    Maintenance,
    Inspection,
    Other,
}

impl TaskType {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "cleaning" | "menage" | "ménage" => Self::Cleaning,
            "checkin" | "check-in" | "check_in" => Self::Checkin,
            "checkout" | "check-out" | "check_out" => Self::Checkout,
            "maintenance" | "repair" => Self::Maintenance,
            "inspection" => Self::Inspection,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Done,
    Cancelled,
}

impl TaskStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "in_progress" | "in-progress" | "started" => Self::InProgress,
            "done" | "completed" | "complete" => Self::Done,
            "cancelled" | "canceled" => Self::Cancelled,
            _ => Self::Pending,
        }
    }
}

/// Housekeeping work scheduled on a room for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HousekeepingTask {
    pub id: String,
    pub room: String,
    pub date: NaiveDate,
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub notes: Option<String>,
}

/// A room configured by a host, pairing the channel manager's code with a
/// display name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: Uuid,
    pub user_id: Uuid,
    pub external_code: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Whether a channel-manager room reference points at this room. The
    /// upstream uses either the external code or the display name.
    pub fn matches(&self, reference: &str) -> bool {
        self.external_code == reference || self.name == reference
    }
}

/// Create room request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewRoom {
    #[validate(length(min = 1, max = 64))]
    pub external_code: String,
    #[validate(length(min = 1, max = 128))]
    pub name: String,
}
