//! Shared library for Stayboard Lambda functions.
//!
//! Booking calendar reconciliation, the proxy client used to reach the
//! channel manager and the spreadsheet, and the common plumbing (config,
//! auth, errors, database) every function relies on.

pub mod auth;
pub mod calendar;
pub mod channel;
pub mod config;
pub mod db;
pub mod error;
pub mod fetch;
pub mod finance;
pub mod http;
pub mod models;
pub mod proxy;
pub mod rooms;
pub mod secrets;

pub use auth::{AuthenticatedUser, Session, SessionClaims};
pub use calendar::{CalendarView, CalendarViewState, DayEvent, MonthGrid, Month};
pub use channel::{Channel, ChannelStyle};
pub use config::Config;
pub use error::{Error, Result};
pub use fetch::{MonthData, ReservationFetcher};
pub use finance::FinanceReport;
pub use http::ApiResponse;
pub use models::{HousekeepingTask, NewRoom, Reservation, ReservationStatus, Room};
pub use proxy::ProxyClient;
pub use rooms::RoomStore;
pub use secrets::{DatabaseCredentials, SecretCache};
