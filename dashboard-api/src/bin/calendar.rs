//! Calendar Lambda - booking calendar and finance views.
//!
//! Endpoints:
//! - GET /calendar?month=YYYY-MM&rooms=a,b - Month grid for the user's rooms
//! - GET /calendar/summary?from=YYYY-MM-DD&to=YYYY-MM-DD - Day-by-day event list
//! - GET /finance?month=YYYY-MM - Monthly financial report
//! - POST /finance/export?month=YYYY-MM - Write the report to the spreadsheet

use std::sync::Arc;

use chrono::{Days, NaiveDate, Utc};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde_json::json;
use tracing::info;

use dashboard_api::{init_tracing, require_session, AppState};
use shared::calendar::events_between;
use shared::http::{error_response, from_error, json_response, query_param, route_path};
use shared::{ApiResponse, CalendarView, FinanceReport, Month, Room, Session};

/// Summary window when the caller does not give one.
const DEFAULT_SUMMARY_DAYS: u64 = 7;

/// Longest summary window accepted, in days.
const MAX_SUMMARY_DAYS: i64 = 62;

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let session = match require_session(&event) {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };

    match route(&state, &session, &event).await {
        Ok(response) => Ok(response),
        Err(e) => from_error(&e),
    }
}

async fn route(
    state: &AppState,
    session: &Session,
    event: &Request,
) -> shared::Result<Response<Body>> {
    let method = event.method().as_str();
    let path = route_path(event);

    let rooms = selected_rooms(state, session, event).await?;

    match (method, path) {
        ("GET", "/calendar") => {
            let month = month_param(event)?;
            let data = state.fetcher.month(Some(session), &rooms, month).await?;
            let view = CalendarView::build(month, data);

            info!(%month, bars = view.grid.bars.len(), "Calendar built");
            respond(200, &ApiResponse::success(view))
        }

        ("GET", "/calendar/summary") => {
            let today = Utc::now().date_naive();
            let from = date_param(event, "from")?.unwrap_or(today);
            let to = match date_param(event, "to")? {
                Some(to) => to,
                None => from
                    .checked_add_days(Days::new(DEFAULT_SUMMARY_DAYS - 1))
                    .unwrap_or(from),
            };
            check_summary_window(from, to)?;

            let (reservations, tasks) = tokio::try_join!(
                state.fetcher.reservations(Some(session), &rooms),
                state.fetcher.tasks(Some(session), &rooms, from, to),
            )?;

            let days: Vec<_> = events_between(from, to, &rooms, &reservations, &tasks)
                .into_iter()
                .map(|(date, events)| json!({ "date": date, "events": events }))
                .collect();

            respond(
                200,
                &ApiResponse::success(json!({ "from": from, "to": to, "days": days })),
            )
        }

        ("GET", "/finance") => {
            let report = finance_report(state, session, event, &rooms).await?;
            respond(200, &ApiResponse::success(report))
        }

        ("POST", "/finance/export") => {
            let report = finance_report(state, session, event, &rooms).await?;
            let rows = report.to_rows();
            state
                .fetcher
                .proxy()
                .write_rows(Some(session), &state.config.finance_sheet_range, &rows)
                .await?;

            info!(month = %report.month, rows = rows.len(), "Finance report exported");
            respond(
                200,
                &ApiResponse::success(json!({
                    "month": report.month,
                    "range": state.config.finance_sheet_range,
                    "rows": rows.len(),
                })),
            )
        }

        _ => error_response(404, "Not found").map_err(internal),
    }
}

/// The user's rooms, optionally narrowed by `?rooms=code1,code2`.
async fn selected_rooms(
    state: &AppState,
    session: &Session,
    event: &Request,
) -> shared::Result<Vec<Room>> {
    let rooms = state.rooms.list(session.user.user_id).await?;

    let Some(filter) = query_param(event, "rooms") else {
        return Ok(rooms);
    };
    let wanted: Vec<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    Ok(rooms
        .into_iter()
        .filter(|room| wanted.iter().any(|code| room.matches(code)))
        .collect())
}

async fn finance_report(
    state: &AppState,
    session: &Session,
    event: &Request,
    rooms: &[Room],
) -> shared::Result<FinanceReport> {
    let month = month_param(event)?;
    let reservations = state.fetcher.reservations(Some(session), rooms).await?;
    Ok(FinanceReport::build(month, rooms, &reservations))
}

fn month_param(event: &Request) -> shared::Result<Month> {
    match query_param(event, "month") {
        Some(raw) => raw.parse(),
        None => Ok(Month::containing(Utc::now().date_naive())),
    }
}

fn date_param(event: &Request, name: &str) -> shared::Result<Option<NaiveDate>> {
    query_param(event, name)
        .map(|raw| {
            raw.parse::<NaiveDate>().map_err(|_| {
                shared::Error::Validation(format!("Invalid `{}` date {:?}", name, raw))
            })
        })
        .transpose()
}

fn check_summary_window(from: NaiveDate, to: NaiveDate) -> shared::Result<()> {
    if to < from {
        return Err(shared::Error::Validation(
            "`to` must not be before `from`".to_string(),
        ));
    }
    let days = (to - from).num_days() + 1;
    if days > MAX_SUMMARY_DAYS {
        return Err(shared::Error::Validation(format!(
            "Summary window of {} days exceeds the {} day limit",
            days, MAX_SUMMARY_DAYS
        )));
    }
    Ok(())
}

fn respond<T: serde::Serialize>(status: u16, body: &T) -> shared::Result<Response<Body>> {
    json_response(status, body).map_err(internal)
}

fn internal(e: Error) -> shared::Error {
    shared::Error::Internal(e.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move { handler(state, event).await }
    }))
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_summary_window_limits() {
        assert!(check_summary_window(date("2025-04-01"), date("2025-04-01")).is_ok());
        // 62 days inclusive
        assert!(check_summary_window(date("2025-04-01"), date("2025-06-01")).is_ok());

        let too_long = check_summary_window(date("2025-04-01"), date("2025-06-02")).unwrap_err();
        assert!(matches!(too_long, shared::Error::Validation(_)));

        let decades = check_summary_window(date("2000-01-01"), date("2040-01-01")).unwrap_err();
        assert_eq!(decades.status_code(), 400);

        let reversed = check_summary_window(date("2025-04-10"), date("2025-04-01")).unwrap_err();
        assert!(matches!(reversed, shared::Error::Validation(_)));
    }
}
