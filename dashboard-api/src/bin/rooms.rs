//! Rooms Lambda - room configuration CRUD.
//!
//! Endpoints:
//! - GET /rooms - List the caller's rooms
//! - POST /rooms - Create a room
//! - DELETE /rooms/{id} - Delete a room

use std::sync::Arc;

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde_json::json;
use uuid::Uuid;

use dashboard_api::{init_tracing, require_session, AppState};
use shared::http::{error_response, from_error, json_response, route_path};
use shared::{parse_body, ApiResponse, NewRoom};

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let session = match require_session(&event) {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };
    let user_id = session.user.user_id;

    let method = event.method().as_str();
    let path = route_path(&event);

    match (method, path) {
        ("GET", "/rooms") => match state.rooms.list(user_id).await {
            Ok(rooms) => json_response(200, &ApiResponse::success(rooms)),
            Err(e) => from_error(&e),
        },

        ("POST", "/rooms") => {
            let request: NewRoom = parse_body!(event.body());
            match state.rooms.create(user_id, request).await {
                Ok(room) => json_response(201, &ApiResponse::success(room)),
                Err(e) => from_error(&e),
            }
        }

        ("DELETE", _) if path.starts_with("/rooms/") => {
            let room_id = path.trim_start_matches("/rooms/");
            let Ok(room_uuid) = Uuid::parse_str(room_id) else {
                return error_response(400, "Invalid room ID");
            };

            match state.rooms.delete(user_id, room_uuid).await {
                Ok(()) => json_response(
                    200,
                    &ApiResponse::success(json!({
                        "message": "Room deleted",
                        "roomId": room_id,
                    })),
                ),
                Err(e) => from_error(&e),
            }
        }

        _ => error_response(404, "Not found"),
    }
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
