//! Common setup for the dashboard API Lambdas.

use chrono::Utc;
use lambda_http::{Body, Request, Response};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shared::http::{authorization, error_response, from_error};
use shared::{Config, ProxyClient, ReservationFetcher, RoomStore, SecretCache, Session};

/// Application state, built once per Lambda container.
pub struct AppState {
    pub config: Config,
    pub rooms: RoomStore,
    pub fetcher: ReservationFetcher,
}

impl AppState {
    pub async fn new() -> Result<Self, lambda_http::Error> {
        let config = Config::from_env()?;

        let aws = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
        let secrets = SecretCache::new(aws_sdk_secretsmanager::Client::new(&aws));
        let creds = secrets.database_credentials(&config.db_secret_arn).await?;
        let pool = shared::db::create_pool(&config, &creds).await?;

        let proxy = ProxyClient::new(config.proxy_url.clone(), config.proxy_timeout)?;

        info!(region = %config.aws_region, "Dashboard state ready");

        Ok(Self {
            rooms: RoomStore::new(pool),
            fetcher: ReservationFetcher::new(proxy),
            config,
        })
    }
}

/// Session of the caller, or the 401 response to send back.
pub fn require_session(event: &Request) -> Result<Session, Response<Body>> {
    let header = authorization(event).unwrap_or_default();
    Session::from_bearer(header, Utc::now()).map_err(|e| match from_error(&e) {
        Ok(response) => response,
        Err(_) => unauthorized(),
    })
}

fn unauthorized() -> Response<Body> {
    error_response(401, "Unauthorized").unwrap_or_else(|_| {
        let mut response = Response::new(Body::Empty);
        *response.status_mut() = lambda_http::http::StatusCode::UNAUTHORIZED;
        response
    })
}

/// JSON logs filtered by `RUST_LOG`.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_bearer_is_401() {
        let request = Request::default();
        let response = require_session(&request).unwrap_err();
        assert_eq!(response.status(), 401);
    }

    #[test]
    fn test_unauthorized_uses_api_envelope() {
        let response = unauthorized();
        assert_eq!(response.status(), 401);
        let Body::Text(body) = response.body() else {
            panic!("expected a text body");
        };
        let value: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(value["success"], false);
        assert_eq!(value["error"], "Unauthorized");
    }
}
