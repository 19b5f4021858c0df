//! Client for the serverless proxy fronting the channel manager and the
//! spreadsheet API.
//!
//! Every call is a `POST {action, ...params}` carrying the user's bearer
//! token. The proxy answers `{data: ...}` on success and `{error: ...}` with
//! a non-2xx status on failure.

use std::time::Duration;

use chrono::Utc;
use reqwest::Client as HttpClient;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{debug, warn};

use crate::auth::Session;
use crate::{Error, Result};

/// Actions understood by the proxy.
pub mod actions {
    pub const GET_RESERVATIONS: &str = "get_reservations";
    pub const GET_TASKS: &str = "get_tasks";
    pub const SHEETS_READ: &str = "sheets_read";
    pub const SHEETS_WRITE: &str = "sheets_write";
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Value,
}

/// HTTP client for the proxy function.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    http: HttpClient,
    url: String,
}

impl ProxyClient {
    /// Create a new proxy client.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
        })
    }

    /// Invoke an action and return its `data` payload.
    ///
    /// `Ok(None)` means the proxy answered successfully but without a usable
    /// `data` field.
    pub async fn call(
        &self,
        session: Option<&Session>,
        action: &str,
        params: Value,
    ) -> Result<Option<Value>> {
        let session =
            session.ok_or_else(|| Error::Auth("No active session".to_string()))?;
        session.ensure_active(Utc::now())?;

        let body = request_body(action, params)?;
        debug!(action, "Calling proxy");

        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&session.access_token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
                message: upstream_message(&text),
            });
        }

        match serde_json::from_str::<Envelope>(&text) {
            Ok(envelope) => Ok(envelope.data),
            Err(e) => {
                warn!(action, error = %e, "Proxy returned a malformed body");
                Ok(None)
            }
        }
    }

    /// Read a row range from the spreadsheet.
    pub async fn read_rows(
        &self,
        session: Option<&Session>,
        range: &str,
    ) -> Result<Vec<Vec<String>>> {
        let data = self
            .call(session, actions::SHEETS_READ, json!({ "range": range }))
            .await?;

        let rows = data
            .as_ref()
            .and_then(|d| d.get("values").or(Some(d)))
            .and_then(Value::as_array);

        let Some(rows) = rows else {
            warn!(range, "Spreadsheet read returned no rows array");
            return Ok(Vec::new());
        };

        Ok(rows
            .iter()
            .map(|row| {
                row.as_array()
                    .map(|cells| cells.iter().map(cell_to_string).collect())
                    .unwrap_or_default()
            })
            .collect())
    }

    /// Overwrite a row range in the spreadsheet.
    pub async fn write_rows(
        &self,
        session: Option<&Session>,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<()> {
        self.call(
            session,
            actions::SHEETS_WRITE,
            json!({ "range": range, "values": rows }),
        )
        .await?;
        Ok(())
    }
}

fn request_body(action: &str, params: Value) -> Result<Value> {
    let mut body = match params {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            return Err(Error::Internal(format!(
                "Proxy params must be an object, got {}",
                other
            )))
        }
    };
    body.insert("action".to_string(), Value::String(action.to_string()));
    Ok(Value::Object(body))
}

/// Pull the upstream error out of a failure body, falling back to the raw
/// text when it is not the expected envelope.
fn upstream_message(body: &str) -> String {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error: Value::String(message),
        }) => message,
        Ok(ErrorEnvelope { error }) => error.to_string(),
        Err(_) if body.trim().is_empty() => "empty response".to_string(),
        Err(_) => body.trim().to_string(),
    }
}

fn cell_to_string(cell: &Value) -> String {
    match cell {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
