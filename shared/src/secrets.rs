//! AWS Secrets Manager access with an in-process cache.
//!
//! A Lambda container lives across many invocations; the cache keeps the
//! database credentials from being fetched on each one.

use std::collections::HashMap;

use aws_sdk_secretsmanager::Client as SecretsClient;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::debug;

use crate::{Error, Result};

/// Database credentials as stored in Secrets Manager.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseCredentials {
    pub username: String,
    pub password: String,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub dbname: Option<String>,
}

pub struct SecretCache {
    client: SecretsClient,
    entries: RwLock<HashMap<String, String>>,
}

impl SecretCache {
    pub fn new(client: SecretsClient) -> Self {
        Self {
            client,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Secret string for `secret_id`, fetched once per container.
    pub async fn get(&self, secret_id: &str) -> Result<String> {
        if let Some(value) = self.entries.read().await.get(secret_id) {
            return Ok(value.clone());
        }

        debug!(secret_id, "Fetching secret");
        let response = self
            .client
            .get_secret_value()
            .secret_id(secret_id)
            .send()
            .await
            .map_err(|e| Error::Aws(format!("Failed to get secret: {}", e)))?;

        let value = response
            .secret_string()
            .ok_or_else(|| Error::Aws("Secret has no string value".to_string()))?
            .to_string();

        self.entries
            .write()
            .await
            .insert(secret_id.to_string(), value.clone());
        Ok(value)
    }

    pub async fn database_credentials(&self, secret_id: &str) -> Result<DatabaseCredentials> {
        let raw = self.get(secret_id).await?;
        parse_credentials(&raw)
    }
}

fn parse_credentials(raw: &str) -> Result<DatabaseCredentials> {
    serde_json::from_str(raw)
        .map_err(|e| Error::Aws(format!("Failed to parse database credentials: {}", e)))
}
