//! Configuration management for Lambda functions.

use std::env;
use std::time::Duration;

use crate::{Error, Result};

const DEFAULT_PROXY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_FINANCE_RANGE: &str = "Finance!A1:H";

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// URL of the channel-manager/spreadsheet proxy function
    pub proxy_url: String,
    /// Request timeout for proxy calls
    pub proxy_timeout: Duration,
    /// Database host
    pub db_host: String,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: String,
    /// AWS region
    pub aws_region: String,
    /// Spreadsheet range the finance export writes to
    pub finance_sheet_range: String,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| Error::Config(format!("{} not set", key)))
        };

        let proxy_timeout = match lookup("PROXY_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| Error::Config(format!("Invalid PROXY_TIMEOUT_SECS: {}", e)))?,
            None => DEFAULT_PROXY_TIMEOUT_SECS,
        };

        Ok(Self {
            proxy_url: required("PROXY_URL")?,
            proxy_timeout: Duration::from_secs(proxy_timeout),
            db_host: required("DATABASE_HOST")?,
            db_name: lookup("DATABASE_NAME").unwrap_or_else(|| "stayboard".to_string()),
            db_secret_arn: required("DATABASE_URL_SECRET_ARN")?,
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "eu-west-3".to_string()),
            finance_sheet_range: lookup("FINANCE_SHEET_RANGE")
                .unwrap_or_else(|| DEFAULT_FINANCE_RANGE.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&[
            ("PROXY_URL", "https://proxy.example.com/functions/v1/channel"),
            ("DATABASE_HOST", "db.example.com"),
            ("DATABASE_URL_SECRET_ARN", "arn:aws:secretsmanager:eu-west-3:1:secret:db"),
        ]))
        .unwrap();

        assert_eq!(config.db_name, "stayboard");
        assert_eq!(config.proxy_timeout, Duration::from_secs(30));
        assert_eq!(config.finance_sheet_range, "Finance!A1:H");
    }

    #[test]
    fn test_missing_proxy_url() {
        let err = Config::from_lookup(lookup_from(&[("DATABASE_HOST", "db")])).unwrap_err();
        assert!(matches!(err, Error::Config(msg) if msg.contains("PROXY_URL")));
    }

    #[test]
    fn test_bad_timeout() {
        let err = Config::from_lookup(lookup_from(&[
            ("PROXY_URL", "https://proxy"),
            ("DATABASE_HOST", "db"),
            ("DATABASE_URL_SECRET_ARN", "arn"),
            ("PROXY_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
