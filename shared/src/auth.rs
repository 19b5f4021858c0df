//! Session handling for the hosted auth backend.
//!
//! The API gateway validates signatures before a request reaches us, so the
//! bearer token is only decoded here to recover the user and its expiry.
//! The same token is forwarded to the proxy, which performs its own checks.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Role carried by signed-in users. Anonymous and service tokens are refused.
pub const AUTHENTICATED_ROLE: &str = "authenticated";

/// JWT claims issued by the hosted auth backend.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user id)
    pub sub: String,
    /// Email
    pub email: Option<String>,
    /// Backend role (`authenticated`, `anon`, ...)
    #[serde(default)]
    pub role: Option<String>,
    /// Issued at
    #[serde(default)]
    pub iat: i64,
    /// Expiration
    pub exp: i64,
}

/// Decoded user information from JWT.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub role: Option<String>,
}

impl TryFrom<SessionClaims> for AuthenticatedUser {
    type Error = Error;

    fn try_from(claims: SessionClaims) -> Result<Self> {
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|e| Error::Auth(format!("Invalid sub claim: {}", e)))?;

        Ok(Self {
            user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// An authenticated session: the raw bearer token plus who it belongs to.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub user: AuthenticatedUser,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Build a session from an `Authorization` header value.
    pub fn from_bearer(header: &str, now: DateTime<Utc>) -> Result<Self> {
        let token = header.strip_prefix("Bearer ").unwrap_or(header).trim();
        if token.is_empty() {
            return Err(Error::Auth("Missing bearer token".to_string()));
        }

        let claims = decode_claims(token)?;
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| Error::Auth("Invalid exp claim".to_string()))?;

        let session = Self {
            access_token: token.to_string(),
            user: AuthenticatedUser::try_from(claims)?,
            expires_at,
        };
        session.ensure_active(now)?;
        session.ensure_authenticated_role()?;
        Ok(session)
    }

    /// Fail with an authentication error once the session has expired.
    pub fn ensure_active(&self, now: DateTime<Utc>) -> Result<()> {
        if self.expires_at <= now {
            return Err(Error::Auth("Session expired".to_string()));
        }
        Ok(())
    }

    /// Fail with an authorization error unless the token belongs to a
    /// signed-in user.
    pub fn ensure_authenticated_role(&self) -> Result<()> {
        match self.user.role.as_deref() {
            Some(AUTHENTICATED_ROLE) => Ok(()),
            other => Err(Error::Unauthorized(format!(
                "Role {:?} may not use the dashboard",
                other.unwrap_or("none")
            ))),
        }
    }
}

/// Decode a JWT without verifying its signature.
pub fn decode_claims(token: &str) -> Result<SessionClaims> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    // Expiry is checked against an injectable clock in `Session`.
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    let key = DecodingKey::from_secret(b"unused");

    decode::<SessionClaims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| Error::Auth(format!("Failed to decode token: {}", e)))
}
