// src/domain/refresh_token.rs
use crate::domain::errors::DomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefreshTokenType {
    /// Requested through `offline_access`; outlives the login session.
    Offline,
    /// Bound to a user session through `sid`.
    Refresh,
}

impl RefreshTokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshTokenType::Offline => "Offline",
            RefreshTokenType::Refresh => "Refresh",
        }
    }
}

impl fmt::Display for RefreshTokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RefreshTokenType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Offline" => Ok(RefreshTokenType::Offline),
            "Refresh" => Ok(RefreshTokenType::Refresh),
            other => Err(DomainError::Validation(format!(
                "unknown refresh token type '{other}'"
            ))),
        }
    }
}

/// Persisted record of an issued refresh token.
///
/// `first_refresh_token_jti` is constant across every rotation of one grant,
/// `previous_refresh_token_jti` names the immediate predecessor, and
/// `max_lifetime` is an absolute cap that rotation never extends.
#[derive(Debug, Clone)]
pub struct RefreshToken {
    pub id: i64,
    pub code_id: i64,
    pub refresh_token_jti: String,
    pub previous_refresh_token_jti: String,
    pub first_refresh_token_jti: String,
    pub session_identifier: String,
    pub refresh_token_type: RefreshTokenType,
    pub scope: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub max_lifetime: DateTime<Utc>,
    pub revoked: bool,
}

impl RefreshToken {
    pub fn is_first_in_chain(&self) -> bool {
        self.previous_refresh_token_jti.is_empty()
            && self.first_refresh_token_jti == self.refresh_token_jti
    }
}
