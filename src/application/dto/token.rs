// src/application/dto/token.rs
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

// 9999-12-31T23:59:59Z
const MAX_NUMERIC_DATE: f64 = 253_402_300_799.0;

/// Token endpoint response body, also kept in the cookie session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub id_token: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub refresh_expires_in: i64,
    #[serde(default)]
    pub scope: String,
}

fn is_zero(v: &i64) -> bool {
    *v == 0
}

/// A verified JWT together with its decoded claims.
#[derive(Debug, Clone, PartialEq)]
pub struct JwtToken {
    pub token_base64: String,
    pub claims: Map<String, Value>,
}

impl JwtToken {
    pub fn new(token_base64: impl Into<String>, claims: Map<String, Value>) -> Self {
        Self {
            token_base64: token_base64.into(),
            claims,
        }
    }

    /// String claim value, or empty when absent or not a string.
    pub fn get_string_claim(&self, name: &str) -> String {
        self.claims
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub fn get_bool_claim(&self, name: &str) -> Option<bool> {
        self.claims.get(name).and_then(Value::as_bool)
    }

    /// NumericDate claim (`exp`, `iat`, `nbf`, `auth_time`). Fractional
    /// seconds are dropped; non-finite or out-of-range values yield `None`.
    pub fn get_time_claim(&self, name: &str) -> Option<DateTime<Utc>> {
        let value = self.claims.get(name)?;
        if let Some(seconds) = value.as_i64() {
            return Utc.timestamp_opt(seconds, 0).single();
        }
        let seconds = value
            .as_f64()
            .filter(|f| f.is_finite() && f.abs() <= MAX_NUMERIC_DATE)?
            .trunc();
        #[allow(clippy::cast_possible_truncation)]
        let seconds = seconds as i64;
        Utc.timestamp_opt(seconds, 0).single()
    }

    /// `aud` as a list, whether it was encoded as a string or an array.
    pub fn get_audience(&self) -> Vec<String> {
        match self.claims.get("aud") {
            Some(Value::String(s)) => vec![s.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.get_string_claim("scope")
            .split_whitespace()
            .any(|s| s == scope)
    }
}

/// The parsed tokens of one `TokenResponse`.
#[derive(Debug, Clone, Default)]
pub struct JwtInfo {
    pub token_response: TokenResponse,
    pub access_token: Option<JwtToken>,
    pub id_token: Option<JwtToken>,
    pub refresh_token: Option<JwtToken>,
}

impl JwtInfo {
    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.access_token
            .as_ref()
            .is_some_and(|token| token.has_scope(scope))
    }
}
