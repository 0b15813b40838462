// src/domain/client.rs
use crate::domain::errors::DomainError;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// Per-client switch that can defer to the global setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreeStateSetting {
    On,
    Off,
    #[default]
    Default,
}

impl ThreeStateSetting {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreeStateSetting::On => "on",
            ThreeStateSetting::Off => "off",
            ThreeStateSetting::Default => "default",
        }
    }

    /// Resolve against the global value: `Default` falls back to it.
    pub fn resolve(self, global: bool) -> bool {
        match self {
            ThreeStateSetting::On => true,
            ThreeStateSetting::Off => false,
            ThreeStateSetting::Default => global,
        }
    }
}

impl fmt::Display for ThreeStateSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThreeStateSetting {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on" => Ok(ThreeStateSetting::On),
            "off" => Ok(ThreeStateSetting::Off),
            "default" => Ok(ThreeStateSetting::Default),
            other => Err(DomainError::Validation(format!(
                "unknown three-state setting '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectUri {
    pub id: i64,
    pub client_id: i64,
    pub uri: String,
}

#[derive(Debug, Clone)]
pub struct Client {
    pub id: i64,
    pub client_identifier: String,
    pub description: String,
    pub enabled: bool,
    pub consent_required: bool,
    pub is_public: bool,
    pub authorization_code_enabled: bool,
    pub client_credentials_enabled: bool,
    /// Zero means "use the global setting".
    pub token_expiration_in_seconds: i64,
    pub refresh_token_offline_idle_timeout_in_seconds: i64,
    pub refresh_token_offline_max_lifetime_in_seconds: i64,
    pub include_open_id_connect_claims_in_access_token: ThreeStateSetting,
    pub redirect_uris: Vec<RedirectUri>,
}

impl Client {
    pub fn new(client_identifier: impl Into<String>) -> Self {
        Self {
            id: 0,
            client_identifier: client_identifier.into(),
            description: String::new(),
            enabled: true,
            consent_required: false,
            is_public: false,
            authorization_code_enabled: true,
            client_credentials_enabled: false,
            token_expiration_in_seconds: 0,
            refresh_token_offline_idle_timeout_in_seconds: 0,
            refresh_token_offline_max_lifetime_in_seconds: 0,
            include_open_id_connect_claims_in_access_token: ThreeStateSetting::Default,
            redirect_uris: Vec::new(),
        }
    }

    /// Exact string match against the registered set.
    pub fn has_redirect_uri(&self, uri: &str) -> bool {
        self.redirect_uris.iter().any(|r| r.uri == uri)
    }
}
