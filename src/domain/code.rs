// src/domain/code.rs
use crate::domain::{client::Client, user::User};
use chrono::{DateTime, Utc};

/// One-time authorization grant.
///
/// Only `code_hash` is persisted; `code` holds the plaintext value just long
/// enough to be placed in the authorize redirect. Redemption is single-use:
/// the caller flips `used` before tokens are issued.
#[derive(Debug, Clone)]
pub struct Code {
    pub id: i64,
    pub code: String,
    pub code_hash: String,
    pub client_id: i64,
    pub user_id: i64,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub redirect_uri: String,
    pub scope: String,
    pub state: String,
    pub nonce: String,
    pub response_mode: String,
    pub ip_address: String,
    pub user_agent: String,
    pub authenticated_at: DateTime<Utc>,
    pub acr_level: String,
    pub auth_methods: String,
    pub session_identifier: String,
    pub used: bool,
    pub created_at: DateTime<Utc>,
    pub client: Option<Client>,
    pub user: Option<User>,
}

impl Code {
    /// Authentication methods as individual `amr` values.
    pub fn auth_methods_list(&self) -> Vec<String> {
        self.auth_methods
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }
}
