// src/domain/key_pair.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyState {
    /// Signs every token issued right now. Exactly one at a time.
    Current,
    /// Published ahead of rotation so verifiers can cache it.
    Next,
}

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub id: i64,
    pub state: KeyState,
    pub key_identifier: String,
    pub algorithm: String,
    pub private_key_pem: String,
    pub public_key_pem: String,
    pub created_at: DateTime<Utc>,
}
