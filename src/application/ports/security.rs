// src/application/ports/security.rs
use crate::{application::ApplicationResult, domain::KeyPair};
use serde_json::{Map, Value};

/// RS256 signing and verification over raw claim maps.
///
/// `verify` checks the signature only; claim validation (`exp`, `nbf`, `iss`)
/// belongs to the caller.
pub trait JwtCodec: Send + Sync {
    fn sign(&self, claims: &Map<String, Value>, key: &KeyPair) -> ApplicationResult<String>;
    fn verify(&self, token: &str, public_key_pem: &str) -> ApplicationResult<Map<String, Value>>;
    /// Public half of `key` as a JWK, carrying `kid`, `alg` and `use`.
    fn public_jwk(&self, key: &KeyPair) -> ApplicationResult<Value>;
}
