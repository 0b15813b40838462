// src/infrastructure/security/keys.rs
use crate::{
    application::error::{ApplicationError, ApplicationResult},
    domain::{KeyPair, KeyState},
};
use chrono::{DateTime, Utc};
use josekit::jwk::alg::rsa::RsaKeyPair;
use uuid::Uuid;

const RSA_BITS: u32 = 2048;

/// Generates a fresh RS256 signing key with a random `kid`.
pub fn generate_rsa_key_pair(state: KeyState, now: DateTime<Utc>) -> ApplicationResult<KeyPair> {
    let key_pair = RsaKeyPair::generate(RSA_BITS).map_err(|err| {
        ApplicationError::infrastructure(format!("unable to generate RSA key: {err}"))
    })?;

    let private_key_pem = String::from_utf8(key_pair.to_pem_private_key()).map_err(|err| {
        ApplicationError::infrastructure(format!("private key is not valid PEM: {err}"))
    })?;
    let public_key_pem = String::from_utf8(key_pair.to_pem_public_key()).map_err(|err| {
        ApplicationError::infrastructure(format!("public key is not valid PEM: {err}"))
    })?;

    Ok(KeyPair {
        id: 0,
        state,
        key_identifier: Uuid::new_v4().to_string(),
        algorithm: "RS256".to_string(),
        private_key_pem,
        public_key_pem,
        created_at: now,
    })
}
