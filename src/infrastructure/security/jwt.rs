// src/infrastructure/security/jwt.rs
use crate::{
    application::{
        error::{ApplicationError, ApplicationResult},
        ports::security::JwtCodec,
    },
    domain::KeyPair,
};
use josekit::{
    jwk::alg::rsa::RsaKeyPair,
    jws::{JwsHeader, RS256},
    jwt::{self, JwtPayload},
};
use serde_json::{Map, Value};

/// RS256 codec over PEM-encoded RSA keys.
#[derive(Default, Clone)]
pub struct JoseJwtCodec;

impl JoseJwtCodec {
    pub fn new() -> Self {
        Self
    }
}

impl JwtCodec for JoseJwtCodec {
    fn sign(&self, claims: &Map<String, Value>, key: &KeyPair) -> ApplicationResult<String> {
        let signer = RS256
            .signer_from_pem(key.private_key_pem.as_bytes())
            .map_err(|err| {
                ApplicationError::infrastructure(format!("unable to parse signing key: {err}"))
            })?;

        let mut header = JwsHeader::new();
        header.set_token_type("JWT");
        header.set_key_id(&key.key_identifier);

        let payload = JwtPayload::from_map(claims.clone()).map_err(|err| {
            ApplicationError::infrastructure(format!("unable to build token payload: {err}"))
        })?;

        jwt::encode_with_signer(&payload, &header, &signer)
            .map_err(|err| ApplicationError::infrastructure(format!("unable to sign token: {err}")))
    }

    fn verify(&self, token: &str, public_key_pem: &str) -> ApplicationResult<Map<String, Value>> {
        let verifier = RS256
            .verifier_from_pem(public_key_pem.as_bytes())
            .map_err(|err| {
                ApplicationError::infrastructure(format!("unable to parse verification key: {err}"))
            })?;

        let (payload, _header) = jwt::decode_with_verifier(token, &verifier)
            .map_err(|err| ApplicationError::unauthorized(format!("invalid token: {err}")))?;

        Ok(payload.claims_set().clone())
    }

    fn public_jwk(&self, key: &KeyPair) -> ApplicationResult<Value> {
        let key_pair = RsaKeyPair::from_pem(key.private_key_pem.as_bytes()).map_err(|err| {
            ApplicationError::infrastructure(format!("unable to parse signing key: {err}"))
        })?;

        let mut jwk = key_pair.to_jwk_public_key();
        jwk.set_key_id(&key.key_identifier);
        jwk.set_algorithm(&key.algorithm);
        jwk.set_key_use("sig");

        Ok(Value::Object(jwk.as_ref().clone()))
    }
}
