// src/application/services/token_parser.rs
use crate::application::{
    dto::{JwtInfo, JwtToken, TokenResponse},
    error::{ApplicationError, ApplicationResult},
    ports::{database::Database, security::JwtCodec, time::Clock},
};
use std::sync::Arc;

/// Verifies RS256 tokens against the current signing key.
pub struct TokenParser {
    database: Arc<dyn Database>,
    jwt_codec: Arc<dyn JwtCodec>,
    clock: Arc<dyn Clock>,
}

impl TokenParser {
    pub fn new(
        database: Arc<dyn Database>,
        jwt_codec: Arc<dyn JwtCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            database,
            jwt_codec,
            clock,
        }
    }

    /// `Ok(None)` for an empty token. With `with_expiration_check`, `exp`
    /// must be present and in the future and `nbf`, when present, must not
    /// be in the future. Without it only the signature is checked.
    pub async fn decode_and_validate_token_string(
        &self,
        token: &str,
        public_key_pem: Option<&str>,
        with_expiration_check: bool,
    ) -> ApplicationResult<Option<JwtToken>> {
        if token.is_empty() {
            return Ok(None);
        }

        let fetched;
        let pem = match public_key_pem {
            Some(pem) => pem,
            None => {
                fetched = self.current_public_key().await?;
                fetched.as_str()
            }
        };

        let claims = self.jwt_codec.verify(token, pem)?;
        let parsed = JwtToken::new(token, claims);

        if with_expiration_check {
            let now = self.clock.now();
            let exp = parsed
                .get_time_claim("exp")
                .ok_or_else(|| ApplicationError::unauthorized("token has no exp claim"))?;
            if now >= exp {
                return Err(ApplicationError::unauthorized("token is expired"));
            }
            if parsed.get_time_claim("nbf").is_some_and(|nbf| now < nbf) {
                return Err(ApplicationError::unauthorized("token is not valid yet"));
            }
        }

        Ok(Some(parsed))
    }

    /// Access and ID tokens are checked for expiry; the refresh token is not.
    pub async fn decode_and_validate_token_response(
        &self,
        token_response: &TokenResponse,
    ) -> ApplicationResult<JwtInfo> {
        let pem = self.current_public_key().await?;

        let access_token = self
            .decode_and_validate_token_string(&token_response.access_token, Some(&pem), true)
            .await?;
        let id_token = self
            .decode_and_validate_token_string(&token_response.id_token, Some(&pem), true)
            .await?;
        let refresh_token = self
            .decode_and_validate_token_string(&token_response.refresh_token, Some(&pem), false)
            .await?;

        Ok(JwtInfo {
            token_response: token_response.clone(),
            access_token,
            id_token,
            refresh_token,
        })
    }

    async fn current_public_key(&self) -> ApplicationResult<String> {
        self.database
            .get_current_signing_key()
            .await?
            .map(|key| key.public_key_pem)
            .ok_or_else(|| ApplicationError::infrastructure("unable to find the current signing key"))
    }
}
