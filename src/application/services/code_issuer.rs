// src/application/services/code_issuer.rs
use crate::{
    application::{
        crypto::{generate_secure_random_string, hash_string},
        dto::RequestContext,
        error::{ApplicationError, ApplicationResult},
        ports::{database::Database, time::Clock},
    },
    domain::{Code, scope},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

const CODE_SUFFIX_LENGTH: usize = 96;

#[derive(Debug, Clone)]
pub struct CreateCodeInput {
    pub request: RequestContext,
    pub client_identifier: String,
    pub user_id: i64,
    pub code_challenge: String,
    pub code_challenge_method: String,
    pub redirect_uri: String,
    pub scope: String,
    /// Set when the consent step narrowed the requested scope.
    pub consented_scope: String,
    pub state: String,
    pub nonce: String,
    pub response_mode: String,
    pub acr_level: String,
    pub auth_methods: String,
    pub session_identifier: String,
    pub authenticated_at: DateTime<Utc>,
}

pub struct CodeIssuer {
    database: Arc<dyn Database>,
    clock: Arc<dyn Clock>,
}

impl CodeIssuer {
    pub fn new(database: Arc<dyn Database>, clock: Arc<dyn Clock>) -> Self {
        Self { database, clock }
    }

    /// Persists a fresh code and returns it with the plaintext `code` set.
    pub async fn create_auth_code(&self, input: CreateCodeInput) -> ApplicationResult<Code> {
        let client = self
            .database
            .get_client_by_client_identifier(&input.client_identifier)
            .await?
            .ok_or_else(|| {
                ApplicationError::not_found(format!(
                    "client '{}' does not exist",
                    input.client_identifier
                ))
            })?;

        let response_mode = if input.response_mode.is_empty() {
            "query".to_string()
        } else {
            input.response_mode
        };

        let scope = if input.consented_scope.trim().is_empty() {
            scope::normalize(&input.scope)
        } else {
            scope::normalize(&input.consented_scope)
        };

        let plaintext = format!(
            "{}{}",
            Uuid::new_v4().simple(),
            generate_secure_random_string(CODE_SUFFIX_LENGTH)
        );

        let mut code = Code {
            id: 0,
            code: String::new(),
            code_hash: hash_string(&plaintext),
            client_id: client.id,
            user_id: input.user_id,
            code_challenge: input.code_challenge,
            code_challenge_method: input.code_challenge_method,
            redirect_uri: input.redirect_uri,
            scope,
            state: input.state,
            nonce: input.nonce,
            response_mode,
            ip_address: input.request.ip_address,
            user_agent: input.request.user_agent,
            authenticated_at: input.authenticated_at,
            acr_level: input.acr_level,
            auth_methods: input.auth_methods,
            session_identifier: input.session_identifier,
            used: false,
            created_at: self.clock.now(),
            client: None,
            user: None,
        };

        self.database.create_code(&mut code).await?;
        debug!(code_id = code.id, client_id = %client.client_identifier, "authorization code created");

        code.code = plaintext;
        Ok(code)
    }
}
