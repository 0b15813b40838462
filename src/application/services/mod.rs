// src/application/services/mod.rs
use std::sync::Arc;

use crate::application::{
    ApplicationResult,
    ports::{database::Database, security::JwtCodec, time::Clock},
};
use crate::domain::Settings;

pub mod authorize_validator;
pub mod code_issuer;
pub mod permission_checker;
pub mod token_issuer;
pub mod token_parser;
pub mod user_session_manager;

pub use authorize_validator::{AuthorizeValidator, ValidateRequestInput};
pub use code_issuer::{CodeIssuer, CreateCodeInput};
pub use permission_checker::PermissionChecker;
pub use token_issuer::{GenerateTokenForRefreshInput, TokenIssuer};
pub use token_parser::TokenParser;
pub use user_session_manager::{StartUserSessionInput, UserSessionManager};

/// The token and session services wired over one set of ports.
pub struct AuthServices {
    pub authorize_validator: Arc<AuthorizeValidator>,
    pub code_issuer: Arc<CodeIssuer>,
    pub token_issuer: Arc<TokenIssuer>,
    pub token_parser: Arc<TokenParser>,
    pub user_sessions: Arc<UserSessionManager>,
    pub permission_checker: Arc<PermissionChecker>,
    database: Arc<dyn Database>,
    jwt_codec: Arc<dyn JwtCodec>,
}

impl AuthServices {
    pub fn new(
        database: Arc<dyn Database>,
        jwt_codec: Arc<dyn JwtCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            authorize_validator: Arc::new(AuthorizeValidator::new(Arc::clone(&database))),
            code_issuer: Arc::new(CodeIssuer::new(Arc::clone(&database), Arc::clone(&clock))),
            token_issuer: Arc::new(TokenIssuer::new(
                Arc::clone(&database),
                Arc::clone(&jwt_codec),
                Arc::clone(&clock),
            )),
            token_parser: Arc::new(TokenParser::new(
                Arc::clone(&database),
                Arc::clone(&jwt_codec),
                Arc::clone(&clock),
            )),
            user_sessions: Arc::new(UserSessionManager::new(Arc::clone(&database), clock)),
            permission_checker: Arc::new(PermissionChecker::new(Arc::clone(&database))),
            database,
            jwt_codec,
        }
    }

    pub fn database(&self) -> Arc<dyn Database> {
        Arc::clone(&self.database)
    }

    pub fn jwt_codec(&self) -> Arc<dyn JwtCodec> {
        Arc::clone(&self.jwt_codec)
    }

    /// Settings are read per operation, never cached.
    pub async fn settings(&self) -> ApplicationResult<Settings> {
        self.database.get_settings().await
    }
}
