// src/application/ports/token_endpoint.rs
use crate::application::{ApplicationResult, dto::TokenResponse};
use async_trait::async_trait;

/// Outbound call to the token endpoint, used for silent refresh.
#[async_trait]
pub trait TokenEndpointClient: Send + Sync {
    async fn refresh(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> ApplicationResult<TokenResponse>;
}
