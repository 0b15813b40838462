// src/infrastructure/http_client.rs
use crate::application::{
    ApplicationResult,
    dto::TokenResponse,
    error::ApplicationError,
    ports::token_endpoint::TokenEndpointClient,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Calls `{base_url}/auth/token` with the `refresh_token` grant.
#[derive(Clone)]
pub struct ReqwestTokenEndpointClient {
    client: reqwest::Client,
    token_url: String,
}

impl ReqwestTokenEndpointClient {
    pub fn new(base_url: &str) -> ApplicationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|err| {
                ApplicationError::infrastructure(format!("unable to build http client: {err}"))
            })?;

        Ok(Self {
            client,
            token_url: format!("{}/auth/token", base_url.trim_end_matches('/')),
        })
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }
}

#[async_trait]
impl TokenEndpointClient for ReqwestTokenEndpointClient {
    async fn refresh(
        &self,
        refresh_token: &str,
        client_id: &str,
        client_secret: &str,
    ) -> ApplicationResult<TokenResponse> {
        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ];

        tracing::debug!(token_url = %self.token_url, "refreshing tokens");

        let response = self
            .client
            .post(&self.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|err| {
                ApplicationError::infrastructure(format!("unable to call the token endpoint: {err}"))
            })?;

        let status = response.status();
        if status.is_success() {
            return response.json::<TokenResponse>().await.map_err(|err| {
                ApplicationError::infrastructure(format!("unable to decode token response: {err}"))
            });
        }

        let body = response.text().await.unwrap_or_default();
        let reason = serde_json::from_str::<TokenErrorResponse>(&body)
            .map(|e| e.error_description.unwrap_or(e.error))
            .unwrap_or_else(|_| format!("token endpoint returned {status}"));
        Err(ApplicationError::unauthorized(reason))
    }
}
