// src/presentation/http/state.rs
use crate::application::{
    ports::{session::SessionStore, token_endpoint::TokenEndpointClient},
    services::AuthServices,
};
use std::sync::Arc;

/// Web-facing identity of this deployment.
#[derive(Clone, Debug)]
pub struct WebConfig {
    pub base_url: String,
    pub issuer: String,
    pub admin_console_client_id: String,
    pub admin_console_client_secret: String,
}

impl WebConfig {
    pub fn authorize_url(&self) -> String {
        format!("{}/auth/authorize", self.base_url)
    }

    pub fn callback_url(&self) -> String {
        format!("{}/auth/callback", self.base_url)
    }
}

#[derive(Clone)]
pub struct HttpState {
    pub services: Arc<AuthServices>,
    pub sessions: Arc<dyn SessionStore>,
    pub token_client: Arc<dyn TokenEndpointClient>,
    pub web: Arc<WebConfig>,
}
