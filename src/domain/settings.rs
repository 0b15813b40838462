// src/domain/settings.rs
use crate::domain::client::Client;

/// Global authorization-server settings, read fresh for each operation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_name: String,
    pub issuer: String,
    pub token_expiration_in_seconds: i64,
    pub refresh_token_offline_idle_timeout_in_seconds: i64,
    pub refresh_token_offline_max_lifetime_in_seconds: i64,
    pub user_session_idle_timeout_in_seconds: i64,
    pub user_session_max_lifetime_in_seconds: i64,
    pub include_open_id_connect_claims_in_access_token: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "authserver".into(),
            issuer: "http://localhost:9090".into(),
            token_expiration_in_seconds: 300,
            refresh_token_offline_idle_timeout_in_seconds: 2_592_000,
            refresh_token_offline_max_lifetime_in_seconds: 5_184_000,
            user_session_idle_timeout_in_seconds: 7200,
            user_session_max_lifetime_in_seconds: 86_400,
            include_open_id_connect_claims_in_access_token: false,
        }
    }
}

fn client_override(client_value: i64, global: i64) -> i64 {
    if client_value > 0 { client_value } else { global }
}

impl Settings {
    pub fn token_expiration_for(&self, client: &Client) -> i64 {
        client_override(client.token_expiration_in_seconds, self.token_expiration_in_seconds)
    }

    pub fn offline_idle_timeout_for(&self, client: &Client) -> i64 {
        client_override(
            client.refresh_token_offline_idle_timeout_in_seconds,
            self.refresh_token_offline_idle_timeout_in_seconds,
        )
    }

    pub fn offline_max_lifetime_for(&self, client: &Client) -> i64 {
        client_override(
            client.refresh_token_offline_max_lifetime_in_seconds,
            self.refresh_token_offline_max_lifetime_in_seconds,
        )
    }

    pub fn include_oidc_claims_in_access_token_for(&self, client: &Client) -> bool {
        client
            .include_open_id_connect_claims_in_access_token
            .resolve(self.include_open_id_connect_claims_in_access_token)
    }
}
