// src/config.rs
use crate::domain::Settings;
use std::env;
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    listen_addr: String,
    base_url: String,
    issuer: String,
    admin_console_client_id: String,
    admin_console_client_secret: String,
    settings_seed: Settings,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable: {0}")]
    Missing(&'static str),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

fn default_listen_addr() -> String {
    "127.0.0.1:9090".into()
}

fn default_base_url() -> String {
    "http://localhost:9090".into()
}

fn default_admin_console_client_id() -> String {
    "admin-console-client".into()
}

fn parse_i64(key: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(key) {
        Ok(raw) => {
            let value = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| ConfigError::Invalid(format!("{key} must be an integer")))?;
            if value <= 0 {
                return Err(ConfigError::Invalid(format!("{key} must be positive")));
            }
            Ok(value)
        }
        Err(_) => Ok(default),
    }
}

fn parse_bool(key: &'static str) -> bool {
    env::var(key)
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

impl AppConfig {
    /// Build configuration from environment variables. Optional values fall
    /// back to defaults; the admin console secret is required.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Allow dotenv files to populate env vars when present.
        dotenvy::dotenv().ok();

        let listen_addr = env::var("LISTEN_ADDR").unwrap_or_else(|_| default_listen_addr());
        let base_url = env::var("AUTHSERVER_BASE_URL")
            .unwrap_or_else(|_| default_base_url())
            .trim_end_matches('/')
            .to_string();
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(
                "AUTHSERVER_BASE_URL must be an http(s) URL".into(),
            ));
        }
        let issuer = env::var("AUTHSERVER_ISSUER").unwrap_or_else(|_| base_url.clone());

        let admin_console_client_id = env::var("ADMIN_CONSOLE_CLIENT_ID")
            .unwrap_or_else(|_| default_admin_console_client_id());
        let admin_console_client_secret = env::var("ADMIN_CONSOLE_CLIENT_SECRET")
            .map_err(|_| ConfigError::Missing("ADMIN_CONSOLE_CLIENT_SECRET"))?;

        let defaults = Settings::default();
        let settings_seed = Settings {
            app_name: defaults.app_name,
            issuer: issuer.clone(),
            token_expiration_in_seconds: parse_i64(
                "TOKEN_EXPIRATION_SECONDS",
                defaults.token_expiration_in_seconds,
            )?,
            user_session_idle_timeout_in_seconds: parse_i64(
                "USER_SESSION_IDLE_TIMEOUT_SECONDS",
                defaults.user_session_idle_timeout_in_seconds,
            )?,
            user_session_max_lifetime_in_seconds: parse_i64(
                "USER_SESSION_MAX_LIFETIME_SECONDS",
                defaults.user_session_max_lifetime_in_seconds,
            )?,
            refresh_token_offline_idle_timeout_in_seconds: parse_i64(
                "REFRESH_TOKEN_OFFLINE_IDLE_TIMEOUT_SECONDS",
                defaults.refresh_token_offline_idle_timeout_in_seconds,
            )?,
            refresh_token_offline_max_lifetime_in_seconds: parse_i64(
                "REFRESH_TOKEN_OFFLINE_MAX_LIFETIME_SECONDS",
                defaults.refresh_token_offline_max_lifetime_in_seconds,
            )?,
            include_open_id_connect_claims_in_access_token: parse_bool(
                "INCLUDE_OIDC_CLAIMS_IN_ACCESS_TOKEN",
            ),
        };

        Ok(Self {
            listen_addr,
            base_url,
            issuer,
            admin_console_client_id,
            admin_console_client_secret,
            settings_seed,
        })
    }

    pub fn listen_addr(&self) -> &str {
        &self.listen_addr
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn admin_console_client_id(&self) -> &str {
        &self.admin_console_client_id
    }

    pub fn admin_console_client_secret(&self) -> &str {
        &self.admin_console_client_secret
    }

    /// Initial global settings written to a fresh database.
    pub fn settings_seed(&self) -> &Settings {
        &self.settings_seed
    }
}
