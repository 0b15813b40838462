// tests/support/fixtures.rs
use super::mocks::FixedClock;
use authserver_core::{
    application::{
        dto::{JwtToken, RequestContext, TokenResponse},
        ports::{
            database::Database,
            security::JwtCodec,
            session::{SessionData, SessionHandle, SessionStore},
            time::Clock,
            token_endpoint::TokenEndpointClient,
        },
        services::{
            AuthServices,
            code_issuer::CreateCodeInput,
            user_session_manager::StartUserSessionInput,
        },
    },
    domain::{
        Client, Code, KeyPair, KeyState, Permission, RedirectUri, RefreshToken, Settings, User,
        UserSession, scope,
    },
    infrastructure::{
        persistence::InMemoryDatabase,
        security::{InMemorySessionStore, JoseJwtCodec, generate_rsa_key_pair},
    },
    presentation::http::{
        routes::build_router,
        state::{HttpState, WebConfig},
    },
};
use axum::{Router, body::Body, response::Response};
use chrono::Utc;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::sync::Arc;

pub const ISSUER: &str = "http://localhost:9090";
pub const CLIENT_ID: &str = "test-client";
pub const REDIRECT_URI: &str = "https://app.example.com/callback";
pub const ADMIN_CLIENT_ID: &str = "admin-console-client";
pub const ADMIN_CLIENT_SECRET: &str = "admin-console-secret";
pub const USER_SUBJECT: &str = "5b1b7c2e-0d6f-4a52-9d1e-6f1f0b1d2c3a";
pub const FIREFOX_LINUX: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:120.0) Gecko/20100101 Firefox/120.0";
pub const CHROME_ANDROID: &str = "Mozilla/5.0 (Linux; Android 14; Pixel 8) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Mobile Safari/537.36";
pub const START: i64 = 1_700_000_000;

/// RSA generation is slow; every test binary shares one current/next pair.
static SIGNING_KEYS: Lazy<Vec<KeyPair>> = Lazy::new(|| {
    let now = Utc::now();
    vec![
        generate_rsa_key_pair(KeyState::Current, now).expect("current key"),
        generate_rsa_key_pair(KeyState::Next, now).expect("next key"),
    ]
});

/// A seeded in-memory deployment with one relying party and one user.
pub struct TestWorld {
    pub db: InMemoryDatabase,
    pub clock: Arc<FixedClock>,
    pub services: Arc<AuthServices>,
    pub settings: Settings,
    pub client: Client,
    pub admin_client: Client,
    pub user: User,
    pub backend_read: Permission,
    pub backend_write: Permission,
    pub manage_account: Permission,
    pub admin_website: Permission,
}

pub fn world() -> TestWorld {
    world_with_settings(Settings::default())
}

pub fn world_with_settings(settings: Settings) -> TestWorld {
    let clock = Arc::new(FixedClock::at_epoch_offset(START));
    let db = InMemoryDatabase::new();
    let settings = Settings {
        issuer: ISSUER.into(),
        ..settings
    };
    db.set_settings(settings.clone()).expect("settings");

    for key in SIGNING_KEYS.iter() {
        db.insert_key_pair(key.clone()).expect("key pair");
    }

    let authserver = db
        .insert_resource(scope::AUTH_SERVER_RESOURCE_IDENTIFIER, "Authorization server")
        .expect("resource");
    db.insert_permission(authserver.id, scope::USERINFO_PERMISSION_IDENTIFIER, "userinfo")
        .expect("permission");
    let manage_account = db
        .insert_permission(
            authserver.id,
            scope::MANAGE_ACCOUNT_PERMISSION_IDENTIFIER,
            "manage account",
        )
        .expect("permission");
    let admin_website = db
        .insert_permission(
            authserver.id,
            scope::ADMIN_WEBSITE_PERMISSION_IDENTIFIER,
            "admin website",
        )
        .expect("permission");

    let backend = db.insert_resource("backend", "Backend API").expect("resource");
    let backend_read = db
        .insert_permission(backend.id, "read", "read access")
        .expect("permission");
    let backend_write = db
        .insert_permission(backend.id, "write", "write access")
        .expect("permission");

    let client = db.insert_client(with_redirect(Client::new(CLIENT_ID), REDIRECT_URI)).expect("client");
    let admin_client = db
        .insert_client(with_redirect(
            Client::new(ADMIN_CLIENT_ID),
            &format!("{ISSUER}/auth/callback"),
        ))
        .expect("admin client");

    let mut user = User::new(USER_SUBJECT, "jane@example.com", clock.now());
    user.username = "jane".into();
    user.given_name = "Jane".into();
    user.family_name = "Doe".into();
    user.email_verified = true;
    let user = db.insert_user(user).expect("user");

    let database: Arc<dyn Database> = Arc::new(db.clone());
    let jwt_codec: Arc<dyn JwtCodec> = Arc::new(JoseJwtCodec::new());
    let clock_port: Arc<dyn Clock> = clock.clone();
    let services = Arc::new(AuthServices::new(database, jwt_codec, clock_port));

    TestWorld {
        db,
        clock,
        services,
        settings,
        client,
        admin_client,
        user,
        backend_read,
        backend_write,
        manage_account,
        admin_website,
    }
}

fn with_redirect(mut client: Client, uri: &str) -> Client {
    client.redirect_uris.push(RedirectUri {
        id: 0,
        client_id: 0,
        uri: uri.to_string(),
    });
    client
}

impl TestWorld {
    pub fn request(&self) -> RequestContext {
        RequestContext::new("10.0.0.5:51234", FIREFOX_LINUX)
    }

    pub async fn start_session(&self) -> UserSession {
        self.start_session_from(&self.request()).await
    }

    pub async fn start_session_from(&self, request: &RequestContext) -> UserSession {
        let cookie = SessionHandle::new("cookie-session", SessionData::new(), true);
        self.services
            .user_sessions
            .start_new_user_session(
                request,
                &cookie,
                StartUserSessionInput {
                    user_id: self.user.id,
                    client_id: self.client.id,
                    auth_methods: "pwd".into(),
                    acr_level: "urn:authserver:acr:level1".into(),
                },
            )
            .await
            .expect("user session")
    }

    pub fn code_input(&self, scope_str: &str, session_identifier: &str) -> CreateCodeInput {
        CreateCodeInput {
            request: self.request(),
            client_identifier: CLIENT_ID.into(),
            user_id: self.user.id,
            code_challenge: "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM".into(),
            code_challenge_method: "S256".into(),
            redirect_uri: REDIRECT_URI.into(),
            scope: scope_str.into(),
            consented_scope: String::new(),
            state: "af0ifjsldkj".into(),
            nonce: "n-0S6_WzA2Mj".into(),
            response_mode: String::new(),
            acr_level: "urn:authserver:acr:level1".into(),
            auth_methods: "pwd otp".into(),
            session_identifier: session_identifier.into(),
            authenticated_at: self.clock.now(),
        }
    }

    pub async fn issue_code(&self, scope_str: &str, session_identifier: &str) -> Code {
        self.services
            .code_issuer
            .create_auth_code(self.code_input(scope_str, session_identifier))
            .await
            .expect("auth code")
    }

    pub async fn tokens_for(&self, code: &Code) -> TokenResponse {
        self.services
            .token_issuer
            .generate_token_response_for_auth_code(&self.settings, code)
            .await
            .expect("token response")
    }

    /// Signature-checked claims, without the expiry check.
    pub async fn parse(&self, token: &str) -> JwtToken {
        self.services
            .token_parser
            .decode_and_validate_token_string(token, None, false)
            .await
            .expect("valid signature")
            .expect("non-empty token")
    }

    pub async fn refresh_record(&self, response: &TokenResponse) -> RefreshToken {
        let jti = self.parse(&response.refresh_token).await.get_string_claim("jti");
        self.db
            .get_refresh_token_by_jti(&jti)
            .await
            .expect("lookup")
            .expect("persisted refresh token")
    }

    pub fn http_state(&self, token_client: Arc<dyn TokenEndpointClient>) -> HttpState {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new());
        HttpState {
            services: Arc::clone(&self.services),
            sessions,
            token_client,
            web: Arc::new(WebConfig {
                base_url: ISSUER.into(),
                issuer: ISSUER.into(),
                admin_console_client_id: ADMIN_CLIENT_ID.into(),
                admin_console_client_secret: ADMIN_CLIENT_SECRET.into(),
            }),
        }
    }

    pub fn router(&self, token_client: Arc<dyn TokenEndpointClient>) -> Router {
        build_router(self.http_state(token_client))
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json body")
}

pub fn empty() -> Body {
    Body::empty()
}
