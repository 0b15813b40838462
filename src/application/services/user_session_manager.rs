// src/application/services/user_session_manager.rs
use crate::{
    application::{
        dto::RequestContext,
        error::{ApplicationError, ApplicationResult},
        ports::{
            database::Database,
            session::{SESSION_KEY_SESSION_IDENTIFIER, SessionHandle},
            time::Clock,
        },
    },
    domain::{Settings, UserSession, UserSessionClient},
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct StartUserSessionInput {
    pub user_id: i64,
    pub client_id: i64,
    pub auth_methods: String,
    pub acr_level: String,
}

pub struct UserSessionManager {
    database: Arc<dyn Database>,
    clock: Arc<dyn Clock>,
}

impl UserSessionManager {
    pub fn new(database: Arc<dyn Database>, clock: Arc<dyn Clock>) -> Self {
        Self { database, clock }
    }

    pub fn has_valid_user_session(
        &self,
        settings: &Settings,
        user_session: Option<&UserSession>,
        requested_max_age_in_seconds: Option<i64>,
    ) -> bool {
        user_session.is_some_and(|session| {
            session.is_valid(
                self.clock.now(),
                settings.user_session_idle_timeout_in_seconds,
                settings.user_session_max_lifetime_in_seconds,
                requested_max_age_in_seconds,
            )
        })
    }

    /// Creates the session and its first client row atomically, evicts older
    /// sessions of the same user from the same device and IP, and records the
    /// new identifier in the cookie session.
    pub async fn start_new_user_session(
        &self,
        request: &RequestContext,
        cookie_session: &SessionHandle,
        input: StartUserSessionInput,
    ) -> ApplicationResult<UserSession> {
        let now = self.clock.now();

        let mut user_session = UserSession {
            id: 0,
            session_identifier: Uuid::new_v4().to_string(),
            user_id: input.user_id,
            started: now,
            last_accessed: now,
            auth_time: now,
            auth_methods: input.auth_methods,
            acr_level: input.acr_level,
            ip_address: request.ip_address.clone(),
            device_name: request.device_name(),
            device_type: request.device_type(),
            device_os: request.device_os(),
            clients: Vec::new(),
        };

        let mut tx = self.database.begin_transaction().await?;
        tx.create_user_session(&mut user_session).await?;
        let mut session_client = UserSessionClient {
            id: 0,
            user_session_id: user_session.id,
            client_id: input.client_id,
            started: now,
            last_accessed: now,
        };
        tx.create_user_session_client(&mut session_client).await?;
        tx.commit().await?;
        user_session.clients.push(session_client);

        let existing = self
            .database
            .get_user_sessions_by_user_id(user_session.user_id)
            .await?;
        for stale in existing.iter().filter(|other| {
            other.id != user_session.id
                && other.same_device(&user_session)
                && other.ip_address == user_session.ip_address
        }) {
            self.database.delete_user_session(stale.id).await?;
            debug!(
                session_identifier = %stale.session_identifier,
                "removed previous session from the same device"
            );
        }

        cookie_session.set(
            SESSION_KEY_SESSION_IDENTIFIER,
            user_session.session_identifier.clone(),
        );
        info!(
            user_id = user_session.user_id,
            session_identifier = %user_session.session_identifier,
            "user session started"
        );

        Ok(user_session)
    }

    /// Advances the session and the client's activity timestamps, attaching
    /// the client if new, and records the request IP.
    pub async fn bump_user_session(
        &self,
        request: &RequestContext,
        session_identifier: &str,
        client_id: i64,
    ) -> ApplicationResult<UserSession> {
        let mut user_session = self
            .database
            .get_user_session_by_session_identifier(session_identifier)
            .await?
            .ok_or_else(|| {
                ApplicationError::detailed_with_status(
                    "invalid_session",
                    format!("The user session '{session_identifier}' does not exist."),
                    404,
                )
            })?;
        self.database
            .user_session_load_clients(&mut user_session)
            .await?;

        let now = self.clock.now();
        user_session.touch_client(client_id, now);
        user_session.record_ip_address(&request.ip_address);

        let mut tx = self.database.begin_transaction().await?;
        tx.update_user_session(&user_session).await?;
        for session_client in user_session.clients.iter_mut() {
            if session_client.id == 0 {
                tx.create_user_session_client(session_client).await?;
            } else {
                tx.update_user_session_client(session_client).await?;
            }
        }
        tx.commit().await?;

        debug!(session_identifier = %session_identifier, client_id, "user session bumped");
        Ok(user_session)
    }
}
