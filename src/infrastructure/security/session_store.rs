// src/infrastructure/security/session_store.rs
use crate::application::{
    ApplicationResult,
    error::ApplicationError,
    ports::session::{SessionData, SessionStore},
};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Mutex, MutexGuard},
};

/// Process-local backing store for cookie sessions.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: Mutex<HashMap<String, SessionData>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> ApplicationResult<MutexGuard<'_, HashMap<String, SessionData>>> {
        self.sessions
            .lock()
            .map_err(|_| ApplicationError::infrastructure("session store lock poisoned"))
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load(&self, session_id: &str) -> ApplicationResult<Option<SessionData>> {
        Ok(self.guard()?.get(session_id).cloned())
    }

    async fn save(&self, session_id: &str, data: &SessionData) -> ApplicationResult<()> {
        self.guard()?.insert(session_id.to_string(), data.clone());
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> ApplicationResult<()> {
        self.guard()?.remove(session_id);
        Ok(())
    }
}
