// src/application/ports/session.rs
use crate::application::ApplicationResult;
use async_trait::async_trait;
use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

pub const SESSION_KEY_SESSION_IDENTIFIER: &str = "SessionIdentifier";
pub const SESSION_KEY_JWT: &str = "JWT";
pub const SESSION_KEY_STATE: &str = "State";
pub const SESSION_KEY_NONCE: &str = "Nonce";
pub const SESSION_KEY_CODE_VERIFIER: &str = "CodeVerifier";
pub const SESSION_KEY_REDIRECT_BACK: &str = "RedirectBack";

pub type SessionData = HashMap<String, String>;

/// Server-side storage behind the browser session cookie.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, session_id: &str) -> ApplicationResult<Option<SessionData>>;
    async fn save(&self, session_id: &str, data: &SessionData) -> ApplicationResult<()>;
    async fn delete(&self, session_id: &str) -> ApplicationResult<()>;
}

#[derive(Debug)]
struct SessionState {
    id: String,
    data: SessionData,
    is_new: bool,
    changed: bool,
}

/// Request-scoped view of one cookie session, shared between middleware
/// layers and handlers. Writes are flushed by the session layer after the
/// handler returns.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionHandle {
    pub fn new(id: impl Into<String>, data: SessionData, is_new: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                id: id.into(),
                data,
                is_new,
                changed: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> String {
        self.lock().id.clone()
    }

    pub fn is_new(&self) -> bool {
        self.lock().is_new
    }

    pub fn is_changed(&self) -> bool {
        self.lock().changed
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().data.get(key).cloned()
    }

    pub fn set(&self, key: &str, value: impl Into<String>) {
        let mut state = self.lock();
        state.data.insert(key.to_string(), value.into());
        state.changed = true;
    }

    pub fn remove(&self, key: &str) {
        let mut state = self.lock();
        if state.data.remove(key).is_some() {
            state.changed = true;
        }
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        if !state.data.is_empty() {
            state.data.clear();
            state.changed = true;
        }
    }

    pub fn snapshot(&self) -> SessionData {
        self.lock().data.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_tracks_changes_across_clones() {
        let handle = SessionHandle::new("abc", SessionData::new(), true);
        let other = handle.clone();
        assert!(!handle.is_changed());
        other.set(SESSION_KEY_STATE, "xyz");
        assert!(handle.is_changed());
        assert_eq!(handle.get(SESSION_KEY_STATE).as_deref(), Some("xyz"));
    }

    #[test]
    fn removing_absent_key_is_not_a_change() {
        let handle = SessionHandle::new("abc", SessionData::new(), false);
        handle.remove(SESSION_KEY_JWT);
        handle.clear();
        assert!(!handle.is_changed());
    }
}
