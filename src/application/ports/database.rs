// src/application/ports/database.rs
use crate::{
    application::ApplicationResult,
    domain::{
        Client, Code, Group, KeyPair, Permission, RefreshToken, Resource, Settings, User,
        UserSession, UserSessionClient,
    },
};
use async_trait::async_trait;

/// Persistence capability consumed by the token and session services.
///
/// `load_*` methods populate the association fields of an already-loaded
/// entity in place. Lookups return `Ok(None)` for absent rows; errors are
/// reserved for storage failures.
#[async_trait]
pub trait Database: Send + Sync {
    async fn begin_transaction(&self) -> ApplicationResult<Box<dyn Transaction>>;

    async fn get_settings(&self) -> ApplicationResult<Settings>;

    async fn get_client_by_client_identifier(
        &self,
        client_identifier: &str,
    ) -> ApplicationResult<Option<Client>>;
    async fn client_load_redirect_uris(&self, client: &mut Client) -> ApplicationResult<()>;

    async fn get_resource_by_resource_identifier(
        &self,
        resource_identifier: &str,
    ) -> ApplicationResult<Option<Resource>>;
    async fn get_permissions_by_resource_id(
        &self,
        resource_id: i64,
    ) -> ApplicationResult<Vec<Permission>>;

    /// Persists the code, assigning `id`. Only `code_hash` is stored.
    async fn create_code(&self, code: &mut Code) -> ApplicationResult<()>;
    async fn get_code_by_code_hash(&self, code_hash: &str) -> ApplicationResult<Option<Code>>;
    async fn code_load_client(&self, code: &mut Code) -> ApplicationResult<()>;
    async fn code_load_user(&self, code: &mut Code) -> ApplicationResult<()>;

    async fn get_current_signing_key(&self) -> ApplicationResult<Option<KeyPair>>;
    async fn get_all_signing_keys(&self) -> ApplicationResult<Vec<KeyPair>>;

    /// Persists the token, assigning `id`. Fails with a conflict on a
    /// duplicate `refresh_token_jti`.
    async fn create_refresh_token(&self, token: &mut RefreshToken) -> ApplicationResult<()>;
    async fn get_refresh_token_by_jti(&self, jti: &str)
    -> ApplicationResult<Option<RefreshToken>>;

    async fn get_user_by_id(&self, id: i64) -> ApplicationResult<Option<User>>;
    async fn get_user_by_subject(&self, subject: &str) -> ApplicationResult<Option<User>>;
    async fn user_load_groups(&self, user: &mut User) -> ApplicationResult<()>;
    async fn user_load_attributes(&self, user: &mut User) -> ApplicationResult<()>;
    async fn user_load_permissions(&self, user: &mut User) -> ApplicationResult<()>;
    async fn groups_load_attributes(&self, groups: &mut [Group]) -> ApplicationResult<()>;
    async fn groups_load_permissions(&self, groups: &mut [Group]) -> ApplicationResult<()>;

    async fn get_user_session_by_session_identifier(
        &self,
        session_identifier: &str,
    ) -> ApplicationResult<Option<UserSession>>;
    async fn user_session_load_clients(&self, session: &mut UserSession) -> ApplicationResult<()>;
    async fn get_user_sessions_by_user_id(
        &self,
        user_id: i64,
    ) -> ApplicationResult<Vec<UserSession>>;
    /// Removes the session and its client rows.
    async fn delete_user_session(&self, id: i64) -> ApplicationResult<()>;
}

/// Unit of work over user-session writes.
///
/// Writes become visible to other readers only on `commit`. Dropping a
/// transaction without committing discards them, so `rollback` after a
/// successful commit is never needed.
#[async_trait]
pub trait Transaction: Send {
    async fn create_user_session(&mut self, session: &mut UserSession) -> ApplicationResult<()>;
    async fn update_user_session(&mut self, session: &UserSession) -> ApplicationResult<()>;
    async fn create_user_session_client(
        &mut self,
        client: &mut UserSessionClient,
    ) -> ApplicationResult<()>;
    async fn update_user_session_client(
        &mut self,
        client: &UserSessionClient,
    ) -> ApplicationResult<()>;
    async fn commit(self: Box<Self>) -> ApplicationResult<()>;
    async fn rollback(self: Box<Self>) -> ApplicationResult<()>;
}
