// src/infrastructure/persistence/memory.rs
use crate::{
    application::{
        ApplicationResult,
        error::ApplicationError,
        ports::database::{Database, Transaction},
    },
    domain::{
        Attribute, Client, Code, Group, KeyPair, KeyState, Permission, RedirectUri, RefreshToken,
        Resource, Settings, User, UserSession, UserSessionClient, errors::DomainError,
    },
};
use async_trait::async_trait;
use std::sync::{
    Arc, Mutex, MutexGuard,
    atomic::{AtomicI64, Ordering},
};

#[derive(Default)]
struct Tables {
    settings: Settings,
    clients: Vec<Client>,
    redirect_uris: Vec<RedirectUri>,
    resources: Vec<Resource>,
    permissions: Vec<Permission>,
    users: Vec<User>,
    groups: Vec<Group>,
    users_groups: Vec<(i64, i64)>,
    user_attributes: Vec<(i64, Attribute)>,
    group_attributes: Vec<(i64, Attribute)>,
    users_permissions: Vec<(i64, i64)>,
    groups_permissions: Vec<(i64, i64)>,
    codes: Vec<Code>,
    key_pairs: Vec<KeyPair>,
    refresh_tokens: Vec<RefreshToken>,
    user_sessions: Vec<UserSession>,
    user_session_clients: Vec<UserSessionClient>,
}

/// Association-free copy of a row, as a relational store would return it.
fn bare_user(user: &User) -> User {
    User {
        groups: Vec::new(),
        attributes: Vec::new(),
        permissions: Vec::new(),
        ..user.clone()
    }
}

fn bare_group(group: &Group) -> Group {
    Group {
        attributes: Vec::new(),
        permissions: Vec::new(),
        ..group.clone()
    }
}

/// In-process implementation of the `Database` capability.
///
/// Rows are stored without their associations; the `*_load_*` methods join
/// them back in. Reads never observe writes staged in an uncommitted
/// transaction.
#[derive(Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<Mutex<Tables>>,
    next_id: Arc<AtomicI64>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> ApplicationResult<MutexGuard<'_, Tables>> {
        lock(&self.tables)
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn set_settings(&self, settings: Settings) -> ApplicationResult<()> {
        self.tables()?.settings = settings;
        Ok(())
    }

    pub fn insert_client(&self, mut client: Client) -> ApplicationResult<Client> {
        let mut tables = self.tables()?;
        if tables
            .clients
            .iter()
            .any(|c| c.client_identifier == client.client_identifier)
        {
            return Err(DomainError::Conflict(format!(
                "client '{}' already exists",
                client.client_identifier
            ))
            .into());
        }
        client.id = self.allocate_id();
        for uri in client.redirect_uris.iter_mut() {
            uri.id = self.allocate_id();
            uri.client_id = client.id;
            tables.redirect_uris.push(uri.clone());
        }
        tables.clients.push(Client {
            redirect_uris: Vec::new(),
            ..client.clone()
        });
        Ok(client)
    }

    pub fn insert_resource(
        &self,
        resource_identifier: &str,
        description: &str,
    ) -> ApplicationResult<Resource> {
        let resource = Resource {
            id: self.allocate_id(),
            resource_identifier: resource_identifier.to_string(),
            description: description.to_string(),
        };
        self.tables()?.resources.push(resource.clone());
        Ok(resource)
    }

    pub fn insert_permission(
        &self,
        resource_id: i64,
        permission_identifier: &str,
        description: &str,
    ) -> ApplicationResult<Permission> {
        let permission = Permission {
            id: self.allocate_id(),
            resource_id,
            permission_identifier: permission_identifier.to_string(),
            description: description.to_string(),
        };
        self.tables()?.permissions.push(permission.clone());
        Ok(permission)
    }

    pub fn insert_user(&self, mut user: User) -> ApplicationResult<User> {
        user.id = self.allocate_id();
        self.tables()?.users.push(bare_user(&user));
        Ok(user)
    }

    pub fn insert_group(&self, mut group: Group) -> ApplicationResult<Group> {
        group.id = self.allocate_id();
        self.tables()?.groups.push(bare_group(&group));
        Ok(group)
    }

    pub fn add_user_to_group(&self, user_id: i64, group_id: i64) -> ApplicationResult<()> {
        self.tables()?.users_groups.push((user_id, group_id));
        Ok(())
    }

    pub fn add_user_attribute(&self, user_id: i64, mut attribute: Attribute) -> ApplicationResult<()> {
        attribute.id = self.allocate_id();
        self.tables()?.user_attributes.push((user_id, attribute));
        Ok(())
    }

    pub fn add_group_attribute(
        &self,
        group_id: i64,
        mut attribute: Attribute,
    ) -> ApplicationResult<()> {
        attribute.id = self.allocate_id();
        self.tables()?.group_attributes.push((group_id, attribute));
        Ok(())
    }

    pub fn grant_user_permission(&self, user_id: i64, permission_id: i64) -> ApplicationResult<()> {
        self.tables()?.users_permissions.push((user_id, permission_id));
        Ok(())
    }

    pub fn grant_group_permission(
        &self,
        group_id: i64,
        permission_id: i64,
    ) -> ApplicationResult<()> {
        self.tables()?
            .groups_permissions
            .push((group_id, permission_id));
        Ok(())
    }

    pub fn insert_key_pair(&self, mut key_pair: KeyPair) -> ApplicationResult<KeyPair> {
        let mut tables = self.tables()?;
        if key_pair.state == KeyState::Current
            && tables.key_pairs.iter().any(|k| k.state == KeyState::Current)
        {
            return Err(DomainError::Conflict("a current signing key already exists".into()).into());
        }
        key_pair.id = self.allocate_id();
        tables.key_pairs.push(key_pair.clone());
        Ok(key_pair)
    }

    /// Flags a code as redeemed. Returns false if it was already used.
    pub fn mark_code_used(&self, code_id: i64) -> ApplicationResult<bool> {
        let mut tables = self.tables()?;
        let code = tables
            .codes
            .iter_mut()
            .find(|c| c.id == code_id)
            .ok_or_else(|| ApplicationError::not_found(format!("code {code_id}")))?;
        if code.used {
            return Ok(false);
        }
        code.used = true;
        Ok(true)
    }

    fn permissions_for(tables: &Tables, pairs: &[(i64, i64)], owner_id: i64) -> Vec<Permission> {
        pairs
            .iter()
            .filter(|(owner, _)| *owner == owner_id)
            .filter_map(|(_, permission_id)| {
                tables.permissions.iter().find(|p| p.id == *permission_id).cloned()
            })
            .collect()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> ApplicationResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| ApplicationError::infrastructure("database lock poisoned"))
}

#[async_trait]
impl Database for InMemoryDatabase {
    async fn begin_transaction(&self) -> ApplicationResult<Box<dyn Transaction>> {
        Ok(Box::new(InMemoryTransaction {
            tables: Arc::clone(&self.tables),
            next_id: Arc::clone(&self.next_id),
            staged: Vec::new(),
        }))
    }

    async fn get_settings(&self) -> ApplicationResult<Settings> {
        Ok(self.tables()?.settings.clone())
    }

    async fn get_client_by_client_identifier(
        &self,
        client_identifier: &str,
    ) -> ApplicationResult<Option<Client>> {
        Ok(self
            .tables()?
            .clients
            .iter()
            .find(|c| c.client_identifier == client_identifier)
            .cloned())
    }

    async fn client_load_redirect_uris(&self, client: &mut Client) -> ApplicationResult<()> {
        client.redirect_uris = self
            .tables()?
            .redirect_uris
            .iter()
            .filter(|r| r.client_id == client.id)
            .cloned()
            .collect();
        Ok(())
    }

    async fn get_resource_by_resource_identifier(
        &self,
        resource_identifier: &str,
    ) -> ApplicationResult<Option<Resource>> {
        Ok(self
            .tables()?
            .resources
            .iter()
            .find(|r| r.resource_identifier == resource_identifier)
            .cloned())
    }

    async fn get_permissions_by_resource_id(
        &self,
        resource_id: i64,
    ) -> ApplicationResult<Vec<Permission>> {
        Ok(self
            .tables()?
            .permissions
            .iter()
            .filter(|p| p.resource_id == resource_id)
            .cloned()
            .collect())
    }

    async fn create_code(&self, code: &mut Code) -> ApplicationResult<()> {
        let mut tables = self.tables()?;
        if tables.codes.iter().any(|c| c.code_hash == code.code_hash) {
            return Err(DomainError::Conflict("code hash already exists".into()).into());
        }
        code.id = self.allocate_id();
        tables.codes.push(Code {
            code: String::new(),
            client: None,
            user: None,
            ..code.clone()
        });
        Ok(())
    }

    async fn get_code_by_code_hash(&self, code_hash: &str) -> ApplicationResult<Option<Code>> {
        Ok(self
            .tables()?
            .codes
            .iter()
            .find(|c| c.code_hash == code_hash)
            .cloned())
    }

    async fn code_load_client(&self, code: &mut Code) -> ApplicationResult<()> {
        code.client = self
            .tables()?
            .clients
            .iter()
            .find(|c| c.id == code.client_id)
            .cloned();
        Ok(())
    }

    async fn code_load_user(&self, code: &mut Code) -> ApplicationResult<()> {
        code.user = self
            .tables()?
            .users
            .iter()
            .find(|u| u.id == code.user_id)
            .cloned();
        Ok(())
    }

    async fn get_current_signing_key(&self) -> ApplicationResult<Option<KeyPair>> {
        Ok(self
            .tables()?
            .key_pairs
            .iter()
            .find(|k| k.state == KeyState::Current)
            .cloned())
    }

    async fn get_all_signing_keys(&self) -> ApplicationResult<Vec<KeyPair>> {
        Ok(self.tables()?.key_pairs.clone())
    }

    async fn create_refresh_token(&self, token: &mut RefreshToken) -> ApplicationResult<()> {
        let mut tables = self.tables()?;
        if tables
            .refresh_tokens
            .iter()
            .any(|t| t.refresh_token_jti == token.refresh_token_jti)
        {
            return Err(DomainError::Conflict(format!(
                "refresh token jti '{}' already exists",
                token.refresh_token_jti
            ))
            .into());
        }
        token.id = self.allocate_id();
        tables.refresh_tokens.push(token.clone());
        Ok(())
    }

    async fn get_refresh_token_by_jti(
        &self,
        jti: &str,
    ) -> ApplicationResult<Option<RefreshToken>> {
        Ok(self
            .tables()?
            .refresh_tokens
            .iter()
            .find(|t| t.refresh_token_jti == jti)
            .cloned())
    }

    async fn get_user_by_id(&self, id: i64) -> ApplicationResult<Option<User>> {
        Ok(self.tables()?.users.iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_subject(&self, subject: &str) -> ApplicationResult<Option<User>> {
        Ok(self
            .tables()?
            .users
            .iter()
            .find(|u| u.subject == subject)
            .cloned())
    }

    async fn user_load_groups(&self, user: &mut User) -> ApplicationResult<()> {
        let tables = self.tables()?;
        user.groups = tables
            .users_groups
            .iter()
            .filter(|(user_id, _)| *user_id == user.id)
            .filter_map(|(_, group_id)| tables.groups.iter().find(|g| g.id == *group_id))
            .map(bare_group)
            .collect();
        Ok(())
    }

    async fn user_load_attributes(&self, user: &mut User) -> ApplicationResult<()> {
        user.attributes = self
            .tables()?
            .user_attributes
            .iter()
            .filter(|(user_id, _)| *user_id == user.id)
            .map(|(_, attribute)| attribute.clone())
            .collect();
        Ok(())
    }

    async fn user_load_permissions(&self, user: &mut User) -> ApplicationResult<()> {
        let tables = self.tables()?;
        user.permissions = Self::permissions_for(&tables, &tables.users_permissions, user.id);
        Ok(())
    }

    async fn groups_load_attributes(&self, groups: &mut [Group]) -> ApplicationResult<()> {
        let tables = self.tables()?;
        for group in groups.iter_mut() {
            group.attributes = tables
                .group_attributes
                .iter()
                .filter(|(group_id, _)| *group_id == group.id)
                .map(|(_, attribute)| attribute.clone())
                .collect();
        }
        Ok(())
    }

    async fn groups_load_permissions(&self, groups: &mut [Group]) -> ApplicationResult<()> {
        let tables = self.tables()?;
        for group in groups.iter_mut() {
            group.permissions =
                Self::permissions_for(&tables, &tables.groups_permissions, group.id);
        }
        Ok(())
    }

    async fn get_user_session_by_session_identifier(
        &self,
        session_identifier: &str,
    ) -> ApplicationResult<Option<UserSession>> {
        Ok(self
            .tables()?
            .user_sessions
            .iter()
            .find(|s| s.session_identifier == session_identifier)
            .cloned())
    }

    async fn user_session_load_clients(&self, session: &mut UserSession) -> ApplicationResult<()> {
        session.clients = self
            .tables()?
            .user_session_clients
            .iter()
            .filter(|c| c.user_session_id == session.id)
            .cloned()
            .collect();
        Ok(())
    }

    async fn get_user_sessions_by_user_id(
        &self,
        user_id: i64,
    ) -> ApplicationResult<Vec<UserSession>> {
        Ok(self
            .tables()?
            .user_sessions
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn delete_user_session(&self, id: i64) -> ApplicationResult<()> {
        let mut tables = self.tables()?;
        tables.user_sessions.retain(|s| s.id != id);
        tables.user_session_clients.retain(|c| c.user_session_id != id);
        Ok(())
    }
}

enum StagedWrite {
    CreateUserSession(UserSession),
    UpdateUserSession(UserSession),
    CreateUserSessionClient(UserSessionClient),
    UpdateUserSessionClient(UserSessionClient),
}

/// Buffers writes until `commit`; dropping it discards them.
pub struct InMemoryTransaction {
    tables: Arc<Mutex<Tables>>,
    next_id: Arc<AtomicI64>,
    staged: Vec<StagedWrite>,
}

impl InMemoryTransaction {
    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl Transaction for InMemoryTransaction {
    async fn create_user_session(&mut self, session: &mut UserSession) -> ApplicationResult<()> {
        session.id = self.allocate_id();
        self.staged.push(StagedWrite::CreateUserSession(UserSession {
            clients: Vec::new(),
            ..session.clone()
        }));
        Ok(())
    }

    async fn update_user_session(&mut self, session: &UserSession) -> ApplicationResult<()> {
        self.staged.push(StagedWrite::UpdateUserSession(UserSession {
            clients: Vec::new(),
            ..session.clone()
        }));
        Ok(())
    }

    async fn create_user_session_client(
        &mut self,
        client: &mut UserSessionClient,
    ) -> ApplicationResult<()> {
        client.id = self.allocate_id();
        self.staged
            .push(StagedWrite::CreateUserSessionClient(client.clone()));
        Ok(())
    }

    async fn update_user_session_client(
        &mut self,
        client: &UserSessionClient,
    ) -> ApplicationResult<()> {
        self.staged
            .push(StagedWrite::UpdateUserSessionClient(client.clone()));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> ApplicationResult<()> {
        let mut tables = lock(&self.tables)?;

        let mut sessions = tables.user_sessions.clone();
        let mut clients = tables.user_session_clients.clone();
        for write in self.staged {
            match write {
                StagedWrite::CreateUserSession(session) => {
                    if sessions
                        .iter()
                        .any(|s| s.session_identifier == session.session_identifier)
                    {
                        return Err(DomainError::Conflict(
                            "session identifier already exists".into(),
                        )
                        .into());
                    }
                    sessions.push(session);
                }
                StagedWrite::UpdateUserSession(session) => {
                    let row = sessions
                        .iter_mut()
                        .find(|s| s.id == session.id)
                        .ok_or_else(|| {
                            ApplicationError::not_found(format!("user session {}", session.id))
                        })?;
                    *row = session;
                }
                StagedWrite::CreateUserSessionClient(client) => clients.push(client),
                StagedWrite::UpdateUserSessionClient(client) => {
                    let row = clients.iter_mut().find(|c| c.id == client.id).ok_or_else(|| {
                        ApplicationError::not_found(format!("user session client {}", client.id))
                    })?;
                    *row = client;
                }
            }
        }

        tables.user_sessions = sessions;
        tables.user_session_clients = clients;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> ApplicationResult<()> {
        Ok(())
    }
}
