// src/application/services/token_issuer.rs
//! Claim assembly and signing for access, ID and refresh tokens.

use crate::{
    application::{
        dto::TokenResponse,
        error::{ApplicationError, ApplicationResult},
        ports::{database::Database, security::JwtCodec, time::Clock},
    },
    domain::{Client, Code, KeyPair, RefreshToken, RefreshTokenType, Settings, User, scope},
};
use chrono::{DateTime, Duration, Utc};
use serde_json::{Map, Value, json};
use std::sync::Arc;
use tracing::{debug, error};
use uuid::Uuid;

pub const TOKEN_TYPE_BEARER: &str = "Bearer";
pub const TOKEN_TYPE_ID: &str = "ID";

const INVALID_SCOPE: &str = "invalid_scope";
const INVALID_GRANT: &str = "invalid_grant";

pub struct GenerateTokenForRefreshInput<'a> {
    /// The code the refresh token chain originated from.
    pub code: &'a Code,
    /// Optional narrowing of the refresh token's scope.
    pub scope_requested: &'a str,
    /// The refresh token being redeemed.
    pub refresh_token: &'a RefreshToken,
}

pub struct TokenIssuer {
    database: Arc<dyn Database>,
    jwt_codec: Arc<dyn JwtCodec>,
    clock: Arc<dyn Clock>,
}

/// Which token a claim is being projected into.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Target {
    Access,
    Id,
}

impl TokenIssuer {
    pub fn new(
        database: Arc<dyn Database>,
        jwt_codec: Arc<dyn JwtCodec>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            database,
            jwt_codec,
            clock,
        }
    }

    pub async fn generate_token_response_for_auth_code(
        &self,
        settings: &Settings,
        code: &Code,
    ) -> ApplicationResult<TokenResponse> {
        let code = self.load_code_graph(code).await?;
        let scope = code.scope.clone();
        self.issue_for_code(settings, &code, &scope, None).await
    }

    pub async fn generate_token_response_for_client_cred(
        &self,
        settings: &Settings,
        client: &Client,
        scope_str: &str,
    ) -> ApplicationResult<TokenResponse> {
        let requested = scope::normalize(scope_str);
        if let Some(oidc) = scope::split(&requested)
            .into_iter()
            .find(|s| scope::is_oidc_scope(s) || scope::is_offline_access_scope(s))
        {
            return Err(ApplicationError::detailed_with_status(
                INVALID_SCOPE,
                format!(
                    "Scope '{oidc}' is not supported with the client credentials flow. Request resource:permission scopes only."
                ),
                400,
            ));
        }

        let key = self.current_signing_key().await?;
        let now = self.clock.now();
        let expires_in = settings.token_expiration_for(client);
        let (audience, scope_claim) = compute_audience(&requested)?;

        let mut claims = Map::new();
        claims.insert("iss".into(), json!(settings.issuer));
        claims.insert("sub".into(), json!(client.client_identifier));
        claims.insert("iat".into(), json!(now.timestamp()));
        claims.insert("jti".into(), json!(Uuid::new_v4().to_string()));
        claims.insert("aud".into(), audience);
        claims.insert("typ".into(), json!(TOKEN_TYPE_BEARER));
        claims.insert(
            "exp".into(),
            json!((now + Duration::seconds(expires_in)).timestamp()),
        );
        claims.insert("scope".into(), json!(scope_claim));

        let access_token = self.jwt_codec.sign(&claims, &key)?;
        debug!(client_id = %client.client_identifier, "client credentials token issued");

        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE_BEARER.into(),
            expires_in,
            scope: scope_claim,
            ..Default::default()
        })
    }

    pub async fn generate_token_response_for_refresh(
        &self,
        settings: &Settings,
        input: GenerateTokenForRefreshInput<'_>,
    ) -> ApplicationResult<TokenResponse> {
        let previous = input.refresh_token;
        if previous.revoked {
            return Err(ApplicationError::detailed_with_status(
                INVALID_GRANT,
                "The refresh token has been revoked.",
                400,
            ));
        }

        let scope = narrow_refresh_scope(&previous.scope, input.scope_requested)?;
        let code = self.load_code_graph(input.code).await?;
        self.issue_for_code(settings, &code, &scope, Some(previous))
            .await
    }

    async fn load_code_graph(&self, code: &Code) -> ApplicationResult<Code> {
        let mut code = code.clone();
        if code.client.is_none() {
            self.database.code_load_client(&mut code).await?;
        }
        if code.user.is_none() {
            self.database.code_load_user(&mut code).await?;
        }

        let user = code
            .user
            .as_mut()
            .ok_or_else(|| ApplicationError::infrastructure("unable to load the user of the code"))?;
        self.database.user_load_groups(user).await?;
        self.database
            .groups_load_attributes(&mut user.groups)
            .await?;
        self.database.user_load_attributes(user).await?;

        Ok(code)
    }

    async fn issue_for_code(
        &self,
        settings: &Settings,
        code: &Code,
        scope_str: &str,
        previous: Option<&RefreshToken>,
    ) -> ApplicationResult<TokenResponse> {
        let client = code
            .client
            .as_ref()
            .ok_or_else(|| ApplicationError::infrastructure("unable to load the client of the code"))?;
        let user = code
            .user
            .as_ref()
            .ok_or_else(|| ApplicationError::infrastructure("unable to load the user of the code"))?;

        let key = self.current_signing_key().await?;
        let now = self.clock.now();
        let expires_in = settings.token_expiration_for(client);

        let ctx = CodeTokenContext {
            settings,
            code,
            client,
            user,
            scope: scope_str,
            now,
        };

        let (access_claims, scope_claim) = ctx.access_token_claims(expires_in)?;
        let mut response = TokenResponse {
            access_token: self.jwt_codec.sign(&access_claims, &key)?,
            token_type: TOKEN_TYPE_BEARER.into(),
            expires_in,
            scope: scope_claim,
            ..Default::default()
        };

        if scope::contains(scope_str, scope::OPENID) {
            response.id_token = self
                .jwt_codec
                .sign(&ctx.id_token_claims(expires_in), &key)?;
        }

        let (refresh_token, refresh_expires_in) =
            self.issue_refresh_token(&ctx, &key, previous).await?;
        response.refresh_token = refresh_token;
        response.refresh_expires_in = refresh_expires_in;

        Ok(response)
    }

    async fn issue_refresh_token(
        &self,
        ctx: &CodeTokenContext<'_>,
        key: &KeyPair,
        previous: Option<&RefreshToken>,
    ) -> ApplicationResult<(String, i64)> {
        let now = ctx.now;
        let jti = Uuid::new_v4().to_string();

        let mut claims = Map::new();
        claims.insert("iss".into(), json!(ctx.settings.issuer));
        claims.insert("iat".into(), json!(now.timestamp()));
        claims.insert("jti".into(), json!(jti));
        claims.insert("aud".into(), json!(ctx.settings.issuer));
        claims.insert("sub".into(), json!(ctx.user.subject));
        claims.insert("scope".into(), json!(ctx.scope));

        let (token_type, expires_at, max_lifetime) =
            if scope::contains(ctx.scope, scope::OFFLINE_ACCESS) {
                let max_lifetime = same_chain_cap(previous, RefreshTokenType::Offline)
                    .unwrap_or_else(|| {
                        now + Duration::seconds(ctx.settings.offline_max_lifetime_for(ctx.client))
                    });
                let sliding =
                    now + Duration::seconds(ctx.settings.offline_idle_timeout_for(ctx.client));
                claims.insert(
                    "offline_access_max_lifetime".into(),
                    json!(max_lifetime.timestamp()),
                );
                (RefreshTokenType::Offline, sliding.min(max_lifetime), max_lifetime)
            } else {
                let session = self
                    .database
                    .get_user_session_by_session_identifier(&ctx.code.session_identifier)
                    .await?
                    .ok_or_else(|| {
                        ApplicationError::detailed_with_status(
                            INVALID_GRANT,
                            "The user session associated with this grant no longer exists.",
                            400,
                        )
                    })?;
                // A session-bound token never outlives the session, even when
                // it continues a narrowed offline chain.
                let session_deadline = session.started
                    + Duration::seconds(ctx.settings.user_session_max_lifetime_in_seconds);
                let max_lifetime = same_chain_cap(previous, RefreshTokenType::Refresh)
                    .map_or(session_deadline, |cap| cap.min(session_deadline));
                let sliding =
                    now + Duration::seconds(ctx.settings.user_session_idle_timeout_in_seconds);
                claims.insert("sid".into(), json!(ctx.code.session_identifier));
                (RefreshTokenType::Refresh, sliding.min(max_lifetime), max_lifetime)
            };

        claims.insert("typ".into(), json!(token_type.as_str()));
        claims.insert("exp".into(), json!(expires_at.timestamp()));

        let signed = self.jwt_codec.sign(&claims, key)?;

        let (previous_jti, first_jti) = match previous {
            Some(p) => (
                p.refresh_token_jti.clone(),
                p.first_refresh_token_jti.clone(),
            ),
            None => (String::new(), jti.clone()),
        };

        let mut record = RefreshToken {
            id: 0,
            code_id: ctx.code.id,
            refresh_token_jti: jti,
            previous_refresh_token_jti: previous_jti,
            first_refresh_token_jti: first_jti,
            session_identifier: ctx.code.session_identifier.clone(),
            refresh_token_type: token_type,
            scope: ctx.scope.to_string(),
            issued_at: now,
            expires_at,
            max_lifetime,
            revoked: false,
        };
        if let Err(err) = self.database.create_refresh_token(&mut record).await {
            error!(error = %err, jti = %record.refresh_token_jti, "unable to persist refresh token");
            return Err(err);
        }
        debug!(
            jti = %record.refresh_token_jti,
            first_jti = %record.first_refresh_token_jti,
            refresh_token_type = %token_type,
            "refresh token issued"
        );

        Ok((signed, (expires_at - now).num_seconds()))
    }

    async fn current_signing_key(&self) -> ApplicationResult<KeyPair> {
        self.database
            .get_current_signing_key()
            .await?
            .ok_or_else(|| ApplicationError::infrastructure("unable to find the current signing key"))
    }
}

/// Hard deadline carried over from `previous` when it belongs to a chain of
/// the same type.
fn same_chain_cap(
    previous: Option<&RefreshToken>,
    token_type: RefreshTokenType,
) -> Option<DateTime<Utc>> {
    previous
        .filter(|p| p.refresh_token_type == token_type)
        .map(|p| p.max_lifetime)
}

struct CodeTokenContext<'a> {
    settings: &'a Settings,
    code: &'a Code,
    client: &'a Client,
    user: &'a User,
    scope: &'a str,
    now: DateTime<Utc>,
}

impl CodeTokenContext<'_> {
    fn common_claims(&self, expires_in: i64) -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("iss".into(), json!(self.settings.issuer));
        claims.insert("sub".into(), json!(self.user.subject));
        claims.insert("iat".into(), json!(self.now.timestamp()));
        claims.insert(
            "auth_time".into(),
            json!(self.code.authenticated_at.timestamp()),
        );
        claims.insert("jti".into(), json!(Uuid::new_v4().to_string()));
        claims.insert("acr".into(), json!(self.code.acr_level));
        claims.insert("amr".into(), json!(self.code.auth_methods_list()));
        claims.insert("sid".into(), json!(self.code.session_identifier));
        claims.insert(
            "exp".into(),
            json!((self.now + Duration::seconds(expires_in)).timestamp()),
        );
        claims
    }

    /// Returns the claims and the effective `scope` claim value.
    fn access_token_claims(&self, expires_in: i64) -> ApplicationResult<(Map<String, Value>, String)> {
        let mut claims = self.common_claims(expires_in);
        let (audience, scope_claim) = compute_audience(self.scope)?;
        claims.insert("aud".into(), audience);
        claims.insert("typ".into(), json!(TOKEN_TYPE_BEARER));
        claims.insert("scope".into(), json!(scope_claim));

        if scope::contains(self.scope, scope::OPENID)
            && self
                .settings
                .include_oidc_claims_in_access_token_for(self.client)
        {
            add_open_id_connect_claims(&mut claims, self.user, self.scope, &self.settings.issuer);
        }
        self.add_groups_and_attributes(&mut claims, Target::Access);

        Ok((claims, scope_claim))
    }

    fn id_token_claims(&self, expires_in: i64) -> Map<String, Value> {
        let mut claims = self.common_claims(expires_in);
        claims.insert("aud".into(), json!(self.client.client_identifier));
        claims.insert("typ".into(), json!(TOKEN_TYPE_ID));
        if !self.code.nonce.is_empty() {
            claims.insert("nonce".into(), json!(self.code.nonce));
        }
        add_open_id_connect_claims(&mut claims, self.user, self.scope, &self.settings.issuer);
        self.add_groups_and_attributes(&mut claims, Target::Id);
        claims
    }

    fn add_groups_and_attributes(&self, claims: &mut Map<String, Value>, target: Target) {
        if scope::contains(self.scope, scope::GROUPS) {
            claims.insert("groups".into(), groups_claim(self.user, target));
        }
        if scope::contains(self.scope, scope::ATTRIBUTES) {
            claims.insert("attributes".into(), attributes_claim(self.user, target));
        }
    }
}

/// Derives `aud` from the resource half of every `resource:permission`
/// scope. OIDC scopes add the authorization server itself and the implicit
/// userinfo scope. An empty audience is an error.
fn compute_audience(scope_str: &str) -> ApplicationResult<(Value, String)> {
    let mut audiences: Vec<String> = Vec::new();
    let mut add_userinfo = false;

    for s in scope::split(scope_str) {
        if scope::is_oidc_scope(s) {
            add_userinfo = true;
            continue;
        }
        if scope::is_offline_access_scope(s) {
            continue;
        }
        let Some((resource, _)) = scope::parse_resource_permission(s) else {
            continue;
        };
        if !audiences.iter().any(|a| a == resource) {
            audiences.push(resource.to_string());
        }
    }

    let mut scope_claim = scope::normalize(scope_str);
    if add_userinfo {
        if !audiences
            .iter()
            .any(|a| a == scope::AUTH_SERVER_RESOURCE_IDENTIFIER)
        {
            audiences.push(scope::AUTH_SERVER_RESOURCE_IDENTIFIER.to_string());
        }
        if !scope::contains(&scope_claim, scope::USERINFO_SCOPE) {
            scope_claim = format!("{scope_claim} {}", scope::USERINFO_SCOPE);
        }
    }

    match audiences.len() {
        0 => Err(ApplicationError::detailed_with_status(
            INVALID_SCOPE,
            "The token audience cannot be empty. Request at least one resource:permission scope or an OpenID Connect scope.",
            400,
        )),
        1 => Ok((json!(audiences[0]), scope_claim)),
        _ => Ok((json!(audiences), scope_claim)),
    }
}

/// A scope requested on refresh may only narrow the refresh token's scope.
fn narrow_refresh_scope(granted: &str, requested: &str) -> ApplicationResult<String> {
    let requested: Vec<&str> = scope::split(requested)
        .into_iter()
        .filter(|s| *s != scope::USERINFO_SCOPE)
        .collect();
    if requested.is_empty() {
        return Ok(scope::normalize(granted));
    }

    for s in &requested {
        if !scope::contains(granted, s) {
            return Err(ApplicationError::detailed_with_status(
                INVALID_SCOPE,
                format!(
                    "Scope '{s}' is not recognized. To ask for additional scopes, please perform a new authorization request."
                ),
                400,
            ));
        }
    }

    let mut narrowed: Vec<&str> = Vec::new();
    for s in requested {
        if !narrowed.contains(&s) {
            narrowed.push(s);
        }
    }
    Ok(narrowed.join(" "))
}

fn insert_if_not_empty(claims: &mut Map<String, Value>, name: &str, value: &str) {
    if !value.trim().is_empty() {
        claims.insert(name.to_string(), json!(value));
    }
}

fn add_open_id_connect_claims(
    claims: &mut Map<String, Value>,
    user: &User,
    scope_str: &str,
    issuer: &str,
) {
    if scope::contains(scope_str, scope::PROFILE) {
        insert_if_not_empty(claims, "name", &user.full_name());
        insert_if_not_empty(claims, "given_name", &user.given_name);
        insert_if_not_empty(claims, "middle_name", &user.middle_name);
        insert_if_not_empty(claims, "family_name", &user.family_name);
        insert_if_not_empty(claims, "nickname", &user.nickname);
        insert_if_not_empty(claims, "preferred_username", &user.username);
        claims.insert(
            "profile".into(),
            json!(format!("{}/account/profile", issuer.trim_end_matches('/'))),
        );
        insert_if_not_empty(claims, "website", &user.website);
        insert_if_not_empty(claims, "gender", &user.gender);
        if let Some(birth_date) = user.birth_date {
            claims.insert(
                "birthdate".into(),
                json!(birth_date.format("%Y-%m-%d").to_string()),
            );
        }
        insert_if_not_empty(claims, "zoneinfo", &user.zone_info);
        insert_if_not_empty(claims, "locale", &user.locale);
    }

    if scope::contains(scope_str, scope::EMAIL) {
        insert_if_not_empty(claims, "email", &user.email);
        claims.insert("email_verified".into(), json!(user.email_verified));
    }

    if scope::contains(scope_str, scope::ADDRESS) && user.has_address() {
        claims.insert("address".into(), Value::Object(user.address_claim()));
    }

    if scope::contains(scope_str, scope::PHONE) {
        insert_if_not_empty(claims, "phone_number", &user.formatted_phone_number());
        claims.insert(
            "phone_number_verified".into(),
            json!(user.phone_number_verified),
        );
    }

    if scope::split(scope_str).iter().any(|s| *s != scope::OPENID) {
        claims.insert("updated_at".into(), json!(user.updated_at.timestamp()));
    }
}

/// Claims served by the userinfo endpoint for a token carrying `scope_str`.
/// Groups and attributes follow the ID-token inclusion flags.
pub fn userinfo_claims(user: &User, scope_str: &str, issuer: &str) -> Map<String, Value> {
    let mut claims = Map::new();
    claims.insert("sub".into(), json!(user.subject));
    add_open_id_connect_claims(&mut claims, user, scope_str, issuer);
    if scope::contains(scope_str, scope::GROUPS) {
        claims.insert("groups".into(), groups_claim(user, Target::Id));
    }
    if scope::contains(scope_str, scope::ATTRIBUTES) {
        claims.insert("attributes".into(), attributes_claim(user, Target::Id));
    }
    claims
}

fn groups_claim(user: &User, target: Target) -> Value {
    let groups: Vec<&str> = user
        .groups
        .iter()
        .filter(|g| match target {
            Target::Access => g.include_in_access_token,
            Target::Id => g.include_in_id_token,
        })
        .map(|g| g.group_identifier.as_str())
        .collect();
    json!(groups)
}

/// Group attributes in group order, then the user's own attributes, so a
/// user attribute overrides a group attribute with the same key.
fn attributes_claim(user: &User, target: Target) -> Value {
    let included = |include_in_access: bool, include_in_id: bool| match target {
        Target::Access => include_in_access,
        Target::Id => include_in_id,
    };

    let mut map = Map::new();
    let group_attributes = user.groups.iter().flat_map(|g| g.attributes.iter());
    for attribute in group_attributes.chain(user.attributes.iter()) {
        if included(
            attribute.include_in_access_token,
            attribute.include_in_id_token,
        ) {
            map.insert(attribute.key.clone(), json!(attribute.value));
        }
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Attribute, Group};

    #[test]
    fn openid_only_targets_the_auth_server() {
        let (aud, scope_claim) = compute_audience("openid").expect("audience");
        assert_eq!(aud, json!("authserver"));
        assert_eq!(scope_claim, "openid authserver:userinfo");
    }

    #[test]
    fn multiple_resources_become_an_array() {
        let (aud, scope_claim) =
            compute_audience("backend:read  openid offline_access crm:write backend:write")
                .expect("audience");
        assert_eq!(aud, json!(["backend", "crm", "authserver"]));
        assert_eq!(
            scope_claim,
            "backend:read openid offline_access crm:write backend:write authserver:userinfo"
        );
    }

    #[test]
    fn no_resource_means_no_token() {
        assert!(compute_audience("").is_err());
        assert!(compute_audience("offline_access").is_err());
        assert!(compute_audience("garbage").is_err());
    }

    #[test]
    fn refresh_scope_can_only_narrow() {
        let granted = "openid backend:read backend:write";
        assert_eq!(narrow_refresh_scope(granted, "").expect("keep"), granted);
        assert_eq!(
            narrow_refresh_scope(granted, "backend:read authserver:userinfo").expect("narrow"),
            "backend:read"
        );
        let err = narrow_refresh_scope(granted, "backend:delete").expect_err("widen");
        assert!(err.to_string().contains("backend:delete"));
    }

    #[test]
    fn user_attributes_override_group_attributes() {
        let mut user = User::new("sub", "a@b.c", Utc::now());
        let mut first = Group::new("first");
        first.attributes.push(Attribute::new("team", "red"));
        first.attributes.push(Attribute::new("floor", "1"));
        let mut second = Group::new("second");
        second.attributes.push(Attribute::new("team", "blue"));
        let mut hidden = Attribute::new("secret", "x");
        hidden.include_in_id_token = false;
        second.attributes.push(hidden);
        user.groups = vec![first, second];
        user.attributes.push(Attribute::new("floor", "7"));

        let claim = attributes_claim(&user, Target::Id);
        assert_eq!(claim, json!({"team": "blue", "floor": "7"}));
        let claim = attributes_claim(&user, Target::Access);
        assert_eq!(claim["secret"], json!("x"));
    }
}
