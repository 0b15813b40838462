// src/domain/scope.rs
//! Scope vocabulary shared by the validator, the issuer and the middleware.

pub const AUTH_SERVER_RESOURCE_IDENTIFIER: &str = "authserver";
pub const USERINFO_PERMISSION_IDENTIFIER: &str = "userinfo";
pub const MANAGE_ACCOUNT_PERMISSION_IDENTIFIER: &str = "manage-account";
pub const ADMIN_WEBSITE_PERMISSION_IDENTIFIER: &str = "admin-website";

pub const USERINFO_SCOPE: &str = "authserver:userinfo";
pub const MANAGE_ACCOUNT_SCOPE: &str = "authserver:manage-account";

pub const OPENID: &str = "openid";
pub const PROFILE: &str = "profile";
pub const EMAIL: &str = "email";
pub const ADDRESS: &str = "address";
pub const PHONE: &str = "phone";
pub const GROUPS: &str = "groups";
pub const ATTRIBUTES: &str = "attributes";
pub const OFFLINE_ACCESS: &str = "offline_access";

pub const OIDC_SCOPES: [&str; 7] = [OPENID, PROFILE, EMAIL, ADDRESS, PHONE, GROUPS, ATTRIBUTES];

pub fn is_oidc_scope(scope: &str) -> bool {
    OIDC_SCOPES.contains(&scope)
}

pub fn is_offline_access_scope(scope: &str) -> bool {
    scope == OFFLINE_ACCESS
}

/// Collapses runs of whitespace into single spaces and trims the ends.
pub fn normalize(scope: &str) -> String {
    scope.split_whitespace().collect::<Vec<_>>().join(" ")
}

pub fn split(scope: &str) -> Vec<&str> {
    scope.split_whitespace().collect()
}

pub fn contains(scope: &str, wanted: &str) -> bool {
    scope.split_whitespace().any(|s| s == wanted)
}

/// `resource:permission`, with exactly one colon and both halves non-empty.
pub fn parse_resource_permission(scope: &str) -> Option<(&str, &str)> {
    let mut parts = scope.split(':');
    let resource = parts.next()?;
    let permission = parts.next()?;
    if parts.next().is_some() || resource.is_empty() || permission.is_empty() {
        return None;
    }
    Some((resource, permission))
}
