// src/infrastructure/persistence/seed.rs
use crate::{
    application::ApplicationResult,
    domain::{Client, KeyState, RedirectUri, Settings, scope},
    infrastructure::{persistence::InMemoryDatabase, security::generate_rsa_key_pair},
};
use chrono::{DateTime, Utc};
use tracing::info;

pub struct SeedOptions<'a> {
    pub settings: Settings,
    pub admin_console_client_id: &'a str,
    pub admin_console_redirect_uri: String,
}

/// Bootstraps an empty database: settings, a current and a next signing
/// key, the authorization server's own resource, and the admin console
/// client.
pub fn seed_defaults(
    db: &InMemoryDatabase,
    options: SeedOptions<'_>,
    now: DateTime<Utc>,
) -> ApplicationResult<()> {
    db.set_settings(options.settings)?;

    let current = db.insert_key_pair(generate_rsa_key_pair(KeyState::Current, now)?)?;
    db.insert_key_pair(generate_rsa_key_pair(KeyState::Next, now)?)?;

    let resource = db.insert_resource(
        scope::AUTH_SERVER_RESOURCE_IDENTIFIER,
        "Authorization server (system-level resource)",
    )?;
    for (identifier, description) in [
        (
            scope::USERINFO_PERMISSION_IDENTIFIER,
            "Access to the OpenID Connect user info endpoint",
        ),
        (
            scope::MANAGE_ACCOUNT_PERMISSION_IDENTIFIER,
            "View and update user account data for the current user",
        ),
        (
            scope::ADMIN_WEBSITE_PERMISSION_IDENTIFIER,
            "Manage the authorization server settings via the web interface",
        ),
    ] {
        db.insert_permission(resource.id, identifier, description)?;
    }

    let mut client = Client::new(options.admin_console_client_id);
    client.description = "Admin console (system-level client)".into();
    client.consent_required = false;
    client.redirect_uris.push(RedirectUri {
        id: 0,
        client_id: 0,
        uri: options.admin_console_redirect_uri,
    });
    db.insert_client(client)?;

    info!(kid = %current.key_identifier, "seeded in-memory database");
    Ok(())
}
