use authserver_core::{
    application::{crypto::hash_string, ports::database::Database},
    domain::{Attribute, Client, Group, Settings, ThreeStateSetting},
};
use serde_json::json;

mod support;

#[tokio::test]
async fn auth_code_is_persisted_by_hash_only() {
    let world = support::world();
    let code = world.issue_code("openid", "sid-1").await;

    assert_eq!(code.code.len(), 32 + 96);
    assert_eq!(code.code_hash, hash_string(&code.code));
    assert_eq!(code.response_mode, "query");
    assert!(!code.used);

    let stored = world
        .db
        .get_code_by_code_hash(&hash_string(&code.code))
        .await
        .expect("lookup")
        .expect("stored code");
    assert_eq!(stored.id, code.id);
    assert!(stored.code.is_empty());
    assert_eq!(stored.client_id, world.client.id);
    assert_eq!(stored.user_id, world.user.id);

    assert!(world.db.mark_code_used(code.id).expect("mark"));
    assert!(!world.db.mark_code_used(code.id).expect("mark again"));
}

#[tokio::test]
async fn consented_scope_replaces_requested_scope() {
    let world = support::world();
    let mut input = world.code_input("openid  profile backend:write", "sid-1");
    input.consented_scope = "openid backend:write".into();
    input.response_mode = "form_post".into();

    let code = world
        .services
        .code_issuer
        .create_auth_code(input)
        .await
        .expect("code");
    assert_eq!(code.scope, "openid backend:write");
    assert_eq!(code.response_mode, "form_post");
}

#[tokio::test]
async fn openid_only_request_targets_the_auth_server() {
    let world = support::world();
    let session = world.start_session().await;
    let code = world.issue_code("openid", &session.session_identifier).await;

    let response = world.tokens_for(&code).await;
    assert_eq!(response.token_type, "Bearer");
    assert_eq!(response.expires_in, 300);
    assert_eq!(response.scope, "openid authserver:userinfo");

    let access = world.parse(&response.access_token).await;
    assert_eq!(access.claims["aud"], json!("authserver"));
    assert_eq!(access.get_string_claim("scope"), "openid authserver:userinfo");
    assert_eq!(access.get_string_claim("typ"), "Bearer");
    assert_eq!(access.get_string_claim("iss"), support::ISSUER);
    assert_eq!(access.get_string_claim("sub"), support::USER_SUBJECT);
    assert_eq!(access.get_string_claim("sid"), session.session_identifier);
    assert_eq!(access.claims["amr"], json!(["pwd", "otp"]));
    assert_eq!(access.claims["exp"], json!(support::START + 300));

    let id = world.parse(&response.id_token).await;
    assert_eq!(id.claims["aud"], json!(support::CLIENT_ID));
    assert_eq!(id.get_string_claim("typ"), "ID");
    assert_eq!(id.get_string_claim("nonce"), "n-0S6_WzA2Mj");
    assert_eq!(id.get_string_claim("acr"), "urn:authserver:acr:level1");
    assert!(id.claims.get("updated_at").is_none());
}

#[tokio::test]
async fn session_claims_are_present_even_when_empty() {
    let world = support::world();
    let session = world.start_session().await;
    let mut input = world.code_input("openid", &session.session_identifier);
    input.acr_level = String::new();
    let code = world
        .services
        .code_issuer
        .create_auth_code(input)
        .await
        .expect("code");

    let response = world.tokens_for(&code).await;
    for raw in [&response.access_token, &response.id_token] {
        let token = world.parse(raw).await;
        assert_eq!(token.claims["acr"], json!(""));
        assert_eq!(token.claims["sid"], json!(session.session_identifier));
        assert!(token.claims.get("auth_time").is_some());
        assert!(token.claims.get("amr").is_some());
    }
}

#[tokio::test]
async fn resource_scopes_without_openid_issue_no_id_token() {
    let world = support::world();
    let session = world.start_session().await;
    let code = world
        .issue_code("backend:read backend:write", &session.session_identifier)
        .await;

    let response = world.tokens_for(&code).await;
    assert!(response.id_token.is_empty());
    assert!(!response.refresh_token.is_empty());

    let access = world.parse(&response.access_token).await;
    assert_eq!(access.get_audience(), vec!["backend".to_string()]);
    assert_eq!(access.get_string_claim("scope"), "backend:read backend:write");
}

#[tokio::test]
async fn token_without_audience_is_refused() {
    let world = support::world();
    let session = world.start_session().await;
    let code = world
        .issue_code("offline_access", &session.session_identifier)
        .await;

    let err = world
        .services
        .token_issuer
        .generate_token_response_for_auth_code(&world.settings, &code)
        .await
        .expect_err("empty audience");
    assert_eq!(err.detail().expect("oauth error").code, "invalid_scope");
}

#[tokio::test]
async fn profile_and_email_claims_go_to_the_id_token() {
    let world = support::world();
    let session = world.start_session().await;
    let code = world
        .issue_code("openid profile email", &session.session_identifier)
        .await;

    let response = world.tokens_for(&code).await;
    let id = world.parse(&response.id_token).await;
    assert_eq!(id.get_string_claim("name"), "Jane Doe");
    assert_eq!(id.get_string_claim("preferred_username"), "jane");
    assert_eq!(id.get_string_claim("email"), "jane@example.com");
    assert_eq!(id.get_bool_claim("email_verified"), Some(true));
    assert_eq!(
        id.get_string_claim("profile"),
        format!("{}/account/profile", support::ISSUER)
    );
    assert_eq!(id.claims["updated_at"], json!(support::START));

    let access = world.parse(&response.access_token).await;
    assert!(access.claims.get("email").is_none());
    assert!(access.claims.get("name").is_none());
}

#[tokio::test]
async fn oidc_claims_in_access_token_follow_client_override() {
    let world = support::world_with_settings(Settings {
        include_open_id_connect_claims_in_access_token: true,
        ..Settings::default()
    });
    let session = world.start_session().await;
    let code = world
        .issue_code("openid email", &session.session_identifier)
        .await;

    let access = world.parse(&world.tokens_for(&code).await.access_token).await;
    assert_eq!(access.get_string_claim("email"), "jane@example.com");

    let mut opted_out = Client::new("opted-out");
    opted_out.include_open_id_connect_claims_in_access_token = ThreeStateSetting::Off;
    opted_out.token_expiration_in_seconds = 60;
    world.db.insert_client(opted_out).expect("client");

    let mut input = world.code_input("openid email", &session.session_identifier);
    input.client_identifier = "opted-out".into();
    let code = world
        .services
        .code_issuer
        .create_auth_code(input)
        .await
        .expect("code");
    let response = world.tokens_for(&code).await;
    assert_eq!(response.expires_in, 60);
    let access = world.parse(&response.access_token).await;
    assert!(access.claims.get("email").is_none());
}

#[tokio::test]
async fn groups_and_attributes_respect_inclusion_flags() {
    let world = support::world();

    let mut staff = Group::new("staff");
    staff.include_in_access_token = false;
    let staff = world.db.insert_group(staff).expect("group");
    let admins = world.db.insert_group(Group::new("admins")).expect("group");
    world.db.add_user_to_group(world.user.id, staff.id).expect("member");
    world.db.add_user_to_group(world.user.id, admins.id).expect("member");
    world
        .db
        .add_group_attribute(admins.id, Attribute::new("team", "platform"))
        .expect("attribute");
    let mut hidden = Attribute::new("clearance", "high");
    hidden.include_in_id_token = false;
    world
        .db
        .add_user_attribute(world.user.id, hidden)
        .expect("attribute");
    world
        .db
        .add_user_attribute(world.user.id, Attribute::new("team", "identity"))
        .expect("attribute");

    let session = world.start_session().await;
    let code = world
        .issue_code("openid groups attributes", &session.session_identifier)
        .await;
    let response = world.tokens_for(&code).await;

    let id = world.parse(&response.id_token).await;
    assert_eq!(id.claims["groups"], json!(["staff", "admins"]));
    assert_eq!(id.claims["attributes"], json!({"team": "identity"}));

    let access = world.parse(&response.access_token).await;
    assert_eq!(access.claims["groups"], json!(["admins"]));
    assert_eq!(
        access.claims["attributes"],
        json!({"team": "identity", "clearance": "high"})
    );
}

#[tokio::test]
async fn online_refresh_requires_a_live_user_session() {
    let world = support::world();
    let code = world.issue_code("openid", "no-such-session").await;

    let err = world
        .services
        .token_issuer
        .generate_token_response_for_auth_code(&world.settings, &code)
        .await
        .expect_err("session missing");
    assert_eq!(err.detail().expect("oauth error").code, "invalid_grant");
}

#[tokio::test]
async fn client_credentials_issue_a_bare_access_token() {
    let world = support::world();
    let mut service = Client::new("reporting-job");
    service.authorization_code_enabled = false;
    service.client_credentials_enabled = true;
    let service = world.db.insert_client(service).expect("client");

    let response = world
        .services
        .token_issuer
        .generate_token_response_for_client_cred(&world.settings, &service, "backend:read")
        .await
        .expect("token");
    assert!(response.refresh_token.is_empty());
    assert!(response.id_token.is_empty());
    assert_eq!(response.scope, "backend:read");

    let access = world.parse(&response.access_token).await;
    assert_eq!(access.get_string_claim("sub"), "reporting-job");
    assert_eq!(access.claims["aud"], json!("backend"));

    for scope_str in ["openid backend:read", "backend:read offline_access"] {
        let err = world
            .services
            .token_issuer
            .generate_token_response_for_client_cred(&world.settings, &service, scope_str)
            .await
            .expect_err(scope_str);
        assert_eq!(err.detail().expect("oauth error").code, "invalid_scope");
    }
}

#[tokio::test]
async fn stored_settings_drive_expiry() {
    let world = support::world_with_settings(Settings {
        token_expiration_in_seconds: 900,
        ..Settings::default()
    });
    let settings = world.services.settings().await.expect("settings");
    assert_eq!(settings.issuer, support::ISSUER);

    let session = world.start_session().await;
    let code = world.issue_code("backend:read", &session.session_identifier).await;
    let response = world
        .services
        .token_issuer
        .generate_token_response_for_auth_code(&settings, &code)
        .await
        .expect("tokens");
    assert_eq!(response.expires_in, 900);
}
