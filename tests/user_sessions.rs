use authserver_core::application::{
    dto::RequestContext,
    ports::{
        database::Database,
        session::{SESSION_KEY_SESSION_IDENTIFIER, SessionData, SessionHandle},
    },
    services::user_session_manager::StartUserSessionInput,
};
use chrono::Duration;

mod support;

#[tokio::test]
async fn new_session_is_fingerprinted_and_stored_in_the_cookie() {
    let world = support::world();
    let cookie = SessionHandle::new("cookie", SessionData::new(), true);

    let session = world
        .services
        .user_sessions
        .start_new_user_session(
            &world.request(),
            &cookie,
            StartUserSessionInput {
                user_id: world.user.id,
                client_id: world.client.id,
                auth_methods: "pwd".into(),
                acr_level: "urn:authserver:acr:level1".into(),
            },
        )
        .await
        .expect("session");

    assert_eq!(session.ip_address, "10.0.0.5");
    assert_eq!(session.device_name, "Firefox 120");
    assert_eq!(session.device_type, "computer");
    assert_eq!(session.device_os, "Linux");
    assert_eq!(session.started.timestamp(), support::START);
    assert_eq!(session.clients.len(), 1);
    assert_eq!(session.clients[0].client_id, world.client.id);
    assert_eq!(
        cookie.get(SESSION_KEY_SESSION_IDENTIFIER).as_deref(),
        Some(session.session_identifier.as_str())
    );
    assert!(cookie.is_changed());

    let mut stored = world
        .db
        .get_user_session_by_session_identifier(&session.session_identifier)
        .await
        .expect("lookup")
        .expect("persisted");
    world
        .db
        .user_session_load_clients(&mut stored)
        .await
        .expect("clients");
    assert_eq!(stored.clients.len(), 1);
}

#[tokio::test]
async fn same_device_login_evicts_the_previous_session() {
    let world = support::world();
    let first = world.start_session().await;
    world.clock.advance(Duration::minutes(5));
    let second = world.start_session().await;

    assert!(
        world
            .db
            .get_user_session_by_session_identifier(&first.session_identifier)
            .await
            .expect("lookup")
            .is_none()
    );
    let remaining = world
        .db
        .get_user_sessions_by_user_id(world.user.id)
        .await
        .expect("sessions");
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].session_identifier, second.session_identifier);
}

#[tokio::test]
async fn other_devices_keep_their_sessions() {
    let world = support::world();
    let desktop = world.start_session().await;
    let phone = world
        .start_session_from(&RequestContext::new("10.0.0.5", support::CHROME_ANDROID))
        .await;
    let elsewhere = world
        .start_session_from(&RequestContext::new("172.16.0.9", support::FIREFOX_LINUX))
        .await;

    assert_eq!(phone.device_type, "mobile");
    assert_eq!(phone.device_os, "Android");

    let sessions = world
        .db
        .get_user_sessions_by_user_id(world.user.id)
        .await
        .expect("sessions");
    let identifiers: Vec<&str> = sessions
        .iter()
        .map(|s| s.session_identifier.as_str())
        .collect();
    assert_eq!(sessions.len(), 3);
    for kept in [&desktop, &phone, &elsewhere] {
        assert!(identifiers.contains(&kept.session_identifier.as_str()));
    }
}

#[tokio::test]
async fn bump_advances_activity_and_attaches_new_clients() {
    let world = support::world();
    let session = world.start_session().await;

    world.clock.advance(Duration::minutes(10));
    let bumped = world
        .services
        .user_sessions
        .bump_user_session(
            &RequestContext::new("192.168.1.9:443", support::FIREFOX_LINUX),
            &session.session_identifier,
            world.admin_client.id,
        )
        .await
        .expect("bumped");

    assert_eq!(bumped.last_accessed.timestamp(), support::START + 600);
    assert_eq!(bumped.ip_address, "10.0.0.5,192.168.1.9");
    assert_eq!(bumped.clients.len(), 2);

    let mut stored = world
        .db
        .get_user_session_by_session_identifier(&session.session_identifier)
        .await
        .expect("lookup")
        .expect("persisted");
    world
        .db
        .user_session_load_clients(&mut stored)
        .await
        .expect("clients");
    assert_eq!(stored.last_accessed, bumped.last_accessed);
    assert_eq!(stored.ip_address, bumped.ip_address);
    assert_eq!(stored.clients.len(), 2);
    let admin = stored
        .clients
        .iter()
        .find(|c| c.client_id == world.admin_client.id)
        .expect("admin client attached");
    assert_ne!(admin.id, 0);
    assert_eq!(admin.started.timestamp(), support::START + 600);

    world.clock.advance(Duration::minutes(10));
    let again = world
        .services
        .user_sessions
        .bump_user_session(&world.request(), &session.session_identifier, world.client.id)
        .await
        .expect("bumped again");
    assert_eq!(again.clients.len(), 2);
    assert_eq!(again.ip_address, "10.0.0.5,192.168.1.9");
}

#[tokio::test]
async fn bumping_an_unknown_session_is_not_found() {
    let world = support::world();
    let err = world
        .services
        .user_sessions
        .bump_user_session(&world.request(), "missing", world.client.id)
        .await
        .expect_err("unknown session");
    let detail = err.detail().expect("oauth error");
    assert_eq!(detail.code, "invalid_session");
    assert_eq!(detail.http_status, Some(404));
}

#[tokio::test]
async fn validity_tracks_idle_timeout_lifetime_and_max_age() {
    let world = support::world();
    let manager = &world.services.user_sessions;
    let settings = &world.settings;

    assert!(!manager.has_valid_user_session(settings, None, None));

    let session = world.start_session().await;
    assert!(manager.has_valid_user_session(settings, Some(&session), None));

    world.clock.advance(Duration::minutes(30));
    assert!(manager.has_valid_user_session(settings, Some(&session), Some(3600)));
    assert!(!manager.has_valid_user_session(settings, Some(&session), Some(600)));

    world.clock.advance(Duration::hours(2));
    assert!(!manager.has_valid_user_session(settings, Some(&session), None));
}
