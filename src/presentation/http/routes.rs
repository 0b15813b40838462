// src/presentation/http/routes.rs
use crate::presentation::http::state::HttpState;
use crate::presentation::http::{
    controllers::{account, certs, discovery, userinfo},
    middleware::{
        bearer_token_layer, jwt_session_handler, request_context_layer, requires_scope,
        session_layer,
    },
    openapi::{self, StatusResponse},
};
use crate::domain::scope;
use axum::{
    Extension, Router,
    body::Body,
    http::{Method, Request},
    middleware::{Next, from_fn},
    routing::get,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

const ACCOUNT_SCOPES: &[&str] = &[scope::MANAGE_ACCOUNT_SCOPE];

pub fn build_router(state: HttpState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
        .max_age(Duration::from_secs(3600));

    let account = Router::new()
        .route("/account/profile", get(account::profile))
        .route_layer(from_fn(|req: Request<Body>, next: Next| {
            requires_scope(req, next, ACCOUNT_SCOPES)
        }));

    // Layers run bottom-up: state, then request context, session, bearer
    // and finally the cookie JWT handler closest to the routes.
    Router::new()
        .merge(openapi::docs_router())
        .merge(account)
        .route("/health", get(health))
        .route(
            "/.well-known/openid-configuration",
            get(discovery::openid_configuration),
        )
        .route("/certs", get(certs::certs))
        .route("/userinfo", get(userinfo::userinfo))
        .layer(from_fn(jwt_session_handler))
        .layer(from_fn(bearer_token_layer))
        .layer(from_fn(session_layer))
        .layer(from_fn(request_context_layer))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(state))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service health check.", body = crate::presentation::http::openapi::StatusResponse)
    ),
    security([]),
    tag = "System"
)]
pub async fn health() -> axum::Json<StatusResponse> {
    axum::Json(StatusResponse {
        status: "ok".into(),
    })
}
