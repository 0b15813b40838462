// src/presentation/http/openapi.rs
use axum::{Extension, Json, Router, routing::get};
use serde::{Deserialize, Serialize};
use utoipa::openapi::{
    Components,
    security::{Http, HttpAuthScheme, SecurityScheme},
    server::Server,
};
use utoipa::{Modify, OpenApi, ToSchema};

use super::state::HttpState;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
}

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::http::controllers::discovery::openid_configuration,
        crate::presentation::http::controllers::certs::certs,
        crate::presentation::http::controllers::userinfo::userinfo,
        crate::presentation::http::controllers::account::profile,
        super::routes::health
    ),
    components(
        schemas(
            StatusResponse,
            crate::presentation::http::error::ErrorResponse,
            crate::presentation::http::controllers::discovery::OpenIdConfiguration,
            crate::application::dto::TokenResponse
        )
    ),
    tags(
        (name = "OIDC", description = "Discovery, key set and user info"),
        (name = "Account", description = "Endpoints for the signed-in user"),
        (name = "System", description = "System level endpoints")
    ),
    modifiers(&ApiDocCustomizer),
    security(("bearerAuth" = [])),
    info(
        title = "Authorization Server API",
        description = "OAuth2 / OpenID Connect authorization server",
        version = "0.1.0"
    )
)]
pub struct ApiDoc;

struct ApiDocCustomizer;

impl Modify for ApiDocCustomizer {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Components::default);
        let mut http = Http::new(HttpAuthScheme::Bearer);
        http.bearer_format = Some("JWT".into());
        components.add_security_scheme("bearerAuth", SecurityScheme::Http(http));
    }
}

/// The document with the deployment's base URL as its only server.
pub async fn serve_openapi(Extension(state): Extension<HttpState>) -> Json<utoipa::openapi::OpenApi> {
    let mut doc = ApiDoc::openapi();
    doc.servers = Some(vec![Server::new(state.web.base_url.clone())]);
    Json(doc)
}

pub fn docs_router() -> Router {
    Router::new().route("/openapi.json", get(serve_openapi))
}
