// src/presentation/http/controllers/discovery.rs
use crate::{
    domain::scope,
    presentation::http::state::HttpState,
};
use axum::{Extension, Json};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
pub struct OpenIdConfiguration {
    pub issuer: String,
    pub authorization_endpoint: String,
    pub token_endpoint: String,
    pub userinfo_endpoint: String,
    pub jwks_uri: String,
    pub response_types_supported: Vec<String>,
    pub response_modes_supported: Vec<String>,
    pub grant_types_supported: Vec<String>,
    pub subject_types_supported: Vec<String>,
    pub id_token_signing_alg_values_supported: Vec<String>,
    pub token_endpoint_auth_methods_supported: Vec<String>,
    pub scopes_supported: Vec<String>,
    pub code_challenge_methods_supported: Vec<String>,
    pub claims_supported: Vec<String>,
    pub claim_types_supported: Vec<String>,
    pub request_parameter_supported: bool,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[utoipa::path(
    get,
    path = "/.well-known/openid-configuration",
    responses(
        (status = 200, description = "OpenID Connect Discovery document", body = OpenIdConfiguration),
    ),
    security([]),
    tag = "OIDC"
)]
pub async fn openid_configuration(
    Extension(state): Extension<HttpState>,
) -> Json<OpenIdConfiguration> {
    let base = state.web.base_url.trim_end_matches('/');

    let mut scopes_supported = strings(&scope::OIDC_SCOPES);
    scopes_supported.push(scope::OFFLINE_ACCESS.to_string());

    Json(OpenIdConfiguration {
        issuer: state.web.issuer.clone(),
        authorization_endpoint: format!("{base}/auth/authorize"),
        token_endpoint: format!("{base}/auth/token"),
        userinfo_endpoint: format!("{base}/userinfo"),
        jwks_uri: format!("{base}/certs"),
        response_types_supported: strings(&["code"]),
        response_modes_supported: strings(&["query", "fragment", "form_post"]),
        grant_types_supported: strings(&[
            "authorization_code",
            "client_credentials",
            "refresh_token",
        ]),
        subject_types_supported: strings(&["public"]),
        id_token_signing_alg_values_supported: strings(&["RS256"]),
        token_endpoint_auth_methods_supported: strings(&[
            "client_secret_post",
            "client_secret_basic",
        ]),
        scopes_supported,
        code_challenge_methods_supported: strings(&["S256"]),
        claims_supported: strings(&[
            "iss", "sub", "aud", "exp", "iat", "auth_time", "acr", "amr", "sid", "nonce",
            "name", "given_name", "middle_name", "family_name", "nickname",
            "preferred_username", "profile", "website", "gender", "birthdate", "zoneinfo",
            "locale", "updated_at", "email", "email_verified", "address", "phone_number",
            "phone_number_verified", "groups", "attributes",
        ]),
        claim_types_supported: strings(&["normal"]),
        request_parameter_supported: false,
    })
}
