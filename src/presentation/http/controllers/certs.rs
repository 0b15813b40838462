// src/presentation/http/controllers/certs.rs
use crate::presentation::http::{
    error::{HttpResult, IntoHttpResult},
    state::HttpState,
};
use axum::{Extension, Json};
use serde_json::{Value, json};

/// JWKS with both the current and the next signing key, so relying parties
/// can cache the next key before rotation.
#[utoipa::path(
    get,
    path = "/certs",
    responses(
        (status = 200, description = "JSON Web Key Set", body = Object),
    ),
    security([]),
    tag = "OIDC"
)]
pub async fn certs(Extension(state): Extension<HttpState>) -> HttpResult<Json<Value>> {
    let keys = state
        .services
        .database()
        .get_all_signing_keys()
        .await
        .into_http()?;
    let codec = state.services.jwt_codec();

    let jwks = keys
        .iter()
        .map(|key| codec.public_jwk(key))
        .collect::<Result<Vec<_>, _>>()
        .into_http()?;

    Ok(Json(json!({ "keys": jwks })))
}
