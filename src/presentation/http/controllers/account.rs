// src/presentation/http/controllers/account.rs
use crate::{
    application::{dto::JwtInfo, error::ApplicationError},
    presentation::http::error::{HttpError, HttpResult},
};
use axum::{Extension, Json};
use serde_json::{Map, Value};

/// Claims of the signed-in user's ID token. Mounted behind `requires_scope`.
#[utoipa::path(
    get,
    path = "/account/profile",
    responses(
        (status = 200, description = "ID token claims of the current session", body = Object),
        (status = 303, description = "Redirect to authorize or to /unauthorized"),
    ),
    tag = "Account"
)]
pub async fn profile(
    info: Option<Extension<JwtInfo>>,
) -> HttpResult<Json<Map<String, Value>>> {
    let Some(Extension(info)) = info else {
        return Err(HttpError::from_error(ApplicationError::unauthorized(
            "no signed-in session",
        )));
    };
    let claims = info
        .id_token
        .or(info.access_token)
        .map(|token| token.claims)
        .unwrap_or_default();
    Ok(Json(claims))
}
