// src/presentation/http/controllers/userinfo.rs
use crate::{
    application::{error::ApplicationError, services::token_issuer::userinfo_claims},
    domain::scope,
    presentation::http::{
        error::{HttpError, HttpResult, IntoHttpResult},
        extractors::BearerToken,
        state::HttpState,
    },
};
use axum::{Extension, Json};
use serde_json::{Map, Value};
use tracing::debug;

#[utoipa::path(
    get,
    path = "/userinfo",
    responses(
        (status = 200, description = "Claims about the authenticated user", body = Object),
        (status = 401, description = "Missing or invalid bearer token", body = crate::presentation::http::error::ErrorResponse),
    ),
    tag = "OIDC"
)]
pub async fn userinfo(
    Extension(state): Extension<HttpState>,
    BearerToken(token): BearerToken,
) -> HttpResult<Json<Map<String, Value>>> {
    if !token.has_scope(scope::USERINFO_SCOPE) {
        return Err(HttpError::from_error(ApplicationError::forbidden(format!(
            "the access token does not carry the '{}' scope",
            scope::USERINFO_SCOPE
        ))));
    }

    let subject = token.get_string_claim("sub");
    let database = state.services.database();
    let mut user = database
        .get_user_by_subject(&subject)
        .await
        .into_http()?
        .filter(|u| u.enabled)
        .ok_or_else(|| {
            HttpError::from_error(ApplicationError::unauthorized(
                "the user of this token is unknown or disabled",
            ))
        })?;

    let scope_str = token.get_string_claim("scope");
    if scope::contains(&scope_str, scope::GROUPS) || scope::contains(&scope_str, scope::ATTRIBUTES) {
        database.user_load_groups(&mut user).await.into_http()?;
        database
            .groups_load_attributes(&mut user.groups)
            .await
            .into_http()?;
        database.user_load_attributes(&mut user).await.into_http()?;
    }

    debug!(subject = %subject, "userinfo served");
    Ok(Json(userinfo_claims(&user, &scope_str, &state.web.issuer)))
}
