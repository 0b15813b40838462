// src/presentation/http/middleware/jwt.rs
//! Bearer and cookie-session authentication.

use crate::{
    application::{
        crypto::{code_challenge_s256, generate_secure_random_string},
        dto::{JwtInfo, TokenResponse},
        ports::session::{
            SESSION_KEY_CODE_VERIFIER, SESSION_KEY_JWT, SESSION_KEY_NONCE,
            SESSION_KEY_REDIRECT_BACK, SESSION_KEY_STATE, SessionHandle,
        },
    },
    domain::scope,
    presentation::http::{extractors::BearerToken, state::HttpState},
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use headers::{Authorization, HeaderMapExt, authorization::Bearer};
use tracing::{debug, error, warn};

/// Scopes every admin-console authorize request carries.
pub const MANDATORY_SCOPES: [&str; 4] = [
    scope::OPENID,
    scope::PROFILE,
    scope::EMAIL,
    scope::MANAGE_ACCOUNT_SCOPE,
];

/// Verifies `Authorization: Bearer` and exposes it as [`BearerToken`].
/// Invalid tokens are dropped and the request continues unauthenticated.
pub async fn bearer_token_layer(mut req: Request<Body>, next: Next) -> Response {
    let Some(state) = req.extensions().get::<HttpState>().cloned() else {
        return next.run(req).await;
    };

    if let Some(header) = req.headers().typed_get::<Authorization<Bearer>>() {
        match state
            .services
            .token_parser
            .decode_and_validate_token_string(header.token(), None, true)
            .await
        {
            Ok(Some(token)) => {
                req.extensions_mut().insert(BearerToken(token));
            }
            Ok(None) => {}
            Err(err) => warn!(error = %err, "ignoring invalid bearer token"),
        }
    }

    next.run(req).await
}

enum RefreshOutcome {
    Refreshed(Box<JwtInfo>),
    IssuerMismatch,
    Failed,
}

/// Parses the token response kept in the cookie session, silently refreshing
/// it when the access token no longer validates. The parsed tokens are
/// exposed as [`JwtInfo`].
pub async fn jwt_session_handler(mut req: Request<Body>, next: Next) -> Response {
    let (Some(state), Some(session)) = (
        req.extensions().get::<HttpState>().cloned(),
        req.extensions().get::<SessionHandle>().cloned(),
    ) else {
        return next.run(req).await;
    };

    if let Some(raw) = session.get(SESSION_KEY_JWT) {
        match serde_json::from_str::<TokenResponse>(&raw) {
            Ok(token_response) => {
                match state
                    .services
                    .token_parser
                    .decode_and_validate_token_response(&token_response)
                    .await
                {
                    Ok(info) => {
                        req.extensions_mut().insert(info);
                    }
                    Err(err) => {
                        debug!(error = %err, "session tokens no longer valid; refreshing");
                        match refresh_session_tokens(&state, &session, &token_response).await {
                            RefreshOutcome::Refreshed(info) => {
                                req.extensions_mut().insert(*info);
                            }
                            RefreshOutcome::IssuerMismatch => {
                                session.clear();
                                return Redirect::to("/").into_response();
                            }
                            RefreshOutcome::Failed => session.remove(SESSION_KEY_JWT),
                        }
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "discarding unreadable session tokens");
                session.remove(SESSION_KEY_JWT);
            }
        }
    }

    next.run(req).await
}

async fn refresh_session_tokens(
    state: &HttpState,
    session: &SessionHandle,
    stale: &TokenResponse,
) -> RefreshOutcome {
    if stale.refresh_token.is_empty() {
        return RefreshOutcome::Failed;
    }

    let refreshed = match state
        .token_client
        .refresh(
            &stale.refresh_token,
            &state.web.admin_console_client_id,
            &state.web.admin_console_client_secret,
        )
        .await
    {
        Ok(refreshed) => refreshed,
        Err(err) => {
            warn!(error = %err, "silent refresh failed");
            return RefreshOutcome::Failed;
        }
    };

    let info = match state
        .services
        .token_parser
        .decode_and_validate_token_response(&refreshed)
        .await
    {
        Ok(info) => info,
        Err(err) => {
            warn!(error = %err, "refreshed tokens did not validate");
            return RefreshOutcome::Failed;
        }
    };

    let issuer_matches = [&info.access_token, &info.id_token, &info.refresh_token]
        .into_iter()
        .flatten()
        .all(|token| token.get_string_claim("iss") == state.web.issuer);
    if !issuer_matches {
        warn!("refreshed tokens carry an unexpected issuer");
        return RefreshOutcome::IssuerMismatch;
    }

    match serde_json::to_string(&refreshed) {
        Ok(serialized) => session.set(SESSION_KEY_JWT, serialized),
        Err(err) => {
            error!(error = %err, "unable to serialize refreshed tokens");
            return RefreshOutcome::Failed;
        }
    }
    RefreshOutcome::Refreshed(Box::new(info))
}

/// Lets the request through when the session's access token carries any of
/// `scopes_any_of`.
///
/// Usage: `axum::middleware::from_fn(|req, next| requires_scope(req, next, &["authserver:manage-account"]))`
pub async fn requires_scope(
    req: Request<Body>,
    next: Next,
    scopes_any_of: &'static [&'static str],
) -> Response {
    let Some(state) = req.extensions().get::<HttpState>().cloned() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let info = req.extensions().get::<JwtInfo>().cloned();

    if let Some(info) = info.filter(JwtInfo::is_authenticated) {
        if scopes_any_of.iter().any(|s| info.has_scope(s)) {
            return next.run(req).await;
        }

        // Re-authorizing can only help if the user actually holds one of the
        // permissions the current token lacks.
        if !user_holds_any(&state, &info, scopes_any_of).await {
            return Redirect::to("/unauthorized").into_response();
        }
    }

    let Some(session) = req.extensions().get::<SessionHandle>().cloned() else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };
    let return_to = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".into());

    match authorize_redirect_url(&state, &session, scopes_any_of, &return_to) {
        Ok(url) => Redirect::to(&url).into_response(),
        Err(err) => {
            error!(error = %err, "unable to build authorize redirect");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn user_holds_any(state: &HttpState, info: &JwtInfo, scopes: &[&str]) -> bool {
    let Some(subject) = info
        .access_token
        .as_ref()
        .map(|t| t.get_string_claim("sub"))
    else {
        return false;
    };

    let user = match state
        .services
        .database()
        .get_user_by_subject(&subject)
        .await
    {
        Ok(Some(user)) => user,
        Ok(None) => return false,
        Err(err) => {
            warn!(error = %err, "unable to load user for permission check");
            return false;
        }
    };

    for scope_str in scopes {
        match state
            .services
            .permission_checker
            .user_has_scope_permission(user.id, scope_str)
            .await
        {
            Ok(true) => return true,
            Ok(false) => {}
            Err(err) => warn!(error = %err, scope = %scope_str, "permission check failed"),
        }
    }
    false
}

/// Sorted, de-duplicated, lower-cased union of the mandatory scopes and
/// `extra`.
pub fn authorize_scope_string(extra: &[&str]) -> String {
    let mut scopes: Vec<String> = MANDATORY_SCOPES
        .iter()
        .chain(extra.iter())
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect();
    scopes.sort();
    scopes.dedup();
    scopes.join(" ")
}

fn authorize_redirect_url(
    state: &HttpState,
    session: &SessionHandle,
    extra_scopes: &[&str],
    return_to: &str,
) -> Result<String, serde_urlencoded::ser::Error> {
    let code_verifier = generate_secure_random_string(120);
    let code_challenge = code_challenge_s256(&code_verifier);
    let auth_state = generate_secure_random_string(16);
    let nonce = generate_secure_random_string(16);
    let callback_url = state.web.callback_url();
    let scope_str = authorize_scope_string(extra_scopes);

    let query = serde_urlencoded::to_string([
        ("client_id", state.web.admin_console_client_id.as_str()),
        ("redirect_uri", callback_url.as_str()),
        ("response_mode", "form_post"),
        ("response_type", "code"),
        ("code_challenge_method", "S256"),
        ("code_challenge", code_challenge.as_str()),
        ("state", auth_state.as_str()),
        ("nonce", nonce.as_str()),
        ("scope", scope_str.as_str()),
    ])?;

    session.set(SESSION_KEY_CODE_VERIFIER, code_verifier);
    session.set(SESSION_KEY_STATE, auth_state);
    session.set(SESSION_KEY_NONCE, nonce);
    session.set(SESSION_KEY_REDIRECT_BACK, return_to);

    Ok(format!("{}?{query}", state.web.authorize_url()))
}
