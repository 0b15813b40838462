// src/presentation/http/middleware/session.rs
use crate::{
    application::{
        crypto::generate_secure_random_string,
        ports::session::{SessionData, SessionHandle},
    },
    presentation::http::state::HttpState,
};
use axum::{
    body::Body,
    http::{HeaderValue, Request, header::SET_COOKIE},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::{error, warn};

pub const SESSION_COOKIE_NAME: &str = "authserver-session";

/// Loads the cookie session before the handler and persists it afterwards.
pub async fn session_layer(mut req: Request<Body>, next: Next) -> Response {
    let Some(state) = req.extensions().get::<HttpState>().cloned() else {
        error!("application state missing");
        return next.run(req).await;
    };

    let jar = CookieJar::from_headers(req.headers());
    let existing = match jar.get(SESSION_COOKIE_NAME) {
        Some(cookie) => match state.sessions.load(cookie.value()).await {
            Ok(Some(data)) => Some((cookie.value().to_string(), data)),
            Ok(None) => None,
            Err(err) => {
                warn!(error = %err, "unable to load session; starting a new one");
                None
            }
        },
        None => None,
    };

    let handle = match existing {
        Some((id, data)) => SessionHandle::new(id, data, false),
        None => SessionHandle::new(generate_secure_random_string(48), SessionData::new(), true),
    };
    req.extensions_mut().insert(handle.clone());

    let mut response = next.run(req).await;

    if handle.is_changed() {
        if let Err(err) = state.sessions.save(&handle.id(), &handle.snapshot()).await {
            error!(error = %err, "unable to save session");
            return response;
        }
        if handle.is_new() {
            let cookie = Cookie::build((SESSION_COOKIE_NAME, handle.id()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .build();
            match HeaderValue::from_str(&cookie.to_string()) {
                Ok(value) => {
                    response.headers_mut().append(SET_COOKIE, value);
                }
                Err(err) => error!(error = %err, "unable to encode session cookie"),
            }
        }
    }

    response
}
