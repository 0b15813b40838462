// src/presentation/http/middleware/request_context.rs
use crate::application::dto::RequestContext;
use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{HeaderMap, Request, header::USER_AGENT},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

/// Captures client IP and user agent for device fingerprinting.
pub async fn request_context_layer(mut req: Request<Body>, next: Next) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());
    let ip = extract_client_ip(req.headers())
        .or(peer)
        .unwrap_or_default();
    let user_agent = extract_user_agent(req.headers()).unwrap_or_default();

    req.extensions_mut()
        .insert(RequestContext::new(ip, user_agent));
    next.run(req).await
}

fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim().to_string())
        })
}
