//! The `warden_sid` session cookie.

use axum::http::{HeaderMap, header};

use warden_core::SessionId;

pub const SESSION_COOKIE: &str = "warden_sid";

const ATTRIBUTES: &str = "HttpOnly; SameSite=Lax; Path=/";

/// Session id from the request's `Cookie` headers.
///
/// A malformed value is treated as no session at all.
pub fn session_from_headers(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| SessionId::parse(value.trim()).ok())
}

pub fn establish(id: &SessionId) -> String {
    format!("{SESSION_COOKIE}={id}; {ATTRIBUTES}")
}

pub fn clear() -> String {
    format!("{SESSION_COOKIE}=; {ATTRIBUTES}; Max-Age=0")
}
