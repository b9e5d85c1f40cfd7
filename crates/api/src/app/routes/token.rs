//! Stateless token routes.
//!
//! `POST /token` trades a live session for a signed token; the bearer
//! routes only ever see tokens the middleware has already verified.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;
use serde_json::{Value, json};
use tracing::{error, info};

use warden_auth::claims::{ROLE_CLAIM, SUBJECT_CLAIM, stamp_issued_at};
use warden_auth::orchestrator::{NOT_AUTHENTICATED, SESSION_ROLE_KEY};
use warden_auth::{Claims, Session};

use crate::app::{cookies, errors::json_error, services::AppServices};
use crate::context::BearerContext;

pub fn router() -> Router {
    Router::new().route("/token", post(issue))
}

/// Routes behind the bearer middleware.
pub fn bearer_router() -> Router {
    Router::new()
        .route("/token/refresh", post(refresh))
        .route("/claims", get(claims))
}

fn session_claims(session: &Session) -> Claims {
    let mut claims = Claims::new();
    if let Ok(sub) = serde_json::to_value(&session.user_id) {
        claims.insert(SUBJECT_CLAIM.to_string(), sub);
    }
    if let Some(role) = session.metadata.get(SESSION_ROLE_KEY) {
        claims.insert(ROLE_CLAIM.to_string(), role.clone());
    }
    stamp_issued_at(&mut claims, Utc::now());
    claims
}

fn token_response(token: String) -> Response {
    (StatusCode::OK, Json(json!({ "token": token }))).into_response()
}

pub async fn issue(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    let id = cookies::session_from_headers(&headers);
    let Some(session) = services.orchestrator.session(id.as_ref()) else {
        return json_error(StatusCode::UNAUTHORIZED, NOT_AUTHENTICATED);
    };

    match services.tokens.issue(&session_claims(&session)) {
        Ok(token) => {
            info!(user_id = %session.user_id, "token issued");
            token_response(token)
        }
        Err(e) => {
            error!(error = %e, "failed to issue token");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "Token issue failed")
        }
    }
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(bearer): Extension<BearerContext>,
) -> Response {
    match services.tokens.refresh(bearer.token()) {
        Ok(token) => token_response(token),
        Err(_) => json_error(StatusCode::UNAUTHORIZED, "Invalid token"),
    }
}

pub async fn claims(Extension(bearer): Extension<BearerContext>) -> Json<Value> {
    Json(Value::Object(bearer.claims().clone()))
}
