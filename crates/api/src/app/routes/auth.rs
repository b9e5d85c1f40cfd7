//! Cookie-session routes: login, logout, whoami, refresh.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Query},
    http::HeaderMap,
    response::Response,
    routing::{get, post},
};
use serde::Deserialize;

use warden_auth::{Credentials, LoginRequest};

use crate::app::{cookies, errors::outcome_to_response, services::AppServices};

#[derive(Debug, Default, Deserialize)]
pub struct LoginQuery {
    #[serde(rename = "returnTo")]
    pub return_to: Option<String>,
}

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/whoami", get(whoami))
        .route("/refresh", post(refresh))
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<LoginQuery>,
    headers: HeaderMap,
    Json(credentials): Json<Credentials>,
) -> Response {
    let request = LoginRequest {
        credentials,
        return_to: query.return_to,
        current_session: cookies::session_from_headers(&headers),
    };
    outcome_to_response(services.orchestrator.login(request).await)
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    let session = cookies::session_from_headers(&headers);
    outcome_to_response(services.orchestrator.logout(session.as_ref()))
}

pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    let session = cookies::session_from_headers(&headers);
    outcome_to_response(services.orchestrator.whoami(session.as_ref()).await)
}

pub async fn refresh(
    Extension(services): Extension<Arc<AppServices>>,
    headers: HeaderMap,
) -> Response {
    let session = cookies::session_from_headers(&headers);
    outcome_to_response(services.orchestrator.refresh_session(session.as_ref()))
}
