use axum::Json;
use axum::http::{HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

use warden_auth::{AuthOutcome, SessionDirective};

use crate::app::cookies;

pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(json!({ "error": message.into() }))).into_response()
}

/// Render an orchestrator decision as an HTTP response.
pub fn outcome_to_response(outcome: AuthOutcome) -> Response {
    match outcome {
        AuthOutcome::Redirect { location, session } => redirect(location, session),
        AuthOutcome::Json(body) => (StatusCode::OK, Json(body)).into_response(),
        AuthOutcome::Unauthorized { error } => json_error(StatusCode::UNAUTHORIZED, error),
    }
}

fn redirect(location: String, session: SessionDirective) -> Response {
    let Ok(location) = HeaderValue::try_from(location) else {
        error!("redirect target is not a valid header value");
        return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Invalid redirect");
    };

    let mut response = StatusCode::FOUND.into_response();
    let headers = response.headers_mut();
    headers.insert(header::LOCATION, location);

    let cookie = match session {
        SessionDirective::Keep => None,
        SessionDirective::Establish(id) => Some(cookies::establish(&id)),
        SessionDirective::Clear => Some(cookies::clear()),
    };
    if let Some(cookie) = cookie.and_then(|c| HeaderValue::try_from(c).ok()) {
        headers.insert(header::SET_COOKIE, cookie);
    }

    response
}

#[cfg(test)]
mod tests {
    use warden_auth::AuthBody;
    use warden_core::SessionId;

    use super::*;

    #[test]
    fn establish_redirect_sets_location_and_cookie() {
        let id = SessionId::generate();
        let res = outcome_to_response(AuthOutcome::Redirect {
            location: "/settings".to_string(),
            session: SessionDirective::Establish(id.clone()),
        });

        assert_eq!(res.status(), StatusCode::FOUND);
        assert_eq!(res.headers()[header::LOCATION], "/settings");
        let cookie = res.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with(&format!("warden_sid={id};")));
        assert!(cookie.contains("HttpOnly"));
    }

    #[test]
    fn keep_redirect_sets_no_cookie() {
        let res = outcome_to_response(AuthOutcome::Redirect {
            location: "/".to_string(),
            session: SessionDirective::Keep,
        });
        assert!(res.headers().get(header::SET_COOKIE).is_none());
    }

    #[test]
    fn unauthorized_and_json_statuses() {
        let res = outcome_to_response(AuthOutcome::Unauthorized {
            error: "Not authenticated",
        });
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = outcome_to_response(AuthOutcome::Json(AuthBody::Refreshed { ok: true }));
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[test]
    fn unencodable_location_is_a_server_error() {
        let res = outcome_to_response(AuthOutcome::Redirect {
            location: "/a\nb".to_string(),
            session: SessionDirective::Keep,
        });
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
