//! [`AuthService`] backed by an external identity service over HTTP.
//!
//! - `POST {base}/authenticate` with `{username, password}`: 200 + user, or 401.
//! - `GET {base}/users/{id}`: 200 + user, or 404.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use warden_auth::{AuthService, AuthServiceError, User};
use warden_core::UserId;

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("invalid upstream url '{0}'")]
    InvalidUrl(String),

    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone)]
pub struct HttpAuthService {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAuthService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, UpstreamError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| UpstreamError::InvalidUrl(base_url.to_string()))?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn read_user(
        response: reqwest::Response,
        absent: StatusCode,
    ) -> Result<Option<User>, AuthServiceError> {
        match response.status() {
            StatusCode::OK => response
                .json::<User>()
                .await
                .map(Some)
                .map_err(|e| AuthServiceError::InvalidResponse(e.to_string())),
            status if status == absent => Ok(None),
            status => Err(AuthServiceError::InvalidResponse(format!(
                "unexpected status {status}"
            ))),
        }
    }
}

fn unavailable(e: reqwest::Error) -> AuthServiceError {
    AuthServiceError::Unavailable(e.to_string())
}

#[async_trait]
impl AuthService for HttpAuthService {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AuthServiceError> {
        let url = self.endpoint(&["authenticate"]);
        debug!(%url, username, "authenticating against upstream");
        let response = self
            .client
            .post(url)
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .map_err(unavailable)?;
        Self::read_user(response, StatusCode::UNAUTHORIZED).await
    }

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, AuthServiceError> {
        let id = id.to_string();
        let response = self
            .client
            .get(self.endpoint(&["users", id.as_str()]))
            .send()
            .await
            .map_err(unavailable)?;
        Self::read_user(response, StatusCode::NOT_FOUND).await
    }
}
