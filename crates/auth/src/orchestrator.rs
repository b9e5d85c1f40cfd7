//! Login / logout / whoami / refresh on top of the session store.
//!
//! The orchestrator is transport-agnostic: it takes explicit request
//! records and returns an [`AuthOutcome`] describing what the transport
//! should do (redirect, JSON body, 401). It holds no lock across the
//! external service calls, and every such call is bounded by a timeout.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, warn};

use warden_core::{SessionId, UserId};

use crate::redirect::{LOGIN_LOCATION, RedirectPolicy};
use crate::session::{InMemorySessionBackend, Session, SessionBackend, SessionStore};
use crate::{Role, User};

pub const INVALID_CREDENTIALS: &str = "Invalid credentials";
pub const NOT_AUTHENTICATED: &str = "Not authenticated";

/// Session metadata key holding the role captured at login.
pub const SESSION_ROLE_KEY: &str = "role";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthServiceError {
    #[error("auth service unavailable: {0}")]
    Unavailable(String),

    #[error("auth service returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// The external identity service (credential check + user directory).
#[async_trait]
pub trait AuthService: Send + Sync {
    async fn authenticate(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, AuthServiceError>;

    async fn get_user(&self, id: &UserId) -> Result<Option<User>, AuthServiceError>;
}

#[derive(Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl core::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct LoginRequest {
    pub credentials: Credentials,
    /// Requested post-login destination (`returnTo`).
    pub return_to: Option<String>,
    /// Session the user agent already holds, if any. It is replaced.
    pub current_session: Option<SessionId>,
}

/// What the transport should do with the client's session handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionDirective {
    Keep,
    Establish(SessionId),
    Clear,
}

/// Reduced user projection returned by whoami.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmI {
    pub id: UserId,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum AuthBody {
    WhoAmI(WhoAmI),
    Refreshed { ok: bool },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Redirect {
        location: String,
        session: SessionDirective,
    },
    Json(AuthBody),
    Unauthorized {
        error: &'static str,
    },
}

impl AuthOutcome {
    fn unauthorized(error: &'static str) -> Self {
        Self::Unauthorized { error }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// Upper bound for each call into the [`AuthService`].
    pub service_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            service_timeout: Duration::from_secs(5),
        }
    }
}

pub struct AuthOrchestrator<B: SessionBackend = InMemorySessionBackend> {
    service: Arc<dyn AuthService>,
    sessions: Arc<SessionStore<B>>,
    redirects: RedirectPolicy,
    config: OrchestratorConfig,
}

impl<B: SessionBackend> AuthOrchestrator<B> {
    pub fn new(
        service: Arc<dyn AuthService>,
        sessions: Arc<SessionStore<B>>,
        redirects: RedirectPolicy,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            service,
            sessions,
            redirects,
            config,
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore<B>> {
        &self.sessions
    }

    /// The live session behind `id`, if any.
    pub fn session(&self, id: Option<&SessionId>) -> Option<Session> {
        id.and_then(|id| self.sessions.get(id))
    }

    /// Check credentials, start a session and pick a safe redirect.
    pub async fn login(&self, request: LoginRequest) -> AuthOutcome {
        let LoginRequest {
            credentials,
            return_to,
            current_session,
        } = request;

        let authenticated = self
            .call(
                "authenticate",
                self.service
                    .authenticate(&credentials.username, &credentials.password),
            )
            .await;
        let Some(user) = authenticated else {
            info!("login rejected");
            return AuthOutcome::unauthorized(INVALID_CREDENTIALS);
        };

        if let Some(previous) = current_session {
            self.sessions.destroy(&previous);
        }

        let mut metadata = Map::new();
        metadata.insert(
            SESSION_ROLE_KEY.to_string(),
            Value::String(user.role.as_str().to_string()),
        );
        let id = self.sessions.create(user.id.clone(), metadata);
        let location = self.redirects.resolve(return_to.as_deref());

        info!(user_id = %user.id, session = id.short(), %location, "login succeeded");
        AuthOutcome::Redirect {
            location,
            session: SessionDirective::Establish(id),
        }
    }

    /// Always lands on the login page, session or not.
    pub fn logout(&self, session: Option<&SessionId>) -> AuthOutcome {
        if let Some(id) = session {
            if self.sessions.destroy(id) {
                info!(session = id.short(), "logout");
            }
        }
        AuthOutcome::Redirect {
            location: LOGIN_LOCATION.to_string(),
            session: SessionDirective::Clear,
        }
    }

    pub async fn whoami(&self, session: Option<&SessionId>) -> AuthOutcome {
        let Some(session) = self.session(session) else {
            return AuthOutcome::unauthorized(NOT_AUTHENTICATED);
        };

        let Some(user) = self
            .call("get_user", self.service.get_user(&session.user_id))
            .await
        else {
            warn!(user_id = %session.user_id, "session refers to an unknown user");
            return AuthOutcome::unauthorized(NOT_AUTHENTICATED);
        };

        AuthOutcome::Json(AuthBody::WhoAmI(WhoAmI {
            id: user.id,
            username: user.username,
            role: user.role,
        }))
    }

    pub fn refresh_session(&self, session: Option<&SessionId>) -> AuthOutcome {
        let Some(id) = session.filter(|id| self.sessions.get(id).is_some()) else {
            return AuthOutcome::unauthorized(NOT_AUTHENTICATED);
        };
        match self.sessions.refresh(id) {
            Ok(_) => AuthOutcome::Json(AuthBody::Refreshed { ok: true }),
            // Destroyed between the check and the refresh.
            Err(_) => AuthOutcome::unauthorized(NOT_AUTHENTICATED),
        }
    }

    /// Run one service call under the timeout; failures become `None`.
    async fn call<F>(&self, op: &'static str, fut: F) -> Option<User>
    where
        F: Future<Output = Result<Option<User>, AuthServiceError>>,
    {
        match tokio::time::timeout(self.config.service_timeout, fut).await {
            Ok(Ok(user)) => user,
            Ok(Err(e)) => {
                warn!(op, error = %e, "auth service call failed");
                None
            }
            Err(_) => {
                warn!(
                    op,
                    timeout_ms = self.config.service_timeout.as_millis() as u64,
                    "auth service call timed out"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Duration as ChronoDuration;
    use warden_core::ManualClock;

    use super::*;
    use crate::session::SessionConfig;

    const BASE: &str = "https://app.example.com";

    #[derive(Default)]
    struct Directory {
        users: HashMap<String, (String, User)>,
        delay: Option<Duration>,
        broken: bool,
    }

    impl Directory {
        fn with(mut self, id: i64, username: &str, password: &str, role: Role) -> Self {
            self.users.insert(
                username.to_string(),
                (
                    password.to_string(),
                    User {
                        id: UserId::Num(id),
                        username: username.to_string(),
                        role,
                        active: true,
                    },
                ),
            );
            self
        }

        async fn pause(&self) -> Result<(), AuthServiceError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.broken {
                return Err(AuthServiceError::Unavailable("connection reset".into()));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl AuthService for Directory {
        async fn authenticate(
            &self,
            username: &str,
            password: &str,
        ) -> Result<Option<User>, AuthServiceError> {
            self.pause().await?;
            Ok(self
                .users
                .get(username)
                .filter(|(expected, _)| expected == password)
                .map(|(_, user)| user.clone()))
        }

        async fn get_user(&self, id: &UserId) -> Result<Option<User>, AuthServiceError> {
            self.pause().await?;
            Ok(self
                .users
                .values()
                .find(|(_, u)| &u.id == id)
                .map(|(_, u)| u.clone()))
        }
    }

    struct Harness {
        orchestrator: AuthOrchestrator,
        clock: Arc<ManualClock>,
    }

    fn harness_with(directory: Directory, config: OrchestratorConfig) -> Harness {
        warden_observability::tracing::init_for_tests();
        let clock = Arc::new(ManualClock::default());
        let sessions = Arc::new(SessionStore::with_backend(
            InMemorySessionBackend::new(),
            SessionConfig::default(),
            clock.clone(),
        ));
        Harness {
            orchestrator: AuthOrchestrator::new(
                Arc::new(directory),
                sessions,
                RedirectPolicy::new(BASE),
                config,
            ),
            clock,
        }
    }

    fn harness() -> Harness {
        harness_with(
            Directory::default()
                .with(1, "alice", "wonderland", Role::USER)
                .with(2, "root", "toor", Role::ADMIN),
            OrchestratorConfig::default(),
        )
    }

    fn login_request(username: &str, password: &str, return_to: Option<&str>) -> LoginRequest {
        LoginRequest {
            credentials: Credentials {
                username: username.to_string(),
                password: password.to_string(),
            },
            return_to: return_to.map(str::to_string),
            current_session: None,
        }
    }

    fn established(outcome: &AuthOutcome) -> (&str, SessionId) {
        match outcome {
            AuthOutcome::Redirect {
                location,
                session: SessionDirective::Establish(id),
            } => (location.as_str(), id.clone()),
            other => panic!("expected established session, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized_without_session() {
        let h = harness();
        let wrong_password = h
            .orchestrator
            .login(login_request("alice", "nope", Some("/profile")))
            .await;
        let unknown_user = h
            .orchestrator
            .login(login_request("mallory", "x", None))
            .await;

        assert_eq!(wrong_password, AuthOutcome::unauthorized(INVALID_CREDENTIALS));
        assert_eq!(unknown_user, wrong_password);
        assert!(h.orchestrator.sessions().is_empty());
    }

    #[tokio::test]
    async fn login_redirect_targets() {
        let h = harness();

        let evil = h
            .orchestrator
            .login(login_request("alice", "wonderland", Some("http://evil.example/steal")))
            .await;
        assert_eq!(established(&evil).0, "/dashboard");

        let profile = h
            .orchestrator
            .login(login_request("alice", "wonderland", Some("/profile")))
            .await;
        assert_eq!(established(&profile).0, "/profile");

        let settings = format!("{BASE}/settings");
        let absolute = h
            .orchestrator
            .login(login_request("alice", "wonderland", Some(&settings)))
            .await;
        assert_eq!(established(&absolute).0, settings);

        let missing = h
            .orchestrator
            .login(login_request("alice", "wonderland", None))
            .await;
        assert_eq!(established(&missing).0, "/dashboard");
    }

    #[tokio::test]
    async fn login_session_carries_user_and_role() {
        let h = harness();
        let outcome = h
            .orchestrator
            .login(login_request("root", "toor", None))
            .await;
        let (_, id) = established(&outcome);

        let session = h.orchestrator.session(Some(&id)).unwrap();
        assert_eq!(session.user_id, UserId::Num(2));
        assert_eq!(
            session.metadata.get(SESSION_ROLE_KEY),
            Some(&Value::String("admin".into()))
        );
    }

    #[tokio::test]
    async fn login_replaces_existing_session() {
        let h = harness();
        let first = h
            .orchestrator
            .login(login_request("alice", "wonderland", None))
            .await;
        let (_, old_id) = established(&first);

        let mut request = login_request("alice", "wonderland", None);
        request.current_session = Some(old_id.clone());
        let second = h.orchestrator.login(request).await;
        let (_, new_id) = established(&second);

        assert_ne!(old_id, new_id);
        assert!(h.orchestrator.session(Some(&old_id)).is_none());
        assert_eq!(h.orchestrator.sessions().len(), 1);
    }

    #[tokio::test]
    async fn logout_always_redirects_to_login() {
        let h = harness();
        let expected = AuthOutcome::Redirect {
            location: "/login".to_string(),
            session: SessionDirective::Clear,
        };

        assert_eq!(h.orchestrator.logout(None), expected);
        assert_eq!(h.orchestrator.logout(Some(&SessionId::generate())), expected);

        let outcome = h
            .orchestrator
            .login(login_request("alice", "wonderland", None))
            .await;
        let (_, id) = established(&outcome);
        assert_eq!(h.orchestrator.logout(Some(&id)), expected);
        assert!(h.orchestrator.session(Some(&id)).is_none());
    }

    #[tokio::test]
    async fn whoami_returns_projection() {
        let h = harness();
        let outcome = h
            .orchestrator
            .login(login_request("alice", "wonderland", None))
            .await;
        let (_, id) = established(&outcome);

        assert_eq!(
            h.orchestrator.whoami(Some(&id)).await,
            AuthOutcome::Json(AuthBody::WhoAmI(WhoAmI {
                id: UserId::Num(1),
                username: "alice".into(),
                role: Role::USER,
            }))
        );
    }

    #[tokio::test]
    async fn whoami_projection_serializes_three_fields() {
        let body = AuthBody::WhoAmI(WhoAmI {
            id: UserId::Num(1),
            username: "alice".into(),
            role: Role::USER,
        });
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "id": 1, "username": "alice", "role": "user" })
        );
        assert_eq!(
            serde_json::to_value(AuthBody::Refreshed { ok: true }).unwrap(),
            serde_json::json!({ "ok": true })
        );
    }

    #[tokio::test]
    async fn whoami_without_valid_session_is_unauthorized() {
        let h = harness();
        let unauthorized = AuthOutcome::unauthorized(NOT_AUTHENTICATED);
        assert_eq!(h.orchestrator.whoami(None).await, unauthorized);
        assert_eq!(
            h.orchestrator.whoami(Some(&SessionId::generate())).await,
            unauthorized
        );

        let outcome = h
            .orchestrator
            .login(login_request("alice", "wonderland", None))
            .await;
        let (_, id) = established(&outcome);
        h.clock.advance(ChronoDuration::hours(2));
        assert_eq!(h.orchestrator.whoami(Some(&id)).await, unauthorized);
    }

    #[tokio::test]
    async fn whoami_for_vanished_user_is_unauthorized() {
        let h = harness();
        let id = h
            .orchestrator
            .sessions()
            .create(UserId::Num(404), Map::new());
        assert_eq!(
            h.orchestrator.whoami(Some(&id)).await,
            AuthOutcome::unauthorized(NOT_AUTHENTICATED)
        );
    }

    #[tokio::test]
    async fn refresh_session_extends_expiry() {
        let h = harness();
        assert_eq!(
            h.orchestrator.refresh_session(None),
            AuthOutcome::unauthorized(NOT_AUTHENTICATED)
        );

        let outcome = h
            .orchestrator
            .login(login_request("alice", "wonderland", None))
            .await;
        let (_, id) = established(&outcome);

        h.clock.advance(ChronoDuration::minutes(45));
        assert_eq!(
            h.orchestrator.refresh_session(Some(&id)),
            AuthOutcome::Json(AuthBody::Refreshed { ok: true })
        );

        h.clock.advance(ChronoDuration::minutes(45));
        assert!(h.orchestrator.session(Some(&id)).is_some());
    }

    #[tokio::test]
    async fn refresh_session_does_not_revive_expired_sessions() {
        let h = harness();
        let outcome = h
            .orchestrator
            .login(login_request("alice", "wonderland", None))
            .await;
        let (_, id) = established(&outcome);

        h.clock.advance(ChronoDuration::hours(2));
        assert_eq!(
            h.orchestrator.refresh_session(Some(&id)),
            AuthOutcome::unauthorized(NOT_AUTHENTICATED)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn slow_service_times_out_as_failed_login() {
        let mut directory = Directory::default().with(1, "alice", "wonderland", Role::USER);
        directory.delay = Some(Duration::from_secs(30));
        let h = harness_with(
            directory,
            OrchestratorConfig {
                service_timeout: Duration::from_millis(100),
            },
        );

        let outcome = h
            .orchestrator
            .login(login_request("alice", "wonderland", None))
            .await;
        assert_eq!(outcome, AuthOutcome::unauthorized(INVALID_CREDENTIALS));
        assert!(h.orchestrator.sessions().is_empty());
    }

    #[tokio::test]
    async fn service_errors_fail_closed() {
        let mut directory = Directory::default().with(1, "alice", "wonderland", Role::USER);
        directory.broken = true;
        let h = harness_with(directory, OrchestratorConfig::default());

        assert_eq!(
            h.orchestrator
                .login(login_request("alice", "wonderland", None))
                .await,
            AuthOutcome::unauthorized(INVALID_CREDENTIALS)
        );

        let id = h.orchestrator.sessions().create(UserId::Num(1), Map::new());
        assert_eq!(
            h.orchestrator.whoami(Some(&id)).await,
            AuthOutcome::unauthorized(NOT_AUTHENTICATED)
        );
    }

    #[test]
    fn credentials_debug_redacts_password() {
        let creds = Credentials {
            username: "alice".into(),
            password: "wonderland".into(),
        };
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("alice"));
        assert!(!rendered.contains("wonderland"));
    }
}
