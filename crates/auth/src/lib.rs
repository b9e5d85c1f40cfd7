//! `warden-auth`: stateless tokens, TTL sessions and role-based checks.
//!
//! This crate is intentionally decoupled from HTTP. External identity data
//! comes in through the [`AuthService`] and [`UserLookup`] traits.

pub mod authorize;
pub mod claims;
pub mod config;
pub mod orchestrator;
pub mod principal;
pub mod redirect;
pub mod roles;
pub mod session;
pub mod token;

pub use authorize::{DenialKind, PermissionExplanation, RoleAuthorizer};
pub use claims::{Claims, ISSUED_AT_CLAIM};
pub use config::{ConfigError, WardenConfig};
pub use orchestrator::{
    AuthBody, AuthOrchestrator, AuthOutcome, AuthService, AuthServiceError, Credentials,
    LoginRequest, OrchestratorConfig, SessionDirective, WhoAmI,
};
pub use principal::{LookupError, Resource, User, UserLookup};
pub use redirect::RedirectPolicy;
pub use roles::{Role, RoleHierarchy};
pub use session::{
    InMemorySessionBackend, Session, SessionBackend, SessionConfig, SessionError, SessionStore,
    SessionSweeper, ShardedSessionBackend, SweeperHandle,
};
pub use token::{TokenCodec, TokenCodecConfig, TokenError};
