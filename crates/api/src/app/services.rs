//! Service wiring: session store, orchestrator and token codec.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use warden_auth::{
    AuthOrchestrator, AuthService, SessionStore, ShardedSessionBackend, TokenCodec, TokenError,
    WardenConfig,
};
use warden_core::SystemClock;

use crate::upstream::{HttpAuthService, UpstreamError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("token codec: {0}")]
    Token(#[from] TokenError),

    #[error("upstream auth service: {0}")]
    Upstream(#[from] UpstreamError),
}

pub struct AppServices {
    pub orchestrator: AuthOrchestrator<ShardedSessionBackend>,
    pub tokens: Arc<TokenCodec>,
}

impl AppServices {
    /// Production wiring: the auth service is reached over HTTP.
    pub fn from_config(config: &WardenConfig) -> Result<Self, StartupError> {
        let upstream = HttpAuthService::new(&config.auth_upstream, config.auth_timeout)?;
        info!(upstream = %config.auth_upstream, "using http auth service");
        Self::new(config, Arc::new(upstream))
    }

    pub fn new(config: &WardenConfig, service: Arc<dyn AuthService>) -> Result<Self, StartupError> {
        let tokens = Arc::new(TokenCodec::with_config(
            &config.token_secret,
            config.token_codec_config(),
        )?);

        let sessions = Arc::new(SessionStore::with_backend(
            ShardedSessionBackend::new(),
            config.session_config(),
            Arc::new(SystemClock),
        ));

        let orchestrator = AuthOrchestrator::new(
            service,
            sessions,
            config.redirect_policy(),
            config.orchestrator_config(),
        );

        Ok(Self {
            orchestrator,
            tokens,
        })
    }
}
