//! Process configuration from environment variables.

use std::time::Duration;

use chrono::Duration as ChronoDuration;
use thiserror::Error;
use tracing::warn;

use crate::orchestrator::OrchestratorConfig;
use crate::redirect::RedirectPolicy;
use crate::roles::{Role, RoleHierarchy, parse_levels};
use crate::session::{DEFAULT_SESSION_TTL_SECS, SessionConfig};
use crate::token::TokenCodecConfig;

pub const ENV_TOKEN_SECRET: &str = "WARDEN_TOKEN_SECRET";
pub const ENV_ALLOW_UNSIGNED_TOKENS: &str = "WARDEN_ALLOW_UNSIGNED_TOKENS";
pub const ENV_SESSION_TTL_SECS: &str = "WARDEN_SESSION_TTL_SECS";
pub const ENV_SWEEP_INTERVAL_SECS: &str = "WARDEN_SWEEP_INTERVAL_SECS";
pub const ENV_BASE_URL: &str = "WARDEN_BASE_URL";
pub const ENV_AUTH_TIMEOUT_MS: &str = "WARDEN_AUTH_TIMEOUT_MS";
pub const ENV_ROLE_LEVELS: &str = "WARDEN_ROLE_LEVELS";
pub const ENV_AUTH_UPSTREAM: &str = "WARDEN_AUTH_UPSTREAM";
pub const ENV_LISTEN_ADDR: &str = "WARDEN_LISTEN_ADDR";

const DEV_SECRET: &str = "dev-secret";

/// Ten years.
const MAX_SESSION_TTL_SECS: u64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Clone)]
pub struct WardenConfig {
    pub token_secret: String,
    pub allow_unsigned_tokens: bool,
    pub session_ttl: ChronoDuration,
    pub sweep_interval: Duration,
    pub base_url: String,
    pub auth_timeout: Duration,
    pub role_levels: Vec<(Role, i32)>,
    pub auth_upstream: String,
    pub listen_addr: String,
}

impl core::fmt::Debug for WardenConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WardenConfig")
            .field("token_secret", &"<redacted>")
            .field("allow_unsigned_tokens", &self.allow_unsigned_tokens)
            .field("session_ttl", &self.session_ttl)
            .field("sweep_interval", &self.sweep_interval)
            .field("base_url", &self.base_url)
            .field("auth_timeout", &self.auth_timeout)
            .field("role_levels", &self.role_levels)
            .field("auth_upstream", &self.auth_upstream)
            .field("listen_addr", &self.listen_addr)
            .finish()
    }
}

impl WardenConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token_secret = match lookup(ENV_TOKEN_SECRET) {
            Some(secret) if secret.is_empty() => {
                return Err(ConfigError::Invalid {
                    key: ENV_TOKEN_SECRET,
                    value: String::new(),
                });
            }
            Some(secret) => secret,
            None => {
                warn!("{ENV_TOKEN_SECRET} not set; using insecure dev default");
                DEV_SECRET.to_string()
            }
        };

        let allow_unsigned_tokens = match lookup(ENV_ALLOW_UNSIGNED_TOKENS) {
            Some(v) => parse_bool(ENV_ALLOW_UNSIGNED_TOKENS, &v)?,
            None => false,
        };

        let ttl_secs = positive(
            ENV_SESSION_TTL_SECS,
            lookup(ENV_SESSION_TTL_SECS),
            DEFAULT_SESSION_TTL_SECS as u64,
        )?;
        let session_ttl = Some(ttl_secs)
            .filter(|secs| *secs <= MAX_SESSION_TTL_SECS)
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(ChronoDuration::try_seconds)
            .ok_or_else(|| ConfigError::Invalid {
                key: ENV_SESSION_TTL_SECS,
                value: ttl_secs.to_string(),
            })?;

        let sweep_interval = Duration::from_secs(positive(
            ENV_SWEEP_INTERVAL_SECS,
            lookup(ENV_SWEEP_INTERVAL_SECS),
            60,
        )?);
        let auth_timeout = Duration::from_millis(positive(
            ENV_AUTH_TIMEOUT_MS,
            lookup(ENV_AUTH_TIMEOUT_MS),
            5_000,
        )?);

        let role_levels = match lookup(ENV_ROLE_LEVELS) {
            Some(v) => parse_levels(&v).map_err(|_| ConfigError::Invalid {
                key: ENV_ROLE_LEVELS,
                value: v.clone(),
            })?,
            None => Vec::new(),
        };

        Ok(Self {
            token_secret,
            allow_unsigned_tokens,
            session_ttl,
            sweep_interval,
            base_url: lookup(ENV_BASE_URL).unwrap_or_else(|| "http://localhost:8080".to_string()),
            auth_timeout,
            role_levels,
            auth_upstream: lookup(ENV_AUTH_UPSTREAM)
                .unwrap_or_else(|| "http://localhost:9090".to_string()),
            listen_addr: lookup(ENV_LISTEN_ADDR).unwrap_or_else(|| "0.0.0.0:8080".to_string()),
        })
    }

    pub fn token_codec_config(&self) -> TokenCodecConfig {
        TokenCodecConfig {
            allow_unsigned: self.allow_unsigned_tokens,
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            ttl: self.session_ttl,
        }
    }

    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            service_timeout: self.auth_timeout,
        }
    }

    pub fn redirect_policy(&self) -> RedirectPolicy {
        RedirectPolicy::new(self.base_url.clone())
    }

    pub fn role_hierarchy(&self) -> RoleHierarchy {
        self.role_levels
            .iter()
            .cloned()
            .fold(RoleHierarchy::default(), |h, (role, level)| h.with_role(role, level))
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

fn positive(key: &'static str, value: Option<String>, default: u64) -> Result<u64, ConfigError> {
    let Some(value) = value else {
        return Ok(default);
    };
    match value.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::Invalid { key, value }),
    }
}
