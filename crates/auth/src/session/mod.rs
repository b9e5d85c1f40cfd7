//! TTL-expiring session records.
//!
//! Expiry is enforced two ways that share one predicate
//! ([`Session::is_expired_at`]): lazily when a record is read, and actively
//! by [`SessionStore::purge_expired`] (see [`SessionSweeper`]).

mod backend;
mod in_memory;
mod sharded;
mod sweeper;

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info};

use warden_core::{Clock, SessionId, SystemClock, UserId};

pub use backend::SessionBackend;
pub use in_memory::InMemorySessionBackend;
pub use sharded::ShardedSessionBackend;
pub use sweeper::{SessionSweeper, SweeperHandle};

/// Default session lifetime.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub user_id: UserId,
    pub metadata: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is live up to and including `expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

/// Creates, reads, extends and destroys sessions on top of a backend.
pub struct SessionStore<B: SessionBackend = InMemorySessionBackend> {
    backend: B,
    config: SessionConfig,
    clock: Arc<dyn Clock>,
}

impl SessionStore<InMemorySessionBackend> {
    pub fn new(config: SessionConfig) -> Self {
        Self::with_backend(InMemorySessionBackend::new(), config, Arc::new(SystemClock))
    }
}

impl<B: SessionBackend> SessionStore<B> {
    pub fn with_backend(backend: B, config: SessionConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            backend,
            config,
            clock,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.config.ttl
    }

    /// `now + ttl`, pinned to the latest representable instant.
    fn expiry_from(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_add_signed(self.config.ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }

    /// Start a session for `user_id`; returns its fresh identifier.
    pub fn create(&self, user_id: UserId, metadata: Map<String, Value>) -> SessionId {
        let now = self.clock.now();
        let id = SessionId::generate();
        debug!(session = id.short(), %user_id, "session created");
        self.backend.set(Session {
            id: id.clone(),
            user_id,
            metadata,
            created_at: now,
            expires_at: self.expiry_from(now),
        });
        id
    }

    /// The live session for `id`. Unknown and expired look the same.
    pub fn get(&self, id: &SessionId) -> Option<Session> {
        self.backend.get(id, self.clock.now())
    }

    /// Push expiry to `now + ttl`.
    ///
    /// Only a record that was never stored (or was already evicted) is
    /// `NotFound`; an expired record that has not been evicted yet is
    /// extended.
    pub fn refresh(&self, id: &SessionId) -> Result<Session, SessionError> {
        let expires_at = self.expiry_from(self.clock.now());
        self.backend
            .touch(id, expires_at)
            .ok_or(SessionError::NotFound)
    }

    /// Returns whether the session existed.
    pub fn destroy(&self, id: &SessionId) -> bool {
        let existed = self.backend.delete(id);
        if existed {
            debug!(session = id.short(), "session destroyed");
        }
        existed
    }

    /// Evict every expired record; returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let evicted = self.backend.sweep_expired(self.clock.now());
        if evicted > 0 {
            info!(evicted, "purged expired sessions");
        }
        evicted
    }

    /// Records currently held, expired-but-unswept included.
    pub fn len(&self) -> usize {
        self.backend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.backend.is_empty()
    }
}
