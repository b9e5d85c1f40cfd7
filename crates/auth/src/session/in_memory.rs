use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use warden_core::SessionId;

use super::{Session, SessionBackend};

/// Session map behind a single mutex.
#[derive(Debug, Default)]
pub struct InMemorySessionBackend {
    sessions: Mutex<HashMap<SessionId, Session>>,
}

impl InMemorySessionBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Session>> {
        // A panic while holding the lock cannot leave a record half-written:
        // every mutation is a single map operation.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl SessionBackend for InMemorySessionBackend {
    fn get(&self, id: &SessionId, now: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self.sessions();
        let expired = sessions.get(id)?.is_expired_at(now);
        if expired {
            sessions.remove(id);
            return None;
        }
        sessions.get(id).cloned()
    }

    fn set(&self, session: Session) {
        self.sessions().insert(session.id.clone(), session);
    }

    fn touch(&self, id: &SessionId, expires_at: DateTime<Utc>) -> Option<Session> {
        let mut sessions = self.sessions();
        let session = sessions.get_mut(id)?;
        session.expires_at = expires_at;
        Some(session.clone())
    }

    fn delete(&self, id: &SessionId) -> bool {
        self.sessions().remove(id).is_some()
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired_at(now));
        before - sessions.len()
    }

    fn len(&self) -> usize {
        self.sessions().len()
    }
}
