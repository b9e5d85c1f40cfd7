use chrono::{DateTime, Utc};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use warden_core::SessionId;

use super::{Session, SessionBackend};

/// Session map sharded by id; operations on different shards never contend.
#[derive(Debug, Default)]
pub struct ShardedSessionBackend {
    sessions: DashMap<SessionId, Session>,
}

impl ShardedSessionBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionBackend for ShardedSessionBackend {
    fn get(&self, id: &SessionId, now: DateTime<Utc>) -> Option<Session> {
        // The entry holds the shard's write lock across check and removal.
        match self.sessions.entry(id.clone()) {
            Entry::Occupied(entry) if entry.get().is_expired_at(now) => {
                entry.remove();
                None
            }
            Entry::Occupied(entry) => Some(entry.get().clone()),
            Entry::Vacant(_) => None,
        }
    }

    fn set(&self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    fn touch(&self, id: &SessionId, expires_at: DateTime<Utc>) -> Option<Session> {
        let mut session = self.sessions.get_mut(id)?;
        session.expires_at = expires_at;
        Some(session.clone())
    }

    fn delete(&self, id: &SessionId) -> bool {
        self.sessions.remove(id).is_some()
    }

    fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let mut evicted = 0;
        self.sessions.retain(|_, s| {
            let keep = !s.is_expired_at(now);
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    fn len(&self) -> usize {
        self.sessions.len()
    }
}
