use chrono::{DateTime, Utc};

use warden_core::SessionId;

use super::Session;

/// Concurrency-safe keyed storage for session records.
///
/// Implementations must make the expiry check and the eviction in
/// [`SessionBackend::get`] and [`SessionBackend::sweep_expired`] atomic with
/// respect to other operations on the same id, and must use
/// [`Session::is_expired_at`] as the only expiry predicate.
pub trait SessionBackend: Send + Sync {
    /// The live record for `id`. An expired record is evicted and reported
    /// as absent.
    fn get(&self, id: &SessionId, now: DateTime<Utc>) -> Option<Session>;

    /// Insert or replace a record.
    fn set(&self, session: Session);

    /// Move the expiry of an existing record, expired or not.
    fn touch(&self, id: &SessionId, expires_at: DateTime<Utc>) -> Option<Session>;

    /// Remove a record; returns whether it existed.
    fn delete(&self, id: &SessionId) -> bool;

    /// Evict every record expired at `now`; returns how many were removed.
    fn sweep_expired(&self, now: DateTime<Utc>) -> usize;

    /// Physical record count, expired-but-unswept records included.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
