//! Process-wide admin-session cache with TTL-based expiration.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tracing::debug;

use crate::clock::Clock;
use crate::models::auth::AdminSession;

/// Key prefix for admin-session entries.
const KEY_PREFIX: &str = "admin_session:";

/// In-memory admin sessions keyed by `admin_session:<subjectId>`.
///
/// Each entry lives until its own `expires_at`; reads never return an entry
/// past that point and [`AdminSessionCache::purge_expired`] drops them.
pub struct AdminSessionCache {
    entries: DashMap<String, AdminSession>,
    clock: Arc<dyn Clock>,
}

impl AdminSessionCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            clock,
        }
    }

    /// Build the cache key for a subject.
    pub fn cache_key(subject_id: &str) -> String {
        format!("{KEY_PREFIX}{subject_id}")
    }

    /// Stored session for a subject, whether or not it has expired.
    pub fn get(&self, subject_id: &str) -> Option<AdminSession> {
        self.entries
            .get(&Self::cache_key(subject_id))
            .map(|entry| entry.value().clone())
    }

    /// Session for a subject if it is still active.
    pub fn get_active(&self, subject_id: &str) -> Option<AdminSession> {
        let now = self.clock.now();
        self.get(subject_id).filter(|s| s.is_active(now))
    }

    /// Insert a session, replacing any previous one for the same subject.
    pub fn insert(&self, session: AdminSession) {
        self.entries
            .insert(Self::cache_key(&session.subject_id), session);
    }

    /// Remove a subject's session, returning it if one was stored.
    pub fn remove(&self, subject_id: &str) -> Option<AdminSession> {
        self.entries
            .remove(&Self::cache_key(subject_id))
            .map(|(_, session)| session)
    }

    /// Remove a subject's session only if it has expired. A fresh session
    /// stored concurrently is left in place.
    pub fn remove_if_expired(&self, subject_id: &str) -> Option<AdminSession> {
        let now = self.clock.now();
        self.entries
            .remove_if(&Self::cache_key(subject_id), |_, session| {
                !session.is_active(now)
            })
            .map(|(_, session)| session)
    }

    /// Evict expired entries.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.entries.len();
        self.entries.retain(|_, session| session.is_active(now));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn a periodic sweep of expired sessions.
    pub fn spawn_cleanup_task(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                let evicted = cache.purge_expired();
                if evicted > 0 {
                    debug!(evicted, "purged expired admin sessions");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;
    use crate::clock::ManualClock;

    fn setup() -> (Arc<ManualClock>, AdminSessionCache) {
        let clock = Arc::new(ManualClock::new(
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        ));
        let cache = AdminSessionCache::new(clock.clone());
        (clock, cache)
    }

    fn session(clock: &ManualClock, subject: &str, minutes: i64) -> AdminSession {
        AdminSession::try_new(subject, clock.now(), chrono::Duration::minutes(minutes)).unwrap()
    }

    #[test]
    fn key_format_is_prefixed_subject() {
        assert_eq!(AdminSessionCache::cache_key("u1"), "admin_session:u1");
    }

    #[test]
    fn get_returns_none_for_missing_subject() {
        let (_, cache) = setup();
        assert!(cache.get("unknown").is_none());
        assert!(cache.get_active("unknown").is_none());
    }

    #[test]
    fn insert_and_get_per_subject() {
        let (clock, cache) = setup();
        cache.insert(session(&clock, "u1", 10));
        cache.insert(session(&clock, "u2", 5));
        assert_eq!(cache.get("u1").unwrap().subject_id, "u1");
        assert_eq!(cache.get("u2").unwrap().subject_id, "u2");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn insert_replaces_previous_session() {
        let (clock, cache) = setup();
        cache.insert(session(&clock, "u1", 1));
        cache.insert(session(&clock, "u1", 10));
        assert_eq!(cache.len(), 1);
        assert_eq!(
            cache.get("u1").unwrap().expires_at,
            clock.now() + chrono::Duration::minutes(10)
        );
    }

    #[test]
    fn expired_entry_is_not_active_but_still_stored() {
        let (clock, cache) = setup();
        cache.insert(session(&clock, "u1", 10));
        clock.advance(chrono::Duration::minutes(10));
        assert!(cache.get_active("u1").is_none());
        assert!(cache.get("u1").is_some());
    }

    #[test]
    fn remove_drops_entry() {
        let (clock, cache) = setup();
        cache.insert(session(&clock, "u1", 10));
        assert!(cache.remove("u1").is_some());
        assert!(cache.remove("u1").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn remove_if_expired_spares_a_live_session() {
        let (clock, cache) = setup();
        cache.insert(session(&clock, "u1", 10));
        assert!(cache.remove_if_expired("u1").is_none());
        assert!(cache.get_active("u1").is_some());

        clock.advance(chrono::Duration::minutes(10));
        assert!(cache.remove_if_expired("u1").is_some());
        assert!(cache.is_empty());
        assert!(cache.remove_if_expired("u1").is_none());
    }

    #[test]
    fn remove_if_expired_keeps_a_replacement_session() {
        let (clock, cache) = setup();
        cache.insert(session(&clock, "u1", 1));
        clock.advance(chrono::Duration::minutes(2));

        // Another request re-granted before this one got to evict.
        cache.insert(session(&clock, "u1", 10));
        assert!(cache.remove_if_expired("u1").is_none());
        assert_eq!(
            cache.get("u1").unwrap().expires_at,
            clock.now() + chrono::Duration::minutes(10)
        );
    }

    #[test]
    fn purge_expired_keeps_live_sessions() {
        let (clock, cache) = setup();
        cache.insert(session(&clock, "short", 1));
        cache.insert(session(&clock, "long", 10));
        clock.advance(chrono::Duration::minutes(2));
        assert_eq!(cache.purge_expired(), 1);
        assert!(cache.get("short").is_none());
        assert!(cache.get_active("long").is_some());
    }

    #[tokio::test]
    async fn spawn_cleanup_task_evicts_expired() {
        let (clock, cache) = setup();
        let cache = Arc::new(cache);
        cache.insert(session(&clock, "u1", 1));
        clock.advance(chrono::Duration::minutes(5));

        let handle = cache.spawn_cleanup_task(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        assert!(cache.is_empty());
    }
}
