//! Client session store.
//!
//! Tracks which share tokens each client session has authenticated for.
//! Sessions are identified by the random id carried in the session cookie.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use uuid::Uuid;

#[derive(Debug)]
struct Session {
    tokens: HashSet<String>,
    last_seen: Instant,
}

/// Per-session set of authenticated share tokens.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    /// Sessions unused for this long are dropped by [`SessionStore::expire_idle`].
    idle_timeout: Option<Duration>,
}

impl SessionStore {
    /// Create an empty store whose sessions never go idle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty store dropping sessions unused for `idle_timeout`.
    pub fn with_idle_timeout(idle_timeout: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout: Some(idle_timeout),
        }
    }

    /// Generate a fresh session id.
    pub fn new_session_id() -> String {
        Uuid::new_v4().to_string()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether the session id was issued by this store and is still tracked.
    pub fn contains(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    /// Mark the session as authenticated for the token.
    pub fn authorize(&self, session_id: &str, token: &str) {
        let mut sessions = self.lock();
        let session = sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Session {
                tokens: HashSet::new(),
                last_seen: Instant::now(),
            });
        session.tokens.insert(token.to_string());
        session.last_seen = Instant::now();
    }

    /// Whether the session has authenticated for the token. A hit counts as activity.
    pub fn is_authorized(&self, session_id: &str, token: &str) -> bool {
        match self.lock().get_mut(session_id) {
            Some(session) if session.tokens.contains(token) => {
                session.last_seen = Instant::now();
                true
            }
            _ => false,
        }
    }

    /// Drop the token from every session, removing sessions left empty.
    pub fn forget_token(&self, token: &str) {
        self.lock().retain(|_, session| {
            session.tokens.remove(token);
            !session.tokens.is_empty()
        });
    }

    /// Drop sessions idle past the timeout and return how many went.
    pub fn expire_idle(&self) -> usize {
        self.expire_idle_at(Instant::now())
    }

    fn expire_idle_at(&self, now: Instant) -> usize {
        let Some(idle_timeout) = self.idle_timeout else {
            return 0;
        };
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| now.saturating_duration_since(session.last_seen) < idle_timeout);
        before - sessions.len()
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether no sessions are tracked.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorize_and_check() {
        let store = SessionStore::new();
        let session = SessionStore::new_session_id();

        assert!(!store.is_authorized(&session, "tok"));
        store.authorize(&session, "tok");
        assert!(store.is_authorized(&session, "tok"));
        assert!(store.contains(&session));
    }

    #[test]
    fn test_flags_are_per_session_and_per_token() {
        let store = SessionStore::new();
        store.authorize("alice", "tok-a");

        assert!(!store.is_authorized("bob", "tok-a"));
        assert!(!store.is_authorized("alice", "tok-b"));
    }

    #[test]
    fn test_forget_token_clears_all_sessions() {
        let store = SessionStore::new();
        store.authorize("alice", "tok-a");
        store.authorize("alice", "tok-b");
        store.authorize("bob", "tok-a");

        store.forget_token("tok-a");

        assert!(!store.is_authorized("alice", "tok-a"));
        assert!(!store.is_authorized("bob", "tok-a"));
        assert!(store.is_authorized("alice", "tok-b"));
        // bob has nothing left
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_session_ids_are_unique() {
        assert_ne!(SessionStore::new_session_id(), SessionStore::new_session_id());
    }

    #[test]
    fn test_expire_idle_drops_unused_sessions() {
        let store = SessionStore::with_idle_timeout(Duration::from_secs(600));
        store.authorize("alice", "forever");
        store.authorize("bob", "forever");

        let later = Instant::now() + Duration::from_secs(300);
        assert_eq!(store.expire_idle_at(later), 0);

        let much_later = Instant::now() + Duration::from_secs(601);
        assert_eq!(store.expire_idle_at(much_later), 2);
        assert!(store.is_empty());
        assert!(!store.is_authorized("alice", "forever"));
    }

    #[test]
    fn test_activity_keeps_session_alive() {
        let store = SessionStore::with_idle_timeout(Duration::from_secs(600));
        store.authorize("alice", "tok");
        store.authorize("bob", "tok");
        std::thread::sleep(Duration::from_millis(200));
        assert!(store.is_authorized("alice", "tok"));

        // Past bob's deadline but not alice's
        let cutoff = Instant::now() + Duration::from_secs(600) - Duration::from_millis(100);
        assert_eq!(store.expire_idle_at(cutoff), 1);
        assert!(store.contains("alice"));
        assert!(!store.contains("bob"));
    }

    #[test]
    fn test_no_idle_timeout_keeps_sessions() {
        let store = SessionStore::new();
        store.authorize("alice", "tok");
        assert_eq!(store.expire_idle_at(Instant::now() + Duration::from_secs(86_400 * 365)), 0);
        assert_eq!(store.len(), 1);
    }
}
