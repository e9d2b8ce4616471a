//! Cookie-backed browser sessions binding a visitor to a location id.

use axum::http::{HeaderMap, header};
use hlbridge_types::{Clock, SystemClock};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "hl_session";

struct Session {
    location_id: String,
    created_at: i64,
}

/// In-memory map from session id to location id. Lost on restart.
///
/// Sessions expire `ttl` after creation; expired entries are dropped on
/// lookup and pruned whenever a new session is created.
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl,
            clock: Arc::new(SystemClock),
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Session>> {
        // The map holds plain strings; a panic mid-insert cannot leave it torn.
        self.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ttl_secs(&self) -> i64 {
        i64::try_from(self.ttl.as_secs()).unwrap_or(i64::MAX)
    }

    fn is_expired(&self, session: &Session, now: i64) -> bool {
        now.saturating_sub(session.created_at) >= self.ttl_secs()
    }

    /// Opens a new session for `location_id` and returns its id.
    pub fn create(&self, location_id: &str) -> String {
        let now = self.clock.now();
        let id = uuid::Uuid::new_v4().to_string();
        let mut sessions = self.lock();
        sessions.retain(|_, s| !self.is_expired(s, now));
        sessions.insert(
            id.clone(),
            Session {
                location_id: location_id.to_string(),
                created_at: now,
            },
        );
        id
    }

    /// Location bound to the session id, if the session exists and has not expired.
    #[must_use]
    pub fn location(&self, session_id: &str) -> Option<String> {
        let now = self.clock.now();
        let mut sessions = self.lock();
        let expired = self.is_expired(sessions.get(session_id)?, now);
        if expired {
            sessions.remove(session_id);
            return None;
        }
        sessions.get(session_id).map(|s| s.location_id.clone())
    }

    /// Resolves the location of the session carried by the request's cookies.
    #[must_use]
    pub fn location_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        session_id(headers).and_then(|id| self.location(id))
    }

    /// Number of sessions currently held, expired or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Set-Cookie` value for a freshly created session, expiring with it.
    #[must_use]
    pub fn cookie(&self, session_id: &str) -> String {
        format!(
            "{SESSION_COOKIE}={session_id}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            self.ttl.as_secs()
        )
    }
}

/// Extracts the session id from the `Cookie` headers.
#[must_use]
pub fn session_id(headers: &HeaderMap) -> Option<&str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}
