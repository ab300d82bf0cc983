use std::collections::HashMap;
use std::time::{Duration, Instant};

use axum::http::{header, HeaderMap};
use parking_lot::Mutex;

use crate::models::emotion::HistoryEntry;

pub const SESSION_COOKIE: &str = "moodlens_session";

/// Server-side state for one logged-in browser.
#[derive(Debug, Clone)]
pub struct Session {
    pub username: String,
    pub emotion_history: Vec<HistoryEntry>,
    pub created_at: Instant,
    last_seen: Instant,
}

impl Session {
    fn new(username: String) -> Self {
        let now = Instant::now();
        Self { username, emotion_history: Vec::new(), created_at: now, last_seen: now }
    }
}

/// Sessions keyed by the opaque token held in the client cookie.
///
/// Every operation locks the map once, so a single request's read or
/// mutation of its own session is atomic. Idle sessions older than the TTL
/// are treated as absent and dropped on the next lookup or sweep.
pub struct SessionStore {
    ttl: Duration,
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl, sessions: Mutex::new(HashMap::new()) }
    }

    /// Open a session with an empty history and return its token.
    pub fn create(&self, username: &str) -> String {
        let token = uuid::Uuid::new_v4().simple().to_string();
        self.sessions.lock().insert(token.clone(), Session::new(username.to_string()));
        token
    }

    /// Run `f` against a live session, refreshing its idle timer.
    pub fn with_session<R>(&self, token: &str, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        let mut sessions = self.sessions.lock();
        let now = Instant::now();
        let expired = match sessions.get(token) {
            Some(s) => now.duration_since(s.last_seen) >= self.ttl,
            None => return None,
        };
        if expired {
            sessions.remove(token);
            return None;
        }
        let session = sessions.get_mut(token)?;
        session.last_seen = now;
        Some(f(session))
    }

    pub fn username(&self, token: &str) -> Option<String> {
        self.with_session(token, |s| s.username.clone())
    }

    pub fn history(&self, token: &str) -> Option<Vec<HistoryEntry>> {
        self.with_session(token, |s| s.emotion_history.clone())
    }

    /// Returns false when the session no longer exists.
    pub fn append_history(&self, token: &str, entry: HistoryEntry) -> bool {
        self.with_session(token, |s| s.emotion_history.push(entry)).is_some()
    }

    pub fn clear_history(&self, token: &str) -> bool {
        self.with_session(token, |s| s.emotion_history.clear()).is_some()
    }

    pub fn remove(&self, token: &str) -> Option<Session> {
        self.sessions.lock().remove(token)
    }

    /// Drop every session idle for longer than the TTL; returns how many went.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| now.duration_since(s.last_seen) < self.ttl);
        before - sessions.len()
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Pull the session token out of the request's `Cookie` headers.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
