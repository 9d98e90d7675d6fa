// ABOUTME: Session management with HttpOnly cookies carrying an opaque server-side session id
// ABOUTME: Sessions hold only the principal id; role and block state are resolved per request

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

pub const SESSION_COOKIE_NAME: &str = "smart_hosting_session";
pub const DEFAULT_SESSION_MAX_AGE: i64 = 24 * 60 * 60; // 24 hours

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: Uuid,
    pub created_at: i64,
}

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<String, SessionData>>>,
    max_age_seconds: i64,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new(DEFAULT_SESSION_MAX_AGE)
    }
}

impl SessionStore {
    pub fn new(max_age_seconds: i64) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            max_age_seconds,
        }
    }

    pub fn max_age_seconds(&self) -> i64 {
        self.max_age_seconds
    }

    pub fn create_session(&self, user_id: Uuid) -> String {
        let session_id = Uuid::new_v4().to_string();
        let session_data = SessionData {
            user_id,
            created_at: chrono::Utc::now().timestamp(),
        };

        if let Ok(mut sessions) = self.sessions.write() {
            sessions.insert(session_id.clone(), session_data);
        }

        session_id
    }

    /// Expired sessions are treated as absent even before cleanup runs.
    pub fn get_session(&self, session_id: &str) -> Option<SessionData> {
        let cutoff = chrono::Utc::now().timestamp() - self.max_age_seconds;
        let sessions = self.sessions.read().ok()?;
        sessions
            .get(session_id)
            .filter(|session| session.created_at > cutoff)
            .cloned()
    }

    pub fn remove_session(&self, session_id: &str) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.remove(session_id);
        }
    }

    /// Drop every session belonging to a principal, e.g. after deletion.
    pub fn remove_user_sessions(&self, user_id: Uuid) {
        if let Ok(mut sessions) = self.sessions.write() {
            sessions.retain(|_, session| session.user_id != user_id);
        }
    }

    pub fn cleanup_expired_sessions(&self) -> usize {
        let cutoff = chrono::Utc::now().timestamp() - self.max_age_seconds;

        match self.sessions.write() {
            Ok(mut sessions) => {
                let before = sessions.len();
                sessions.retain(|_, session| session.created_at > cutoff);
                before - sessions.len()
            }
            Err(_) => 0,
        }
    }
}

pub fn create_session_cookie(session_id: String, secure: bool, max_age: i64) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, session_id))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(max_age))
        .path("/")
        .build()
}

pub fn create_logout_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE_NAME, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Strict)
        .max_age(time::Duration::seconds(0))
        .path("/")
        .build()
}

/// The live session referenced by the request cookie, if any.
pub fn session_from_jar(jar: &CookieJar, session_store: &SessionStore) -> Option<SessionData> {
    let cookie = jar.get(SESSION_COOKIE_NAME)?;
    session_store.get_session(cookie.value())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sessions_expire() {
        let store = SessionStore::new(60);
        let user = Uuid::new_v4();
        let id = store.create_session(user);
        assert_eq!(store.get_session(&id).map(|s| s.user_id), Some(user));

        let expired = SessionStore::new(-1);
        let id = expired.create_session(user);
        assert!(expired.get_session(&id).is_none());
        assert_eq!(expired.cleanup_expired_sessions(), 1);
    }

    #[test]
    fn removing_user_sessions_leaves_others() {
        let store = SessionStore::default();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let a1 = store.create_session(a);
        let a2 = store.create_session(a);
        let b1 = store.create_session(b);

        store.remove_user_sessions(a);
        assert!(store.get_session(&a1).is_none());
        assert!(store.get_session(&a2).is_none());
        assert!(store.get_session(&b1).is_some());
    }

    #[test]
    fn cookie_flags() {
        let cookie = create_session_cookie("abc".into(), true, 3600);
        assert_eq!(cookie.name(), SESSION_COOKIE_NAME);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }
}
