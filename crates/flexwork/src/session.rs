//! Session-context object around the access-token cookie. Explicit
//! `login` / `current_user` / `logout` accessors on an injectable value;
//! nothing here is process-global.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, SameSite};
use rand::{distributions::Alphanumeric, thread_rng, Rng};

use crate::workflows::arrangements::StaffId;

pub const SESSION_COOKIE_NAME: &str = "flexwork_session";

const TOKEN_LENGTH: usize = 30;

/// Opaque session token issued at login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(pub String);

#[derive(Debug, Clone)]
struct SessionEntry {
    staff_id: StaffId,
    expires_at: DateTime<Utc>,
}

/// Registry of live sessions with a fixed time-to-live.
pub struct SessionContext {
    ttl: Duration,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl SessionContext {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            ttl: Duration::minutes(ttl_minutes),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Register a new session for `staff_id` and return its token. The
    /// clock is passed in so expiry is testable.
    pub fn login(&self, staff_id: StaffId, now: DateTime<Utc>) -> SessionToken {
        let token: String = thread_rng()
            .sample_iter(&Alphanumeric)
            .take(TOKEN_LENGTH)
            .map(char::from)
            .collect();

        let mut sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            token.clone(),
            SessionEntry {
                staff_id,
                expires_at: now + self.ttl,
            },
        );
        SessionToken(token)
    }

    /// Resolve a presented token to its staff member, honoring expiry.
    pub fn current_user(&self, token: &str, now: DateTime<Utc>) -> Option<StaffId> {
        let sessions = self.sessions.lock().expect("session mutex poisoned");
        sessions
            .get(token)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.staff_id)
    }

    /// Revoke a session. Returns whether a live entry was removed.
    pub fn logout(&self, token: &str) -> bool {
        self.sessions
            .lock()
            .expect("session mutex poisoned")
            .remove(token)
            .is_some()
    }

    /// HTTP-only session cookie: `SameSite=Strict`, `Secure`, scoped to the
    /// whole site, expiring with the registry entry.
    pub fn session_cookie(&self, token: &SessionToken) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, token.0.clone()))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(cookie::time::Duration::seconds(self.ttl.num_seconds()))
            .build()
    }

    /// Expired twin of the session cookie, sent on logout to clear it.
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE_NAME, ""))
            .http_only(true)
            .secure(true)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(cookie::time::Duration::ZERO)
            .build()
    }
}

/// Pull the access token out of a request: a bearer `Authorization` header
/// wins, otherwise the session cookie.
pub fn token_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    let bearer = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_owned())
        .filter(|token| !token.is_empty());
    if bearer.is_some() {
        return bearer;
    }

    headers
        .get_all(axum::http::header::COOKIE)
        .into_iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| Cookie::split_parse(value.to_owned()))
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == SESSION_COOKIE_NAME)
        .map(|cookie| cookie.value().to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};
    use chrono::TimeZone;

    fn clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 19, 9, 0, 0).unwrap()
    }

    #[test]
    fn login_then_current_user_roundtrip() {
        let sessions = SessionContext::new(60);
        let token = sessions.login(StaffId(140_001), clock());
        assert_eq!(token.0.len(), TOKEN_LENGTH);
        assert_eq!(
            sessions.current_user(&token.0, clock()),
            Some(StaffId(140_001))
        );
    }

    #[test]
    fn expired_token_resolves_to_no_user() {
        let sessions = SessionContext::new(60);
        let token = sessions.login(StaffId(140_001), clock());
        let later = clock() + Duration::minutes(61);
        assert_eq!(sessions.current_user(&token.0, later), None);
    }

    #[test]
    fn expiry_is_exclusive_at_the_boundary() {
        let sessions = SessionContext::new(60);
        let token = sessions.login(StaffId(140_001), clock());
        let boundary = clock() + Duration::minutes(60);
        assert_eq!(sessions.current_user(&token.0, boundary), None);
    }

    #[test]
    fn logout_revokes_immediately() {
        let sessions = SessionContext::new(60);
        let token = sessions.login(StaffId(140_001), clock());
        assert!(sessions.logout(&token.0));
        assert_eq!(sessions.current_user(&token.0, clock()), None);
        assert!(!sessions.logout(&token.0));
    }

    #[test]
    fn session_cookie_carries_browser_protections() {
        let sessions = SessionContext::new(60);
        let token = sessions.login(StaffId(140_001), clock());
        let rendered = sessions.session_cookie(&token).to_string();
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Strict"));
        assert!(rendered.contains("Max-Age=3600"));
        assert!(rendered.contains("Path=/"));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let sessions = SessionContext::new(60);
        let rendered = sessions.removal_cookie().to_string();
        assert!(rendered.contains("Max-Age=0"));
    }

    #[test]
    fn token_is_read_back_from_cookie_headers() {
        let sessions = SessionContext::new(60);
        let token = sessions.login(StaffId(140_001), clock());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!(
                "theme=dark; {}={}",
                SESSION_COOKIE_NAME, token.0
            ))
            .unwrap(),
        );
        assert_eq!(token_from_headers(&headers), Some(token.0));
    }

    #[test]
    fn bearer_header_wins_over_the_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer header-token"),
        );
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("{}=cookie-token", SESSION_COOKIE_NAME)).unwrap(),
        );
        assert_eq!(
            token_from_headers(&headers),
            Some("header-token".to_string())
        );
    }

    #[test]
    fn missing_cookie_yields_no_token() {
        let headers = HeaderMap::new();
        assert_eq!(token_from_headers(&headers), None);
    }
}
