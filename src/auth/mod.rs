use chrono::{DateTime, Duration, Utc};
use cookie::{Cookie, SameSite};

use crate::{
    domain::User,
    error::{AppError, Result},
};

pub mod claims;
pub mod session;

pub use session::{Session, SessionStore};

/// Name of the httpOnly cookie carrying the backend session token.
pub const SESSION_COOKIE: &str = "zc_token";

pub struct AuthService {
    session_store: SessionStore,
    session_duration_minutes: i64,
    secure_cookies: bool,
}

impl AuthService {
    pub fn new(session_duration_minutes: i64, secure_cookies: bool) -> Self {
        Self {
            session_store: SessionStore::new(),
            session_duration_minutes,
            secure_cookies,
        }
    }

    /// Session init after a successful backend login.
    ///
    /// The session ends when the backend token does, or after the
    /// configured duration for tokens that carry no expiry.
    pub async fn establish(&self, user: User, token: &str) -> Session {
        let expires_at = claims::token_expiry(token)
            .unwrap_or_else(|| Utc::now() + Duration::minutes(self.session_duration_minutes));

        let session = self.session_store.create(user, token, expires_at).await;
        tracing::info!(
            username = %session.user.username,
            role = %session.user.role,
            expires_at = %session.expires_at,
            "session established"
        );
        session
    }

    /// Session load: a token the console does not know is an expired session.
    pub async fn validate_session(&self, token: &str) -> Result<Session> {
        self.session_store
            .find_by_token(token)
            .await
            .ok_or(AppError::SessionExpired)
    }

    /// Session teardown. Safe to call from any number of concurrent requests;
    /// only the first call that finds the session logs it.
    pub async fn invalidate_session(&self, token: &str) -> bool {
        let removed = self.session_store.delete_by_token(token).await;
        if removed {
            tracing::info!("session cleared");
        }
        removed
    }

    pub async fn cleanup_expired_sessions(&self) -> u64 {
        self.session_store.cleanup_expired().await
    }

    pub fn create_session_cookie(&self, token: &str, expires_at: DateTime<Utc>) -> Cookie<'static> {
        let seconds = (expires_at - Utc::now()).num_seconds().max(0);
        Cookie::build((SESSION_COOKIE, token.to_string()))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .secure(self.secure_cookies)
            .max_age(cookie::time::Duration::seconds(seconds))
            .build()
    }

    pub fn create_logout_cookie() -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, ""))
            .path("/")
            .same_site(SameSite::Lax)
            .http_only(true)
            .max_age(cookie::time::Duration::seconds(0))
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Role;

    #[tokio::test]
    async fn test_establish_then_invalidate() {
        let auth = AuthService::new(120, false);
        let session = auth.establish(User::new("ana.lima", Role::Admin), "opaque-token").await;

        let remaining = session.expires_at - Utc::now();
        assert!(remaining > Duration::minutes(119));

        assert!(auth.validate_session("opaque-token").await.is_ok());
        assert!(auth.invalidate_session("opaque-token").await);
        assert!(!auth.invalidate_session("opaque-token").await);
        assert!(matches!(
            auth.validate_session("opaque-token").await,
            Err(AppError::SessionExpired)
        ));
    }

    #[test]
    fn test_session_cookie_flags() {
        let auth = AuthService::new(120, true);
        let cookie = auth.create_session_cookie("abc", Utc::now() + Duration::hours(1));
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }
}
