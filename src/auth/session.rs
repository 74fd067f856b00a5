use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::domain::User;

/// A signed-in console session.
///
/// Created once at login and dropped at logout or on the first 401 from
/// the backend. The user is never mutated in between.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user: User,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// In-memory session table keyed by the SHA-256 of the backend token.
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub async fn create(&self, user: User, token: &str, expires_at: DateTime<Utc>) -> Session {
        let session = Session {
            id: hash_token(token),
            user,
            token: token.to_string(),
            expires_at,
            created_at: Utc::now(),
        };

        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());

        session
    }

    pub async fn find_by_token(&self, token: &str) -> Option<Session> {
        let id = hash_token(token);
        let now = Utc::now();

        {
            let sessions = self.sessions.read().await;
            match sessions.get(&id) {
                Some(session) if !session.is_expired(now) => return Some(session.clone()),
                Some(_) => {}
                None => return None,
            }
        }

        self.sessions.write().await.remove(&id);
        None
    }

    /// Returns true only for the call that actually removed the entry.
    pub async fn delete_by_token(&self, token: &str) -> bool {
        self.sessions
            .write()
            .await
            .remove(&hash_token(token))
            .is_some()
    }

    pub async fn cleanup_expired(&self) -> u64 {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        (before - sessions.len()) as u64
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn hash_token(token: &str) -> String {
    use sha2::{Sha256, Digest};
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
