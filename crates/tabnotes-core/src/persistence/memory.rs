//! In-memory implementations of SessionStore and UserDirectory

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

use super::store::*;
use crate::session::{NewSession, Session, TokenExchange};
use crate::user::{normalize_email, User};

/// In-memory implementation of SessionStore
///
/// Stores everything in a single map guarded by one lock, which gives every
/// method (including the conditional token exchange) the same atomicity as
/// a single-statement SQL update.
///
/// # Example
///
/// ```
/// use tabnotes_core::InMemorySessionStore;
///
/// let store = InMemorySessionStore::new();
/// assert_eq!(store.session_count(), 0);
/// ```
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
}

impl InMemorySessionStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Get the number of stored sessions
    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create_session(&self, session: NewSession) -> Result<Session, StoreError> {
        let mut sessions = self.sessions.write();
        if sessions.values().any(|s| s.token == session.token) {
            return Err(StoreError::DuplicateToken);
        }

        let created = Session {
            id: Uuid::now_v7(),
            token: session.token,
            user_id: session.user_id,
            created_at: session.created_at,
            expires_at: session.expires_at,
            verified_at: None,
            revoked_at: None,
            updated_at: None,
        };
        sessions.insert(created.id, created.clone());
        Ok(created)
    }

    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>, StoreError> {
        Ok(self
            .sessions
            .read()
            .values()
            .find(|s| s.token == token)
            .cloned())
    }

    async fn get_session_by_id(&self, id: Uuid) -> Result<Option<Session>, StoreError> {
        Ok(self.sessions.read().get(&id).cloned())
    }

    async fn update_session(&self, session: &Session) -> Result<bool, StoreError> {
        let mut sessions = self.sessions.write();
        if sessions
            .values()
            .any(|s| s.id != session.id && s.token == session.token)
        {
            return Err(StoreError::DuplicateToken);
        }

        match sessions.get_mut(&session.id) {
            Some(stored) => {
                stored.token = session.token.clone();
                stored.expires_at = session.expires_at;
                stored.verified_at = session.verified_at;
                stored.revoked_at = session.revoked_at;
                stored.updated_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn exchange_token(
        &self,
        id: Uuid,
        current_token: &str,
        exchange: TokenExchange,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        let mut sessions = self.sessions.write();
        let Some(stored) = sessions.get_mut(&id) else {
            return Ok(None);
        };

        let live = stored.token == current_token
            && stored.verified_at.is_none()
            && stored.revoked_at.is_none()
            && stored.expires_at >= now;
        if !live {
            return Ok(None);
        }

        stored.token = exchange.token;
        stored.expires_at = exchange.expires_at;
        stored.verified_at = Some(exchange.verified_at);
        stored.updated_at = Some(exchange.verified_at);
        Ok(Some(stored.clone()))
    }

    async fn delete_session(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.sessions.write().remove(&id).is_some())
    }

    async fn get_sessions_by_user_id(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError> {
        let mut sessions: Vec<Session> = self
            .sessions
            .read()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(sessions)
    }

    async fn revoke_session(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        match self.sessions.write().get_mut(&id) {
            Some(stored) => {
                stored.revoked_at = Some(at);
                stored.updated_at = Some(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_sessions_by_user_id(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut count = 0;
        for stored in self
            .sessions
            .write()
            .values_mut()
            .filter(|s| s.user_id == user_id)
        {
            stored.revoked_at = Some(at);
            stored.updated_at = Some(at);
            count += 1;
        }
        Ok(count)
    }

    async fn revoke_all_sessions_by_user_id_except(
        &self,
        user_id: Uuid,
        current_session_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut count = 0;
        for stored in self
            .sessions
            .write()
            .values_mut()
            .filter(|s| s.user_id == user_id && s.id != current_session_id)
        {
            stored.revoked_at = Some(at);
            stored.updated_at = Some(at);
            count += 1;
        }
        Ok(count)
    }

    async fn is_session_revoked(&self, id: Uuid) -> Result<Option<bool>, StoreError> {
        Ok(self.sessions.read().get(&id).map(Session::is_revoked))
    }

    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

/// In-memory implementation of UserDirectory
pub struct InMemoryUserDirectory {
    users: RwLock<HashMap<String, User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
        }
    }

    /// Register a user and return it
    pub fn insert(&self, name: impl Into<String>, email: impl Into<String>) -> User {
        let user = User {
            id: Uuid::now_v7(),
            name: name.into(),
            email: email.into(),
        };
        self.users
            .write()
            .insert(normalize_email(&user.email), user.clone());
        user
    }
}

impl Default for InMemoryUserDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().get(&normalize_email(email)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_session(token: &str, user_id: Uuid, now: DateTime<Utc>) -> NewSession {
        NewSession {
            token: token.to_string(),
            user_id,
            created_at: now,
            expires_at: now + Duration::minutes(15),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookup() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::now_v7();
        let now = Utc::now();

        let created = store
            .create_session(new_session("t1", user_id, now))
            .await
            .unwrap();
        assert_eq!(created.user_id, user_id);
        assert!(created.verified_at.is_none());
        assert!(created.updated_at.is_none());

        let by_token = store.get_session_by_token("t1").await.unwrap().unwrap();
        assert_eq!(by_token.id, created.id);

        let by_id = store.get_session_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id, created);

        assert!(store.get_session_by_token("t2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_token_rejected() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        store
            .create_session(new_session("t1", Uuid::now_v7(), now))
            .await
            .unwrap();

        let result = store
            .create_session(new_session("t1", Uuid::now_v7(), now))
            .await;
        assert!(matches!(result, Err(StoreError::DuplicateToken)));
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn test_update_stamps_updated_at() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let mut session = store
            .create_session(new_session("t1", Uuid::now_v7(), now))
            .await
            .unwrap();

        session.expires_at = now - Duration::minutes(1);
        assert!(store.update_session(&session).await.unwrap());

        let stored = store.get_session_by_id(session.id).await.unwrap().unwrap();
        assert_eq!(stored.expires_at, now - Duration::minutes(1));
        assert!(stored.updated_at.is_some());

        // Unknown id with a fresh token is not an insert
        session.id = Uuid::now_v7();
        session.token = "t-other".to_string();
        assert!(!store.update_session(&session).await.unwrap());
        assert_eq!(store.session_count(), 1);
    }

    #[tokio::test]
    async fn test_exchange_token_is_conditional() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let session = store
            .create_session(new_session("magic", Uuid::now_v7(), now))
            .await
            .unwrap();

        let exchange = TokenExchange {
            token: "auth".to_string(),
            expires_at: now + Duration::days(7),
            verified_at: now,
        };

        // Wrong current token
        let missed = store
            .exchange_token(session.id, "other", exchange.clone(), now)
            .await
            .unwrap();
        assert!(missed.is_none());

        let exchanged = store
            .exchange_token(session.id, "magic", exchange.clone(), now)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(exchanged.token, "auth");
        assert_eq!(exchanged.verified_at, Some(now));

        // Second exchange loses: token changed and row is verified
        let again = store
            .exchange_token(session.id, "magic", exchange, now)
            .await
            .unwrap();
        assert!(again.is_none());
        assert!(store.get_session_by_token("magic").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exchange_token_refuses_expired_and_revoked() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();
        let exchange = TokenExchange {
            token: "auth".to_string(),
            expires_at: now + Duration::days(7),
            verified_at: now,
        };

        let expired = store
            .create_session(new_session("m1", Uuid::now_v7(), now))
            .await
            .unwrap();
        let later = now + Duration::minutes(30);
        assert!(store
            .exchange_token(expired.id, "m1", exchange.clone(), later)
            .await
            .unwrap()
            .is_none());

        let revoked = store
            .create_session(new_session("m2", Uuid::now_v7(), now))
            .await
            .unwrap();
        store.revoke_session(revoked.id, now).await.unwrap();
        assert!(store
            .exchange_token(revoked.id, "m2", exchange, now)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_sessions_by_user_newest_first() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::now_v7();
        let now = Utc::now();

        let older = store
            .create_session(new_session("t1", user_id, now - Duration::hours(1)))
            .await
            .unwrap();
        let newer = store
            .create_session(new_session("t2", user_id, now))
            .await
            .unwrap();
        store
            .create_session(new_session("t3", Uuid::now_v7(), now))
            .await
            .unwrap();

        let sessions = store.get_sessions_by_user_id(user_id).await.unwrap();
        let ids: Vec<Uuid> = sessions.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        let none = store.get_sessions_by_user_id(Uuid::now_v7()).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_revocation_queries() {
        let store = InMemorySessionStore::new();
        let user_id = Uuid::now_v7();
        let now = Utc::now();

        let a = store
            .create_session(new_session("a", user_id, now))
            .await
            .unwrap();
        let b = store
            .create_session(new_session("b", user_id, now))
            .await
            .unwrap();
        let c = store
            .create_session(new_session("c", user_id, now))
            .await
            .unwrap();
        let stranger = store
            .create_session(new_session("d", Uuid::now_v7(), now))
            .await
            .unwrap();

        assert_eq!(store.is_session_revoked(a.id).await.unwrap(), Some(false));
        assert_eq!(store.is_session_revoked(Uuid::now_v7()).await.unwrap(), None);

        let count = store
            .revoke_all_sessions_by_user_id_except(user_id, b.id, now)
            .await
            .unwrap();
        assert_eq!(count, 2);
        assert_eq!(store.is_session_revoked(a.id).await.unwrap(), Some(true));
        assert_eq!(store.is_session_revoked(b.id).await.unwrap(), Some(false));
        assert_eq!(store.is_session_revoked(c.id).await.unwrap(), Some(true));

        let count = store
            .revoke_all_sessions_by_user_id(user_id, now)
            .await
            .unwrap();
        assert_eq!(count, 3);
        assert_eq!(store.is_session_revoked(b.id).await.unwrap(), Some(true));
        assert_eq!(
            store.is_session_revoked(stranger.id).await.unwrap(),
            Some(false)
        );

        assert!(!store.revoke_session(Uuid::now_v7(), now).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_expired_sessions() {
        let store = InMemorySessionStore::new();
        let now = Utc::now();

        let stale = store
            .create_session(new_session("old", Uuid::now_v7(), now - Duration::hours(1)))
            .await
            .unwrap();
        let fresh = store
            .create_session(new_session("new", Uuid::now_v7(), now))
            .await
            .unwrap();

        assert_eq!(store.delete_expired_sessions(now).await.unwrap(), 1);
        assert!(store.get_session_by_id(stale.id).await.unwrap().is_none());
        assert!(store.get_session_by_id(fresh.id).await.unwrap().is_some());

        assert!(store.delete_session(fresh.id).await.unwrap());
        assert!(!store.delete_session(fresh.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_user_directory_lookup() {
        let users = InMemoryUserDirectory::new();
        let alice = users.insert("Alice", "alice@example.com");

        let found = users.find_by_email("Alice@Example.com").await.unwrap();
        assert_eq!(found, Some(alice));
        assert!(users.find_by_email("bob@example.com").await.unwrap().is_none());
    }
}
