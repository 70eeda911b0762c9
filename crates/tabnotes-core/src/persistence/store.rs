//! SessionStore and UserDirectory trait definitions

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::session::{NewSession, Session, TokenExchange};
use crate::user::User;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another session already carries this token fingerprint
    #[error("duplicate session token")]
    DuplicateToken,

    /// Database error
    #[error("database error: {0}")]
    Database(String),
}

/// Persistence for session records.
///
/// Implementations own no business logic; expiry and ownership decisions
/// live in the session manager. Every method is a single round trip so
/// dropping the returned future abandons the call.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Insert a session; the store assigns the id
    async fn create_session(&self, session: NewSession) -> Result<Session, StoreError>;

    /// Look up by token fingerprint
    async fn get_session_by_token(&self, token: &str) -> Result<Option<Session>, StoreError>;

    async fn get_session_by_id(&self, id: Uuid) -> Result<Option<Session>, StoreError>;

    /// Overwrite the mutable columns and stamp `updated_at`.
    ///
    /// Returns false when no row has this id.
    async fn update_session(&self, session: &Session) -> Result<bool, StoreError>;

    /// Atomically rotate an unverified session onto its auth token.
    ///
    /// Applies only when the row still carries `current_token`, is
    /// unverified, unrevoked and not yet expired at `now`. Returns the updated
    /// row, or `None` when the condition did not hold.
    async fn exchange_token(
        &self,
        id: Uuid,
        current_token: &str,
        exchange: TokenExchange,
        now: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError>;

    /// Returns false when no row was deleted
    async fn delete_session(&self, id: Uuid) -> Result<bool, StoreError>;

    /// All sessions of a user, newest first
    async fn get_sessions_by_user_id(&self, user_id: Uuid) -> Result<Vec<Session>, StoreError>;

    /// Set `revoked_at`; returns false when no row has this id
    async fn revoke_session(&self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;

    /// Revoke every session of a user; returns the number of rows touched
    async fn revoke_all_sessions_by_user_id(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// Revoke every session of a user except `current_session_id`
    async fn revoke_all_sessions_by_user_id_except(
        &self,
        user_id: Uuid,
        current_session_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<u64, StoreError>;

    /// `Some(revoked)` for an existing row, `None` when there is no row
    async fn is_session_revoked(&self, id: Uuid) -> Result<Option<bool>, StoreError>;

    /// Remove every row whose window ended before `now`
    async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;

    /// Cheap connectivity probe
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Lookup of registered users by contact address
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
}
