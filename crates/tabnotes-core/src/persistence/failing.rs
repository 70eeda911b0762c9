// Session store that fails every call, for exercising outage paths

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::store::{SessionStore, StoreError};
use crate::session::{NewSession, Session, TokenExchange};

/// Store whose every call fails as if the database were down
pub(crate) struct FailingStore;

fn outage() -> StoreError {
    StoreError::Database("connection refused".to_string())
}

#[async_trait]
impl SessionStore for FailingStore {
    async fn create_session(&self, _: NewSession) -> Result<Session, StoreError> {
        Err(outage())
    }
    async fn get_session_by_token(&self, _: &str) -> Result<Option<Session>, StoreError> {
        Err(outage())
    }
    async fn get_session_by_id(&self, _: Uuid) -> Result<Option<Session>, StoreError> {
        Err(outage())
    }
    async fn update_session(&self, _: &Session) -> Result<bool, StoreError> {
        Err(outage())
    }
    async fn exchange_token(
        &self,
        _: Uuid,
        _: &str,
        _: TokenExchange,
        _: DateTime<Utc>,
    ) -> Result<Option<Session>, StoreError> {
        Err(outage())
    }
    async fn delete_session(&self, _: Uuid) -> Result<bool, StoreError> {
        Err(outage())
    }
    async fn get_sessions_by_user_id(&self, _: Uuid) -> Result<Vec<Session>, StoreError> {
        Err(outage())
    }
    async fn revoke_session(&self, _: Uuid, _: DateTime<Utc>) -> Result<bool, StoreError> {
        Err(outage())
    }
    async fn revoke_all_sessions_by_user_id(
        &self,
        _: Uuid,
        _: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Err(outage())
    }
    async fn revoke_all_sessions_by_user_id_except(
        &self,
        _: Uuid,
        _: Uuid,
        _: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        Err(outage())
    }
    async fn is_session_revoked(&self, _: Uuid) -> Result<Option<bool>, StoreError> {
        Err(outage())
    }
    async fn delete_expired_sessions(&self, _: DateTime<Utc>) -> Result<u64, StoreError> {
        Err(outage())
    }
}
