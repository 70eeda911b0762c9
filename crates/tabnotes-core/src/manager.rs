// Session manager: the session state machine
// Decision: unverified -> verified is a conditional store update so one magic link is spent at most once
// Decision: Expired rows are deleted on lookup; revoked rows stay for listing
// Decision: A session with no row is reported as revoked (fail closed)

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::persistence::SessionStore;
use crate::session::{NewSession, SessionState, SessionSummary, TokenExchange};
use crate::token::{hash_token, TokenSigner};

/// Auth token issued by a successful magic-link exchange
#[derive(Debug, Clone)]
pub struct IssuedAuthToken {
    pub token: String,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Orchestrates the token signer and the session store
#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    signer: Arc<dyn TokenSigner>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn SessionStore>,
        signer: Arc<dyn TokenSigner>,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            signer,
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start an unverified session and return its magic-link token
    pub async fn create_session(&self, user_id: Uuid, contact: &str) -> SessionResult<String> {
        let now = Utc::now();
        let expires_at = window_end(now, self.config.magic_link_ttl)?;

        let token = self
            .signer
            .generate_magic_link_token(contact, now, expires_at)?;

        let session = self
            .store
            .create_session(NewSession {
                token: hash_token(&token),
                user_id,
                created_at: now,
                expires_at,
            })
            .await?;

        info!(session_id = %session.id, user_id = %user_id, "magic link session created");
        Ok(token)
    }

    /// Exchange a magic-link token for an auth token.
    ///
    /// The stored fingerprint is overwritten, so the presented token can
    /// never be exchanged again.
    pub async fn valid_session(&self, presented: &str) -> SessionResult<IssuedAuthToken> {
        let digest = hash_token(presented);
        let session = self
            .store
            .get_session_by_token(&digest)
            .await?
            .ok_or(SessionError::NotFound)?;

        let now = Utc::now();
        match session.state(now) {
            SessionState::Unverified => {}
            SessionState::Expired => {
                self.store.delete_session(session.id).await?;
                debug!(session_id = %session.id, "expired session deleted on lookup");
                return Err(SessionError::Expired);
            }
            SessionState::Revoked => {
                debug!(session_id = %session.id, "revoked session presented for exchange");
                return Err(SessionError::Revoked);
            }
            SessionState::Verified => {
                // Already exchanged; this is an auth token, not a magic link
                debug!(session_id = %session.id, "verified session presented for exchange");
                return Err(SessionError::NotFound);
            }
        }

        let expires_at = window_end(now, self.config.auth_token_ttl)?;
        let token = self
            .signer
            .generate_auth_token(session.user_id, session.id, now, expires_at)?;

        let exchanged = self
            .store
            .exchange_token(
                session.id,
                &digest,
                TokenExchange {
                    token: hash_token(&token),
                    expires_at,
                    verified_at: now,
                },
                now,
            )
            .await?;

        let Some(session) = exchanged else {
            warn!(session_id = %session.id, "magic link exchange lost a concurrent race");
            return Err(SessionError::NotFound);
        };

        info!(session_id = %session.id, user_id = %session.user_id, "session verified");
        Ok(IssuedAuthToken {
            token,
            session_id: session.id,
            user_id: session.user_id,
            expires_at: session.expires_at,
        })
    }

    /// Revoke a session by id
    pub async fn revoke_session(&self, session_id: Uuid) -> SessionResult<()> {
        if !self.store.revoke_session(session_id, Utc::now()).await? {
            return Err(SessionError::NotFound);
        }
        info!(session_id = %session_id, "session revoked");
        Ok(())
    }

    /// True when the session is revoked or no longer exists
    pub async fn is_session_revoked(&self, session_id: Uuid) -> SessionResult<bool> {
        match self.store.is_session_revoked(session_id).await? {
            Some(revoked) => Ok(revoked),
            None => {
                debug!(session_id = %session_id, "unknown session treated as revoked");
                Ok(true)
            }
        }
    }

    /// Sessions of a user, newest first
    pub async fn get_user_sessions(&self, user_id: Uuid) -> SessionResult<Vec<SessionSummary>> {
        let sessions = self.store.get_sessions_by_user_id(user_id).await?;
        Ok(sessions.iter().map(|s| s.summary()).collect())
    }

    /// Revoke one of the user's own sessions.
    ///
    /// A session owned by someone else is reported as NotFound.
    pub async fn revoke_user_session(&self, user_id: Uuid, session_id: Uuid) -> SessionResult<()> {
        let session = self
            .store
            .get_session_by_id(session_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or(SessionError::NotFound)?;

        self.revoke_session(session.id).await
    }

    /// Revoke all of a user's sessions, optionally sparing `current_session_id`
    pub async fn revoke_all_user_sessions(
        &self,
        user_id: Uuid,
        current_session_id: Uuid,
        revoke_current: bool,
    ) -> SessionResult<u64> {
        let now = Utc::now();
        let revoked = if revoke_current {
            self.store
                .revoke_all_sessions_by_user_id(user_id, now)
                .await?
        } else {
            self.store
                .revoke_all_sessions_by_user_id_except(user_id, current_session_id, now)
                .await?
        };

        info!(
            user_id = %user_id,
            revoked,
            revoke_current,
            "user sessions revoked"
        );
        Ok(revoked)
    }

    /// Delete every session whose window has ended
    pub async fn purge_expired_sessions(&self) -> SessionResult<u64> {
        let deleted = self.store.delete_expired_sessions(Utc::now()).await?;
        if deleted > 0 {
            info!(deleted, "expired sessions purged");
        }
        Ok(deleted)
    }
}

fn window_end(start: DateTime<Utc>, ttl: Duration) -> SessionResult<DateTime<Utc>> {
    start
        .checked_add_signed(ttl)
        .ok_or(SessionError::WindowOutOfRange)
}
