// Session model
// Decision: `token` holds the SHA-256 fingerprint of the current credential, never the credential
// Decision: Revocation is a soft delete (revoked_at); expiry is a hard delete on lookup

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Durable record binding a credential to its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Fingerprint of the latest issued token
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Lifecycle state derived from the timestamps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Magic link issued, not yet exchanged
    Unverified,
    /// Exchanged for an auth token
    Verified,
    /// Explicitly invalidated (terminal)
    Revoked,
    /// Past its window, awaiting deletion (terminal, even when also revoked)
    Expired,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unverified => write!(f, "unverified"),
            Self::Verified => write!(f, "verified"),
            Self::Revoked => write!(f, "revoked"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    pub fn is_verified(&self) -> bool {
        self.verified_at.is_some()
    }

    /// Expiry wins over revocation: an expired row is deleted whatever else it carries
    pub fn state(&self, now: DateTime<Utc>) -> SessionState {
        if self.is_expired(now) {
            SessionState::Expired
        } else if self.is_revoked() {
            SessionState::Revoked
        } else if self.is_verified() {
            SessionState::Verified
        } else {
            SessionState::Unverified
        }
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            created_at: self.created_at,
            expires_at: self.expires_at,
            verified_at: self.verified_at,
            revoked_at: self.revoked_at,
        }
    }
}

/// Input for inserting a new session
#[derive(Debug, Clone)]
pub struct NewSession {
    /// Fingerprint of the magic-link token
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The overwrite applied when a magic link is exchanged
#[derive(Debug, Clone)]
pub struct TokenExchange {
    /// Fingerprint of the new auth token
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub verified_at: DateTime<Utc>,
}

/// Session as listed to its owner
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}
