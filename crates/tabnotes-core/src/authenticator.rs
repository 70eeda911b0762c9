// Request authenticator: credential -> identity decision
// Decision: Linear pipeline with no retries; the first failure ends the request
// Decision: Transport-agnostic; the HTTP layer maps AuthFailure onto status codes and cookie eviction

use std::sync::Arc;

use tracing::{debug, error};

use crate::error::TokenError;
use crate::identity::IdentityContext;
use crate::manager::SessionManager;
use crate::token::TokenSigner;

/// Why a request was denied
#[derive(Debug, thiserror::Error)]
pub enum AuthFailure {
    /// No credential on the request
    #[error("missing credential")]
    MissingCredential,

    /// Public key could not be loaded
    #[error("verification key unavailable")]
    KeyUnavailable,

    /// Bad signature, malformed claims or expired by claim
    #[error("invalid credential")]
    InvalidToken,

    /// Session revoked or gone
    #[error("session revoked")]
    Revoked,

    /// Revocation lookup failed
    #[error("session lookup failed")]
    Store,
}

impl AuthFailure {
    /// Failures caused by the server rather than the client
    pub fn is_server_fault(&self) -> bool {
        matches!(self, Self::KeyUnavailable | Self::Store)
    }

    /// Whether the stored credential should be evicted from the client
    pub fn clears_credential(&self) -> bool {
        matches!(
            self,
            Self::KeyUnavailable | Self::InvalidToken | Self::Revoked
        )
    }
}

/// Verifies a presented auth token and resolves it to an identity
#[derive(Clone)]
pub struct Authenticator {
    signer: Arc<dyn TokenSigner>,
    sessions: Arc<SessionManager>,
}

impl Authenticator {
    pub fn new(signer: Arc<dyn TokenSigner>, sessions: Arc<SessionManager>) -> Self {
        Self { signer, sessions }
    }

    /// Authenticate the credential carried by a request
    pub async fn authenticate(
        &self,
        credential: Option<&str>,
    ) -> Result<IdentityContext, AuthFailure> {
        let token = match credential.map(str::trim) {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AuthFailure::MissingCredential),
        };

        let claims = match self.signer.verify_auth_token(token) {
            Ok(claims) => claims,
            Err(TokenError::Key(e)) => {
                error!(error = %e, "failed to load public key for token verification");
                return Err(AuthFailure::KeyUnavailable);
            }
            Err(e) => {
                debug!(error = %e, "auth token rejected");
                return Err(AuthFailure::InvalidToken);
            }
        };

        match self.sessions.is_session_revoked(claims.sid).await {
            Ok(false) => {}
            Ok(true) => {
                debug!(session_id = %claims.sid, "revoked session presented");
                return Err(AuthFailure::Revoked);
            }
            Err(e) => {
                error!(session_id = %claims.sid, error = %e, "failed to check session revocation");
                return Err(AuthFailure::Store);
            }
        }

        Ok(IdentityContext::new(claims.sub, claims.sid, token))
    }
}
