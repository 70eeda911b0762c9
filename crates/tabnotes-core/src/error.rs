// Error types for the authentication core
// Decision: One thiserror enum per layer; the HTTP layer decides how much of each reaches the client

use crate::persistence::StoreError;

/// Failure loading or parsing the ECDSA key material
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// Key file could not be read
    #[error("failed to read key file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Private key is not a PKCS#8 PEM P-256 key
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(#[source] jsonwebtoken::errors::Error),

    /// Public key is not a PEM P-256 key
    #[error("invalid public key: {0}")]
    InvalidPublicKey(#[source] jsonwebtoken::errors::Error),
}

/// Failure signing or verifying a token
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Signing or verification key could not be loaded
    #[error("key unavailable: {0}")]
    Key(#[from] KeyError),

    /// Claims could not be signed
    #[error("failed to sign token: {0}")]
    Sign(#[source] jsonwebtoken::errors::Error),

    /// Malformed token, bad signature, wrong claim shape or expired by claim
    #[error("invalid token: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
}

/// Errors returned by the session manager
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No session for the given token or id (also used for sessions owned by someone else)
    #[error("session not found")]
    NotFound,

    /// Session outlived its window; the row has been deleted
    #[error("session expired")]
    Expired,

    /// Session was explicitly revoked
    #[error("session revoked")]
    Revoked,

    /// The configured window pushes the expiry past the representable range
    #[error("session window out of range")]
    WindowOutOfRange,

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Errors returned by the login flow
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    /// No user registered under the given email
    #[error("user not found")]
    UserNotFound,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The notifier could not hand the link off for delivery
    #[error("failed to send magic link: {0}")]
    Notification(String),
}

pub type SessionResult<T> = Result<T, SessionError>;
