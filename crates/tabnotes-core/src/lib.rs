// Tabnotes authentication core
//
// Magic-link login and server-side session lifecycle: key material, token
// signing, the session state machine, and the per-request authenticator.

pub mod authenticator;
pub mod config;
pub mod error;
pub mod identity;
pub mod keys;
pub mod login;
pub mod manager;
pub mod persistence;
pub mod session;
pub mod token;
pub mod user;

pub use authenticator::{AuthFailure, Authenticator};
pub use config::SessionConfig;
pub use error::{KeyError, LoginError, SessionError, SessionResult, TokenError};
pub use identity::IdentityContext;
pub use keys::{EcdsaKeyPair, KeyProvider};
pub use login::{magic_link_url, LogNotifier, LoginService, MagicLinkNotifier, MAGIC_LINK_PATH};
pub use manager::{IssuedAuthToken, SessionManager};
pub use persistence::{
    InMemorySessionStore, InMemoryUserDirectory, SessionStore, StoreError, UserDirectory,
};
pub use session::{NewSession, Session, SessionState, SessionSummary, TokenExchange};
pub use token::{hash_token, AuthTokenClaims, JwtTokenSigner, MagicLinkClaims, TokenSigner};
pub use user::{normalize_email, User};
