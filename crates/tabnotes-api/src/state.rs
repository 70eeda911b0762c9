// Application state shared across routes
// Decision: One AppState; collaborators are composed here once and shared behind Arc

use std::sync::Arc;

use tabnotes_core::{
    Authenticator, JwtTokenSigner, KeyProvider, LoginService, MagicLinkNotifier, SessionConfig,
    SessionManager, TokenSigner,
};
use tabnotes_storage::StorageBackend;

use crate::auth::CookieSettings;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionManager>,
    pub login: LoginService,
    pub authenticator: Authenticator,
    pub cookies: CookieSettings,
    /// UI base URL, with trailing slash
    pub redirect_url: String,
    pub backend: StorageBackend,
}

/// Everything needed to compose an [`AppState`]
pub struct AppStateBuilder {
    pub backend: StorageBackend,
    pub keys: Arc<dyn KeyProvider>,
    pub notifier: Arc<dyn MagicLinkNotifier>,
    pub session_config: SessionConfig,
    pub cookie_name: String,
    pub cookie_secure: bool,
    pub api_url: String,
    pub redirect_url: String,
}

impl AppStateBuilder {
    pub fn build(self) -> AppState {
        let signer: Arc<dyn TokenSigner> = Arc::new(JwtTokenSigner::new(self.keys));
        let cookies = CookieSettings {
            name: self.cookie_name,
            secure: self.cookie_secure,
            max_age_secs: self.session_config.auth_token_ttl.num_seconds(),
        };

        let sessions = Arc::new(SessionManager::new(
            self.backend.session_store(),
            signer.clone(),
            self.session_config,
        ));
        let login = LoginService::new(
            sessions.clone(),
            self.backend.user_directory(),
            self.notifier,
            self.api_url,
        );
        let authenticator = Authenticator::new(signer, sessions.clone());

        AppState {
            sessions,
            login,
            authenticator,
            cookies,
            redirect_url: self.redirect_url,
            backend: self.backend,
        }
    }
}
