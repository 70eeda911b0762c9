use uuid::Uuid;

/// Identity facts established for one request.
///
/// Written once by the authenticator and read-only afterwards.
#[derive(Clone, PartialEq, Eq)]
pub struct IdentityContext {
    user_id: Uuid,
    session_id: Uuid,
    token: String,
}

impl IdentityContext {
    pub fn new(user_id: Uuid, session_id: Uuid, token: impl Into<String>) -> Self {
        Self {
            user_id,
            session_id,
            token: token.into(),
        }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// The raw credential the request carried
    pub fn token(&self) -> &str {
        &self.token
    }
}

impl std::fmt::Debug for IdentityContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityContext")
            .field("user_id", &self.user_id)
            .field("session_id", &self.session_id)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors_and_redacted_debug() {
        let user_id = Uuid::now_v7();
        let session_id = Uuid::now_v7();
        let identity = IdentityContext::new(user_id, session_id, "secret-token");

        assert_eq!(identity.user_id(), user_id);
        assert_eq!(identity.session_id(), session_id);
        assert_eq!(identity.token(), "secret-token");
        assert!(!format!("{identity:?}").contains("secret-token"));
    }
}
