// Authentication middleware and extractors
// Decision: Credential travels only in the auth cookie
// Decision: Every denial is 401 except a failed revocation lookup, which is 500; both deny access

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::extract::CookieJar;
use tabnotes_core::{AuthFailure, IdentityContext};

use super::cookie::CookieSettings;
use crate::api::common::ErrorResponse;
use crate::state::AppState;

/// Authentication error
#[derive(Debug)]
pub struct AuthError {
    pub status: StatusCode,
    pub message: &'static str,
    /// Jar carrying a removal cookie when the credential must be evicted
    pub jar: Option<CookieJar>,
}

impl AuthError {
    pub fn from_failure(failure: &AuthFailure, cookies: &CookieSettings, jar: CookieJar) -> Self {
        let (status, message) = match failure {
            AuthFailure::MissingCredential => {
                (StatusCode::UNAUTHORIZED, "Authentication required")
            }
            AuthFailure::InvalidToken | AuthFailure::KeyUnavailable => {
                (StatusCode::UNAUTHORIZED, "Invalid or expired credential")
            }
            AuthFailure::Revoked => (StatusCode::UNAUTHORIZED, "Session revoked"),
            AuthFailure::Store => (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"),
        };

        Self {
            status,
            message,
            jar: failure.clears_credential().then(|| cookies.clear(jar)),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        (self.status, self.jar, Json(ErrorResponse::new(self.message))).into_response()
    }
}

/// Gate for protected routes.
///
/// Resolves the auth cookie to an [`IdentityContext`] and stores it in the
/// request extensions for the [`Identity`] extractor.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let credential = state.cookies.credential(&jar);

    match state.authenticator.authenticate(credential).await {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(failure) => AuthError::from_failure(&failure, &state.cookies, jar).into_response(),
    }
}

/// Identity of the caller on a protected route
#[derive(Debug, Clone)]
pub struct Identity(pub IdentityContext);

impl std::ops::Deref for Identity {
    type Target = IdentityContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Returns 401 (and evicts the cookie) if the route is not behind `require_auth`
#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<IdentityContext>() {
            return Ok(Identity(identity.clone()));
        }

        let state = AppState::from_ref(state);
        let jar = CookieJar::from_headers(&parts.headers);
        Err(AuthError {
            status: StatusCode::UNAUTHORIZED,
            message: "Authentication required",
            jar: Some(state.cookies.clear(jar)),
        })
    }
}
