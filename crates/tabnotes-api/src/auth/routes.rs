// Authentication HTTP routes
// Decision: Link exchange answers with 302 redirects into the UI, never JSON
// Decision: Handler bodies are empty on success; errors carry { "error": ... }

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use tabnotes_core::{LoginError, SessionError};
use tracing::{error, warn};
use utoipa::{IntoParams, ToSchema};

use super::middleware::{require_auth, Identity};
use crate::api::common::{ApiError, ErrorResponse};
use crate::state::AppState;

/// Request a magic link
#[derive(Debug, Deserialize, ToSchema)]
pub struct AuthenticateRequest {
    #[schema(example = "alice@example.com")]
    pub email: String,
}

/// Query of the link mailed to the user
#[derive(Debug, Deserialize, IntoParams)]
pub struct MagicLinkQuery {
    /// Magic-link token
    pub token: Option<String>,
}

/// Create auth routes
pub fn routes(state: AppState) -> Router {
    let protected = Router::new()
        .route("/logout", post(logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/authenticate", post(authenticate))
        .route("/magic-link/authenticate", get(authenticate_from_link))
        .merge(protected)
        .with_state(state)
}

/// 302 to `location`
fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// POST /authenticate - Send a magic link to a registered email
#[utoipa::path(
    post,
    path = "/authenticate",
    request_body = AuthenticateRequest,
    responses(
        (status = 200, description = "Magic link sent"),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 404, description = "No user with this email", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn authenticate(
    State(state): State<AppState>,
    payload: Result<Json<AuthenticateRequest>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') {
        return Err(ApiError::bad_request("A valid email is required"));
    }

    match state.login.send_authentication_link(email).await {
        Ok(()) => Ok(StatusCode::OK),
        Err(LoginError::UserNotFound) => {
            warn!("magic link requested for unknown email");
            Err(ApiError::not_found("User not found"))
        }
        Err(e) => {
            error!(error = %e, "failed to send authentication link");
            Err(ApiError::internal())
        }
    }
}

/// GET /magic-link/authenticate - Exchange a magic link for the auth cookie
#[utoipa::path(
    get,
    path = "/magic-link/authenticate",
    params(MagicLinkQuery),
    responses(
        (status = 302, description = "Redirect into the UI; sets the auth cookie on success"),
        (status = 400, description = "Missing token", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn authenticate_from_link(
    State(state): State<AppState>,
    jar: CookieJar,
    Query(query): Query<MagicLinkQuery>,
) -> Result<Response, ApiError> {
    let token = query
        .token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::bad_request("Missing token"))?;

    match state.login.authenticate_from_link(&token).await {
        Ok(issued) => {
            let jar = state.cookies.set(jar, issued.token);
            Ok((jar, found(state.redirect_url.clone())).into_response())
        }
        Err(LoginError::Session(SessionError::NotFound | SessionError::Revoked)) => {
            warn!("magic link rejected: invalid token");
            Ok(found(format!(
                "{}auth/fail?error=invalid_token",
                state.redirect_url
            )))
        }
        Err(LoginError::Session(SessionError::Expired)) => {
            warn!("magic link rejected: expired token");
            Ok(found(format!(
                "{}auth/fail?error=expired_token",
                state.redirect_url
            )))
        }
        Err(e) => {
            error!(error = %e, "failed to authenticate from link");
            Err(ApiError::internal())
        }
    }
}

/// POST /logout - Revoke the current session and clear the cookie
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Logged out"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    identity: Identity,
    jar: CookieJar,
) -> Result<(CookieJar, StatusCode), ApiError> {
    state.login.logout(identity.session_id()).await.map_err(|e| {
        error!(session_id = %identity.session_id(), error = %e, "failed to log out");
        ApiError::internal()
    })?;

    Ok((state.cookies.clear(jar), StatusCode::OK))
}
