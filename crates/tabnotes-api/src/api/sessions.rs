// Session management HTTP routes (current user)
// Decision: Unknown and foreign session ids both answer 404

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::{delete, get},
    Json, Router,
};
use axum_extra::extract::CookieJar;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tabnotes_core::{SessionError, SessionSummary};
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use super::common::{ApiError, ErrorResponse, ListResponse};
use crate::auth::{require_auth, Identity};
use crate::state::AppState;

/// A login session of the current user
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SessionResponse {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// Set once the magic link was exchanged
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
    /// Whether this is the session making the request
    pub current: bool,
}

impl SessionResponse {
    fn from_summary(summary: SessionSummary, current_session_id: Uuid) -> Self {
        Self {
            id: summary.id,
            created_at: summary.created_at,
            expires_at: summary.expires_at,
            verified_at: summary.verified_at,
            revoked_at: summary.revoked_at,
            current: summary.id == current_session_id,
        }
    }
}

/// Revoke all sessions of the current user
#[derive(Debug, Deserialize, ToSchema)]
pub struct RevokeAllSessionsRequest {
    /// Also revoke the session making the request
    #[serde(default)]
    pub revoke_current: bool,
}

/// Create session management routes (all behind require_auth)
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route(
            "/me/sessions",
            get(list_sessions).delete(revoke_all_sessions),
        )
        .route("/me/sessions/:session_id", delete(revoke_session))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state)
}

/// GET /me/sessions - List the current user's sessions, newest first
#[utoipa::path(
    get,
    path = "/me/sessions",
    responses(
        (status = 200, description = "Sessions of the current user", body = ListResponse<SessionResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn list_sessions(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<ListResponse<SessionResponse>>, ApiError> {
    let sessions = state
        .sessions
        .get_user_sessions(identity.user_id())
        .await
        .map_err(|e| {
            error!(user_id = %identity.user_id(), error = %e, "failed to list sessions");
            ApiError::internal()
        })?;

    let current = identity.session_id();
    let data: Vec<SessionResponse> = sessions
        .into_iter()
        .map(|s| SessionResponse::from_summary(s, current))
        .collect();

    Ok(Json(data.into()))
}

/// DELETE /me/sessions/{session_id} - Revoke one of the current user's sessions
#[utoipa::path(
    delete,
    path = "/me/sessions/{session_id}",
    params(
        ("session_id" = Uuid, Path, description = "Session ID")
    ),
    responses(
        (status = 204, description = "Session revoked"),
        (status = 400, description = "Malformed session id", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 404, description = "Session not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn revoke_session(
    State(state): State<AppState>,
    identity: Identity,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let session_id = Uuid::parse_str(&session_id)
        .map_err(|_| ApiError::bad_request("Invalid session id"))?;

    match state
        .sessions
        .revoke_user_session(identity.user_id(), session_id)
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(SessionError::NotFound) => Err(ApiError::not_found("Session not found")),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "failed to revoke session");
            Err(ApiError::internal())
        }
    }
}

/// DELETE /me/sessions - Revoke all of the current user's sessions
#[utoipa::path(
    delete,
    path = "/me/sessions",
    request_body = RevokeAllSessionsRequest,
    responses(
        (status = 204, description = "Sessions revoked; cookie cleared when the current one was included"),
        (status = 400, description = "Malformed request", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "sessions"
)]
pub async fn revoke_all_sessions(
    State(state): State<AppState>,
    identity: Identity,
    jar: CookieJar,
    payload: Result<Json<RevokeAllSessionsRequest>, JsonRejection>,
) -> Result<(CookieJar, StatusCode), ApiError> {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(e.body_text()))?;

    state
        .sessions
        .revoke_all_user_sessions(identity.user_id(), identity.session_id(), req.revoke_current)
        .await
        .map_err(|e| {
            error!(user_id = %identity.user_id(), error = %e, "failed to revoke sessions");
            ApiError::internal()
        })?;

    let jar = if req.revoke_current {
        state.cookies.clear(jar)
    } else {
        jar
    };
    Ok((jar, StatusCode::NO_CONTENT))
}
