// OpenAPI specification generation
//
// Served at /api-doc/openapi.json and printed by the export-openapi binary.

use utoipa::OpenApi;

use crate::api;
use crate::auth;

/// OpenAPI documentation for the Tabnotes auth API
#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health,
        auth::routes::authenticate,
        auth::routes::authenticate_from_link,
        auth::routes::logout,
        api::sessions::list_sessions,
        api::sessions::revoke_session,
        api::sessions::revoke_all_sessions,
    ),
    components(
        schemas(
            api::ErrorResponse,
            api::health::HealthResponse,
            auth::routes::AuthenticateRequest,
            api::sessions::SessionResponse,
            api::sessions::RevokeAllSessionsRequest,
        )
    ),
    tags(
        (name = "health", description = "Service health"),
        (name = "auth", description = "Magic-link login and logout"),
        (name = "sessions", description = "Login sessions of the current user")
    ),
    info(
        title = "Tabnotes Auth API",
        description = "Passwordless magic-link authentication and session management",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI spec as a pretty-printed JSON string
    pub fn to_json() -> Result<String, serde_json::Error> {
        Self::openapi().to_pretty_json()
    }
}
