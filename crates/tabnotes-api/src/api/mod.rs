// HTTP API routes
//
// Health and current-user session management. Auth routes live in crate::auth.

pub mod common;
pub mod health;
pub mod sessions;

pub use common::{ApiError, ErrorResponse, ListResponse};
