// Authentication module
//
// Cookie-carried auth tokens, the require_auth gate, and the
// login / link-exchange / logout routes.

mod cookie;
mod middleware;
pub mod routes;

pub use cookie::CookieSettings;
pub use middleware::{require_auth, AuthError, Identity};
pub use routes::routes;
