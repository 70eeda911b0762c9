// Auth cookie handling
// Decision: One HttpOnly, SameSite=Lax cookie on path "/" carries the current token

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};

/// How the credential cookie is written
#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub name: String,
    pub secure: bool,
    /// Max-Age in seconds when set
    pub max_age_secs: i64,
}

impl CookieSettings {
    /// Read the credential from the request cookies
    pub fn credential<'a>(&self, jar: &'a CookieJar) -> Option<&'a str> {
        jar.get(&self.name).map(|cookie| cookie.value())
    }

    /// Add the credential cookie to the jar
    pub fn set(&self, jar: CookieJar, token: String) -> CookieJar {
        let cookie = Cookie::build((self.name.clone(), token))
            .path("/")
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::seconds(self.max_age_secs))
            .build();
        jar.add(cookie)
    }

    /// Expire the credential cookie on the client
    pub fn clear(&self, jar: CookieJar) -> CookieJar {
        jar.remove(Cookie::build((self.name.clone(), "")).path("/"))
    }
}
