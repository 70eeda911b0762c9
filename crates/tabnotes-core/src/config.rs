// Session lifetimes loaded from environment variables.
// Decision: Magic links live 15 minutes, auth tokens 7 days unless overridden
// Decision: Read once at startup and passed by value into the session manager
// Decision: Out-of-range overrides fall back to the defaults; the magic-link window stays shorter than the auth window

use chrono::Duration;
use tracing::warn;

pub const DEFAULT_MAGIC_LINK_TTL_SECS: i64 = 15 * 60;
pub const DEFAULT_AUTH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Upper bound for SESSION_MAGIC_LINK_TTL_SECS (one day)
pub const MAX_MAGIC_LINK_TTL_SECS: i64 = 24 * 60 * 60;
/// Upper bound for SESSION_AUTH_TOKEN_TTL_SECS (one year)
pub const MAX_AUTH_TOKEN_TTL_SECS: i64 = 365 * 24 * 60 * 60;

/// Session window configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Lifetime of an unverified session and its magic-link token
    pub magic_link_ttl: Duration,
    /// Lifetime of a verified session and its auth token
    pub auth_token_ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            magic_link_ttl: Duration::seconds(DEFAULT_MAGIC_LINK_TTL_SECS),
            auth_token_ttl: Duration::seconds(DEFAULT_AUTH_TOKEN_TTL_SECS),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let magic_link_ttl = bounded_seconds(
            &lookup,
            "SESSION_MAGIC_LINK_TTL_SECS",
            MAX_MAGIC_LINK_TTL_SECS,
        )
        .unwrap_or(DEFAULT_MAGIC_LINK_TTL_SECS);
        let auth_token_ttl = bounded_seconds(
            &lookup,
            "SESSION_AUTH_TOKEN_TTL_SECS",
            MAX_AUTH_TOKEN_TTL_SECS,
        )
        .unwrap_or(DEFAULT_AUTH_TOKEN_TTL_SECS);

        if magic_link_ttl >= auth_token_ttl {
            warn!(
                magic_link_ttl,
                auth_token_ttl,
                "magic-link window must be shorter than the auth window, using defaults"
            );
            return Self::default();
        }

        Self {
            magic_link_ttl: Duration::seconds(magic_link_ttl),
            auth_token_ttl: Duration::seconds(auth_token_ttl),
        }
    }
}

fn bounded_seconds(lookup: &impl Fn(&str) -> Option<String>, key: &str, max: i64) -> Option<i64> {
    let raw = lookup(key)?;
    match raw.trim().parse::<i64>() {
        Ok(secs) if secs > 0 && secs <= max => Some(secs),
        _ => {
            warn!(key, value = %raw, max, "ignoring out-of-range session window");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_default_windows() {
        let config = SessionConfig::default();
        assert_eq!(config.magic_link_ttl, Duration::minutes(15));
        assert_eq!(config.auth_token_ttl, Duration::days(7));
    }

    #[test]
    fn test_from_env_overrides_and_ignores_garbage() {
        std::env::set_var("SESSION_MAGIC_LINK_TTL_SECS", "60");
        std::env::set_var("SESSION_AUTH_TOKEN_TTL_SECS", "not-a-number");

        let config = SessionConfig::from_env();
        assert_eq!(config.magic_link_ttl, Duration::seconds(60));
        assert_eq!(config.auth_token_ttl, Duration::days(7));

        std::env::remove_var("SESSION_MAGIC_LINK_TTL_SECS");
        std::env::remove_var("SESSION_AUTH_TOKEN_TTL_SECS");
    }

    #[test]
    fn test_huge_windows_fall_back_to_defaults() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("SESSION_MAGIC_LINK_TTL_SECS", "9000000000000"),
            ("SESSION_AUTH_TOKEN_TTL_SECS", "10000000000000000"),
        ]));
        assert_eq!(config, SessionConfig::default());

        let config = SessionConfig::from_lookup(lookup(&[(
            "SESSION_AUTH_TOKEN_TTL_SECS",
            (MAX_AUTH_TOKEN_TTL_SECS + 1).to_string().as_str(),
        )]));
        assert_eq!(config.auth_token_ttl, Duration::days(7));
    }

    #[test]
    fn test_windows_at_the_bounds() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("SESSION_MAGIC_LINK_TTL_SECS", "86400"),
            ("SESSION_AUTH_TOKEN_TTL_SECS", "31536000"),
        ]));
        assert_eq!(config.magic_link_ttl, Duration::days(1));
        assert_eq!(config.auth_token_ttl, Duration::days(365));
    }

    #[test]
    fn test_magic_link_window_must_be_shorter() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("SESSION_MAGIC_LINK_TTL_SECS", "7200"),
            ("SESSION_AUTH_TOKEN_TTL_SECS", "3600"),
        ]));
        assert_eq!(config, SessionConfig::default());

        let equal = SessionConfig::from_lookup(lookup(&[
            ("SESSION_MAGIC_LINK_TTL_SECS", "3600"),
            ("SESSION_AUTH_TOKEN_TTL_SECS", "3600"),
        ]));
        assert_eq!(equal, SessionConfig::default());
    }

    #[test]
    fn test_negative_and_zero_ignored() {
        let config = SessionConfig::from_lookup(lookup(&[
            ("SESSION_MAGIC_LINK_TTL_SECS", "0"),
            ("SESSION_AUTH_TOKEN_TTL_SECS", "-5"),
        ]));
        assert_eq!(config, SessionConfig::default());
    }
}
