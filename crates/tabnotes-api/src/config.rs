// Server configuration loaded from environment variables.
// Decision: Everything except the key paths has a local-development default
// Decision: No DATABASE_URL means in-memory storage (dev mode)

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: Option<String>,
    /// Public base URL of this API, used to build magic links
    pub api_url: String,
    /// UI base URL the link exchange redirects to (with trailing slash)
    pub redirect_url: String,
    pub allowed_origins: Vec<String>,
    pub max_body_size: usize,
    /// Background purge period; `None` disables the purge task
    pub purge_interval: Option<Duration>,
    /// Users registered at startup, as `(name, email)`
    pub seed_users: Vec<(String, String)>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            database_url: None,
            api_url: "http://localhost:8080".to_string(),
            redirect_url: "http://localhost:5173/".to_string(),
            allowed_origins: Vec::new(),
            max_body_size: 1024 * 1024,
            purge_interval: Some(Duration::from_secs(60 * 60)),
            seed_users: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let host = std::env::var("API_HOST").unwrap_or(defaults.host);
        let port = std::env::var("API_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.port);

        let database_url = std::env::var("DATABASE_URL")
            .ok()
            .filter(|s| !s.is_empty());

        let api_url = std::env::var("API_URL").unwrap_or(defaults.api_url);
        let redirect_url = std::env::var("REDIRECT_URL")
            .map(|s| with_trailing_slash(&s))
            .unwrap_or(defaults.redirect_url);

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .ok()
            .map(|s| parse_list(&s))
            .unwrap_or_default();

        let max_body_size = std::env::var("MAX_BODY_SIZE")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.max_body_size);

        let purge_interval = match std::env::var("SESSION_PURGE_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
        {
            Some(0) => None,
            Some(secs) => Some(Duration::from_secs(secs)),
            None => defaults.purge_interval,
        };

        let seed_users = std::env::var("SEED_USERS")
            .ok()
            .map(|s| parse_seed_users(&s))
            .unwrap_or_default();

        Self {
            host,
            port,
            database_url,
            api_url,
            redirect_url,
            allowed_origins,
            max_body_size,
            purge_interval,
            seed_users,
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Cookie and key configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub private_key_path: PathBuf,
    pub public_key_path: PathBuf,
    pub cookie_name: String,
    pub cookie_secure: bool,
}

impl AuthConfig {
    /// Load configuration from environment variables; key paths are required
    pub fn from_env() -> Result<Self> {
        let private_key_path = std::env::var("KEY_ECDSA_PRIVATE")
            .context("KEY_ECDSA_PRIVATE must point at the PEM private key")?;
        let public_key_path = std::env::var("KEY_ECDSA_PUBLIC")
            .context("KEY_ECDSA_PUBLIC must point at the PEM public key")?;

        let cookie_name =
            std::env::var("AUTH_COOKIE_NAME").unwrap_or_else(|_| "tabnotes_id".to_string());
        let cookie_secure = std::env::var("AUTH_COOKIE_SECURE")
            .map(|s| s.to_lowercase() == "true" || s == "1")
            .unwrap_or(false);

        Ok(Self {
            private_key_path: private_key_path.into(),
            public_key_path: public_key_path.into(),
            cookie_name,
            cookie_secure,
        })
    }
}

fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn with_trailing_slash(url: &str) -> String {
    if url.ends_with('/') {
        url.to_string()
    } else {
        format!("{url}/")
    }
}

/// `Alice <alice@example.com>, bob@example.com`
fn parse_seed_users(value: &str) -> Vec<(String, String)> {
    parse_list(value)
        .into_iter()
        .filter_map(|entry| match entry.split_once('<') {
            Some((name, rest)) => {
                let email = rest.trim_end_matches('>').trim();
                (!email.is_empty()).then(|| (name.trim().to_string(), email.to_string()))
            }
            None => {
                let name = entry.split('@').next().unwrap_or_default().to_string();
                Some((name, entry))
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.redirect_url, "http://localhost:5173/");
        assert_eq!(config.max_body_size, 1_048_576);
        assert_eq!(config.purge_interval, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list("http://a.test, http://b.test,,"),
            vec!["http://a.test", "http://b.test"]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_with_trailing_slash() {
        assert_eq!(with_trailing_slash("http://ui.test"), "http://ui.test/");
        assert_eq!(with_trailing_slash("http://ui.test/"), "http://ui.test/");
    }

    #[test]
    fn test_parse_seed_users() {
        let users = parse_seed_users("Alice Doe <alice@example.com>, bob@example.com");
        assert_eq!(
            users,
            vec![
                ("Alice Doe".to_string(), "alice@example.com".to_string()),
                ("bob".to_string(), "bob@example.com".to_string()),
            ]
        );
    }
}
