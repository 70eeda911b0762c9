// Token signer for magic-link and auth tokens
// Decision: ES256 (asymmetric) so verification only needs the public key
// Decision: Magic-link and auth claims are different shapes; neither deserializes as the other

use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::TokenError;
use crate::keys::KeyProvider;

/// Claims carried by the short-lived token mailed to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MagicLinkClaims {
    /// Subject (contact address the link was sent to)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token ID, keeps two links issued in the same second distinct
    pub jti: String,
}

/// Claims carried by the long-lived token stored in the auth cookie
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokenClaims {
    /// Subject (user ID)
    pub sub: Uuid,
    /// Session ID
    pub sid: Uuid,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

/// Creates and verifies signed tokens
pub trait TokenSigner: Send + Sync + 'static {
    /// Sign a magic-link token for `subject` (the user's email)
    fn generate_magic_link_token(
        &self,
        subject: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError>;

    /// Sign an auth token binding `user_id` to `session_id`
    fn generate_auth_token(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError>;

    /// Verify signature and temporal claims of an auth token.
    ///
    /// Returns `TokenError::Key` when the public key cannot be loaded and
    /// `TokenError::Invalid` for anything wrong with the token itself.
    fn verify_auth_token(&self, token: &str) -> Result<AuthTokenClaims, TokenError>;

    /// Verify signature and temporal claims of a magic-link token
    fn verify_magic_link_token(&self, token: &str) -> Result<MagicLinkClaims, TokenError>;
}

/// JWT implementation of [`TokenSigner`] backed by a [`KeyProvider`]
#[derive(Clone)]
pub struct JwtTokenSigner {
    keys: Arc<dyn KeyProvider>,
}

impl JwtTokenSigner {
    pub fn new(keys: Arc<dyn KeyProvider>) -> Self {
        Self { keys }
    }

    fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        let private_key = self.keys.parse_private_key()?;
        encode(&Header::new(Algorithm::ES256), claims, &private_key).map_err(TokenError::Sign)
    }

    fn verify<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, TokenError> {
        let public_key = self.keys.parse_public_key()?;
        verify_with_key(token, &public_key)
    }
}

impl TokenSigner for JwtTokenSigner {
    fn generate_magic_link_token(
        &self,
        subject: &str,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = MagicLinkClaims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Uuid::now_v7().simple().to_string(),
        };
        self.sign(&claims)
    }

    fn generate_auth_token(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = AuthTokenClaims {
            sub: user_id,
            sid: session_id,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };
        self.sign(&claims)
    }

    fn verify_auth_token(&self, token: &str) -> Result<AuthTokenClaims, TokenError> {
        self.verify(token)
    }

    fn verify_magic_link_token(&self, token: &str) -> Result<MagicLinkClaims, TokenError> {
        self.verify(token)
    }
}

/// Verify `token` against an already parsed public key
pub fn verify_with_key<T: for<'de> Deserialize<'de>>(
    token: &str,
    public_key: &DecodingKey,
) -> Result<T, TokenError> {
    let mut validation = Validation::new(Algorithm::ES256);
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.set_required_spec_claims(&["exp", "sub"]);

    let token_data = decode::<T>(token, public_key, &validation).map_err(TokenError::Invalid)?;
    Ok(token_data.claims)
}

/// Fingerprint a token for storage (SHA-256, hex encoded)
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{fixtures, EcdsaKeyPair};
    use chrono::Duration;

    fn signer() -> JwtTokenSigner {
        JwtTokenSigner::new(Arc::new(fixtures::keypair()))
    }

    #[test]
    fn test_generate_auth_token() {
        let signer = signer();
        let user_id = Uuid::now_v7();
        let session_id = Uuid::now_v7();
        let now = Utc::now();

        let token = signer
            .generate_auth_token(user_id, session_id, now, now + Duration::days(7))
            .unwrap();
        assert!(!token.is_empty());

        let claims = signer.verify_auth_token(&token).unwrap();
        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.sid, session_id);
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, (now + Duration::days(7)).timestamp());
    }

    #[test]
    fn test_generate_magic_link_token() {
        let signer = signer();
        let now = Utc::now();

        let token = signer
            .generate_magic_link_token("a@example.com", now, now + Duration::minutes(15))
            .unwrap();

        let claims = signer.verify_magic_link_token(&token).unwrap();
        assert_eq!(claims.sub, "a@example.com");
        assert!(!claims.jti.is_empty());
    }

    #[test]
    fn test_magic_links_issued_together_differ() {
        let signer = signer();
        let now = Utc::now();
        let exp = now + Duration::minutes(15);

        let first = signer.generate_magic_link_token("a@example.com", now, exp).unwrap();
        let second = signer.generate_magic_link_token("a@example.com", now, exp).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_magic_link_is_not_an_auth_token() {
        let signer = signer();
        let now = Utc::now();
        let token = signer
            .generate_magic_link_token("a@example.com", now, now + Duration::minutes(15))
            .unwrap();

        let result = signer.verify_auth_token(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_auth_token_is_not_a_magic_link() {
        let signer = signer();
        let now = Utc::now();
        let token = signer
            .generate_auth_token(Uuid::now_v7(), Uuid::now_v7(), now, now + Duration::days(7))
            .unwrap();

        let result = signer.verify_magic_link_token(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_expired_token_fails() {
        let signer = signer();
        // Well past the default validation leeway
        let now = Utc::now();
        let token = signer
            .generate_auth_token(
                Uuid::now_v7(),
                Uuid::now_v7(),
                now - Duration::minutes(20),
                now - Duration::minutes(10),
            )
            .unwrap();

        let result = signer.verify_auth_token(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_invalid_token() {
        let result = signer().verify_auth_token("invalid-token");
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_tampered_token_fails() {
        let signer = signer();
        let now = Utc::now();
        let token = signer
            .generate_auth_token(Uuid::now_v7(), Uuid::now_v7(), now, now + Duration::days(7))
            .unwrap();

        let mut parts: Vec<&str> = token.split('.').collect();
        let forged = signer
            .generate_auth_token(Uuid::now_v7(), Uuid::now_v7(), now, now + Duration::days(7))
            .unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap().to_string();
        parts[1] = &forged_payload;
        let tampered = parts.join(".");

        assert!(signer.verify_auth_token(&tampered).is_err());
    }

    #[test]
    fn test_different_keys_fail() {
        let signer = signer();
        let now = Utc::now();
        let token = signer
            .generate_auth_token(Uuid::now_v7(), Uuid::now_v7(), now, now + Duration::days(7))
            .unwrap();

        let other = EcdsaKeyPair::from_pem(fixtures::PRIVATE_PEM, fixtures::OTHER_PUBLIC_PEM);
        let other_signer = JwtTokenSigner::new(Arc::new(other));
        let result = other_signer.verify_auth_token(&token);
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_unparsable_private_key_fails_signing() {
        let broken = EcdsaKeyPair::from_pem("not a key", fixtures::PUBLIC_PEM);
        let signer = JwtTokenSigner::new(Arc::new(broken));
        let now = Utc::now();

        let result = signer.generate_magic_link_token("a@example.com", now, now);
        assert!(matches!(result, Err(TokenError::Key(_))));
    }

    #[test]
    fn test_unparsable_public_key_is_a_key_error() {
        let broken = EcdsaKeyPair::from_pem(fixtures::PRIVATE_PEM, "not a key");
        let signer = JwtTokenSigner::new(Arc::new(broken));

        let result = signer.verify_auth_token("whatever");
        assert!(matches!(result, Err(TokenError::Key(_))));
    }

    #[test]
    fn test_hash_token() {
        let hash1 = hash_token("test-token-123");
        let hash2 = hash_token("test-token-123");

        assert_eq!(hash1, hash2);
        assert!(hash1.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash1.len(), 64);
        assert_ne!(hash1, hash_token("test-token-124"));
    }
}
