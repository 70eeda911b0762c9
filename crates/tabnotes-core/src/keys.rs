// Key provider for ES256 token signing
// Decision: Key material is read once at startup and never mutated afterwards
// Decision: Parsing stays fallible per call so callers can tell key faults apart from bad tokens

use std::path::Path;

use jsonwebtoken::{DecodingKey, EncodingKey};

use crate::error::KeyError;

/// Source of the asymmetric keypair used to sign and verify tokens.
///
/// Implementations must be cheap to call concurrently; the material behind
/// them is read-only after construction.
pub trait KeyProvider: Send + Sync + 'static {
    /// Parse the private (signing) key
    fn parse_private_key(&self) -> Result<EncodingKey, KeyError>;

    /// Parse the public (verification) key
    fn parse_public_key(&self) -> Result<DecodingKey, KeyError>;
}

/// P-256 keypair held as PEM text
#[derive(Clone)]
pub struct EcdsaKeyPair {
    private_pem: String,
    public_pem: String,
}

impl EcdsaKeyPair {
    /// Build from PEM strings (PKCS#8 private key, SPKI public key)
    pub fn from_pem(private_pem: impl Into<String>, public_pem: impl Into<String>) -> Self {
        Self {
            private_pem: private_pem.into().trim().to_string(),
            public_pem: public_pem.into().trim().to_string(),
        }
    }

    /// Read both PEM files from disk
    pub fn from_files(
        private_path: impl AsRef<Path>,
        public_path: impl AsRef<Path>,
    ) -> Result<Self, KeyError> {
        let private_pem = read_key_file(private_path.as_ref())?;
        let public_pem = read_key_file(public_path.as_ref())?;
        Ok(Self::from_pem(private_pem, public_pem))
    }

    /// Parse both keys once so a misconfigured deployment fails at startup
    pub fn validate(&self) -> Result<(), KeyError> {
        self.parse_private_key()?;
        self.parse_public_key()?;
        Ok(())
    }
}

impl std::fmt::Debug for EcdsaKeyPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EcdsaKeyPair")
            .field("private_pem", &"<redacted>")
            .field("public_pem", &self.public_pem)
            .finish()
    }
}

impl KeyProvider for EcdsaKeyPair {
    fn parse_private_key(&self) -> Result<EncodingKey, KeyError> {
        EncodingKey::from_ec_pem(self.private_pem.as_bytes()).map_err(KeyError::InvalidPrivateKey)
    }

    fn parse_public_key(&self) -> Result<DecodingKey, KeyError> {
        DecodingKey::from_ec_pem(self.public_pem.as_bytes()).map_err(KeyError::InvalidPublicKey)
    }
}

fn read_key_file(path: &Path) -> Result<String, KeyError> {
    std::fs::read_to_string(path).map_err(|source| KeyError::Read {
        path: path.display().to_string(),
        source,
    })
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::EcdsaKeyPair;

    pub const PRIVATE_PEM: &str = include_str!("../testdata/es256_private.pem");
    pub const PUBLIC_PEM: &str = include_str!("../testdata/es256_public.pem");
    pub const OTHER_PUBLIC_PEM: &str = include_str!("../testdata/es256_other_public.pem");

    pub fn keypair() -> EcdsaKeyPair {
        EcdsaKeyPair::from_pem(PRIVATE_PEM, PUBLIC_PEM)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_keys_parse() {
        let keys = fixtures::keypair();
        assert!(keys.validate().is_ok());
    }

    #[test]
    fn test_invalid_private_key() {
        let keys = EcdsaKeyPair::from_pem("not a key", fixtures::PUBLIC_PEM);
        assert!(matches!(
            keys.parse_private_key(),
            Err(KeyError::InvalidPrivateKey(_))
        ));
        assert!(keys.parse_public_key().is_ok());
    }

    #[test]
    fn test_invalid_public_key() {
        let keys = EcdsaKeyPair::from_pem(fixtures::PRIVATE_PEM, "garbage");
        let err = keys.validate().unwrap_err();
        assert!(matches!(err, KeyError::InvalidPublicKey(_)));
    }

    #[test]
    fn test_missing_key_file() {
        let err = EcdsaKeyPair::from_files("/nonexistent/private.pem", "/nonexistent/public.pem")
            .unwrap_err();
        match err {
            KeyError::Read { path, .. } => assert_eq!(path, "/nonexistent/private.pem"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_debug_redacts_private_key() {
        let rendered = format!("{:?}", fixtures::keypair());
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("PRIVATE KEY"));
    }
}
