//! Token value generation and storage representation
//!
//! Values are random bytes from the operating system CSPRNG, encoded as
//! unpadded base64url. The store never sees a value, only its HMAC-SHA256
//! under a server secret, so a leaked table yields no usable credentials.
//! A fast keyed hash is enough here: the values already carry 256 bits of
//! entropy, so there is nothing for a slow password hash to protect.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::Sha256;

use rt_shared::config::SessionConfig;

use crate::errors::{DomainError, DomainResult};

type HmacSha256 = Hmac<Sha256>;

/// Minimum random bytes per token value (256 bits)
pub const MIN_TOKEN_BYTES: usize = 32;

/// Minimum length of the hashing secret
pub const MIN_SECRET_BYTES: usize = 32;

/// Generates refresh token values and computes their stored hash
#[derive(Clone)]
pub struct TokenCodec {
    mac: HmacSha256,
    token_bytes: usize,
}

impl TokenCodec {
    /// Creates a codec keyed with `secret`
    ///
    /// # Errors
    ///
    /// `DomainError::Validation` if the secret is shorter than
    /// `MIN_SECRET_BYTES` or `token_bytes` is below `MIN_TOKEN_BYTES`.
    pub fn new(secret: impl AsRef<[u8]>, token_bytes: usize) -> DomainResult<Self> {
        let secret = secret.as_ref();
        if secret.len() < MIN_SECRET_BYTES {
            return Err(DomainError::Validation {
                message: format!(
                    "refresh token secret must be at least {} bytes, got {}",
                    MIN_SECRET_BYTES,
                    secret.len()
                ),
            });
        }
        if token_bytes < MIN_TOKEN_BYTES {
            return Err(DomainError::Validation {
                message: format!(
                    "refresh tokens need at least {} random bytes, got {}",
                    MIN_TOKEN_BYTES, token_bytes
                ),
            });
        }

        let mac = HmacSha256::new_from_slice(secret).map_err(|e| DomainError::Internal {
            message: format!("Failed to key token hash: {}", e),
        })?;

        Ok(Self { mac, token_bytes })
    }

    /// Creates a codec from the session configuration
    pub fn from_config(config: &SessionConfig) -> DomainResult<Self> {
        Self::new(config.hashing_secret.as_bytes(), config.token_bytes)
    }

    /// Generates a fresh token value
    pub fn generate(&self) -> String {
        let mut bytes = vec![0u8; self.token_bytes];
        OsRng.fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Storage representation of a token value: lowercase hex HMAC-SHA256
    pub fn hash(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Length of every generated value
    pub fn encoded_len(&self) -> usize {
        (self.token_bytes * 4 + 2) / 3
    }

    /// Whether `token` could have been produced by this codec
    ///
    /// Lets callers reject garbage without a store round trip.
    pub fn is_well_formed(&self, token: &str) -> bool {
        token.len() == self.encoded_len()
            && token
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("token_bytes", &self.token_bytes)
            .finish_non_exhaustive()
    }
}
