//! Deterministic CSRF token derivation bound to the session token.
//!
//! The token is never stored: it is recomputed from the session cookie whenever
//! it is issued or checked. Without a configured secret the token is the plain
//! SHA-256 of the namespaced session token, which means anyone who learns the
//! session token value can also compute the CSRF token. Configure a secret to
//! switch to HMAC-SHA256 and close that gap.

use hmac::{Hmac, Mac, digest::InvalidLength};
use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Header carrying the client-supplied CSRF token (matched case-insensitively).
pub const CSRF_HEADER_NAME: &str = "x-csrf-token";

/// Domain separation prefix mixed into every digest.
const CSRF_NAMESPACE: &str = "csrf-token:";

type HmacSha256 = Hmac<Sha256>;

/// Derive the CSRF token for a session token using the unkeyed scheme.
///
/// Output is always 64 lowercase hex characters.
#[must_use]
pub fn derive(session_token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(CSRF_NAMESPACE.as_bytes());
    hasher.update(session_token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Compare two tokens without leaking the position of the first mismatch.
#[must_use]
pub fn tokens_match(expected: &str, supplied: &str) -> bool {
    expected.as_bytes().ct_eq(supplied.as_bytes()).into()
}

/// Derives and verifies CSRF tokens, optionally keyed with a server secret.
#[derive(Clone, Default)]
pub struct CsrfDeriver {
    mac: Option<HmacSha256>,
}

impl CsrfDeriver {
    /// Unkeyed deriver: `sha256("csrf-token:" || session)`.
    #[must_use]
    pub fn unkeyed() -> Self {
        Self { mac: None }
    }

    /// Keyed deriver: `hmac_sha256(secret, "csrf-token:" || session)`.
    ///
    /// # Errors
    /// Returns an error if the secret cannot be used as an HMAC key.
    pub fn keyed(secret: &SecretString) -> Result<Self, InvalidLength> {
        let mac = HmacSha256::new_from_slice(secret.expose_secret().as_bytes())?;
        Ok(Self { mac: Some(mac) })
    }

    #[must_use]
    pub fn is_keyed(&self) -> bool {
        self.mac.is_some()
    }

    /// Derive the CSRF token bound to `session_token`.
    #[must_use]
    pub fn derive(&self, session_token: &str) -> String {
        match &self.mac {
            None => derive(session_token),
            Some(mac) => {
                let mut mac = mac.clone();
                mac.update(CSRF_NAMESPACE.as_bytes());
                mac.update(session_token.as_bytes());
                hex::encode(mac.finalize().into_bytes())
            }
        }
    }

    /// Check a client-supplied token against the one derived from `session_token`.
    #[must_use]
    pub fn verify(&self, session_token: &str, supplied: &str) -> bool {
        tokens_match(&self.derive(session_token), supplied)
    }
}

impl std::fmt::Debug for CsrfDeriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CsrfDeriver")
            .field("keyed", &self.is_keyed())
            .finish()
    }
}
