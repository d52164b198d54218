//! Auth state and configuration shared by the CSRF guard and handlers.

use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

use super::csrf::CsrfDeriver;

const DEFAULT_FRONTEND_BASE_URL: &str = "http://localhost:3002";

#[derive(Clone)]
pub struct AuthConfig {
    frontend_base_url: String,
    csrf_secret: Option<SecretString>,
}

impl AuthConfig {
    #[must_use]
    pub fn new(frontend_base_url: String) -> Self {
        Self {
            frontend_base_url,
            csrf_secret: None,
        }
    }

    /// Key CSRF tokens with a server secret. Blank secrets are ignored.
    #[must_use]
    pub fn with_csrf_secret(mut self, secret: Option<SecretString>) -> Self {
        self.csrf_secret = secret.filter(|secret| !secret.expose_secret().trim().is_empty());
        self
    }

    #[must_use]
    pub fn frontend_base_url(&self) -> &str {
        &self.frontend_base_url
    }

    #[must_use]
    pub fn has_csrf_secret(&self) -> bool {
        self.csrf_secret.is_some()
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new(DEFAULT_FRONTEND_BASE_URL.to_string())
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("frontend_base_url", &self.frontend_base_url)
            .field("csrf_secret", &self.csrf_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug)]
pub struct AuthState {
    config: AuthConfig,
    csrf: CsrfDeriver,
}

impl AuthState {
    /// Build the auth state, keying the CSRF deriver when a secret is configured.
    ///
    /// # Errors
    /// Returns an error if the configured secret cannot key the HMAC.
    pub fn new(config: AuthConfig) -> Result<Self> {
        let csrf = match &config.csrf_secret {
            Some(secret) => CsrfDeriver::keyed(secret).context("Invalid CSRF secret")?,
            None => {
                warn!(
                    "No CSRF secret configured: CSRF tokens are derived from the session token alone"
                );
                CsrfDeriver::unkeyed()
            }
        };

        Ok(Self { config, csrf })
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn csrf(&self) -> &CsrfDeriver {
        &self.csrf
    }
}
