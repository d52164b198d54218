//! Client configuration and base-URL resolution.
//!
//! Configuration values are public; the session lives in the cookie jar and
//! never in these structs.

use std::time::Duration;
use url::Url;

use super::errors::ClientError;

/// Default request timeout applied to every client.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const API_SUFFIX: &str = "api/v1";

/// Ports and URLs of the deployment the client talks to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientEnv {
    /// Port the dashboard is served on when accessed directly.
    pub next_port: u16,
    /// Public API port.
    pub external_port: u16,
    /// Private API port, reachable from the host only.
    pub internal_port: u16,
    /// Dashboard URL used when the caller comes through a proxy.
    pub dashboard_url: String,
}

impl Default for ClientEnv {
    fn default() -> Self {
        Self {
            next_port: 3002,
            external_port: 8080,
            internal_port: 8081,
            dashboard_url: "http://localhost:3002".to_string(),
        }
    }
}

/// Fully resolved configuration for [`ApiClient`](super::ApiClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: Url,
    timeout: Duration,
}

impl ClientConfig {
    /// Use `base_url` (for example `http://localhost:8080/api/v1`) as is.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] unless `base_url` is an absolute
    /// `http`/`https` URL with a host.
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Resolve the base URL from the caller's current location.
    ///
    /// A location on `next_port` addresses the service directly, so the API is
    /// reached on the same host at `external_port`. Anything else goes through
    /// the dashboard URL.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] when the resulting URL is unusable.
    pub fn from_location(location: &Url, env: &ClientEnv) -> Result<Self, ClientError> {
        let base_url = if location.port_or_known_default() == Some(env.next_port) {
            let host = location.host_str().ok_or_else(|| {
                ClientError::Config(format!("Location has no host: {location}"))
            })?;
            format!(
                "{}://{}:{}/{API_SUFFIX}",
                location.scheme(),
                host,
                env.external_port
            )
        } else {
            format!(
                "{}/{API_SUFFIX}",
                env.dashboard_url.trim().trim_end_matches('/')
            )
        };

        Self::new(&base_url)
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base_url
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn parse_base_url(base_url: &str) -> Result<Url, ClientError> {
    let trimmed = base_url.trim();
    if trimmed.is_empty() {
        return Err(ClientError::Config(
            "Failed to create api client, invalid environment".to_string(),
        ));
    }

    let url = Url::parse(trimmed)
        .map_err(|err| ClientError::Config(format!("Invalid base URL {trimmed}: {err}")))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ClientError::Config(format!(
            "Base URL must be an http(s) URL with a host: {trimmed}"
        )));
    }

    Ok(url)
}
