//! HTTP clients for the Waypoint API.
//!
//! [`ApiClient`] is the session-aware client: it keeps the session cookie in a
//! jar and runs every request through a two-stage pipeline.
//!
//! 1) Request stage: mutating requests get `X-CSRF-Token`, fetching the token
//!    from `/auth/csrf-token` first when none is cached. A failed fetch is not
//!    an error; the request simply goes out without the header.
//! 2) Response stage: a `403` on a request that was not retried yet refreshes
//!    the token and re-sends the request exactly once with the new token.
//!
//! [`ServiceClient`] covers host-local calls to the public and private API
//! ports and has no CSRF handling.

mod config;
mod csrf;
mod errors;
mod http;
mod service;

pub use config::{ClientConfig, ClientEnv, DEFAULT_TIMEOUT};
pub use csrf::CsrfCache;
pub use errors::ClientError;
pub use service::ServiceClient;

use reqwest::{
    Client, Method, Response, StatusCode,
    cookie::Jar,
    header::{CONTENT_TYPE, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::debug;

use self::http::{
    build_url_with_base, handle_empty_response, handle_json_response, map_request_error,
};
use crate::{
    APP_USER_AGENT,
    api::handlers::auth::{CSRF_HEADER_NAME, CsrfTokenResponse, SESSION_COOKIE_NAME},
};

/// Issuance endpoint, relative to the API base URL.
pub const CSRF_TOKEN_PATH: &str = "/auth/csrf-token";

/// Session-aware API client. Clones share the transport, cookies and token cache.
#[derive(Clone, Debug)]
pub struct ApiClient {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    http: Client,
    jar: Arc<Jar>,
    config: ClientConfig,
    csrf: CsrfCache,
}

/// One logical request as it travels through the pipeline.
#[derive(Debug, Clone)]
struct PendingRequest {
    method: Method,
    url: String,
    body: Option<Vec<u8>>,
    retried: bool,
}

impl ApiClient {
    /// Build a client for a resolved configuration.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the HTTP transport cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout())
            .cookie_provider(Arc::clone(&jar))
            .build()
            .map_err(|err| ClientError::Config(format!("Failed to build HTTP client: {err}")))?;

        Ok(Self {
            inner: Arc::new(Inner {
                http,
                jar,
                config,
                csrf: CsrfCache::new(),
            }),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.inner.config.base_url()
    }

    /// Store `token` as the session cookie for the API origin.
    ///
    /// The cached CSRF token is left alone; a stale one is replaced by the
    /// `403` refresh on the next mutating call.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if `token` is empty or is not a valid
    /// cookie value, so it cannot smuggle in cookie attributes.
    pub fn set_session(&self, token: &str) -> Result<(), ClientError> {
        if token.is_empty() || !token.bytes().all(is_cookie_octet) {
            return Err(ClientError::Config(
                "Session token is not a valid cookie value".to_string(),
            ));
        }

        let cookie = format!("{SESSION_COOKIE_NAME}={token}; Path=/");
        self.inner
            .jar
            .add_cookie_str(&cookie, self.inner.config.base());
        Ok(())
    }

    /// Token currently cached, if any.
    pub async fn csrf_token(&self) -> Option<String> {
        self.inner.csrf.current().await
    }

    /// `GET` a JSON document.
    ///
    /// # Errors
    /// Returns a [`ClientError`] on transport failure, non-2xx status or bad body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.send(Method::GET, path, None::<&()>).await?;
        handle_json_response(response).await
    }

    /// `POST` a JSON body and parse the JSON response.
    ///
    /// # Errors
    /// Returns a [`ClientError`] on transport failure, non-2xx status or bad body.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::POST, path, Some(body)).await?;
        handle_json_response(response).await
    }

    /// `PUT` a JSON body and parse the JSON response.
    ///
    /// # Errors
    /// Returns a [`ClientError`] on transport failure, non-2xx status or bad body.
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(Method::PUT, path, Some(body)).await?;
        handle_json_response(response).await
    }

    /// `DELETE` a resource, ignoring the response body.
    ///
    /// # Errors
    /// Returns a [`ClientError`] on transport failure or non-2xx status.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.send(Method::DELETE, path, None::<&()>).await?;
        handle_empty_response(response).await
    }

    /// Run a request through the pipeline and return the raw response.
    ///
    /// Error statuses are returned as responses; only transport and encoding
    /// failures are errors here.
    ///
    /// # Errors
    /// Returns [`ClientError::Serialization`] if `body` cannot be encoded and
    /// [`ClientError::Network`]/[`ClientError::Timeout`] on transport failure.
    pub async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let body = body
            .map(|body| serde_json::to_vec(body))
            .transpose()
            .map_err(|err| ClientError::Serialization(format!("Failed to encode request: {err}")))?;

        let request = PendingRequest {
            method,
            url: build_url_with_base(self.base_url(), path),
            body,
            retried: false,
        };

        let token = self.attach_csrf(&request).await;
        let response = self.dispatch(&request, token.as_deref()).await?;
        self.refresh_on_forbidden(request, response).await
    }

    /// Request stage: the token to attach, fetching one when none is cached.
    async fn attach_csrf(&self, request: &PendingRequest) -> Option<String> {
        if is_safe_method(&request.method) {
            return None;
        }
        self.inner
            .csrf
            .ensure(|| self.fetch_csrf_token())
            .await
    }

    /// Response stage: refresh the token and re-send once on `403`.
    async fn refresh_on_forbidden(
        &self,
        mut request: PendingRequest,
        response: Response,
    ) -> Result<Response, ClientError> {
        if response.status() != StatusCode::FORBIDDEN || request.retried {
            return Ok(response);
        }
        request.retried = true;

        let Some(token) = self.inner.csrf.refresh(|| self.fetch_csrf_token()).await else {
            debug!(url = %request.url, "403 and no fresh CSRF token; not retrying");
            return Ok(response);
        };

        debug!(method = %request.method, url = %request.url, "Retrying after 403 with a fresh CSRF token");
        self.dispatch(&request, Some(&token)).await
    }

    async fn dispatch(
        &self,
        request: &PendingRequest,
        csrf_token: Option<&str>,
    ) -> Result<Response, ClientError> {
        let mut builder = self
            .inner
            .http
            .request(request.method.clone(), &request.url);

        if let Some(body) = &request.body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body.clone());
        }
        if let Some(token) = csrf_token {
            builder = builder.header(CSRF_HEADER_NAME, token);
        }

        builder.send().await.map_err(|err| map_request_error(&err))
    }

    /// Fetch a token for the current session. Any failure yields `None`.
    async fn fetch_csrf_token(&self) -> Option<String> {
        let url = build_url_with_base(self.base_url(), CSRF_TOKEN_PATH);

        let response = match self.inner.http.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                debug!("Failed to fetch CSRF token: {}", map_request_error(&err));
                return None;
            }
        };

        match handle_json_response::<CsrfTokenResponse>(response).await {
            Ok(body) if !body.csrf_token.is_empty() => Some(body.csrf_token),
            Ok(_) => None,
            Err(err) => {
                debug!("Failed to fetch CSRF token: {err}");
                None
            }
        }
    }
}

fn is_safe_method(method: &Method) -> bool {
    *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS
}

// RFC 6265 cookie-octet: visible ASCII except `"`, `,`, `;` and `\`.
fn is_cookie_octet(byte: u8) -> bool {
    matches!(byte, 0x21 | 0x23..=0x2B | 0x2D..=0x3A | 0x3C..=0x5B | 0x5D..=0x7E)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_methods_are_exact() {
        assert!(is_safe_method(&Method::GET));
        assert!(is_safe_method(&Method::HEAD));
        assert!(is_safe_method(&Method::OPTIONS));
        assert!(!is_safe_method(&Method::POST));
        assert!(!is_safe_method(&Method::PATCH));
        assert!(!is_safe_method(&Method::DELETE));
    }

    #[test]
    fn session_token_must_be_a_cookie_value() -> Result<(), ClientError> {
        let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:9/api/v1")?)?;

        client.set_session("tok1")?;
        client.set_session("aB3-_.~+/=")?;
        for token in ["", "tok; Domain=evil.test", "a,b", "two words", "q\"uote", "back\\slash"] {
            assert!(
                matches!(client.set_session(token), Err(ClientError::Config(_))),
                "{token:?} should be rejected"
            );
        }
        Ok(())
    }

    #[test]
    fn rejected_session_token_sets_no_cookie() -> Result<(), ClientError> {
        use reqwest::cookie::CookieStore;

        let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:9/api/v1")?)?;
        assert!(client.set_session("x; Path=/admin").is_err());
        assert!(client.inner.jar.cookies(client.inner.config.base()).is_none());

        client.set_session("tok1")?;
        let cookies = client.inner.jar.cookies(client.inner.config.base());
        assert_eq!(
            cookies.as_ref().and_then(|value| value.to_str().ok()),
            Some("waypoint_session=tok1")
        );
        Ok(())
    }

    #[test]
    fn clones_share_state() -> Result<(), ClientError> {
        let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:9/api/v1")?)?;
        let clone = client.clone();
        assert!(Arc::ptr_eq(&client.inner, &clone.inner));
        assert_eq!(clone.base_url(), "http://127.0.0.1:9/api/v1");
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_server_is_a_network_error() -> Result<(), ClientError> {
        // Port 9 (discard) is closed on test hosts; the token fetch fails silently first.
        let client = ApiClient::new(ClientConfig::new("http://127.0.0.1:9/api/v1")?)?;
        let result = client
            .post_json::<_, serde_json::Value>("/orgs/a/sites", &serde_json::json!({}))
            .await;
        assert!(matches!(
            result,
            Err(ClientError::Network(_) | ClientError::Timeout(_))
        ));
        assert_eq!(client.csrf_token().await, None);
        Ok(())
    }
}
