//! Plain JSON clients for host-local service ports.

use reqwest::{Client, Method, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};

use super::{
    config::{ClientConfig, ClientEnv},
    errors::ClientError,
    http::{build_url_with_base, handle_empty_response, handle_json_response, map_request_error},
};
use crate::APP_USER_AGENT;

/// JSON client without cookies or CSRF handling.
#[derive(Clone, Debug)]
pub struct ServiceClient {
    http: Client,
    config: ClientConfig,
}

impl ServiceClient {
    /// # Errors
    /// Returns [`ClientError::Config`] if the transport cannot be built.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(config.timeout())
            .build()
            .map_err(|err| ClientError::Config(format!("Failed to build HTTP client: {err}")))?;
        Ok(Self { http, config })
    }

    /// Client for the public API port on this host.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the transport cannot be built.
    pub fn internal(env: &ClientEnv) -> Result<Self, ClientError> {
        Self::new(ClientConfig::new(&format!(
            "http://localhost:{}/api/v1",
            env.external_port
        ))?)
    }

    /// Client for the private API port on this host.
    ///
    /// # Errors
    /// Returns [`ClientError::Config`] if the transport cannot be built.
    pub fn private(env: &ClientEnv) -> Result<Self, ClientError> {
        Self::new(ClientConfig::new(&format!(
            "http://localhost:{}/api/v1",
            env.internal_port
        ))?)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// # Errors
    /// Returns a [`ClientError`] on transport failure, non-2xx status or bad body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self
            .request(Method::GET, path)
            .send()
            .await
            .map_err(|err| map_request_error(&err))?;
        handle_json_response(response).await
    }

    /// # Errors
    /// Returns a [`ClientError`] on transport failure, non-2xx status or bad body.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::POST, path)
            .json(body)
            .send()
            .await
            .map_err(|err| map_request_error(&err))?;
        handle_json_response(response).await
    }

    /// # Errors
    /// Returns a [`ClientError`] on transport failure, non-2xx status or bad body.
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .request(Method::PUT, path)
            .json(body)
            .send()
            .await
            .map_err(|err| map_request_error(&err))?;
        handle_json_response(response).await
    }

    /// # Errors
    /// Returns a [`ClientError`] on transport failure or non-2xx status.
    pub async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self
            .request(Method::DELETE, path)
            .send()
            .await
            .map_err(|err| map_request_error(&err))?;
        handle_empty_response(response).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, build_url_with_base(self.base_url(), path))
    }
}
