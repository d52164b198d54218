//! Shared request plumbing: URL joining, error mapping and response decoding.
//!
//! Both the CSRF-aware [`ApiClient`](super::ApiClient) and the plain
//! [`ServiceClient`](super::ServiceClient) go through these helpers so error
//! bodies and timeouts are reported the same way.

use reqwest::Response;
use serde::de::DeserializeOwned;

use super::errors::ClientError;

/// Maximum number of error body characters surfaced to callers.
const MAX_ERROR_CHARS: usize = 200;

/// Builds a URL from an explicit base URL and the provided path.
pub(crate) fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps transport errors into `ClientError` variants with timeout detection.
pub(crate) fn map_request_error(err: &reqwest::Error) -> ClientError {
    if err.is_timeout() {
        ClientError::Timeout("Request timed out. Please try again.".to_string())
    } else if err.is_builder() {
        ClientError::Serialization(format!("Failed to build request: {err}"))
    } else {
        ClientError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
pub(crate) async fn handle_json_response<T: DeserializeOwned>(
    response: Response,
) -> Result<T, ClientError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| ClientError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

/// Handles responses whose body is ignored on success.
pub(crate) async fn handle_empty_response(response: Response) -> Result<(), ClientError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(http_error(response).await)
    }
}

async fn http_error(response: Response) -> ClientError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    ClientError::Http {
        status,
        message: sanitize_body(&body),
    }
}

/// Trims and truncates error bodies for caller-facing messages.
pub(crate) fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        "Request failed.".to_string()
    } else {
        trimmed.chars().take(MAX_ERROR_CHARS).collect()
    }
}
