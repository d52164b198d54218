//! CSRF guard for cookie-authenticated, state-changing requests.
//!
//! Flow per request:
//! 1) `GET`, `HEAD` and `OPTIONS` pass through.
//! 2) Requests without a session cookie pass through; bearer or
//!    machine-to-machine calls are not exposed to cross-site forgery.
//! 3) Otherwise the expected token is derived from the session cookie and
//!    compared in constant time with `X-CSRF-Token`; a missing or different
//!    header is answered with `403`.

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::{
    csrf::{CSRF_HEADER_NAME, CsrfDeriver},
    session::extract_session_token,
    state::AuthState,
    types::ErrorResponse,
};

pub(crate) const CSRF_REJECTED: &str = "CSRF token missing or invalid";

/// Terminal outcome of the guard for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfDecision {
    SafeMethod,
    NoSession,
    Accepted,
    Rejected,
}

impl CsrfDecision {
    #[must_use]
    pub fn passes(self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Decide whether a request may proceed.
#[must_use]
pub fn evaluate(csrf: &CsrfDeriver, method: &Method, headers: &HeaderMap) -> CsrfDecision {
    if *method == Method::GET || *method == Method::HEAD || *method == Method::OPTIONS {
        return CsrfDecision::SafeMethod;
    }

    let Some(session_token) = extract_session_token(headers) else {
        return CsrfDecision::NoSession;
    };

    let supplied = headers
        .get(CSRF_HEADER_NAME)
        .and_then(|value| value.to_str().ok());

    match supplied {
        Some(supplied) if csrf.verify(&session_token, supplied) => CsrfDecision::Accepted,
        _ => CsrfDecision::Rejected,
    }
}

/// Axum middleware enforcing [`evaluate`].
pub async fn csrf_protection(
    State(auth_state): State<Arc<AuthState>>,
    request: Request,
    next: Next,
) -> Response {
    let decision = evaluate(auth_state.csrf(), request.method(), request.headers());

    if decision.passes() {
        debug!(?decision, "CSRF check passed");
        return next.run(request).await;
    }

    warn!(
        method = %request.method(),
        path = %request.uri().path(),
        has_header = request.headers().contains_key(CSRF_HEADER_NAME),
        "CSRF token missing or invalid"
    );
    csrf_rejection()
}

pub(crate) fn csrf_rejection() -> Response {
    (StatusCode::FORBIDDEN, Json(ErrorResponse::new(CSRF_REJECTED))).into_response()
}

#[cfg(test)]
mod tests {
    use super::super::csrf::derive;
    use super::*;
    use axum::http::{HeaderValue, header::COOKIE};

    fn headers(cookie: Option<&str>, token: Option<&str>) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Some(cookie) = cookie {
            if let Ok(value) = HeaderValue::from_str(cookie) {
                headers.insert(COOKIE, value);
            }
        }
        if let Some(token) = token {
            if let Ok(value) = HeaderValue::from_str(token) {
                headers.insert("X-CSRF-Token", value);
            }
        }
        headers
    }

    #[test]
    fn safe_methods_skip_checks() {
        let csrf = CsrfDeriver::unkeyed();
        let with_session = headers(Some("waypoint_session=abc"), None);
        for method in [Method::GET, Method::HEAD, Method::OPTIONS] {
            assert_eq!(
                evaluate(&csrf, &method, &with_session),
                CsrfDecision::SafeMethod
            );
        }
    }

    #[test]
    fn lowercase_method_is_not_safe() -> Result<(), axum::http::method::InvalidMethod> {
        let csrf = CsrfDeriver::unkeyed();
        let method = Method::from_bytes(b"get")?;
        assert_eq!(
            evaluate(&csrf, &method, &headers(Some("waypoint_session=abc"), None)),
            CsrfDecision::Rejected
        );
        Ok(())
    }

    #[test]
    fn missing_session_is_not_checked() {
        let csrf = CsrfDeriver::unkeyed();
        for method in [Method::POST, Method::PUT, Method::PATCH, Method::DELETE] {
            assert_eq!(
                evaluate(&csrf, &method, &headers(None, Some("anything"))),
                CsrfDecision::NoSession
            );
        }
    }

    #[test]
    fn matching_token_is_accepted() {
        let csrf = CsrfDeriver::unkeyed();
        let token = derive("abc");
        assert_eq!(
            evaluate(
                &csrf,
                &Method::POST,
                &headers(Some("waypoint_session=abc"), Some(&token))
            ),
            CsrfDecision::Accepted
        );
    }

    #[test]
    fn missing_or_wrong_token_is_rejected() {
        let csrf = CsrfDeriver::unkeyed();
        let wrong = derive("wrong");
        assert_eq!(
            evaluate(
                &csrf,
                &Method::POST,
                &headers(Some("waypoint_session=abc"), Some(&wrong))
            ),
            CsrfDecision::Rejected
        );
        assert_eq!(
            evaluate(
                &csrf,
                &Method::DELETE,
                &headers(Some("waypoint_session=abc"), None)
            ),
            CsrfDecision::Rejected
        );
    }

    #[test]
    fn unkeyed_token_is_rejected_by_keyed_guard() -> Result<(), hmac::digest::InvalidLength> {
        let csrf = CsrfDeriver::keyed(&secrecy::SecretString::from("server-secret"))?;
        let unkeyed = derive("abc");
        assert_eq!(
            evaluate(
                &csrf,
                &Method::POST,
                &headers(Some("waypoint_session=abc"), Some(&unkeyed))
            ),
            CsrfDecision::Rejected
        );
        let keyed = csrf.derive("abc");
        assert_eq!(
            evaluate(
                &csrf,
                &Method::POST,
                &headers(Some("waypoint_session=abc"), Some(&keyed))
            ),
            CsrfDecision::Accepted
        );
        Ok(())
    }
}
