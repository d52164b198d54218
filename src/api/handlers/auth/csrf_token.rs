//! CSRF token issuance.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::debug;

use super::{
    session::extract_session_token,
    state::AuthState,
    types::{CsrfTokenResponse, ErrorResponse},
};

pub(crate) const NO_ACTIVE_SESSION: &str = "No active session";

#[utoipa::path(
    get,
    path = "/api/v1/auth/csrf-token",
    responses(
        (status = 200, description = "CSRF token bound to the current session", body = CsrfTokenResponse),
        (status = 401, description = "No active session", body = ErrorResponse)
    ),
    tag = "auth"
)]
pub async fn csrf_token(
    headers: HeaderMap,
    auth_state: Extension<Arc<AuthState>>,
) -> impl IntoResponse {
    let Some(session_token) = extract_session_token(&headers) else {
        debug!("CSRF token requested without a session cookie");
        return (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new(NO_ACTIVE_SESSION)),
        )
            .into_response();
    };

    let response = CsrfTokenResponse {
        csrf_token: auth_state.csrf().derive(&session_token),
    };
    (StatusCode::OK, Json(response)).into_response()
}
