//! Read-only access to the session cookie.
//!
//! Session issuance and expiry belong to session management; this module only
//! reads the cookie value so the CSRF token can be bound to it.

use axum::http::{HeaderMap, header::COOKIE};

/// Cookie carrying the opaque session token.
pub const SESSION_COOKIE_NAME: &str = "waypoint_session";

/// Return the session token from the `Cookie` header(s), if present and non-empty.
pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    // HTTP/2 clients may split cookies over several headers.
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            if key.trim() == SESSION_COOKIE_NAME {
                let val = val.trim();
                return if val.is_empty() {
                    None
                } else {
                    Some(val.to_string())
                };
            }
        }
    }
    None
}
