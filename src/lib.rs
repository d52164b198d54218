//! # Waypoint (session-bound CSRF protection)
//!
//! `waypoint` protects cookie-authenticated, state-changing requests against
//! cross-site request forgery without storing any CSRF state.
//!
//! ## CSRF Tokens
//!
//! A CSRF token is a pure function of the session token: the lowercase hex
//! SHA-256 of `csrf-token:<session>`. When a server secret is configured the
//! digest becomes an HMAC-SHA256 keyed with that secret. Either way the server
//! never writes or reads a side table to validate a token; it re-derives the
//! expected value from the session cookie on every guarded request.
//!
//! - **Issuance:** `GET /api/v1/auth/csrf-token` returns the token for the
//!   caller's session, or `401` when there is no session cookie.
//! - **Guard:** every non-`GET`/`HEAD`/`OPTIONS` request that carries a session
//!   cookie must send a matching `X-CSRF-Token` header, otherwise it is rejected
//!   with `403`. Requests without a session cookie are not subject to CSRF.
//!
//! ## Blueprints
//!
//! Organizations import declarative "client resource" definitions. Each import
//! runs inside a single store transaction and either applies completely or not
//! at all.
//!
//! ## Client
//!
//! [`client::ApiClient`] fetches, caches and attaches CSRF tokens for mutating
//! calls and refreshes the token once when the server answers `403`.

pub mod api;
pub mod cli;
pub mod client;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
