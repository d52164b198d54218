//! Session-bound CSRF protection.
//!
//! The CSRF token is derived from the session cookie on demand, so neither the
//! issuance endpoint nor the guard touches storage.
//!
//! ## Hardening
//!
//! Without `WAYPOINT_CSRF_SECRET` the token is `sha256("csrf-token:" || session)`.
//! That is enough to stop cross-site forms that cannot read responses or set
//! custom headers, but a leaked session token value also yields its CSRF token.
//! Setting the secret switches derivation to HMAC-SHA256 with the same output
//! shape; tokens issued before the switch stop validating.

pub(crate) mod csrf;
pub(crate) mod csrf_token;
pub(crate) mod guard;
pub(crate) mod session;
mod state;
pub(crate) mod types;

pub use csrf::{CSRF_HEADER_NAME, CsrfDeriver, derive, tokens_match};
pub use guard::{CsrfDecision, csrf_protection, evaluate};
pub use session::SESSION_COOKIE_NAME;
pub use state::{AuthConfig, AuthState};
pub use types::{CsrfTokenResponse, ErrorResponse};
