//! API handlers for Waypoint.
//!
//! `auth` owns the CSRF guard and token issuance, `blueprints` the site and
//! client-resource imports, and `health`/`root` the unauthenticated probes.

pub mod auth;
pub mod blueprints;
pub mod health;
pub mod root;
