//! Command-line argument dispatch.
//!
//! Maps validated CLI matches to an action, such as starting the API server
//! with its CSRF configuration.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{ARG_PORT, csrf};
use anyhow::Result;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>(ARG_PORT).copied().unwrap_or(8080);
    let csrf_opts = csrf::Options::parse(matches);

    Ok(Action::Server(Args {
        port,
        frontend_base_url: csrf_opts.frontend_base_url,
        csrf_secret: csrf_opts.csrf_secret,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_server_action_from_env() {
        temp_env::with_vars(
            [
                ("WAYPOINT_PORT", Some("9443")),
                ("WAYPOINT_CSRF_SECRET", None::<&str>),
                ("WAYPOINT_FRONTEND_BASE_URL", Some("https://dash.waypoint.dev")),
            ],
            || {
                let matches = crate::cli::commands::new().get_matches_from(vec!["waypoint"]);
                let result = handler(&matches);
                assert!(result.is_ok());
                if let Ok(Action::Server(args)) = result {
                    assert_eq!(args.port, 9443);
                    assert_eq!(args.frontend_base_url, "https://dash.waypoint.dev");
                    assert!(args.csrf_secret.is_none());
                }
            },
        );
    }
}
