use clap::{Arg, ArgMatches, Command};
use secrecy::SecretString;

pub const ARG_CSRF_SECRET: &str = "csrf-secret";
pub const ARG_FRONTEND_BASE_URL: &str = "frontend-base-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_CSRF_SECRET)
                .long(ARG_CSRF_SECRET)
                .help("Server secret keying CSRF tokens with HMAC-SHA256")
                .long_help(
                    "Server secret keying CSRF tokens with HMAC-SHA256. Without it tokens are the plain SHA-256 of the session token. Changing it invalidates every issued token.",
                )
                .env("WAYPOINT_CSRF_SECRET")
                .hide_env_values(true),
        )
        .arg(
            Arg::new(ARG_FRONTEND_BASE_URL)
                .long(ARG_FRONTEND_BASE_URL)
                .help("Frontend base URL allowed by CORS")
                .env("WAYPOINT_FRONTEND_BASE_URL")
                .default_value("http://localhost:3002"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub frontend_base_url: String,
    pub csrf_secret: Option<SecretString>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            frontend_base_url: matches
                .get_one::<String>(ARG_FRONTEND_BASE_URL)
                .cloned()
                .unwrap_or_else(|| "http://localhost:3002".to_string()),
            csrf_secret: matches
                .get_one::<String>(ARG_CSRF_SECRET)
                .map(|secret| SecretString::from(secret.as_str())),
        }
    }
}
