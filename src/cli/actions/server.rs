use crate::{api, cli::telemetry};
use anyhow::Result;
use secrecy::SecretString;
use tracing::debug;

pub struct Args {
    pub port: u16,
    pub frontend_base_url: String,
    pub csrf_secret: Option<SecretString>,
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("port", &self.port)
            .field("frontend_base_url", &self.frontend_base_url)
            .field("csrf_secret", &self.csrf_secret.as_ref().map(|_| "***"))
            .finish()
    }
}

/// Execute the server action.
/// # Errors
/// Returns an error if the auth state cannot be built or the server fails to start.
pub async fn execute(args: Args) -> Result<()> {
    debug!("Server args: {:?}", args);

    let auth_config = api::handlers::auth::AuthConfig::new(args.frontend_base_url)
        .with_csrf_secret(args.csrf_secret);

    let result = api::new(args.port, auth_config).await;

    telemetry::shutdown_tracer();

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secret() {
        let args = Args {
            port: 8080,
            frontend_base_url: "http://localhost:3002".to_string(),
            csrf_secret: Some(SecretString::from("hunter2")),
        };
        let debug = format!("{args:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("8080"));
    }
}
