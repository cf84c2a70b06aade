//! Tokenflow - OAuth2 token lifecycle CLI
//!
#![doc = "Main entry point for the Tokenflow command-line tool."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use tokenflow::cli::{Cli, Commands};
use tokenflow::commands;
use tokenflow::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose, cli.log_json);

    // Load configuration
    let config_path = cli.config.as_deref().unwrap_or("config/config.yaml");
    let config = Config::load(config_path, &cli)?;

    // Token inspection works offline and without a registered app
    if needs_app(&cli.command) {
        config.validate()?;
    }

    match cli.command {
        Commands::Login { data, no_browser } => {
            tracing::info!("Starting login for client {}", config.app.client_id);
            commands::login::run_login(config, data, no_browser).await
        }
        Commands::Refresh { refresh_token } => {
            commands::token::run_refresh(config, refresh_token).await
        }
        Commands::TokenInfo { token } => commands::token::run_token_info(&config, token),
        Commands::ValidateHashes {
            token,
            code,
            state,
            access_token,
        } => commands::token::run_validate_hashes(
            &token,
            code.as_deref(),
            state.as_deref(),
            access_token.as_deref(),
        ),
        Commands::Api {
            method,
            path,
            body,
            request_id,
        } => {
            tracing::debug!("Calling {} {}", method, path);
            commands::api::run_api(config, method, &path, body.as_deref(), request_id).await
        }
        Commands::Logout => commands::token::run_logout(&config),
    }
}

fn needs_app(command: &Commands) -> bool {
    !matches!(
        command,
        Commands::ValidateHashes { .. } | Commands::TokenInfo { token: Some(_) }
    )
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so command output on stdout stays clean. With `json`
/// each event is one JSON object carrying the request record fields.
fn init_tracing(verbose: bool, json: bool) {
    let default = if verbose {
        "tokenflow=debug"
    } else {
        "tokenflow=info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
