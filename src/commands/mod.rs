//! Command handlers for the CLI
//!
//! - [`login`] -- browser login with a loopback redirect listener
//! - [`token`] -- refresh, token inspection, hash validation, logout
//! - [`api`]   -- authenticated API calls
//!
//! Handlers print human readable output on stdout and leave logging to
//! `tracing`, which the binary sends to stderr.

use std::sync::Arc;

use chrono::Utc;
use colored::Colorize;

use crate::auth::claims::extract_claims;
use crate::auth::exchange::TokenResponse;
use crate::config::Config;
use crate::error::{Result, TokenflowError};
use crate::http::{HttpClient, ReqwestClient};

pub mod api;
pub mod login;
pub mod token;

/// Builds the HTTP client for `config`.
pub fn http_client(config: &Config) -> Result<Arc<dyn HttpClient>> {
    let client = ReqwestClient::new(&config.http).map_err(TokenflowError::Http)?;
    Ok(Arc::new(client))
}

/// Prints expiry times and, when the access token is a JWT, its user key.
pub fn print_token_summary(token: &TokenResponse) {
    let now = Utc::now();

    println!(
        "  {:<22} {}",
        "Token type:".bold(),
        token.token_type.as_deref().unwrap_or("-")
    );

    let expires = token.expires_at();
    let remaining = (expires - now).num_seconds();
    let expiry = format!("{} ({}s left)", expires.to_rfc3339(), remaining.max(0));
    println!(
        "  {:<22} {}",
        "Access token expires:".bold(),
        if remaining > 0 {
            expiry.green()
        } else {
            expiry.red()
        }
    );

    match token.refresh_expires_at() {
        Some(at) => println!("  {:<22} {}", "Refresh expires:".bold(), at.to_rfc3339()),
        None => println!("  {:<22} {}", "Refresh expires:".bold(), "-".dimmed()),
    }

    // Opaque tokens are fine; only JWTs carry a user key.
    if let Ok(claims) = extract_claims(&token.access_token) {
        if let Some(user_key) = claims.user_key() {
            println!("  {:<22} {}", "User key:".bold(), user_key.cyan());
        }
    }
}
