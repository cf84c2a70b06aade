//! Token commands: refresh, token-info, validate-hashes, logout

use std::sync::Arc;

use chrono::Utc;
use colored::Colorize;

use crate::auth::claims::{decode_token, DecodedToken};
use crate::auth::exchange::TokenResponse;
use crate::auth::flow::AuthFlow;
use crate::auth::oidc::{validate_hash, HashKind, HashOutcome};
use crate::auth::token_store::{needs_refresh, TokenStore};
use crate::config::Config;
use crate::error::{Result, TokenflowError};
use crate::http::HttpClient;

fn not_logged_in() -> anyhow::Error {
    TokenflowError::MissingCredentials("no stored token; run `tokenflow login` first".to_string())
        .into()
}

/// Loads the stored token, refreshing it first when it is about to expire.
///
/// # Errors
///
/// Returns [`TokenflowError::MissingCredentials`] when nothing is stored or
/// the token has expired and cannot be refreshed.
pub async fn load_valid_token(config: &Config, http: Arc<dyn HttpClient>) -> Result<TokenResponse> {
    let store = TokenStore;
    let Some(token) = store.load(&config.app.client_id)? else {
        return Err(not_logged_in());
    };

    let now = Utc::now();
    if !needs_refresh(&token, now) {
        return Ok(token);
    }

    let refreshable = token
        .refresh_token
        .as_deref()
        .filter(|_| token.refresh_expires_at().map_or(true, |at| now < at));

    match refreshable {
        Some(refresh_token) => {
            tracing::info!("Access token is about to expire, refreshing");
            let refreshed = AuthFlow::new(config.app.clone(), http)
                .refresh(refresh_token)
                .await
                .map_err(TokenflowError::Auth)?;
            store.save(&config.app.client_id, &refreshed)?;
            Ok(refreshed)
        }
        None if token.is_expired_at(now) => Err(TokenflowError::MissingCredentials(
            "stored token has expired; run `tokenflow login` again".to_string(),
        )
        .into()),
        None => Ok(token),
    }
}

/// Refreshes the stored token, or the given refresh token, and stores the result.
pub async fn run_refresh(config: Config, refresh_token: Option<String>) -> Result<()> {
    let store = TokenStore;
    let refresh_token = match refresh_token {
        Some(token) => token,
        None => store
            .load(&config.app.client_id)?
            .and_then(|token| token.refresh_token)
            .ok_or_else(not_logged_in)?,
    };

    let http = super::http_client(&config)?;
    let token = AuthFlow::new(config.app.clone(), http)
        .refresh(&refresh_token)
        .await
        .map_err(TokenflowError::Auth)?;

    println!("{}", "Token refreshed.".green().bold());
    super::print_token_summary(&token);
    store.save(&config.app.client_id, &token)?;
    Ok(())
}

/// Prints the header and claims of `token`, or of the stored access token.
pub fn run_token_info(config: &Config, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(token) => token,
        None => {
            TokenStore
                .load(&config.app.client_id)?
                .ok_or_else(not_logged_in)?
                .access_token
        }
    };

    let decoded = decode_token(&token).map_err(TokenflowError::Auth)?;
    for (label, value) in describe(&decoded, Utc::now()) {
        println!("  {:<18} {}", format!("{label}:").bold(), value);
    }

    println!("\n{}", "Claims:".bold());
    let claims = serde_json::to_string_pretty(&decoded.claims).map_err(TokenflowError::Serialization)?;
    println!("{claims}");
    Ok(())
}

/// Summary lines for a decoded token.
fn describe(decoded: &DecodedToken, now: chrono::DateTime<Utc>) -> Vec<(&'static str, String)> {
    let claims = &decoded.claims;
    let mut lines = vec![
        ("Algorithm", decoded.header.alg.clone()),
        ("Type", decoded.header.typ.clone().unwrap_or_else(|| "-".to_string())),
        ("Key id", decoded.header.kid.clone().unwrap_or_else(|| "-".to_string())),
        ("User key", claims.user_key().unwrap_or("-").to_string()),
        ("Client key", claims.client_key().unwrap_or("-").to_string()),
    ];

    match (claims.expires_at(), claims.seconds_remaining(now)) {
        (Some(at), Some(remaining)) if remaining > 0 => {
            lines.push(("Expires", format!("{} ({remaining}s left)", at.to_rfc3339())));
        }
        (Some(at), Some(remaining)) => {
            lines.push(("Expires", format!("{} (expired {}s ago)", at.to_rfc3339(), remaining.unsigned_abs())));
        }
        _ => lines.push(("Expires", "-".to_string())),
    }
    lines
}

/// Checks each supplied plaintext against its hash claim in `token`.
///
/// Only the kinds with a supplied value are checked.
pub fn check_hashes(
    token: &str,
    code: Option<&str>,
    state: Option<&str>,
    access_token: Option<&str>,
) -> Result<Vec<(HashKind, HashOutcome)>> {
    let decoded = decode_token(token).map_err(TokenflowError::Auth)?;
    [
        (HashKind::Code, code),
        (HashKind::State, state),
        (HashKind::AccessToken, access_token),
    ]
    .into_iter()
    .filter_map(|(kind, value)| value.map(|v| (kind, v)))
    .map(|(kind, value)| {
        validate_hash(kind, value, &decoded.claims, &decoded.header.alg)
            .map(|outcome| (kind, outcome))
            .map_err(|e| anyhow::Error::from(TokenflowError::Auth(e)))
    })
    .collect()
}

/// Prints the outcome of each hash check; fails if any of them mismatched.
pub fn run_validate_hashes(
    token: &str,
    code: Option<&str>,
    state: Option<&str>,
    access_token: Option<&str>,
) -> Result<()> {
    let results = check_hashes(token, code, state, access_token)?;
    if results.is_empty() {
        println!(
            "{}",
            "Nothing to check; pass --code, --state or --access-token.".yellow()
        );
        return Ok(());
    }

    let mut mismatches = 0;
    for (kind, outcome) in &results {
        let label = match outcome {
            HashOutcome::Match => "match".green(),
            HashOutcome::Mismatch => {
                mismatches += 1;
                "MISMATCH".red().bold()
            }
            HashOutcome::NotApplicable => "not present".dimmed(),
        };
        println!("  {:<8} {}", kind.claim_name(), label);
    }

    if mismatches > 0 {
        anyhow::bail!("{mismatches} hash claim(s) did not match; the token must not be trusted");
    }
    Ok(())
}

/// Deletes the stored token.
pub fn run_logout(config: &Config) -> Result<()> {
    TokenStore.delete(&config.app.client_id)?;
    println!("{}", "Logged out.".green());
    Ok(())
}
