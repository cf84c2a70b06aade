//! `tokenflow api`: one authenticated call with the stored token

use colored::Colorize;
use serde_json::Value;

use crate::api::ApiClient;
use crate::config::Config;
use crate::error::{Result, TokenflowError};
use crate::http::Method;

/// Sends `method path` with the stored access token and prints the response.
///
/// # Errors
///
/// Returns an error if `body` is not JSON, no usable token is stored, or the
/// call fails.
pub async fn run_api(
    config: Config,
    method: Method,
    path: &str,
    body: Option<&str>,
    with_request_id: bool,
) -> Result<()> {
    let body: Option<Value> = body
        .map(serde_json::from_str)
        .transpose()
        .map_err(TokenflowError::Serialization)?;

    let http = super::http_client(&config)?;
    let token = super::token::load_valid_token(&config, http.clone()).await?;
    let client = ApiClient::new(config.app.clone(), http, token.access_token);

    match client
        .request(method, path, body.as_ref(), with_request_id)
        .await
        .map_err(TokenflowError::Api)?
    {
        Some(json) => {
            let pretty = serde_json::to_string_pretty(&json).map_err(TokenflowError::Serialization)?;
            println!("{pretty}");
        }
        None => println!("{}", "No content.".dimmed()),
    }
    Ok(())
}
