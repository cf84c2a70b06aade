//! Browser login with a loopback redirect listener
//!
//! The listener is bound to the host and port of the configured
//! `redirect_uri`, which must therefore be an `http` loopback URI registered
//! with the provider. Requests for other paths (a browser's favicon probe,
//! for example) get a 404 and the listener keeps waiting.

use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

use colored::Colorize;
use tokio::net::TcpListener;
use url::Url;
use uuid::Uuid;

use crate::auth::authorize::CallbackParams;
use crate::auth::csrf::SECURITY_TARGET;
use crate::auth::flow::AuthFlow;
use crate::auth::session::MemorySessionStore;
use crate::auth::token_store::TokenStore;
use crate::config::{is_loopback, Config};
use crate::error::{Result, TokenflowError};

/// How long to wait for the provider to redirect back.
pub const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Runs the login flow and stores the issued token.
///
/// # Arguments
///
/// * `config` - Validated configuration
/// * `data` - Optional text to round-trip through `state`
/// * `no_browser` - Only print the authorization URL
///
/// # Errors
///
/// Returns an error if the listener cannot be bound, no callback arrives
/// within [`CALLBACK_TIMEOUT`], or the flow fails.
pub async fn run_login(config: Config, data: Option<String>, no_browser: bool) -> Result<()> {
    let addr = bind_address(&config.app.redirect_uri)?;
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        TokenflowError::Callback(format!("failed to bind redirect listener on {addr}: {e}"))
    })?;
    tracing::debug!("Listening for the authorization callback on {}", addr);

    let http = super::http_client(&config)?;
    let flow = AuthFlow::new(config.app.clone(), http);
    let store = MemorySessionStore::with_ttl(CALLBACK_TIMEOUT);
    let session_id = Uuid::new_v4().to_string();

    let auth_url = flow
        .begin(&store, &session_id, &data)
        .map_err(TokenflowError::Auth)?;

    eprintln!(
        "Open the following URL in your browser to log in:\n{}",
        auth_url.as_str().cyan()
    );
    if !no_browser {
        try_open_browser(auth_url.as_str());
    }

    let params = tokio::time::timeout(
        CALLBACK_TIMEOUT,
        receive_callback(&listener, &config.app.redirect_uri),
    )
    .await
    .map_err(|_| {
        TokenflowError::Callback("timed out waiting for the authorization callback".to_string())
    })??;

    let authorization = flow
        .complete(&store, &session_id, &params)
        .await
        .map_err(|e| {
            if e.is_security_event() {
                tracing::warn!(target: SECURITY_TARGET, error = %e, "Login rejected");
            }
            TokenflowError::Auth(e)
        })?;

    println!("{}", "Logged in.".green().bold());
    super::print_token_summary(&authorization.token);
    if !authorization.data.is_null() {
        println!("  {:<22} {}", "State data:".bold(), authorization.data);
    }

    match TokenStore.save(&config.app.client_id, &authorization.token) {
        Ok(()) => println!("{}", "Token stored in the system keyring.".dimmed()),
        Err(e) => tracing::warn!("Could not store the token in the keyring: {:#}", e),
    }

    Ok(())
}

/// Returns the `host:port` the redirect listener binds to.
///
/// # Errors
///
/// Returns [`TokenflowError::Config`] unless `redirect_uri` is an `http`
/// loopback URI.
pub fn bind_address(redirect_uri: &Url) -> Result<String> {
    if redirect_uri.scheme() != "http" || !is_loopback(redirect_uri) {
        return Err(TokenflowError::Config(format!(
            "login needs an http loopback redirect_uri, got {redirect_uri}"
        ))
        .into());
    }
    let host = redirect_uri.host_str().unwrap_or("127.0.0.1");
    let port = redirect_uri.port_or_known_default().unwrap_or(80);
    Ok(format!("{host}:{port}"))
}

/// Waits for the request to the redirect path and returns its parameters.
pub async fn receive_callback(listener: &TcpListener, redirect_uri: &Url) -> Result<CallbackParams> {
    loop {
        let (stream, peer) = listener.accept().await.map_err(|e| {
            TokenflowError::Callback(format!("failed to accept callback connection: {e}"))
        })?;
        tracing::debug!(%peer, "Callback connection accepted");

        let stream = stream.into_std().map_err(TokenflowError::Io)?;
        let redirect_path = redirect_uri.path().to_string();
        let answered = tokio::task::spawn_blocking(move || answer_request(stream, &redirect_path))
            .await
            .map_err(|e| TokenflowError::Callback(format!("callback task failed: {e}")))?;

        // An unreadable connection is not the callback; keep waiting.
        let target = match answered {
            Ok(target) => target,
            Err(err) => {
                tracing::debug!(%peer, error = %err, "Ignoring unreadable callback connection");
                continue;
            }
        };

        if let Some(target) = target {
            let url = redirect_uri
                .join(&target)
                .map_err(|e| TokenflowError::Callback(format!("invalid callback target: {e}")))?;
            return Ok(CallbackParams::from_url(&url));
        }
    }
}

/// Reads one HTTP request, answers it and returns its target when it hit
/// `redirect_path`.
fn answer_request(stream: std::net::TcpStream, redirect_path: &str) -> Result<Option<String>> {
    stream.set_nonblocking(false).map_err(TokenflowError::Io)?;
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .map_err(TokenflowError::Io)?;
    let mut writer = stream.try_clone().map_err(TokenflowError::Io)?;
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .map_err(TokenflowError::Io)?;

    // Headers end at the first empty line.
    loop {
        let mut line = String::new();
        let read = reader.read_line(&mut line).map_err(TokenflowError::Io)?;
        if read == 0 || line.trim_end().is_empty() {
            break;
        }
    }

    let target = request_target(&request_line)
        .filter(|target| target.split('?').next() == Some(redirect_path));

    let (status, body) = match target {
        Some(_) => ("200 OK", "Authorization received. You may close this tab."),
        None => ("404 Not Found", "Not found"),
    };
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = writer.write_all(response.as_bytes());

    Ok(target.map(str::to_string))
}

/// Extracts the target of a `GET` request line.
fn request_target(request_line: &str) -> Option<&str> {
    let mut parts = request_line.split_whitespace();
    match (parts.next(), parts.next()) {
        (Some("GET"), Some(target)) => Some(target),
        _ => None,
    }
}

/// Attempts to open `url` in the default browser; failures are ignored and
/// the user can copy the URL from stderr.
fn try_open_browser(url: &str) {
    #[cfg(target_os = "macos")]
    {
        let _ = std::process::Command::new("open").arg(url).spawn();
    }
    #[cfg(target_os = "linux")]
    {
        let _ = std::process::Command::new("xdg-open").arg(url).spawn();
    }
    #[cfg(target_os = "windows")]
    {
        let _ = std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .spawn();
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
    {
        let _ = url;
    }
}
