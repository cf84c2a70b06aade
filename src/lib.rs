//! Tokenflow - OAuth2 token lifecycle library and CLI
//!
//! Client side of the OAuth2 authorization code flow, with and without PKCE,
//! for an API gateway that issues JWT bearer tokens.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `auth`: the token lifecycle core (random tokens, PKCE, state, CSRF,
//!   token exchange, claim extraction, OIDC hash validation, the round trip)
//! - `http`: the HTTP client collaborator, its reqwest implementation and the
//!   per-request log record
//! - `api`: bearer-authenticated API calls
//! - `config`: configuration management and validation
//! - `error`: error types and result aliases
//! - `cli`, `commands`: the command-line interface
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tokenflow::auth::{AuthFlow, CallbackParams, MemorySessionStore};
//! use tokenflow::config::Config;
//! use tokenflow::http::ReqwestClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let http = Arc::new(ReqwestClient::new(&config.http)?);
//!     let flow = AuthFlow::new(config.app.clone(), http);
//!     let sessions = MemorySessionStore::new();
//!
//!     let redirect = flow.begin(&sessions, "session-1", "return-to=/home")?;
//!     println!("Redirect the browser to {redirect}");
//!
//!     // Later, in the redirect handler:
//!     let callback = CallbackParams::from_query("code=...&state=...");
//!     let authorization = flow.complete(&sessions, "session-1", &callback).await?;
//!     println!("Token expires at {}", authorization.token.expires_at());
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod http;

// Re-export commonly used types
pub use api::ApiClient;
pub use auth::{AuthFlow, Authorization, CallbackParams, TokenResponse};
pub use config::{AppConfiguration, Config};
pub use error::{ApiError, AuthError, Result, TokenflowError};
pub use http::{HttpClient, ReqwestClient};
