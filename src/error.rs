//! Error types for Tokenflow
//!
//! This module defines all error types used throughout the crate, using
//! `thiserror` for ergonomic error handling.
//!
//! - [`AuthError`] is returned by every operation of the OAuth2 core in
//!   [`crate::auth`]. Callers match on it; nothing in the core terminates the
//!   process.
//! - [`ApiError`] is returned by the bearer-authenticated API client.
//! - [`TokenflowError`] is the application-level error used by configuration
//!   loading and the CLI commands, where errors travel as `anyhow::Error`.

use thiserror::Error;

/// Boxed cause carried by transport failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the OAuth2 token lifecycle core
///
/// Every variant is surfaced as a typed result. Variants for which
/// [`AuthError::is_security_event`] returns `true` indicate a possibly forged
/// or replayed redirect and are logged separately from transport problems.
#[derive(Error, Debug)]
pub enum AuthError {
    /// The secure random source could not provide bytes
    #[error("Insufficient entropy: {0}")]
    InsufficientEntropy(String),

    /// A PKCE verifier outside 43..=128 unreserved characters
    #[error("Invalid PKCE verifier: {0}")]
    InvalidVerifier(String),

    /// The `state` value could not be base64-decoded or parsed
    #[error("Malformed state: {0}")]
    MalformedState(String),

    /// The callback did not carry a `state` parameter
    #[error("No state found in the callback")]
    MissingState,

    /// No CSRF token was stored for this session (expired or never started)
    #[error("No saved authorization session found")]
    MissingSession,

    /// The CSRF token inside the state differs from the session's token
    #[error("CSRF token in the state does not match the session")]
    CsrfMismatch,

    /// The provider redirected back with `error` / `error_description`
    #[error("Authorization denied: {error} {description}")]
    AuthorizationDenied {
        /// The `error` query parameter (may be empty)
        error: String,
        /// The `error_description` query parameter (may be empty)
        description: String,
    },

    /// The callback did not carry an authorization `code`
    #[error("No authorization code found in the callback")]
    MissingCode,

    /// No response was received from the remote endpoint
    #[error("Network error calling {url}: {source}")]
    Network {
        /// The URL that was being called
        url: String,
        /// The underlying transport failure
        #[source]
        source: BoxError,
    },

    /// The provider answered with a structured OAuth2 error body
    #[error("Provider error (status {status}): {error}{}", .description.as_deref().map(|d| format!(" - {d}")).unwrap_or_default())]
    Provider {
        /// HTTP status of the response
        status: u16,
        /// The OAuth2 `error` code
        error: String,
        /// The optional `error_description`
        description: Option<String>,
    },

    /// The provider answered with something that is not a valid token response
    #[error("Protocol error (status {status}): {body}")]
    Protocol {
        /// HTTP status of the response
        status: u16,
        /// Raw response body
        body: String,
    },

    /// The token is already expired on arrival, usually a replayed code or clock skew
    #[error("Token already expired on arrival (expires_in={expires_in}); stale code or clock skew")]
    ClockSkewOrStaleCode {
        /// The negative `expires_in` value returned by the provider
        expires_in: i64,
    },

    /// The token is not three dot-separated segments with a JSON payload
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The JOSE `alg` does not map to a supported digest
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl AuthError {
    /// Returns `true` for failures that indicate a forged, replayed or
    /// orphaned redirect rather than an ordinary transport problem.
    pub fn is_security_event(&self) -> bool {
        matches!(
            self,
            AuthError::MissingState
                | AuthError::MissingSession
                | AuthError::MalformedState(_)
                | AuthError::CsrfMismatch
        )
    }
}

/// Result type for the OAuth2 core
pub type AuthResult<T> = std::result::Result<T, AuthError>;

/// Errors produced by the bearer-authenticated API client
#[derive(Error, Debug)]
pub enum ApiError {
    /// No response was received
    #[error("Error connecting to {method} {url}: {source}")]
    Network {
        /// HTTP method of the request
        method: String,
        /// Requested URL
        url: String,
        /// The underlying transport failure
        #[source]
        source: BoxError,
    },

    /// The path does not join onto the API base URL
    #[error("Invalid API path {path}: {source}")]
    InvalidPath {
        /// Requested path
        path: String,
        /// The URL parse failure
        #[source]
        source: url::ParseError,
    },

    /// The API answered with status >= 400
    #[error("API error (status {status}): {summary}")]
    Status {
        /// HTTP status of the response
        status: u16,
        /// Provider error code, when present
        code: Option<String>,
        /// Human readable summary of the error body
        summary: String,
    },

    /// The response body was not JSON
    #[error("Error parsing JSON response of request {method} {url}: {body}")]
    InvalidJson {
        /// HTTP method of the request
        method: String,
        /// Requested URL
        url: String,
        /// Raw body
        body: String,
    },
}

/// Main application error type for Tokenflow
///
/// Used by configuration loading and the CLI commands.
#[derive(Error, Debug)]
pub enum TokenflowError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// OAuth2 flow errors
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    /// API call errors
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Loopback callback listener errors
    #[error("Callback error: {0}")]
    Callback(String),

    /// No token is available for the requested operation
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Keyring/credential storage errors
    #[error("Keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Result type alias for application-level operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
