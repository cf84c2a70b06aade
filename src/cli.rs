//! Command-line interface definition for Tokenflow
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for logging in, refreshing and inspecting tokens,
//! and making authenticated API calls.

use clap::{Parser, Subcommand};

use crate::http::Method;

/// Tokenflow - OAuth2 token lifecycle CLI
///
/// Runs the authorization code flow (with PKCE for public clients) against
/// the configured provider, keeps the resulting token in the OS keyring and
/// uses it for API calls.
#[derive(Parser, Debug, Clone)]
#[command(name = "tokenflow")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Write logs as JSON lines
    #[arg(long)]
    pub log_json: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for Tokenflow
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Log in through the browser and store the issued token
    Login {
        /// Text to round-trip through the state parameter
        #[arg(short, long)]
        data: Option<String>,

        /// Print the authorization URL without opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Trade a refresh token for a new token pair
    Refresh {
        /// Refresh token to use instead of the stored one
        #[arg(long)]
        refresh_token: Option<String>,
    },

    /// Decode an access token and show its claims
    TokenInfo {
        /// Access token to inspect instead of the stored one
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Check c_hash, s_hash and at_hash claims against known values
    ValidateHashes {
        /// Token carrying the hash claims
        #[arg(short, long)]
        token: String,

        /// Authorization code to check against c_hash
        #[arg(long)]
        code: Option<String>,

        /// State value to check against s_hash
        #[arg(long)]
        state: Option<String>,

        /// Access token to check against at_hash
        #[arg(long)]
        access_token: Option<String>,
    },

    /// Call the API with the stored access token
    Api {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: Method,

        /// Path below the API base URL, e.g. /port/v1/users/me
        path: String,

        /// JSON request body
        #[arg(short, long)]
        body: Option<String>,

        /// Send a random X-Request-ID header
        #[arg(long)]
        request_id: bool,
    },

    /// Delete the stored token
    Logout,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
