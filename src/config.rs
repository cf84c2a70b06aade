//! Configuration management for Tokenflow
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.
//!
//! The OAuth2 core only ever sees [`AppConfiguration`], passed by reference
//! into each operation. It is loaded once and not mutated afterwards.

use crate::error::{Result, TokenflowError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;

/// Main configuration structure for Tokenflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Registered application and provider endpoints
    #[serde(default)]
    pub app: AppConfiguration,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,
}

/// Provider environments with well-known endpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Simulation environment
    #[default]
    Sim,
    /// Live environment
    Live,
}

impl Environment {
    /// Authorization endpoint of the environment.
    pub fn auth_endpoint(&self) -> &'static str {
        match self {
            Environment::Sim => "https://sim.logonvalidation.net/authorize",
            Environment::Live => "https://live.logonvalidation.net/authorize",
        }
    }

    /// Token endpoint of the environment.
    pub fn token_endpoint(&self) -> &'static str {
        match self {
            Environment::Sim => "https://sim.logonvalidation.net/token",
            Environment::Live => "https://live.logonvalidation.net/token",
        }
    }

    /// API gateway base URL of the environment.
    pub fn api_base_url(&self) -> &'static str {
        match self {
            Environment::Sim => "https://gateway.saxobank.com/sim/openapi",
            Environment::Live => "https://gateway.saxobank.com/openapi",
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sim" => Ok(Environment::Sim),
            "live" => Ok(Environment::Live),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Which authorization code flow the application uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowKind {
    /// Confidential client: the token request carries the client secret
    Code,
    /// Public client: the token request carries the PKCE verifier
    Pkce,
}

/// Registered application and provider endpoints
///
/// A client secret is present only for confidential (code flow) apps; its
/// absence selects the PKCE flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfiguration {
    /// Client identifier (app key)
    #[serde(default)]
    pub client_id: String,

    /// Client secret (app secret); absent for PKCE apps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,

    /// Redirect URI registered with the provider
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: Url,

    /// Authorization endpoint
    #[serde(default = "default_auth_endpoint")]
    pub auth_endpoint: Url,

    /// Token endpoint
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: Url,

    /// Base URL of the API gateway
    #[serde(default = "default_api_base_url")]
    pub api_base_url: Url,
}

fn parse_static(url: &str) -> Url {
    // Only called with the compile-time constants below.
    Url::parse(url).unwrap_or_else(|e| panic!("invalid built-in URL {url}: {e}"))
}

fn default_redirect_uri() -> Url {
    parse_static("http://127.0.0.1:8765/callback")
}

fn default_auth_endpoint() -> Url {
    parse_static(Environment::Sim.auth_endpoint())
}

fn default_token_endpoint() -> Url {
    parse_static(Environment::Sim.token_endpoint())
}

fn default_api_base_url() -> Url {
    parse_static(Environment::Sim.api_base_url())
}

impl Default for AppConfiguration {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            redirect_uri: default_redirect_uri(),
            auth_endpoint: default_auth_endpoint(),
            token_endpoint: default_token_endpoint(),
            api_base_url: default_api_base_url(),
        }
    }
}

impl AppConfiguration {
    /// Returns the flow selected by the presence of a client secret.
    pub fn flow(&self) -> FlowKind {
        if self.client_secret.is_some() {
            FlowKind::Code
        } else {
            FlowKind::Pkce
        }
    }

    /// Points all three provider endpoints at `env`.
    pub fn use_environment(&mut self, env: Environment) {
        self.auth_endpoint = parse_static(env.auth_endpoint());
        self.token_endpoint = parse_static(env.token_endpoint());
        self.api_base_url = parse_static(env.api_base_url());
    }

    /// Joins an API path (e.g. `/port/v1/users/me`) onto the base URL.
    ///
    /// The base URL's own path is kept; `path` is appended to it.
    pub fn api_url(&self, path: &str) -> std::result::Result<Url, url::ParseError> {
        let base = self.api_base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Url::parse(&format!("{base}/{path}"))
    }

    /// Validates the endpoint and credential invariants.
    ///
    /// # Errors
    ///
    /// Returns [`TokenflowError::Config`] describing the first violation.
    pub fn validate(&self) -> Result<()> {
        if self.client_id.trim().is_empty() {
            return Err(TokenflowError::Config("app.client_id cannot be empty".to_string()).into());
        }

        if let Some(secret) = &self.client_secret {
            if secret.is_empty() {
                return Err(TokenflowError::Config(
                    "app.client_secret must be omitted rather than empty".to_string(),
                )
                .into());
            }
        }

        for (name, url) in [
            ("app.auth_endpoint", &self.auth_endpoint),
            ("app.token_endpoint", &self.token_endpoint),
            ("app.api_base_url", &self.api_base_url),
        ] {
            if url.scheme() != "https" {
                return Err(
                    TokenflowError::Config(format!("{name} must be an https URL: {url}")).into(),
                );
            }
        }

        let redirect_ok = match self.redirect_uri.scheme() {
            "https" => true,
            "http" => is_loopback(&self.redirect_uri),
            _ => false,
        };
        if !redirect_ok {
            return Err(TokenflowError::Config(format!(
                "app.redirect_uri must be https or an http loopback URI: {}",
                self.redirect_uri
            ))
            .into());
        }

        Ok(())
    }
}

/// Returns `true` when `url` points at the local machine.
pub fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(url::Host::Domain(d)) => d.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("tokenflow/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_timeout_seconds(),
            user_agent: default_user_agent(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Path to configuration file
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Returns
    ///
    /// Returns the loaded and merged configuration
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed, or an
    /// environment override is not a valid value
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars()?;
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TokenflowError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| TokenflowError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) -> Result<()> {
        if let Ok(env) = std::env::var("TOKENFLOW_ENVIRONMENT") {
            let env: Environment = env.parse().map_err(TokenflowError::Config)?;
            self.app.use_environment(env);
        }

        if let Ok(client_id) = std::env::var("TOKENFLOW_CLIENT_ID") {
            self.app.client_id = client_id;
        }

        if let Ok(secret) = std::env::var("TOKENFLOW_CLIENT_SECRET") {
            self.app.client_secret = if secret.is_empty() { None } else { Some(secret) };
        }

        for (var, target) in [
            ("TOKENFLOW_REDIRECT_URI", &mut self.app.redirect_uri),
            ("TOKENFLOW_AUTH_ENDPOINT", &mut self.app.auth_endpoint),
            ("TOKENFLOW_TOKEN_ENDPOINT", &mut self.app.token_endpoint),
            ("TOKENFLOW_API_BASE_URL", &mut self.app.api_base_url),
        ] {
            if let Ok(value) = std::env::var(var) {
                *target = Url::parse(&value)
                    .map_err(|e| TokenflowError::Config(format!("Invalid {var}: {e}")))?;
            }
        }

        if let Ok(timeout) = std::env::var("TOKENFLOW_HTTP_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.http.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid TOKENFLOW_HTTP_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        Ok(())
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if any validation check fails
    pub fn validate(&self) -> Result<()> {
        self.app.validate()?;

        if self.http.timeout_seconds == 0 {
            return Err(
                TokenflowError::Config("http.timeout_seconds must be greater than 0".to_string())
                    .into(),
            );
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: AppConfiguration::default(),
            http: HttpConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.app.client_id = "my-app-key".to_string();
        config
    }

    fn test_cli() -> crate::cli::Cli {
        crate::cli::Cli {
            config: None,
            verbose: false,
            log_json: false,
            command: crate::cli::Commands::Logout,
        }
    }

    #[test]
    fn test_default_config_points_at_sim() {
        let config = Config::default();
        assert_eq!(
            config.app.token_endpoint.as_str(),
            "https://sim.logonvalidation.net/token"
        );
        assert_eq!(config.http.timeout_seconds, 30);
        assert_eq!(config.app.flow(), FlowKind::Pkce);
    }

    #[test]
    fn test_config_validation_success() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_config_validation_empty_client_id() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn test_config_validation_rejects_http_token_endpoint() {
        let mut config = valid_config();
        config.app.token_endpoint = Url::parse("http://sim.logonvalidation.net/token").unwrap();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("app.token_endpoint"), "{err}");
    }

    #[test]
    fn test_config_validation_rejects_non_loopback_http_redirect() {
        let mut config = valid_config();
        config.app.redirect_uri = Url::parse("http://example.com/callback").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_accepts_loopback_and_https_redirects() {
        let mut config = valid_config();
        for uri in [
            "http://localhost/cb",
            "http://127.0.0.1:9000/cb",
            "http://[::1]:9000/cb",
            "https://app.example.com/cb",
        ] {
            config.app.redirect_uri = Url::parse(uri).unwrap();
            assert!(config.validate().is_ok(), "{uri} should be accepted");
        }
    }

    #[test]
    fn test_config_validation_rejects_empty_secret() {
        let mut config = valid_config();
        config.app.client_secret = Some(String::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_zero_timeout() {
        let mut config = valid_config();
        config.http.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_flow_kind_follows_secret() {
        let mut app = AppConfiguration::default();
        assert_eq!(app.flow(), FlowKind::Pkce);
        app.client_secret = Some("s3cret".to_string());
        assert_eq!(app.flow(), FlowKind::Code);
    }

    #[test]
    fn test_api_url_keeps_base_path() {
        let app = AppConfiguration::default();
        assert_eq!(
            app.api_url("/port/v1/users/me").unwrap().as_str(),
            "https://gateway.saxobank.com/sim/openapi/port/v1/users/me"
        );
        assert_eq!(
            app.api_url("root/v1/sessions/capabilities").unwrap().as_str(),
            "https://gateway.saxobank.com/sim/openapi/root/v1/sessions/capabilities"
        );
    }

    #[test]
    fn test_use_environment_switches_all_endpoints() {
        let mut app = AppConfiguration::default();
        app.use_environment(Environment::Live);
        assert_eq!(app.auth_endpoint.as_str(), Environment::Live.auth_endpoint());
        assert_eq!(app.token_endpoint.as_str(), Environment::Live.token_endpoint());
        assert_eq!(app.api_base_url.as_str(), Environment::Live.api_base_url());
    }

    #[test]
    fn test_config_from_yaml() {
        let yaml = r#"
app:
  client_id: abc123
  client_secret: topsecret
  redirect_uri: https://app.example.com/callback
  token_endpoint: https://live.logonvalidation.net/token
http:
  timeout_seconds: 10
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.app.client_id, "abc123");
        assert_eq!(config.app.flow(), FlowKind::Code);
        assert_eq!(
            config.app.auth_endpoint.as_str(),
            "https://sim.logonvalidation.net/authorize"
        );
        assert_eq!(
            config.app.token_endpoint.as_str(),
            "https://live.logonvalidation.net/token"
        );
        assert_eq!(config.http.timeout_seconds, 10);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_from_yaml_rejects_relative_url() {
        let yaml = "app:\n  token_endpoint: /token\n";
        assert!(serde_yaml::from_str::<Config>(yaml).is_err());
    }

    #[test]
    #[serial]
    fn test_load_nonexistent_file_uses_defaults() {
        let config = Config::load("nonexistent.yaml", &test_cli()).unwrap();
        assert_eq!(
            config.app.auth_endpoint.as_str(),
            Environment::Sim.auth_endpoint()
        );
    }

    #[test]
    #[serial]
    fn test_load_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "app:\n  client_id: from-file\n").unwrap();

        let config = Config::load(path.to_str().unwrap(), &test_cli()).unwrap();
        assert_eq!(config.app.client_id, "from-file");
    }

    #[test]
    #[serial]
    fn test_env_overrides_apply() {
        std::env::set_var("TOKENFLOW_ENVIRONMENT", "live");
        std::env::set_var("TOKENFLOW_CLIENT_ID", "env-client");
        std::env::set_var("TOKENFLOW_CLIENT_SECRET", "env-secret");

        let result = Config::load("nonexistent.yaml", &test_cli());

        std::env::remove_var("TOKENFLOW_ENVIRONMENT");
        std::env::remove_var("TOKENFLOW_CLIENT_ID");
        std::env::remove_var("TOKENFLOW_CLIENT_SECRET");

        let config = result.unwrap();
        assert_eq!(config.app.client_id, "env-client");
        assert_eq!(config.app.client_secret.as_deref(), Some("env-secret"));
        assert_eq!(
            config.app.token_endpoint.as_str(),
            Environment::Live.token_endpoint()
        );
    }

    #[test]
    #[serial]
    fn test_env_override_with_invalid_url_fails() {
        std::env::set_var("TOKENFLOW_TOKEN_ENDPOINT", "not a url");
        let result = Config::load("nonexistent.yaml", &test_cli());
        std::env::remove_var("TOKENFLOW_TOKEN_ENDPOINT");
        assert!(result.is_err());
    }
}
