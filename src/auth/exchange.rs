//! Token endpoint client
//!
//! Executes the `authorization_code` and `refresh_token` grants as
//! form-encoded POSTs and classifies the outcome:
//!
//! | Outcome | Result |
//! |---|---|
//! | no response | [`AuthError::Network`] |
//! | non-2xx, JSON `error` body | [`AuthError::Provider`] |
//! | non-2xx, anything else | [`AuthError::Protocol`] |
//! | 2xx, JSON `error` body | [`AuthError::Provider`] |
//! | 2xx, not a token response | [`AuthError::Protocol`] |
//! | 2xx, `expires_in < 0` | [`AuthError::ClockSkewOrStaleCode`] |
//! | 2xx, token response | [`TokenResponse`] |

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::pkce::PkceVerifier;
use crate::config::AppConfiguration;
use crate::error::{AuthError, AuthResult};
use crate::http::{send_logged, HttpClient, HttpRequest, HttpResponse, Method};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Successful token endpoint response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Bearer token presented on API calls
    pub access_token: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,

    /// Lifetime of the access token in seconds
    pub expires_in: i64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Lifetime of the refresh token in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token_expires_in: Option<i64>,

    /// When the response was received; not part of the provider's body
    #[serde(default = "Utc::now")]
    pub received_at: DateTime<Utc>,
}

impl TokenResponse {
    /// Absolute expiry of the access token.
    ///
    /// Saturates at the representable range for absurd `expires_in` values.
    pub fn expires_at(&self) -> DateTime<Utc> {
        offset_by_seconds(self.received_at, self.expires_in)
    }

    /// Absolute expiry of the refresh token, when the provider reported one.
    pub fn refresh_expires_at(&self) -> Option<DateTime<Utc>> {
        self.refresh_token_expires_in
            .map(|secs| offset_by_seconds(self.received_at, secs))
    }

    /// Returns `true` once the access token has expired at `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at()
    }
}

/// `start + secs`, clamped to `DateTime::<Utc>::{MIN_UTC, MAX_UTC}`.
fn offset_by_seconds(start: DateTime<Utc>, secs: i64) -> DateTime<Utc> {
    TimeDelta::try_seconds(secs)
        .and_then(|delta| start.checked_add_signed(delta))
        .unwrap_or(if secs < 0 {
            DateTime::<Utc>::MIN_UTC
        } else {
            DateTime::<Utc>::MAX_UTC
        })
}

/// OAuth2 error body (`error`, `error_description`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

/// Token endpoint body, decided by shape: any `error` field wins.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TokenEndpointBody {
    Failure(ProviderErrorBody),
    Success(TokenResponse),
}

/// Proof of client identity sent with the authorization code.
#[derive(Debug, Clone, Copy)]
pub enum ClientProof<'a> {
    /// Confidential client: the app secret
    Secret(&'a str),
    /// Public client: the PKCE verifier saved at redirect time
    Verifier(&'a PkceVerifier),
}

// ---------------------------------------------------------------------------
// TokenClient
// ---------------------------------------------------------------------------

/// Performs grants against the configured token endpoint.
///
/// # Examples
///
/// ```
/// use tokenflow::auth::exchange::TokenClient;
/// use tokenflow::config::AppConfiguration;
/// use tokenflow::http::fake::FakeHttpClient;
///
/// # #[tokio::main]
/// # async fn main() {
/// let http = FakeHttpClient::new();
/// http.push_json(201, serde_json::json!({
///     "access_token": "a.b.c",
///     "expires_in": 1200,
///     "refresh_token": "r",
///     "refresh_token_expires_in": 3600
/// }));
///
/// let mut config = AppConfiguration::default();
/// config.client_id = "app".to_string();
///
/// let token = TokenClient::new(&http, &config).refresh("r").await.unwrap();
/// assert_eq!(token.expires_in, 1200);
/// # }
/// ```
pub struct TokenClient<'a> {
    http: &'a dyn HttpClient,
    config: &'a AppConfiguration,
}

impl<'a> TokenClient<'a> {
    /// Creates a client for `config`'s token endpoint.
    pub fn new(http: &'a dyn HttpClient, config: &'a AppConfiguration) -> Self {
        Self { http, config }
    }

    /// Exchanges an authorization code for tokens.
    ///
    /// The form carries `grant_type=authorization_code`, `client_id`,
    /// `redirect_uri` and `code`, then either `client_secret` or
    /// `code_verifier` depending on `proof`.
    ///
    /// # Errors
    ///
    /// See the module table.
    pub async fn exchange_code(&self, code: &str, proof: ClientProof<'_>) -> AuthResult<TokenResponse> {
        let mut form = vec![
            ("grant_type", "authorization_code"),
            ("client_id", self.config.client_id.as_str()),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("code", code),
        ];
        match proof {
            ClientProof::Secret(secret) => form.push(("client_secret", secret)),
            ClientProof::Verifier(verifier) => form.push(("code_verifier", verifier.as_str())),
        }

        tracing::debug!(client_id = %self.config.client_id, "Requesting token with authorization code");
        self.post(form).await
    }

    /// Exchanges a refresh token for a new token pair.
    ///
    /// Confidential clients send `grant_type`, `client_id`, `client_secret`
    /// and `refresh_token`; public clients send only `grant_type` and
    /// `refresh_token`.
    ///
    /// # Errors
    ///
    /// See the module table.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let mut form = vec![("grant_type", "refresh_token")];
        if let Some(secret) = self.config.client_secret.as_deref() {
            form.push(("client_id", self.config.client_id.as_str()));
            form.push(("client_secret", secret));
        }
        form.push(("refresh_token", refresh_token));

        tracing::debug!(client_id = %self.config.client_id, "Requesting token with refresh token");
        self.post(form).await
    }

    async fn post(&self, form: Vec<(&str, &str)>) -> AuthResult<TokenResponse> {
        let endpoint = &self.config.token_endpoint;
        let request = HttpRequest::new(Method::Post, endpoint.clone()).form(form);

        let response = send_logged(self.http, endpoint, request)
            .await
            .map_err(|e| AuthError::Network {
                url: endpoint.to_string(),
                source: Box::new(e),
            })?;

        let token = classify(response)?;
        tracing::info!(
            expires_at = %token.expires_at(),
            refresh_expires_at = ?token.refresh_expires_at(),
            "New token received"
        );
        Ok(token)
    }
}

/// Maps a token endpoint response to a token or a typed error.
pub fn classify(response: HttpResponse) -> AuthResult<TokenResponse> {
    let status = response.status;

    if !response.is_success() {
        return Err(match serde_json::from_str::<ProviderErrorBody>(&response.body) {
            Ok(body) => provider_error(status, body),
            Err(_) => AuthError::Protocol {
                status,
                body: response.body,
            },
        });
    }

    match serde_json::from_str::<TokenEndpointBody>(&response.body) {
        Ok(TokenEndpointBody::Failure(body)) => Err(provider_error(status, body)),
        Ok(TokenEndpointBody::Success(token)) if token.expires_in < 0 => {
            tracing::warn!(
                expires_in = token.expires_in,
                "Token already expired on arrival; was there a delay between authorization and this request?"
            );
            Err(AuthError::ClockSkewOrStaleCode {
                expires_in: token.expires_in,
            })
        }
        Ok(TokenEndpointBody::Success(token)) => Ok(token),
        Err(_) => Err(AuthError::Protocol {
            status,
            body: response.body,
        }),
    }
}

fn provider_error(status: u16, body: ProviderErrorBody) -> AuthError {
    AuthError::Provider {
        status,
        error: body.error,
        description: body.error_description,
    }
}
