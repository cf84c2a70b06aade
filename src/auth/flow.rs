//! Authorization round trip
//!
//! [`AuthFlow`] ties the pieces together for one registered application:
//!
//! 1. [`AuthFlow::begin`] creates an [`AuthSession`], saves it, wraps the
//!    caller payload and CSRF token into `state` and returns the provider
//!    URL to redirect the browser to.
//! 2. [`AuthFlow::complete`] consumes the session, checks the callback for a
//!    provider error, validates the CSRF token, and only then exchanges the
//!    code at the token endpoint.
//! 3. [`AuthFlow::refresh`] trades a refresh token for a new token pair.
//!
//! The flow holds no mutable state. Concurrent callbacks for different
//! sessions are independent; the session store is the only shared state.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use url::Url;

use crate::auth::authorize::{build_authorization_url, CallbackParams};
use crate::auth::csrf::{self, SECURITY_TARGET};
use crate::auth::exchange::{ClientProof, TokenClient, TokenResponse};
use crate::auth::session::{AuthSession, SessionStore};
use crate::auth::state;
use crate::config::AppConfiguration;
use crate::error::{AuthError, AuthResult};
use crate::http::HttpClient;

/// Outcome of a completed authorization.
#[derive(Debug, Clone, PartialEq)]
pub struct Authorization {
    /// Tokens issued for the authorization code
    pub token: TokenResponse,
    /// The payload passed to [`AuthFlow::begin`]
    pub data: Value,
}

/// Authorization code flow (with or without PKCE) for one application.
///
/// The PKCE variant is used when the configuration has no client secret.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use tokenflow::auth::flow::AuthFlow;
/// use tokenflow::auth::session::MemorySessionStore;
/// use tokenflow::config::AppConfiguration;
/// use tokenflow::http::fake::FakeHttpClient;
///
/// let mut config = AppConfiguration::default();
/// config.client_id = "my-app".to_string();
///
/// let flow = AuthFlow::new(config, Arc::new(FakeHttpClient::new()));
/// let store = MemorySessionStore::new();
///
/// let url = flow.begin(&store, "browser-session-1", "[Something to remember]").unwrap();
/// assert!(url.as_str().contains("code_challenge_method=S256"));
/// ```
pub struct AuthFlow {
    config: AppConfiguration,
    http: Arc<dyn HttpClient>,
}

impl AuthFlow {
    /// Creates a flow for `config` using `http` for token requests.
    pub fn new(config: AppConfiguration, http: Arc<dyn HttpClient>) -> Self {
        Self { config, http }
    }

    /// The application configuration.
    pub fn config(&self) -> &AppConfiguration {
        &self.config
    }

    /// Starts an authorization attempt for `session_id`.
    ///
    /// Any earlier attempt for the same session is replaced.
    ///
    /// # Arguments
    ///
    /// * `store` - Session store shared with the callback handler
    /// * `session_id` - Identifier of the browser session
    /// * `payload` - Data to receive back in [`Authorization::data`]
    ///
    /// # Returns
    ///
    /// The provider authorization URL to redirect the browser to.
    ///
    /// # Errors
    ///
    /// [`AuthError::InsufficientEntropy`] when tokens cannot be generated,
    /// [`AuthError::MalformedState`] when `payload` does not serialize.
    pub fn begin<T>(&self, store: &dyn SessionStore, session_id: &str, payload: &T) -> AuthResult<Url>
    where
        T: Serialize + ?Sized,
    {
        let session = AuthSession::for_flow(self.config.flow())?;
        let state = state::encode(&session.csrf, payload)?;
        let challenge = session.verifier.as_ref().map(|v| v.challenge());

        session.save(store, session_id);

        tracing::debug!(
            flow = ?self.config.flow(),
            "Starting authorization; redirecting to {}",
            self.config.auth_endpoint
        );
        Ok(build_authorization_url(
            &self.config,
            &state,
            challenge.as_deref(),
        ))
    }

    /// Handles the provider's redirect for `session_id`.
    ///
    /// The session is removed before anything else, so every outcome,
    /// successful or not, invalidates it.
    ///
    /// # Errors
    ///
    /// - [`AuthError::AuthorizationDenied`] when the callback carries `error`
    ///   or `error_description`
    /// - [`AuthError::MissingState`], [`AuthError::MissingSession`],
    ///   [`AuthError::MalformedState`], [`AuthError::CsrfMismatch`] from the
    ///   CSRF check
    /// - [`AuthError::MissingCode`] when the callback has no `code`
    /// - any token endpoint error from [`TokenClient::exchange_code`]
    ///
    /// No token request is made unless the CSRF check passes.
    pub async fn complete(
        &self,
        store: &dyn SessionStore,
        session_id: &str,
        params: &CallbackParams,
    ) -> AuthResult<Authorization> {
        let session = AuthSession::take(store, session_id);

        params.check_for_errors().map_err(|err| {
            tracing::warn!(error = %err, "Provider reported an authorization error");
            err
        })?;

        let validated = csrf::validate(
            session.as_ref().map(|s| s.csrf.as_str()),
            params.state.as_deref(),
        )?;
        let Some(session) = session else {
            return Err(AuthError::MissingSession);
        };

        let code = params.code.as_deref().ok_or(AuthError::MissingCode)?;

        let proof = match (&self.config.client_secret, &session.verifier) {
            (Some(secret), _) => ClientProof::Secret(secret),
            (None, Some(verifier)) => ClientProof::Verifier(verifier),
            (None, None) => {
                tracing::warn!(target: SECURITY_TARGET, "No saved PKCE verifier found in the session");
                return Err(AuthError::MissingSession);
            }
        };

        let token = TokenClient::new(self.http.as_ref(), &self.config)
            .exchange_code(code, proof)
            .await?;

        Ok(Authorization {
            token,
            data: validated.data,
        })
    }

    /// Trades `refresh_token` for a new token pair.
    ///
    /// # Errors
    ///
    /// Any token endpoint error from [`TokenClient::refresh`].
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        TokenClient::new(self.http.as_ref(), &self.config)
            .refresh(refresh_token)
            .await
    }
}
