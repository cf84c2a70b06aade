//! Token persistence in the OS keyring
//!
//! Used by the CLI to keep the last [`TokenResponse`] between invocations
//! (Keychain on macOS, Secret Service on Linux, Credential Manager on
//! Windows). The OAuth2 core never touches it. Tokens are stored as JSON,
//! including the time they were received, so expiry survives a restart.

use chrono::{DateTime, Duration, Utc};

use crate::auth::exchange::TokenResponse;
use crate::error::{Result, TokenflowError};

/// Access tokens this close to expiry are refreshed before use.
pub const REFRESH_MARGIN_SECONDS: i64 = 60;

/// Returns `true` when `token` expires within [`REFRESH_MARGIN_SECONDS`] of `now`.
pub fn needs_refresh(token: &TokenResponse, now: DateTime<Utc>) -> bool {
    token
        .expires_at()
        .checked_sub_signed(Duration::seconds(REFRESH_MARGIN_SECONDS))
        .map_or(true, |refresh_at| now >= refresh_at)
}

/// Stateless accessor for tokens in the OS keyring.
///
/// Each application's token lives under its own service name derived from the
/// client id.
///
/// # Examples
///
/// ```no_run
/// use tokenflow::auth::token_store::TokenStore;
///
/// let store = TokenStore;
/// match store.load("my-app-key").unwrap() {
///     Some(token) => println!("Token valid until {}", token.expires_at()),
///     None => println!("Not logged in"),
/// }
/// ```
pub struct TokenStore;

impl TokenStore {
    fn service_name(client_id: &str) -> String {
        format!("tokenflow-{}", client_id)
    }

    fn entry(client_id: &str) -> Result<keyring::Entry> {
        let service = Self::service_name(client_id);
        keyring::Entry::new(&service, client_id)
            .map_err(|e| TokenflowError::Keyring(e).into())
    }

    /// Persists `token` for `client_id`, replacing any earlier one.
    ///
    /// # Errors
    ///
    /// Returns [`TokenflowError::Serialization`] if JSON serialization fails
    /// or [`TokenflowError::Keyring`] if the credential store rejects the write.
    pub fn save(&self, client_id: &str, token: &TokenResponse) -> Result<()> {
        let json_str = serde_json::to_string(token).map_err(TokenflowError::Serialization)?;
        Self::entry(client_id)?
            .set_password(&json_str)
            .map_err(TokenflowError::Keyring)?;
        tracing::debug!(client_id, "Stored token in keyring");
        Ok(())
    }

    /// Loads the token stored for `client_id`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` when nothing has been stored.
    ///
    /// # Errors
    ///
    /// Returns [`TokenflowError::Keyring`] for credential store failures and
    /// [`TokenflowError::Serialization`] when the stored JSON is malformed.
    pub fn load(&self, client_id: &str) -> Result<Option<TokenResponse>> {
        match Self::entry(client_id)?.get_password() {
            Ok(json_str) => {
                let token: TokenResponse =
                    serde_json::from_str(&json_str).map_err(TokenflowError::Serialization)?;
                Ok(Some(token))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(TokenflowError::Keyring(e).into()),
        }
    }

    /// Deletes the token stored for `client_id`; a no-op when there is none.
    ///
    /// # Errors
    ///
    /// Returns [`TokenflowError::Keyring`] for credential store failures.
    pub fn delete(&self, client_id: &str) -> Result<()> {
        match Self::entry(client_id)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(TokenflowError::Keyring(e).into()),
        }
    }
}
