//! Authorization request URL and callback query parameters

use url::Url;

use crate::auth::pkce::CHALLENGE_METHOD;
use crate::config::AppConfiguration;
use crate::error::{AuthError, AuthResult};

/// Builds the provider authorization URL.
///
/// Parameters are appended in a fixed order: `client_id`, `response_type`,
/// `state`, `redirect_uri`, then `code_challenge_method` and
/// `code_challenge` when a PKCE challenge is given. Values are
/// form-urlencoded. Any query already present on the configured endpoint is
/// kept in front.
///
/// # Examples
///
/// ```
/// use tokenflow::auth::authorize::build_authorization_url;
/// use tokenflow::config::AppConfiguration;
/// use url::Url;
///
/// let config = AppConfiguration {
///     client_id: "X".to_string(),
///     redirect_uri: Url::parse("https://app/cb").unwrap(),
///     auth_endpoint: Url::parse("https://p/authorize").unwrap(),
///     ..AppConfiguration::default()
/// };
///
/// let url = build_authorization_url(&config, "S1", None);
/// assert_eq!(
///     url.as_str(),
///     "https://p/authorize?client_id=X&response_type=code&state=S1&redirect_uri=https%3A%2F%2Fapp%2Fcb"
/// );
/// ```
pub fn build_authorization_url(
    config: &AppConfiguration,
    state: &str,
    pkce_challenge: Option<&str>,
) -> Url {
    let mut url = config.auth_endpoint.clone();
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("client_id", &config.client_id);
        query.append_pair("response_type", "code");
        query.append_pair("state", state);
        query.append_pair("redirect_uri", config.redirect_uri.as_str());
        if let Some(challenge) = pkce_challenge {
            query.append_pair("code_challenge_method", CHALLENGE_METHOD);
            query.append_pair("code_challenge", challenge);
        }
    }
    url
}

/// Query parameters of the provider's redirect back to the app.
///
/// All values are attacker-controlled until validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Parses a raw query string (without the leading `?`).
    ///
    /// Values are percent-decoded. When a key repeats, the first occurrence
    /// wins. Unknown keys such as `iss` or `client_id` are ignored.
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            let slot = match key.as_ref() {
                "code" => &mut params.code,
                "state" => &mut params.state,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    /// Parses the query of a full callback URL.
    pub fn from_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or(""))
    }

    /// Fails when the provider reported an error on the redirect.
    ///
    /// Either parameter being present counts, even when empty.
    ///
    /// # Errors
    ///
    /// [`AuthError::AuthorizationDenied`] carrying both values.
    pub fn check_for_errors(&self) -> AuthResult<()> {
        if self.error.is_some() || self.error_description.is_some() {
            return Err(AuthError::AuthorizationDenied {
                error: self.error.clone().unwrap_or_default(),
                description: self.error_description.clone().unwrap_or_default(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfiguration {
        AppConfiguration {
            client_id: "X".to_string(),
            client_secret: None,
            redirect_uri: Url::parse("https://app/cb").unwrap(),
            auth_endpoint: Url::parse("https://p/authorize").unwrap(),
            token_endpoint: Url::parse("https://p/token").unwrap(),
            api_base_url: Url::parse("https://p/openapi").unwrap(),
        }
    }

    #[test]
    fn test_authorization_url_exact_order_and_encoding() {
        let url = build_authorization_url(&config(), "S1", None);
        assert_eq!(
            url.as_str(),
            "https://p/authorize?client_id=X&response_type=code&state=S1&redirect_uri=https%3A%2F%2Fapp%2Fcb"
        );
    }

    #[test]
    fn test_authorization_url_with_pkce_challenge() {
        let url = build_authorization_url(
            &config(),
            "S1",
            Some("E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"),
        );
        assert_eq!(
            url.as_str(),
            "https://p/authorize?client_id=X&response_type=code&state=S1&redirect_uri=https%3A%2F%2Fapp%2Fcb\
             &code_challenge_method=S256&code_challenge=E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_state_base64_characters_are_percent_encoded() {
        let url = build_authorization_url(&config(), "eyJk+YX/Q=", None);
        assert!(url.as_str().contains("state=eyJk%2BYX%2FQ%3D"), "{url}");

        let params = CallbackParams::from_url(&url);
        assert_eq!(params.state.as_deref(), Some("eyJk+YX/Q="));
    }

    #[test]
    fn test_existing_endpoint_query_is_kept() {
        let mut cfg = config();
        cfg.auth_endpoint = Url::parse("https://p/authorize?prompt=login").unwrap();
        let url = build_authorization_url(&cfg, "S1", None);
        assert!(url
            .as_str()
            .starts_with("https://p/authorize?prompt=login&client_id=X&"));
    }

    #[test]
    fn test_callback_params_from_query() {
        let params = CallbackParams::from_query(
            "code=Bvi-SeI5dAR74VM1H75EbSVBci8&iss=https%3A%2F%2Fauth&state=Hallo&client_id=STGOApp",
        );
        assert_eq!(params.code.as_deref(), Some("Bvi-SeI5dAR74VM1H75EbSVBci8"));
        assert_eq!(params.state.as_deref(), Some("Hallo"));
        assert!(params.error.is_none());
        assert!(params.check_for_errors().is_ok());
    }

    #[test]
    fn test_callback_params_first_occurrence_wins() {
        let params = CallbackParams::from_query("state=first&state=second");
        assert_eq!(params.state.as_deref(), Some("first"));
    }

    #[test]
    fn test_callback_params_empty_query() {
        assert_eq!(CallbackParams::from_query(""), CallbackParams::default());
    }

    #[test]
    fn test_check_for_errors_reports_provider_error() {
        let params = CallbackParams::from_query(
            "error=access_denied&error_description=User+cancelled+the+login",
        );
        match params.check_for_errors() {
            Err(AuthError::AuthorizationDenied { error, description }) => {
                assert_eq!(error, "access_denied");
                assert_eq!(description, "User cancelled the login");
            }
            other => panic!("expected AuthorizationDenied, got {other:?}"),
        }
    }

    #[test]
    fn test_check_for_errors_with_description_only() {
        let params = CallbackParams::from_query("error_description=boom");
        assert!(matches!(
            params.check_for_errors(),
            Err(AuthError::AuthorizationDenied { ref error, .. }) if error.is_empty()
        ));
    }

    #[test]
    fn test_check_for_errors_with_empty_error_value() {
        let params = CallbackParams::from_query("error=&code=abc");
        assert!(params.check_for_errors().is_err());
    }
}
