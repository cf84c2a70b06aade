//! Bearer-authenticated API calls
//!
//! A thin JSON client for the provider's API gateway. It attaches the access
//! token, logs every request (bodies included) and turns error responses into
//! an [`ApiError::Status`] carrying a readable summary built from the
//! provider's error body:
//!
//! ```json
//! {
//!     "Message": "One or more properties of the request are invalid!",
//!     "ModelState": { "AssetType": ["'Asset Type' must not be empty."] },
//!     "ErrorCode": "InvalidModelState"
//! }
//! ```
//!
//! Some endpoints nest the same fields under `ErrorInfo`.

use std::sync::Arc;

use serde_json::Value;
use uuid::Uuid;

use crate::config::AppConfiguration;
use crate::error::ApiError;
use crate::http::{send_logged, HttpClient, HttpRequest, Method};

/// Header that makes otherwise identical requests distinct to the gateway.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Client for the API gateway at `config.api_base_url`.
pub struct ApiClient {
    http: Arc<dyn HttpClient>,
    config: AppConfiguration,
    access_token: String,
}

impl ApiClient {
    /// Creates a client presenting `access_token` on every call.
    pub fn new(
        config: AppConfiguration,
        http: Arc<dyn HttpClient>,
        access_token: impl Into<String>,
    ) -> Self {
        Self {
            http,
            config,
            access_token: access_token.into(),
        }
    }

    /// Sends one request to `path` below the API base URL.
    ///
    /// # Arguments
    ///
    /// * `method` - HTTP method
    /// * `path` - Path and optional query, e.g. `/port/v1/users/me`
    /// * `body` - JSON body, sent as `application/json; charset=utf-8`
    /// * `with_request_id` - Adds a random `X-Request-ID` header
    ///
    /// # Returns
    ///
    /// The parsed JSON body, or `None` for a 2xx response without a body.
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidPath`] when `path` does not form a valid URL
    /// - [`ApiError::Network`] when no response was received
    /// - [`ApiError::InvalidJson`] when the body is not JSON
    /// - [`ApiError::Status`] for statuses of 400 and above
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        with_request_id: bool,
    ) -> Result<Option<Value>, ApiError> {
        let url = self
            .config
            .api_url(path)
            .map_err(|source| ApiError::InvalidPath {
                path: path.to_string(),
                source,
            })?;

        let mut request = HttpRequest::new(method, url.clone())
            .header("Authorization", format!("Bearer {}", self.access_token));
        if let Some(body) = body {
            request = request.json(body.clone());
        }
        if with_request_id {
            request = request.header(REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        }

        let response = send_logged(self.http.as_ref(), &self.config.token_endpoint, request)
            .await
            .map_err(|e| ApiError::Network {
                method: method.to_string(),
                url: url.to_string(),
                source: Box::new(e),
            })?;

        let status = response.status;
        let raw = if response.body.trim().is_empty() {
            if response.is_success() {
                return Ok(None);
            }
            synthesize_error_body(status)
        } else {
            response.body
        };

        let json: Value = serde_json::from_str(&raw).map_err(|_| ApiError::InvalidJson {
            method: method.to_string(),
            url: url.to_string(),
            body: raw.clone(),
        })?;

        if status >= 400 {
            let summary = summarize_error(&json);
            tracing::warn!(status, %method, %url, "API error: {}", summary);
            return Err(ApiError::Status {
                status,
                code: error_code(&json),
                summary,
            });
        }

        Ok(Some(json))
    }

    /// `GET path`.
    pub async fn get(&self, path: &str) -> Result<Option<Value>, ApiError> {
        self.request(Method::Get, path, None, false).await
    }

    /// `PUT path` with a JSON body.
    pub async fn put(&self, path: &str, body: &Value) -> Result<Option<Value>, ApiError> {
        self.request(Method::Put, path, Some(body), false).await
    }

    /// Fetches the user record for `user_key` (the token's `uid` claim).
    pub async fn user(&self, user_key: &str) -> Result<Option<Value>, ApiError> {
        let encoded: String = url::form_urlencoded::byte_serialize(user_key.as_bytes()).collect();
        self.get(&format!("/port/v1/users/{encoded}")).await
    }
}

/// Stand-in body for an error response that arrived without one.
fn synthesize_error_body(status: u16) -> String {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("");
    serde_json::json!({
        "ErrorCode": status.to_string(),
        "Message": format!("HTTP {status} {reason}").trim_end(),
    })
    .to_string()
}

fn error_object(body: &Value) -> &Value {
    body.get("ErrorInfo").unwrap_or(body)
}

/// Returns the provider's `ErrorCode`, looking inside `ErrorInfo` first.
pub fn error_code(body: &Value) -> Option<String> {
    match error_object(body).get("ErrorCode")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Builds a readable summary of an API error body.
///
/// The summary is the `Message` followed by the first message of every
/// `ModelState` entry, one per line. Without a `Message` the error code or,
/// failing that, the raw body is used.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use tokenflow::api::summarize_error;
///
/// let body = json!({"ErrorCode": "IllegalInstrumentId", "Message": "Instrument-ID is invalid"});
/// assert_eq!(summarize_error(&body), "Instrument-ID is invalid");
/// ```
pub fn summarize_error(body: &Value) -> String {
    let error = error_object(body);

    let mut summary = match error.get("Message").and_then(Value::as_str) {
        Some(message) => message.to_string(),
        None => error_code(body).unwrap_or_else(|| body.to_string()),
    };

    if let Some(Value::Object(model_state)) = error.get("ModelState") {
        for messages in model_state.values() {
            let first = match messages {
                Value::Array(list) => list.first().and_then(Value::as_str),
                Value::String(s) => Some(s.as_str()),
                _ => None,
            };
            if let Some(first) = first {
                summary.push('\n');
                summary.push_str(first);
            }
        }
    }

    summary
}
