//! HTTP client collaborator
//!
//! The OAuth2 core never talks to the network directly. It builds an
//! [`HttpRequest`], hands it to an implementation of [`HttpClient`] and reads
//! back an [`HttpResponse`]. Timeouts, retries and TLS policy belong to the
//! implementation; any failure to obtain a response surfaces as a
//! [`TransportError`].
//!
//! # Module Layout
//!
//! - [`fake`]    -- scripted in-process client for tests
//! - [`logging`] -- the per-request log record

pub mod fake;
pub mod logging;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use url::Url;

use crate::config::HttpConfig;
use crate::error::BoxError;

pub use logging::{log_request, RequestLog};

// ---------------------------------------------------------------------------
// Request / response model
// ---------------------------------------------------------------------------

/// HTTP methods used by the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Returns the canonical upper-case method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "PATCH" => Ok(Method::Patch),
            "DELETE" => Ok(Method::Delete),
            other => Err(format!("unsupported HTTP method: {other}")),
        }
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// `application/x-www-form-urlencoded` pairs, sent in order
    Form(Vec<(String, String)>),
    /// `application/json; charset=utf-8`
    Json(Value),
}

impl RequestBody {
    /// Renders the body for log output.
    pub fn to_log_string(&self) -> String {
        match self {
            RequestBody::Form(pairs) => url::form_urlencoded::Serializer::new(String::new())
                .extend_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
                .finish(),
            RequestBody::Json(value) => value.to_string(),
        }
    }
}

/// An outgoing HTTP request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
}

impl HttpRequest {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: Vec::new(),
            body: None,
        }
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a form-encoded body.
    pub fn form<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.body = Some(RequestBody::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ));
        self
    }

    /// Sets a JSON body.
    pub fn json(mut self, value: Value) -> Self {
        self.body = Some(RequestBody::Json(value));
        self
    }

    /// Returns the form value for `key`, if the body is a form.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match &self.body {
            Some(RequestBody::Form(pairs)) => pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// A received HTTP response.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    /// Creates a response with the given status and body and no headers.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain any response (DNS, connect, TLS, timeout, reset).
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransportError {
    /// Creates a transport error from a plain message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error that wraps an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

// ---------------------------------------------------------------------------
// HttpClient
// ---------------------------------------------------------------------------

/// Capability to execute one HTTP request.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Executes `request` and returns whatever response the server produced,
    /// including non-2xx statuses.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// Executes `request` and emits the per-request log record.
///
/// The body is left out of the record when the request targets
/// `token_endpoint`.
pub async fn send_logged<C>(
    client: &C,
    token_endpoint: &Url,
    request: HttpRequest,
) -> Result<HttpResponse, TransportError>
where
    C: HttpClient + ?Sized,
{
    let method = request.method;
    let url = request.url.clone();
    let body = request.body.clone();

    match client.execute(request).await {
        Ok(response) => {
            let logged_body = if url == *token_endpoint {
                None
            } else {
                body.as_ref().map(RequestBody::to_log_string)
            };
            log_request(&RequestLog::from_response(
                method,
                &url,
                &response,
                logged_body,
            ));
            Ok(response)
        }
        Err(err) => {
            tracing::warn!(method = %method, url = %url, error = %err, "Request failed without a response");
            Err(err)
        }
    }
}

// ---------------------------------------------------------------------------
// ReqwestClient
// ---------------------------------------------------------------------------

/// [`HttpClient`] backed by `reqwest` with rustls certificate verification.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::Client,
}

impl ReqwestClient {
    /// Builds a client from the HTTP settings.
    ///
    /// Redirects are not followed: the token endpoint and the API never
    /// legitimately redirect, and following one would resend credentials.
    pub fn new(config: &HttpConfig) -> Result<Self, reqwest::Error> {
        let inner = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { inner })
    }

    /// Wraps an existing `reqwest` client.
    pub fn from_client(inner: reqwest::Client) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.inner.request(method, request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match request.body {
            Some(RequestBody::Form(pairs)) => builder.form(&pairs),
            Some(RequestBody::Json(value)) => builder
                .header(
                    reqwest::header::CONTENT_TYPE,
                    "application/json; charset=utf-8",
                )
                .body(value.to_string()),
            None => builder,
        };

        let resp = builder.send().await.map_err(|e| {
            TransportError::with_source(format!("{} {} failed", request.method, request.url), e)
        })?;

        let status = resp.status().as_u16();
        let headers = resp
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = resp.text().await.map_err(|e| {
            TransportError::with_source(
                format!("reading response body of {} {}", request.method, request.url),
                e,
            )
        })?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
