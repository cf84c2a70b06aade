//! In-process fake HTTP client for unit and integration tests
//!
//! [`FakeHttpClient`] replays a queue of scripted outcomes in order and
//! records every request it receives, so tests can drive the OAuth2 core
//! without a network and then assert on what was sent.
//!
//! # Example
//!
//! ```
//! use tokenflow::http::fake::FakeHttpClient;
//! use tokenflow::http::{HttpClient, HttpRequest, HttpResponse, Method};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let client = FakeHttpClient::new();
//! client.push_response(HttpResponse::new(201, r#"{"ok":true}"#));
//!
//! let url = url::Url::parse("https://example.com/token").unwrap();
//! let resp = client.execute(HttpRequest::new(Method::Post, url)).await.unwrap();
//! assert_eq!(resp.status, 201);
//! assert_eq!(client.requests().len(), 1);
//! # }
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{HttpClient, HttpRequest, HttpResponse, TransportError};

enum Scripted {
    Response(HttpResponse),
    Failure(String),
}

/// Scripted [`HttpClient`] for tests.
#[derive(Default)]
pub struct FakeHttpClient {
    script: Mutex<VecDeque<Scripted>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl FakeHttpClient {
    /// Creates a fake with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn push_response(&self, response: HttpResponse) {
        self.lock_script().push_back(Scripted::Response(response));
    }

    /// Queues a JSON response with the given status.
    pub fn push_json(&self, status: u16, body: serde_json::Value) {
        self.push_response(HttpResponse::new(status, body.to_string()));
    }

    /// Queues a transport failure.
    pub fn push_failure(&self, message: impl Into<String>) {
        self.lock_script()
            .push_back(Scripted::Failure(message.into()));
    }

    /// Returns a copy of every request received so far.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn lock_script(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.script
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.requests
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(request);

        match self.lock_script().pop_front() {
            Some(Scripted::Response(resp)) => Ok(resp),
            Some(Scripted::Failure(message)) => Err(TransportError::new(message)),
            None => Err(TransportError::new("no scripted response left")),
        }
    }
}
