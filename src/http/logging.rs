//! Per-request log record
//!
//! Every call to the provider produces one record with the status, method,
//! URL, the `x-correlation` header the provider's support desk asks for, and
//! the remaining daily request quota when the provider reports it. Request
//! bodies are included except for calls to the token endpoint.

use url::Url;

use super::{HttpResponse, Method};

/// Header carrying the provider's correlation identifier.
pub const CORRELATION_HEADER: &str = "x-correlation";

/// Header carrying the remaining number of requests for the app today.
pub const RATE_LIMIT_APP_DAY_REMAINING_HEADER: &str = "x-ratelimit-appday-remaining";

/// Structured fields of one request log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestLog {
    pub status: u16,
    pub method: Method,
    pub url: String,
    /// `-` when the header is absent
    pub correlation: String,
    /// Not sent by the provider on errors
    pub remaining_today: Option<String>,
    pub body: Option<String>,
}

impl RequestLog {
    /// Extracts the record fields from a response.
    pub fn from_response(
        method: Method,
        url: &Url,
        response: &HttpResponse,
        body: Option<String>,
    ) -> Self {
        Self {
            status: response.status,
            method,
            url: url.to_string(),
            correlation: response
                .header(CORRELATION_HEADER)
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| "-".to_string()),
            remaining_today: response
                .header(RATE_LIMIT_APP_DAY_REMAINING_HEADER)
                .map(|v| v.trim().to_string()),
            body,
        }
    }

    /// Renders the record as a single human readable line.
    pub fn line(&self) -> String {
        let mut line = format!(
            "{} Request: {} {} x-correlation: {}",
            self.status, self.method, self.url, self.correlation
        );
        if let Some(remaining) = &self.remaining_today {
            line.push_str(&format!(" remaining requests today: {remaining}"));
        }
        if let Some(body) = &self.body {
            line.push_str(&format!(" body: {body}"));
        }
        line
    }
}

/// Emits `record` as a structured `tracing` event.
pub fn log_request(record: &RequestLog) {
    tracing::info!(
        status = record.status,
        method = %record.method,
        url = %record.url,
        correlation = %record.correlation,
        remaining_today = record.remaining_today.as_deref(),
        body = record.body.as_deref(),
        "{}",
        record.line()
    );
}
