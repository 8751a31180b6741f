//! One-shot authenticated calls to third-party data providers.
//!
//! An [`UpstreamRequest`] fully describes the outbound call; an [`Upstream`]
//! executes it exactly once, with no retry, and classifies the outcome. The
//! body of a successful response is returned unparsed.

use std::error::Error as StdError;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Method;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::http::Headers;

#[cfg(test)]
pub(crate) mod testing;

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Why an upstream call produced no usable body.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// Connection, DNS, TLS, timeout, or body-read failure.
    #[error("upstream unreachable: {0}")]
    Unreachable(String),

    /// The provider answered with a non-success status.
    #[error("upstream rejected the request with HTTP {status}")]
    Rejected { status: u16, body: Bytes },
}

/// Description of one outbound HTTP call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamRequest {
    pub method: Method,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<Bytes>,
}

impl UpstreamRequest {
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: Headers::new(),
            body: None,
        }
    }

    /// A `POST` carrying `body` as `application/json`.
    pub fn post_json(url: Url, body: &serde_json::Value) -> Self {
        let mut headers = Headers::new();
        headers.insert("Content-Type", "application/json");
        Self {
            method: Method::POST,
            url,
            headers,
            body: Some(Bytes::from(body.to_string())),
        }
    }

    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.set(name, value);
        self
    }

    /// Scheme, host, and path only. Query strings can hold API keys and must
    /// stay out of logs.
    pub fn redacted_url(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }
}

/// Executes upstream calls. The seam between handlers and the network.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Performs `request` once and returns the raw success body.
    async fn execute(&self, request: UpstreamRequest) -> Result<Bytes, UpstreamError>;
}

/// [`Upstream`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
}

impl HttpUpstream {
    /// Builds a client whose every call is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .pool_max_idle_per_host(4)
            .build()?;
        Ok(Self { client })
    }
}

/// Flattens an error's source chain so DNS/TLS/socket causes are visible.
fn format_reqwest_error(err: reqwest::Error) -> String {
    // Provider URLs carry API keys.
    let err = err.without_url();
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !cause_msg.is_empty() && !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }

    message
}

#[async_trait]
impl Upstream for HttpUpstream {
    async fn execute(&self, request: UpstreamRequest) -> Result<Bytes, UpstreamError> {
        debug!(method = %request.method, url = %request.redacted_url(), "calling upstream");

        let UpstreamRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(method, url);
        for (name, value) in headers.iter() {
            builder = builder.header(name, value);
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| UpstreamError::Unreachable(format_reqwest_error(e)))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| UpstreamError::Unreachable(format_reqwest_error(e)))?;

        if !status.is_success() {
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn post_json_sets_content_type_and_body() {
        let req = UpstreamRequest::post_json(url("https://api.example/coins/list"), &json!({"a": 1}))
            .header("x-api-key", "k");
        assert_eq!(req.method, Method::POST);
        assert_eq!(req.headers.get("content-type"), Some("application/json"));
        assert_eq!(req.headers.get("X-Api-Key"), Some("k"));
        assert_eq!(req.body.as_deref(), Some(&br#"{"a":1}"#[..]));
    }

    #[test]
    fn redacted_url_drops_query() {
        let req = UpstreamRequest::get(url("https://api.example/v1/56/x/?key=secret"));
        assert_eq!(req.redacted_url(), "https://api.example/v1/56/x/");
    }

    #[tokio::test]
    async fn connection_refused_is_unreachable() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let upstream = HttpUpstream::new(Duration::from_secs(5)).unwrap();
        let err = upstream
            .execute(UpstreamRequest::get(url(&format!(
                "http://127.0.0.1:{port}/?key=secret"
            ))))
            .await
            .unwrap_err();

        match err {
            UpstreamError::Unreachable(msg) => assert!(!msg.contains("secret")),
            other => panic!("expected Unreachable, got {other:?}"),
        }
    }
}
