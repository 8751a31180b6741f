//! Caller-facing error taxonomy and its translation to HTTP responses.
//!
//! Handlers return `Result<Response, ProxyError>`. [`ProxyError::into_response`]
//! is the only place a failure becomes a status code, and the only place it
//! is logged. Diagnostic detail stays in the log; callers get a generic
//! message.

use bytes::Bytes;
use thiserror::Error;
use tracing::{error, warn};

use crate::http::{Response, StatusCode};
use crate::upstream::UpstreamError;

/// Longest slice of a rejected upstream body written to the log.
const MAX_LOGGED_BODY_CHARS: usize = 500;

#[derive(Debug, Error)]
pub enum ProxyError {
    /// The inbound body did not match the endpoint's schema.
    #[error("bad request body: {0}")]
    BadRequest(String),

    #[error("upstream unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("upstream rejected the request with HTTP {status}")]
    UpstreamRejected { status: u16, body: Bytes },

    /// The upstream answered successfully but not in the expected shape.
    #[error("malformed upstream response: {0}")]
    MalformedUpstreamResponse(String),
}

impl From<UpstreamError> for ProxyError {
    fn from(err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unreachable(detail) => Self::UpstreamUnreachable(detail),
            UpstreamError::Rejected { status, body } => Self::UpstreamRejected { status, body },
        }
    }
}

fn summarize_body(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw).replace(['\r', '\n'], " ");
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(MAX_LOGGED_BODY_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

impl ProxyError {
    pub fn bad_request(err: impl std::fmt::Display) -> Self {
        Self::BadRequest(err.to_string())
    }

    pub fn malformed(err: impl std::fmt::Display) -> Self {
        Self::MalformedUpstreamResponse(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BadRequest,
            Self::UpstreamUnreachable(_)
            | Self::UpstreamRejected { .. }
            | Self::MalformedUpstreamResponse(_) => StatusCode::InternalServerError,
        }
    }

    /// The message the caller sees.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "Error parsing request body",
            Self::UpstreamUnreachable(_) | Self::UpstreamRejected { .. } => {
                "Unable to get data from upstream provider"
            }
            Self::MalformedUpstreamResponse(_) => "Unable to parse upstream provider response",
        }
    }

    /// Logs the failure and converts it into the caller-facing response.
    pub fn into_response(self) -> Response {
        match &self {
            Self::BadRequest(detail) => warn!(%detail, "rejecting request body"),
            Self::UpstreamUnreachable(detail) => error!(%detail, "upstream call failed"),
            Self::UpstreamRejected { status, body } => error!(
                status,
                body = %summarize_body(body),
                "upstream returned an error status"
            ),
            Self::MalformedUpstreamResponse(detail) => {
                error!(%detail, "upstream response had an unexpected shape")
            }
        }

        Response::new(self.status()).body(self.public_message())
    }
}
