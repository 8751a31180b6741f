//! Per-request context handed through the middleware pipeline to handlers.

use serde::de::DeserializeOwned;

use crate::Request;

/// Per-request context.
///
/// Wraps the inbound [`Request`] for the lifetime of one dispatch.
#[derive(Debug)]
pub struct Context {
    request: Request,
}

impl Context {
    /// Create a new context from a request
    pub fn new(request: Request) -> Self {
        Self { request }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    /// Decodes the request body as JSON into `T`.
    ///
    /// An empty body is decoded like any other and fails for every schema
    /// with required fields.
    pub fn json<T>(&self) -> Result<T, serde_json::Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_slice(self.request.body())
    }
}
