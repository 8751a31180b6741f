//! Cross-Origin Resource Sharing for browser clients.
//!
//! Browsers call the proxy directly from the client application, so every
//! endpoint answers preflight requests and labels its responses with
//! `Access-Control-Allow-Origin`.

use std::future::Future;
use std::pin::Pin;

use crate::{
    Method, Response, StatusCode,
    context::Context,
    middleware::{Middleware, Next},
};

/// CORS middleware.
///
/// - `OPTIONS` requests are short-circuited with `204 No Content` and the
///   `Access-Control-Allow-Origin`, `-Methods`, `-Headers`, and `-Max-Age`
///   headers, whether or not an `Origin` header was sent. The router is not
///   consulted.
/// - Every other response gets `Access-Control-Allow-Origin`.
///
/// Origins are a wildcard, the only allowed method is `POST`, the only
/// allowed header is `Content-Type`, and preflights are cacheable for an hour.
#[derive(Debug, Clone)]
pub struct CorsMiddleware {
    allow_origin: String,
    allowed_methods: Vec<String>,
    allowed_headers: Vec<String>,
    max_age_secs: u32,
}

impl Default for CorsMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

impl CorsMiddleware {
    pub fn new() -> Self {
        Self {
            allow_origin: "*".to_owned(),
            allowed_methods: vec![Method::Post.as_str().to_owned()],
            allowed_headers: vec!["Content-Type".to_owned()],
            max_age_secs: 3600,
        }
    }

    fn preflight(&self) -> Response {
        Response::new(StatusCode::NoContent)
            .header("Access-Control-Allow-Origin", &self.allow_origin)
            .header("Access-Control-Allow-Methods", self.allowed_methods.join(", "))
            .header("Access-Control-Allow-Headers", self.allowed_headers.join(", "))
            .header("Access-Control-Max-Age", self.max_age_secs.to_string())
    }
}

impl Middleware for CorsMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        if ctx.request().method() == &Method::Options {
            let response = self.preflight();
            return Box::pin(async move { response });
        }

        let allow_origin = self.allow_origin.clone();
        Box::pin(async move {
            let mut response = next.run(ctx).await;
            response.set_header("Access-Control-Allow-Origin", allow_origin);
            response
        })
    }
}
