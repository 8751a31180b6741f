//! Application wiring: shared state, routes, and the middleware stack.

use std::future::Future;
use std::sync::Arc;

use tracing::info;

use crate::cache::FreshnessCache;
use crate::config::Config;
use crate::context::Context;
use crate::error::ProxyError;
use crate::handlers;
use crate::middleware::{CorsMiddleware, LoggerMiddleware, Pipeline, from_middleware};
use crate::providers::Providers;
use crate::router::IntoHandler;
use crate::server::{Server, ServerError};
use crate::upstream::{HttpUpstream, Upstream};
use crate::{Request, Response, Router};

/// State shared by every request.
///
/// The top-coins cache is the only mutable part.
pub struct AppState {
    providers: Providers,
    upstream: Arc<dyn Upstream>,
    top_coins: FreshnessCache,
}

impl AppState {
    pub fn new(providers: Providers, upstream: Arc<dyn Upstream>, top_coins: FreshnessCache) -> Self {
        Self {
            providers,
            upstream,
            top_coins,
        }
    }

    pub fn providers(&self) -> &Providers {
        &self.providers
    }

    pub fn upstream(&self) -> &dyn Upstream {
        self.upstream.as_ref()
    }

    pub fn top_coins_cache(&self) -> &FreshnessCache {
        &self.top_coins
    }
}

/// Adapts a fallible handler to the router, translating its error into a
/// response.
fn endpoint<H, F>(state: &Arc<AppState>, handler: H) -> impl IntoHandler
where
    H: Fn(Arc<AppState>, Context) -> F + Send + Sync + 'static,
    F: Future<Output = Result<Response, ProxyError>> + Send + 'static,
{
    let state = Arc::clone(state);
    move |ctx: Context| {
        let fut = handler(Arc::clone(&state), ctx);
        async move { fut.await.unwrap_or_else(ProxyError::into_response) }
    }
}

/// Every endpoint, registered for `POST`.
pub fn router(state: Arc<AppState>) -> Router {
    let mut router = Router::new();
    router.post("/top-coins", endpoint(&state, handlers::top_coins));
    router.post("/get-balances", endpoint(&state, handlers::balances));
    router.post("/get-transaction", endpoint(&state, handlers::transaction));
    router.post("/get-transactions", endpoint(&state, handlers::transactions));
    router.post("/get-price", endpoint(&state, handlers::price));
    router.post("/get-current-price", endpoint(&state, handlers::current_price));
    router
}

/// Request logging outermost, then CORS, then the router.
pub fn pipeline(state: Arc<AppState>) -> Pipeline {
    Pipeline::new(
        vec![
            from_middleware(LoggerMiddleware),
            from_middleware(CorsMiddleware::new()),
        ],
        router(state),
    )
}

/// Builds the production state from `config`.
pub fn state_from_config(config: &Config) -> Result<AppState, reqwest::Error> {
    let upstream = HttpUpstream::new(config.upstream_timeout)?;
    Ok(AppState::new(
        config.providers(),
        Arc::new(upstream),
        FreshnessCache::default(),
    ))
}

/// Serves the pipeline on an already bound server until `shutdown` resolves.
pub async fn serve<S>(server: Server, state: AppState, shutdown: S) -> Result<(), ServerError>
where
    S: Future<Output = ()>,
{
    let pipeline = pipeline(Arc::new(state));
    info!(address = %server.local_addr(), "serving proxy endpoints");
    server
        .run_until(
            move |request: Request| {
                let pipeline = pipeline.clone();
                async move { pipeline.handle(request).await }
            },
            shutdown,
        )
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::state;
    use crate::http::StatusCode;

    fn request(method: &str, path: &str, body: &str) -> Request {
        let raw = format!(
            "{method} {path} HTTP/1.1\r\nHost: t\r\nContent-Length: {}\r\n\r\n",
            body.len()
        );
        let (mut req, _) = Request::parse(raw.as_bytes()).unwrap();
        req.set_body(body.to_owned().into());
        req
    }

    #[tokio::test]
    async fn registers_every_endpoint() {
        let (state, _) = state();
        assert_eq!(router(state).len(), 6);
    }

    #[tokio::test]
    async fn success_carries_json_and_cors_headers() {
        let (state, upstream) = state();
        upstream.respond(r#"{"coins":[]}"#);

        let resp = pipeline(state).handle(request("POST", "/top-coins", "")).await;
        assert_eq!(resp.status(), StatusCode::Ok);
        assert_eq!(resp.headers().get("content-type"), Some("application/json"));
        assert_eq!(resp.headers().get("access-control-allow-origin"), Some("*"));
    }

    #[tokio::test]
    async fn errors_are_translated_and_keep_cors() {
        let (state, upstream) = state();

        let resp = pipeline(state)
            .handle(request("POST", "/get-balances", "not json"))
            .await;
        assert_eq!(resp.status(), StatusCode::BadRequest);
        assert_eq!(resp.headers().get("access-control-allow-origin"), Some("*"));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn preflight_never_reaches_a_handler() {
        let (state, upstream) = state();

        let resp = pipeline(state)
            .handle(request("OPTIONS", "/get-price", ""))
            .await;
        assert_eq!(resp.status(), StatusCode::NoContent);
        assert_eq!(resp.headers().get("access-control-allow-methods"), Some("POST"));
        assert_eq!(resp.headers().get("access-control-max-age"), Some("3600"));
        assert_eq!(upstream.calls(), 0);
    }

    #[tokio::test]
    async fn wrong_method_and_unknown_path() {
        let (state, _) = state();
        let pipeline = pipeline(state);

        let resp = pipeline.handle(request("GET", "/top-coins", "")).await;
        assert_eq!(resp.status(), StatusCode::MethodNotAllowed);
        assert_eq!(resp.headers().get("allow"), Some("POST, OPTIONS"));

        let resp = pipeline.handle(request("POST", "/nope", "")).await;
        assert_eq!(resp.status(), StatusCode::NotFound);
    }
}
