//! Middleware pipeline: composable before/after request handler logic.
//!
//! Each middleware wraps the next layer, so it can inspect the request,
//! short-circuit with its own response, or decorate the downstream response.
//! The router is always the innermost layer of a [`Pipeline`].
//!
//! ## Core types
//!
//! - [`Middleware`]: trait implemented by all middleware.
//! - [`Next`]: cursor into the remaining chain; call [`Next::run`] to advance.
//! - [`MiddlewareHandler`]: type-erased, cheaply-cloneable middleware function.
//! - [`Pipeline`]: ordered middleware stack terminated by a [`Router`].
//! - [`LoggerMiddleware`]: request/response logger.
//! - [`CorsMiddleware`]: preflight answering and CORS response headers.

use std::{future::Future, pin::Pin, sync::Arc};
use tokio::time::Instant;

use crate::{Request, Response, Router, StatusCode, context::Context};

pub mod cors;

pub use cors::CorsMiddleware;

/// A type-erased, reference-counted middleware function.
pub type MiddlewareHandler = Arc<
    dyn Fn(Context, Next) -> Pin<Box<dyn Future<Output = Response> + Send>> + Send + Sync + 'static,
>;

/// Converts a [`Middleware`] implementation into a [`MiddlewareHandler`].
pub fn from_middleware<M>(middleware: M) -> MiddlewareHandler
where
    M: Middleware + 'static,
{
    let middleware = Arc::new(middleware);
    Arc::new(move |ctx: Context, next: Next| middleware.handle(ctx, next))
}

/// A cursor into the remaining middleware chain for a single request.
///
/// `Next` is consumed by [`run`](Self::run), so a middleware can forward a
/// request at most once.
pub struct Next {
    chain: Arc<[MiddlewareHandler]>,
    index: usize,
}

impl Next {
    /// Invokes the next layer and returns its response.
    ///
    /// If the chain is exhausted without any layer responding, a
    /// `500 Internal Server Error` is returned.
    pub async fn run(mut self, ctx: Context) -> Response {
        match self.chain.get(self.index).cloned() {
            Some(handler) => {
                self.index += 1;
                handler(ctx, self).await
            }
            None => Response::new(StatusCode::InternalServerError)
                .body("No response generated by middleware pipeline"),
        }
    }
}

/// The core trait for all middleware.
///
/// Implementors may pass through (`next.run(ctx).await`), short-circuit by
/// returning a response without calling `next`, or decorate the response
/// returned by `next`.
pub trait Middleware: Send + Sync {
    /// Handle the request and optionally delegate to the next layer.
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>>;
}

/// An ordered middleware stack whose innermost layer dispatches to a [`Router`].
///
/// Cloning is cheap; every clone shares the same chain.
///
/// # Examples
///
/// ```rust,no_run
/// use coinproxy::{Router, Response, context::Context};
/// use coinproxy::middleware::{CorsMiddleware, LoggerMiddleware, Pipeline, from_middleware};
///
/// let mut router = Router::new();
/// router.post("/top-coins", |_ctx: Context| async { Response::json("[]") });
///
/// let pipeline = Pipeline::new(
///     vec![
///         from_middleware(LoggerMiddleware),
///         from_middleware(CorsMiddleware::new()),
///     ],
///     router,
/// );
/// ```
#[derive(Clone)]
pub struct Pipeline {
    chain: Arc<[MiddlewareHandler]>,
}

impl Pipeline {
    /// Builds a pipeline running `layers` outermost-first, then `router`.
    pub fn new(mut layers: Vec<MiddlewareHandler>, router: Router) -> Self {
        let router = Arc::new(router);
        let terminal: MiddlewareHandler = Arc::new(
            move |ctx: Context, _next: Next| -> Pin<Box<dyn Future<Output = Response> + Send>> {
                let router = Arc::clone(&router);
                Box::pin(async move { router.route(ctx).await })
            },
        );
        layers.push(terminal);
        Self {
            chain: layers.into(),
        }
    }

    /// Runs one request through the whole chain.
    pub async fn handle(&self, request: Request) -> Response {
        let next = Next {
            chain: Arc::clone(&self.chain),
            index: 0,
        };
        next.run(Context::new(request)).await
    }
}

/// Logs each request's method, path, status, and duration at `info` level.
///
/// Never short-circuits.
pub struct LoggerMiddleware;

impl Middleware for LoggerMiddleware {
    fn handle(&self, ctx: Context, next: Next) -> Pin<Box<dyn Future<Output = Response> + Send>> {
        Box::pin(async move {
            let start = Instant::now();
            let method = ctx.request().method().clone();
            let path = ctx.request().path().to_owned();

            let response = next.run(ctx).await;

            tracing::info!(
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                elapsed = ?start.elapsed(),
                "request completed"
            );

            response
        })
    }
}
