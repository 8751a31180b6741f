//! `POST /top-coins`: the cached listing.
//!
//! A fresh cached listing is served without touching the upstream. Otherwise
//! the listing is fetched once; success replaces the cache, and failure falls
//! back to whatever was cached last, however old. Only a failure with an
//! empty cache reaches the caller as an error.
//!
//! Concurrent requests that find the cache stale may each refresh it. Every
//! store replaces a whole snapshot, so the last successful fetch wins and no
//! reader sees a mix.

use std::sync::Arc;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::app::AppState;
use crate::context::Context;
use crate::error::ProxyError;
use crate::http::Response;

pub async fn top_coins(state: Arc<AppState>, _ctx: Context) -> Result<Response, ProxyError> {
    let cache = state.top_coins_cache();

    if let Some(payload) = cache.fresh() {
        debug!(age = ?payload.age_at(Instant::now()), "serving cached top coins");
        return Ok(Response::json(payload.body().clone()));
    }

    let request = state.providers().livecoinwatch.top_coins();
    match state.upstream().execute(request).await {
        Ok(body) => {
            cache.store(body.clone(), Instant::now());
            debug!(bytes = body.len(), "top coins refreshed");
            Ok(Response::json(body))
        }
        Err(err) => match cache.read() {
            Some(stale) => {
                warn!(
                    error = %err,
                    age_secs = stale.age_at(Instant::now()).as_secs(),
                    "top coins refresh failed, serving stale listing"
                );
                Ok(Response::json(stale.body().clone()))
            }
            None => Err(err.into()),
        },
    }
}
