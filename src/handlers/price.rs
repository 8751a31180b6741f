//! Price lookups against LiveCoinWatch.
//!
//! `POST /get-price` answers either the current price or, when a non-zero
//! `timestamp` (Unix milliseconds) is given, the price history in a five
//! minute window centred on it. `POST /get-current-price` only ever asks for
//! the current price.

use std::sync::Arc;

use serde::Deserialize;

use crate::app::AppState;
use crate::context::Context;
use crate::error::ProxyError;
use crate::http::Response;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PriceQuery {
    pub code: String,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl PriceQuery {
    /// The requested point in time, if any. Zero means "now".
    pub fn at(&self) -> Option<i64> {
        self.timestamp.filter(|&ts| ts != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrentPriceQuery {
    pub code: String,
}

pub async fn price(state: Arc<AppState>, ctx: Context) -> Result<Response, ProxyError> {
    let query: PriceQuery = super::parse_body(&ctx)?;
    let livecoinwatch = &state.providers().livecoinwatch;
    let request = match query.at() {
        Some(ts) => livecoinwatch.price_history(&query.code, ts),
        None => livecoinwatch.price(&query.code),
    };
    let body = state.upstream().execute(request).await?;
    Ok(Response::json(body))
}

pub async fn current_price(state: Arc<AppState>, ctx: Context) -> Result<Response, ProxyError> {
    let query: CurrentPriceQuery = super::parse_body(&ctx)?;
    let request = state.providers().livecoinwatch.price(&query.code);
    let body = state.upstream().execute(request).await?;
    Ok(Response::json(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{body_text, ctx, state};
    use serde_json::{Value, json};

    fn sent_body(req: &crate::upstream::UpstreamRequest) -> Value {
        serde_json::from_slice(req.body.as_ref().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn without_timestamp_asks_for_current_price() {
        let (state, upstream) = state();
        upstream.respond(r#"{"rate":612.5}"#).respond(r#"{"rate":613.0}"#);

        let resp = price(state.clone(), ctx(r#"{"code":"BNB"}"#)).await.unwrap();
        assert_eq!(body_text(&resp), r#"{"rate":612.5}"#);
        price(state, ctx(r#"{"code":"BNB","timestamp":0}"#)).await.unwrap();

        for sent in upstream.requests() {
            assert_eq!(sent.url.as_str(), "https://lcw.test/coins/single");
            assert_eq!(sent.headers.get("x-api-key"), Some("pkey"));
            assert_eq!(sent_body(&sent), json!({"currency": "USD", "code": "BNB", "meta": false}));
        }
    }

    #[tokio::test]
    async fn with_timestamp_asks_for_history_window() {
        let (state, upstream) = state();
        upstream.respond(r#"{"history":[]}"#);

        let resp = price(state, ctx(r#"{"code":"BTC","timestamp":1620000000000}"#))
            .await
            .unwrap();
        assert_eq!(body_text(&resp), r#"{"history":[]}"#);

        let requests = upstream.requests();
        let sent = &requests[0];
        assert_eq!(sent.url.as_str(), "https://lcw.test/coins/single/history");
        assert_eq!(
            sent_body(sent),
            json!({
                "currency": "USD",
                "code": "BTC",
                "start": 1_619_999_850_000_i64,
                "end": 1_620_000_150_000_i64,
            })
        );
    }

    #[tokio::test]
    async fn current_price_ignores_timestamp() {
        let (state, upstream) = state();
        upstream.respond(r#"{"rate":1.0}"#);

        current_price(state, ctx(r#"{"code":"USDT","timestamp":1620000000000}"#))
            .await
            .unwrap();
        assert_eq!(upstream.requests()[0].url.as_str(), "https://lcw.test/coins/single");
    }

    #[tokio::test]
    async fn missing_code_is_a_bad_request() {
        let (state, upstream) = state();

        let err = current_price(state.clone(), ctx("{}")).await.unwrap_err();
        assert!(matches!(err, ProxyError::BadRequest(_)));
        let err = price(state, ctx(r#"{"timestamp":5}"#)).await.unwrap_err();
        assert!(matches!(err, ProxyError::BadRequest(_)));
        assert_eq!(upstream.calls(), 0);
    }
}
