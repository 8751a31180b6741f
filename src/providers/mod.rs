//! Request builders for the third-party providers.
//!
//! Each method turns already-validated caller input into one
//! [`UpstreamRequest`], attaching the provider's API key the way that
//! provider expects it. Caller-supplied values only ever become single
//! percent-encoded path segments or query values.

use serde_json::json;
use url::Url;

use crate::upstream::UpstreamRequest;

pub const COVALENT_BASE_URL: &str = "https://api.covalenthq.com";
pub const BSCSCAN_BASE_URL: &str = "https://api.bscscan.com";
pub const LIVECOINWATCH_BASE_URL: &str = "https://api.livecoinwatch.com";

/// Half-width, in milliseconds, of the history window around a requested
/// price timestamp.
pub const PRICE_HISTORY_HALF_WINDOW_MS: i64 = 150_000;

/// Number of coins requested for the top-coins listing.
pub const TOP_COINS_LIMIT: u32 = 100;

/// Appends `segments` to the base URL's path.
///
/// Base URLs are checked by [`Config`](crate::config::Config) to be
/// hierarchical, so the path is always extendable.
fn endpoint(base: &Url, segments: &[&str]) -> Url {
    let mut url = base.clone();
    if let Ok(mut path) = url.path_segments_mut() {
        path.pop_if_empty().extend(segments);
    }
    url
}

/// Covalent: balances and single transactions. Key travels as `?key=`.
#[derive(Debug, Clone)]
pub struct Covalent {
    base: Url,
    api_key: String,
}

impl Covalent {
    pub fn new(base: Url, api_key: impl Into<String>) -> Self {
        Self {
            base,
            api_key: api_key.into(),
        }
    }

    /// `GET /v1/{chain_id}/address/{address}/balances_v2/`
    pub fn balances(&self, chain_id: u64, address: &str) -> UpstreamRequest {
        let chain = chain_id.to_string();
        let mut url = endpoint(
            &self.base,
            &["v1", &chain, "address", address, "balances_v2", ""],
        );
        url.query_pairs_mut().append_pair("key", &self.api_key);
        UpstreamRequest::get(url)
    }

    /// `GET /v1/{chain_id}/transaction_v2/{transaction_id}/?no-logs=true`
    pub fn transaction(&self, chain_id: u64, transaction_id: &str) -> UpstreamRequest {
        let chain = chain_id.to_string();
        let mut url = endpoint(&self.base, &["v1", &chain, "transaction_v2", transaction_id, ""]);
        url.query_pairs_mut()
            .append_pair("no-logs", "true")
            .append_pair("key", &self.api_key);
        UpstreamRequest::get(url)
    }
}

/// BscScan: BEP-20 token transfer history. Key travels as `&apikey=`.
#[derive(Debug, Clone)]
pub struct BscScan {
    base: Url,
    api_key: String,
}

impl BscScan {
    pub const START_BLOCK: u64 = 1_000_000;
    pub const END_BLOCK: u64 = 999_999_999;

    pub fn new(base: Url, api_key: impl Into<String>) -> Self {
        Self {
            base,
            api_key: api_key.into(),
        }
    }

    /// Token transfers of `contract` to or from `wallet`, oldest first.
    pub fn token_transfers(&self, contract: &str, wallet: &str) -> UpstreamRequest {
        let mut url = endpoint(&self.base, &["api"]);
        url.query_pairs_mut()
            .append_pair("module", "account")
            .append_pair("action", "tokentx")
            .append_pair("address", wallet)
            .append_pair("contractaddress", contract)
            .append_pair("startblock", &Self::START_BLOCK.to_string())
            .append_pair("endblock", &Self::END_BLOCK.to_string())
            .append_pair("sort", "asc")
            .append_pair("apikey", &self.api_key);
        UpstreamRequest::get(url)
    }
}

/// LiveCoinWatch: JSON `POST`s authenticated with `x-api-key`.
///
/// The listing and the price lookups historically use separate keys.
#[derive(Debug, Clone)]
pub struct LiveCoinWatch {
    base: Url,
    listing_key: String,
    price_key: String,
}

impl LiveCoinWatch {
    pub fn new(base: Url, listing_key: impl Into<String>, price_key: impl Into<String>) -> Self {
        Self {
            base,
            listing_key: listing_key.into(),
            price_key: price_key.into(),
        }
    }

    fn post(&self, path: &[&str], key: &str, body: serde_json::Value) -> UpstreamRequest {
        UpstreamRequest::post_json(endpoint(&self.base, path), &body).header("x-api-key", key)
    }

    /// Top coins by rank, in USD, with metadata.
    pub fn top_coins(&self) -> UpstreamRequest {
        self.post(
            &["coins", "list"],
            &self.listing_key,
            json!({
                "currency": "USD",
                "sort": "rank",
                "order": "ascending",
                "offset": 0,
                "limit": TOP_COINS_LIMIT,
                "meta": true,
            }),
        )
    }

    /// Current USD price of `code`.
    pub fn price(&self, code: &str) -> UpstreamRequest {
        self.post(
            &["coins", "single"],
            &self.price_key,
            json!({
                "currency": "USD",
                "code": code,
                "meta": false,
            }),
        )
    }

    /// USD price history of `code` within
    /// [`PRICE_HISTORY_HALF_WINDOW_MS`] of `timestamp_ms`.
    pub fn price_history(&self, code: &str, timestamp_ms: i64) -> UpstreamRequest {
        self.post(
            &["coins", "single", "history"],
            &self.price_key,
            json!({
                "currency": "USD",
                "code": code,
                "start": timestamp_ms.saturating_sub(PRICE_HISTORY_HALF_WINDOW_MS),
                "end": timestamp_ms.saturating_add(PRICE_HISTORY_HALF_WINDOW_MS),
            }),
        )
    }
}

/// All providers, built once from configuration.
#[derive(Debug, Clone)]
pub struct Providers {
    pub covalent: Covalent,
    pub bscscan: BscScan,
    pub livecoinwatch: LiveCoinWatch,
}
