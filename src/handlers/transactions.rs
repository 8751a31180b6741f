//! `POST /get-transactions`: BEP-20 transfers of one token for one wallet.
//!
//! BscScan wraps the list as `{"status", "message", "result"}`. Only
//! `result` is returned to the caller, re-serialized with BscScan's own field
//! names. On failure BscScan still answers `200` but puts an error string in
//! `result`, which fails to decode and is reported as malformed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::app::AppState;
use crate::context::Context;
use crate::error::ProxyError;
use crate::http::Response;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionsQuery {
    pub contract: String,
    pub wallet: String,
}

/// One token transfer. BscScan encodes every field as a string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TokenTransfer {
    pub block_hash: String,
    pub block_number: String,
    pub confirmations: String,
    pub contract_address: String,
    pub cumulative_gas_used: String,
    pub from: String,
    pub gas: String,
    pub gas_price: String,
    pub gas_used: String,
    pub hash: String,
    #[serde(rename = "timeStamp")]
    pub timestamp: String,
    pub to: String,
    pub token_decimal: String,
    pub token_name: String,
    pub token_symbol: String,
    pub value: String,
}

#[derive(Debug, Deserialize)]
struct TokenTransferEnvelope {
    #[serde(default)]
    message: String,
    result: Option<Vec<TokenTransfer>>,
}

/// Extracts the transfer list from a BscScan response body.
fn unwrap_transfers(body: &[u8]) -> Result<Vec<TokenTransfer>, ProxyError> {
    let envelope: TokenTransferEnvelope =
        serde_json::from_slice(body).map_err(ProxyError::malformed)?;
    envelope.result.ok_or_else(|| {
        ProxyError::malformed(format!(
            "token transfer response has no result (message: {:?})",
            envelope.message
        ))
    })
}

pub async fn transactions(state: Arc<AppState>, ctx: Context) -> Result<Response, ProxyError> {
    let query: TransactionsQuery = super::parse_body(&ctx)?;
    let request = state
        .providers()
        .bscscan
        .token_transfers(&query.contract, &query.wallet);
    let body = state.upstream().execute(request).await?;

    let transfers = unwrap_transfers(&body)?;
    let json = serde_json::to_vec(&transfers).map_err(ProxyError::malformed)?;
    Ok(Response::json(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::test_support::{body_text, ctx, state};
    use serde_json::{Value, json};

    const QUERY: &str = r#"{"contract":"0xToken","wallet":"0xWallet"}"#;

    #[tokio::test]
    async fn returns_only_the_result_list() {
        let (state, upstream) = state();
        upstream.respond(
            r#"{"status":"1","message":"OK","result":[{"blockNumber":"7","hash":"0xh","timeStamp":"1620000000","value":"10","tokenSymbol":"CAKE","extra":"ignored"}]}"#,
        );

        let resp = transactions(state, ctx(QUERY)).await.unwrap();
        assert_eq!(resp.headers().get("content-type"), Some("application/json"));

        let list: Value = serde_json::from_str(body_text(&resp)).unwrap();
        let first = &list[0];
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(first["blockNumber"], json!("7"));
        assert_eq!(first["timeStamp"], json!("1620000000"));
        assert_eq!(first["tokenSymbol"], json!("CAKE"));
        assert_eq!(first["blockHash"], json!(""));
        assert!(first.get("extra").is_none());

        let requests = upstream.requests();
        let sent = &requests[0];
        assert_eq!(sent.url.query_pairs().find(|(k, _)| k == "address").unwrap().1, "0xWallet");
        assert_eq!(
            sent.url.query_pairs().find(|(k, _)| k == "contractaddress").unwrap().1,
            "0xToken"
        );
    }

    #[tokio::test]
    async fn empty_result_is_an_empty_list() {
        let (state, upstream) = state();
        upstream.respond(r#"{"status":"0","message":"No transactions found","result":[]}"#);

        let resp = transactions(state, ctx(QUERY)).await.unwrap();
        assert_eq!(body_text(&resp), "[]");
    }

    #[test]
    fn missing_or_invalid_result_is_malformed() {
        for body in [
            r#"{"message":"OK"}"#,
            r#"{"message":"NOTOK","result":null}"#,
            r#"{"status":"0","message":"NOTOK","result":"Invalid API Key"}"#,
            "<html>",
        ] {
            let err = unwrap_transfers(body.as_bytes()).unwrap_err();
            assert!(matches!(err, ProxyError::MalformedUpstreamResponse(_)), "{body}");
        }
    }

    #[tokio::test]
    async fn malformed_upstream_body_fails_the_request() {
        let (state, upstream) = state();
        upstream.respond(r#"{"message":"NOTOK","result":"Max rate limit reached"}"#);

        let resp = transactions(state, ctx(QUERY)).await.unwrap_err().into_response();
        assert_eq!(body_text(&resp), "Unable to parse upstream provider response");
    }
}
