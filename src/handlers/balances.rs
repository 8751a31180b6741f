//! `POST /get-balances`: token balances of an address on one chain.

use std::sync::Arc;

use serde::Deserialize;

use crate::app::AppState;
use crate::context::Context;
use crate::error::ProxyError;
use crate::http::Response;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BalancesQuery {
    pub chain_id: u64,
    pub address: String,
}

pub async fn balances(state: Arc<AppState>, ctx: Context) -> Result<Response, ProxyError> {
    let query: BalancesQuery = super::parse_body(&ctx)?;
    let request = state
        .providers()
        .covalent
        .balances(query.chain_id, &query.address);
    let body = state.upstream().execute(request).await?;
    Ok(Response::json(body))
}
