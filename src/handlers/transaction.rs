//! `POST /get-transaction`: one transaction by hash, without event logs.

use std::sync::Arc;

use serde::Deserialize;

use crate::app::AppState;
use crate::context::Context;
use crate::error::ProxyError;
use crate::http::Response;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransactionQuery {
    pub chain_id: u64,
    pub transaction_id: String,
}

pub async fn transaction(state: Arc<AppState>, ctx: Context) -> Result<Response, ProxyError> {
    let query: TransactionQuery = super::parse_body(&ctx)?;
    let request = state
        .providers()
        .covalent
        .transaction(query.chain_id, &query.transaction_id);
    let body = state.upstream().execute(request).await?;
    Ok(Response::json(body))
}
