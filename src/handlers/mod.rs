//! Endpoint handlers.
//!
//! Every handler has the shape
//! `async fn(Arc<AppState>, Context) -> Result<Response, ProxyError>` and makes
//! at most one upstream call. Failures are returned, never turned into
//! responses here; [`crate::app`] routes them through
//! [`ProxyError::into_response`](crate::error::ProxyError::into_response).

mod balances;
mod price;
mod top_coins;
mod transaction;
mod transactions;

pub use balances::{BalancesQuery, balances};
pub use price::{CurrentPriceQuery, PriceQuery, current_price, price};
pub use top_coins::top_coins;
pub use transaction::{TransactionQuery, transaction};
pub use transactions::{TokenTransfer, TransactionsQuery, transactions};

use serde::de::DeserializeOwned;

use crate::context::Context;
use crate::error::ProxyError;

/// Decodes the request body, classifying any failure as a bad request.
fn parse_body<T: DeserializeOwned>(ctx: &Context) -> Result<T, ProxyError> {
    ctx.json().map_err(ProxyError::bad_request)
}
