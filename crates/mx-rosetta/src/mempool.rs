// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rosetta Mempool API
//!
//! The node offers no pool listing, so `/mempool` is always empty.  Single pending
//! transactions can still be looked up by hash.
//!
//! See: [Mempool API Spec](https://www.rosetta-api.org/docs/MempoolApi.html)

use crate::{
    common::{check_network, check_online, handle_request, with_context},
    error::{ApiError, ApiResult},
    node::TX_STATUS_PENDING,
    types::{
        MempoolResponse, MempoolTransactionRequest, MempoolTransactionResponse, NetworkRequest,
    },
    RosettaContext,
};
use tracing::{debug, trace};
use warp::Filter;

pub fn routes(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::post().and(
        warp::path!("mempool")
            .and(warp::body::json())
            .and(with_context(server_context.clone()))
            .and_then(handle_request(mempool))
            .or(warp::path!("mempool" / "transaction")
                .and(warp::body::json())
                .and(with_context(server_context))
                .and_then(handle_request(mempool_transaction))),
    )
}

/// [API Spec](https://www.rosetta-api.org/docs/MempoolApi.html#mempool)
async fn mempool(
    request: NetworkRequest,
    server_context: RosettaContext,
) -> ApiResult<MempoolResponse> {
    debug!("/mempool");
    trace!(request = ?request, server_context = ?server_context, "mempool");

    check_network(request.network_identifier, &server_context)?;
    check_online(&server_context)?;

    Ok(MempoolResponse {
        transaction_identifiers: vec![],
    })
}

/// Look up a transaction that hasn't been included in a block yet
///
/// [API Spec](https://www.rosetta-api.org/docs/MempoolApi.html#mempooltransaction)
async fn mempool_transaction(
    request: MempoolTransactionRequest,
    server_context: RosettaContext,
) -> ApiResult<MempoolTransactionResponse> {
    debug!("/mempool/transaction");
    trace!(
        request = ?request,
        server_context = ?server_context,
        "mempool_transaction",
    );

    check_network(request.network_identifier, &server_context)?;
    check_online(&server_context)?;

    let hash = request.transaction_identifier.hash;
    let tx = server_context
        .node
        .get_transaction(&hash)
        .await
        .map_err(|err| err.into_api_error(ApiError::CannotParsePoolTransaction))?;

    if tx.status != TX_STATUS_PENDING {
        return Err(ApiError::TransactionIsNotInPool(Some(format!(
            "Transaction {} has status {}",
            hash, tx.status
        ))));
    }

    Ok(MempoolTransactionResponse {
        transaction: server_context.transformer().transform_mempool_transaction(&tx),
    })
}
