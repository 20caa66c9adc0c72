// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Rosetta Account API
//!
//! See: [Account API Spec](https://www.rosetta-api.org/docs/AccountApi.html)
//!

use crate::{
    common::{check_network, check_online, decode_address, handle_request, with_context},
    error::{ApiError, ApiResult},
    node::AccountQueryOptions,
    types::{
        AccountBalanceMetadata, AccountBalanceRequest, AccountBalanceResponse, Amount,
        BlockIdentifier, Currency, PartialBlockIdentifier,
    },
    RosettaContext,
};
use tracing::{debug, trace};
use warp::Filter;

/// Account routes e.g. balance
pub fn routes(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::post().and(
        warp::path!("account" / "balance")
            .and(warp::body::json())
            .and(with_context(server_context))
            .and_then(handle_request(account_balance)),
    )
}

/// Account balance command
///
/// The native balance is always read.  Custom currencies are read at the same block, when
/// requested.
///
/// [API Spec](https://www.rosetta-api.org/docs/AccountApi.html#accountbalance)
async fn account_balance(
    request: AccountBalanceRequest,
    server_context: RosettaContext,
) -> ApiResult<AccountBalanceResponse> {
    debug!("/account/balance");
    trace!(
        request = ?request,
        server_context = ?server_context,
        "account_balance for [{}]",
        request.account_identifier.address
    );

    check_network(request.network_identifier, &server_context)?;
    check_online(&server_context)?;

    let address = request.account_identifier.address;
    if address.is_empty() {
        return Err(ApiError::InvalidAccountAddress(Some(
            "Address must not be empty".to_string(),
        )));
    }
    decode_address(&address)?;

    let currencies = requested_currencies(&server_context, request.currencies)?;
    let query_options = query_options(request.block_identifier);

    let node = &server_context.node;
    let account = node
        .get_account(&address, &query_options)
        .await
        .map_err(|err| err.into_api_error(ApiError::UnableToGetAccount))?;

    // Pin the remaining reads to the block the account was read at
    let pinned = AccountQueryOptions::BlockHash(account.block_info.hash.clone());
    let mut balances = Vec::with_capacity(currencies.len());
    for currency in currencies {
        if server_context.currencies.is_native(&currency.symbol) {
            balances.push(Amount::new(account.account.balance.clone(), &currency));
            continue;
        }

        let esdt = node
            .get_account_esdt_balance(&address, &currency.symbol, &pinned)
            .await
            .map_err(|err| err.into_api_error(ApiError::UnableToGetAccount))?;
        balances.push(Amount::new(esdt.token_data.balance, &currency));
    }

    Ok(AccountBalanceResponse {
        block_identifier: BlockIdentifier::new(
            account.block_info.nonce,
            account.block_info.hash,
        ),
        balances,
        metadata: AccountBalanceMetadata {
            nonce: account.account.nonce,
        },
    })
}

/// Currencies to report, the native one when none are requested
fn requested_currencies(
    server_context: &RosettaContext,
    requested: Option<Vec<Currency>>,
) -> ApiResult<Vec<Currency>> {
    let registry = &server_context.currencies;
    let requested = match requested {
        Some(requested) if !requested.is_empty() => requested,
        _ => return Ok(vec![registry.native().clone()]),
    };

    requested
        .into_iter()
        .map(|currency| {
            registry.get(&currency.symbol).cloned().ok_or_else(|| {
                ApiError::InvalidInputParam(Some(format!(
                    "Unknown currency {}",
                    currency.symbol
                )))
            })
        })
        .collect()
}

fn query_options(block_identifier: Option<PartialBlockIdentifier>) -> AccountQueryOptions {
    match block_identifier {
        Some(PartialBlockIdentifier {
            hash: Some(hash), ..
        }) => AccountQueryOptions::BlockHash(hash),
        Some(PartialBlockIdentifier {
            index: Some(index), ..
        }) => AccountQueryOptions::BlockNonce(index),
        _ => AccountQueryOptions::OnFinalBlock,
    }
}
