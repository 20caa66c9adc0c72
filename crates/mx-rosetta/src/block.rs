// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

use crate::{
    common::{check_network, check_online, handle_request, with_context, EMPTY_HASH},
    config::RosettaConfig,
    error::{ApiError, ApiResult},
    node::{NodeAccessor, NodeStatus, RawBlock},
    reconcile::{needs_reconciliation, reconcile},
    types::{
        index_operations, Block, BlockIdentifier, BlockMetadata, BlockRequest, BlockResponse,
        BlockTransactionRequest, BlockTransactionResponse, Operation, OperationStatusType,
        OperationType, Transaction,
    },
    RosettaContext,
};
use tracing::{debug, trace};
use warp::Filter;

pub fn block_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("block")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(server_context))
        .and_then(handle_request(block))
}

pub fn block_transaction_route(
    server_context: RosettaContext,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    warp::path!("block" / "transaction")
        .and(warp::post())
        .and(warp::body::json())
        .and(with_context(server_context))
        .and_then(handle_request(block_transaction))
}

/// Retrieves a block given its identifier.
///
/// Our implementation allows for by `index`, which is the block nonce on the observed
/// shard, or by block `hash`.  The transactions of the block are those whose effects took
/// place in it, see [`crate::reconcile`].
///
/// [API Spec](https://www.rosetta-api.org/docs/BlockApi.html#block)
async fn block(request: BlockRequest, server_context: RosettaContext) -> ApiResult<BlockResponse> {
    debug!("/block");
    trace!(
        request = ?request,
        server_context = ?server_context,
        "/block",
    );

    check_network(request.network_identifier, &server_context)?;
    check_online(&server_context)?;

    let genesis = server_context.config.genesis_block_identifier();
    let block_identifier = request.block_identifier;
    let block = match (block_identifier.index, block_identifier.hash) {
        (Some(0), _) => genesis_block(&server_context).await?,
        (None, Some(hash)) if hash == genesis.hash => genesis_block(&server_context).await?,
        (Some(index), hash) => {
            let raw_block = get_block_by_nonce(&server_context, index).await?;
            if let Some(hash) = hash {
                if hash != raw_block.hash {
                    return Err(ApiError::InvalidInputParam(Some(format!(
                        "Block {} has hash {}, not {}",
                        index, raw_block.hash, hash
                    ))));
                }
            }
            build_block(&server_context, raw_block).await?
        },
        (None, Some(hash)) => {
            let raw_block = get_block_by_hash(&server_context, &hash).await?;
            build_block(&server_context, raw_block).await?
        },
        (None, None) => return Err(ApiError::MustQueryByIndexOrByHash),
    };

    Ok(BlockResponse {
        block: Some(block),
        other_transactions: None,
    })
}

/// Not supported, every transaction comes with its block
///
/// [API Spec](https://www.rosetta-api.org/docs/BlockApi.html#blocktransaction)
async fn block_transaction(
    request: BlockTransactionRequest,
    server_context: RosettaContext,
) -> ApiResult<BlockTransactionResponse> {
    debug!("/block/transaction");
    check_network(request.network_identifier, &server_context)?;
    Err(ApiError::NotImplemented)
}

/// Highest nonce that can be served.  Its successor must be available, as it may be needed
/// for reconciliation.
pub(crate) async fn latest_block_nonce(server_context: &RosettaContext) -> ApiResult<u64> {
    let status = server_context
        .node
        .get_node_status()
        .await
        .map_err(|err| err.into_api_error(ApiError::UnableToGetNodeStatus))?;

    Ok(servable_nonce(&server_context.config, &status))
}

/// Highest nonce whose successor is known too, which reconciliation needs
pub(crate) fn servable_nonce(config: &RosettaConfig, status: &NodeStatus) -> u64 {
    let highest_nonce = if config.observe_not_final_blocks {
        status.nonce
    } else {
        status.highest_final_nonce
    };
    highest_nonce.saturating_sub(1)
}

async fn get_block_by_nonce(server_context: &RosettaContext, nonce: u64) -> ApiResult<RawBlock> {
    let latest_nonce = latest_block_nonce(server_context).await?;
    if nonce > latest_nonce {
        return Err(ApiError::UnableToGetBlock(Some(format!(
            "Block {} is above the latest block {}",
            nonce, latest_nonce
        ))));
    }

    server_context
        .node
        .get_block_by_nonce(nonce)
        .await
        .map_err(|err| err.into_api_error(ApiError::UnableToGetBlock))
}

async fn get_block_by_hash(server_context: &RosettaContext, hash: &str) -> ApiResult<RawBlock> {
    let raw_block = server_context
        .node
        .get_block_by_hash(hash)
        .await
        .map_err(|err| err.into_api_error(ApiError::UnableToGetBlock))?;

    let latest_nonce = latest_block_nonce(server_context).await?;
    if raw_block.nonce > latest_nonce {
        return Err(ApiError::UnableToGetBlock(Some(format!(
            "Block {} is above the latest block {}",
            hash, latest_nonce
        ))));
    }
    Ok(raw_block)
}

/// Reconciles the block with its neighbours, which are only fetched when needed
async fn reconciled_block(node: &dyn NodeAccessor, raw_block: RawBlock) -> ApiResult<RawBlock> {
    if !needs_reconciliation(&raw_block) {
        return Ok(raw_block);
    }

    trace!(nonce = raw_block.nonce, "Reconciling block with its neighbours");
    let (previous, next) = futures::try_join!(
        node.get_block_by_nonce(raw_block.nonce.saturating_sub(1)),
        node.get_block_by_nonce(raw_block.nonce + 1),
    )
    .map_err(|err| err.into_api_error(ApiError::UnableToGetBlock))?;

    Ok(reconcile(&previous, &raw_block, &next))
}

/// Build up the transactions, which should contain the `operations` as the change set
async fn build_block(server_context: &RosettaContext, raw_block: RawBlock) -> ApiResult<Block> {
    let raw_block = reconciled_block(server_context.node.as_ref(), raw_block).await?;

    // Link the second block to genesis
    let parent_block_identifier = if raw_block.nonce == 1 {
        server_context.config.genesis_block_identifier()
    } else {
        BlockIdentifier::new(raw_block.nonce - 1, raw_block.prev_block_hash.clone())
    };

    let transactions = server_context.transformer().transform_block(&raw_block)?;

    Ok(Block {
        block_identifier: BlockIdentifier::new(raw_block.nonce, raw_block.hash),
        parent_block_identifier,
        timestamp: timestamp_in_millis(raw_block.timestamp),
        transactions,
        metadata: Some(BlockMetadata {
            shard: raw_block.shard,
            epoch: raw_block.epoch,
            round: raw_block.round,
            status: Some(raw_block.status).filter(|status| !status.is_empty()),
        }),
    })
}

/// For the genesis block, we populate parent_block_identifier with the same genesis block.
/// Refer to https://www.rosetta-api.org/docs/common_mistakes.html#malformed-genesis-block
async fn genesis_block(server_context: &RosettaContext) -> ApiResult<Block> {
    let balances = server_context
        .node
        .get_genesis_balances()
        .await
        .map_err(|err| err.into_api_error(ApiError::UnableToGetGenesisBlock))?;

    let config = &server_context.config;
    let native = server_context.currencies.native();
    let mut operations: Vec<Operation> = balances
        .iter()
        .filter(|balance| config.is_address_observed(&balance.address))
        .map(|balance| {
            Operation::credit(
                OperationType::GenesisBalanceMovement,
                &balance.address,
                &balance.balance,
                native,
            )
            .with_status(OperationStatusType::Success)
        })
        .collect();
    index_operations(&mut operations);

    let genesis = config.genesis_block_identifier();
    Ok(Block {
        block_identifier: genesis.clone(),
        parent_block_identifier: genesis,
        timestamp: timestamp_in_millis(config.genesis_timestamp),
        transactions: vec![Transaction::new(EMPTY_HASH, operations)],
        metadata: None,
    })
}

pub(crate) fn timestamp_in_millis(seconds: u64) -> u64 {
    seconds * 1000
}
