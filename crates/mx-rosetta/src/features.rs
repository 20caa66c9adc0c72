// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Predicates recognizing transactions whose balance effects need special treatment.
//!
//! Each predicate only looks at the transaction and, where needed, its siblings in the
//! same block.

use crate::{
    common::{decode_address, encode_address, ShardCoordinator},
    error::{ApiError, ApiResult},
    events::{
        has_signal_error, has_signal_error_with_message, META_TRANSACTION_IS_INVALID,
        SENDING_VALUE_TO_NON_PAYABLE_CONTRACT,
    },
    node::{RawTransaction, TX_TYPE_INVALID, TX_TYPE_NORMAL, TX_TYPE_UNSIGNED},
};
use num_bigint::BigUint;
use serde::Deserialize;
use std::str::FromStr;
use tracing::warn;

pub const PROCESSING_TYPE_MOVE_BALANCE: &str = "MoveBalance";
pub const PROCESSING_TYPE_BUILT_IN_FUNCTION_CALL: &str = "BuiltInFunctionCall";
pub const PROCESSING_TYPE_RELAYED: &str = "RelayedTx";
pub const PROCESSING_TYPE_RELAYED_V2: &str = "RelayedTxV2";
pub const PROCESSING_TYPE_SC_INVOKING: &str = "SCInvoking";
pub const PROCESSING_TYPE_SC_DEPLOYMENT: &str = "SCDeployment";

pub const BUILT_IN_FUNCTION_CLAIM_DEVELOPER_REWARDS: &str = "ClaimDeveloperRewards";

const ARGUMENTS_SEPARATOR: char = '@';
const NUM_PARTS_RELAYED_V1: usize = 2;
const NUM_PARTS_RELAYED_V2: usize = 5;

/// A contract result known to carry developer rewards, although nothing in the block says so
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ContractResultException {
    pub block_nonce: u64,
    pub shard: u32,
    pub hash: &'static str,
}

/// See `claimRewardsAllContracts` on mainnet
pub const DEVELOPER_REWARDS_EXCEPTIONS: &[ContractResultException] = &[
    ContractResultException {
        block_nonce: 15693863,
        shard: 2,
        hash: "8ddecc831c70ecf0ca312a46e04bbdc7508fabada494714ec41fd49c8ec13915",
    },
    ContractResultException {
        block_nonce: 18098197,
        shard: 2,
        hash: "90357d8f72bb1c749b46e394a4be349d4b2700a8f734470f815a524059f7031b",
    },
];

/// The inner transaction of a relayed transaction, only the fields with balance effects
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct InnerTransaction {
    pub sender: String,
    pub receiver: String,
    pub value: BigUint,
}

#[derive(Debug, Deserialize)]
struct InnerTransactionOfRelayedV1 {
    #[serde(default = "zero")]
    value: serde_json::Number,
    #[serde(with = "crate::node::types::base64_bytes")]
    sender: Vec<u8>,
    #[serde(with = "crate::node::types::base64_bytes")]
    receiver: Vec<u8>,
}

fn zero() -> serde_json::Number {
    serde_json::Number::from(0u8)
}

fn has_processing_type(tx: &RawTransaction, processing_type: &str) -> bool {
    tx.processing_type_on_source == processing_type
        && tx.processing_type_on_destination == processing_type
}

pub fn is_relayed_v1(tx: &RawTransaction) -> bool {
    tx.tx_type == TX_TYPE_NORMAL && has_processing_type(tx, PROCESSING_TYPE_RELAYED)
}

pub fn is_relayed_v2(tx: &RawTransaction) -> bool {
    tx.tx_type == TX_TYPE_NORMAL && has_processing_type(tx, PROCESSING_TYPE_RELAYED_V2)
}

/// `relayedTx@<hex of the inner transaction as JSON>`
pub fn parse_inner_tx_of_relayed_v1(tx: &RawTransaction) -> ApiResult<InnerTransaction> {
    let data = tx.data_as_str();
    let parts: Vec<&str> = data.split(ARGUMENTS_SEPARATOR).collect();
    if parts.len() != NUM_PARTS_RELAYED_V1 {
        return Err(cannot_parse_relayed(tx, "relayed V1"));
    }

    let payload = hex::decode(parts[1]).map_err(|_| cannot_parse_relayed(tx, "relayed V1"))?;
    let inner: InnerTransactionOfRelayedV1 =
        serde_json::from_slice(&payload).map_err(|_| cannot_parse_relayed(tx, "relayed V1"))?;
    let value = BigUint::from_str(&inner.value.to_string())
        .map_err(|_| cannot_parse_relayed(tx, "relayed V1"))?;

    Ok(InnerTransaction {
        sender: encode_address(&inner.sender)?,
        receiver: encode_address(&inner.receiver)?,
        value,
    })
}

/// `relayedTxV2@<receiver>@<nonce>@<data>@<signature>`.  The inner sender is the receiver
/// of the relayed transaction, and no value is carried.
pub fn parse_inner_tx_of_relayed_v2(tx: &RawTransaction) -> ApiResult<InnerTransaction> {
    let data = tx.data_as_str();
    let parts: Vec<&str> = data.split(ARGUMENTS_SEPARATOR).collect();
    if parts.len() != NUM_PARTS_RELAYED_V2 {
        return Err(cannot_parse_relayed(tx, "relayed V2"));
    }

    let receiver = hex::decode(parts[1]).map_err(|_| cannot_parse_relayed(tx, "relayed V2"))?;
    Ok(InnerTransaction {
        sender: tx.receiver.clone(),
        receiver: encode_address(&receiver)?,
        value: BigUint::default(),
    })
}

fn cannot_parse_relayed(tx: &RawTransaction, kind: &str) -> ApiError {
    ApiError::MalformedValue(Some(format!(
        "cannot parse {} transaction {}",
        kind, tx.hash
    )))
}

/// The inner transaction of a relayed transaction that failed with every party in the same
/// shard.  No contract result refunds its value, the caller has to reverse it.
pub fn relayed_intrashard_with_signal_error(
    tx: &RawTransaction,
    coordinator: &ShardCoordinator,
) -> ApiResult<Option<InnerTransaction>> {
    let inner = if is_relayed_v1(tx) {
        parse_inner_tx_of_relayed_v1(tx)?
    } else if is_relayed_v2(tx) {
        parse_inner_tx_of_relayed_v2(tx)?
    } else {
        return Ok(None);
    };

    if !has_signal_error(tx) || inner.value == BigUint::default() {
        return Ok(None);
    }

    let shards = [&tx.sender, &tx.receiver, &inner.sender, &inner.receiver]
        .iter()
        .map(|address| decode_address(address).map(|pubkey| coordinator.compute_shard(&pubkey)))
        .collect::<ApiResult<Vec<u32>>>()?;
    if shards.iter().all(|shard| *shard == shards[0]) {
        Ok(Some(inner))
    } else {
        Ok(None)
    }
}

/// An intra-shard contract call or deployment that failed, and whose value was not given
/// back through a contract result
pub fn is_contract_call_with_error_needing_refund(
    tx: &RawTransaction,
    txs_in_block: &[RawTransaction],
) -> bool {
    let is_contract_call = has_processing_type(tx, PROCESSING_TYPE_SC_INVOKING)
        || has_processing_type(tx, PROCESSING_TYPE_SC_DEPLOYMENT);
    if tx.tx_type != TX_TYPE_NORMAL
        || !is_contract_call
        || tx.source_shard != tx.destination_shard
        || !tx.has_value()
        || !has_signal_error(tx)
    {
        return false;
    }

    !txs_in_block.iter().any(|other| {
        other.tx_type == TX_TYPE_UNSIGNED
            && other.original_transaction_hash == tx.hash
            && other.receiver == tx.sender
            && other.value == tx.value
    })
}

/// Invalid move balance transactions that were rejected this way only pay for data movement,
/// their reported fee is not to be trusted
pub fn is_invalid_move_balance_paying_data_movement_only(tx: &RawTransaction) -> bool {
    tx.tx_type == TX_TYPE_INVALID
        && has_processing_type(tx, PROCESSING_TYPE_MOVE_BALANCE)
        && (has_signal_error_with_message(tx, SENDING_VALUE_TO_NON_PAYABLE_CONTRACT)
            || has_signal_error_with_message(tx, META_TRANSACTION_IS_INVALID))
}

/// See `ClaimDeveloperRewards` transactions on the explorer
pub fn is_developer_rewards_claim_result(
    contract_result: &RawTransaction,
    txs_in_block: &[RawTransaction],
) -> bool {
    if !contract_result.data.is_empty() || contract_result.nonce != 0 {
        return false;
    }

    txs_in_block.iter().any(|tx| {
        tx.hash == contract_result.original_transaction_hash
            && has_processing_type(tx, PROCESSING_TYPE_BUILT_IN_FUNCTION_CALL)
            && tx.data == BUILT_IN_FUNCTION_CLAIM_DEVELOPER_REWARDS.as_bytes()
    })
}

pub fn is_developer_rewards_exception(block_nonce: u64, contract_result: &RawTransaction) -> bool {
    let is_exception = DEVELOPER_REWARDS_EXCEPTIONS.iter().any(|exception| {
        exception.block_nonce == block_nonce
            && exception.shard == contract_result.source_shard
            && exception.hash == contract_result.hash
    });
    if is_exception {
        warn!(
            "Contract result {} in block {} is a known developer rewards exception",
            contract_result.hash, block_nonce
        );
    }
    is_exception
}
