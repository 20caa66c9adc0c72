// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Attribution of scheduled transactions to the block in which they take effect.
//!
//! A scheduled miniblock is executed in block N, but its results are only reported in
//! N+1 (as a processed miniblock, and as invalid transactions).  [`reconcile`] takes a
//! block together with its neighbors and returns a copy of the block holding exactly
//! the effects that happened in it.

use crate::node::{
    Miniblock, RawBlock, RawTransaction, MINIBLOCK_TYPE_INVALID,
    MINIBLOCK_TYPE_SMART_CONTRACT_RESULT,
};
use itertools::Itertools;
use std::collections::HashSet;
use tracing::{debug, info};

/// Whether the neighbors of the block are needed to reconcile it
pub fn needs_reconciliation(block: &RawBlock) -> bool {
    !block.mini_blocks.iter().all(Miniblock::is_normal)
}

/// Rewrites `current` so its miniblocks hold the effects that took place in it.  Blocks with
/// only normal miniblocks are returned as is.
pub fn reconcile(previous: &RawBlock, current: &RawBlock, next: &RawBlock) -> RawBlock {
    let mut block = current.clone();
    if !needs_reconciliation(current) {
        return block;
    }

    debug!(
        "Reconciling block {} with blocks {} and {}",
        current.nonce, previous.nonce, next.nonce
    );

    // Processed miniblocks of N took effect in N-1, those of N+1 take effect in N
    block.mini_blocks.retain(|miniblock| !miniblock.is_processed());
    block.mini_blocks.extend(
        next.mini_blocks
            .iter()
            .filter(|miniblock| miniblock.is_processed())
            .cloned(),
    );

    let invalid_txs = gather_invalid_transactions(previous, current, next);
    block.mini_blocks.retain(|miniblock| !miniblock.is_invalid());
    if !invalid_txs.is_empty() {
        block
            .mini_blocks
            .push(Miniblock::new(MINIBLOCK_TYPE_INVALID, invalid_txs));
    }

    // Their effects are now held by the processed and invalid miniblocks
    block
        .mini_blocks
        .retain(|miniblock| !(miniblock.is_scheduled() && !miniblock.is_final()));

    deduplicate_previously_appearing_contract_results(previous, &mut block);
    move_contract_results_of_cross_shard_scheduled_transactions(previous, &mut block, next);

    block
}

/// Invalid transactions of N, minus the ones scheduled in N-1, plus the invalid
/// transactions of N+1 that were scheduled in N.
///
/// At epoch changes, the invalid miniblock of N-1 may be missing from the node response.
/// Only the scheduled hashes of N-1 are used, so such transactions are kept in N.
fn gather_invalid_transactions(
    previous: &RawBlock,
    current: &RawBlock,
    next: &RawBlock,
) -> Vec<RawTransaction> {
    let scheduled_in_previous = scheduled_transaction_hashes(previous);
    let scheduled_in_current = scheduled_transaction_hashes(current);

    let invalid_txs = invalid_transactions(current)
        .filter(|tx| !scheduled_in_previous.contains(tx.hash.as_str()))
        .chain(
            invalid_transactions(next)
                .filter(|tx| scheduled_in_current.contains(tx.hash.as_str())),
        );

    // A block may hold two invalid miniblocks with overlapping content
    invalid_txs
        .unique_by(|tx| tx.hash.clone())
        .cloned()
        .collect()
}

fn scheduled_transaction_hashes(block: &RawBlock) -> HashSet<&str> {
    block
        .mini_blocks
        .iter()
        .filter(|miniblock| miniblock.is_scheduled() && !miniblock.is_final())
        .flat_map(|miniblock| miniblock.transactions.iter())
        .map(|tx| tx.hash.as_str())
        .collect()
}

fn invalid_transactions(block: &RawBlock) -> impl Iterator<Item = &RawTransaction> {
    block
        .mini_blocks
        .iter()
        .filter(|miniblock| miniblock.is_invalid())
        .flat_map(|miniblock| miniblock.transactions.iter())
}

fn is_normal_contract_results(miniblock: &Miniblock) -> bool {
    miniblock.is_smart_contract_results() && miniblock.is_normal()
}

/// Contract results of an invalid scheduled transaction may be saved in both N-1 and N
fn deduplicate_previously_appearing_contract_results(previous: &RawBlock, block: &mut RawBlock) {
    let in_previous: HashSet<&str> = previous
        .mini_blocks
        .iter()
        .filter(|miniblock| is_normal_contract_results(miniblock))
        .flat_map(|miniblock| miniblock.transactions.iter())
        .map(|tx| tx.hash.as_str())
        .collect();
    if in_previous.is_empty() {
        return;
    }

    for miniblock in block
        .mini_blocks
        .iter_mut()
        .filter(|miniblock| is_normal_contract_results(miniblock))
    {
        miniblock
            .transactions
            .retain(|tx| !in_previous.contains(tx.hash.as_str()));
    }
}

fn cross_shard_scheduled_final_hashes(block: &RawBlock) -> HashSet<&str> {
    block
        .mini_blocks
        .iter()
        .filter(|miniblock| {
            miniblock.is_scheduled() && miniblock.is_final() && miniblock.is_cross_shard()
        })
        .flat_map(|miniblock| miniblock.transactions.iter())
        .map(|tx| tx.hash.as_str())
        .collect()
}

/// Results of cross-shard scheduled transactions take effect in the block where the
/// transaction was scheduled, not in the one that reports them
fn move_contract_results_of_cross_shard_scheduled_transactions(
    previous: &RawBlock,
    block: &mut RawBlock,
    next: &RawBlock,
) {
    let scheduled_in_previous = cross_shard_scheduled_final_hashes(previous);
    let scheduled_in_current: HashSet<String> = cross_shard_scheduled_final_hashes(block)
        .into_iter()
        .map(str::to_string)
        .collect();

    for miniblock in block
        .mini_blocks
        .iter_mut()
        .filter(|miniblock| miniblock.is_smart_contract_results())
    {
        miniblock.transactions.retain(|contract_result| {
            !scheduled_in_previous.contains(contract_result.original_transaction_hash.as_str())
        });
    }

    let to_move: Vec<RawTransaction> = next
        .mini_blocks
        .iter()
        .filter(|miniblock| miniblock.is_smart_contract_results())
        .flat_map(|miniblock| miniblock.transactions.iter())
        .filter(|contract_result| {
            scheduled_in_current.contains(&contract_result.original_transaction_hash)
        })
        .cloned()
        .collect();

    if !to_move.is_empty() {
        info!(
            "Moving {} cross-shard scheduled contract results from block {} to block {}",
            to_move.len(),
            next.nonce,
            block.nonce
        );
        block.mini_blocks.push(Miniblock::new(
            MINIBLOCK_TYPE_SMART_CONTRACT_RESULT,
            to_move,
        ));
    }
}
