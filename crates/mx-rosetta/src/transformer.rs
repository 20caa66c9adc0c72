// Copyright © Aptos Foundation
// SPDX-License-Identifier: Apache-2.0

//! Conversion of node transactions into Rosetta operations.
//!
//! Blocks are expected to be reconciled already, see [`crate::reconcile`].  Each
//! transaction is turned into operations by type, completed with the operations derived
//! from its log events, then filtered down to the observed addresses.

use crate::{
    common::{is_smart_contract_address, is_zero_value},
    config::RosettaConfig,
    currency::{CurrencyRegistry, NATIVE_AS_CUSTOM_IDENTIFIER},
    error::{ApiError, ApiResult},
    events::{extract_token_events, extract_value_transfers, TokenEvent},
    features::{
        is_contract_call_with_error_needing_refund, is_developer_rewards_claim_result,
        is_developer_rewards_exception, is_invalid_move_balance_paying_data_movement_only,
        is_relayed_v1, is_relayed_v2, relayed_intrashard_with_signal_error,
    },
    fee::compute_fee_of_data_movement,
    node::{
        proto, RawBlock, RawReceipt, RawTransaction, TX_TYPE_INVALID, TX_TYPE_NORMAL, TX_TYPE_REWARD,
        TX_TYPE_UNSIGNED,
    },
    types::{
        index_operations, Currency, Operation, OperationStatusType, OperationType, Transaction,
        TransactionMetadata,
    },
};
use std::collections::HashSet;
use tracing::{debug, trace};

/// Receipts with this data carry the gas refunded to the sender
pub const RECEIPT_DATA_REFUNDED_GAS: &str = "refundedGas";

pub struct Transformer<'a> {
    config: &'a RosettaConfig,
    currencies: &'a CurrencyRegistry,
}

impl<'a> Transformer<'a> {
    pub fn new(config: &'a RosettaConfig, currencies: &'a CurrencyRegistry) -> Self {
        Transformer { config, currencies }
    }

    /// Every transaction of the block with at least one observed operation, followed by the
    /// gas refund receipts
    pub fn transform_block(&self, block: &RawBlock) -> ApiResult<Vec<Transaction>> {
        let mut txs = vec![];
        let mut receipts = vec![];
        for miniblock in &block.mini_blocks {
            for tx in &miniblock.transactions {
                let mut tx = tx.clone();
                if tx.miniblock_type.is_empty() {
                    tx.miniblock_type = miniblock.miniblock_type.clone();
                }
                if tx.miniblock_hash.is_empty() {
                    tx.miniblock_hash = miniblock.hash.clone();
                }
                txs.push(tx);
            }
            receipts.extend(miniblock.receipts.iter());
        }

        let txs = filter_out_ineffective_transactions(txs);

        let mut transactions = vec![];
        for tx in &txs {
            let transaction = self.transform_transaction(block.nonce, tx, &txs)?;
            if !transaction.operations.is_empty() {
                transactions.push(transaction);
            }
        }

        for receipt in receipts
            .into_iter()
            .filter(|receipt| receipt.data == RECEIPT_DATA_REFUNDED_GAS)
        {
            let transaction = self.transform_refund_receipt(receipt)?;
            if !transaction.operations.is_empty() {
                transactions.push(transaction);
            }
        }

        debug!(
            "Block {} holds {} transactions with observed operations",
            block.nonce,
            transactions.len()
        );
        Ok(transactions)
    }

    /// Operations of a single transaction, `txs_in_block` being every transaction of the
    /// block (the transaction itself included)
    pub fn transform_transaction(
        &self,
        block_nonce: u64,
        tx: &RawTransaction,
        txs_in_block: &[RawTransaction],
    ) -> ApiResult<Transaction> {
        trace!(hash = tx.hash.as_str(), tx_type = tx.tx_type.as_str(), "Transforming");

        let mut operations = match tx.tx_type.as_str() {
            TX_TYPE_NORMAL => self.normal_tx_operations(tx, txs_in_block)?,
            TX_TYPE_REWARD => self.reward_tx_operations(tx),
            TX_TYPE_UNSIGNED => self.contract_result_operations(block_nonce, tx, txs_in_block),
            TX_TYPE_INVALID => self.invalid_tx_operations(tx),
            other => {
                return Err(ApiError::UnknownTransactionType(Some(format!(
                    "{} of transaction {}",
                    other, tx.hash
                ))))
            },
        };
        operations.extend(self.event_operations(tx, txs_in_block)?);

        let mut transaction = Transaction::new(&tx.hash, operations);
        transaction.metadata = Some(transaction_metadata(tx));
        Ok(self.finalize(transaction, Some(OperationStatusType::Success)))
    }

    /// A transaction that is still in the pool, only its transfer is known.  Operations
    /// carry no status.
    pub fn transform_mempool_transaction(&self, tx: &RawTransaction) -> Transaction {
        let operations = self.native_transfer(OperationType::Transfer, tx);
        let mut transaction = Transaction::new(&tx.hash, operations);
        transaction.metadata = Some(transaction_metadata(tx));
        self.finalize(transaction, None)
    }

    fn normal_tx_operations(
        &self,
        tx: &RawTransaction,
        txs_in_block: &[RawTransaction],
    ) -> ApiResult<Vec<Operation>> {
        let native = self.currencies.native();
        let mut operations = self.native_transfer(OperationType::Transfer, tx);
        operations.push(Operation::debit(
            OperationType::Fee,
            tx.fee_payer(),
            &tx.initially_paid_fee,
            native,
        ));

        let coordinator = self.config.shard_coordinator();
        if let Some(inner) = relayed_intrashard_with_signal_error(tx, &coordinator)? {
            let value = inner.value.to_string();
            operations.push(Operation::debit(
                OperationType::Transfer,
                &inner.sender,
                &value,
                native,
            ));
            operations.push(Operation::credit(
                OperationType::Transfer,
                &tx.sender,
                &value,
                native,
            ));
        }

        if is_contract_call_with_error_needing_refund(tx, txs_in_block) {
            operations.push(Operation::credit(
                OperationType::Transfer,
                &tx.sender,
                &tx.value,
                native,
            ));
            operations.push(Operation::debit(
                OperationType::Transfer,
                &tx.receiver,
                &tx.value,
                native,
            ));
        }

        Ok(operations)
    }

    /// Rewards are minted, there is no sender
    fn reward_tx_operations(&self, tx: &RawTransaction) -> Vec<Operation> {
        vec![Operation::credit(
            OperationType::Reward,
            &tx.receiver,
            &tx.value,
            self.currencies.native(),
        )]
    }

    fn contract_result_operations(
        &self,
        block_nonce: u64,
        tx: &RawTransaction,
        txs_in_block: &[RawTransaction],
    ) -> Vec<Operation> {
        let native = self.currencies.native();

        if tx.is_refund {
            // A contract refunding itself is not visible from outside
            if tx.sender == tx.receiver && is_smart_contract_address(&tx.receiver) {
                return vec![];
            }
            return vec![Operation::credit(
                OperationType::FeeRefundAsSmartContractResult,
                &tx.receiver,
                &tx.value,
                native,
            )];
        }

        if is_developer_rewards_exception(block_nonce, tx)
            || is_developer_rewards_claim_result(tx, txs_in_block)
        {
            return vec![Operation::credit(
                OperationType::DeveloperRewardsAsSmartContractResult,
                &tx.receiver,
                &tx.value,
                native,
            )];
        }

        self.native_transfer(OperationType::SmartContractResult, tx)
    }

    fn invalid_tx_operations(&self, tx: &RawTransaction) -> Vec<Operation> {
        let fee = if is_invalid_move_balance_paying_data_movement_only(tx) {
            compute_fee_of_data_movement(&self.config.network, tx).to_string()
        } else {
            tx.initially_paid_fee.clone()
        };

        let mut operations: Vec<Operation> = self
            .native_transfer(OperationType::Transfer, tx)
            .into_iter()
            .map(|operation| operation.with_status(OperationStatusType::Failure))
            .collect();
        operations.push(Operation::debit(
            OperationType::FeeOfInvalidTransaction,
            tx.fee_payer(),
            &fee,
            self.currencies.native(),
        ));
        operations
    }

    /// Sender debit and receiver credit of the transaction value, if any
    fn native_transfer(
        &self,
        operation_type: OperationType,
        tx: &RawTransaction,
    ) -> Vec<Operation> {
        if !tx.has_value() {
            return vec![];
        }
        transfer_pair(
            operation_type,
            &tx.sender,
            &tx.receiver,
            &tx.value,
            self.currencies.native(),
        )
    }

    fn event_operations(
        &self,
        tx: &RawTransaction,
        txs_in_block: &[RawTransaction],
    ) -> ApiResult<Vec<Operation>> {
        let mut operations = vec![];

        for transfer in extract_value_transfers(tx)? {
            let value = transfer.value.to_string();
            let already_represented = std::iter::once(tx)
                .chain(
                    txs_in_block
                        .iter()
                        .filter(|other| other.tx_type == TX_TYPE_UNSIGNED),
                )
                .any(|other| {
                    other.sender == transfer.sender
                        && other.receiver == transfer.receiver
                        && other.value == value
                });
            if already_represented {
                continue;
            }
            operations.extend(transfer_pair(
                OperationType::Transfer,
                &transfer.sender,
                &transfer.receiver,
                &value,
                self.currencies.native(),
            ));
        }

        for token_event in extract_token_events(tx)? {
            let (operation_type, currency) = match self.currency_of(token_event.identifier()) {
                Some(found) => found,
                None => {
                    debug!(
                        "Ignoring event of unknown currency {} in transaction {}",
                        token_event.identifier(),
                        tx.hash
                    );
                    continue;
                },
            };

            match token_event {
                TokenEvent::Transfer {
                    sender,
                    receiver,
                    value,
                    ..
                } => operations.extend(transfer_pair(
                    operation_type,
                    &sender,
                    &receiver,
                    &value.to_string(),
                    currency,
                )),
                TokenEvent::Burn { account, value, .. }
                | TokenEvent::Wipe { account, value, .. } => operations.push(Operation::debit(
                    operation_type,
                    &account,
                    &value.to_string(),
                    currency,
                )),
                TokenEvent::Mint { account, value, .. } => operations.push(Operation::credit(
                    operation_type,
                    &account,
                    &value.to_string(),
                    currency,
                )),
            }
        }

        Ok(operations)
    }

    /// The native currency moved through token functions is a plain transfer
    fn currency_of(&self, identifier: &str) -> Option<(OperationType, &Currency)> {
        if identifier == NATIVE_AS_CUSTOM_IDENTIFIER {
            Some((OperationType::Transfer, self.currencies.native()))
        } else {
            self.currencies
                .custom(identifier)
                .map(|currency| (OperationType::CustomTransfer, currency))
        }
    }

    fn transform_refund_receipt(&self, receipt: &RawReceipt) -> ApiResult<Transaction> {
        let hash = proto::receipt_hash(receipt)?;
        let operations = vec![Operation::credit(
            OperationType::FeeRefund,
            &receipt.sender,
            &receipt.value.to_string(),
            self.currencies.native(),
        )];
        Ok(self.finalize(
            Transaction::new(&hash, operations),
            Some(OperationStatusType::Success),
        ))
    }

    /// Keeps the non-zero operations of observed addresses, and indexes them from 0
    fn finalize(
        &self,
        mut transaction: Transaction,
        default_status: Option<OperationStatusType>,
    ) -> Transaction {
        transaction.operations.retain(|operation| {
            !operation.has_zero_amount()
                && operation
                    .address()
                    .map(|address| self.config.is_address_observed(address))
                    .unwrap_or(false)
        });

        if let Some(status) = default_status {
            for operation in transaction
                .operations
                .iter_mut()
                .filter(|operation| operation.status.is_none())
            {
                operation.status = Some(status.to_string());
            }
        }

        index_operations(&mut transaction.operations);
        transaction
    }
}

fn transfer_pair(
    operation_type: OperationType,
    sender: &str,
    receiver: &str,
    value: &str,
    currency: &Currency,
) -> Vec<Operation> {
    vec![
        Operation::debit(operation_type, sender, value, currency),
        Operation::credit(operation_type, receiver, value, currency),
    ]
}

/// Drops contract results of invalid transactions, relayed transactions that are reported
/// as invalid too, and contract results moving no value
fn filter_out_ineffective_transactions(txs: Vec<RawTransaction>) -> Vec<RawTransaction> {
    let invalid_hashes: HashSet<String> = txs
        .iter()
        .filter(|tx| tx.tx_type == TX_TYPE_INVALID)
        .map(|tx| tx.hash.clone())
        .collect();

    txs.into_iter()
        .filter(|tx| match tx.tx_type.as_str() {
            TX_TYPE_UNSIGNED => {
                !invalid_hashes.contains(&tx.original_transaction_hash)
                    && !is_zero_value(&tx.value)
                    && !tx.value.starts_with('-')
            },
            TX_TYPE_NORMAL if is_relayed_v1(tx) || is_relayed_v2(tx) => {
                !invalid_hashes.contains(&tx.hash)
            },
            _ => true,
        })
        .collect()
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn transaction_metadata(tx: &RawTransaction) -> TransactionMetadata {
    let is_user_transaction = tx.tx_type == TX_TYPE_NORMAL || tx.tx_type == TX_TYPE_INVALID;
    TransactionMetadata {
        transaction_type: tx.tx_type.clone(),
        nonce: Some(tx.nonce),
        sender: tx.sender.clone(),
        receiver: tx.receiver.clone(),
        value: tx.value.clone(),
        gas_price: is_user_transaction.then(|| tx.gas_price),
        gas_limit: is_user_transaction.then(|| tx.gas_limit),
        data: (!tx.data.is_empty()).then(|| base64::encode(&tx.data)),
        source_shard: tx.source_shard,
        destination_shard: tx.destination_shard,
        miniblock_type: non_empty(&tx.miniblock_type),
        miniblock_hash: non_empty(&tx.miniblock_hash),
        processing_type_on_source: non_empty(&tx.processing_type_on_source),
        processing_type_on_destination: non_empty(&tx.processing_type_on_destination),
        original_transaction_hash: non_empty(&tx.original_transaction_hash),
        epoch: tx.epoch,
        round: tx.round,
        timestamp: tx.timestamp,
    }
}
